use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::loader::{self, LoadError};
use super::model::Table;

// ---------------------------------------------------------------------------
// PathCache – singleton-per-path memoization
// ---------------------------------------------------------------------------

/// Memoizes one shared, immutable instance per source path.
///
/// The key is the path exactly as given (parameter equality, not content
/// equality). Entries live for the process; the dataset is small and static
/// relative to memory, so there is no eviction. A failed construction is
/// not memoized, so a later request for the same path retries the load.
#[derive(Debug, Default)]
pub struct PathCache<T> {
    entries: HashMap<PathBuf, Arc<T>>,
}

impl<T> PathCache<T> {
    pub fn new() -> Self {
        PathCache {
            entries: HashMap::new(),
        }
    }

    /// Return the existing instance for `path`, or construct, memoize, and
    /// return a new one.
    pub fn get_or_insert<E>(
        &mut self,
        path: &Path,
        load: impl FnOnce(&Path) -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        if let Some(existing) = self.entries.get(path) {
            return Ok(existing.clone());
        }
        let value = Arc::new(load(path)?);
        self.entries.insert(path.to_path_buf(), value.clone());
        Ok(value)
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DataStore – the table cache
// ---------------------------------------------------------------------------

/// Lazily loads and memoizes [`Table`]s by source path.
#[derive(Debug, Default)]
pub struct DataStore {
    cache: PathCache<Table>,
}

impl DataStore {
    pub fn new() -> Self {
        DataStore {
            cache: PathCache::new(),
        }
    }

    /// The unique table for `path`, loading it on first request.
    pub fn table(&mut self, path: &Path) -> Result<Arc<Table>, LoadError> {
        self.cache.get_or_insert(path, |p| {
            let table = loader::load_table(p)?;
            log::info!("loaded {} rows from {}", table.len(), p.display());
            Ok(table)
        })
    }

    /// Number of tables currently loaded.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

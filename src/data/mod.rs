/// Data layer: core types, loading, caching, and filtering.
///
/// Architecture:
/// ```text
///  us.csv / us-states.csv / us-counties.csv (.parquet)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  store    │  one shared Table per path (no reloads)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  view     │  region prefix + date scopes → matching rows
///   └──────────┘
/// ```
pub mod loader;
pub mod model;
pub mod store;
pub mod view;

pub use loader::LoadError;
pub use model::{Record, Table};
pub use store::{DataStore, PathCache};
pub use view::View;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::color::ColorScale;
use crate::data::{DataStore, Record, Table, View};
use crate::geo::{GeoMap, GeoStore};

// ---------------------------------------------------------------------------
// Metric – which count column drives the choropleth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Cases,
    Deaths,
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Metric::Cases => "Cases",
            Metric::Deaths => "Deaths",
        }
    }

    pub fn scale(self) -> ColorScale {
        match self {
            Metric::Cases => ColorScale::blues(),
            Metric::Deaths => ColorScale::reds(),
        }
    }

    pub fn of(self, record: &Record<'_>) -> i64 {
        match self {
            Metric::Cases => record.cases,
            Metric::Deaths => record.deaths,
        }
    }
}

// ---------------------------------------------------------------------------
// Source paths – the five conventional files in a data folder
// ---------------------------------------------------------------------------

/// One file per granularity level plus the two boundary collections.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub country: PathBuf,
    pub states: PathBuf,
    pub counties: PathBuf,
    pub state_geo: PathBuf,
    pub county_geo: PathBuf,
}

impl SourcePaths {
    pub fn in_dir(dir: &Path) -> Self {
        SourcePaths {
            country: dir.join("us.csv"),
            states: dir.join("us-states.csv"),
            counties: dir.join("us-counties.csv"),
            state_geo: dir.join("us-states.geojson"),
            county_geo: dir.join("us-counties.geojson"),
        }
    }
}

/// The loaded sources. Each is independent: a source that failed to load
/// stays `None` without taking the others down.
#[derive(Debug, Default)]
pub struct LoadedData {
    pub country: Option<Arc<Table>>,
    pub states: Option<Arc<Table>>,
    pub counties: Option<Arc<Table>>,
    pub state_geo: Option<Arc<GeoMap>>,
    pub county_geo: Option<Arc<GeoMap>>,
}

impl LoadedData {
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.states.is_none() && self.counties.is_none()
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// The current selection is a single FIPS scope: `""` is the whole country,
/// 2 digits a state, 5 digits a county. The map always shows the scope's
/// subregions; the chart shows the scope's own series.
pub struct AppState {
    /// Per-path table cache.
    pub store: DataStore,

    /// Per-path boundary cache.
    pub geo_store: GeoStore,

    /// The sources loaded from the chosen data folder.
    pub data: LoadedData,

    /// Current region scope ("" = country).
    pub selected_fips: String,

    /// Date rendered on the map (None until data is loaded).
    pub selected_date: Option<NaiveDate>,

    /// Which count column the map colors by.
    pub metric: Metric,

    /// Set when the selection changed and the map should refit its bounds.
    pub map_needs_refit: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            store: DataStore::new(),
            geo_store: GeoStore::new(),
            data: LoadedData::default(),
            selected_fips: String::new(),
            selected_date: None,
            metric: Metric::default(),
            map_needs_refit: false,
            status_message: None,
        }
    }
}

impl AppState {
    /// Load the five conventional sources under `dir`. Each load stands
    /// alone: a failure is logged and reported, the rest stay available.
    pub fn open_data_dir(&mut self, dir: &Path) {
        let paths = SourcePaths::in_dir(dir);
        let mut errors: Vec<String> = Vec::new();

        fn report<T>(
            result: Result<Arc<T>, crate::data::LoadError>,
            path: &Path,
            errors: &mut Vec<String>,
        ) -> Option<Arc<T>> {
            match result {
                Ok(value) => Some(value),
                Err(e) => {
                    log::error!("failed to load {}: {e}", path.display());
                    errors.push(format!("{}: {e}", path.display()));
                    None
                }
            }
        }
        self.data.country = report(self.store.table(&paths.country), &paths.country, &mut errors);
        self.data.states = report(self.store.table(&paths.states), &paths.states, &mut errors);
        self.data.counties =
            report(self.store.table(&paths.counties), &paths.counties, &mut errors);
        self.data.state_geo =
            report(self.geo_store.map(&paths.state_geo), &paths.state_geo, &mut errors);
        self.data.county_geo = report(
            self.geo_store.map(&paths.county_geo),
            &paths.county_geo,
            &mut errors,
        );

        self.selected_fips.clear();
        self.selected_date = self
            .data
            .country
            .as_ref()
            .and_then(|t| t.latest_date())
            .or_else(|| self.data.states.as_ref().and_then(|t| t.latest_date()));
        self.map_needs_refit = true;
        self.status_message = if errors.is_empty() {
            None
        } else {
            Some(errors.join(" · "))
        };
    }

    /// Whether any table loaded.
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    /// Descend into a region (a map click or list selection).
    pub fn select_region(&mut self, fips: &str) {
        if self.selected_fips != fips {
            self.selected_fips = fips.to_string();
            self.map_needs_refit = true;
        }
    }

    /// Ascend to the parent scope: county → state → country.
    pub fn drill_up(&mut self) {
        match self.selected_fips.len() {
            0 => {}
            1..=2 => self.selected_fips.clear(),
            _ => self.selected_fips.truncate(2),
        }
        self.map_needs_refit = true;
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = Some(date);
    }

    /// The table holding the current scope's subregions.
    pub fn subregion_table(&self) -> Option<&Arc<Table>> {
        if self.selected_fips.is_empty() {
            self.data.states.as_ref()
        } else {
            self.data.counties.as_ref()
        }
    }

    /// The boundary collection matching [`Self::subregion_table`].
    pub fn subregion_geo(&self) -> Option<&Arc<GeoMap>> {
        if self.selected_fips.is_empty() {
            self.data.state_geo.as_ref()
        } else {
            self.data.county_geo.as_ref()
        }
    }

    /// What the map renders: the scope's subregions on the selected date.
    pub fn map_view(&self) -> Option<View> {
        let table = self.subregion_table()?;
        Some(
            View::new(table.clone())
                .region(Some(&self.selected_fips))
                .date(self.selected_date),
        )
    }

    /// What the chart renders: the scope's own series across all dates.
    pub fn series_view(&self) -> Option<View> {
        let (table, code) = match self.selected_fips.len() {
            0 => (self.data.country.as_ref()?, None),
            1..=2 => (self.data.states.as_ref()?, Some(self.selected_fips.as_str())),
            _ => (self.data.counties.as_ref()?, Some(self.selected_fips.as_str())),
        };
        Some(View::new(table.clone()).region(code))
    }

    /// Human-readable name for the current scope, for titles.
    pub fn region_label(&self) -> String {
        if self.selected_fips.is_empty() {
            return "the United States".to_string();
        }
        let Some(view) = self.series_view() else {
            return self.selected_fips.clone();
        };
        let label = match view.rows().next() {
            Some(rec) => {
                let state = rec.state.unwrap_or(&self.selected_fips);
                match rec.county {
                    Some(county) if self.selected_fips.len() > 2 => format!("{county}, {state}"),
                    _ => state.to_string(),
                }
            }
            // An unknown code filters down to nothing; fall back to the code.
            None => self.selected_fips.clone(),
        };
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_state() -> AppState {
        let mut state = AppState::default();
        state.data.country = Some(Arc::new(Table {
            dates: vec![date("2020-09-27"), date("2020-09-28")],
            fips: None,
            cases: vec![7_115_491, 7_150_000],
            deaths: vec![204_113, 204_500],
            states: None,
            counties: None,
        }));
        state.data.states = Some(Arc::new(Table {
            dates: vec![date("2020-09-28"); 2],
            fips: Some(vec!["42".to_string(), "06".to_string()]),
            cases: vec![160_123, 812_344],
            deaths: vec![8_141, 15_792],
            states: Some(vec!["Pennsylvania".to_string(), "California".to_string()]),
            counties: None,
        }));
        state.data.counties = Some(Arc::new(Table {
            dates: vec![date("2020-09-28"); 2],
            fips: Some(vec!["42003".to_string(), "42005".to_string()]),
            cases: vec![12_000, 900],
            deaths: vec![400, 20],
            states: Some(vec!["Pennsylvania".to_string(); 2]),
            counties: Some(vec!["Allegheny".to_string(), "Armstrong".to_string()]),
        }));
        state.selected_date = Some(date("2020-09-28"));
        state
    }

    #[test]
    fn country_scope_maps_states_and_charts_the_country() {
        let state = sample_state();
        assert_eq!(state.map_view().unwrap().len(), 2);
        assert_eq!(state.series_view().unwrap().cases(), vec![7_115_491, 7_150_000]);
        assert_eq!(state.region_label(), "the United States");
    }

    #[test]
    fn state_scope_maps_its_counties() {
        let mut state = sample_state();
        state.select_region("42");

        let map = state.map_view().unwrap();
        assert_eq!(map.fips_codes(), vec!["42003", "42005"]);
        assert_eq!(state.region_label(), "Pennsylvania");
    }

    #[test]
    fn county_scope_charts_the_county() {
        let mut state = sample_state();
        state.select_region("42003");

        assert_eq!(state.series_view().unwrap().cases(), vec![12_000]);
        assert_eq!(state.region_label(), "Allegheny, Pennsylvania");
    }

    #[test]
    fn drill_up_walks_county_state_country() {
        let mut state = sample_state();
        state.select_region("42003");

        state.drill_up();
        assert_eq!(state.selected_fips, "42");
        state.drill_up();
        assert_eq!(state.selected_fips, "");
        state.drill_up();
        assert_eq!(state.selected_fips, "");
    }

    #[test]
    fn unknown_codes_fall_back_to_the_raw_code() {
        let mut state = sample_state();
        state.select_region("99");
        assert_eq!(state.region_label(), "99");
    }
}

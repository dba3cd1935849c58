use std::sync::Arc;

use chrono::NaiveDate;

use super::model::{Record, Table};

// ---------------------------------------------------------------------------
// View – a region/date scope over a shared table
// ---------------------------------------------------------------------------

/// A read-only subset of a [`Table`]'s rows. Holds a shared table handle
/// plus the scope predicates, never row data: the matching rows are
/// recomputed on every pass, in table insertion order.
///
/// Scopes compose by chaining: `view.region(Some("42")).date(Some(d))`.
/// Re-applying a scope replaces it, so filtering twice with the same code
/// yields the same rows as filtering once.
#[derive(Debug, Clone)]
pub struct View {
    table: Arc<Table>,
    region: Option<String>,
    date: Option<NaiveDate>,
}

impl View {
    /// An unrestricted view of the whole table.
    pub fn new(table: Arc<Table>) -> Self {
        View {
            table,
            region: None,
            date: None,
        }
    }

    /// Narrow to rows whose geographic code starts with `code`.
    ///
    /// A 2-digit state scope therefore matches every 5-digit county code
    /// under it, while a full-length code matches only itself (codes within
    /// one table have uniform length). `None` lifts the restriction, and a
    /// table with no code column passes all rows regardless of scope (the
    /// country-level file).
    pub fn region(&self, code: Option<&str>) -> View {
        View {
            table: self.table.clone(),
            region: code.map(str::to_string),
            date: self.date,
        }
    }

    /// Narrow to rows reported on exactly `date`; `None` lifts the
    /// restriction. A date with no matching rows yields an empty view, not
    /// an error.
    pub fn date(&self, date: Option<NaiveDate>) -> View {
        View {
            table: self.table.clone(),
            region: self.region.clone(),
            date,
        }
    }

    fn matches(&self, index: usize) -> bool {
        if let (Some(prefix), Some(codes)) = (&self.region, &self.table.fips) {
            if !codes[index].starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(date) = self.date {
            if self.table.dates[index] != date {
                return false;
            }
        }
        true
    }

    /// Indices of matching rows, in insertion order.
    pub fn indices(&self) -> Vec<usize> {
        (0..self.table.len()).filter(|&i| self.matches(i)).collect()
    }

    /// Matching rows, in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        (0..self.table.len())
            .filter(|&i| self.matches(i))
            .map(|i| self.table.record(i))
    }

    /// Number of matching rows.
    pub fn len(&self) -> usize {
        (0..self.table.len()).filter(|&i| self.matches(i)).count()
    }

    /// Whether no rows match. An empty view is a valid result.
    pub fn is_empty(&self) -> bool {
        !(0..self.table.len()).any(|i| self.matches(i))
    }

    // -- Frequently used columns --

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows().map(|r| r.date).collect()
    }

    pub fn cases(&self) -> Vec<i64> {
        self.rows().map(|r| r.cases).collect()
    }

    pub fn deaths(&self) -> Vec<i64> {
        self.rows().map(|r| r.deaths).collect()
    }

    pub fn fips_codes(&self) -> Vec<&str> {
        self.rows().filter_map(|r| r.fips).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    /// Rows at mixed granularity: one state code and two county codes.
    fn mixed_table() -> Arc<Table> {
        Arc::new(Table {
            dates: vec![date("2020-09-27"); 3],
            fips: Some(vec![
                "01".to_string(),
                "01001".to_string(),
                "01003".to_string(),
            ]),
            cases: vec![100, 10, 20],
            deaths: vec![5, 1, 2],
            states: None,
            counties: None,
        })
    }

    fn county_table() -> Arc<Table> {
        Arc::new(Table {
            dates: vec![date("2020-09-27"), date("2020-09-28")],
            fips: Some(vec!["01001".to_string(), "01001".to_string()]),
            cases: vec![100, 110],
            deaths: vec![1, 1],
            states: None,
            counties: None,
        })
    }

    #[test]
    fn no_scope_returns_every_row() {
        let view = View::new(mixed_table());
        assert_eq!(view.region(None).indices(), vec![0, 1, 2]);
    }

    #[test]
    fn refiltering_with_the_same_code_is_idempotent() {
        let view = View::new(mixed_table());
        let once = view.region(Some("01001"));
        let twice = once.region(Some("01001"));
        assert_eq!(once.indices(), twice.indices());
    }

    #[test]
    fn prefix_scope_matches_subregions() {
        let view = View::new(mixed_table());
        assert_eq!(view.region(Some("01")).indices(), vec![0, 1, 2]);
        assert_eq!(view.region(Some("01001")).indices(), vec![1]);
    }

    #[test]
    fn empty_prefix_is_unrestricted() {
        let view = View::new(mixed_table());
        assert_eq!(view.region(Some("")).len(), 3);
    }

    #[test]
    fn absent_date_yields_an_empty_view() {
        let view = View::new(county_table());
        let empty = view.date(Some(date("2021-01-01")));
        assert!(empty.is_empty());
        assert_eq!(empty.rows().count(), 0);
    }

    #[test]
    fn region_and_date_scopes_compose() {
        let view = View::new(county_table());
        let scoped = view.region(Some("01001")).date(Some(date("2020-09-27")));

        let rows: Vec<_> = scoped.rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cases, 100);
        assert_eq!(rows[0].date, date("2020-09-27"));
    }

    #[test]
    fn tables_without_codes_ignore_region_scopes() {
        let country = Arc::new(Table {
            dates: vec![date("2020-09-27")],
            fips: None,
            cases: vec![7_115_491],
            deaths: vec![204_113],
            states: None,
            counties: None,
        });

        let view = View::new(country);
        assert_eq!(view.region(Some("42")).len(), 1);
    }

    #[test]
    fn column_accessors_follow_the_scope() {
        let view = View::new(mixed_table()).region(Some("01001"));
        assert_eq!(view.cases(), vec![10]);
        assert_eq!(view.fips_codes(), vec!["01001"]);
    }
}

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Table – one loaded source file, stored column-oriented
// ---------------------------------------------------------------------------

/// A loaded case-count table. Immutable once built; columns are parallel
/// vectors of equal length, rows kept in file order.
///
/// The country-level file carries no `fips` column, and only the state and
/// county files carry the corresponding name columns, so those are optional.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Reporting date of each row.
    pub dates: Vec<NaiveDate>,
    /// Geographic code per row: 2 digits for states, 5 for counties.
    /// `None` when the source file has no such column (country level).
    pub fips: Option<Vec<String>>,
    /// Cumulative case count per row.
    pub cases: Vec<i64>,
    /// Cumulative death count per row.
    pub deaths: Vec<i64>,
    /// State display name per row, when the file carries one.
    pub states: Option<Vec<String>>,
    /// County display name per row, when the file carries one.
    pub counties: Option<Vec<String>>,
}

impl Table {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Whether the table carries a geographic code column.
    pub fn has_fips(&self) -> bool {
        self.fips.is_some()
    }

    /// The row at `index`. Panics if out of range, like slice indexing.
    pub fn record(&self, index: usize) -> Record<'_> {
        Record {
            date: self.dates[index],
            fips: self.fips.as_ref().map(|col| col[index].as_str()),
            cases: self.cases[index],
            deaths: self.deaths[index],
            state: self.states.as_ref().map(|col| col[index].as_str()),
            county: self.counties.as_ref().map(|col| col[index].as_str()),
        }
    }

    /// Most recent date present in the table.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.dates.iter().copied().max()
    }
}

// ---------------------------------------------------------------------------
// Record – a borrowed row
// ---------------------------------------------------------------------------

/// One row of a [`Table`], borrowing the string columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub date: NaiveDate,
    pub fips: Option<&'a str>,
    pub cases: i64,
    pub deaths: i64,
    pub state: Option<&'a str>,
    pub county: Option<&'a str>,
}

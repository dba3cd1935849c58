use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, Date32Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use thiserror::Error;

use super::model::Table;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong while loading a source file. A load either
/// succeeds or fails synchronously with one of these; there is no retry.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: {message}")]
    Malformed { row: usize, message: String },
    #[error("reading CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("parsing GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reading parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("reading arrow batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a case-count table from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv` – NY Times layout: `date,cases,deaths` plus optional
///   `fips`, `state`, `county` columns
/// * `.parquet` – the same columns as flat arrays (compact form of the
///   large county table)
pub fn load_table(path: &Path) -> Result<Table, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names. `date`, `cases`, and `deaths`
/// are required; `fips`, `state`, and `county` are optional (the country
/// file has none of the three). Codes stay strings so "01001" keeps its
/// leading zero.
fn load_csv(path: &Path) -> Result<Table, LoadError> {
    let mut reader = csv::Reader::from_reader(open(path)?);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let col = |name: &str| headers.iter().position(|h| h == name);
    let date_idx = col("date").ok_or(LoadError::MissingColumn("date"))?;
    let cases_idx = col("cases").ok_or(LoadError::MissingColumn("cases"))?;
    let deaths_idx = col("deaths").ok_or(LoadError::MissingColumn("deaths"))?;
    let fips_idx = col("fips");
    let state_idx = col("state");
    let county_idx = col("county");

    let mut table = Table {
        fips: fips_idx.map(|_| Vec::new()),
        states: state_idx.map(|_| Vec::new()),
        counties: county_idx.map(|_| Vec::new()),
        ..Table::default()
    };

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        table.dates.push(parse_date(cell(date_idx), row_no)?);
        table.cases.push(parse_count(cell(cases_idx), row_no, "cases")?);
        table.deaths.push(parse_count(cell(deaths_idx), row_no, "deaths")?);

        if let (Some(idx), Some(col)) = (fips_idx, table.fips.as_mut()) {
            col.push(cell(idx).to_string());
        }
        if let (Some(idx), Some(col)) = (state_idx, table.states.as_mut()) {
            col.push(cell(idx).to_string());
        }
        if let (Some(idx), Some(col)) = (county_idx, table.counties.as_mut()) {
            col.push(cell(idx).to_string());
        }
    }

    Ok(table)
}

fn parse_date(s: &str, row: usize) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| LoadError::Malformed {
        row,
        message: format!("'{s}' is not a YYYY-MM-DD date"),
    })
}

/// Some county rows carry no death count at all; an empty cell reads as 0.
fn parse_count(s: &str, row: usize, col: &str) -> Result<i64, LoadError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0);
    }
    s.parse::<i64>().map_err(|_| LoadError::Malformed {
        row,
        message: format!("{col}: '{s}' is not an integer"),
    })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a parquet encoding of the same table: `date` as Date32 or Utf8,
/// counts as Int64 or Int32, codes and names as Utf8.
fn load_parquet(path: &Path) -> Result<Table, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let reader = builder.build()?;

    let mut table = Table::default();
    let mut first_batch = true;

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();

        let date_idx = schema
            .index_of("date")
            .map_err(|_| LoadError::MissingColumn("date"))?;
        let cases_idx = schema
            .index_of("cases")
            .map_err(|_| LoadError::MissingColumn("cases"))?;
        let deaths_idx = schema
            .index_of("deaths")
            .map_err(|_| LoadError::MissingColumn("deaths"))?;

        if first_batch {
            table.fips = schema.index_of("fips").ok().map(|_| Vec::new());
            table.states = schema.index_of("state").ok().map(|_| Vec::new());
            table.counties = schema.index_of("county").ok().map(|_| Vec::new());
            first_batch = false;
        }

        extend_dates(&mut table.dates, &batch, date_idx)?;
        extend_counts(&mut table.cases, &batch, cases_idx)?;
        extend_counts(&mut table.deaths, &batch, deaths_idx)?;

        for (name, col) in [
            ("fips", table.fips.as_mut()),
            ("state", table.states.as_mut()),
            ("county", table.counties.as_mut()),
        ] {
            if let (Ok(idx), Some(col)) = (schema.index_of(name), col) {
                extend_strings(col, &batch, idx)?;
            }
        }
    }

    Ok(table)
}

// -- Arrow column helpers --

fn extend_dates(
    out: &mut Vec<NaiveDate>,
    batch: &RecordBatch,
    idx: usize,
) -> Result<(), LoadError> {
    let col = batch.column(idx);
    match col.data_type() {
        DataType::Date32 => {
            let arr = col.as_any().downcast_ref::<Date32Array>().unwrap();
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            for row in 0..arr.len() {
                out.push(epoch + chrono::Duration::days(arr.value(row) as i64));
            }
        }
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>().unwrap();
            for row in 0..arr.len() {
                out.push(parse_date(arr.value(row), row)?);
            }
        }
        other => {
            return Err(LoadError::Malformed {
                row: 0,
                message: format!("date column has type {other:?}, expected Date32 or Utf8"),
            })
        }
    }
    Ok(())
}

fn extend_counts(out: &mut Vec<i64>, batch: &RecordBatch, idx: usize) -> Result<(), LoadError> {
    let col = batch.column(idx);
    match col.data_type() {
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            for row in 0..arr.len() {
                out.push(if arr.is_null(row) { 0 } else { arr.value(row) });
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            for row in 0..arr.len() {
                out.push(if arr.is_null(row) { 0 } else { arr.value(row) as i64 });
            }
        }
        other => {
            return Err(LoadError::Malformed {
                row: 0,
                message: format!("count column has type {other:?}, expected Int64 or Int32"),
            })
        }
    }
    Ok(())
}

fn extend_strings(out: &mut Vec<String>, batch: &RecordBatch, idx: usize) -> Result<(), LoadError> {
    let col = batch.column(idx);
    let arr = col
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| LoadError::Malformed {
            row: 0,
            message: format!("string column has type {:?}, expected Utf8", col.data_type()),
        })?;
    for row in 0..arr.len() {
        out.push(if arr.is_null(row) {
            String::new()
        } else {
            arr.value(row).to_string()
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_county_csv() {
        let file = csv_file(
            "date,county,state,fips,cases,deaths\n\
             2020-09-27,Autauga,Alabama,01001,1769,26\n\
             2020-09-28,Autauga,Alabama,01001,1785,26\n",
        );

        let table = load_table(file.path()).unwrap();
        assert_eq!(table.len(), 2);

        let rec = table.record(0);
        assert_eq!(rec.fips, Some("01001"), "leading zero must survive");
        assert_eq!(rec.county, Some("Autauga"));
        assert_eq!(rec.cases, 1769);
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2020, 9, 27).unwrap());
    }

    #[test]
    fn loads_country_csv_without_fips() {
        let file = csv_file(
            "date,cases,deaths\n\
             2020-09-27,7115491,204113\n",
        );

        let table = load_table(file.path()).unwrap();
        assert!(!table.has_fips());
        assert_eq!(table.record(0).cases, 7_115_491);
    }

    #[test]
    fn empty_death_cell_reads_as_zero() {
        let file = csv_file(
            "date,county,state,fips,cases,deaths\n\
             2020-09-27,Unknown,Guam,66,398,\n",
        );

        let table = load_table(file.path()).unwrap();
        assert_eq!(table.record(0).deaths, 0);
    }

    #[test]
    fn missing_date_column_is_a_load_error() {
        let file = csv_file("day,cases,deaths\n2020-09-27,1,0\n");
        let err = load_table(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("date")));
    }

    #[test]
    fn malformed_date_cell_is_a_load_error() {
        let file = csv_file("date,cases,deaths\nSeptember 27,1,0\n");
        let err = load_table(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { row: 0, .. }));
    }

    #[test]
    fn nonexistent_path_is_a_load_error() {
        let err = load_table(Path::new("/no/such/file.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn unsupported_extension_is_a_load_error() {
        let err = load_table(Path::new("cases.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ext) if ext == "xlsx"));
    }

    #[test]
    fn loads_parquet_round_trip() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("date", DataType::Utf8, false),
            Field::new("fips", DataType::Utf8, true),
            Field::new("cases", DataType::Int64, false),
            Field::new("deaths", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["2020-09-27", "2020-09-28"])),
                Arc::new(StringArray::from(vec![Some("01001"), None])),
                Arc::new(Int64Array::from(vec![1769, 1785])),
                Arc::new(Int64Array::from(vec![Some(26), None])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new()
            .suffix(".parquet")
            .tempfile()
            .unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_table(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.record(0).fips, Some("01001"));
        assert_eq!(table.record(1).fips, Some(""), "null code reads as empty");
        assert_eq!(table.record(1).deaths, 0, "null count reads as zero");
    }
}

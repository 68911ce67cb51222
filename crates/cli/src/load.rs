//! CSV loader: turns job export files into engine records.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use jobrecon::model::{columns, source_name_from_path};
use jobrecon::{Record, ReconError, SourceRecords, Value};

/// Columns a comparison input must carry.
pub const COMPARE_COLUMNS: &[&str] = &[columns::EQUIPMENT_CODE];

/// Columns a lifecycle analysis input must carry.
pub const ANALYSIS_COLUMNS: &[&str] = &[
    columns::EQUIPMENT_CODE,
    columns::EQUIPMENT_NAME,
    columns::JOB_TITLE,
    columns::PRIMARY_FREQUENCY,
    columns::LAST_DONE_DATE,
    columns::NEXT_DUE_DATE,
    columns::SAFETY_LEVEL,
    columns::CRITICAL_TO_SAFETY,
];

/// Load one CSV file. The source is named `name`, or the file stem.
pub fn load_source(path: &Path, name: Option<String>, required: &[&str]) -> Result<SourceRecords, ReconError> {
    let name = name.unwrap_or_else(|| source_name_from_path(path));
    let file = File::open(path)
        .map_err(|e| ReconError::Io(io::Error::new(e.kind(), format!("cannot read {}: {e}", path.display()))))?;
    let records = read_records(&name, file, required)?;
    tracing::debug!(source = %name, path = %path.display(), records = records.len(), "loaded source");
    Ok(SourceRecords::new(name, records))
}

/// Parse CSV with a header row. Empty cells become [`Value::Empty`]; every
/// other cell is kept as text so codes like `0601` survive untouched.
pub fn read_records<R: Read>(source_name: &str, reader: R, required: &[&str]) -> Result<Vec<Record>, ReconError> {
    let csv_err = |e: csv::Error| ReconError::Csv {
        source_name: source_name.to_string(),
        message: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    require_columns(source_name, &headers, required)?;

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row.map_err(csv_err)?;
        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(i, column)| (column.as_str(), cell_value(row.get(i))))
            .collect();
        records.push(record);
    }
    Ok(records)
}

fn cell_value(cell: Option<&str>) -> Value {
    match cell {
        None | Some("") => Value::Empty,
        Some(text) => Value::Text(text.to_string()),
    }
}

pub fn require_columns(source_name: &str, headers: &[String], required: &[&str]) -> Result<(), ReconError> {
    match required.iter().find(|c| !headers.iter().any(|h| h == *c)) {
        Some(column) => Err(ReconError::MissingColumn {
            source_name: source_name.to_string(),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_load_as_text_or_empty() {
        let data = "Equipment Code,Equipment Name,Job Title\n0601,Main Engine,\n";
        let records = read_records("a", data.as_bytes(), COMPARE_COLUMNS).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(columns::EQUIPMENT_CODE), Some(&Value::from("0601")));
        assert_eq!(records[0].get(columns::JOB_TITLE), Some(&Value::Empty));
        assert_eq!(records[0].job_title(), "Unknown");
    }

    #[test]
    fn short_rows_pad_with_empty() {
        let data = "Equipment Code,Equipment Name\n12\n";
        let records = read_records("a", data.as_bytes(), COMPARE_COLUMNS).unwrap();
        assert_eq!(records[0].get(columns::EQUIPMENT_NAME), Some(&Value::Empty));
    }

    #[test]
    fn headers_are_trimmed_and_bom_stripped() {
        let data = "\u{feff}Equipment Code , Job Title\n12,Inspect\n";
        let records = read_records("a", data.as_bytes(), COMPARE_COLUMNS).unwrap();
        assert_eq!(records[0].equipment_code(), "12");
        assert_eq!(records[0].job_title(), "Inspect");
    }

    #[test]
    fn missing_required_column() {
        let data = "Code,Name\n12,Pump\n";
        let err = read_records("vessel", data.as_bytes(), COMPARE_COLUMNS).unwrap_err();
        match err {
            ReconError::MissingColumn { source_name, column } => {
                assert_eq!(source_name, "vessel");
                assert_eq!(column, columns::EQUIPMENT_CODE);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_only_file_is_empty_not_an_error() {
        let data = "Equipment Code\n";
        let records = read_records("a", data.as_bytes(), COMPARE_COLUMNS).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_source(Path::new("/nonexistent/jobs.csv"), None, COMPARE_COLUMNS).unwrap_err();
        assert!(matches!(err, ReconError::Io(_)));
        assert!(err.to_string().contains("/nonexistent/jobs.csv"));
    }
}

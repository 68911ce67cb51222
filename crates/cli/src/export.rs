//! Table and JSON writers shared by the subcommands.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use jobrecon::Table;

use crate::CliError;

/// Write a table as CSV with a header row.
pub fn write_table_csv<W: Write>(table: &Table, out: W) -> Result<(), CliError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(&table.columns)
        .map_err(|e| CliError::general(format!("CSV write error: {e}")))?;
    for row in &table.rows {
        wtr.write_record(row)
            .map_err(|e| CliError::general(format!("CSV write error: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| CliError::general(format!("CSV write error: {e}")))?;
    Ok(())
}

pub fn write_table_file(table: &Table, path: &Path) -> Result<(), CliError> {
    let file = fs::File::create(path)
        .map_err(|e| CliError::general(format!("cannot write {}: {e}", path.display())))?;
    write_table_csv(table, file)
}

/// Write each named table to `<dir>/<name>.csv`, creating `dir` if needed.
pub fn export_tables<'a, I>(dir: &Path, tables: I) -> Result<Vec<PathBuf>, CliError>
where
    I: IntoIterator<Item = (&'a str, &'a Table)>,
{
    fs::create_dir_all(dir)
        .map_err(|e| CliError::general(format!("cannot create {}: {e}", dir.display())))?;

    let mut written = Vec::new();
    for (name, table) in tables {
        let path = dir.join(format!("{name}.csv"));
        write_table_file(table, &path)?;
        tracing::debug!(path = %path.display(), rows = table.len(), "exported table");
        written.push(path);
    }
    Ok(written)
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))
}

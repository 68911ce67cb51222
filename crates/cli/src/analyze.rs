//! `jobrecon analyze`: series breakdown and lifecycle subsets of one export.

use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;

use jobrecon::hierarchy::{group_table, tree_table, Depth};
use jobrecon::model::columns;
use jobrecon::{AnalysisResult, Table};

use crate::export::{export_tables, to_json, write_table_csv};
use crate::load::{load_source, ANALYSIS_COLUMNS};
use crate::{load_config, CliError};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Job export CSV file
    pub file: PathBuf,

    /// TOML config (excluded frequencies, date formats, taxonomy overrides)
    #[arg(long, short = 'c', env = "JOBRECON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Evaluation date for overdue checks (default: config, then today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub as_of: Option<NaiveDate>,

    /// Output the full analysis as JSON
    #[arg(long)]
    pub json: bool,

    /// Write one CSV per job subset into this directory
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,
}

pub fn cmd_analyze(args: AnalyzeArgs) -> Result<(), CliError> {
    let (config, _) = load_config(args.config.as_deref())?;
    let source = load_source(&args.file, None, ANALYSIS_COLUMNS)
        .map_err(|e| CliError::load(&e, ANALYSIS_COLUMNS))?;

    let as_of = args
        .as_of
        .or(config.analysis.as_of)
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let result = jobrecon::analyze(&config, &source, as_of);

    for err in &result.date_errors {
        // 1-based data record; quoted cells may span several file lines.
        eprintln!(
            "warning: record {}: unreadable {} '{}'",
            err.row + 1,
            err.column,
            err.value
        );
    }

    if args.json {
        println!("{}", to_json(&result)?);
    } else {
        write_table_csv(&group_table(&result.series, Depth::Series), io::stdout().lock())?;
        print_summary(&result);
    }

    if let Some(ref dir) = args.export_dir {
        let tables = export_set(&result);
        let written = export_tables(dir, tables.iter().map(|(name, table)| (*name, table)))?;
        eprintln!("wrote {} file(s) to {}", written.len(), dir.display());
    }

    Ok(())
}

/// Every exportable table of an analysis, with its file stem.
fn export_set(result: &AnalysisResult) -> Vec<(&'static str, Table)> {
    let mut critical_equipment = Table::new(vec![columns::EQUIPMENT_NAME.to_string()]);
    for name in &result.critical_equipment {
        critical_equipment.push_row(vec![name.clone()]);
    }

    let mut tables = vec![
        ("Series_Analysis", group_table(&result.series, Depth::Series)),
        ("Sub_Series_Analysis", group_table(&result.sub_series, Depth::SubSeries)),
        ("Equipment_Tree", tree_table(&result.tree)),
        ("Critical_Equipment", critical_equipment),
    ];
    tables.extend(
        result
            .tables
            .named()
            .into_iter()
            .map(|(name, table)| (name, table.clone())),
    );
    tables
}

fn print_summary(result: &AnalysisResult) {
    let s = &result.summary;
    eprintln!(
        "{}: {} job(s) as of {} ({} excluded by frequency)",
        result.source, s.evaluated_jobs, result.as_of, s.excluded_jobs,
    );
    eprintln!(
        "  triggered {}, non-triggered {}, overdue {}, duplicates {}, invalid dates {}",
        s.triggered, s.non_triggered, s.overdue, s.duplicates, s.invalid_last_done,
    );
    eprintln!(
        "  critical equipment {}, critical jobs {}",
        s.critical_equipment, s.critical_jobs,
    );
    for name in &result.critical_equipment {
        eprintln!("    {name}");
    }
}

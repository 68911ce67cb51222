//! `jobrecon compare`: cross-source reconciliation of job exports.

use std::io;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use jobrecon::model::{DrillDown, ReconMeta, ReconTable, SourceDuplicates};
use jobrecon::summary::ReconSummary;
use jobrecon::{ReconInput, ReconResult};

use crate::exit_codes::EXIT_MISMATCH;
use crate::export::{to_json, write_table_csv, write_table_file};
use crate::load::{load_source, COMPARE_COLUMNS};
use crate::{load_config, CliError};

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Job export CSV files, one per source; column order follows argument order
    pub files: Vec<PathBuf>,

    /// TOML config (sources, mismatch policy, duplicate key)
    #[arg(long, short = 'c', env = "JOBRECON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep only rows whose indicators disagree
    #[arg(long)]
    pub mismatches_only: bool,

    /// Print matched jobs per source for a master code (repeatable)
    #[arg(long = "drill", value_name = "CODE")]
    pub drill: Vec<String>,

    /// Output JSON instead of CSV
    #[arg(long)]
    pub json: bool,

    /// Write output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Exit with code 6 when any row mismatches
    #[arg(long)]
    pub fail_on_mismatch: bool,
}

#[derive(Serialize)]
struct CompareOutput<'a> {
    meta: &'a ReconMeta,
    summary: &'a ReconSummary,
    table: ReconTable,
    duplicates: &'a [SourceDuplicates],
    drill_down: Vec<DrillDown>,
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    let (config, base_dir) = load_config(args.config.as_deref())?;

    let inputs: Vec<(PathBuf, Option<String>)> = if args.files.is_empty() {
        config
            .sources
            .iter()
            .map(|s| (base_dir.join(&s.file), Some(s.source_name())))
            .collect()
    } else {
        args.files.iter().map(|f| (f.clone(), None)).collect()
    };

    if inputs.is_empty() {
        return Err(CliError::usage("no input files")
            .with_hint("pass CSV files or list [[sources]] in --config"));
    }

    let mut sources = Vec::with_capacity(inputs.len());
    for (path, name) in inputs {
        let source = load_source(&path, name, COMPARE_COLUMNS).map_err(|e| CliError::load(&e, COMPARE_COLUMNS))?;
        sources.push(source);
    }

    let result = jobrecon::run(&config, ReconInput { sources }).map_err(|e| CliError::recon(&e))?;

    let mut drill_down = Vec::with_capacity(args.drill.len());
    for code in &args.drill {
        match result.drill_down(code.trim()) {
            Some(d) => drill_down.push(d),
            None => eprintln!("note: '{code}' is not a master code"),
        }
    }

    if args.json {
        let output = CompareOutput {
            meta: &result.meta,
            summary: &result.summary,
            table: filtered_table(&result, args.mismatches_only),
            duplicates: &result.duplicates,
            drill_down,
        };
        let json = to_json(&output)?;
        match args.output {
            Some(ref path) => {
                std::fs::write(path, &json)
                    .map_err(|e| CliError::general(format!("cannot write {}: {e}", path.display())))?;
                eprintln!("wrote {}", path.display());
            }
            None => println!("{json}"),
        }
    } else {
        let table = result.table.to_table(args.mismatches_only);
        match args.output {
            Some(ref path) => {
                write_table_file(&table, path)?;
                eprintln!("wrote {}", path.display());
            }
            None => write_table_csv(&table, io::stdout().lock())?,
        }
        print_duplicates(&result.duplicates);
        for d in &drill_down {
            print_drill_down(d);
        }
    }

    let s = &result.summary;
    eprintln!(
        "{} source(s): {} master code(s), {} mismatch(es)",
        s.sources.len(),
        s.master_codes,
        s.mismatches,
    );

    if args.fail_on_mismatch && s.mismatches > 0 {
        return Err(CliError::new(EXIT_MISMATCH, format!("{} mismatched row(s)", s.mismatches)));
    }
    Ok(())
}

fn filtered_table(result: &ReconResult, mismatches_only: bool) -> ReconTable {
    ReconTable {
        sources: result.table.sources.clone(),
        rows: result
            .table
            .rows
            .iter()
            .filter(|r| !mismatches_only || r.mismatch)
            .cloned()
            .collect(),
    }
}

fn print_duplicates(duplicates: &[SourceDuplicates]) {
    for d in duplicates.iter().filter(|d| !d.is_empty()) {
        eprintln!(
            "duplicates: '{}' has {} row(s) sharing [{}]",
            d.source,
            d.rows.len(),
            d.key.join(", "),
        );
        for (row, record) in d.rows.iter().zip(&d.records) {
            eprintln!("  row {}: {} / {}", row + 1, record.equipment_code(), record.job_title());
        }
    }
}

fn print_drill_down(d: &DrillDown) {
    eprintln!("drill-down {}:", d.equipment_code);
    for source in &d.sources {
        eprintln!("  {}: {} match(es)", source.source, source.count);
        for job in &source.jobs {
            eprintln!("    {} / {}", job.equipment_name, job.job_title);
        }
    }
}

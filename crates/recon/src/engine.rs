use std::collections::HashSet;

use chrono::NaiveDate;

use crate::config::ReconConfig;
use crate::duplicates::duplicate_positions;
use crate::error::ReconError;
use crate::hierarchy::{classify, classify_records, group_counts, Depth};
use crate::lifecycle::{critical_jobs_table, evaluate, jobs_table};
use crate::master::resolve_master;
use crate::matcher::reconcile;
use crate::model::{
    AnalysisResult, AnalysisTables, ReconInput, ReconMeta, ReconResult, SourceDataset, SourceDuplicates,
    SourceRecords,
};
use crate::summary::{compute_summary, summarize_evaluation};

/// Run a cross-source comparison. Returns the reconciliation table, the
/// drill-down index, per-source duplicates and a summary.
///
/// Zero sources is not an error; every table in the result is just empty.
pub fn run(config: &ReconConfig, input: ReconInput) -> Result<ReconResult, ReconError> {
    {
        let mut seen = HashSet::new();
        for source in &input.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(ReconError::DuplicateSource(source.name.clone()));
            }
        }
    }

    let options = config.compare.index_options();
    let datasets: Vec<SourceDataset> = input
        .sources
        .into_iter()
        .map(|source| {
            let dataset = SourceDataset::with_options(source.name, source.records, options);
            tracing::debug!(
                source = %dataset.name,
                records = dataset.records.len(),
                codes = dataset.index.len(),
                "indexed source"
            );
            if dataset.index.dropped_blank() > 0 {
                tracing::warn!(
                    source = %dataset.name,
                    dropped = dataset.index.dropped_blank(),
                    "dropped records with blank equipment code"
                );
            }
            dataset
        })
        .collect();

    let duplicates: Vec<SourceDuplicates> = datasets
        .iter()
        .map(|d| source_duplicates(d, &config.compare.duplicate_key))
        .collect();

    let master = resolve_master(datasets.iter().map(|d| &d.index));
    if master.is_empty() {
        tracing::info!("no equipment codes in input");
    }

    let (table, matches) = reconcile(&master, &datasets, config.compare.mismatch);
    let summary = compute_summary(&table, &datasets, &duplicates);

    tracing::info!(
        sources = datasets.len(),
        master_codes = summary.master_codes,
        mismatches = summary.mismatches,
        "comparison complete"
    );

    Ok(ReconResult {
        meta: ReconMeta::new(&config.name),
        summary,
        table,
        duplicates,
        matches,
        datasets,
    })
}

fn source_duplicates(dataset: &SourceDataset, key: &[String]) -> SourceDuplicates {
    let rows = duplicate_positions(&dataset.records, key);
    if !rows.is_empty() {
        tracing::warn!(source = %dataset.name, rows = rows.len(), "duplicate jobs");
    }
    SourceDuplicates {
        source: dataset.name.clone(),
        key: key.to_vec(),
        records: rows.iter().map(|&i| dataset.records[i].clone()).collect(),
        rows,
    }
}

/// Classify and evaluate the jobs of one source as of `as_of`.
pub fn analyze(config: &ReconConfig, source: &SourceRecords, as_of: NaiveDate) -> AnalysisResult {
    let options = config.analysis.lifecycle_options();
    let evaluation = evaluate(&source.records, as_of, &options);
    let taxonomy = config.taxonomy();

    let series = classify(evaluation.records(), &taxonomy);
    let sub_series = group_counts(evaluation.records(), &taxonomy, Depth::SubSeries);
    let tree = classify_records(evaluation.jobs.iter().map(|j| (j.row, j.record)), &taxonomy);

    let tables = AnalysisTables {
        overdue: jobs_table(&evaluation.overdue()),
        triggered: jobs_table(&evaluation.triggered()),
        non_triggered: jobs_table(&evaluation.non_triggered()),
        duplicates: jobs_table(&evaluation.duplicates()),
        critical_jobs: critical_jobs_table(&evaluation.critical_jobs()),
    };

    let summary = summarize_evaluation(source.records.len(), &evaluation);
    tracing::info!(
        source = %source.name,
        jobs = summary.evaluated_jobs,
        excluded = summary.excluded_jobs,
        overdue = summary.overdue,
        "analysis complete"
    );

    AnalysisResult {
        meta: ReconMeta::new(&config.name),
        source: source.name.clone(),
        as_of,
        summary,
        series,
        sub_series,
        tree,
        critical_equipment: evaluation.critical_equipment_names(),
        tables,
        date_errors: evaluation.date_errors.clone(),
    }
}

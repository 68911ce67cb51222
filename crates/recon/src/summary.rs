use serde::Serialize;

use crate::lifecycle::Evaluation;
use crate::model::{ReconTable, SourceDataset, SourceDuplicates};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub records: usize,
    pub distinct_codes: usize,
    /// Master codes with at least one match in this source.
    pub present_codes: usize,
    pub absent_codes: usize,
    pub duplicate_rows: usize,
    pub dropped_blank_codes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub master_codes: usize,
    pub mismatches: usize,
    pub sources: Vec<SourceSummary>,
}

/// Compute summary statistics for a reconciliation run.
pub fn compute_summary(
    table: &ReconTable,
    datasets: &[SourceDataset],
    duplicates: &[SourceDuplicates],
) -> ReconSummary {
    let sources = datasets
        .iter()
        .enumerate()
        .map(|(pos, dataset)| {
            let present_codes = table
                .rows
                .iter()
                .filter(|r| r.indicators.get(pos).is_some_and(|i| i.is_present()))
                .count();
            let duplicate_rows = duplicates
                .iter()
                .find(|d| d.source == dataset.name)
                .map_or(0, |d| d.rows.len());
            SourceSummary {
                name: dataset.name.clone(),
                records: dataset.records.len(),
                distinct_codes: dataset.index.len(),
                present_codes,
                absent_codes: table.rows.len() - present_codes,
                duplicate_rows,
                dropped_blank_codes: dataset.index.dropped_blank(),
            }
        })
        .collect();

    ReconSummary {
        master_codes: table.rows.len(),
        mismatches: table.mismatches().count(),
        sources,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub total_jobs: usize,
    pub excluded_jobs: usize,
    pub evaluated_jobs: usize,
    pub triggered: usize,
    pub non_triggered: usize,
    pub invalid_last_done: usize,
    pub overdue: usize,
    pub duplicates: usize,
    pub critical_equipment: usize,
    pub critical_jobs: usize,
}

pub fn summarize_evaluation(total_jobs: usize, evaluation: &Evaluation<'_>) -> AnalysisSummary {
    AnalysisSummary {
        total_jobs,
        excluded_jobs: evaluation.excluded,
        evaluated_jobs: evaluation.jobs.len(),
        triggered: evaluation.triggered().len(),
        non_triggered: evaluation.non_triggered().len(),
        invalid_last_done: evaluation.invalid().len(),
        overdue: evaluation.overdue().len(),
        duplicates: evaluation.duplicates().len(),
        critical_equipment: evaluation.critical_equipment_names().len(),
        critical_jobs: evaluation.critical_jobs().len(),
    }
}

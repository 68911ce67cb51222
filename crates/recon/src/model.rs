use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ordered_float::OrderedFloat;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::DateError;
use crate::hierarchy::{GroupCount, TreeRow};
use crate::index::{build_index_with, CodeIndex, IndexOptions, JobEntry};
use crate::summary::{AnalysisSummary, ReconSummary};
use crate::table::Table;

/// Column names the engine reads. Everything else rides along untouched.
pub mod columns {
    pub const EQUIPMENT_CODE: &str = "Equipment Code";
    pub const EQUIPMENT_NAME: &str = "Equipment Name";
    pub const JOB_TITLE: &str = "Job Title";
    pub const JOB_CODE: &str = "Job Code";
    pub const JOB_TYPE: &str = "Job Type";
    pub const PRIMARY_FREQUENCY: &str = "Primary Frequency";
    pub const LAST_DONE_DATE: &str = "Last Done Date";
    pub const NEXT_DUE_DATE: &str = "Next Due Date";
    pub const SAFETY_LEVEL: &str = "Safety Level";
    pub const CRITICAL_TO_SAFETY: &str = "Critical to Safety";
}

/// Substituted for a missing or blank equipment name / job title.
pub const UNKNOWN: &str = "Unknown";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One spreadsheet cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Number(OrderedFloat<f64>),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
            Self::Timestamp(_) => false,
        }
    }

    /// String coercion used for codes and names.
    ///
    /// Integral numbers drop the fraction (`1234.0` -> `1234`) so that a code
    /// typed as a number in one export lines up with the same code typed as
    /// text in another.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(n.into_inner()),
            Self::Timestamp(ts) => {
                if ts.time() == NaiveTime::MIN {
                    ts.date().format("%Y-%m-%d").to_string()
                } else {
                    ts.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        String::new()
    } else if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(OrderedFloat(n))
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Timestamp(d.and_time(NaiveTime::MIN))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Self::Timestamp(ts)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_none(),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) if n.is_nan() => serializer.serialize_none(),
            Self::Number(n) => serializer.serialize_f64(n.into_inner()),
            Self::Timestamp(_) => serializer.serialize_str(&self.to_text()),
        }
    }
}

/// A loaded spreadsheet row: column name -> value, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Insert or replace a column's value. New columns keep insertion order.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some((_, v)) => *v = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Trimmed text of a column; `None` when absent or blank.
    pub fn text(&self, column: &str) -> Option<String> {
        let value = self.get(column)?;
        if value.is_empty() {
            return None;
        }
        Some(value.to_text().trim().to_string())
    }

    /// Untrimmed text of a column, for exact categorical comparisons.
    pub fn raw_text(&self, column: &str) -> Option<String> {
        self.get(column).map(Value::to_text)
    }

    /// Normalized equipment code: coerced to string and trimmed.
    ///
    /// A missing code normalizes to the empty string; it is never replaced
    /// by [`UNKNOWN`].
    pub fn equipment_code(&self) -> String {
        self.get(columns::EQUIPMENT_CODE)
            .map(|v| v.to_text().trim().to_string())
            .unwrap_or_default()
    }

    pub fn equipment_name(&self) -> String {
        self.text(columns::EQUIPMENT_NAME)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn job_title(&self) -> String {
        self.text(columns::JOB_TITLE)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

impl<C: Into<String>, V: Into<Value>> FromIterator<(C, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (C, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (c, v) in iter {
            record.insert(c, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Records of one input, as handed over by the loader.
#[derive(Debug, Clone, Default)]
pub struct SourceRecords {
    pub name: String,
    pub records: Vec<Record>,
}

impl SourceRecords {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self { name: name.into(), records }
    }
}

/// Pre-loaded sources in input order. Order decides the indicator columns.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub sources: Vec<SourceRecords>,
}

/// Source name for an input file: the file name with its extension stripped.
pub fn source_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A source with its derived code index.
#[derive(Debug, Clone)]
pub struct SourceDataset {
    pub name: String,
    pub records: Vec<Record>,
    pub index: CodeIndex,
}

impl SourceDataset {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self::with_options(name, records, IndexOptions::default())
    }

    pub fn with_options(name: impl Into<String>, records: Vec<Record>, options: IndexOptions) -> Self {
        let index = build_index_with(&records, options);
        Self { name: name.into(), records, index }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation output
// ---------------------------------------------------------------------------

/// Per-(master code, source) match summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    Absent,
    Present(usize),
}

impl Indicator {
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            Self::Absent
        } else {
            Self::Present(count)
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Self::Absent => 0,
            Self::Present(n) => *n,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "N"),
            Self::Present(n) => write!(f, "Y({n})"),
        }
    }
}

impl Serialize for Indicator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub(crate) fn yes_no<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *flag { "Y" } else { "N" })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationRow {
    pub equipment_code: String,
    /// Sorted union of matched names, `", "`-joined. Empty when nothing matched.
    pub equipment_name: String,
    /// One per source, aligned with [`ReconTable::sources`].
    pub indicators: Vec<Indicator>,
    #[serde(serialize_with = "yes_no")]
    pub mismatch: bool,
}

/// The reconciliation table: one row per master code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconTable {
    pub sources: Vec<String>,
    pub rows: Vec<ReconciliationRow>,
}

impl ReconTable {
    pub fn row(&self, code: &str) -> Option<&ReconciliationRow> {
        self.rows
            .binary_search_by(|r| r.equipment_code.as_str().cmp(code))
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &ReconciliationRow> {
        self.rows.iter().filter(|r| r.mismatch)
    }

    /// Plain table with columns `Equipment Code`, `Equipment Name`, one per
    /// source, `Mismatch`.
    pub fn to_table(&self, mismatches_only: bool) -> Table {
        let mut header = vec![
            columns::EQUIPMENT_CODE.to_string(),
            columns::EQUIPMENT_NAME.to_string(),
        ];
        header.extend(self.sources.iter().cloned());
        header.push("Mismatch".to_string());

        let mut table = Table::new(header);
        for row in self.rows.iter().filter(|r| !mismatches_only || r.mismatch) {
            let mut cells = vec![row.equipment_code.clone(), row.equipment_name.clone()];
            cells.extend(row.indicators.iter().map(Indicator::to_string));
            cells.push(if row.mismatch { "Y" } else { "N" }.to_string());
            table.push_row(cells);
        }
        table
    }
}

/// Matched jobs keyed by (master code, source), for drill-down.
///
/// Kept out of the primary table; only the rows a caller asks for are
/// materialized through [`MatchIndex::drill_down`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchIndex {
    sources: Vec<String>,
    entries: BTreeMap<String, Vec<Vec<JobEntry>>>,
}

impl MatchIndex {
    pub fn new(sources: Vec<String>) -> Self {
        Self { sources, entries: BTreeMap::new() }
    }

    /// Store the per-source matches of one master code, aligned with sources.
    pub fn insert(&mut self, master_code: String, per_source: Vec<Vec<JobEntry>>) {
        debug_assert_eq!(per_source.len(), self.sources.len());
        self.entries.insert(master_code, per_source);
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matched jobs for (master code, source). Unknown keys yield an empty slice.
    pub fn get(&self, master_code: &str, source: &str) -> &[JobEntry] {
        let Some(pos) = self.sources.iter().position(|s| s == source) else {
            return &[];
        };
        self.entries
            .get(master_code)
            .and_then(|per_source| per_source.get(pos))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn drill_down(&self, master_code: &str) -> Option<DrillDown> {
        let per_source = self.entries.get(master_code)?;
        Some(DrillDown {
            equipment_code: master_code.to_string(),
            sources: self
                .sources
                .iter()
                .zip(per_source)
                .map(|(source, jobs)| DrillDownSource {
                    source: source.clone(),
                    count: jobs.len(),
                    jobs: jobs.clone(),
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrillDown {
    pub equipment_code: String,
    pub sources: Vec<DrillDownSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrillDownSource {
    pub source: String,
    pub count: usize,
    pub jobs: Vec<JobEntry>,
}

/// Rows of one source whose duplicate key occurs more than once.
#[derive(Debug, Clone, Serialize)]
pub struct SourceDuplicates {
    pub source: String,
    pub key: Vec<String>,
    /// 0-based row positions within the source, in input order.
    pub rows: Vec<usize>,
    pub records: Vec<Record>,
}

impl SourceDuplicates {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

impl ReconMeta {
    pub fn new(config_name: &str) -> Self {
        Self {
            config_name: config_name.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub table: ReconTable,
    pub duplicates: Vec<SourceDuplicates>,
    #[serde(skip)]
    pub matches: MatchIndex,
    #[serde(skip)]
    pub datasets: Vec<SourceDataset>,
}

impl ReconResult {
    pub fn drill_down(&self, master_code: &str) -> Option<DrillDown> {
        self.matches.drill_down(master_code)
    }

    /// The underlying source rows matched under (master code, source).
    pub fn matched_records(&self, master_code: &str, source: &str) -> Vec<&Record> {
        let Some(dataset) = self.datasets.iter().find(|d| d.name == source) else {
            return Vec::new();
        };
        self.matches
            .get(master_code, source)
            .iter()
            .filter_map(|job| dataset.records.get(job.row))
            .collect()
    }
}

/// Exportable job subsets of an analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisTables {
    pub overdue: Table,
    pub triggered: Table,
    pub non_triggered: Table,
    pub duplicates: Table,
    pub critical_jobs: Table,
}

impl AnalysisTables {
    /// Subsets with their export names.
    pub fn named(&self) -> [(&'static str, &Table); 5] {
        [
            ("Overdue_Jobs", &self.overdue),
            ("Triggered_Jobs", &self.triggered),
            ("Non_Triggered_Jobs", &self.non_triggered),
            ("Duplicate_Jobs", &self.duplicates),
            ("Critical_Jobs", &self.critical_jobs),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub meta: ReconMeta,
    pub source: String,
    pub as_of: NaiveDate,
    pub summary: AnalysisSummary,
    pub series: Vec<GroupCount>,
    pub sub_series: Vec<GroupCount>,
    /// Series and sub-series of every evaluated job.
    pub tree: Vec<TreeRow>,
    /// Distinct names of equipment with `Safety Level` CRITICAL.
    pub critical_equipment: Vec<String>,
    pub tables: AnalysisTables,
    pub date_errors: Vec<DateError>,
}

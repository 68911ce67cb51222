//! Per-job lifecycle state: triggered, overdue, critical, duplicate.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::duplicates::duplicate_positions;
use crate::error::DateError;
use crate::model::{columns, Record, Value};
use crate::table::Table;

/// Text date layouts tried in order; the first that parses wins. Slash
/// dates read month-first, day-first only when the month is out of range.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%b-%Y",
    "%d-%b-%Y %H:%M",
    "%m/%d/%Y",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d",
];

pub const CRITICAL: &str = "CRITICAL";
pub const YES: &str = "YES";

#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// `Primary Frequency` values whose jobs are dropped before evaluation.
    pub exclude_frequencies: Vec<String>,
    pub date_formats: Vec<String>,
    pub duplicate_key: Vec<String>,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            exclude_frequencies: vec!["0 EVENT".into()],
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            duplicate_key: vec![
                columns::EQUIPMENT_CODE.into(),
                columns::EQUIPMENT_NAME.into(),
                columns::JOB_TITLE.into(),
            ],
        }
    }
}

/// Outcome of reading a nullable date cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Null,
    Date(NaiveDate),
    Invalid,
}

impl DateField {
    pub fn date(self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(d),
            Self::Null | Self::Invalid => None,
        }
    }
}

/// Read a date cell. Numbers are not dates.
pub fn parse_date<S: AsRef<str>>(value: Option<&Value>, formats: &[S]) -> DateField {
    let Some(value) = value else {
        return DateField::Null;
    };
    if value.is_empty() {
        return DateField::Null;
    }
    match value {
        Value::Timestamp(ts) => DateField::Date(ts.date()),
        Value::Text(s) => parse_text_date(s.trim(), formats)
            .map(DateField::Date)
            .unwrap_or(DateField::Invalid),
        Value::Number(_) | Value::Empty => DateField::Invalid,
    }
}

fn parse_text_date<S: AsRef<str>>(s: &str, formats: &[S]) -> Option<NaiveDate> {
    formats.iter().find_map(|fmt| {
        let fmt = fmt.as_ref();
        NaiveDate::parse_from_str(s, fmt)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(s, fmt).ok().map(|ts| ts.date()))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Yes,
    No,
    /// `Last Done Date` is present but unreadable.
    Invalid,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "Y"),
            Self::No => write!(f, "N"),
            Self::Invalid => write!(f, "INVALID"),
        }
    }
}

impl Serialize for Trigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedJob<'a> {
    /// 0-based position in the input records.
    pub row: usize,
    pub record: &'a Record,
    pub triggered: Trigger,
    pub last_done: Option<NaiveDate>,
    pub next_due: Option<NaiveDate>,
}

impl EvaluatedJob<'_> {
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.next_due.is_some_and(|due| due < as_of)
    }

    pub fn is_critical_equipment(&self) -> bool {
        self.record.raw_text(columns::SAFETY_LEVEL).as_deref() == Some(CRITICAL)
    }

    pub fn is_critical_job(&self) -> bool {
        self.is_critical_equipment()
            && self.record.raw_text(columns::CRITICAL_TO_SAFETY).as_deref() == Some(YES)
    }
}

#[derive(Debug, Clone)]
pub struct Evaluation<'a> {
    pub as_of: NaiveDate,
    /// Jobs that survived the frequency exclusion, in input order.
    pub jobs: Vec<EvaluatedJob<'a>>,
    pub excluded: usize,
    pub date_errors: Vec<DateError>,
    duplicate_key: Vec<String>,
}

/// Evaluate lifecycle state for every actionable job.
///
/// Jobs whose `Primary Frequency` is excluded never reach any subset. An
/// unreadable `Next Due Date` counts as no due date; an unreadable
/// `Last Done Date` marks that job [`Trigger::Invalid`] and is reported in
/// `date_errors` without failing the batch.
pub fn evaluate<'a>(records: &'a [Record], as_of: NaiveDate, options: &LifecycleOptions) -> Evaluation<'a> {
    let mut jobs = Vec::with_capacity(records.len());
    let mut excluded = 0;
    let mut date_errors = Vec::new();

    for (row, record) in records.iter().enumerate() {
        let frequency = record.raw_text(columns::PRIMARY_FREQUENCY);
        if frequency.is_some_and(|f| options.exclude_frequencies.iter().any(|x| *x == f)) {
            excluded += 1;
            continue;
        }

        let last_done_raw = record.get(columns::LAST_DONE_DATE);
        let last_done = parse_date(last_done_raw, &options.date_formats);
        let triggered = match last_done {
            DateField::Null => Trigger::No,
            DateField::Date(_) => Trigger::Yes,
            DateField::Invalid => {
                date_errors.push(DateError {
                    row,
                    column: columns::LAST_DONE_DATE.to_string(),
                    value: last_done_raw.map(Value::to_text).unwrap_or_default(),
                });
                Trigger::Invalid
            }
        };

        let next_due = parse_date(record.get(columns::NEXT_DUE_DATE), &options.date_formats).date();

        jobs.push(EvaluatedJob {
            row,
            record,
            triggered,
            last_done: last_done.date(),
            next_due,
        });
    }

    if !date_errors.is_empty() {
        tracing::warn!(count = date_errors.len(), "unreadable last done dates");
    }

    Evaluation {
        as_of,
        jobs,
        excluded,
        date_errors,
        duplicate_key: options.duplicate_key.clone(),
    }
}

impl<'a> Evaluation<'a> {
    fn select(&self, pred: impl Fn(&EvaluatedJob<'a>) -> bool) -> Vec<&EvaluatedJob<'a>> {
        self.jobs.iter().filter(|j| pred(*j)).collect()
    }

    pub fn overdue(&self) -> Vec<&EvaluatedJob<'a>> {
        self.select(|j| j.is_overdue(self.as_of))
    }

    pub fn triggered(&self) -> Vec<&EvaluatedJob<'a>> {
        self.select(|j| j.triggered == Trigger::Yes)
    }

    pub fn non_triggered(&self) -> Vec<&EvaluatedJob<'a>> {
        self.select(|j| j.triggered == Trigger::No)
    }

    pub fn invalid(&self) -> Vec<&EvaluatedJob<'a>> {
        self.select(|j| j.triggered == Trigger::Invalid)
    }

    /// Jobs sharing their duplicate key with another evaluated job.
    pub fn duplicates(&self) -> Vec<&EvaluatedJob<'a>> {
        duplicate_positions(self.jobs.iter().map(|j| j.record), &self.duplicate_key)
            .into_iter()
            .map(|i| &self.jobs[i])
            .collect()
    }

    pub fn critical_equipment(&self) -> Vec<&EvaluatedJob<'a>> {
        self.select(EvaluatedJob::is_critical_equipment)
    }

    /// Distinct names of critical equipment, first-seen order.
    pub fn critical_equipment_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for job in self.critical_equipment() {
            let name = job.record.equipment_name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn critical_jobs(&self) -> Vec<&EvaluatedJob<'a>> {
        self.select(EvaluatedJob::is_critical_job)
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.jobs.iter().map(|j| j.record)
    }
}

/// Tabulate jobs with a leading `Triggered` column.
pub fn jobs_table(jobs: &[&EvaluatedJob<'_>]) -> Table {
    let mut table = Table::from_records(jobs.iter().map(|j| j.record));
    table.prepend_column("Triggered", jobs.iter().map(|j| j.triggered.to_string()).collect());
    table
}

/// `Equipment Name` / `Job Title` pairs of critical jobs.
pub fn critical_jobs_table(jobs: &[&EvaluatedJob<'_>]) -> Table {
    let mut table = Table::new(vec![
        columns::EQUIPMENT_NAME.to_string(),
        columns::JOB_TITLE.to_string(),
    ]);
    for job in jobs {
        table.push_row(vec![job.record.equipment_name(), job.record.job_title()]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn job(code: &str, freq: &str, last: Value, next: Value) -> Record {
        Record::new()
            .with(columns::EQUIPMENT_CODE, code)
            .with(columns::EQUIPMENT_NAME, format!("Eq {code}"))
            .with(columns::JOB_TITLE, "Inspect")
            .with(columns::PRIMARY_FREQUENCY, freq)
            .with(columns::LAST_DONE_DATE, last)
            .with(columns::NEXT_DUE_DATE, next)
    }

    fn as_of() -> NaiveDate {
        d(2024, 6, 1)
    }

    #[test]
    fn overdue_is_strictly_before_as_of() {
        let records = vec![
            job("1", "1 MONTHS", Value::Empty, d(2024, 5, 30).into()),
            job("2", "1 MONTHS", Value::Empty, Value::Empty),
            job("3", "1 MONTHS", Value::Empty, d(2024, 6, 2).into()),
            job("4", "1 MONTHS", Value::Empty, d(2024, 6, 1).into()),
        ];
        let eval = evaluate(&records, as_of(), &LifecycleOptions::default());
        let overdue: Vec<usize> = eval.overdue().iter().map(|j| j.row).collect();
        assert_eq!(overdue, vec![0]);
    }

    #[test]
    fn overdue_compares_date_component_only() {
        let late_evening = d(2024, 5, 31).and_hms_opt(23, 59, 0).unwrap();
        let same_day = d(2024, 6, 1).and_hms_opt(0, 1, 0).unwrap();
        let records = vec![
            job("1", "1 MONTHS", Value::Empty, late_evening.into()),
            job("2", "1 MONTHS", Value::Empty, same_day.into()),
        ];
        let eval = evaluate(&records, as_of(), &LifecycleOptions::default());
        assert_eq!(eval.overdue().len(), 1);
        assert_eq!(eval.overdue()[0].row, 0);
    }

    #[test]
    fn triggered_follows_last_done_presence() {
        let records = vec![
            job("1", "1 MONTHS", d(2024, 1, 1).into(), Value::Empty),
            job("2", "1 MONTHS", Value::Empty, Value::Empty),
            job("3", "1 MONTHS", "15-Jan-2024".into(), Value::Empty),
        ];
        let eval = evaluate(&records, as_of(), &LifecycleOptions::default());
        assert_eq!(eval.triggered().len(), 2);
        assert_eq!(eval.non_triggered().len(), 1);
        assert_eq!(eval.jobs[2].last_done, Some(d(2024, 1, 15)));
    }

    #[test]
    fn zero_event_jobs_never_reach_any_subset() {
        let records = vec![
            job("1", "0 EVENT", d(2024, 1, 1).into(), d(2024, 1, 2).into()),
            job("2", "0 EVENT", Value::Empty, d(2024, 1, 2).into()),
            job("3", "1 MONTHS", Value::Empty, Value::Empty),
        ];
        let eval = evaluate(&records, as_of(), &LifecycleOptions::default());
        assert_eq!(eval.excluded, 2);
        assert_eq!(eval.jobs.len(), 1);
        assert!(eval.triggered().is_empty());
        assert!(eval.overdue().is_empty());
        assert_eq!(eval.non_triggered().len(), 1);
        assert_eq!(eval.non_triggered()[0].row, 2);
    }

    #[test]
    fn unreadable_next_due_is_no_due_date() {
        let records = vec![job("1", "1 MONTHS", Value::Empty, "soon".into())];
        let eval = evaluate(&records, as_of(), &LifecycleOptions::default());
        assert_eq!(eval.jobs[0].next_due, None);
        assert!(eval.overdue().is_empty());
        assert!(eval.date_errors.is_empty());
    }

    #[test]
    fn unreadable_last_done_is_isolated_to_its_row() {
        let records = vec![
            job("1", "1 MONTHS", "yesterday-ish".into(), Value::Empty),
            job("2", "1 MONTHS", d(2024, 1, 1).into(), Value::Empty),
        ];
        let eval = evaluate(&records, as_of(), &LifecycleOptions::default());
        assert_eq!(eval.jobs[0].triggered, Trigger::Invalid);
        assert_eq!(eval.jobs[1].triggered, Trigger::Yes);
        assert_eq!(eval.invalid().len(), 1);
        assert!(eval.triggered().iter().all(|j| j.row != 0));
        assert!(eval.non_triggered().is_empty());
        assert_eq!(
            eval.date_errors,
            vec![DateError {
                row: 0,
                column: columns::LAST_DONE_DATE.into(),
                value: "yesterday-ish".into(),
            }]
        );
    }

    #[test]
    fn critical_subsets() {
        let records = vec![
            job("1", "1 MONTHS", Value::Empty, Value::Empty)
                .with(columns::SAFETY_LEVEL, "CRITICAL")
                .with(columns::CRITICAL_TO_SAFETY, "YES"),
            job("1", "3 MONTHS", Value::Empty, Value::Empty)
                .with(columns::SAFETY_LEVEL, "CRITICAL")
                .with(columns::CRITICAL_TO_SAFETY, "NO"),
            job("2", "1 MONTHS", Value::Empty, Value::Empty)
                .with(columns::SAFETY_LEVEL, "critical")
                .with(columns::CRITICAL_TO_SAFETY, "YES"),
        ];
        let eval = evaluate(&records, as_of(), &LifecycleOptions::default());
        assert_eq!(eval.critical_equipment().len(), 2);
        assert_eq!(eval.critical_equipment_names(), vec!["Eq 1"]);
        assert_eq!(eval.critical_jobs().len(), 1);
        assert_eq!(eval.critical_jobs()[0].row, 0);

        let table = critical_jobs_table(&eval.critical_jobs());
        assert_eq!(table.rows, vec![vec!["Eq 1".to_string(), "Inspect".to_string()]]);
    }

    #[test]
    fn duplicates_ignore_excluded_jobs() {
        let records = vec![
            job("1", "1 MONTHS", Value::Empty, Value::Empty),
            job("1", "0 EVENT", Value::Empty, Value::Empty),
            job("2", "1 MONTHS", Value::Empty, Value::Empty),
            job("2", "6 MONTHS", Value::Empty, Value::Empty),
        ];
        let eval = evaluate(&records, as_of(), &LifecycleOptions::default());
        let rows: Vec<usize> = eval.duplicates().iter().map(|j| j.row).collect();
        assert_eq!(rows, vec![2, 3]);
    }

    #[test]
    fn jobs_table_leads_with_triggered() {
        let records = vec![job("1", "1 MONTHS", d(2024, 1, 1).into(), Value::Empty)];
        let eval = evaluate(&records, as_of(), &LifecycleOptions::default());
        let table = jobs_table(&eval.triggered());
        assert_eq!(table.columns[0], "Triggered");
        assert_eq!(table.columns[1], columns::EQUIPMENT_CODE);
        assert_eq!(table.rows[0][0], "Y");
    }

    #[test]
    fn parse_date_layouts() {
        let formats = DEFAULT_DATE_FORMATS;
        let text = |s: &str| parse_date(Some(&Value::from(s)), formats);
        assert_eq!(text("2024-05-30"), DateField::Date(d(2024, 5, 30)));
        assert_eq!(text("2024-05-30 13:45:00"), DateField::Date(d(2024, 5, 30)));
        assert_eq!(text("30-May-2024"), DateField::Date(d(2024, 5, 30)));
        assert_eq!(text("  "), DateField::Null);
        assert_eq!(text("n/a"), DateField::Invalid);
        assert_eq!(parse_date(None, formats), DateField::Null);
        assert_eq!(parse_date(Some(&Value::from(45000.0)), formats), DateField::Invalid);
    }

    #[test]
    fn slash_dates_read_month_first() {
        let text = |s: &str| parse_date(Some(&Value::from(s)), DEFAULT_DATE_FORMATS);
        assert_eq!(text("03/04/2024"), DateField::Date(d(2024, 3, 4)));
        assert_eq!(text("5/30/2024"), DateField::Date(d(2024, 5, 30)));
        assert_eq!(text("30/05/2024"), DateField::Date(d(2024, 5, 30)));
    }

    #[test]
    fn minute_precision_timestamps() {
        let text = |s: &str| parse_date(Some(&Value::from(s)), DEFAULT_DATE_FORMATS);
        assert_eq!(text("2024-05-30 13:45"), DateField::Date(d(2024, 5, 30)));
        assert_eq!(text("5/30/2024 0:00"), DateField::Date(d(2024, 5, 30)));
        assert_eq!(text("03/04/2024 08:15"), DateField::Date(d(2024, 3, 4)));
        assert_eq!(text("30/05/2024 23:59"), DateField::Date(d(2024, 5, 30)));
    }

    #[test]
    fn ambiguous_slash_date_sets_overdue_cut() {
        // 03/04/2024 is 4 March, so it is overdue on 1 April.
        let records = vec![job("1", "1 MONTHS", "02/01/2024 10:30".into(), "03/04/2024".into())];
        let eval = evaluate(&records, d(2024, 4, 1), &LifecycleOptions::default());
        assert_eq!(eval.overdue().len(), 1);
        assert_eq!(eval.triggered().len(), 1);
        assert!(eval.date_errors.is_empty());
    }
}

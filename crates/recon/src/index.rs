use std::collections::BTreeMap;
use std::ops::Bound;

use serde::Serialize;

use crate::model::Record;

/// One indexed record: its row position plus the fields shown on drill-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobEntry {
    /// 0-based position in the source's record list.
    pub row: usize,
    pub equipment_name: String,
    pub job_title: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    /// Drop records whose code is blank after trimming instead of indexing
    /// them under `""`.
    pub drop_blank_codes: bool,
}

/// Normalized equipment code -> records sharing it.
///
/// Groups are stored in first-seen order; `slots` maps each code to its
/// group so sorted and prefix lookups go through the ordered map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeIndex {
    slots: BTreeMap<String, usize>,
    groups: Vec<(String, Vec<JobEntry>)>,
    records: usize,
    dropped_blank: usize,
}

impl CodeIndex {
    /// Distinct codes in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn sorted_codes(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    pub fn get(&self, code: &str) -> Option<&[JobEntry]> {
        self.slots.get(code).map(|&slot| self.groups[slot].1.as_slice())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.slots.contains_key(code)
    }

    /// Number of distinct codes.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of indexed records.
    pub fn record_count(&self) -> usize {
        self.records
    }

    pub fn dropped_blank(&self) -> usize {
        self.dropped_blank
    }

    /// Groups in the order their code first appeared in the source.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[JobEntry])> {
        self.groups.iter().map(|(c, jobs)| (c.as_str(), jobs.as_slice()))
    }

    /// Groups whose code starts with `prefix` (a code matches itself), in
    /// first-seen order.
    ///
    /// Codes sharing a prefix are contiguous in byte order, so a range scan
    /// from `prefix` that stops at the first non-match visits only hits.
    pub fn prefix_matches(&self, prefix: &str) -> Vec<(&str, &[JobEntry])> {
        let mut slots: Vec<usize> = self
            .slots
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(code, _)| code.starts_with(prefix))
            .map(|(_, &slot)| slot)
            .collect();
        slots.sort_unstable();
        slots
            .into_iter()
            .map(|slot| {
                let (code, jobs) = &self.groups[slot];
                (code.as_str(), jobs.as_slice())
            })
            .collect()
    }
}

pub fn build_index(records: &[Record]) -> CodeIndex {
    build_index_with(records, IndexOptions::default())
}

/// Group records by normalized equipment code.
///
/// Blank codes are kept under `""` unless `options.drop_blank_codes` is set,
/// so downstream counts never silently lose rows.
pub fn build_index_with(records: &[Record], options: IndexOptions) -> CodeIndex {
    let mut index = CodeIndex::default();

    for (row, record) in records.iter().enumerate() {
        let code = record.equipment_code();
        if code.is_empty() && options.drop_blank_codes {
            index.dropped_blank += 1;
            continue;
        }

        let entry = JobEntry {
            row,
            equipment_name: record.equipment_name(),
            job_title: record.job_title(),
        };

        let slot = match index.slots.get(&code) {
            Some(&slot) => slot,
            None => {
                let slot = index.groups.len();
                index.slots.insert(code.clone(), slot);
                index.groups.push((code, Vec::new()));
                slot
            }
        };
        index.groups[slot].1.push(entry);
        index.records += 1;
    }

    index
}

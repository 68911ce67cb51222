use std::collections::HashMap;

use crate::model::{Record, Value};

static EMPTY: Value = Value::Empty;

/// Positions of every record whose key tuple occurs more than once.
///
/// All members of a duplicate group are reported, not just the repeats, in
/// input order. A column missing from a record compares as empty.
pub fn duplicate_positions<'a, I, S>(records: I, key_columns: &[S]) -> Vec<usize>
where
    I: IntoIterator<Item = &'a Record>,
    S: AsRef<str>,
{
    let keys: Vec<Vec<&Value>> = records
        .into_iter()
        .map(|record| {
            key_columns
                .iter()
                .map(|c| record.get(c.as_ref()).unwrap_or(&EMPTY))
                .collect()
        })
        .collect();

    let mut counts: HashMap<&[&Value], usize> = HashMap::with_capacity(keys.len());
    for key in &keys {
        *counts.entry(key.as_slice()).or_insert(0) += 1;
    }

    keys.iter()
        .enumerate()
        .filter(|(_, key)| counts[key.as_slice()] > 1)
        .map(|(i, _)| i)
        .collect()
}

pub fn find_duplicates<'a, S: AsRef<str>>(records: &'a [Record], key_columns: &[S]) -> Vec<&'a Record> {
    duplicate_positions(records, key_columns)
        .into_iter()
        .map(|i| &records[i])
        .collect()
}

use std::collections::BTreeSet;

use crate::index::CodeIndex;

/// Union of every source's codes, sorted and deduplicated.
///
/// No sources yields an empty list, which callers treat as "no data".
pub fn resolve_master<'a, I>(indices: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a CodeIndex>,
{
    let codes: BTreeSet<&str> = indices.into_iter().flat_map(CodeIndex::codes).collect();
    codes.into_iter().map(str::to_owned).collect()
}

use std::collections::BTreeSet;

use crate::config::MismatchPolicy;
use crate::index::JobEntry;
use crate::model::{Indicator, MatchIndex, ReconTable, ReconciliationRow, SourceDataset};

impl MismatchPolicy {
    pub fn is_mismatch(self, indicators: &[Indicator]) -> bool {
        match self {
            Self::Indicator => indicators.windows(2).any(|w| w[0] != w[1]),
            Self::Presence => indicators.windows(2).any(|w| w[0].is_present() != w[1].is_present()),
        }
    }
}

/// Match every master code against every source by literal prefix.
///
/// For master code `m` and source `s`, every record of `s` whose normalized
/// code starts with `m` is collected; the indicator counts records, not
/// distinct codes. Master codes that are prefixes of one another each scan
/// independently, so one record may count under several master codes.
pub fn reconcile(
    master_codes: &[String],
    sources: &[SourceDataset],
    policy: MismatchPolicy,
) -> (ReconTable, MatchIndex) {
    let source_names: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();
    let mut rows = Vec::with_capacity(master_codes.len());
    let mut index = MatchIndex::new(source_names.clone());

    for master in master_codes {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        let mut indicators = Vec::with_capacity(sources.len());
        let mut per_source: Vec<Vec<JobEntry>> = Vec::with_capacity(sources.len());

        for source in sources {
            let matched: Vec<&JobEntry> = source
                .index
                .prefix_matches(master)
                .into_iter()
                .flat_map(|(_, jobs)| jobs)
                .collect();

            names.extend(matched.iter().copied().map(|j| j.equipment_name.as_str()));
            indicators.push(Indicator::from_count(matched.len()));
            per_source.push(matched.into_iter().cloned().collect());
        }

        let equipment_name = names.into_iter().collect::<Vec<_>>().join(", ");
        let mismatch = policy.is_mismatch(&indicators);

        rows.push(ReconciliationRow {
            equipment_code: master.clone(),
            equipment_name,
            indicators,
            mismatch,
        });
        index.insert(master.clone(), per_source);
    }

    tracing::debug!(
        master_codes = master_codes.len(),
        sources = sources.len(),
        mismatches = rows.iter().filter(|r| r.mismatch).count(),
        "reconciled"
    );

    (ReconTable { sources: source_names, rows }, index)
}

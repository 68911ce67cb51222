use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::hierarchy::Taxonomy;
use crate::index::IndexOptions;
use crate::lifecycle::{LifecycleOptions, DEFAULT_DATE_FORMATS};
use crate::model::{columns, source_name_from_path};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Additions to / overrides of the builtin taxonomy labels.
    #[serde(default)]
    pub taxonomy: BTreeMap<String, String>,
}

fn default_name() -> String {
    "job comparison".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            sources: Vec::new(),
            compare: CompareConfig::default(),
            analysis: AnalysisConfig::default(),
            taxonomy: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub file: String,
    /// Display name; defaults to the file name without extension.
    #[serde(default)]
    pub name: Option<String>,
}

impl SourceConfig {
    pub fn source_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| source_name_from_path(Path::new(&self.file)))
    }
}

// ---------------------------------------------------------------------------
// Compare
// ---------------------------------------------------------------------------

/// When a master code's per-source indicators count as disagreeing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Any difference in indicator strings, so `Y(1)` vs `Y(2)` mismatches.
    #[default]
    Indicator,
    /// Only presence differences; differing non-zero counts agree.
    Presence,
}

impl MismatchPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indicator => "indicator",
            Self::Presence => "presence",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareConfig {
    #[serde(default)]
    pub mismatch: MismatchPolicy,
    #[serde(default = "default_compare_key")]
    pub duplicate_key: Vec<String>,
    #[serde(default)]
    pub drop_blank_codes: bool,
}

fn default_compare_key() -> Vec<String> {
    vec![
        columns::EQUIPMENT_CODE.into(),
        columns::EQUIPMENT_NAME.into(),
        columns::JOB_CODE.into(),
        columns::JOB_TITLE.into(),
    ]
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            mismatch: MismatchPolicy::default(),
            duplicate_key: default_compare_key(),
            drop_blank_codes: false,
        }
    }
}

impl CompareConfig {
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions { drop_blank_codes: self.drop_blank_codes }
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Evaluation date for overdue checks. The CLI defaults it to today.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default = "default_analysis_key")]
    pub duplicate_key: Vec<String>,
    #[serde(default = "default_excluded_frequencies")]
    pub exclude_frequencies: Vec<String>,
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

fn default_analysis_key() -> Vec<String> {
    vec![
        columns::EQUIPMENT_CODE.into(),
        columns::EQUIPMENT_NAME.into(),
        columns::JOB_TITLE.into(),
    ]
}

fn default_excluded_frequencies() -> Vec<String> {
    vec!["0 EVENT".into()]
}

fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            as_of: None,
            duplicate_key: default_analysis_key(),
            exclude_frequencies: default_excluded_frequencies(),
            date_formats: default_date_formats(),
        }
    }
}

impl AnalysisConfig {
    pub fn lifecycle_options(&self) -> LifecycleOptions {
        LifecycleOptions {
            exclude_frequencies: self.exclude_frequencies.clone(),
            date_formats: self.date_formats.clone(),
            duplicate_key: self.duplicate_key.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.compare.duplicate_key.is_empty() {
            return Err(ReconError::ConfigValidation(
                "compare.duplicate_key must name at least one column".into(),
            ));
        }
        if self.analysis.duplicate_key.is_empty() {
            return Err(ReconError::ConfigValidation(
                "analysis.duplicate_key must name at least one column".into(),
            ));
        }
        if self.analysis.date_formats.is_empty() {
            return Err(ReconError::ConfigValidation(
                "analysis.date_formats must not be empty".into(),
            ));
        }

        for code in self.taxonomy.keys() {
            let len = code.chars().count();
            if !(1..=3).contains(&len) {
                return Err(ReconError::ConfigValidation(format!(
                    "taxonomy code '{code}' must be 1 to 3 characters"
                )));
            }
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            let name = source.source_name();
            if !seen.insert(name.clone()) {
                return Err(ReconError::DuplicateSource(name));
            }
        }

        Ok(())
    }

    /// The builtin taxonomy, or an owned copy carrying this config's overrides.
    pub fn taxonomy(&self) -> Cow<'static, Taxonomy> {
        let builtin = Taxonomy::builtin();
        if self.taxonomy.is_empty() {
            Cow::Borrowed(builtin)
        } else {
            Cow::Owned(builtin.with_overrides(&self.taxonomy))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

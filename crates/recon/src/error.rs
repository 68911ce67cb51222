use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty key, bad taxonomy code, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Two inputs resolved to the same source name.
    #[error("duplicate source name '{0}'")]
    DuplicateSource(String),
    /// Missing required column in input data.
    #[error("source '{source_name}': missing column '{column}'")]
    MissingColumn { source_name: String, column: String },
    /// Malformed CSV content.
    #[error("source '{source_name}': {message}")]
    Csv { source_name: String, message: String },
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Row-level failure recorded by the lifecycle evaluator.
///
/// Never aborts a run; the affected record carries it instead of a
/// triggered flag.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[error("row {row}: cannot parse {column} '{value}'")]
pub struct DateError {
    pub row: usize,
    pub column: String,
    pub value: String,
}

pub type Result<T> = std::result::Result<T, ReconError>;

//! `jobrecon`: Maintenance job reconciliation and lifecycle analysis.
//!
//! Pure engine crate: receives pre-loaded records, returns reconciliation
//! tables, drill-down indices and job subsets. No CLI or IO dependencies.

pub mod config;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod index;
pub mod lifecycle;
pub mod master;
pub mod matcher;
pub mod model;
pub mod summary;
pub mod table;

pub use config::{MismatchPolicy, ReconConfig};
pub use engine::{analyze, run};
pub use error::{DateError, ReconError};
pub use model::{AnalysisResult, Record, ReconInput, ReconResult, SourceRecords, Value};
pub use table::Table;

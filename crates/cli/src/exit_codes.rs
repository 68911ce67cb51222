//! CLI Exit Code Registry
//!
//! Single source of truth for `jobrecon` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (unspecified)                        |
//! | 2    | Usage error (bad args, bad date, unknown option)   |
//! | 3    | Invalid config (parse, validation, duplicate name) |
//! | 4    | Input is missing a required column                 |
//! | 5    | Input could not be read or parsed as CSV           |
//! | 6    | Mismatches found (only with `--fail-on-mismatch`)  |

use jobrecon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (e.g. cannot write output).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, no inputs, unparsable `--as-of`.
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// An input lacks a column the command needs.
pub const EXIT_MISSING_COLUMN: u8 = 4;

/// An input file could not be read.
pub const EXIT_INPUT_READ: u8 = 5;

/// Reconciliation found mismatched rows and `--fail-on-mismatch` was set.
pub const EXIT_MISMATCH: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::DuplicateSource(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReconError::Csv { .. } | ReconError::Io(_) => EXIT_INPUT_READ,
    }
}

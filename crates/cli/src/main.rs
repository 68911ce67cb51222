//! `jobrecon`: compare and analyze equipment maintenance job exports.

mod analyze;
mod compare;
mod exit_codes;
mod export;
mod load;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jobrecon::{ReconConfig, ReconError};

use exit_codes::{
    recon_exit_code, EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_MISSING_COLUMN, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "jobrecon")]
#[command(about = "Reconcile maintenance job exports across sources by equipment code")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare job exports and report per-code presence across sources
    #[command(after_help = "\
Examples:
  jobrecon compare vessel_a.csv vessel_b.csv
  jobrecon compare vessel_a.csv vessel_b.csv --mismatches-only -o mismatches.csv
  jobrecon compare vessel_a.csv vessel_b.csv --drill 601 --drill 721
  jobrecon compare --config fleet.toml --json")]
    Compare(compare::CompareArgs),

    /// Classify one job export and list overdue, triggered and critical jobs
    #[command(after_help = "\
Examples:
  jobrecon analyze vessel_a.csv
  jobrecon analyze vessel_a.csv --as-of 2024-06-01 --json
  jobrecon analyze vessel_a.csv --export-dir out/")]
    Analyze(analyze::AnalyzeArgs),

    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  jobrecon validate fleet.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("JOBRECON_GIT_HASH"), ")",
        "\ntarget:  ", env!("JOBRECON_TARGET"),
    )
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "jobrecon=warn",
        1 => "jobrecon=info",
        _ => "jobrecon=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compare(args) => compare::cmd_compare(args),
        Commands::Analyze(args) => analyze::cmd_analyze(args),
        Commands::Validate { config } => cmd_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Engine error with its registry exit code.
    pub fn recon(err: &ReconError) -> Self {
        Self::new(recon_exit_code(err), err.to_string())
    }

    /// Loader error; a missing column hints at the full required list.
    pub fn load(err: &ReconError, required: &[&str]) -> Self {
        let cli = Self::recon(err);
        if cli.code == EXIT_MISSING_COLUMN {
            cli.with_hint(format!("required columns: {}", required.join(", ")))
        } else {
            cli
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Config
// ============================================================================

/// Read and validate a config. Without a path, the defaults apply and
/// relative source paths resolve against the working directory.
pub fn load_config(path: Option<&Path>) -> Result<(ReconConfig, PathBuf), CliError> {
    let Some(path) = path else {
        return Ok((ReconConfig::default(), PathBuf::from(".")));
    };

    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_INVALID_CONFIG, format!("cannot read config {}: {e}", path.display()))
    })?;
    let config = ReconConfig::from_toml(&text).map_err(|e| CliError::recon(&e))?;
    tracing::debug!(config = %path.display(), name = %config.name, "loaded config");

    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((config, base_dir))
}

fn cmd_validate(path: &Path) -> Result<(), CliError> {
    let (config, _) = load_config(Some(path))?;
    eprintln!(
        "valid: '{}' with {} source(s), {} taxonomy override(s), mismatch policy {}",
        config.name,
        config.sources.len(),
        config.taxonomy.len(),
        config.compare.mismatch.as_str(),
    );
    Ok(())
}

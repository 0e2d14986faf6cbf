use colored::Colorize;
use fts_query::FtsError;
use std::fmt;
use std::process;

/// Exit codes for the CLI.
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// Unified error type for CLI operations.
pub enum CliError {
    /// Error from planning or running the search call.
    Search(FtsError),
    /// Argument / usage errors.
    Usage(String),
    /// Failure writing results.
    Output(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Search(FtsError::BadEndpoint { endpoint, .. }) if endpoint.is_empty() => {
                write!(
                    f,
                    "{} {}\n  {} pass --endpoint or set FTS_DEFAULT_ENDPOINT",
                    "error:".red().bold(),
                    self.message(),
                    "help:".cyan().bold(),
                )
            }
            _ => write!(f, "{} {}", "error:".red().bold(), self.message()),
        }
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl CliError {
    fn message(&self) -> String {
        match self {
            CliError::Search(e) => e.to_string(),
            CliError::Usage(msg) | CliError::Output(msg) => msg.clone(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => EXIT_USAGE,
            CliError::Search(e) if e.is_validation() => EXIT_USAGE,
            _ => EXIT_ERROR,
        }
    }
}

impl From<FtsError> for CliError {
    fn from(e: FtsError) -> Self {
        CliError::Search(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Output(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(format!("JSON encode error: {e}"))
    }
}

/// Print error and exit with the appropriate code.
pub fn exit_with_error(err: CliError) -> ! {
    eprintln!("{err}");
    process::exit(err.exit_code())
}

pub type CliResult<T> = std::result::Result<T, CliError>;

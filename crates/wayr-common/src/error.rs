//! Error types for wayr.
//!
//! Only lookups that find nothing (by pid, port, or name) stop a report.
//! Every other failure inside the engine degrades to missing data and never
//! reaches this type; see the collectors for that side of the contract.
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Process Not Found
//!   Reason: process with PID 4242 not found
//!   Troubleshooting tips:
//!     • Verify the PID exists: ps -p 4242
//!     • The process may have terminated
//!     • Check permissions: sudo may be required
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for wayr operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A pid, port, or name yielded no process.
    Lookup,
    /// Nothing to look up was given.
    Usage,
    /// Configuration file errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Lookup => write!(f, "lookup"),
            ErrorCategory::Usage => write!(f, "usage"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// How a name lookup compares candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Case-insensitive substring of the name or command line.
    #[default]
    Substring,
    /// Name equals the query.
    Exact,
}

impl MatchKind {
    pub fn from_exact(exact: bool) -> Self {
        if exact {
            MatchKind::Exact
        } else {
            MatchKind::Substring
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Substring => write!(f, "substring"),
            MatchKind::Exact => write!(f, "exact"),
        }
    }
}

/// Unified error type for wayr.
#[derive(Error, Debug)]
pub enum Error {
    // Lookup errors (20-29)
    #[error("process with PID {pid} not found")]
    ProcessNotFound { pid: u32 },

    #[error("no process listening on port {port}")]
    PortNotFound { port: u16 },

    #[error("no processes found matching '{name}' ({kind} match)")]
    NameNotFound { name: String, kind: MatchKind },

    // Usage errors (30-39)
    #[error("no process name, --pid, or --port given")]
    NoTarget,

    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable error code, grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Lookup errors
    /// - 30-39: Usage errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::ProcessNotFound { .. } => 20,
            Error::PortNotFound { .. } => 21,
            Error::NameNotFound { .. } => 22,
            Error::NoTarget => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ProcessNotFound { .. }
            | Error::PortNotFound { .. }
            | Error::NameNotFound { .. } => ErrorCategory::Lookup,
            Error::NoTarget => ErrorCategory::Usage,
            Error::Config(_) => ErrorCategory::Config,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// True for the three lookups that found nothing.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::Lookup
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::ProcessNotFound { .. } => "Process Not Found",
            Error::PortNotFound { .. } => "Port Not In Use",
            Error::NameNotFound { .. } => "No Matching Processes",
            Error::NoTarget => "Nothing To Look Up",
            Error::Config(_) => "Configuration Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }

    /// Returns the troubleshooting bullets shown under the error.
    pub fn troubleshooting_tips(&self) -> Vec<String> {
        match self {
            Error::ProcessNotFound { pid } => vec![
                format!("Verify the PID exists: ps -p {pid}"),
                "The process may have terminated".to_string(),
                "Check permissions: sudo may be required".to_string(),
            ],
            Error::PortNotFound { port } => vec![
                "Verify the port number is correct".to_string(),
                format!("Check if any process is listening: lsof -i :{port}"),
                "The process might be listening on a different interface".to_string(),
            ],
            Error::NameNotFound { kind, .. } => {
                let mut tips = Vec::new();
                if *kind == MatchKind::Exact {
                    tips.push("Try without --exact flag for fuzzy matching".to_string());
                }
                tips.push("List all processes: ps aux".to_string());
                tips.push("Check if process name is abbreviated in ps output".to_string());
                tips
            }
            Error::NoTarget => vec![
                "Pass a process name, --pid <PID>, or --port <PORT>".to_string(),
                "See 'wayr --help' for all options".to_string(),
            ],
            Error::Config(_) => vec![
                "Check config.json syntax in the wayr config directory".to_string(),
                "Point --config at another directory or unset WAYR_CONFIG_DIR".to_string(),
            ],
            Error::Io(_) => vec!["Check permissions and retry the operation".to_string()],
            Error::Json(_) => vec!["Report this as a bug with the command you ran".to_string()],
        }
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Troubleshooting tips:
///     • [Tip]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, dim, reset) = if use_color {
        ("\x1b[91m", "\x1b[2m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    let mut output = format!(
        "{red}✗{reset} {headline}\n  Reason: {message}",
        headline = err.headline(),
        message = err,
    );

    let tips = err.troubleshooting_tips();
    if !tips.is_empty() {
        output.push_str(&format!("\n  {dim}Troubleshooting tips:{reset}"));
        for tip in tips {
            output.push_str(&format!("\n    • {tip}"));
        }
    }

    output
}

//! Exit codes for the wayr CLI.
//!
//! - 0: report printed (including the multiple-match listing)
//! - 1: nothing found, or nothing to look up
//! - 2: internal failure (I/O, serialization)

use wayr_common::{Error, ErrorCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Report printed.
    Clean,

    /// The pid, port, or name matched no process.
    NotFound,

    /// No target given, or the configuration is unusable.
    ArgsError,

    /// Output could not be written or serialized.
    InternalError,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        match self {
            ExitCode::Clean => 0,
            ExitCode::NotFound | ExitCode::ArgsError => 1,
            ExitCode::InternalError => 2,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Name used in JSON log records.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::NotFound => "ERR_NOT_FOUND",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::InternalError => "ERR_INTERNAL",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Lookup => ExitCode::NotFound,
            ErrorCategory::Usage | ErrorCategory::Config => ExitCode::ArgsError,
            ErrorCategory::Io => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

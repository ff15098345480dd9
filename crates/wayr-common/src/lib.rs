//! wayr common types, IDs, and errors.
//!
//! This crate provides foundational types shared by the wayr engine and CLI:
//! - Process identity type
//! - Error taxonomy with human-facing remediation
//! - Output mode and color selection

pub mod error;
pub mod id;
pub mod output;

pub use error::{format_error_human, Error, ErrorCategory, MatchKind, Result};
pub use id::ProcessId;
pub use output::{ColorChoice, OutputMode};

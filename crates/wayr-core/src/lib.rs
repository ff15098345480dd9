//! wayr core library
//!
//! Answers "why is this process running?" for a pid, a name, or a port:
//! - Process collection through `/proc` or `ps`/`lsof`
//! - Ancestry and descendant reconstruction over a process arena
//! - Supervisor classification (systemd, launchd, docker, shells, ...)
//! - Git, man page, and warning context
//! - Report, tree, short, and JSON renderers
//!
//! The binary entry point is in `main.rs`.

pub mod collect;
pub mod config;
pub mod context;
pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod provenance;

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

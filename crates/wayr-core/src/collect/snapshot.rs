//! Snapshot provider abstraction and backend selection.
//!
//! Two mechanisms expose the process table: the structured `/proc` files on
//! Linux, and the columnar `ps`/`lsof` tools everywhere else. The platform is
//! detected once at startup and the chosen [`ProcessSnapshotSource`] is
//! injected into every component that needs snapshots.

use super::procfs::ProcfsSource;
use super::ps::PsSource;
use super::tool_runner::CommandRunner;
use super::types::ProcessInfo;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use wayr_common::ProcessId;

/// Default mount point of the process filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Turns a pid into a point-in-time [`ProcessInfo`].
///
/// `None` means the process does not exist or is not visible. Implementations
/// never fail past this boundary; sub-lookups (cwd, environment, memory)
/// degrade individually.
pub trait ProcessSnapshotSource {
    fn snapshot(&self, pid: ProcessId) -> Option<ProcessInfo>;

    fn backend(&self) -> Backend;

    /// Process filesystem root, for the kernel-table fallbacks.
    fn proc_root(&self) -> Option<&Path> {
        None
    }
}

/// Host operating system family, decided once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOs,
    Other,
}

impl Platform {
    pub fn detect() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }

    pub fn is_linux(self) -> bool {
        self == Platform::Linux
    }

    /// Backend used when none is requested.
    pub fn default_backend(self) -> Backend {
        match self {
            Platform::Linux => Backend::Procfs,
            Platform::MacOs | Platform::Other => Backend::Ps,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "macos"),
            Platform::Other => write!(f, "other"),
        }
    }
}

/// Concrete snapshot mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Procfs,
    Ps,
}

/// Requested snapshot mechanism (config file or `--backend`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Pick from the detected platform
    #[default]
    Auto,
    /// Read /proc directly
    Procfs,
    /// Query ps and lsof
    Ps,
}

impl BackendChoice {
    pub fn resolve(self, platform: Platform) -> Backend {
        match self {
            BackendChoice::Auto => platform.default_backend(),
            BackendChoice::Procfs => Backend::Procfs,
            BackendChoice::Ps => Backend::Ps,
        }
    }
}

/// Build the snapshot source for a platform and requested backend.
pub fn select_source<'r>(
    platform: Platform,
    choice: BackendChoice,
    proc_root: Option<PathBuf>,
    runner: &'r dyn CommandRunner,
) -> Box<dyn ProcessSnapshotSource + 'r> {
    let backend = choice.resolve(platform);
    debug!(%platform, ?backend, "selected snapshot backend");
    match backend {
        Backend::Procfs => Box::new(ProcfsSource::new(
            proc_root.unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
        )),
        Backend::Ps => Box::new(PsSource::new(runner)),
    }
}

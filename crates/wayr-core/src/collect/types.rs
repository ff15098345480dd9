//! Process snapshot record.

use crate::provenance::SourceCategory;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use wayr_common::ProcessId;

/// One point-in-time observation of a process.
///
/// Self-consistent only for the instant it was captured. Relationship fields
/// hold pids that resolve through a [`crate::provenance::ProcessArena`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    /// Process ID.
    pub pid: ProcessId,

    /// Parent process ID (0 when there is no parent or it was reaped).
    pub ppid: ProcessId,

    /// Executable base name.
    pub name: String,

    /// Full command line, arguments joined with spaces.
    pub cmd: String,

    /// Owning user name.
    pub user: String,

    /// Working directory, when readable.
    pub cwd: Option<String>,

    /// Estimated start time (derived from uptime or elapsed time).
    pub start_time: DateTime<Local>,

    /// Resident set size in KB (0 if unknown).
    pub rss_kb: u64,

    /// Restart count. No backend can observe restarts, so this stays 0.
    pub restart_count: u32,

    /// Environment variables, ordered by key.
    pub env_vars: BTreeMap<String, String>,

    /// Bound TCP listen addresses, in discovery order, without duplicates.
    pub listening_addresses: Vec<String>,

    /// Ancestors from the topmost reachable one down to the direct parent.
    pub ancestry: Vec<ProcessId>,

    /// Immediate children (populated only by the tree builder).
    pub children: Vec<ProcessId>,

    pub source: SourceCategory,
    pub source_detail: Option<String>,
    pub container_name: Option<String>,
    pub container_image: Option<String>,
    pub git_repo: Option<String>,
    pub git_branch: Option<String>,
}

impl ProcessInfo {
    /// Create a record with only identity fields set.
    pub fn new(pid: impl Into<ProcessId>, ppid: impl Into<ProcessId>, name: impl Into<String>) -> Self {
        let name = name.into();
        ProcessInfo {
            pid: pid.into(),
            ppid: ppid.into(),
            cmd: name.clone(),
            name,
            user: "unknown".to_string(),
            cwd: None,
            start_time: Local::now(),
            rss_kb: 0,
            restart_count: 0,
            env_vars: BTreeMap::new(),
            listening_addresses: Vec::new(),
            ancestry: Vec::new(),
            children: Vec::new(),
            source: SourceCategory::Unknown,
            source_detail: None,
            container_name: None,
            container_image: None,
            git_repo: None,
            git_branch: None,
        }
    }

    /// Record a listen address unless it is already present.
    pub fn add_listening_address(&mut self, addr: impl Into<String>) {
        let addr = addr.into();
        if !self.listening_addresses.contains(&addr) {
            self.listening_addresses.push(addr);
        }
    }

    /// Seconds since the estimated start time (never negative).
    pub fn uptime_seconds(&self) -> i64 {
        (Local::now() - self.start_time).num_seconds().max(0)
    }

    /// `name (pid N)` label used by the chain renderers.
    pub fn label(&self) -> String {
        format!("{} (pid {})", self.name, self.pid)
    }
}

//! Process identity type.
//!
//! A pid is only meaningful for the instant it was observed; the kernel may
//! hand the same number to an unrelated process later.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process ID wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl ProcessId {
    /// Pid 0: no parent, or the parent was already reaped.
    pub const NONE: ProcessId = ProcessId(0);

    /// Pid 1: the init process.
    pub const INIT: ProcessId = ProcessId(1);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn is_init(self) -> bool {
        self.0 == 1
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        ProcessId(pid)
    }
}

impl FromStr for ProcessId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(ProcessId)
    }
}

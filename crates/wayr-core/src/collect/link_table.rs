//! Bulk pid → ppid table.
//!
//! One batched `ps` query returns the parent of every visible process. Used
//! by the tree builder and by name search; an empty table means the topology
//! is unavailable and callers degrade to partial results.

use super::snapshot::Platform;
use super::tool_runner::{query, CommandRunner};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};
use wayr_common::ProcessId;

/// Map of every visible pid to its parent pid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    parents: HashMap<ProcessId, ProcessId>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pid: ProcessId, ppid: ProcessId) {
        self.parents.insert(pid, ppid);
    }

    pub fn parent_of(&self, pid: ProcessId) -> Option<ProcessId> {
        self.parents.get(&pid).copied()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// All pids, ascending.
    pub fn pids(&self) -> Vec<ProcessId> {
        let mut pids: Vec<ProcessId> = self.parents.keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    /// The entries whose pid is in `keep`.
    pub fn restricted_to(&self, keep: &HashSet<ProcessId>) -> LinkTable {
        self.parents
            .iter()
            .filter(|(pid, _)| keep.contains(pid))
            .map(|(&pid, &ppid)| (pid, ppid))
            .collect()
    }

    /// Inverted table: parent → children, children ascending.
    pub fn children_index(&self) -> HashMap<ProcessId, Vec<ProcessId>> {
        let mut index: HashMap<ProcessId, Vec<ProcessId>> = HashMap::new();
        for (&pid, &ppid) in &self.parents {
            index.entry(ppid).or_default().push(pid);
        }
        for children in index.values_mut() {
            children.sort_unstable();
        }
        index
    }
}

impl FromIterator<(ProcessId, ProcessId)> for LinkTable {
    fn from_iter<I: IntoIterator<Item = (ProcessId, ProcessId)>>(iter: I) -> Self {
        LinkTable {
            parents: iter.into_iter().collect(),
        }
    }
}

/// Parse `pid ppid` lines; anything that is not two integers is skipped.
pub fn parse_link_table(output: &str) -> LinkTable {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let pid = fields.next()?.parse::<u32>().ok()?;
            let ppid = fields.next()?.parse::<u32>().ok()?;
            Some((ProcessId(pid), ProcessId(ppid)))
        })
        .collect()
}

/// Fetch the full link table with a single `ps` invocation.
#[instrument(skip(runner))]
pub fn fetch_link_table(runner: &dyn CommandRunner, platform: Platform) -> LinkTable {
    let args: &[&str] = if platform.is_linux() {
        &["-eo", "pid=,ppid="]
    } else {
        &["-A", "-o", "pid=,ppid="]
    };

    match query(runner, "ps", args) {
        Some(stdout) => {
            let table = parse_link_table(&stdout);
            debug!(entries = table.len(), "link table fetched");
            table
        }
        None => {
            debug!("link table unavailable");
            LinkTable::new()
        }
    }
}

/// Parse `pid text...` lines into the pid and the rest of the row.
pub fn parse_command_rows(output: &str) -> Vec<(ProcessId, String)> {
    output
        .lines()
        .filter_map(|line| {
            let (pid, rest) = line.trim_start().split_once(char::is_whitespace)?;
            let pid = pid.parse::<u32>().ok()?;
            Some((ProcessId(pid), rest.trim().to_string()))
        })
        .collect()
}

/// Every visible pid with its comm and command line, from one `ps` call.
///
/// `None` when `ps` fails, so callers can tell "no rows" from "no data".
#[instrument(skip(runner))]
pub fn fetch_command_rows(
    runner: &dyn CommandRunner,
    platform: Platform,
) -> Option<Vec<(ProcessId, String)>> {
    let args: &[&str] = if platform.is_linux() {
        &["-eo", "pid=,comm=,args="]
    } else {
        &["-A", "-o", "pid=,comm=,command="]
    };

    let rows = parse_command_rows(&query(runner, "ps", args)?);
    debug!(rows = rows.len(), "command rows fetched");
    Some(rows)
}

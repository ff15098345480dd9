//! Target lookup by pid, name, or port.
//!
//! These are the only operations that turn "no data" into an error: a lookup
//! that finds nothing ends the report with a not-found message.

use crate::collect::{
    fetch_command_rows, resolve_by_port, CommandRunner, LinkTable, Platform, ProcessInfo,
    ProcessSnapshotSource,
};
use std::collections::HashSet;
use tracing::{debug, instrument};
use wayr_common::{Error, MatchKind, ProcessId, Result};

/// Snapshot a single pid.
#[instrument(skip(source))]
pub fn find_by_pid(pid: ProcessId, source: &dyn ProcessSnapshotSource) -> Result<ProcessInfo> {
    source
        .snapshot(pid)
        .ok_or(Error::ProcessNotFound { pid: pid.0 })
}

/// Processes listening on `port`.
pub fn find_by_port(
    port: u16,
    runner: &dyn CommandRunner,
    source: &dyn ProcessSnapshotSource,
) -> Result<Vec<ProcessInfo>> {
    let matches = resolve_by_port(port, runner, source);
    if matches.is_empty() {
        return Err(Error::PortNotFound { port });
    }
    Ok(matches)
}

/// True when a `wayr` invocation is what mentions the query, i.e. the
/// token after one containing `wayr` is exactly the query.
fn is_own_argument(cmd: &str, query: &str) -> bool {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    parts
        .windows(2)
        .any(|pair| pair[0].contains("wayr") && pair[1] == query)
}

/// Whether `info` matches a name query.
///
/// Exact compares the name. Substring is case-insensitive against the name,
/// then against the command line (unless the hit is a `wayr` argument).
/// Any process whose command mentions both `wayr` and the query is skipped.
pub fn matches_name(info: &ProcessInfo, query: &str, kind: MatchKind) -> bool {
    if info.cmd.contains("wayr") && info.cmd.contains(query) {
        return false;
    }
    match kind {
        MatchKind::Exact => info.name == query,
        MatchKind::Substring => {
            let needle = query.to_lowercase();
            if info.name.to_lowercase().contains(&needle) {
                true
            } else {
                info.cmd.to_lowercase().contains(&needle) && !is_own_argument(&info.cmd, query)
            }
        }
    }
}

/// Drop candidates whose `ps` row never mentions `query`.
///
/// The row carries both the comm and the command line, so nothing
/// [`matches_name`] could accept is dropped. Used where each snapshot costs
/// several subprocesses; when `ps` fails the table comes back whole.
#[instrument(skip(links, runner), fields(candidates = links.len()))]
pub fn narrow_candidates(
    query: &str,
    links: &LinkTable,
    runner: &dyn CommandRunner,
    platform: Platform,
) -> LinkTable {
    let Some(rows) = fetch_command_rows(runner, platform) else {
        return links.clone();
    };

    let needle = query.to_lowercase();
    let keep: HashSet<ProcessId> = rows
        .into_iter()
        .filter(|(_, row)| row.to_lowercase().contains(&needle))
        .map(|(pid, _)| pid)
        .collect();
    let narrowed = links.restricted_to(&keep);
    debug!(kept = narrowed.len(), "candidates narrowed");
    narrowed
}

/// Every live process matching `query`, in ascending pid order.
///
/// Candidates come from the link table; `own_pid` is never reported.
#[instrument(skip(links, source), fields(candidates = links.len()))]
pub fn find_by_name(
    query: &str,
    kind: MatchKind,
    links: &LinkTable,
    source: &dyn ProcessSnapshotSource,
    own_pid: ProcessId,
) -> Result<Vec<ProcessInfo>> {
    let matches: Vec<ProcessInfo> = links
        .pids()
        .into_iter()
        .filter(|pid| *pid != own_pid)
        .filter_map(|pid| source.snapshot(pid))
        .filter(|info| matches_name(info, query, kind))
        .collect();

    debug!(matches = matches.len(), "name search finished");
    if matches.is_empty() {
        return Err(Error::NameNotFound {
            name: query.to_string(),
            kind,
        });
    }
    Ok(matches)
}

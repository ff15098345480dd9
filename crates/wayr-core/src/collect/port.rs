//! Port → process resolution and per-process listen detection.
//!
//! Primary path is `lsof`, on every platform. When it yields nothing and the
//! snapshot backend reads a process filesystem, the kernel TCP tables are
//! parsed and socket inodes matched against `fd/*` links.

use super::network::{find_inode_owner, read_tcp_tables, socket_inodes};
use super::snapshot::ProcessSnapshotSource;
use super::tool_runner::{query, CommandRunner};
use super::types::ProcessInfo;
use std::path::Path;
use tracing::{debug, instrument};
use wayr_common::ProcessId;

/// Pids from `lsof -t` output, duplicates dropped, order kept.
pub(crate) fn parse_lsof_pids(output: &str) -> Vec<ProcessId> {
    let mut pids = Vec::new();
    for pid in output.lines().filter_map(|line| line.trim().parse::<ProcessId>().ok()) {
        if !pids.contains(&pid) {
            pids.push(pid);
        }
    }
    pids
}

/// NAME column (index 8) of every `lsof` row in LISTEN state, verbatim.
pub(crate) fn parse_lsof_listen_names(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.contains("LISTEN"))
        .filter_map(|line| line.split_whitespace().nth(8))
        .map(|name| name.to_string())
        .collect()
}

/// Resolve which processes listen on a TCP port.
///
/// Returns an empty list (not an error) when neither path finds a listener.
#[instrument(skip(runner, source))]
pub fn resolve_by_port(
    port: u16,
    runner: &dyn CommandRunner,
    source: &dyn ProcessSnapshotSource,
) -> Vec<ProcessInfo> {
    let mut results = resolve_via_lsof(port, runner, source);

    if results.is_empty() {
        if let Some(root) = source.proc_root() {
            debug!(port, "lsof found no listener, scanning kernel socket tables");
            results = resolve_via_socket_tables(port, root, source);
        }
    }

    debug!(port, matches = results.len(), "port resolved");
    results
}

fn resolve_via_lsof(
    port: u16,
    runner: &dyn CommandRunner,
    source: &dyn ProcessSnapshotSource,
) -> Vec<ProcessInfo> {
    let port_arg = format!(":{port}");
    let Some(stdout) = query(runner, "lsof", &["-i", &port_arg, "-sTCP:LISTEN", "-t"]) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for pid in parse_lsof_pids(&stdout) {
        let Some(mut info) = source.snapshot(pid) else {
            continue;
        };
        let pid_arg = pid.to_string();
        if let Some(out) = query(
            runner,
            "lsof",
            &["-i", &port_arg, "-sTCP:LISTEN", "-a", "-p", &pid_arg],
        ) {
            for name in parse_lsof_listen_names(&out) {
                info.add_listening_address(name);
            }
        }
        results.push(info);
    }
    results
}

fn resolve_via_socket_tables(
    port: u16,
    root: &Path,
    source: &dyn ProcessSnapshotSource,
) -> Vec<ProcessInfo> {
    let mut results: Vec<ProcessInfo> = Vec::new();

    for entry in read_tcp_tables(root) {
        if !entry.is_listen() || !entry.matches_port(port) {
            continue;
        }
        let Some(owner) = find_inode_owner(root, &entry.inode) else {
            continue;
        };
        let Some(endpoint) = entry.endpoint() else {
            continue;
        };

        if let Some(existing) = results.iter_mut().find(|info| info.pid == owner) {
            existing.add_listening_address(endpoint);
        } else if let Some(mut info) = source.snapshot(owner) {
            info.add_listening_address(endpoint);
            results.push(info);
        }
    }

    results
}

/// Fill in the TCP listen addresses of an already resolved process.
///
/// Skipped when addresses are already known (e.g. from a port lookup).
#[instrument(skip_all, fields(pid = %info.pid))]
pub fn detect_listening(
    info: &mut ProcessInfo,
    runner: &dyn CommandRunner,
    source: &dyn ProcessSnapshotSource,
) {
    if !info.listening_addresses.is_empty() {
        return;
    }

    let pid_arg = info.pid.to_string();
    if let Some(out) = query(
        runner,
        "lsof",
        &["-a", "-p", &pid_arg, "-iTCP", "-sTCP:LISTEN"],
    ) {
        for name in parse_lsof_listen_names(&out) {
            info.add_listening_address(name);
        }
    }

    if info.listening_addresses.is_empty() {
        if let Some(root) = source.proc_root() {
            let inodes = socket_inodes(root, info.pid);
            if inodes.is_empty() {
                return;
            }
            for entry in read_tcp_tables(root) {
                if entry.is_listen() && inodes.contains(&entry.inode) {
                    if let Some(endpoint) = entry.endpoint() {
                        info.add_listening_address(endpoint);
                    }
                }
            }
        }
    }
}

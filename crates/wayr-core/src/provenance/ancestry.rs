//! Ancestry chain construction.
//!
//! Walks parent links upward from a target, snapshotting each ancestor, and
//! stores the chain root-first on the target's arena record.

use super::arena::ProcessArena;
use crate::collect::ProcessSnapshotSource;
use tracing::{debug, instrument, trace};
use wayr_common::ProcessId;

/// Hard cap on ancestry chain length; longer chains are truncated.
pub const MAX_ANCESTRY_DEPTH: usize = 20;

/// Resolve the ancestry of `target`, which must already be in the arena.
///
/// The walk stops at pid 0, at a vanished parent, after including pid 1, at
/// [`MAX_ANCESTRY_DEPTH`] entries, or when a pid would repeat. Returns the
/// chain root-first, excluding the target itself.
#[instrument(skip(arena, source))]
pub fn resolve_ancestry(
    arena: &mut ProcessArena,
    source: &dyn ProcessSnapshotSource,
    target: ProcessId,
) -> Vec<ProcessId> {
    let Some(mut current) = arena.get(target).map(|info| info.ppid) else {
        return Vec::new();
    };

    // Built nearest-first, reversed at the end
    let mut chain: Vec<ProcessId> = Vec::new();
    while !current.is_none() && chain.len() < MAX_ANCESTRY_DEPTH {
        if current == target || chain.contains(&current) {
            debug!(%current, "ancestry cycle detected, stopping");
            break;
        }
        if !arena.materialize(current, source) {
            trace!(%current, "ancestor vanished");
            break;
        }
        chain.push(current);
        if current.is_init() {
            break;
        }
        current = match arena.get(current) {
            Some(info) => info.ppid,
            None => break,
        };
    }
    chain.reverse();

    if let Some(info) = arena.get_mut(target) {
        info.ancestry = chain.clone();
    }
    debug!(depth = chain.len(), "ancestry resolved");
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::ProcessInfo;
    use crate::test_utils::FakeSnapshotSource;
    use proptest::prelude::*;

    fn chain_source(links: &[(u32, u32, &str)]) -> FakeSnapshotSource {
        links
            .iter()
            .fold(FakeSnapshotSource::new(), |src, &(pid, ppid, name)| {
                src.with(ProcessInfo::new(pid, ppid, name))
            })
    }

    fn resolve(source: &FakeSnapshotSource, target: u32) -> Vec<u32> {
        let mut arena = ProcessArena::new();
        arena.materialize(ProcessId(target), source);
        resolve_ancestry(&mut arena, source, ProcessId(target))
            .into_iter()
            .map(|p| p.0)
            .collect()
    }

    #[test]
    fn test_chain_is_root_first() {
        let source = chain_source(&[
            (1, 0, "systemd"),
            (500, 1, "sshd"),
            (600, 500, "sshd"),
            (700, 600, "bash"),
            (800, 700, "vim"),
        ]);
        assert_eq!(resolve(&source, 800), vec![1, 500, 600, 700]);
    }

    #[test]
    fn test_stops_at_init() {
        // pid 1 reports a parent that would otherwise be followed
        let source = chain_source(&[(1, 5, "init"), (5, 0, "ghost"), (10, 1, "cron")]);
        assert_eq!(resolve(&source, 10), vec![1]);
    }

    #[test]
    fn test_ppid_zero_is_empty() {
        let source = chain_source(&[(2, 0, "kthreadd")]);
        assert!(resolve(&source, 2).is_empty());
    }

    #[test]
    fn test_vanished_parent_ends_chain() {
        let source = chain_source(&[(300, 200, "worker"), (200, 100, "manager")]);
        assert_eq!(resolve(&source, 300), vec![200]);
    }

    #[test]
    fn test_cycle_is_cut() {
        let source = chain_source(&[(10, 20, "a"), (20, 30, "b"), (30, 20, "c")]);
        assert_eq!(resolve(&source, 10), vec![30, 20]);
    }

    #[test]
    fn test_self_parent_is_cut() {
        let source = chain_source(&[(10, 10, "loop")]);
        assert!(resolve(&source, 10).is_empty());
    }

    #[test]
    fn test_depth_is_capped() {
        let links: Vec<(u32, u32, &str)> = (2..=40).map(|pid| (pid, pid - 1, "p")).collect();
        let source = chain_source(&links);
        let chain = resolve(&source, 40);
        assert_eq!(chain.len(), MAX_ANCESTRY_DEPTH);
        assert_eq!(chain.last(), Some(&39));
    }

    #[test]
    fn test_unknown_target_is_empty() {
        let source = chain_source(&[]);
        let mut arena = ProcessArena::new();
        assert!(resolve_ancestry(&mut arena, &source, ProcessId(9)).is_empty());
    }

    #[test]
    fn test_chain_stored_on_target() {
        let source = chain_source(&[(1, 0, "init"), (9, 1, "getty")]);
        let mut arena = ProcessArena::new();
        arena.materialize(ProcessId(9), &source);
        resolve_ancestry(&mut arena, &source, ProcessId(9));
        assert_eq!(
            arena.get(ProcessId(9)).map(|p| p.ancestry.clone()),
            Some(vec![ProcessId(1)])
        );
    }

    proptest! {
        #[test]
        fn prop_ancestry_invariants(parents in proptest::collection::vec(0u32..60, 1..60)) {
            // pid i+1 has parent parents[i]; arbitrary maps include cycles
            let links: Vec<(u32, u32, &str)> = parents
                .iter()
                .enumerate()
                .map(|(i, &ppid)| (i as u32 + 1, ppid, "p"))
                .collect();
            let source = chain_source(&links);

            for target in 1..=parents.len() as u32 {
                let chain = resolve(&source, target);
                prop_assert!(chain.len() <= MAX_ANCESTRY_DEPTH);
                prop_assert!(!chain.contains(&target));
                let mut seen = std::collections::HashSet::new();
                prop_assert!(chain.iter().all(|p| seen.insert(*p)));
                if let Some(pos) = chain.iter().position(|&p| p == 1) {
                    prop_assert_eq!(pos, 0);
                }
            }
        }
    }
}

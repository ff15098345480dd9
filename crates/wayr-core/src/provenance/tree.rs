//! Descendant tree construction.
//!
//! Breadth-first expansion from a root over the inverted link table, with
//! each child materialized through the arena (cache first, snapshot second).

use super::arena::ProcessArena;
use crate::collect::{LinkTable, ProcessSnapshotSource};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, instrument};
use wayr_common::ProcessId;

/// Populate `children` transitively beneath `root`.
///
/// A pid is attached under at most one parent and never beneath the root.
/// Children that cannot be snapshotted are skipped. Materialized nodes are
/// capped at the link table size plus one. Returns the number of nodes in the
/// tree, root included.
#[instrument(skip(arena, source, links), fields(links = links.len()))]
pub fn build_tree(
    arena: &mut ProcessArena,
    source: &dyn ProcessSnapshotSource,
    links: &LinkTable,
    root: ProcessId,
) -> usize {
    if !arena.materialize(root, source) {
        return 0;
    }

    let index = links.children_index();
    let max_nodes = links.len() + 1;

    let mut attached: HashSet<ProcessId> = HashSet::from([root]);
    let mut queue: VecDeque<ProcessId> = VecDeque::from([root]);

    while let Some(parent) = queue.pop_front() {
        let Some(children) = index.get(&parent) else {
            continue;
        };
        for &child in children {
            if attached.len() >= max_nodes {
                debug!(max_nodes, "tree node cap reached");
                return attached.len();
            }
            if attached.contains(&child) || !arena.materialize(child, source) {
                continue;
            }
            if let Some(info) = arena.get_mut(parent) {
                if !info.children.contains(&child) {
                    info.children.push(child);
                }
            }
            attached.insert(child);
            queue.push_back(child);
        }
    }

    debug!(nodes = attached.len(), "tree built");
    attached.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::ProcessInfo;
    use crate::test_utils::FakeSnapshotSource;
    use proptest::prelude::*;

    fn setup(links: &[(u32, u32)]) -> (FakeSnapshotSource, LinkTable) {
        let source = links.iter().fold(FakeSnapshotSource::new(), |src, &(pid, ppid)| {
            src.with(ProcessInfo::new(pid, ppid, format!("p{pid}")))
        });
        let table = links
            .iter()
            .map(|&(pid, ppid)| (ProcessId(pid), ProcessId(ppid)))
            .collect();
        (source, table)
    }

    fn child_pids(arena: &ProcessArena, pid: u32) -> Vec<u32> {
        arena
            .get(ProcessId(pid))
            .map(|p| p.children.iter().map(|c| c.0).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_builds_full_tree() {
        let (source, table) = setup(&[(1, 0), (10, 1), (11, 1), (20, 10), (21, 10), (30, 20)]);
        let mut arena = ProcessArena::new();

        let nodes = build_tree(&mut arena, &source, &table, ProcessId(1));
        assert_eq!(nodes, 6);
        assert_eq!(child_pids(&arena, 1), vec![10, 11]);
        assert_eq!(child_pids(&arena, 10), vec![20, 21]);
        assert_eq!(child_pids(&arena, 20), vec![30]);
        assert!(child_pids(&arena, 30).is_empty());
    }

    #[test]
    fn test_subtree_root() {
        let (source, table) = setup(&[(1, 0), (10, 1), (11, 1), (20, 10)]);
        let mut arena = ProcessArena::new();

        assert_eq!(build_tree(&mut arena, &source, &table, ProcessId(10)), 2);
        assert_eq!(child_pids(&arena, 10), vec![20]);
        assert!(!arena.contains(ProcessId(11)));
    }

    #[test]
    fn test_unresolvable_children_skipped() {
        let (source, mut table) = setup(&[(1, 0), (10, 1)]);
        table.insert(ProcessId(99), ProcessId(1));
        let mut arena = ProcessArena::new();

        assert_eq!(build_tree(&mut arena, &source, &table, ProcessId(1)), 2);
        assert_eq!(child_pids(&arena, 1), vec![10]);
    }

    #[test]
    fn test_root_never_attached_beneath_itself() {
        // Self-parented root and a cycle back to the root
        let (source, table) = setup(&[(5, 5), (6, 5), (7, 6)]);
        let mut arena = ProcessArena::new();
        let mut table = table;
        table.insert(ProcessId(5), ProcessId(7));

        build_tree(&mut arena, &source, &table, ProcessId(5));
        assert_eq!(child_pids(&arena, 5), vec![6]);
        assert_eq!(child_pids(&arena, 6), vec![7]);
        assert!(child_pids(&arena, 7).is_empty());
    }

    #[test]
    fn test_missing_root_is_empty() {
        let (source, table) = setup(&[(10, 1)]);
        let mut arena = ProcessArena::new();
        assert_eq!(build_tree(&mut arena, &source, &table, ProcessId(1)), 0);
    }

    #[test]
    fn test_cached_records_reused() {
        let (source, table) = setup(&[(1, 0), (10, 1)]);
        let mut arena = ProcessArena::new();
        arena.insert(ProcessInfo::new(10u32, 1u32, "cached"));

        build_tree(&mut arena, &source, &table, ProcessId(1));
        assert_eq!(arena.get(ProcessId(10)).map(|p| p.name.as_str()), Some("cached"));
        assert_eq!(source.snapshot_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_tree_invariants(parents in proptest::collection::vec(0u32..40, 1..40)) {
            let links: Vec<(u32, u32)> = parents
                .iter()
                .enumerate()
                .map(|(i, &ppid)| (i as u32 + 1, ppid))
                .collect();
            let (source, table) = setup(&links);
            let mut arena = ProcessArena::new();
            let nodes = build_tree(&mut arena, &source, &table, ProcessId(1));

            prop_assert!(nodes <= table.len() + 1);

            // Every attached pid appears under exactly one parent, never the root
            let mut seen = std::collections::HashSet::new();
            let mut stack = vec![ProcessId(1)];
            while let Some(pid) = stack.pop() {
                let children = arena.get(pid).map(|p| p.children.clone()).unwrap_or_default();
                for child in children {
                    prop_assert_ne!(child, ProcessId(1));
                    prop_assert!(seen.insert(child));
                    prop_assert_eq!(table.parent_of(child), Some(pid));
                    stack.push(child);
                }
            }
            prop_assert_eq!(seen.len() + 1, nodes);
        }
    }
}

//! Pid-keyed owner of every materialized [`ProcessInfo`].
//!
//! Ancestry and children are pid lists resolved through the arena, so a
//! traversal never holds two mutable paths to the same record.

use crate::collect::{ProcessInfo, ProcessSnapshotSource};
use std::collections::HashMap;
use wayr_common::ProcessId;

#[derive(Debug, Clone, Default)]
pub struct ProcessArena {
    records: HashMap<ProcessId, ProcessInfo>,
}

impl ProcessArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any earlier snapshot of the same pid.
    pub fn insert(&mut self, info: ProcessInfo) -> ProcessId {
        let pid = info.pid;
        self.records.insert(pid, info);
        pid
    }

    pub fn get(&self, pid: ProcessId) -> Option<&ProcessInfo> {
        self.records.get(&pid)
    }

    pub fn get_mut(&mut self, pid: ProcessId) -> Option<&mut ProcessInfo> {
        self.records.get_mut(&pid)
    }

    pub fn contains(&self, pid: ProcessId) -> bool {
        self.records.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Make sure `pid` is materialized, snapshotting it on first use.
    ///
    /// Returns false when the process cannot be observed.
    pub fn materialize(&mut self, pid: ProcessId, source: &dyn ProcessSnapshotSource) -> bool {
        if self.records.contains_key(&pid) {
            return true;
        }
        match source.snapshot(pid) {
            Some(info) => {
                self.records.insert(pid, info);
                true
            }
            None => false,
        }
    }

    /// Ancestors of `pid`, root first.
    pub fn ancestors(&self, pid: ProcessId) -> Vec<&ProcessInfo> {
        self.get(pid)
            .map(|info| info.ancestry.iter().filter_map(|a| self.get(*a)).collect())
            .unwrap_or_default()
    }

    /// Immediate children of `pid`, in attachment order.
    pub fn children(&self, pid: ProcessId) -> Vec<&ProcessInfo> {
        self.get(pid)
            .map(|info| info.children.iter().filter_map(|c| self.get(*c)).collect())
            .unwrap_or_default()
    }

    /// Ancestors followed by the process itself.
    pub fn lineage(&self, pid: ProcessId) -> Vec<&ProcessInfo> {
        let mut chain = self.ancestors(pid);
        if let Some(info) = self.get(pid) {
            chain.push(info);
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeSnapshotSource;

    #[test]
    fn test_materialize_caches() {
        let source = FakeSnapshotSource::new().with(ProcessInfo::new(10u32, 1u32, "sshd"));
        let mut arena = ProcessArena::new();

        assert!(arena.materialize(ProcessId(10), &source));
        assert!(arena.materialize(ProcessId(10), &source));
        assert_eq!(source.snapshot_count(), 1);
        assert!(!arena.materialize(ProcessId(11), &source));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_lineage_resolves_pids() {
        let mut arena = ProcessArena::new();
        arena.insert(ProcessInfo::new(1u32, 0u32, "systemd"));
        arena.insert(ProcessInfo::new(10u32, 1u32, "sshd"));
        let mut shell = ProcessInfo::new(20u32, 10u32, "bash");
        shell.ancestry = vec![ProcessId(1), ProcessId(10)];
        arena.insert(shell);

        let names: Vec<&str> = arena
            .lineage(ProcessId(20))
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["systemd", "sshd", "bash"]);
        assert!(arena.children(ProcessId(20)).is_empty());
    }
}

//! Per-match annotation pipeline.
//!
//! Ancestry, classification, git context, then listening sockets, in that
//! order, all recorded on the target's arena record.

use super::ancestry::resolve_ancestry;
use super::arena::ProcessArena;
use super::classify::classify;
use crate::collect::{detect_listening, CommandRunner, Platform, ProcessInfo, ProcessSnapshotSource};
use crate::context::detect_git;
use std::path::Path;
use tracing::instrument;
use wayr_common::ProcessId;

/// Host collaborators shared by every lookup in one run.
pub struct Probe<'a> {
    pub runner: &'a dyn CommandRunner,
    pub source: &'a dyn ProcessSnapshotSource,
    pub platform: Platform,
}

impl<'a> Probe<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        source: &'a dyn ProcessSnapshotSource,
        platform: Platform,
    ) -> Self {
        Probe {
            runner,
            source,
            platform,
        }
    }
}

/// Annotate a resolved target and store it, with its ancestors, in `arena`.
#[instrument(skip_all, fields(pid = %info.pid))]
pub fn investigate(arena: &mut ProcessArena, info: ProcessInfo, probe: &Probe<'_>) -> ProcessId {
    let pid = arena.insert(info);
    resolve_ancestry(arena, probe.source, pid);

    let classification = match arena.get(pid) {
        Some(target) => classify(target, &arena.ancestors(pid), probe.runner, probe.platform),
        None => return pid,
    };

    if let Some(target) = arena.get_mut(pid) {
        classification.apply(target);

        if let Some((repo, branch)) = target.cwd.as_deref().and_then(|cwd| detect_git(Path::new(cwd))) {
            target.git_repo = Some(repo);
            target.git_branch = branch;
        }

        detect_listening(target, probe.runner, probe.source);
    }
    pid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::SourceCategory;
    use crate::test_utils::{FakeSnapshotSource, ScriptedRunner};

    #[test]
    fn test_investigate_annotates_target() {
        let repo = tempfile::tempdir().unwrap();
        let app_dir = repo.path().join("svc");
        std::fs::create_dir_all(repo.path().join(".git")).unwrap();
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(repo.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();

        let mut target = ProcessInfo::new(300u32, 200u32, "node");
        target.cwd = Some(app_dir.to_string_lossy().to_string());

        let source = FakeSnapshotSource::new()
            .with(ProcessInfo::new(1u32, 0u32, "init"))
            .with(ProcessInfo::new(200u32, 1u32, "zsh"));
        let runner = ScriptedRunner::new().ok(
            "lsof -a -p 300 -iTCP -sTCP:LISTEN",
            "node 300 dev 20u IPv4 1 0t0 TCP *:3000 (LISTEN)\n",
        );
        let probe = Probe::new(&runner, &source, Platform::Linux);

        let mut arena = ProcessArena::new();
        let pid = investigate(&mut arena, target, &probe);
        let info = arena.get(pid).unwrap();

        assert_eq!(info.ancestry, vec![ProcessId(1), ProcessId(200)]);
        assert_eq!(info.source, SourceCategory::InteractiveShell);
        assert_eq!(info.source_detail.as_deref(), Some("zsh"));
        assert_eq!(info.git_branch.as_deref(), Some("main"));
        assert_eq!(
            info.git_repo.as_deref(),
            repo.path().file_name().and_then(|n| n.to_str())
        );
        assert_eq!(info.listening_addresses, vec!["*:3000"]);
    }

    #[test]
    fn test_orphan_is_unknown() {
        let source = FakeSnapshotSource::new();
        let runner = ScriptedRunner::new();
        let probe = Probe::new(&runner, &source, Platform::Linux);

        let mut arena = ProcessArena::new();
        let pid = investigate(&mut arena, ProcessInfo::new(2u32, 0u32, "kthreadd"), &probe);
        let info = arena.get(pid).unwrap();

        assert!(info.ancestry.is_empty());
        assert_eq!(info.source, SourceCategory::Unknown);
        assert!(info.listening_addresses.is_empty());
    }
}

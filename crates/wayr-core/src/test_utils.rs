//! Test utilities for wayr-core.
//!
//! Fakes for the two host seams:
//! - [`FakeSnapshotSource`]: map-backed snapshot provider with a call counter
//! - [`ScriptedRunner`]: canned command output keyed by the joined argv
//! - [`FakeProcfs`]: a throwaway process filesystem in a tempdir

use crate::collect::{
    Backend, CommandRunner, ProcessInfo, ProcessSnapshotSource, ToolError, ToolOutput,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wayr_common::ProcessId;

// ============================================================================
// Snapshot source
// ============================================================================

/// Snapshot provider answering from an in-memory table.
#[derive(Debug, Default)]
pub struct FakeSnapshotSource {
    processes: HashMap<ProcessId, ProcessInfo>,
    proc_root: Option<PathBuf>,
    snapshots: Cell<usize>,
}

impl FakeSnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a process.
    pub fn with(mut self, info: ProcessInfo) -> Self {
        self.processes.insert(info.pid, info);
        self
    }

    /// Pretend to be backed by a process filesystem at `root`.
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = Some(root.into());
        self
    }

    /// Number of `snapshot` calls made so far.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.get()
    }
}

impl ProcessSnapshotSource for FakeSnapshotSource {
    fn snapshot(&self, pid: ProcessId) -> Option<ProcessInfo> {
        self.snapshots.set(self.snapshots.get() + 1);
        self.processes.get(&pid).cloned()
    }

    fn backend(&self) -> Backend {
        if self.proc_root.is_some() {
            Backend::Procfs
        } else {
            Backend::Ps
        }
    }

    fn proc_root(&self) -> Option<&Path> {
        self.proc_root.as_deref()
    }
}

// ============================================================================
// Command runner
// ============================================================================

#[derive(Debug, Clone)]
enum Scripted {
    Ok(String),
    Fail(i32),
}

/// Command runner replaying canned responses.
///
/// Responses are keyed by the command and its arguments joined with single
/// spaces. Anything not scripted behaves like a missing binary.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: HashMap<String, Scripted>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit 0 with `stdout`.
    pub fn ok(mut self, command_line: &str, stdout: &str) -> Self {
        self.responses
            .insert(command_line.to_string(), Scripted::Ok(stdout.to_string()));
        self
    }

    /// Exit with `code` and no output.
    pub fn fail(mut self, command_line: &str, code: i32) -> Self {
        self.responses
            .insert(command_line.to_string(), Scripted::Fail(code));
        self
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<ToolOutput, ToolError> {
        let key = std::iter::once(cmd)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.borrow_mut().push(key.clone());

        let (stdout, exit_code) = match self.responses.get(&key) {
            Some(Scripted::Ok(stdout)) => (stdout.clone(), 0),
            Some(Scripted::Fail(code)) => (String::new(), *code),
            None => return Err(ToolError::CommandNotFound(cmd.to_string())),
        };

        Ok(ToolOutput {
            command: cmd.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            stdout: stdout.into_bytes(),
            stderr: Vec::new(),
            exit_code: Some(exit_code),
            duration: Default::default(),
        })
    }
}

// ============================================================================
// Fake process filesystem
// ============================================================================

/// A process filesystem laid out in a tempdir, removed on drop.
///
/// Writers panic on I/O failure; they are for tests only.
pub struct FakeProcfs {
    dir: TempDir,
}

impl Default for FakeProcfs {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProcfs {
    /// Stat `starttime` written for every fake process, in clock ticks.
    pub const START_TICKS: u64 = 50_000;

    pub fn new() -> Self {
        let dir = TempDir::new().expect("create fake procfs tempdir");
        FakeProcfs { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    fn pid_dir(&self, pid: u32) -> PathBuf {
        let dir = self.root().join(pid.to_string());
        fs::create_dir_all(&dir).expect("create pid dir");
        dir
    }

    fn write(&self, path: PathBuf, content: impl AsRef<[u8]>) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, content).expect("write fake proc file");
    }

    /// Create `<pid>/stat` and `<pid>/cmdline` (`cmdline` uses NUL separators).
    pub fn add_process(&self, pid: u32, name: &str, ppid: u32, cmdline: &str) {
        let dir = self.pid_dir(pid);
        // state ppid pgrp session tty tpgid flags minflt cminflt majflt cmajflt
        // utime stime cutime cstime priority nice threads itrealvalue starttime ...
        let stat = format!(
            "{pid} ({name}) S {ppid} {pid} {pid} 0 -1 4194560 100 0 0 0 5 3 0 0 20 0 1 0 {} 12345678 512 18446744073709551615\n",
            Self::START_TICKS
        );
        self.write(dir.join("stat"), stat);
        self.write(dir.join("cmdline"), cmdline);
    }

    pub fn write_status(&self, pid: u32, content: &str) {
        self.write(self.pid_dir(pid).join("status"), content);
    }

    /// `content` uses NUL separators.
    pub fn write_environ(&self, pid: u32, content: &str) {
        self.write(self.pid_dir(pid).join("environ"), content);
    }

    pub fn write_uptime(&self, seconds: f64) {
        self.write(self.root().join("uptime"), format!("{seconds:.2} 0.00\n"));
    }

    /// Point `<pid>/cwd` at `target`.
    pub fn link_cwd(&self, pid: u32, target: impl AsRef<Path>) {
        let link = self.pid_dir(pid).join("cwd");
        std::os::unix::fs::symlink(target, link).expect("symlink cwd");
    }

    /// Create `<pid>/fd/<fd>` pointing at `target` (e.g. `socket:[1234]`).
    pub fn add_fd_link(&self, pid: u32, fd: u32, target: &str) {
        let fd_dir = self.pid_dir(pid).join("fd");
        fs::create_dir_all(&fd_dir).expect("create fd dir");
        std::os::unix::fs::symlink(target, fd_dir.join(fd.to_string())).expect("symlink fd");
    }

    /// Write `net/<name>` (e.g. `tcp`, `tcp6`).
    pub fn write_net(&self, name: &str, content: &str) {
        self.write(self.root().join("net").join(name), content);
    }
}

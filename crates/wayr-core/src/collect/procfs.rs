//! Snapshot backend over the process filesystem.
//!
//! Reads:
//! - `<root>/<pid>/stat` - name, state, ppid, start ticks
//! - `<root>/<pid>/cmdline` - NUL-delimited argv
//! - `<root>/<pid>/status` - VmRSS
//! - `<root>/<pid>/cwd` - working directory link
//! - `<root>/<pid>/environ` - NUL-delimited `KEY=VALUE`
//! - `<root>/uptime` - seconds since boot
//!
//! The root is configurable so the whole backend can be exercised against a
//! fake tree in a tempdir.

use super::snapshot::{Backend, ProcessSnapshotSource};
use super::types::ProcessInfo;
use chrono::{DateTime, Local, TimeDelta};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;
use wayr_common::ProcessId;

/// Fields of `/proc/<pid>/stat` that the snapshot uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatFields {
    pub comm: String,
    pub state: char,
    pub ppid: u32,
    pub starttime_ticks: Option<u64>,
}

/// Parse `/proc/<pid>/stat`.
///
/// The comm sits between the first `(` and the last `)` and may itself
/// contain spaces and parentheses.
pub(crate) fn parse_stat(content: &str) -> Option<StatFields> {
    let open_paren = content.find('(')?;
    let close_paren = content.rfind(')')?;
    if close_paren < open_paren {
        return None;
    }

    let comm = content[open_paren + 1..close_paren].to_string();
    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();

    // Field 0 after comm is state, 1 is ppid, 19 is starttime
    if fields.len() < 2 {
        return None;
    }
    let state = fields[0].chars().next()?;
    let ppid = fields[1].parse::<u32>().ok()?;
    let starttime_ticks = fields.get(19).and_then(|s| s.parse::<u64>().ok());

    Some(StatFields {
        comm,
        state,
        ppid,
        starttime_ticks,
    })
}

/// Join NUL-delimited argv with spaces.
pub(crate) fn parse_cmdline(raw: &[u8]) -> String {
    raw.split(|b| *b == 0)
        .filter(|arg| !arg.is_empty())
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Extract `VmRSS` in KB from `/proc/<pid>/status`.
pub(crate) fn parse_vm_rss(status: &str) -> Option<u64> {
    status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse().ok())
}

/// Parse NUL-delimited `KEY=VALUE` entries; entries without `=` are dropped.
pub(crate) fn parse_environ(raw: &[u8]) -> BTreeMap<String, String> {
    raw.split(|b| *b == 0)
        .filter_map(|entry| {
            let entry = String::from_utf8_lossy(entry);
            let (key, value) = entry.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// First field of `/proc/uptime`.
pub(crate) fn parse_uptime(content: &str) -> Option<f64> {
    content.split_whitespace().next()?.parse().ok()
}

/// `now - (uptime - starttime / CLK_TCK)`.
///
/// `None` when the age is not representable, so callers fall back to `now`.
pub(crate) fn estimate_start_time(
    now: DateTime<Local>,
    uptime_secs: f64,
    starttime_ticks: u64,
    clock_ticks: u64,
) -> Option<DateTime<Local>> {
    if clock_ticks == 0 {
        return None;
    }
    let age_secs = uptime_secs - (starttime_ticks as f64 / clock_ticks as f64);
    if !age_secs.is_finite() {
        return None;
    }
    let age = TimeDelta::try_milliseconds((age_secs * 1000.0) as i64)?;
    now.checked_sub_signed(age)
}

fn clock_ticks_per_second() -> Option<u64> {
    let value = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if value <= 0 {
        None
    } else {
        Some(value as u64)
    }
}

/// Resolve a uid to a user name via the password database.
pub(crate) fn resolve_username(uid: u32) -> Option<String> {
    use std::ffi::CStr;
    unsafe {
        let pwd = libc::getpwuid(uid);
        if pwd.is_null() {
            return None;
        }
        let name = CStr::from_ptr((*pwd).pw_name);
        name.to_str().ok().map(|s| s.to_string())
    }
}

/// Snapshot source reading a process filesystem.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
    clock_ticks: Option<u64>,
}

impl ProcfsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProcfsSource {
            root: root.into(),
            clock_ticks: clock_ticks_per_second(),
        }
    }

    /// Override CLK_TCK (fake trees in tests).
    pub fn with_clock_ticks(mut self, ticks: u64) -> Self {
        self.clock_ticks = Some(ticks);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pid_dir(&self, pid: ProcessId) -> PathBuf {
        self.root.join(pid.to_string())
    }

    fn read_owner(&self, pid_dir: &Path) -> String {
        use std::os::unix::fs::MetadataExt;

        fs::metadata(pid_dir)
            .ok()
            .and_then(|meta| resolve_username(meta.uid()))
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn read_start_time(&self, starttime_ticks: Option<u64>) -> DateTime<Local> {
        let now = Local::now();
        self.estimate_from_uptime(now, starttime_ticks)
            .unwrap_or(now)
    }

    fn estimate_from_uptime(
        &self,
        now: DateTime<Local>,
        starttime_ticks: Option<u64>,
    ) -> Option<DateTime<Local>> {
        let uptime = parse_uptime(&fs::read_to_string(self.root.join("uptime")).ok()?)?;
        estimate_start_time(now, uptime, starttime_ticks?, self.clock_ticks?)
    }
}

impl ProcessSnapshotSource for ProcfsSource {
    fn snapshot(&self, pid: ProcessId) -> Option<ProcessInfo> {
        let dir = self.pid_dir(pid);
        let stat = match fs::read_to_string(dir.join("stat")) {
            Ok(content) => parse_stat(&content)?,
            Err(e) => {
                trace!(%pid, error = %e, "stat unreadable");
                return None;
            }
        };

        trace!(%pid, state = %stat.state, ppid = stat.ppid, "stat parsed");
        let mut info = ProcessInfo::new(pid, stat.ppid, stat.comm);

        info.cmd = fs::read(dir.join("cmdline"))
            .map(|raw| parse_cmdline(&raw))
            .unwrap_or_default();
        if info.cmd.is_empty() {
            info.cmd = format!("[{}]", info.name);
        }

        info.user = self.read_owner(&dir);
        info.start_time = self.read_start_time(stat.starttime_ticks);
        info.rss_kb = fs::read_to_string(dir.join("status"))
            .ok()
            .and_then(|status| parse_vm_rss(&status))
            .unwrap_or(0);
        info.cwd = fs::read_link(dir.join("cwd"))
            .ok()
            .map(|p| p.to_string_lossy().into_owned());
        info.env_vars = fs::read(dir.join("environ"))
            .map(|raw| parse_environ(&raw))
            .unwrap_or_default();

        Some(info)
    }

    fn backend(&self) -> Backend {
        Backend::Procfs
    }

    fn proc_root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeProcfs;

    #[test]
    fn test_parse_stat_simple() {
        let content = "1234 (bash) S 1000 1234 1234 0 -1 4194304 1000 0 0 0 10 5 0 0 20 0 1 0 12345 10000000 500 18446744073709551615";
        let stat = parse_stat(content).unwrap();
        assert_eq!(stat.comm, "bash");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.ppid, 1000);
        assert_eq!(stat.starttime_ticks, Some(12345));
    }

    #[test]
    fn test_parse_stat_with_parens_in_comm() {
        let content = "1234 (my (weird) process) S 500 1234 1234 0 -1";
        let stat = parse_stat(content).unwrap();
        assert_eq!(stat.comm, "my (weird) process");
        assert_eq!(stat.ppid, 500);
        assert_eq!(stat.starttime_ticks, None);
    }

    #[test]
    fn test_parse_stat_with_spaces() {
        let content = "1234 (Web Content) S 999 1234 1234 0 -1";
        let stat = parse_stat(content).unwrap();
        assert_eq!(stat.comm, "Web Content");
        assert_eq!(stat.ppid, 999);
    }

    #[test]
    fn test_parse_stat_rejects_truncated() {
        assert!(parse_stat("1234 (bash").is_none());
        assert!(parse_stat("1234 (bash) S").is_none());
        assert!(parse_stat("").is_none());
    }

    #[test]
    fn test_parse_cmdline() {
        assert_eq!(
            parse_cmdline(b"/usr/bin/python3\0-m\0http.server\0"),
            "/usr/bin/python3 -m http.server"
        );
        assert_eq!(parse_cmdline(b""), "");
    }

    #[test]
    fn test_parse_vm_rss() {
        let status = "Name:\tbash\nVmPeak:\t  9000 kB\nVmRSS:\t  4321 kB\n";
        assert_eq!(parse_vm_rss(status), Some(4321));
        assert_eq!(parse_vm_rss("Name:\tkthreadd\n"), None);
    }

    #[test]
    fn test_parse_environ_splits_on_first_equals() {
        let env = parse_environ(b"PATH=/usr/bin\0OPTS=a=b\0garbage\0");
        assert_eq!(env.get("PATH").map(String::as_str), Some("/usr/bin"));
        assert_eq!(env.get("OPTS").map(String::as_str), Some("a=b"));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_estimate_start_time() {
        let now = Local::now();
        // Booted 1000s ago, process started 500s after boot
        let start = estimate_start_time(now, 1000.0, 50_000, 100).unwrap();
        assert_eq!((now - start).num_seconds(), 500);
        assert!(estimate_start_time(now, 1000.0, 1, 0).is_none());
    }

    #[test]
    fn test_estimate_start_time_out_of_range_is_none() {
        let now = Local::now();
        assert!(estimate_start_time(now, 1e300, 0, 100).is_none());
        assert!(estimate_start_time(now, -1e300, 0, 100).is_none());
        assert!(estimate_start_time(now, f64::NAN, 0, 100).is_none());
    }

    #[test]
    fn test_snapshot_with_absurd_uptime_starts_now() {
        let fake = FakeProcfs::new();
        fake.add_process(31, "odd", 1, "odd\0");
        fake.write_uptime(1e300);

        let source = ProcfsSource::new(fake.root()).with_clock_ticks(100);
        let info = source.snapshot(ProcessId(31)).unwrap();
        assert!(info.uptime_seconds() <= 1, "age was {}", info.uptime_seconds());
    }

    #[test]
    fn test_snapshot_from_fake_tree() {
        let fake = FakeProcfs::new();
        fake.add_process(4242, "my server", 1, "/usr/bin/my-server\0--port\08080\0");
        fake.write_status(4242, "VmRSS:\t  2048 kB\n");
        fake.write_environ(4242, "HOME=/root\0LANG=C\0");
        fake.write_uptime(1000.0);

        let source = ProcfsSource::new(fake.root()).with_clock_ticks(100);
        let info = source.snapshot(ProcessId(4242)).unwrap();

        assert_eq!(info.name, "my server");
        assert_eq!(info.ppid, ProcessId(1));
        assert_eq!(info.cmd, "/usr/bin/my-server --port 8080");
        assert_eq!(info.rss_kb, 2048);
        assert_eq!(info.env_vars.len(), 2);
        assert!(info.cwd.is_none());
        // FakeProcfs writes starttime = 50000 ticks
        let age = info.uptime_seconds();
        assert!((499..=501).contains(&age), "age was {age}");
    }

    #[test]
    fn test_snapshot_empty_cmdline_uses_bracketed_name() {
        let fake = FakeProcfs::new();
        fake.add_process(2, "kthreadd", 0, "");

        let source = ProcfsSource::new(fake.root());
        let info = source.snapshot(ProcessId(2)).unwrap();
        assert_eq!(info.cmd, "[kthreadd]");
        assert_eq!(info.ppid, ProcessId(0));
        assert_eq!(info.rss_kb, 0);
    }

    #[test]
    fn test_snapshot_missing_process_is_none() {
        let fake = FakeProcfs::new();
        let source = ProcfsSource::new(fake.root());
        assert!(source.snapshot(ProcessId(99999)).is_none());
    }

    #[test]
    fn test_snapshot_reads_cwd_link() {
        let fake = FakeProcfs::new();
        fake.add_process(77, "worker", 1, "worker\0");
        fake.link_cwd(77, "/srv/app");

        let source = ProcfsSource::new(fake.root());
        let info = source.snapshot(ProcessId(77)).unwrap();
        assert_eq!(info.cwd.as_deref(), Some("/srv/app"));
    }
}

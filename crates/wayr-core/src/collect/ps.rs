//! Snapshot backend over the columnar `ps`/`lsof` tools.
//!
//! Used on macOS and other Unix systems without a process filesystem. Each
//! snapshot costs several subprocess invocations, so callers should not
//! snapshot in a hot loop.

use super::snapshot::{Backend, ProcessSnapshotSource};
use super::tool_runner::{query, CommandRunner};
use super::types::ProcessInfo;
use chrono::{Local, TimeDelta};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::trace;
use wayr_common::ProcessId;

/// One row of `ps -o pid=,ppid=,user=,comm=,etime=,rss=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PsRow {
    pub pid: u32,
    pub ppid: u32,
    pub user: String,
    pub comm: String,
    pub etime: String,
    pub rss_kb: u64,
}

/// Parse one `pid ppid user comm etime rss` row.
///
/// pid, ppid and user are taken from the left and etime and rss from the
/// right, so a comm containing spaces survives intact.
pub(crate) fn parse_ps_row(line: &str) -> Option<PsRow> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 {
        return None;
    }
    let n = fields.len();

    Some(PsRow {
        pid: fields[0].parse().ok()?,
        ppid: fields[1].parse().ok()?,
        user: fields[2].to_string(),
        comm: fields[3..n - 2].join(" "),
        etime: fields[n - 2].to_string(),
        rss_kb: fields[n - 1].parse().ok()?,
    })
}

/// Parse ps elapsed time `[[dd-]hh:]mm:ss` (or bare seconds) into seconds.
///
/// `None` on malformed input or when the total overflows.
pub(crate) fn parse_etime(s: &str) -> Option<u64> {
    let (days, time_part) = match s.split_once('-') {
        Some((days, rest)) => (days.parse::<u64>().ok()?, rest),
        None => (0, s),
    };

    let fields = time_part
        .split(':')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;
    let (hours, mins, secs) = match fields.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        [s] => (0, 0, *s),
        _ => return None,
    };

    days.checked_mul(86400)?
        .checked_add(hours.checked_mul(3600)?)?
        .checked_add(mins.checked_mul(60)?)?
        .checked_add(secs)
}

/// First `n`-tagged line of `lsof -Fn` output, tag stripped.
pub(crate) fn parse_lsof_cwd(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix('n'))
        .filter(|path| !path.is_empty())
        .map(|path| path.to_string())
}

fn is_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Environment from `ps -E -o command=`, which appends it to the command.
pub(crate) fn parse_ps_environ(output: &str) -> BTreeMap<String, String> {
    output
        .split_whitespace()
        .filter_map(|token| token.split_once('='))
        .filter(|(key, _)| is_env_key(key))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Snapshot source querying `ps` and `lsof`.
pub struct PsSource<'r> {
    runner: &'r dyn CommandRunner,
}

impl<'r> PsSource<'r> {
    pub fn new(runner: &'r dyn CommandRunner) -> Self {
        PsSource { runner }
    }
}

impl ProcessSnapshotSource for PsSource<'_> {
    fn snapshot(&self, pid: ProcessId) -> Option<ProcessInfo> {
        let pid_arg = pid.to_string();
        let stdout = query(
            self.runner,
            "ps",
            &["-p", &pid_arg, "-o", "pid=,ppid=,user=,comm=,etime=,rss="],
        )?;
        let row = stdout.lines().find_map(parse_ps_row)?;
        trace!(%pid, ?row, "ps row parsed");

        let mut info = ProcessInfo::new(row.pid, row.ppid, base_name(&row.comm));
        info.user = row.user;
        info.rss_kb = row.rss_kb;

        let now = Local::now();
        info.start_time = parse_etime(&row.etime)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(TimeDelta::try_seconds)
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(now);

        info.cmd = query(self.runner, "ps", &["-p", &pid_arg, "-o", "command="])
            .map(|out| out.trim().to_string())
            .filter(|cmd| !cmd.is_empty())
            .unwrap_or_else(|| info.name.clone());

        info.cwd = query(
            self.runner,
            "lsof",
            &["-a", "-p", &pid_arg, "-d", "cwd", "-Fn"],
        )
        .and_then(|out| parse_lsof_cwd(&out));

        info.env_vars = query(self.runner, "ps", &["-p", &pid_arg, "-E", "-o", "command="])
            .map(|out| parse_ps_environ(&out))
            .unwrap_or_default();

        Some(info)
    }

    fn backend(&self) -> Backend {
        Backend::Ps
    }
}

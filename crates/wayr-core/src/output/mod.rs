//! Renderers for resolved processes.
//!
//! Everything here writes to a caller-supplied `Write` (stdout in the
//! binary, a buffer in tests). Colors come from a [`Palette`].

pub mod json;
pub mod palette;
pub mod report;
pub mod tree;

pub use json::{write_json, ProcessReport};
pub use palette::Palette;
pub use report::{write_report, ReportOptions};
pub use tree::write_tree;

use crate::collect::ProcessInfo;
use crate::context::warnings_for;
use crate::provenance::ProcessArena;
use chrono::{DateTime, Local};
use std::io::{self, Write};
use wayr_common::ProcessId;

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Coarse age of `start` relative to `now`: the largest whole unit among
/// days, hours, minutes, and seconds.
pub fn format_time_ago(start: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - start).num_seconds().max(0);
    let days = secs / 86_400;
    let rem = secs % 86_400;

    if days > 0 {
        plural(days, "day")
    } else if rem >= 3600 {
        plural(rem / 3600, "hour")
    } else if rem >= 60 {
        plural(rem / 60, "minute")
    } else {
        plural(rem, "second")
    }
}

/// Lineage of `pid` as `name (pid N) → ... → name (pid N)`, ending at the
/// process itself.
pub fn chain_line(arena: &ProcessArena, pid: ProcessId) -> String {
    arena
        .lineage(pid)
        .iter()
        .map(|p| p.label())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Short mode: the chain line alone.
pub fn write_short<W: Write>(out: &mut W, arena: &ProcessArena, pid: ProcessId) -> io::Result<()> {
    writeln!(out, "{}", chain_line(arena, pid))
}

/// Warnings-only mode: one `⚠` line per warning, nothing when there are none.
pub fn write_warnings<W: Write>(
    out: &mut W,
    arena: &ProcessArena,
    pid: ProcessId,
    palette: &Palette,
) -> io::Result<()> {
    let Some(info) = arena.get(pid) else {
        return Ok(());
    };
    for warning in warnings_for(info) {
        writeln!(out, "{}⚠{}  {warning}", palette.yellow, palette.reset)?;
    }
    Ok(())
}

/// Notice for hosts that are neither Linux nor macOS.
pub fn write_platform_notice<W: Write>(
    out: &mut W,
    os: &str,
    palette: &Palette,
) -> io::Result<()> {
    writeln!(
        out,
        "{}wayr is optimized for Linux and macOS. Your OS ({os}) may not be fully supported.{}",
        palette.red, palette.reset
    )
}

/// Listing shown when a lookup matched several processes.
pub fn write_match_list<W: Write>(
    out: &mut W,
    matches: &[ProcessInfo],
    palette: &Palette,
) -> io::Result<()> {
    let p = palette;
    writeln!(out, "{}Multiple matching processes found:{}", p.yellow, p.reset)?;
    for (i, info) in matches.iter().enumerate() {
        writeln!(out, "[{}] {}", i + 1, p.process_label(&info.name, info.pid))?;
        writeln!(out, "    {}{}{}", p.dim, info.cmd, p.reset)?;
    }
    writeln!(out, "\n{}Re-run with:{}", p.bold, p.reset)?;
    writeln!(out, "  wayr --pid <pid>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_platform_notice_names_the_os() {
        let mut buf = Vec::new();
        write_platform_notice(&mut buf, "freebsd", &Palette::plain()).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "wayr is optimized for Linux and macOS. Your OS (freebsd) may not be fully supported.\n"
        );

        let mut buf = Vec::new();
        write_platform_notice(&mut buf, "netbsd", &Palette::new(true)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("\x1b[91mwayr is optimized"));
        assert!(text.ends_with("supported.\x1b[0m\n"));
    }

    #[test]
    fn test_format_time_ago_units() {
        let now = Local::now();
        let ago = |d: Duration| format_time_ago(now - d, now);

        assert_eq!(ago(Duration::seconds(0)), "0 seconds ago");
        assert_eq!(ago(Duration::seconds(1)), "1 second ago");
        assert_eq!(ago(Duration::seconds(59)), "59 seconds ago");
        assert_eq!(ago(Duration::seconds(60)), "1 minute ago");
        assert_eq!(ago(Duration::minutes(59) + Duration::seconds(59)), "59 minutes ago");
        assert_eq!(ago(Duration::hours(1)), "1 hour ago");
        assert_eq!(ago(Duration::hours(23)), "23 hours ago");
        assert_eq!(ago(Duration::days(1) + Duration::hours(5)), "1 day ago");
        assert_eq!(ago(Duration::days(400)), "400 days ago");
    }

    #[test]
    fn test_future_start_clamps_to_zero() {
        let now = Local::now();
        assert_eq!(format_time_ago(now + Duration::seconds(30), now), "0 seconds ago");
    }

    fn sample_arena() -> ProcessArena {
        let mut arena = ProcessArena::new();
        arena.insert(ProcessInfo::new(1u32, 0u32, "launchd"));
        let mut shell = ProcessInfo::new(88u32, 1u32, "zsh");
        shell.ancestry = vec![ProcessId(1)];
        shell.user = "root".to_string();
        arena.insert(shell);
        arena
    }

    #[test]
    fn test_short_line_includes_target() {
        let arena = sample_arena();
        let mut buf = Vec::new();
        write_short(&mut buf, &arena, ProcessId(88)).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "launchd (pid 1) → zsh (pid 88)\n");
    }

    #[test]
    fn test_warnings_only() {
        let arena = sample_arena();
        let mut buf = Vec::new();
        write_warnings(&mut buf, &arena, ProcessId(88), &Palette::plain()).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "⚠  Process is running as root\n");

        let mut buf = Vec::new();
        write_warnings(&mut buf, &arena, ProcessId(1), &Palette::plain()).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_match_list() {
        let mut a = ProcessInfo::new(100u32, 1u32, "nginx");
        a.cmd = "nginx: master process".to_string();
        let b = ProcessInfo::new(101u32, 100u32, "nginx");

        let mut buf = Vec::new();
        write_match_list(&mut buf, &[a, b], &Palette::plain()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "Multiple matching processes found:\n\
             [1] nginx (pid 100)\n    nginx: master process\n\
             [2] nginx (pid 101)\n    nginx\n\
             \nRe-run with:\n  wayr --pid <pid>\n"
        );
    }
}

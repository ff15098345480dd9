//! Full human-readable report for one process.

use super::palette::Palette;
use super::{chain_line, format_time_ago};
use crate::context::warnings_for;
use crate::provenance::ProcessArena;
use chrono::Local;
use std::io::{self, Write};
use wayr_common::ProcessId;

/// What the report includes beyond the always-present lines.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Man page description for the "What it is" line.
    pub description: Option<String>,
    /// Extended Info section (memory, ppid).
    pub verbose: bool,
    /// Environment Variables section.
    pub show_env: bool,
    /// Warnings section.
    pub show_warnings: bool,
}

/// Write the report for `pid`, which must be in `arena`.
pub fn write_report<W: Write>(
    out: &mut W,
    arena: &ProcessArena,
    pid: ProcessId,
    palette: &Palette,
    options: &ReportOptions,
) -> io::Result<()> {
    let Some(info) = arena.get(pid) else {
        return Ok(());
    };
    let p = palette;
    let label = |name: &str| format!("{}{name}{}", p.bold, p.reset);

    writeln!(out, "{}      : {}", label("Target"), info.name)?;
    writeln!(out, "{}     : {}", label("Process"), p.process_label(&info.name, info.pid))?;
    writeln!(out, "{}        : {}", label("User"), info.user)?;
    writeln!(out, "{}     : {}{}{}", label("Command"), p.dim, info.cmd, p.reset)?;

    if let Some(description) = &options.description {
        writeln!(out, "{}  : {description}", label("What it is"))?;
    }

    writeln!(
        out,
        "{}     : {} ({})",
        label("Started"),
        format_time_ago(info.start_time, Local::now()),
        info.start_time.format("%a %Y-%m-%d %H:%M:%S")
    )?;

    if info.restart_count > 0 {
        writeln!(out, "{}    : {}", label("Restarts"), info.restart_count)?;
    }

    writeln!(out, "{} :", label("Why It Exists"))?;
    writeln!(out, "  {}{}{}", p.green, chain_line(arena, pid), p.reset)?;

    let source = match &info.source_detail {
        Some(detail) => format!("{} ({detail})", info.source),
        None => info.source.to_string(),
    };
    writeln!(out, "{}      : {}{source}{}", label("Source"), p.magenta, p.reset)?;

    if let Some(cwd) = &info.cwd {
        writeln!(out, "{} : {cwd}", label("Working Dir"))?;
    }

    if let Some(repo) = &info.git_repo {
        match &info.git_branch {
            Some(branch) => writeln!(out, "{}    : {repo} ({branch})", label("Git Repo"))?,
            None => writeln!(out, "{}    : {repo}", label("Git Repo"))?,
        }
    }

    if let Some(container) = &info.container_name {
        writeln!(out, "{}   : {container}", label("Container"))?;
        if let Some(image) = &info.container_image {
            writeln!(out, "{}       : {image}", label("Image"))?;
        }
    }

    if !info.listening_addresses.is_empty() {
        writeln!(
            out,
            "{}   : {}",
            label("Listening"),
            info.listening_addresses.join(", ")
        )?;
    }

    if options.verbose {
        writeln!(out, "\n{}", label("Extended Info:"))?;
        writeln!(out, "  Memory (RSS): {} MB", info.rss_kb / 1024)?;
        writeln!(out, "  PPID: {}", info.ppid)?;
    }

    if options.show_env && !info.env_vars.is_empty() {
        writeln!(out, "\n{}", label("Environment Variables:"))?;
        for (key, value) in &info.env_vars {
            writeln!(out, "  {key}={value}")?;
        }
    }

    let warnings = warnings_for(info);
    if options.show_warnings && !warnings.is_empty() {
        writeln!(out, "\n{}{}Warnings:{}", p.bold, p.yellow, p.reset)?;
        for warning in warnings {
            writeln!(out, "  {}⚠{}  {warning}", p.yellow, p.reset)?;
        }
    }

    Ok(())
}

//! JSON rendering of one resolved process.

use crate::context::warnings_for;
use crate::provenance::{ProcessArena, SourceCategory};
use chrono::SecondsFormat;
use serde::Serialize;
use std::io::Write;
use wayr_common::{ProcessId, Result};

#[derive(Debug, Serialize)]
pub struct AncestorEntry<'a> {
    pub pid: ProcessId,
    pub name: &'a str,
}

/// Serialized shape of a process; field order is the output order.
#[derive(Debug, Serialize)]
pub struct ProcessReport<'a> {
    pub pid: ProcessId,
    pub name: &'a str,
    pub ppid: ProcessId,
    pub user: &'a str,
    pub command: &'a str,
    pub start_time: String,
    pub uptime_seconds: i64,
    pub restart_count: u32,
    pub memory_kb: u64,
    pub ancestry: Vec<AncestorEntry<'a>>,
    pub source: SourceCategory,
    pub source_detail: Option<&'a str>,
    pub working_directory: Option<&'a str>,
    pub git_repo: Option<&'a str>,
    pub git_branch: Option<&'a str>,
    pub container_name: Option<&'a str>,
    pub container_image: Option<&'a str>,
    pub listening_addresses: &'a [String],
    pub warnings: Vec<String>,
}

impl<'a> ProcessReport<'a> {
    pub fn build(arena: &'a ProcessArena, pid: ProcessId) -> Option<Self> {
        let info = arena.get(pid)?;
        Some(ProcessReport {
            pid: info.pid,
            name: &info.name,
            ppid: info.ppid,
            user: &info.user,
            command: &info.cmd,
            start_time: info.start_time.to_rfc3339_opts(SecondsFormat::Secs, false),
            uptime_seconds: info.uptime_seconds(),
            restart_count: info.restart_count,
            memory_kb: info.rss_kb,
            ancestry: arena
                .ancestors(pid)
                .into_iter()
                .map(|a| AncestorEntry {
                    pid: a.pid,
                    name: &a.name,
                })
                .collect(),
            source: info.source,
            source_detail: info.source_detail.as_deref(),
            working_directory: info.cwd.as_deref(),
            git_repo: info.git_repo.as_deref(),
            git_branch: info.git_branch.as_deref(),
            container_name: info.container_name.as_deref(),
            container_image: info.container_image.as_deref(),
            listening_addresses: &info.listening_addresses,
            warnings: warnings_for(info),
        })
    }
}

/// Write the pretty-printed JSON object for `pid`, followed by a newline.
pub fn write_json<W: Write>(out: &mut W, arena: &ProcessArena, pid: ProcessId) -> Result<()> {
    let Some(report) = ProcessReport::build(arena, pid) else {
        return Ok(());
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::ProcessInfo;
    use serde_json::Value;

    #[test]
    fn test_json_shape() {
        let mut arena = ProcessArena::new();
        arena.insert(ProcessInfo::new(1u32, 0u32, "init"));
        let mut info = ProcessInfo::new(77u32, 1u32, "redis-server");
        info.cmd = "redis-server *:6379".to_string();
        info.ancestry = vec![ProcessId(1)];
        info.source = SourceCategory::InteractiveShell;
        info.add_listening_address("*:6379");
        arena.insert(info);

        let mut buf = Vec::new();
        write_json(&mut buf, &arena, ProcessId(77)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["pid"], 77);
        assert_eq!(value["ppid"], 1);
        assert_eq!(value["command"], "redis-server *:6379");
        assert_eq!(value["ancestry"], serde_json::json!([{"pid": 1, "name": "init"}]));
        assert_eq!(value["source"], "interactive shell");
        assert_eq!(value["source_detail"], Value::Null);
        assert_eq!(value["working_directory"], Value::Null);
        assert_eq!(value["listening_addresses"], serde_json::json!(["*:6379"]));
        assert_eq!(
            value["warnings"],
            serde_json::json!(["Listening on public interface (*:6379)"])
        );
        assert!(value["start_time"].as_str().unwrap().contains('T'));

        // Two-space indentation, keys in schema order
        assert!(text.starts_with("{\n  \"pid\": 77,\n  \"name\": \"redis-server\",\n  \"ppid\": 1,"));
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 19);
    }
}

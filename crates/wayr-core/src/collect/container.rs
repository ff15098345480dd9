//! Container runtime lookup.
//!
//! Uses `docker ps --no-trunc` and picks the row mentioning the target pid.

use super::tool_runner::{query, CommandRunner};
use wayr_common::ProcessId;

/// Container identity as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub name: String,
    pub image: String,
}

/// Find the `docker ps` row containing `pid` as a whitespace-delimited token.
///
/// The container name is the last column and the image the second.
pub fn parse_docker_ps(output: &str, pid: ProcessId) -> Option<ContainerInfo> {
    let needle = pid.to_string();
    output.lines().find_map(|line| {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 || !parts.contains(&needle.as_str()) {
            return None;
        }
        Some(ContainerInfo {
            name: parts[parts.len() - 1].to_string(),
            image: parts[1].to_string(),
        })
    })
}

/// Ask the container runtime which container holds `pid`.
pub fn query_container(runner: &dyn CommandRunner, pid: ProcessId) -> Option<ContainerInfo> {
    let stdout = query(runner, "docker", &["ps", "--no-trunc"])?;
    parse_docker_ps(&stdout, pid)
}

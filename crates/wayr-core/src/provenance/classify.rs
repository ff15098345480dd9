//! Supervisor classification.
//!
//! Walks the ancestry from the nearest ancestor to the root and applies a
//! fixed rule table to each. The first ancestor matching any rule decides the
//! category; within one ancestor, earlier rules win. New supervisors are
//! appended to the table, never reordered in.

use crate::collect::{query_container, query_unit, CommandRunner, ContainerInfo, Platform, ProcessInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

/// Shells recognized as the interactive origin of a process.
const SHELLS: &[&str] = &["bash", "zsh", "fish", "sh", "dash", "tcsh", "csh"];

/// What ultimately launched a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SourceCategory {
    #[serde(rename = "systemd")]
    Systemd,
    #[serde(rename = "launchd")]
    Launchd,
    #[serde(rename = "docker")]
    Docker,
    #[serde(rename = "pm2")]
    Pm2,
    #[serde(rename = "supervisor")]
    Supervisor,
    #[serde(rename = "cron")]
    Cron,
    #[serde(rename = "interactive shell")]
    InteractiveShell,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl SourceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceCategory::Systemd => "systemd",
            SourceCategory::Launchd => "launchd",
            SourceCategory::Docker => "docker",
            SourceCategory::Pm2 => "pm2",
            SourceCategory::Supervisor => "supervisor",
            SourceCategory::Cron => "cron",
            SourceCategory::InteractiveShell => "interactive shell",
            SourceCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub source: SourceCategory,
    pub detail: Option<String>,
    pub container: Option<ContainerInfo>,
}

impl Classification {
    fn bare(source: SourceCategory) -> Self {
        Classification {
            source,
            ..Default::default()
        }
    }

    /// Write the classification onto the process record.
    pub fn apply(self, info: &mut ProcessInfo) {
        info.source = self.source;
        info.source_detail = self.detail;
        match self.container {
            Some(container) => {
                info.container_name = Some(container.name);
                info.container_image = Some(container.image);
            }
            None => {
                info.container_name = None;
                info.container_image = None;
            }
        }
    }
}

/// Match one ancestor against the rule table, returning the category it
/// implies without any enrichment.
fn match_ancestor(ancestor: &ProcessInfo) -> Option<SourceCategory> {
    let name = ancestor.name.as_str();
    let cmd = ancestor.cmd.as_str();

    if name == "systemd" && !ancestor.pid.is_init() {
        Some(SourceCategory::Systemd)
    } else if name == "launchd" {
        Some(SourceCategory::Launchd)
    } else if name.contains("docker") || name.contains("containerd") {
        Some(SourceCategory::Docker)
    } else if cmd.contains("PM2") || name.contains("pm2") {
        Some(SourceCategory::Pm2)
    } else if name.contains("supervisor") {
        Some(SourceCategory::Supervisor)
    } else if name == "cron" || cmd.contains("CRON") {
        Some(SourceCategory::Cron)
    } else if SHELLS.contains(&name) {
        Some(SourceCategory::InteractiveShell)
    } else {
        None
    }
}

/// Classify `process` from its ancestors (root first, as stored in the arena).
///
/// Enrichment queries (`systemctl`, `docker`) run only for the matched rule,
/// and their failure leaves the detail empty. Never returns an absent source:
/// no match is [`SourceCategory::Unknown`].
#[instrument(skip_all, fields(pid = %process.pid, ancestors = ancestors.len()))]
pub fn classify(
    process: &ProcessInfo,
    ancestors: &[&ProcessInfo],
    runner: &dyn CommandRunner,
    platform: Platform,
) -> Classification {
    for ancestor in ancestors.iter().rev() {
        let Some(source) = match_ancestor(ancestor) else {
            continue;
        };
        debug!(%source, ancestor = %ancestor.pid, "supervisor matched");

        return match source {
            SourceCategory::Systemd => Classification {
                source,
                detail: if platform.is_linux() {
                    query_unit(runner, process.pid)
                } else {
                    None
                },
                container: None,
            },
            SourceCategory::Docker => {
                let container = query_container(runner, process.pid);
                Classification {
                    source,
                    detail: container.as_ref().map(|c| c.name.clone()),
                    container,
                }
            }
            SourceCategory::InteractiveShell => Classification {
                source,
                detail: Some(ancestor.name.clone()),
                container: None,
            },
            other => Classification::bare(other),
        };
    }
    Classification::bare(SourceCategory::Unknown)
}

//! Advisory warnings about a resolved process.

use crate::collect::ProcessInfo;

/// Restart count above which a warning is raised.
const RESTART_THRESHOLD: u32 = 5;

/// Resident memory above which a warning is raised (1 GiB, in KB).
const HIGH_RSS_KB: u64 = 1024 * 1024;

/// Uptime above which a warning is raised, in whole days.
const LONG_RUNNING_DAYS: i64 = 90;

const PUBLIC_BIND_PREFIXES: &[&str] = &["0.0.0.0:", "*:", ":::"];

/// Evaluate the warning rules, in display order.
pub fn warnings_for(info: &ProcessInfo) -> Vec<String> {
    let mut warnings = Vec::new();

    if info.user == "root" && !info.pid.is_init() {
        warnings.push("Process is running as root".to_string());
    }

    if let Some(addr) = info
        .listening_addresses
        .iter()
        .find(|addr| PUBLIC_BIND_PREFIXES.iter().any(|p| addr.starts_with(p)))
    {
        warnings.push(format!("Listening on public interface ({addr})"));
    }

    if info.restart_count > RESTART_THRESHOLD {
        warnings.push(format!("Process has restarted {} times", info.restart_count));
    }

    if info.rss_kb > HIGH_RSS_KB {
        warnings.push(format!("High memory usage ({} MB)", info.rss_kb / 1024));
    }

    let days = info.uptime_seconds() / 86_400;
    if days > LONG_RUNNING_DAYS {
        warnings.push(format!("Process has been running for {days} days"));
    }

    warnings
}

//! systemd unit lookup for a pid.

use super::tool_runner::{query, CommandRunner};
use regex::Regex;
use std::sync::OnceLock;
use wayr_common::ProcessId;

static UNIT_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn unit_pattern() -> Option<&'static Regex> {
    UNIT_PATTERN
        .get_or_init(|| Regex::new(r"([a-zA-Z0-9._-]+\.(service|socket|timer))").ok())
        .as_ref()
}

/// First unit name on a `systemctl status` line mentioning a service or socket.
pub fn parse_unit_from_status(output: &str) -> Option<String> {
    let pattern = unit_pattern()?;
    output
        .lines()
        .filter(|line| line.contains(".service") || line.contains(".socket"))
        .find_map(|line| pattern.captures(line))
        .map(|caps| caps[1].to_string())
}

/// Ask systemd which unit owns `pid`.
pub fn query_unit(runner: &dyn CommandRunner, pid: ProcessId) -> Option<String> {
    let stdout = query(runner, "systemctl", &["status", &pid.to_string()])?;
    parse_unit_from_status(&stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedRunner;

    const STATUS_NGINX: &str = "● nginx.service - A high performance web server and a reverse proxy server
     Loaded: loaded (/lib/systemd/system/nginx.service; enabled; vendor preset: enabled)
     Active: active (running) since Mon 2026-01-05 10:00:00 UTC; 2 days ago
   Main PID: 812 (nginx)
      Tasks: 3 (limit: 4915)
     CGroup: /system.slice/nginx.service
             ├─812 nginx: master process /usr/sbin/nginx -g daemon on; master_process on;
             └─813 nginx: worker process
";

    #[test]
    fn test_parse_unit_from_status() {
        assert_eq!(
            parse_unit_from_status(STATUS_NGINX).as_deref(),
            Some("nginx.service")
        );
    }

    #[test]
    fn test_parse_socket_unit() {
        let out = "● docker.socket - Docker Socket for the API\n   Loaded: loaded\n";
        assert_eq!(parse_unit_from_status(out).as_deref(), Some("docker.socket"));
    }

    #[test]
    fn test_timer_only_lines_are_not_considered() {
        // Lines must mention .service or .socket to be scanned
        let out = "● backup.timer - Nightly backup\n";
        assert_eq!(parse_unit_from_status(out), None);
    }

    #[test]
    fn test_query_unit_failure_is_none() {
        let runner = ScriptedRunner::new().fail("systemctl status 812", 4);
        assert_eq!(query_unit(&runner, ProcessId(812)), None);

        let runner = ScriptedRunner::new().ok("systemctl status 812", STATUS_NGINX);
        assert_eq!(query_unit(&runner, ProcessId(812)).as_deref(), Some("nginx.service"));
    }
}

//! Kernel TCP socket tables and socket-inode ownership.
//!
//! Parses `<root>/net/tcp` and `<root>/net/tcp6` and maps socket inodes back
//! to the owning process by scanning `<root>/<pid>/fd/*` links.
//!
//! Table format (one socket per line, after a header):
//! ```text
//!   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
//!    0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 51234 ...
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::trace;
use wayr_common::ProcessId;

/// Hex state code of a listening socket.
pub const TCP_LISTEN: &str = "0A";

/// Socket tables read by the fallback paths, relative to the proc root.
const TCP_TABLES: &[&str] = &["net/tcp", "net/tcp6"];

/// One row of a kernel TCP table, fields kept in their hex form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEntry {
    pub addr_hex: String,
    pub port_hex: String,
    pub state: String,
    pub inode: String,
}

impl SocketEntry {
    pub fn is_listen(&self) -> bool {
        self.state == TCP_LISTEN
    }

    /// Compare against a port number as 4-digit upper hex, ignoring case.
    pub fn matches_port(&self, port: u16) -> bool {
        self.port_hex.eq_ignore_ascii_case(&format!("{port:04X}"))
    }

    pub fn port(&self) -> Option<u16> {
        u16::from_str_radix(&self.port_hex, 16).ok()
    }

    /// `ip:port` with the address decoded by [`decode_addr`].
    pub fn endpoint(&self) -> Option<String> {
        Some(format!("{}:{}", decode_addr(&self.addr_hex), self.port()?))
    }
}

/// Parse the content of a TCP table.
///
/// Lines with fewer than ten whitespace fields, or whose local address is not
/// `HEXADDR:HEXPORT`, are skipped.
pub fn parse_tcp_table(content: &str) -> Vec<SocketEntry> {
    content
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 10 {
                return None;
            }
            let (addr_hex, port_hex) = parts[1].split_once(':')?;
            Some(SocketEntry {
                addr_hex: addr_hex.to_string(),
                port_hex: port_hex.to_string(),
                state: parts[3].to_string(),
                inode: parts[9].to_string(),
            })
        })
        .collect()
}

/// Decode a kernel hex address.
///
/// Eight hex digits are an IPv4 address stored with its bytes reversed
/// (`0100007F` is `127.0.0.1`). Anything else is returned raw as `[hex]`.
pub fn decode_addr(hex: &str) -> String {
    if hex.len() == 8 {
        let bytes: Option<Vec<u8>> = (0..4)
            .map(|i| u8::from_str_radix(hex.get(i * 2..i * 2 + 2)?, 16).ok())
            .collect();
        if let Some(b) = bytes {
            return format!("{}.{}.{}.{}", b[3], b[2], b[1], b[0]);
        }
    }
    format!("[{hex}]")
}

/// Read and parse every TCP table under `root`; unreadable tables are skipped.
pub fn read_tcp_tables(root: &Path) -> Vec<SocketEntry> {
    TCP_TABLES
        .iter()
        .filter_map(|table| match fs::read_to_string(root.join(table)) {
            Ok(content) => Some(parse_tcp_table(&content)),
            Err(e) => {
                trace!(table, error = %e, "socket table unreadable");
                None
            }
        })
        .flatten()
        .collect()
}

fn socket_inode_of_link(target: &Path) -> Option<String> {
    let target = target.to_str()?;
    let inode = target.strip_prefix("socket:[")?.strip_suffix(']')?;
    Some(inode.to_string())
}

/// Socket inodes held open by `pid`, from its `fd/*` links.
pub fn socket_inodes(root: &Path, pid: ProcessId) -> HashSet<String> {
    let fd_dir = root.join(pid.to_string()).join("fd");
    let Ok(entries) = fs::read_dir(&fd_dir) else {
        return HashSet::new();
    };

    entries
        .flatten()
        .filter_map(|entry| fs::read_link(entry.path()).ok())
        .filter_map(|target| socket_inode_of_link(&target))
        .collect()
}

/// Numeric directories under `root`, ascending.
pub fn list_pids(root: &Path) -> Vec<ProcessId> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    let mut pids: Vec<ProcessId> = entries
        .flatten()
        .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
        .map(ProcessId)
        .collect();
    pids.sort_unstable();
    pids
}

/// Find the process owning a socket inode.
///
/// Scans pids in ascending order; when several processes share the inode
/// (e.g. after fork) the lowest pid wins.
pub fn find_inode_owner(root: &Path, inode: &str) -> Option<ProcessId> {
    let needle = format!("socket:[{inode}]");
    list_pids(root).into_iter().find(|&pid| {
        let fd_dir = root.join(pid.to_string()).join("fd");
        let Ok(entries) = fs::read_dir(&fd_dir) else {
            return false;
        };
        entries
            .flatten()
            .filter_map(|entry| fs::read_link(entry.path()).ok())
            .any(|target| target.to_string_lossy() == needle)
    })
}

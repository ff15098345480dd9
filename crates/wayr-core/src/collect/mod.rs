//! Process data collection.
//!
//! Snapshot backends, the bulk link table, the port resolver, and the
//! supervisor queries (systemd, container runtime). Everything here is total:
//! a failed external query or unreadable file yields "no data", never an
//! error.

pub mod container;
pub mod link_table;
pub mod network;
pub mod port;
pub mod procfs;
pub mod ps;
pub mod snapshot;
pub mod systemd;
pub mod tool_runner;
pub mod types;

pub use container::{query_container, ContainerInfo};
pub use link_table::{fetch_command_rows, fetch_link_table, LinkTable};
pub use port::{detect_listening, resolve_by_port};
pub use procfs::ProcfsSource;
pub use ps::PsSource;
pub use systemd::query_unit;
pub use snapshot::{
    select_source, Backend, BackendChoice, Platform, ProcessSnapshotSource, DEFAULT_PROC_ROOT,
};
pub use tool_runner::{query, CommandRunner, SystemRunner, ToolError, ToolOutput};
pub use types::ProcessInfo;

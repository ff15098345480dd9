//! Provenance reconstruction.
//!
//! Turns snapshots into a causal chain: target lookup, ancestry walk,
//! descendant tree, and supervisor classification over a [`ProcessArena`].

pub mod ancestry;
pub mod arena;
pub mod classify;
pub mod investigate;
pub mod search;
pub mod tree;

pub use ancestry::{resolve_ancestry, MAX_ANCESTRY_DEPTH};
pub use arena::ProcessArena;
pub use classify::{classify, Classification, SourceCategory};
pub use investigate::{investigate, Probe};
pub use search::{find_by_name, find_by_pid, find_by_port, matches_name, narrow_candidates};
pub use tree::build_tree;

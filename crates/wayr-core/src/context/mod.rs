//! Context around a resolved process: git checkout, man page description,
//! and advisory warnings.

pub mod describe;
pub mod git;
pub mod warnings;

pub use describe::{describe, man_topic};
pub use git::{detect_git, MAX_GIT_SEARCH_DEPTH};
pub use warnings::warnings_for;

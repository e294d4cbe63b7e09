//! Infrastructure layer
//!
//! Handles all I/O against the outside world: build tool subprocesses, the
//! git repository, and the GitHub API.

pub mod git;
pub mod github;
pub mod process;

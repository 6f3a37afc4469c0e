//! Guardian Core - Shared functionality for the Focus Guardian crates
//!
//! Standard data/config locations, process lookup and termination, and
//! human-readable formatting helpers.

pub mod format;
pub mod paths;
pub mod process;

pub use paths::Paths;

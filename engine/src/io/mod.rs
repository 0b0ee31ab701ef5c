//! Side-effecting helpers: child processes, scratch directories, configuration.

pub mod config;
pub mod process;
pub mod workspace;

//! Snippet execution engine.
//!
//! Takes a `(language, source)` pair, turns it into one or more child-process
//! invocations (compile, disassemble, link, run) under a hard wall-clock
//! timeout, and folds the stage outputs into a single [`ExecutionResult`].
//! The crate keeps the same split as the rest of the workspace:
//!
//! - **[`core`]**: Pure, deterministic logic (result shapes, merge rules,
//!   directive grammar, hex dumps). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (child processes, scratch
//!   directories, configuration files).
//!
//! [`pipeline`] composes the two into one runner per supported [`Language`].
//! The engine knows nothing about HTTP or persistence; callers own those.

pub mod core;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::types::{Artifact, ExecutionResult, ProcessResult};
pub use crate::io::config::EngineConfig;
pub use crate::pipeline::{Language, UnknownLanguage, evaluate, evaluate_with};

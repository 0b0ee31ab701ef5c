//! Shared application state for the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use goforit_engine::EngineConfig;
use goforit_engine::io::process::SystemExecutor;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Engine limits and tool overrides, fixed at startup.
    pub config: Arc<EngineConfig>,
    pub executor: SystemExecutor,
    /// Where the most recently evaluated submission is stored.
    pub last_code_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(config: EngineConfig, last_code_path: PathBuf) -> Self {
        let executor = SystemExecutor::new(config.output_limit_bytes);
        Self {
            config: Arc::new(config),
            executor,
            last_code_path: Arc::new(last_code_path),
        }
    }
}

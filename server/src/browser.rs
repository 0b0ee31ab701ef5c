//! Best-effort browser launch.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

fn opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Ask the platform opener to show `url`. Failures are logged only.
///
/// Must run inside the tokio runtime, which reaps the opener once it exits.
pub fn open(url: &str) {
    let program = opener();
    let spawned = Command::new(program)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(_) => debug!(program, url, "browser opener launched"),
        Err(err) => warn!(program, error = %err, "could not open browser"),
    }
}

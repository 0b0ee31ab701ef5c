//! Persistence of the last submitted snippet.
//!
//! One JSON file, replaced atomically on every evaluation so a concurrent
//! reader never sees a half-written document.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A stored `{code, language}` pair, also the body of `POST /api/evaluate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub code: String,
    pub language: String,
}

impl Default for Submission {
    fn default() -> Self {
        Self {
            code: String::new(),
            language: "python".to_string(),
        }
    }
}

/// Read the stored submission; anything missing or unreadable yields the default.
pub fn load(path: &Path) -> Submission {
    fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

/// Write `submission` to `path` via a sibling temp file and rename.
pub fn save(path: &Path, submission: &Submission) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    serde_json::to_writer(&mut file, submission).context("serialize last code")?;
    file.flush().context("flush last code")?;
    file.persist(path)
        .with_context(|| format!("persist {}", path.display()))?;
    Ok(())
}

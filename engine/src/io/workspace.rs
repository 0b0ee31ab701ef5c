//! Per-invocation scratch directories.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::core::source::redact_paths;

const PREFIX: &str = "goforit-";

/// An ephemeral directory owned by exactly one pipeline invocation.
///
/// The directory is removed when the workspace is dropped, whichever way the
/// pipeline exits. Removal failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: Option<TempDir>,
    /// Spellings of the directory path that tools may print.
    aliases: Vec<String>,
}

impl ScratchWorkspace {
    /// Create a fresh directory under `base`, or the system temp dir.
    pub fn create_in(base: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);
        let dir = match base {
            Some(base) => builder
                .tempdir_in(base)
                .with_context(|| format!("create scratch dir in {}", base.display()))?,
            None => builder.tempdir().context("create scratch dir")?,
        };

        let mut aliases = vec![dir.path().to_string_lossy().into_owned()];
        if let Ok(canonical) = dir.path().canonicalize() {
            let canonical = canonical.to_string_lossy().into_owned();
            if !aliases.contains(&canonical) {
                aliases.push(canonical);
            }
        }
        // Longest first so a canonical `/private/var/...` is not half-redacted.
        aliases.sort_by_key(|alias| std::cmp::Reverse(alias.len()));
        debug!(path = %dir.path().display(), "created scratch workspace");

        Ok(Self {
            dir: Some(dir),
            aliases,
        })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path().join(name)
    }

    /// Write `contents` to `name` inside the workspace, creating parents.
    pub async fn write(
        &self,
        name: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) -> Result<PathBuf> {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub async fn read_bytes(&self, name: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = self.join(name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("read {}", path.display()))
    }

    pub async fn read_to_string(&self, name: impl AsRef<Path>) -> Result<String> {
        let bytes = self.read_bytes(name).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Remove every spelling of the workspace path from tool output.
    pub fn redact(&self, text: &str) -> String {
        redact_paths(text, self.aliases.as_slice())
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!(path = %path.display(), "removed scratch workspace"),
            Err(err) => warn!(
                path = %path.display(),
                err = %err,
                "failed to remove scratch workspace"
            ),
        }
    }
}

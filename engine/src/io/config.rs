//! Engine configuration (TOML).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Executables whose default name differs from their tool key.
const DEFAULT_TOOLS: &[(&str, &str)] = &[("python", "python3")];

/// Limits and tool locations for every pipeline.
///
/// Missing fields fall back to the interactive defaults: short run
/// timeouts, roomier build timeouts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Budget for run, interpret and introspection stages.
    pub run_timeout_ms: u64,

    /// Budget for compile, assemble and link stages.
    pub build_timeout_ms: u64,

    /// Per-stream bound on captured stdout/stderr.
    pub output_limit_bytes: usize,

    /// Bytes of a binary rendered into a `hexdump` artifact.
    pub hexdump_limit_bytes: usize,

    /// Parent directory for scratch workspaces; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,

    /// Tool name to executable, e.g. `python = "python3.12"`.
    pub tools: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_timeout_ms: 2_000,
            build_timeout_ms: 10_000,
            output_limit_bytes: 1_000_000,
            hexdump_limit_bytes: 64 * 1024,
            scratch_dir: None,
            tools: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.run_timeout_ms == 0 {
            return Err(anyhow!("run_timeout_ms must be > 0"));
        }
        if self.build_timeout_ms == 0 {
            return Err(anyhow!("build_timeout_ms must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.hexdump_limit_bytes == 0 {
            return Err(anyhow!("hexdump_limit_bytes must be > 0"));
        }
        if let Some((name, _)) = self.tools.iter().find(|(_, exe)| exe.trim().is_empty()) {
            return Err(anyhow!("tools.{name} must be a non-empty executable"));
        }
        Ok(())
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_millis(self.build_timeout_ms)
    }

    /// Executable to launch for `name`, honouring `[tools]` overrides.
    pub fn tool<'a>(&'a self, name: &'a str) -> &'a str {
        if let Some(exe) = self.tools.get(name) {
            return exe;
        }
        DEFAULT_TOOLS
            .iter()
            .find(|(key, _)| *key == name)
            .map_or(name, |(_, exe)| *exe)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.run_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("engine.toml");
        fs::write(
            &path,
            "build_timeout_ms = 30000\n\n[tools]\npython = \"python3.12\"\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.build_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.run_timeout_ms, 2_000);
        assert_eq!(cfg.tool("python"), "python3.12");
    }

    #[test]
    fn tool_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.tool("python"), "python3");
        assert_eq!(cfg.tool("gcc"), "gcc");
    }

    #[test]
    fn rejects_invalid_values() {
        let cfg = EngineConfig {
            run_timeout_ms: 0,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.tools.insert("node".to_string(), "  ".to_string());
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("tools.node"));
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("engine.toml");
        fs::write(&path, "run_timeout_ms = \"soon\"").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }
}

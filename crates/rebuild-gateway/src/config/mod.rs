//! Service config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use rebuild_core::error::{RebuildError, Result};

pub use schema::{EngineSection, GatewaySection, RebuildConfig, TransferSection};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "REBUILD_CONFIG";
/// Config file used when `REBUILD_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "rebuild.yaml";

pub fn load_from_file(path: impl AsRef<Path>) -> Result<RebuildConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| RebuildError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<RebuildConfig> {
    let cfg: RebuildConfig =
        serde_yaml::from_str(s).map_err(|e| RebuildError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the config from `REBUILD_CONFIG`, falling back to `rebuild.yaml`.
///
/// An explicitly named file must exist. A missing default file yields the
/// built-in defaults.
pub fn load_from_env() -> Result<RebuildConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => load_from_file(path),
        Err(_) if !Path::new(DEFAULT_CONFIG_PATH).exists() => {
            tracing::info!(path = DEFAULT_CONFIG_PATH, "config file not found, using defaults");
            let cfg = RebuildConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
        Err(_) => load_from_file(DEFAULT_CONFIG_PATH),
    }
}

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use rebuild_core::error::{RebuildError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RebuildConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub transfer: TransferSection,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            engine: EngineSection::default(),
            transfer: TransferSection::default(),
        }
    }
}

impl RebuildConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RebuildError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.engine.validate()?;
        self.transfer.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Largest request body accepted by any route.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(RebuildError::Config(
                "gateway.listen must be a valid SocketAddr".into(),
            ));
        }
        if !(1024..=1024 * 1024 * 1024).contains(&self.max_body_bytes) {
            return Err(RebuildError::Config(
                "gateway.max_body_bytes must be between 1 KiB and 1 GiB".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Engine shared library. Relative paths resolve against the working directory.
    #[serde(default = "default_library_path")]
    pub library_path: PathBuf,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
        }
    }
}

impl EngineSection {
    pub fn validate(&self) -> Result<()> {
        if self.library_path.as_os_str().is_empty() {
            return Err(RebuildError::Config("engine.library_path must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferSection {
    /// Per-request timeout for downloads and uploads.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TransferSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl TransferSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=600000).contains(&self.timeout_ms) {
            return Err(RebuildError::Config(
                "transfer.timeout_ms must be between 1000 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_max_body_bytes() -> usize {
    100 * 1024 * 1024
}
fn default_timeout_ms() -> u64 {
    60000
}

fn default_library_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("dist/lib/windows/SDK/glasswall.classic.dll")
    } else {
        PathBuf::from("dist/lib/linux/SDK/libglasswall.classic.so")
    }
}

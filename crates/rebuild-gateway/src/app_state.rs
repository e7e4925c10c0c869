//! Shared application state.
//!
//! Holds the config and the collaborators every workflow is built with. No
//! engine state lives here; each request opens its own session through the
//! factory.

use std::sync::Arc;

use rebuild_core::error::Result;

use crate::config::RebuildConfig;
use crate::engine::{EngineFactory, LibraryEngineFactory};
use crate::obs::metrics::RebuildMetrics;
use crate::transfer::{FileTransfer, HttpFileTransfer};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: RebuildConfig,
    engines: Arc<dyn EngineFactory>,
    transfer: Arc<dyn FileTransfer>,
    metrics: RebuildMetrics,
}

impl AppState {
    /// Production wiring: engine library from `engine.library_path`, HTTP transfer.
    pub fn new(cfg: RebuildConfig) -> Result<Self> {
        let engines = Arc::new(LibraryEngineFactory::new(cfg.engine.library_path.clone()));
        let transfer = Arc::new(HttpFileTransfer::new(cfg.transfer.timeout())?);
        Ok(Self::with_collaborators(cfg, engines, transfer))
    }

    pub fn with_collaborators(
        cfg: RebuildConfig,
        engines: Arc<dyn EngineFactory>,
        transfer: Arc<dyn FileTransfer>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                engines,
                transfer,
                metrics: RebuildMetrics::default(),
            }),
        }
    }

    pub fn cfg(&self) -> &RebuildConfig {
        &self.inner.cfg
    }

    pub fn engines(&self) -> Arc<dyn EngineFactory> {
        Arc::clone(&self.inner.engines)
    }

    pub fn transfer(&self) -> Arc<dyn FileTransfer> {
        Arc::clone(&self.inner.transfer)
    }

    pub fn metrics(&self) -> &RebuildMetrics {
        &self.inner.metrics
    }
}

//! Rebuild service.
//!
//! - `POST /api/v1/rebuild/{url,base64,file}`: rebuild through the native engine
//! - `GET /api/v1/health`, `PUT /api/v1/dummy`: status workflows
//! - `GET /healthz`, `GET /metrics`: ops
//!
//! Config comes from `$REBUILD_CONFIG` (default `rebuild.yaml`).

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use rebuild_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::load_from_env()?;
    let listen: SocketAddr = cfg.gateway.listen.parse()?;
    tracing::info!(library = %cfg.engine.library_path.display(), "engine library configured");

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, "rebuild-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

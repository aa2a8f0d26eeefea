use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use planet_tanks_client::config::ClientConfig;
use planet_tanks_client::host::HeadlessHost;
use planet_tanks_client::metrics::ClientMetrics;
use planet_tanks_client::net::game_session::{self, ClientSession};
use planet_tanks_client::net::transport;
use planet_tanks_client::render::registry::ReferenceRegistry;
use planet_tanks_client::util::vec2::Vec2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Planet Tanks client v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: server={}, kind={:?}, screen={}x{}, {} Hz",
        config.server_address,
        config.player_kind,
        config.screen_width,
        config.screen_height,
        config.frame_rate_hz
    );

    let metrics = Arc::new(ClientMetrics::new());
    let registry = ReferenceRegistry::with_default_assets();
    info!(
        "Registry ready: {} sprites, {} sounds",
        registry.sprite_count(),
        registry.sound_count()
    );

    let mut host = HeadlessHost::new(Vec2::new(
        config.screen_width as f32,
        config.screen_height as f32,
    ));
    let stream = transport::connect(&config.server_address).await?;
    let session = ClientSession::new(config, registry, metrics.clone());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    tokio::select! {
        result = game_session::run(session, stream, &mut host) => {
            if let Err(e) = result {
                error!("Session error: {:#}", e);
            }
        }
        _ = shutdown => {
            info!("Shutting down...");
        }
    }

    info!(
        "Client stopped after {} frames | {}",
        host.frames_presented(),
        metrics.summary()
    );

    Ok(())
}

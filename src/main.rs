use std::{net::SocketAddr, sync::Arc};

use marketsentry::{
    AppState, config, routes,
    services::{self, alert_monitor, coins::SupportedCoins, ids::UuidGenerator},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load();

    let coins = match SupportedCoins::load(&settings.coins_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(path = %settings.coins_path, error = %e, "failed to load coin catalog");
            std::process::exit(1);
        }
    };
    tracing::info!(coins = coins.len(), "loaded coin catalog");

    let sources = services::live_sources(&settings);
    let state = AppState::new(settings.clone(), coins, sources, Arc::new(UuidGenerator));

    alert_monitor::spawn_price_alert_monitor(state.clone());

    let app = routes::app(state);

    let ip = settings
        .host
        .parse::<std::net::IpAddr>()
        .expect("HOST must be an IP address");
    let addr = SocketAddr::from((ip, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

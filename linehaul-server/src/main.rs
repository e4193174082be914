use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use linehaul_server::config::ServerConfig;
use linehaul_server::directory::{Directory, SharedDirectory, Snapshot};
use linehaul_server::dispatch::DispatchBoard;
use linehaul_server::gps::{CachedGpsClient, GpsCacheConfig, GpsClient};
use linehaul_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("linehaul_server=info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    // A missing snapshot starts an empty board; the refresh loop picks the file up later.
    let (directory, manifests) = match Snapshot::load(&config.snapshot_path) {
        Ok(snapshot) => (snapshot.directory, snapshot.manifests),
        Err(e) => {
            warn!(
                path = %config.snapshot_path.display(),
                error = %e,
                "starting without reference data"
            );
            (Directory::new(), Vec::new())
        }
    };

    let shared = SharedDirectory::with_source(directory, config.snapshot_path.clone());
    let board = Arc::new(DispatchBoard::new(shared, manifests));

    let gps = match config.gps.clone().map(GpsClient::new).transpose() {
        Ok(client) => client.map(|c| CachedGpsClient::new(c, &GpsCacheConfig::default())),
        Err(e) => {
            warn!(error = %e, "GPS client unavailable, showing profile ETAs only");
            None
        }
    };
    if gps.is_none() {
        info!("GPS ETAs disabled");
    }

    // Spawn background task to reload reference data
    let refresh_board = board.clone();
    let refresh_interval = config.refresh_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_interval);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match refresh_board.refresh().await {
                Ok(added) => info!(new_manifests = added, "refreshed reference data"),
                Err(e) => {
                    warn!(error = %e, "reference data refresh failed, keeping previous snapshot")
                }
            }
        }
    });

    let state = AppState::new(board, gps);
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %config.bind, "linehaul dispatch server listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planner::api::router;
use planner::clock::SystemClock;
use planner::config::{AppConfig, BackendConfig};
use planner::state::AppState;
use planner::store::{HostedStore, RecordStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "planner=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn RecordStore> = match config.backend {
        BackendConfig::Sqlite { database_url } => {
            info!("using sqlite store at {}", database_url);
            Arc::new(SqliteStore::connect(&database_url).await?)
        }
        BackendConfig::Hosted(hosted) => {
            info!("using hosted store at {}", hosted.base_url);
            Arc::new(HostedStore::new(hosted)?)
        }
    };

    let state = AppState::new(store, Arc::new(SystemClock));
    let app = router(state);

    info!("listening on http://{}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use liarcard::{
    routes, AppState, EventBus, GameConfig, InMemorySessionStore, StaticWordCatalog, WordCatalog,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liarcard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting liar card game server");

    let config = GameConfig::from_env()?;
    let catalog: Arc<dyn WordCatalog> = match &config.word_catalog_path {
        Some(path) => {
            info!(path = %path.display(), "Loading word catalog");
            Arc::new(StaticWordCatalog::from_file(path)?)
        }
        None => Arc::new(StaticWordCatalog::default()),
    };

    let event_bus = EventBus::new();
    let store = Arc::new(InMemorySessionStore::new(event_bus.clone()));
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config, store, event_bus, catalog);

    let app = routes::router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

use dotenv::dotenv;
use restaurant_service::api::{self, AppState};
use restaurant_service::config::{Config, StoreBackend};
use restaurant_service::error::{AppError, AppResult};
use restaurant_service::store::{MemoryRestaurantStore, RedisRestaurantStore, RestaurantStore};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Main entry point for the restaurant service.
///
/// This function:
/// 1. Loads environment variables from .env file
/// 2. Opens the store connection once for the whole process
/// 3. Serves the API until ctrl-c, then releases the connection
#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize the logging subscriber
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .pretty()
        .init();

    info!("Starting restaurant service");

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let config = Config::from_env()?;

    let store: Arc<dyn RestaurantStore> = match config.store_backend {
        StoreBackend::Redis => Arc::new(
            RedisRestaurantStore::connect(&config.redis_url, config.restaurants_key.clone()).await?,
        ),
        StoreBackend::Memory => {
            info!("Using in-memory store, data will not outlive the process");
            Arc::new(MemoryRestaurantStore::new())
        }
    };

    let app = api::create_router(AppState::new(store, config.project_menu_items));

    info!("Server listening on {}", config.addr);
    let served = axum::Server::try_bind(&config.addr)
        .map_err(|e| AppError::Server(e.to_string()))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // The router, and with it the store connection, is dropped once serving stops.
    info!("Server stopped, store connection released");
    served.map_err(|e| AppError::Server(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

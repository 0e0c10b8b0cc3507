use crop_advisor_api::classifier::{Classifier, ProfileClassifier};
use crop_advisor_api::config::Config;
use crop_advisor_api::db::Database;
use crop_advisor_api::db_storage::{CommunityStore, MemoryCommunityStore, PgCommunityStore};
use crop_advisor_api::handlers::AppState;
use crop_advisor_api::routes::build_router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, configuration, the classifier, the community store
/// and the HTTP routes, then starts the Axum server. A missing model
/// artifact does not stop startup; recommendation endpoints answer 503.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_advisor_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let classifier: Option<Arc<dyn Classifier>> = match ProfileClassifier::load(&config.model_path)
    {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            tracing::error!("Failed to load model: {}", e);
            None
        }
    };

    let store: Arc<dyn CommunityStore> = match config.database_url {
        Some(ref url) => {
            let db = Database::new(url).await?;
            tracing::info!("Database connection pool established");
            Arc::new(PgCommunityStore::new(db.pool))
        }
        None => {
            tracing::warn!("Using in-memory community store");
            Arc::new(MemoryCommunityStore::new())
        }
    };

    let port = config.port;
    let app_state = Arc::new(AppState::new(config, classifier, store));
    let app = build_router(app_state)?;

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Peer address is the rate limiter's fallback key.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

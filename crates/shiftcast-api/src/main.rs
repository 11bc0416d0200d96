// shiftcast API server entry point

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shiftcast_api::{build_router, AppContext};
use shiftcast_core::{
    Clock, IntentClassifier, KeywordClassifier, NotificationGateway, SystemClock, TracingGateway,
};
use shiftcast_dispatch::{DispatchConfig, Dispatcher};
use shiftcast_storage::InMemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shiftcast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("shiftcast-api starting...");

    let config = DispatchConfig::from_env();
    tracing::info!(
        escalation_delay_secs = config.escalation_delay.as_secs(),
        "Dispatch configured"
    );

    // The TracingGateway logs sends instead of delivering them; wire a real
    // SMS/voice provider here by swapping the gateway implementation.
    let store = Arc::new(InMemoryStore::new());
    let gateway: Arc<dyn NotificationGateway> = Arc::new(TracingGateway);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let classifier: Arc<dyn IntentClassifier> = Arc::new(KeywordClassifier);

    let dispatcher = Arc::new(Dispatcher::new(store.clone(), gateway, clock, config));
    let ctx = AppContext::new(store, dispatcher, classifier);

    let app = build_router(&ctx);

    let addr =
        std::env::var("SHIFTCAST_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:9000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

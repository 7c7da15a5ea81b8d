use std::net::SocketAddr;
use std::sync::Arc;

use tradein_server::db::Stores;
use tradein_server::db::memory::MemoryStore;
use tradein_server::db::postgres::PgStore;
use tradein_server::notify::{LogNotifier, Notifier, WebhookNotifier};
use tradein_server::{AppState, Config, api};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradein_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting tradein-server (env: {})", config.environment);

    let stores = match &config.database_url {
        Some(url) => Stores::postgres(PgStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (development only)");
            Stores::memory(Arc::new(MemoryStore::new()))
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())?),
        None => Arc::new(LogNotifier),
    };

    if config.allow_loopback {
        tracing::warn!("Loopback callers bypass the external whitelist");
    }

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let (state, workers) = AppState::new(config, stores, notifier);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("tradein-server HTTP listening on {http_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Router and state are gone; let the workers drain their queues
    workers.join().await;
    tracing::info!("tradein-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_timeline::config::{AppConfig, StoreBackend};
use studio_timeline::infra::db::Db;
use studio_timeline::infra::storage::{MemoryMediaStore, ObjectStorage};
use studio_timeline::store::{MemoryStore, PgStore};
use studio_timeline::{http, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let state = match config.store_backend {
        StoreBackend::Postgres => {
            let db = Db::connect(&config).await?;
            let store = Arc::new(PgStore::new(db));
            let storage = ObjectStorage::new(&config).await?;
            tracing::info!(bucket = storage.bucket(), "using postgres store");
            AppState {
                store: store.clone(),
                users: store.clone(),
                catalog: store,
                media: Arc::new(storage),
                paseto_access_key: config.paseto_access_key,
                access_ttl_minutes: config.access_ttl_minutes,
                image_max_bytes: config.image_max_bytes,
                request_body_limit_bytes: config.request_body_limit_bytes,
            }
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store, data will not persist");
            let store = Arc::new(MemoryStore::new());
            AppState {
                store: store.clone(),
                users: store.clone(),
                catalog: store,
                media: Arc::new(MemoryMediaStore::new()),
                paseto_access_key: config.paseto_access_key,
                access_ttl_minutes: config.access_ttl_minutes,
                image_max_bytes: config.image_max_bytes,
                request_body_limit_bytes: config.request_body_limit_bytes,
            }
        }
    };

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    tracing::info!(addr = %config.http_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

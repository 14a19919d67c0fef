mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use chatline_api::auth::create_token;
use chatline_api::{AppStateInner, router};
use chatline_core::ChatService;
use chatline_db::{Database, MemoryStore, Store};

use crate::config::{ServerConfig, StoreKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatline=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    // `chatline token <username> [hours]` mints a bearer token for local use.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("token") {
        let username = args
            .get(2)
            .ok_or_else(|| anyhow::anyhow!("usage: chatline token <username> [hours]"))?;
        let hours: i64 = args.get(3).map(|h| h.parse::<i64>()).transpose()?.unwrap_or(24);
        println!(
            "{}",
            create_token(&config.jwt_secret, username, chrono::Duration::hours(hours))?
        );
        return Ok(());
    }

    // Init store
    let store: Arc<dyn Store> = match config.store {
        StoreKind::Sqlite => Arc::new(Database::open(
            &config.db_path,
            config.tables.schemas(),
            config.page_size,
        )?),
        StoreKind::Memory => Arc::new(MemoryStore::new(config.tables.schemas(), config.page_size)),
    };

    let state = Arc::new(AppStateInner {
        service: ChatService::new(store, config.tables.clone()),
        jwt_secret: config.jwt_secret.clone(),
    });

    // CORS: a single trusted origin when configured, otherwise permissive for local dev
    let cors = match &config.allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(HeaderValue::from_str(origin)?))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        None => CorsLayer::permissive(),
    };

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Chatline server listening on {}", addr);
    info!("Store: {:?}, page size {}", config.store, config.page_size);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(_) => {
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

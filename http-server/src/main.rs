use axum::{
    Router,
    routing::{any, get, post},
};
use orderdesk::client::HttpExchangeClient;
use orderdesk::config::DeskConfig;
use orderdesk::session::{SessionHandle, start_session};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

mod routes;
mod websocket;

use routes::book::{click_price_level, dismiss_book_error, get_orderbook};
use routes::markets::{get_markets, select_market};
use routes::orders::{dismiss_notification, edit_field, get_session, set_side, submit_order};
use websocket::websocket_handler;

// Application state: one dashboard session plus the configuration it runs with
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub config: Arc<DeskConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/markets", get(get_markets))
        .route("/markets/select", post(select_market))
        .route("/session", get(get_session))
        .route("/orderbook", get(get_orderbook))
        .route("/orderbook/click", post(click_price_level))
        .route("/orderbook/dismiss", post(dismiss_book_error))
        .route("/order/side", post(set_side))
        .route("/order/field", post(edit_field))
        .route("/order/submit", post(submit_order))
        .route("/order/dismiss", post(dismiss_notification))
        .route("/notifications", any(websocket_handler))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(DeskConfig::from_env()?);
    tracing::info!(
        upstream = %config.upstream_url,
        assets = ?config.assets,
        prefill_policy = %config.prefill_policy,
        "Configuration loaded"
    );

    let client = Arc::new(HttpExchangeClient::new(
        config.upstream_url.clone(),
        config.request_timeout(),
    )?);
    let session = start_session(&config, client.clone(), client);

    let state = AppState {
        session: session.clone(),
        config: config.clone(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("Dashboard server running on http://{}", config.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(session))
        .await?;

    Ok(())
}

// Resolves on Ctrl-C after tearing the session down
async fn shutdown_signal(session: SessionHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown requested, stopping session");
    if let Err(e) = session.shutdown().await {
        tracing::warn!("Session already stopped: {}", e);
    }
}

// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// Root endpoint
async fn root() -> &'static str {
    "Order Desk API - GET /session for the dashboard view, POST /order/field and /order/submit to enter orders, POST /orderbook/click to prefill, WebSocket /notifications for results"
}

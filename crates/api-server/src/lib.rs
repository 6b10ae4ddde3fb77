//! HTTP surface for the signal engine: single-ticker analysis and the
//! ranked dashboard scan.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use market_data::{MarketDataGateway, YahooFinanceProvider};
use screener::Screener;
use serde_json::json;
use signal_core::SignalError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Server configuration from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Comma-separated ticker list overriding the default universe.
    pub universe: Option<Vec<String>>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind = std::env::var("QUANTPULSE_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("QUANTPULSE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);
        let universe = std::env::var("QUANTPULSE_UNIVERSE").ok().map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });
        Self {
            bind,
            port,
            universe,
        }
    }
}

pub struct AppState {
    pub screener: Screener,
}

/// Error type for handlers. Data gaps map to client-visible statuses, not
/// server errors.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<SignalError> for ApiError {
    fn from(e: SignalError) -> Self {
        match e {
            SignalError::DataUnavailable(ticker) => {
                ApiError::NotFound(format!("No data found for {ticker}"))
            }
            SignalError::InsufficientHistory { got, need } => ApiError::BadRequest(format!(
                "Not enough data for technical analysis ({got} bars, need {need})"
            )),
            SignalError::Provider(msg) | SignalError::Analysis(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, axum::Json(json!({ "detail": detail }))).into_response()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    let provider = Arc::new(YahooFinanceProvider::new()?);
    let gateway = Arc::new(MarketDataGateway::new(provider));
    let mut screener = Screener::new(gateway);
    if let Some(universe) = config.universe.clone() {
        screener = screener.with_universe(universe);
    }

    let state = Arc::new(AppState { screener });
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    tracing::info!("QuantPulse API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install ctrl-c handler: {}", e);
    }
}

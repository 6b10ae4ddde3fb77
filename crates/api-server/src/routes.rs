use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{ApiError, AppState};

/// Keywords blended with the ticker for the single-ticker news fetch.
const ANALYZE_NEWS_KEYWORDS: &[&str] = &["NSE Stock Market India", "Global Economy", "Geopolitics"];

const DASHBOARD_TOP_PICKS: usize = 5;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/analyze/:ticker", get(analyze))
        .route("/dashboard", get(dashboard))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "QuantPulse signal API is running" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Default bare symbols to the NSE.
fn normalize_ticker(raw: &str) -> String {
    let ticker = raw.trim().to_uppercase();
    if ticker.ends_with(".NS") || ticker.ends_with(".BO") {
        ticker
    } else {
        format!("{ticker}.NS")
    }
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let ticker = normalize_ticker(&ticker);

    let mut keywords: Vec<String> = ANALYZE_NEWS_KEYWORDS.iter().map(|k| k.to_string()).collect();
    keywords.push(ticker.clone());

    let gateway = state.screener.gateway();
    let global_news = gateway.fetch_global_news(&keywords, false).await;

    let pick = screener::analyze_ticker(gateway, &ticker, &global_news, false).await?;

    Ok(Json(json!({
        "ticker": pick.ticker,
        "signal": pick.signal.category,
        "triggers": pick.signal.triggers,
        "probability": round4(pick.signal.probability),
        "sentiment": round4(pick.signal.sentiment_score),
        "latest_price": round2(pick.price),
        "buy_above": round2(pick.buy_above),
        "target_price": round2(pick.target_price),
        "stop_loss": round2(pick.stop_loss),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "method": "AI Hybrid",
    })))
}

#[derive(Debug, Deserialize)]
struct DashboardParams {
    #[serde(default)]
    refresh: bool,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Json<Value> {
    let report = state.screener.scan_universe(params.refresh).await;
    let count = report.results.len();
    let top_picks: Vec<_> = report
        .results
        .iter()
        .take(DASHBOARD_TOP_PICKS)
        .cloned()
        .collect();

    Json(json!({
        "market_status": report.session.status_text,
        "is_open": report.session.is_open,
        "top_picks": top_picks,
        "results": report.results,
        "count": count,
        "total_scanned": report.total_scanned,
        "timestamp": report.scanned_at.to_rfc3339(),
    }))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ticker_defaults_to_nse() {
        assert_eq!(normalize_ticker("reliance"), "RELIANCE.NS");
        assert_eq!(normalize_ticker("TCS.NS"), "TCS.NS");
        assert_eq!(normalize_ticker("sensex.BO"), "SENSEX.BO");
        assert_eq!(normalize_ticker("  infy "), "INFY.NS");
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round2(101.456), 101.46);
        assert_eq!(round4(0.65004), 0.65);
    }
}

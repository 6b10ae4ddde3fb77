use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signal_core::{PricePoint, SignalResult};

/// Whether the market is currently trading, with a human-readable status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSession {
    pub is_open: bool,
    pub status_text: String,
}

/// One ticker's analysis with derived trade-plan fields. Recomputed on
/// every scan, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerPick {
    pub ticker: String,
    #[serde(flatten)]
    pub signal: SignalResult,
    pub price: f64,
    pub buy_above: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub trend_7d_pct: f64,
    pub opportunity_score: f64,
    pub news_sample: Vec<String>,
    pub recent_history: Vec<PricePoint>,
}

/// Ranked scan output. The full list is returned; callers truncate.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub session: MarketSession,
    pub results: Vec<ScreenerPick>,
    pub total_scanned: usize,
    pub scanned_at: DateTime<Utc>,
}

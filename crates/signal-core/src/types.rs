use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A chronologically ordered series of daily bars.
///
/// Invariant: strictly increasing dates. Gateways hand out owned copies;
/// callers never mutate a series they did not clone first.
pub type PriceSeries = Vec<Bar>;

/// A bar augmented with indicator columns and the next-bar-direction label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub bar: Bar,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    /// 1 if the close rises on the next bar, else 0.
    pub target: u8,
}

/// Result of feature building.
///
/// A series shorter than the indicator look-back cannot carry indicator
/// columns, so the raw input is handed back untouched and callers must
/// check the variant rather than probe for columns that may not exist.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureFrame {
    /// Input had too few bars for indicators; returned unchanged.
    RawOnly(PriceSeries),
    /// Indicator-augmented rows, chronological, incomplete rows dropped.
    Enriched(Vec<FeatureRow>),
}

impl FeatureFrame {
    /// Feature rows, or an empty slice for the raw-only case.
    pub fn rows(&self) -> &[FeatureRow] {
        match self {
            FeatureFrame::RawOnly(_) => &[],
            FeatureFrame::Enriched(rows) => rows,
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self, FeatureFrame::Enriched(_))
    }
}

/// Categorical trade recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalCategory {
    Buy,
    Hold,
    Sell,
}

/// Buy above 0.65, sell below 0.35, hold in between. Both inequalities
/// are strict: 0.65 and 0.35 exactly are holds.
pub const BUY_THRESHOLD: f64 = 0.65;
pub const SELL_THRESHOLD: f64 = 0.35;

impl SignalCategory {
    /// Map a combined probability to a category.
    pub fn from_probability(probability: f64) -> Self {
        if probability > BUY_THRESHOLD {
            SignalCategory::Buy
        } else if probability < SELL_THRESHOLD {
            SignalCategory::Sell
        } else {
            SignalCategory::Hold
        }
    }
}

impl std::fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalCategory::Buy => write!(f, "BUY"),
            SignalCategory::Hold => write!(f, "HOLD"),
            SignalCategory::Sell => write!(f, "SELL"),
        }
    }
}

/// Fused trading signal with the component estimates it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalResult {
    /// Combined probability of an up move, clamped to [0, 1].
    pub probability: f64,
    pub category: SignalCategory,
    /// Human-readable rule conditions that fired, in evaluation order.
    pub triggers: Vec<String>,
    pub ai_probability: f64,
    pub rule_probability: f64,
    pub sentiment_score: f64,
}

impl SignalResult {
    /// The neutral result returned when there is too little history to
    /// train or evaluate on.
    pub fn neutral(sentiment_score: f64) -> Self {
        Self {
            probability: 0.5,
            category: SignalCategory::Hold,
            triggers: Vec::new(),
            ai_probability: 0.5,
            rule_probability: 0.5,
            sentiment_score,
        }
    }
}

/// A single point of a chart-friendly price history snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

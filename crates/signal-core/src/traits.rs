use async_trait::async_trait;

use crate::error::SignalError;
use crate::types::PriceSeries;

/// Opaque upstream market-data source.
///
/// The gateway owns all caching and failure containment; implementations
/// just fetch and translate errors into `SignalError::Provider`.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Historical daily bars for `ticker` over `period` (e.g. "2y").
    async fn fetch_history_raw(&self, ticker: &str, period: &str)
        -> Result<PriceSeries, SignalError>;

    /// Most recent traded price from a short fine-grained window.
    async fn fetch_live_price_raw(&self, ticker: &str) -> Result<f64, SignalError>;

    /// Headlines matching a free-text keyword.
    async fn fetch_news_raw(&self, keyword: &str) -> Result<Vec<String>, SignalError>;

    /// Headlines specific to a ticker symbol.
    async fn fetch_ticker_news_raw(&self, ticker: &str) -> Result<Vec<String>, SignalError>;
}

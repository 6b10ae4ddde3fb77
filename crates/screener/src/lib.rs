//! Concurrent market screener: fans per-ticker analysis across a bounded
//! worker set and aggregates into an opportunity-ranked report.

pub mod analyze;
pub mod models;
pub mod session;

pub use analyze::analyze_ticker;
pub use models::{MarketSession, ScanReport, ScreenerPick};
pub use session::market_session;

use std::sync::Arc;

use market_data::MarketDataGateway;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Upper bound on in-flight ticker analyses, independent of universe
/// size. Caps peak concurrent requests to the upstream providers.
const MAX_CONCURRENT_ANALYSES: usize = 15;

/// Keywords for the scan-wide news snapshot, fetched once per scan.
const GLOBAL_NEWS_KEYWORDS: &[&str] = &["Indian Stock Market", "Indian Economy", "Geopolitics"];

/// NSE large caps scanned when no universe is configured.
pub const DEFAULT_UNIVERSE: &[&str] = &[
    "RELIANCE.NS", "TCS.NS", "HDFCBANK.NS", "BHARTIARTL.NS", "ICICIBANK.NS",
    "INFY.NS", "SBIN.NS", "LICI.NS", "HINDUNILVR.NS", "ITC.NS",
    "LT.NS", "AXISBANK.NS", "KOTAKBANK.NS", "SUNPHARMA.NS",
];

pub struct Screener {
    gateway: Arc<MarketDataGateway>,
    universe: Vec<String>,
}

impl Screener {
    pub fn new(gateway: Arc<MarketDataGateway>) -> Self {
        Self {
            gateway,
            universe: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_universe(mut self, universe: Vec<String>) -> Self {
        self.universe = universe;
        self
    }

    pub fn gateway(&self) -> &Arc<MarketDataGateway> {
        &self.gateway
    }

    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    /// Scan the configured universe.
    pub async fn scan_universe(&self, force: bool) -> ScanReport {
        let universe = self.universe.clone();
        self.scan(&universe, force).await
    }

    /// Analyze `tickers` concurrently and rank by opportunity score.
    ///
    /// Global news is fetched once and shared read-only with every task.
    /// A failed ticker is logged and excluded; the scan always completes
    /// with whatever analyzed cleanly. Ties in the ranking keep original
    /// submission order.
    pub async fn scan(&self, tickers: &[String], force: bool) -> ScanReport {
        let session = session::market_session();

        let keywords: Vec<String> = GLOBAL_NEWS_KEYWORDS.iter().map(|k| k.to_string()).collect();
        let global_news = Arc::new(self.gateway.fetch_global_news(&keywords, force).await);

        tracing::info!("Scanning {} tickers (force={})", tickers.len(), force);

        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_ANALYSES));
        let mut tasks = JoinSet::new();
        for (position, ticker) in tickers.iter().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let global_news = Arc::clone(&global_news);
            let semaphore = Arc::clone(&semaphore);
            let ticker = ticker.clone();
            tasks.spawn(async move {
                // Closed only if the semaphore is dropped, which it never is.
                let _permit = semaphore.acquire_owned().await.expect("semaphore open");
                let result = analyze_ticker(&gateway, &ticker, &global_news, force).await;
                (position, ticker, result)
            });
        }

        // Scatter-gather barrier: every task completes or fails before
        // ranking.
        let mut ranked: Vec<(usize, ScreenerPick)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, _ticker, Ok(pick))) => ranked.push((position, pick)),
                Ok((_, ticker, Err(e))) => {
                    tracing::warn!("Excluding {} from scan: {}", ticker, e);
                }
                Err(e) => {
                    tracing::error!("Analysis task panicked: {}", e);
                }
            }
        }

        ranked.sort_by(|(a_pos, a), (b_pos, b)| {
            b.opportunity_score
                .partial_cmp(&a.opportunity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a_pos.cmp(b_pos))
        });

        ScanReport {
            session,
            total_scanned: tickers.len(),
            results: ranked.into_iter().map(|(_, pick)| pick).collect(),
            scanned_at: chrono::Utc::now(),
        }
    }
}

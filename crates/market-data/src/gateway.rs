use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use signal_core::{MarketDataProvider, PriceSeries, SignalError};

use crate::cache::{CachePolicy, TimeSeriesCache};

/// Historical bars stay valid for an hour; refetches for one ticker are
/// floored at a minute so forced dashboard refreshes cannot hammer the
/// upstream.
const HISTORY_EXPIRY_MINS: i64 = 60;
const HISTORY_MIN_INTERVAL_SECS: i64 = 60;

/// Global news is expensive to aggregate and changes slowly; the 5-minute
/// floor applies even to forced refreshes.
const NEWS_EXPIRY_MINS: i64 = 60;
const NEWS_MIN_INTERVAL_MINS: i64 = 5;

const HISTORY_PERIOD: &str = "2y";

/// Mediates all access to the upstream market-data source.
///
/// Owns one cache per namespace (history, news). Failures are contained
/// here: callers see empty series/headline lists, never provider errors.
pub struct MarketDataGateway {
    provider: Arc<dyn MarketDataProvider>,
    stock_cache: TimeSeriesCache<PriceSeries>,
    news_cache: TimeSeriesCache<Vec<String>>,
}

impl MarketDataGateway {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            stock_cache: TimeSeriesCache::new(CachePolicy::new(
                Duration::minutes(HISTORY_EXPIRY_MINS),
                Duration::seconds(HISTORY_MIN_INTERVAL_SECS),
            )),
            news_cache: TimeSeriesCache::new(CachePolicy::new(
                Duration::minutes(NEWS_EXPIRY_MINS),
                Duration::minutes(NEWS_MIN_INTERVAL_MINS),
            )),
        }
    }

    /// Historical daily bars for `ticker`, via the stock cache.
    ///
    /// When `force` is set, or the cached history has outlived its expiry
    /// window, the most recent bar's close is overwritten with the latest
    /// observed price on a private copy. The cached entry keeps its own
    /// timestamp; live-patch freshness is decoupled from history freshness.
    ///
    /// A failed history fetch yields an empty series (downstream reads that
    /// as "insufficient data"). A failed live patch is logged and the
    /// unpatched history returned.
    pub async fn fetch_history(&self, ticker: &str, force: bool) -> PriceSeries {
        let stale = self
            .stock_cache
            .age(ticker)
            .map_or(false, |age| age >= Duration::minutes(HISTORY_EXPIRY_MINS));

        let provider = Arc::clone(&self.provider);
        let symbol = ticker.to_string();
        let history = match self
            .stock_cache
            .get_or_fetch(ticker, force, move || async move {
                let series = provider.fetch_history_raw(&symbol, HISTORY_PERIOD).await?;
                if series.is_empty() {
                    return Err(SignalError::DataUnavailable(symbol));
                }
                Ok(series)
            })
            .await
        {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!("History fetch failed for {}: {}", ticker, e);
                return PriceSeries::new();
            }
        };

        if force || stale {
            return self.patch_live_price(ticker, history).await;
        }
        history
    }

    /// Overwrite the latest bar's close with the live price. Non-fatal on
    /// failure.
    async fn patch_live_price(&self, ticker: &str, mut history: PriceSeries) -> PriceSeries {
        match self.provider.fetch_live_price_raw(ticker).await {
            Ok(price) => {
                if let Some(last) = history.last_mut() {
                    last.close = price;
                }
            }
            Err(e) => {
                tracing::warn!("Live price patch failed for {}: {}", ticker, e);
            }
        }
        history
    }

    /// Ticker-specific headlines, always fetched fresh. Recency matters
    /// more than rate-limit risk at single-ticker granularity.
    pub async fn fetch_ticker_news(&self, ticker: &str) -> Vec<String> {
        match self.provider.fetch_ticker_news_raw(ticker).await {
            Ok(headlines) => headlines,
            Err(e) => {
                tracing::warn!("Ticker news fetch failed for {}: {}", ticker, e);
                Vec::new()
            }
        }
    }

    /// Aggregate headlines for a keyword set, via the news cache.
    ///
    /// Keywords are deduplicated and sorted into an order-independent
    /// cache key. Headlines are deduplicated with set semantics, so output
    /// order is not guaranteed.
    pub async fn fetch_global_news(&self, keywords: &[String], force: bool) -> Vec<String> {
        let mut keys: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        keys.sort();
        if keys.is_empty() {
            return Vec::new();
        }
        let cache_key = keys.join("|");

        let provider = Arc::clone(&self.provider);
        match self
            .news_cache
            .get_or_fetch(&cache_key, force, move || async move {
                let mut seen = HashSet::new();
                for key in &keys {
                    for headline in provider.fetch_news_raw(key).await? {
                        seen.insert(headline);
                    }
                }
                Ok(seen.into_iter().collect())
            })
            .await
        {
            Ok(headlines) => headlines,
            Err(e) => {
                tracing::warn!("Global news fetch failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use signal_core::Bar;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        bars: usize,
        fail_history: bool,
        fail_live: bool,
        history_fetches: AtomicUsize,
        news_fetches: AtomicUsize,
    }

    impl MockProvider {
        fn new(bars: usize) -> Self {
            Self {
                bars,
                fail_history: false,
                fail_live: false,
                history_fetches: AtomicUsize::new(0),
                news_fetches: AtomicUsize::new(0),
            }
        }

        fn sample_series(&self) -> PriceSeries {
            (0..self.bars)
                .map(|i| Bar {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                        + chrono::Duration::days(i as i64),
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.0 + i as f64,
                    volume: 1_000_000.0,
                })
                .collect()
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        async fn fetch_history_raw(
            &self,
            ticker: &str,
            _period: &str,
        ) -> Result<PriceSeries, SignalError> {
            self.history_fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_history {
                return Err(SignalError::Provider(format!("down: {ticker}")));
            }
            Ok(self.sample_series())
        }

        async fn fetch_live_price_raw(&self, _ticker: &str) -> Result<f64, SignalError> {
            if self.fail_live {
                return Err(SignalError::Provider("live down".into()));
            }
            Ok(999.5)
        }

        async fn fetch_news_raw(&self, keyword: &str) -> Result<Vec<String>, SignalError> {
            self.news_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                format!("{keyword} rally continues"),
                "Markets steady".to_string(),
            ])
        }

        async fn fetch_ticker_news_raw(&self, ticker: &str) -> Result<Vec<String>, SignalError> {
            Ok(vec![format!("{ticker} beats estimates")])
        }
    }

    #[tokio::test]
    async fn test_history_cached_between_calls() {
        let provider = Arc::new(MockProvider::new(10));
        let gateway = MarketDataGateway::new(Arc::clone(&provider) as Arc<dyn MarketDataProvider>);

        let first = gateway.fetch_history("TCS.NS", false).await;
        let second = gateway.fetch_history("TCS.NS", false).await;

        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
        assert_eq!(provider.history_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_history_failure_yields_empty_series() {
        let mut mock = MockProvider::new(10);
        mock.fail_history = true;
        let gateway = MarketDataGateway::new(Arc::new(mock) as Arc<dyn MarketDataProvider>);

        let series = gateway.fetch_history("BAD.NS", false).await;
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_force_patches_latest_close() {
        let provider = Arc::new(MockProvider::new(10));
        let gateway = MarketDataGateway::new(Arc::clone(&provider) as Arc<dyn MarketDataProvider>);

        let series = gateway.fetch_history("INFY.NS", true).await;
        assert_eq!(series.last().unwrap().close, 999.5);

        // The cached entry keeps the unpatched close.
        let cached = gateway.fetch_history("INFY.NS", false).await;
        assert_eq!(cached.last().unwrap().close, 109.0);
    }

    #[tokio::test]
    async fn test_failed_live_patch_is_non_fatal() {
        let mut mock = MockProvider::new(10);
        mock.fail_live = true;
        let gateway = MarketDataGateway::new(Arc::new(mock) as Arc<dyn MarketDataProvider>);

        let series = gateway.fetch_history("SBIN.NS", true).await;
        assert_eq!(series.len(), 10);
        assert_eq!(series.last().unwrap().close, 109.0);
    }

    #[tokio::test]
    async fn test_global_news_key_is_order_independent() {
        let provider = Arc::new(MockProvider::new(0));
        let gateway = MarketDataGateway::new(Arc::clone(&provider) as Arc<dyn MarketDataProvider>);

        let a = vec!["economy".to_string(), "markets".to_string()];
        let b = vec!["markets".to_string(), "economy".to_string()];

        let first = gateway.fetch_global_news(&a, false).await;
        let second = gateway.fetch_global_news(&b, false).await;

        // Same key: second call is served from cache.
        assert_eq!(provider.news_fetches.load(Ordering::SeqCst), 2);

        let mut first_sorted = first.clone();
        let mut second_sorted = second.clone();
        first_sorted.sort();
        second_sorted.sort();
        assert_eq!(first_sorted, second_sorted);
    }

    #[tokio::test]
    async fn test_global_news_deduplicates_headlines() {
        let provider = Arc::new(MockProvider::new(0));
        let gateway = MarketDataGateway::new(Arc::clone(&provider) as Arc<dyn MarketDataProvider>);

        // "Markets steady" appears for every keyword; set semantics keep one.
        let headlines = gateway
            .fetch_global_news(&["economy".to_string(), "markets".to_string()], false)
            .await;
        let steady = headlines.iter().filter(|h| *h == "Markets steady").count();
        assert_eq!(steady, 1);
        assert_eq!(headlines.len(), 3);
    }
}

//! Yahoo Finance provider: chart API for bars, search API for headlines.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use signal_core::{Bar, MarketDataProvider, PriceSeries, SignalError};
use std::time::Duration;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const NEWS_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNewsItem>,
}

#[derive(Debug, Deserialize)]
struct SearchNewsItem {
    title: String,
}

/// Unofficial Yahoo Finance client. No API key; a desktop user-agent and a
/// hard request timeout keep slow upstream calls from stalling a scan.
pub struct YahooFinanceProvider {
    client: Client,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, SignalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SignalError::Provider(e.to_string()))?;
        Ok(Self { client })
    }

    async fn get_chart(&self, ticker: &str, range: &str, interval: &str)
        -> Result<ChartResult, SignalError>
    {
        let url = format!(
            "{CHART_URL}/{}?range={range}&interval={interval}&includePrePost=false",
            ticker.to_uppercase()
        );
        tracing::debug!("Fetching chart: {}", url);

        let response: ChartResponse = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SignalError::Provider(e.to_string()))?
            .json()
            .await
            .map_err(|e| SignalError::Provider(e.to_string()))?;

        if let Some(err) = response.chart.error {
            return Err(SignalError::Provider(format!(
                "{}: {}",
                err.code, err.description
            )));
        }

        response
            .chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .ok_or_else(|| SignalError::DataUnavailable(ticker.to_string()))
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>, SignalError> {
        let news_count = NEWS_COUNT.to_string();
        let response: SearchResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", query),
                ("newsCount", news_count.as_str()),
                ("quotesCount", "0"),
            ])
            .send()
            .await
            .map_err(|e| SignalError::Provider(e.to_string()))?
            .json()
            .await
            .map_err(|e| SignalError::Provider(e.to_string()))?;

        Ok(response.news.into_iter().map(|n| n.title).collect())
    }
}

fn bars_from_chart(result: ChartResult) -> PriceSeries {
    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return PriceSeries::new();
    };

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut bars = PriceSeries::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        // Yahoo pads thinly traded days with nulls; skip incomplete rows.
        let (Some(&Some(open)), Some(&Some(high)), Some(&Some(low)), Some(&Some(close))) = (
            opens.get(i),
            highs.get(i),
            lows.get(i),
            closes.get(i),
        ) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        // One bar per date; intraday rows collapse onto the last seen.
        if bars.last().map(|b: &Bar| b.date) == Some(date) {
            bars.pop();
        }
        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume: volumes.get(i).copied().flatten().unwrap_or(0.0),
        });
    }
    bars
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    async fn fetch_history_raw(&self, ticker: &str, period: &str)
        -> Result<PriceSeries, SignalError>
    {
        let result = self.get_chart(ticker, period, "1d").await?;
        Ok(bars_from_chart(result))
    }

    async fn fetch_live_price_raw(&self, ticker: &str) -> Result<f64, SignalError> {
        let result = self.get_chart(ticker, "1d", "5m").await?;
        if let Some(price) = result.meta.regular_market_price {
            return Ok(price);
        }
        bars_from_chart(result)
            .last()
            .map(|bar| bar.close)
            .ok_or_else(|| SignalError::DataUnavailable(ticker.to_string()))
    }

    async fn fetch_news_raw(&self, keyword: &str) -> Result<Vec<String>, SignalError> {
        self.search_titles(keyword).await
    }

    async fn fetch_ticker_news_raw(&self, ticker: &str) -> Result<Vec<String>, SignalError> {
        self.search_titles(ticker).await
    }
}

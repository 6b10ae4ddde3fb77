//! Single-ticker analysis pipeline: data → features → sentiment → fusion
//! → trade plan.

use market_data::MarketDataGateway;
use signal_core::{PricePoint, PriceSeries, SignalCategory, SignalError};
use signal_fusion::{calculate_signal, MIN_ROWS_FOR_SIGNAL};
use technical_analysis::{build_features, MIN_BARS_FOR_INDICATORS};

use crate::models::ScreenerPick;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const VOLUME_WINDOW: usize = 20;
const HISTORY_SNIPPET_BARS: usize = 30;
const TICKER_NEWS_SAMPLE: usize = 2;

/// Analyze one ticker against a shared global-news snapshot.
///
/// Ticker headlines are weighted double in the sentiment blend. Errors
/// distinguish "provider had nothing" from "series too short" so the HTTP
/// layer can map them to different responses.
pub async fn analyze_ticker(
    gateway: &MarketDataGateway,
    ticker: &str,
    global_news: &[String],
    force: bool,
) -> Result<ScreenerPick, SignalError> {
    let history = gateway.fetch_history(ticker, force).await;
    if history.is_empty() {
        return Err(SignalError::DataUnavailable(ticker.to_string()));
    }

    let frame = build_features(&history);
    if !frame.is_enriched() {
        return Err(SignalError::InsufficientHistory {
            got: history.len(),
            need: MIN_BARS_FOR_INDICATORS,
        });
    }
    let rows = frame.rows();
    if rows.is_empty() {
        return Err(SignalError::InsufficientHistory {
            got: history.len(),
            need: MIN_ROWS_FOR_SIGNAL,
        });
    }

    let ticker_news = gateway.fetch_ticker_news(ticker).await;

    // Ticker headlines count twice against the shared global snapshot.
    let mut blended = Vec::with_capacity(ticker_news.len() * 2 + global_news.len());
    blended.extend_from_slice(&ticker_news);
    blended.extend_from_slice(&ticker_news);
    blended.extend_from_slice(global_news);
    let sentiment = sentiment_analysis::score_headlines(&blended);

    let signal = calculate_signal(rows, sentiment);

    let price = history.last().map(|b| b.close).unwrap_or_default();
    let volatility = annualized_volatility(&history);
    let (target_price, stop_loss) = trade_levels(price, volatility, signal.category);
    let opportunity_score = opportunity_score(
        signal.probability,
        signal.sentiment_score,
        relative_volume(&history),
    );

    Ok(ScreenerPick {
        ticker: ticker.to_string(),
        buy_above: entry_level(price, signal.category),
        target_price,
        stop_loss,
        trend_7d_pct: trend_7d_pct(&history),
        opportunity_score,
        news_sample: news_sample(&ticker_news, global_news),
        recent_history: history
            .iter()
            .rev()
            .take(HISTORY_SNIPPET_BARS)
            .rev()
            .map(|bar| PricePoint {
                date: bar.date,
                price: bar.close,
            })
            .collect(),
        signal,
        price,
    })
}

/// Entry price: slightly above market for longs, below for shorts.
pub fn entry_level(price: f64, category: SignalCategory) -> f64 {
    match category {
        SignalCategory::Sell => price * 0.995,
        _ => price * 1.005,
    }
}

/// Stdev of daily returns, annualized over 252 trading days.
pub fn annualized_volatility(series: &PriceSeries) -> f64 {
    let returns: Vec<f64> = series
        .windows(2)
        .filter(|w| w[0].close != 0.0)
        .map(|w| (w[1].close - w[0].close) / w[0].close)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Target and stop around the current price, scaled by volatility. Signs
/// flip for shorts: target below entry, stop above.
pub fn trade_levels(price: f64, volatility: f64, category: SignalCategory) -> (f64, f64) {
    match category {
        SignalCategory::Sell => (
            price * (1.0 - volatility * 0.1),
            price * (1.0 + volatility * 0.05),
        ),
        _ => (
            price * (1.0 + volatility * 0.1),
            price * (1.0 - volatility * 0.05),
        ),
    }
}

/// Percent move of the close over the trailing 7 bars; 0 when the series
/// is shorter.
pub fn trend_7d_pct(series: &PriceSeries) -> f64 {
    if series.len() < 7 {
        return 0.0;
    }
    let latest = series[series.len() - 1].close;
    let week_ago = series[series.len() - 7].close;
    if week_ago == 0.0 {
        return 0.0;
    }
    (latest / week_ago - 1.0) * 100.0
}

/// Latest volume over its trailing 20-bar mean (window includes the
/// latest bar). 1.0 when undefined.
pub fn relative_volume(series: &PriceSeries) -> f64 {
    let window_start = series.len().saturating_sub(VOLUME_WINDOW);
    let window = &series[window_start..];
    if window.is_empty() {
        return 1.0;
    }
    let mean = window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64;
    if mean == 0.0 {
        return 1.0;
    }
    series.last().map_or(1.0, |b| b.volume) / mean
}

/// Composite ranking metric: signal probability, positive sentiment, and
/// volume surge. The volume term saturates at a 2x surge.
pub fn opportunity_score(probability: f64, sentiment: f64, relative_volume: f64) -> f64 {
    probability * 0.6
        + sentiment.max(0.0) * 0.2
        + (relative_volume - 1.0).clamp(0.0, 1.0) * 0.2
}

fn news_sample(ticker_news: &[String], global_news: &[String]) -> Vec<String> {
    let mut sample: Vec<String> = ticker_news
        .iter()
        .take(TICKER_NEWS_SAMPLE)
        .cloned()
        .collect();
    if let Some(headline) = global_news.first() {
        sample.push(headline.clone());
    }
    if sample.is_empty() {
        sample.push("No major headlines".to_string());
    }
    sample
}

use signal_core::{FeatureFrame, FeatureRow, PriceSeries};

use crate::indicators::{macd, rsi, sma};

/// Below this many bars no indicator column is reliable; the raw series is
/// handed back and the caller decides how to degrade.
pub const MIN_BARS_FOR_INDICATORS: usize = 30;

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const SMA_SHORT: usize = 20;
const SMA_LONG: usize = 50;

/// Augment a price series with RSI(14), MACD(12,26,9) + signal, SMA(20),
/// SMA(50) and the next-bar-direction label.
///
/// Rows missing any indicator (look-back still filling) are dropped, as is
/// the final row whose label is undefined. Chronological order is
/// preserved.
pub fn build_features(series: &PriceSeries) -> FeatureFrame {
    if series.len() < MIN_BARS_FOR_INDICATORS {
        return FeatureFrame::RawOnly(series.clone());
    }

    let closes: Vec<f64> = series.iter().map(|bar| bar.close).collect();
    let rsi_col = rsi(&closes, RSI_PERIOD);
    let macd_out = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let sma_20_col = sma(&closes, SMA_SHORT);
    let sma_50_col = sma(&closes, SMA_LONG);

    let mut rows = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        // Label needs the next bar; the final row has none.
        let Some(next_close) = closes.get(i + 1) else {
            break;
        };
        let (Some(rsi), Some(macd), Some(macd_signal), Some(sma_20), Some(sma_50)) = (
            rsi_col[i],
            macd_out.macd[i],
            macd_out.signal[i],
            sma_20_col[i],
            sma_50_col[i],
        ) else {
            continue;
        };
        rows.push(FeatureRow {
            bar: series[i].clone(),
            rsi,
            macd,
            macd_signal,
            sma_20,
            sma_50,
            target: u8::from(*next_close > closes[i]),
        });
    }
    FeatureFrame::Enriched(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use signal_core::Bar;

    fn sample_series(len: usize) -> PriceSeries {
        (0..len)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.2).sin() * 5.0 + i as f64 * 0.05;
                Bar {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                        + chrono::Duration::days(i as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000_000.0 + i as f64,
                }
            })
            .collect()
    }

    #[test]
    fn test_short_series_returned_unchanged() {
        let series = sample_series(29);
        match build_features(&series) {
            FeatureFrame::RawOnly(raw) => assert_eq!(raw, series),
            FeatureFrame::Enriched(_) => panic!("expected RawOnly for 29 bars"),
        }
    }

    #[test]
    fn test_enriched_rows_drop_lookback_and_final_row() {
        let series = sample_series(120);
        let frame = build_features(&series);
        let rows = frame.rows();

        // SMA(50) defines the longest look-back; last row dropped for the
        // undefined label.
        assert_eq!(rows.len(), 120 - (SMA_LONG - 1) - 1);
        assert_eq!(rows[0].bar.date, series[SMA_LONG - 1].date);
        assert_eq!(rows.last().unwrap().bar.date, series[118].date);
    }

    #[test]
    fn test_rows_are_chronological() {
        let series = sample_series(80);
        let rows_frame = build_features(&series);
        let rows = rows_frame.rows();
        assert!(rows.windows(2).all(|w| w[0].bar.date < w[1].bar.date));
    }

    #[test]
    fn test_target_label_matches_next_close() {
        let series = sample_series(80);
        let frame = build_features(&series);

        for row in frame.rows() {
            let idx = series.iter().position(|b| b.date == row.bar.date).unwrap();
            let expected = u8::from(series[idx + 1].close > series[idx].close);
            assert_eq!(row.target, expected);
        }
    }

    #[test]
    fn test_exactly_30_bars_is_enriched() {
        let series = sample_series(30);
        let frame = build_features(&series);
        assert!(frame.is_enriched());
        // Not enough bars for SMA(50): every row is dropped, but the shape
        // is still the enriched variant.
        assert!(frame.rows().is_empty());
    }
}

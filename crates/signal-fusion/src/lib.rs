//! Hybrid signal fusion: seeded random-forest direction estimate,
//! rule-based indicator score, and news sentiment blended with fixed
//! weights into one probability and category.

pub mod forest;
pub mod rules;

use signal_core::{FeatureRow, SignalCategory, SignalResult};

use forest::{Dataset, ForestConfig, RandomForest};
use rules::evaluate_rules;

/// Fewer rows than this and the engine refuses to train, returning the
/// neutral result instead.
pub const MIN_ROWS_FOR_SIGNAL: usize = 50;

/// Chronological split: the earliest 90% of rows fit the classifier. No
/// shuffling; order is the point of a time series.
const TRAIN_FRACTION: f64 = 0.9;

/// Fusion weights and thresholds are contract constants, reproduced
/// exactly across runs.
const AI_WEIGHT: f64 = 0.5;
const RULE_WEIGHT: f64 = 0.3;
const SENTIMENT_WEIGHT: f64 = 0.2;

fn feature_vector(row: &FeatureRow) -> Vec<f64> {
    vec![
        row.rsi,
        row.macd,
        row.macd_signal,
        row.sma_20,
        row.sma_50,
        row.bar.open,
        row.bar.high,
        row.bar.low,
        row.bar.close,
        row.bar.volume,
    ]
}

/// Compute the fused signal for an indicator-augmented series.
///
/// With fewer than [`MIN_ROWS_FOR_SIGNAL`] rows the result is exactly
/// neutral: probability 0.5, HOLD, no triggers.
pub fn calculate_signal(rows: &[FeatureRow], sentiment: f64) -> SignalResult {
    if rows.len() < MIN_ROWS_FOR_SIGNAL {
        return SignalResult::neutral(sentiment);
    }

    let train_len = ((rows.len() as f64) * TRAIN_FRACTION) as usize;
    let dataset = Dataset {
        features: rows[..train_len].iter().map(feature_vector).collect(),
        labels: rows[..train_len].iter().map(|r| r.target).collect(),
    };

    let model = RandomForest::fit(&dataset, &ForestConfig::default());
    let Some(latest) = rows.last() else {
        return SignalResult::neutral(sentiment);
    };
    let ai_probability = model.predict_proba(&feature_vector(latest));

    let rule_outcome = evaluate_rules(latest);

    let combined = fuse(ai_probability, rule_outcome.probability, sentiment);

    SignalResult {
        probability: combined,
        category: SignalCategory::from_probability(combined),
        triggers: rule_outcome.triggers,
        ai_probability,
        rule_probability: rule_outcome.probability,
        sentiment_score: sentiment,
    }
}

/// Weighted blend of the three estimators, clamped to [0, 1].
pub fn fuse(ai_probability: f64, rule_probability: f64, sentiment: f64) -> f64 {
    (ai_probability * AI_WEIGHT + rule_probability * RULE_WEIGHT + sentiment * SENTIMENT_WEIGHT)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use signal_core::Bar;

    fn sample_rows(len: usize) -> Vec<FeatureRow> {
        (0..len)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.37).sin() * 4.0;
                FeatureRow {
                    bar: Bar {
                        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                            + chrono::Duration::days(i as i64),
                        open: close - 0.4,
                        high: close + 0.8,
                        low: close - 0.8,
                        close,
                        volume: 1_000_000.0 + (i as f64) * 100.0,
                    },
                    rsi: 50.0 + (i as f64 * 0.31).cos() * 20.0,
                    macd: (i as f64 * 0.23).sin(),
                    macd_signal: (i as f64 * 0.23 - 0.4).sin(),
                    sma_20: close - 0.5,
                    sma_50: close - 1.0,
                    target: u8::from((i as f64 * 0.37).cos() > 0.0),
                }
            })
            .collect()
    }

    #[test]
    fn test_below_minimum_rows_is_exactly_neutral() {
        for len in [0, 1, 49] {
            let result = calculate_signal(&sample_rows(len), 0.3);
            assert_eq!(result.probability, 0.5);
            assert_eq!(result.category, SignalCategory::Hold);
            assert!(result.triggers.is_empty());
            assert_eq!(result.ai_probability, 0.5);
            assert_eq!(result.rule_probability, 0.5);
            assert_eq!(result.sentiment_score, 0.3);
        }
    }

    #[test]
    fn test_signal_is_deterministic() {
        let rows = sample_rows(120);
        let a = calculate_signal(&rows, 0.1);
        let b = calculate_signal(&rows, 0.1);
        assert_eq!(a.probability, b.probability);
        assert_eq!(a.ai_probability, b.ai_probability);
        assert_eq!(a.category, b.category);
        assert_eq!(a.triggers, b.triggers);
    }

    #[test]
    fn test_fuse_weights() {
        let combined = fuse(0.8, 0.875, 0.5);
        assert!((combined - (0.8 * 0.5 + 0.875 * 0.3 + 0.5 * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_fuse_clamps() {
        assert_eq!(fuse(1.0, 1.0, 1.5), 1.0);
        assert_eq!(fuse(0.0, 0.0, -1.0), 0.0);
    }

    #[test]
    fn test_result_probability_in_bounds_and_consistent() {
        let rows = sample_rows(100);
        let result = calculate_signal(&rows, -0.8);
        assert!((0.0..=1.0).contains(&result.probability));
        assert_eq!(
            result.category,
            SignalCategory::from_probability(result.probability)
        );
        let expected = fuse(
            result.ai_probability,
            result.rule_probability,
            result.sentiment_score,
        );
        assert!((result.probability - expected).abs() < 1e-12);
    }

    #[test]
    fn test_triggers_always_include_a_macd_branch() {
        // MACD always fires one of its two branches on enriched rows.
        let rows = sample_rows(80);
        let result = calculate_signal(&rows, 0.0);
        assert!(result
            .triggers
            .iter()
            .any(|t| t.contains("crossover")));
    }
}

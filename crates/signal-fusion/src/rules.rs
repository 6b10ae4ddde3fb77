//! Rule-based estimator over the latest indicator row.

use signal_core::FeatureRow;

const RSI_WEIGHT: i32 = 2;
const MACD_WEIGHT: i32 = 2;

#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub score: i32,
    pub total_weight: i32,
    pub probability: f64,
    pub triggers: Vec<String>,
}

/// Score momentum/trend rules on the most recent row.
///
/// RSI branch runs before the MACD branch; each firing branch appends its
/// trigger in that order. The probability maps the accumulated score onto
/// [0, 1] around a 0.5 midpoint: `0.5 + score / (2 * total_weight)`.
pub fn evaluate_rules(latest: &FeatureRow) -> RuleOutcome {
    let mut score = 0;
    let mut total_weight = 0;
    let mut triggers = Vec::new();

    total_weight += RSI_WEIGHT;
    if latest.rsi < 30.0 {
        score += 2;
        triggers.push("RSI oversold (<30)".to_string());
    } else if latest.rsi > 70.0 {
        score -= 2;
        triggers.push("RSI overbought (>70)".to_string());
    } else if latest.rsi < 40.0 {
        score += 1;
    } else if latest.rsi > 60.0 {
        score -= 1;
    }

    total_weight += MACD_WEIGHT;
    if latest.macd > latest.macd_signal {
        score += 1;
        triggers.push("MACD bullish crossover".to_string());
    } else {
        score -= 1;
        triggers.push("MACD bearish crossover".to_string());
    }

    let probability = if total_weight > 0 {
        0.5 + f64::from(score) / f64::from(2 * total_weight)
    } else {
        0.5
    };

    RuleOutcome {
        score,
        total_weight,
        probability,
        triggers,
    }
}

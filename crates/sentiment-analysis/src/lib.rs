//! Lexicon-based headline sentiment.
//!
//! Pure text → polarity scoring. Each headline scores in [-1, 1] from
//! positive/negative word hits with a short negation window; a headline
//! set scores as the mean of its members.

use std::collections::HashSet;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "surge", "gain", "profit", "growth", "beat",
    "upgrade", "outperform", "strong", "positive", "rise", "increase",
    "breakthrough", "success", "exceed", "momentum", "buy", "recommend",
    "optimistic", "record", "advance", "dividend", "buyback", "upside",
    "recovery", "rebound", "expansion", "robust", "raised", "upgraded",
    "soar", "jump", "boom", "tailwind",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "loss", "fall", "plunge", "crash", "miss",
    "downgrade", "underperform", "weak", "negative", "drop", "decrease",
    "concern", "risk", "fail", "disappoint", "slump", "sell", "warning",
    "pessimistic", "retreat", "fear", "trouble", "lawsuit", "probe",
    "default", "bankruptcy", "layoff", "downside", "overvalued",
    "lowered", "suspended", "slide", "tumble", "headwind",
];

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't",
    "hardly", "barely", "neither", "nor", "without",
];

/// How many words back a negation flips polarity.
const NEGATION_WINDOW: usize = 3;

/// Polarity of a single text in [-1, 1]. 0.0 when no lexicon word matches.
pub fn score_headline(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':'))
        .filter(|w| !w.is_empty())
        .collect();

    let positive: HashSet<&str> = POSITIVE_WORDS.iter().copied().collect();
    let negative: HashSet<&str> = NEGATIVE_WORDS.iter().copied().collect();
    let negations: HashSet<&str> = NEGATION_WORDS.iter().copied().collect();

    let negation_positions: Vec<usize> = words
        .iter()
        .enumerate()
        .filter(|(_, w)| negations.contains(*w))
        .map(|(i, _)| i)
        .collect();

    let mut score: i32 = 0;
    let mut hits: u32 = 0;

    for (i, word) in words.iter().enumerate() {
        let polarity = if positive.contains(word) {
            1
        } else if negative.contains(word) {
            -1
        } else {
            continue;
        };
        hits += 1;

        let negated = negation_positions
            .iter()
            .any(|&pos| pos < i && i - pos <= NEGATION_WINDOW);
        score += if negated { -polarity } else { polarity };
    }

    if hits == 0 {
        return 0.0;
    }
    f64::from(score) / f64::from(hits)
}

/// Mean polarity over a headline list; 0.0 for an empty list.
pub fn score_headlines(headlines: &[String]) -> f64 {
    if headlines.is_empty() {
        return 0.0;
    }
    let total: f64 = headlines.iter().map(|h| score_headline(h)).sum();
    total / headlines.len() as f64
}

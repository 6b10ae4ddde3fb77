use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignalError {
    /// Provider returned nothing usable for this request.
    #[error("No data available: {0}")]
    DataUnavailable(String),

    /// A series exists but is too short for indicators or fusion.
    #[error("Insufficient history: got {got} bars, need {need}")]
    InsufficientHistory { got: usize, need: usize },

    /// Transient provider failure (network, rate limit, bad payload).
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Analysis error: {0}")]
    Analysis(String),
}

pub mod cache;
pub mod gateway;
pub mod yahoo;

pub use cache::{CachePolicy, TimeSeriesCache};
pub use gateway::MarketDataGateway;
pub use yahoo::YahooFinanceProvider;

pub mod cache;
pub mod dataset;
pub mod rate_limit;
pub mod region;
pub mod source;

pub use cache::TieredCache;
pub use dataset::MarketDataset;
pub use rate_limit::RateLimiter;
pub use region::RegionKey;
pub use source::{CachedIndicatorSource, HttpIndicatorSource, IndicatorSource, SourceConfig};

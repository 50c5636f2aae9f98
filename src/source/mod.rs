pub mod gmx;

use anyhow::Result;

use crate::market::MarketRecord;

/// Produces a fresh snapshot of every funding market each cycle. A snapshot fully replaces the
/// previous one, there is no merging.
pub trait MarketDataClient {
    fn fetch_market_snapshot(&self) -> Result<Vec<MarketRecord>>;
}

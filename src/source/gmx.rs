use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::market::MarketRecord;
use crate::source::MarketDataClient;

pub const ARBITRUM_MARKET_INFO_URL: &str = "https://arbitrum-api.gmxinfra.io/markets/info";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MarketsInfoResponse {
    pub markets: Vec<MarketRecord>,
}

/// Blocking client for the GMX market-info endpoint.
pub struct GmxMarketData {
    url: String,
}

impl GmxMarketData {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn arbitrum() -> Self {
        Self::new(ARBITRUM_MARKET_INFO_URL)
    }
}

impl MarketDataClient for GmxMarketData {
    fn fetch_market_snapshot(&self) -> Result<Vec<MarketRecord>> {
        let resp = reqwest::blocking::get(&self.url)
            .with_context(|| format!("request to {} failed", self.url))?;
        let info = resp
            .json::<MarketsInfoResponse>()
            .context("market-info payload did not decode")?;
        Ok(info.markets)
    }
}

use serde::{Deserialize, Serialize};

/// Number of fractional digits in the fixed-point funding rates served by the GMX market-info
/// feed. Rates arrive as signed integer strings scaled by 10^28.
pub const FUNDING_RATE_DECIMALS: u32 = 28;

/// One perpetual funding market as served by the market-info feed.
///
/// Every numeric field arrives as a string because the upstream payload serves raw base units
/// that overflow JSON numbers. Fields are kept raw here and parsed on demand so that one
/// malformed record never fails a whole snapshot; records that do not parse are excluded from
/// selection instead.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketRecord {
    /// Market name in the form `"<INDEX>/<COLLATERAL> [<pairToken>-<shortToken>]"`.
    pub name: String,
    pub market_token: String,
    pub index_token: String,
    pub long_token: String,
    pub short_token: String,
    pub available_liquidity_long: String,
    pub available_liquidity_short: String,
    pub net_rate_long: String,
    pub net_rate_short: String,
}

impl MarketRecord {
    /// Sum of long and short available liquidity in raw base units. `None` when either side is
    /// not a parseable non-negative integer.
    pub fn combined_liquidity(&self) -> Option<u128> {
        let long: u128 = self.available_liquidity_long.trim().parse().ok()?;
        let short: u128 = self.available_liquidity_short.trim().parse().ok()?;
        long.checked_add(short)
    }

    /// Net short funding rate as a decimal percentage per funding interval. Negative means
    /// shorts are paid.
    pub fn net_rate_short(&self) -> Option<f64> {
        parse_net_rate(&self.net_rate_short)
    }

    /// Leading token of the market name, e.g. `"BTC"` for `"BTC/USD [WBTC.b-USDC]"`.
    pub fn index_token_symbol(&self) -> &str {
        index_token_symbol(&self.name)
    }
}

/// Leading token of a market name (text before the first `/`).
pub fn index_token_symbol(name: &str) -> &str {
    match name.split('/').next() {
        Some(token) => token,
        None => name,
    }
}

/// Parse a funding rate string from the feed.
///
/// The feed serves rates as signed fixed-point integers scaled by 10^28. Strings that carry a
/// decimal point or an exponent are taken at face value so that already-decimal inputs also
/// work.
pub fn parse_net_rate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains(['.', 'e', 'E']) {
        return trimmed.parse::<f64>().ok();
    }
    let units: i128 = trimmed.parse().ok()?;
    Some(units as f64 / 10f64.powi(FUNDING_RATE_DECIMALS as i32))
}

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use log::info;

use funding_rotator::executor::{NullExecutor, PaperExecutor};
use funding_rotator::rotator::{Rotator, RotatorConfig};
use funding_rotator::source::gmx::GmxMarketData;

const DEFAULT_PAPER_BALANCE: f64 = 10_000.0;

fn config_from_env() -> RotatorConfig {
    let mut config = RotatorConfig::default();
    if let Ok(url) = env::var("ROTATOR_MARKET_INFO_URL") {
        config.market_info_url = url;
    }
    if let Ok(path) = env::var("ROTATOR_CACHE_PATH") {
        config.cache_path = PathBuf::from(path);
    }
    if let Ok(Ok(secs)) = env::var("ROTATOR_POLL_SECS").map(|v| v.parse::<u64>()) {
        config.poll_interval = Duration::from_secs(secs);
    }
    if let Ok(Ok(fraction)) = env::var("ROTATOR_TRADE_FRACTION").map(|v| v.parse::<f64>()) {
        config.trade_fraction = fraction;
    }
    if let Ok(Ok(fallback)) = env::var("ROTATOR_FALLBACK_TRADE_SIZE").map(|v| v.parse::<f64>()) {
        config.fallback_trade_size = fallback;
    }
    if let Ok(Ok(slippage)) = env::var("ROTATOR_SLIPPAGE_PERCENT").map(|v| v.parse::<f64>()) {
        config.slippage_percent = slippage;
    }
    if let Ok(debug) = env::var("ROTATOR_DEBUG") {
        config.debug = debug == "1" || debug.eq_ignore_ascii_case("true");
    }
    config
}

fn main() -> Result<()> {
    env_logger::init();

    let config = config_from_env();
    info!(
        "ROTATOR: Starting against {} with poll interval {:?}",
        config.market_info_url, config.poll_interval
    );

    let data = GmxMarketData::new(config.market_info_url.clone());

    if config.debug {
        let mut rotator = Rotator::new(config, data, NullExecutor::new());
        rotator.run_forever();
    } else {
        let balance = env::var("ROTATOR_PAPER_BALANCE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(DEFAULT_PAPER_BALANCE);
        let mut rotator = Rotator::new(config, data, PaperExecutor::new(balance));
        rotator.run_forever();
    }

    Ok(())
}

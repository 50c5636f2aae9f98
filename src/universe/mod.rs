use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::market::MarketRecord;

/// Substring marking a USDC-collateralised market name, e.g. `"BTC/USD [WBTC.b-USDC]"`.
pub const USDC_COLLATERAL_MARKER: &str = "-USDC]";

/// Load the pair universe, bootstrapping the cache file on first run.
///
/// If the file already exists it is read back unchanged and never refreshed from the snapshot,
/// even when the venue has since listed new markets. This is a one-time bootstrap, not a cache
/// with a TTL: once populated the universe is stable for the life of the deployment unless the
/// file is deleted by hand.
///
/// On first run every market name in the snapshot is persisted, one per line, but only the
/// USDC-collateralised subset is returned as the tradable universe.
pub fn ensure_populated(path: &Path, snapshot: &[MarketRecord]) -> Result<HashSet<String>> {
    if !path.exists() {
        let mut file = File::create(path)
            .with_context(|| format!("could not create pair cache at {}", path.display()))?;
        for market in snapshot {
            writeln!(file, "{}", market.name)?;
        }
        info!(
            "UNIVERSE: Saved {} market names to {}",
            snapshot.len(),
            path.display()
        );
    } else {
        info!(
            "UNIVERSE: {} already exists, not overwriting",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("could not read pair cache at {}", path.display()))?;
    let pairs = contents
        .lines()
        .map(str::trim)
        .filter(|line| line.contains(USDC_COLLATERAL_MARKER))
        .map(String::from)
        .collect();
    Ok(pairs)
}

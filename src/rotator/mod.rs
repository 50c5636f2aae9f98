use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use derive_more::Display;
use log::{info, warn};

use crate::executor::OrderExecutor;
use crate::market::{index_token_symbol, MarketRecord};
use crate::selector::{best_short_pair, Selection};
use crate::source::gmx::ARBITRUM_MARKET_INFO_URL;
use crate::source::MarketDataClient;
use crate::universe;

#[derive(Clone, Debug)]
pub struct RotatorConfig {
    pub market_info_url: String,
    /// Newline-delimited pair-name cache, written once on first run.
    pub cache_path: PathBuf,
    pub poll_interval: Duration,
    /// Fraction of quote balance committed per position.
    pub trade_fraction: f64,
    /// Balance substituted when the balance query fails or reads zero. Trading is never blocked
    /// on a balance-read failure.
    pub fallback_trade_size: f64,
    pub slippage_percent: f64,
    /// Short-circuits order submission to a log line.
    pub debug: bool,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            market_info_url: ARBITRUM_MARKET_INFO_URL.to_string(),
            cache_path: PathBuf::from("token_pairs.txt"),
            poll_interval: Duration::from_secs(900),
            trade_fraction: 0.25,
            fallback_trade_size: 1000.0,
            slippage_percent: 0.5,
            debug: false,
        }
    }
}

/// What a single cycle did. `Failed` carries the error that aborted the cycle; the loop logs it
/// and keeps going, so no cycle outcome is ever fatal to the process.
#[derive(Debug, Display)]
pub enum CycleOutcome {
    #[display("switched {from} -> {to}, rate {rate}")]
    Rotated { from: String, to: String, rate: f64 },
    #[display("opened {pair}, rate {rate}")]
    Opened { pair: String, rate: f64 },
    #[display("holding {pair}, best funding already established")]
    Held { pair: String },
    #[display("no market cleared the liquidity and rate gates")]
    NoCandidate,
    #[display("cycle failed: {_0}")]
    Failed(anyhow::Error),
}

/// Polls market data and keeps the account short the best-funded market.
///
/// The rotator owns all mutable state: the tracked pair and the bootstrapped universe. One
/// cycle runs at a time and the sleep between cycles is the only suspension point, so no
/// locking is needed anywhere.
pub struct Rotator<D: MarketDataClient, E: OrderExecutor> {
    config: RotatorConfig,
    data: D,
    executor: E,
    current_pair: Option<String>,
    universe: Option<HashSet<String>>,
}

impl<D: MarketDataClient, E: OrderExecutor> Rotator<D, E> {
    pub fn new(config: RotatorConfig, data: D, executor: E) -> Self {
        Self {
            config,
            data,
            executor,
            current_pair: None,
            universe: None,
        }
    }

    pub fn current_pair(&self) -> Option<&str> {
        self.current_pair.as_deref()
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run one full decision cycle. Any error is folded into [CycleOutcome::Failed] and leaves
    /// the tracked pair exactly as it was before the cycle.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        match self.cycle_inner() {
            Ok(outcome) => outcome,
            Err(e) => CycleOutcome::Failed(e),
        }
    }

    /// Poll forever. There is no terminal state, the loop runs until the process is killed.
    pub fn run_forever(&mut self) {
        loop {
            match self.run_cycle() {
                CycleOutcome::Failed(e) => warn!("ROTATOR: Cycle failed: {e:#}"),
                outcome => info!("ROTATOR: {outcome}"),
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    fn cycle_inner(&mut self) -> Result<CycleOutcome> {
        let snapshot = self
            .data
            .fetch_market_snapshot()
            .context("market snapshot fetch failed")?;

        if self.universe.is_none() {
            let pairs = universe::ensure_populated(&self.config.cache_path, &snapshot)?;
            self.universe = Some(pairs);
        }
        let selection = match &self.universe {
            Some(pairs) => best_short_pair(&snapshot, pairs),
            None => Selection::none(),
        };

        let positions = self
            .executor
            .open_positions()
            .context("open-position query failed")?;

        // A tracked pair with no position on the account means a prior rotation died between
        // the close and open legs. Start the cycle flat rather than trying to close again.
        if self.current_pair.is_some() && positions.is_empty() {
            warn!(
                "ROTATOR: Tracked pair {:?} has no open position, resetting to flat",
                self.current_pair
            );
            self.current_pair = None;
        }

        let (best_pair, rate) = match selection.pair {
            Some(pair) => (pair, selection.rate),
            None => return Ok(CycleOutcome::NoCandidate),
        };

        // The account is expected to hold at most one position; if it ever holds more, pick the
        // lexicographically smallest token so the decision is deterministic across cycles.
        match positions.keys().min() {
            Some(open_token) => self.decide_held(&snapshot, best_pair, rate, open_token),
            None => {
                info!("ROTATOR: No open position, opening best short");
                let best_market = find_market(&snapshot, &best_pair)?;
                let notional = self.trade_notional();
                self.executor
                    .open_short(best_market, notional, self.config.slippage_percent)
                    .context("open leg failed")?;
                self.current_pair = Some(best_pair.clone());
                Ok(CycleOutcome::Opened {
                    pair: best_pair,
                    rate,
                })
            }
        }
    }

    fn decide_held(
        &mut self,
        snapshot: &[MarketRecord],
        best_pair: String,
        rate: f64,
        open_token: &str,
    ) -> Result<CycleOutcome> {
        let best_token = index_token_symbol(&best_pair);

        if open_token == best_token {
            // Position was opened before this process started, adopt it
            if self.current_pair.is_none() {
                self.current_pair = Some(best_pair.clone());
            }
            return Ok(CycleOutcome::Held { pair: best_pair });
        }

        info!("ROTATOR: Switching pairs: {} -> {}", open_token, best_token);

        // The held market is looked up by tracked name when we have one, otherwise by the open
        // position's token symbol (process restarted while holding).
        let close_market = match &self.current_pair {
            Some(name) => find_market(snapshot, name)?,
            None => snapshot
                .iter()
                .find(|market| market.index_token_symbol() == open_token)
                .ok_or_else(|| {
                    anyhow!("no market in snapshot for held token {}", open_token)
                })?,
        };
        let from = close_market.name.clone();
        let best_market = find_market(snapshot, &best_pair)?;

        // Close fully before opening the replacement. Sequential, not atomic: a failure after
        // the close leaves the account flat and the tracked pair stale, which the next cycle's
        // reconciliation clears.
        self.executor
            .close_short(close_market, self.config.slippage_percent)
            .context("close leg failed")?;
        let notional = self.trade_notional();
        self.executor
            .open_short(best_market, notional, self.config.slippage_percent)
            .context("open leg failed")?;

        self.current_pair = Some(best_pair.clone());
        Ok(CycleOutcome::Rotated {
            from,
            to: best_pair,
            rate,
        })
    }

    fn trade_notional(&self) -> f64 {
        let balance = match self.executor.quote_balance() {
            Ok(balance) if balance > 0.0 => balance,
            Ok(_) => {
                warn!(
                    "ROTATOR: Quote balance is zero, using fallback {}",
                    self.config.fallback_trade_size
                );
                self.config.fallback_trade_size
            }
            Err(e) => {
                warn!(
                    "ROTATOR: Could not fetch quote balance: {e:#}, using fallback {}",
                    self.config.fallback_trade_size
                );
                self.config.fallback_trade_size
            }
        };
        balance * self.config.trade_fraction
    }
}

fn find_market<'a>(snapshot: &'a [MarketRecord], name: &str) -> Result<&'a MarketRecord> {
    snapshot
        .iter()
        .find(|market| market.name == name)
        .ok_or_else(|| anyhow!("market {} not found in snapshot", name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::{anyhow, Result};

    use super::{CycleOutcome, Rotator, RotatorConfig};
    use crate::executor::{OrderExecutor, PositionInfo};
    use crate::market::MarketRecord;
    use crate::source::MarketDataClient;

    struct StaticMarketData {
        markets: Vec<MarketRecord>,
    }

    impl MarketDataClient for StaticMarketData {
        fn fetch_market_snapshot(&self) -> Result<Vec<MarketRecord>> {
            Ok(self.markets.clone())
        }
    }

    struct FailingMarketData;

    impl MarketDataClient for FailingMarketData {
        fn fetch_market_snapshot(&self) -> Result<Vec<MarketRecord>> {
            Err(anyhow!("connection refused"))
        }
    }

    struct NoopExecutor;

    impl OrderExecutor for NoopExecutor {
        fn open_short(&mut self, _: &MarketRecord, _: f64, _: f64) -> Result<()> {
            Ok(())
        }
        fn close_short(&mut self, _: &MarketRecord, _: f64) -> Result<()> {
            Ok(())
        }
        fn open_positions(&self) -> Result<HashMap<String, PositionInfo>> {
            Ok(HashMap::new())
        }
        fn quote_balance(&self) -> Result<f64> {
            Ok(0.0)
        }
    }

    fn config(tag: &str) -> RotatorConfig {
        let cache_path = std::env::temp_dir().join(format!(
            "funding_rotator_rotator_{}_{}.txt",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&cache_path);
        RotatorConfig {
            cache_path,
            ..Default::default()
        }
    }

    #[test]
    fn test_that_fetch_failure_is_isolated_to_the_cycle() {
        let mut rotator = Rotator::new(config("fetch_fail"), FailingMarketData, NoopExecutor);

        let outcome = rotator.run_cycle();
        assert!(matches!(outcome, CycleOutcome::Failed(_)));
        assert!(rotator.current_pair().is_none());
    }

    #[test]
    fn test_that_zero_balance_uses_fallback_fraction() {
        let market = MarketRecord {
            name: "BTC/USD [WBTC.b-USDC]".to_string(),
            available_liquidity_long: "10".to_string(),
            available_liquidity_short: "10".to_string(),
            net_rate_short: "-0.05".to_string(),
            ..Default::default()
        };
        let config = config("fallback");
        let fallback = config.fallback_trade_size;
        let fraction = config.trade_fraction;
        let rotator = Rotator::new(
            config,
            StaticMarketData {
                markets: vec![market],
            },
            NoopExecutor,
        );

        assert_eq!(rotator.trade_notional(), fallback * fraction);
    }
}

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use log::info;
use rand::thread_rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::market::MarketRecord;

/// One open short position, keyed by index token symbol in [OrderExecutor::open_positions].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PositionInfo {
    /// Notional size in quote currency.
    pub size: f64,
    /// Net short funding rate at the time the position was opened.
    pub entry_rate: f64,
}

/// Seam between the rotation loop and order submission.
///
/// Opening converts a fraction of quote balance into the index token via a swap and then
/// increases a short sized to the same notional. Closing fully decreases the short and swaps
/// the index-token proceeds back. Implementations submit both legs sequentially; a failure
/// between legs is surfaced as an error and never rolled back.
pub trait OrderExecutor {
    fn open_short(
        &mut self,
        market: &MarketRecord,
        notional: f64,
        slippage_percent: f64,
    ) -> Result<()>;

    fn close_short(&mut self, market: &MarketRecord, slippage_percent: f64) -> Result<()>;

    /// Currently open positions keyed by index token symbol. Empty means the account is flat.
    fn open_positions(&self) -> Result<HashMap<String, PositionInfo>>;

    /// Available quote-currency balance. Callers substitute a configured fallback on error
    /// rather than skipping the cycle.
    fn quote_balance(&self) -> Result<f64>;
}

/// Simulated wallet state for paper trading.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PaperWallet {
    pub balance: f64,
    pub positions: HashMap<String, PositionInfo>,
    pub funding_earned: f64,
    pub gas_spent: f64,
}

impl PaperWallet {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            balance: starting_balance,
            positions: HashMap::new(),
            funding_earned: 0.0,
            gas_spent: 0.0,
        }
    }
}

/// Paper-trading executor. Tracks a simulated wallet, charges a randomised gas cost per
/// operation and accrues funding on close with some noise around the entry rate.
pub struct PaperExecutor {
    wallet: PaperWallet,
}

impl PaperExecutor {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            wallet: PaperWallet::new(starting_balance),
        }
    }

    pub fn wallet(&self) -> &PaperWallet {
        &self.wallet
    }

    // Swap plus order lands somewhere between $0.50 and $2
    fn simulate_gas_cost(&mut self) -> f64 {
        let gas_dist = Uniform::new(0.5, 2.0);
        let gas = gas_dist.sample(&mut thread_rng());
        self.wallet.gas_spent += gas;
        gas
    }

    pub fn report(&self) {
        info!(
            "PAPER: Wallet balance {:.2}, funding earned {:.2}, gas spent {:.2}",
            self.wallet.balance, self.wallet.funding_earned, self.wallet.gas_spent
        );
    }
}

impl OrderExecutor for PaperExecutor {
    fn open_short(
        &mut self,
        market: &MarketRecord,
        notional: f64,
        _slippage_percent: f64,
    ) -> Result<()> {
        let token = market.index_token_symbol().to_string();
        let entry_rate = market.net_rate_short().unwrap_or(0.0);
        let gas = self.simulate_gas_cost();

        self.wallet.balance -= notional + gas;
        self.wallet.positions.insert(
            token.clone(),
            PositionInfo {
                size: notional,
                entry_rate,
            },
        );
        info!(
            "PAPER: Opened short {} for {:.2}, gas {:.2}, rate {}",
            token, notional, gas, entry_rate
        );
        Ok(())
    }

    fn close_short(&mut self, market: &MarketRecord, _slippage_percent: f64) -> Result<()> {
        let token = market.index_token_symbol();
        let position = match self.wallet.positions.remove(token) {
            Some(position) => position,
            // Nothing to close, same as the live path where a decrease of a missing position
            // is a no-op from the wallet's point of view
            None => return Ok(()),
        };

        let noise_dist = Uniform::new(0.8, 1.2);
        let funding = position.size * -position.entry_rate * noise_dist.sample(&mut thread_rng());
        self.wallet.funding_earned += funding;
        self.wallet.balance += position.size;

        let gas = self.simulate_gas_cost();
        self.wallet.balance -= gas;
        info!(
            "PAPER: Closed short {}, funding earned {:.2}, gas {:.2}",
            token, funding, gas
        );
        self.report();
        Ok(())
    }

    fn open_positions(&self) -> Result<HashMap<String, PositionInfo>> {
        Ok(self.wallet.positions.clone())
    }

    fn quote_balance(&self) -> Result<f64> {
        Ok(self.wallet.balance)
    }
}

/// Debug executor that logs the order it would have submitted and does nothing else. Used when
/// the debug flag short-circuits live submission.
pub struct NullExecutor;

impl NullExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderExecutor for NullExecutor {
    fn open_short(
        &mut self,
        market: &MarketRecord,
        notional: f64,
        slippage_percent: f64,
    ) -> Result<()> {
        info!(
            "DEBUG: Would open short on {} for {:.2} at {}% slippage",
            market.name, notional, slippage_percent
        );
        Ok(())
    }

    fn close_short(&mut self, market: &MarketRecord, slippage_percent: f64) -> Result<()> {
        info!(
            "DEBUG: Would close short on {} at {}% slippage",
            market.name, slippage_percent
        );
        Ok(())
    }

    fn open_positions(&self) -> Result<HashMap<String, PositionInfo>> {
        Ok(HashMap::new())
    }

    fn quote_balance(&self) -> Result<f64> {
        // Forces the caller onto its fallback trade size, no balance source in debug mode
        Err(anyhow!("debug executor has no balance source"))
    }
}

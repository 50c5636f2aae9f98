//! # What is funding-rotator?
//!
//! funding-rotator is a bot that farms short-side funding on GMX v2 perpetual markets. Shorts on
//! a perpetual market with a negative net short rate are paid funding every interval, so the bot
//! polls the market-info feed, picks the market that currently pays shorts the most, and keeps
//! the account's single short position parked there, rotating whenever a better market appears.
//!
//! # Implementation
//!
//! The bot is composed of:
//! - A source, [GmxMarketData](crate::source::gmx::GmxMarketData), which fetches the raw
//!   market-info payload and produces typed [MarketRecord](crate::market::MarketRecord) values.
//! - A selector, [best_short_pair](crate::selector::best_short_pair), a pure function that gates
//!   markets on a median-liquidity threshold and then picks the most negative short rate.
//! - A universe cache, [ensure_populated](crate::universe::ensure_populated), which bootstraps
//!   the set of tradable pair names once and never refreshes it.
//! - An executor behind the [OrderExecutor](crate::executor::OrderExecutor) trait. The crate
//!   ships a paper-trading executor with a simulated wallet; live order submission plugs in at
//!   the same seam.
//! - The [Rotator](crate::rotator::Rotator), which runs the poll loop and the
//!   hold/open/switch state machine, isolating failures per cycle.

pub mod executor;
pub mod market;
pub mod rotator;
pub mod selector;
pub mod source;
pub mod universe;

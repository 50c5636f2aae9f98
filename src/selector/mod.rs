use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::market::MarketRecord;

/// Result of one selection pass. `pair` is `None` when no market cleared the liquidity gate
/// with a strictly negative short rate, in which case `rate` is 0.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Selection {
    pub pair: Option<String>,
    pub rate: f64,
}

impl Selection {
    pub fn none() -> Self {
        Self {
            pair: None,
            rate: 0.0,
        }
    }
}

/// Median combined liquidity across the whole snapshot, lower-middle element for even-sized
/// inputs. Records with malformed liquidity fields do not contribute. `None` when nothing in
/// the snapshot has parseable liquidity.
pub fn liquidity_threshold(snapshot: &[MarketRecord]) -> Option<u128> {
    let mut values: Vec<u128> = snapshot
        .iter()
        .filter_map(|market| market.combined_liquidity())
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[values.len() / 2])
}

/// Pick the best market to hold short.
///
/// The threshold is computed over every market in the snapshot, not just those in the universe,
/// so the gate tracks venue-wide liquidity. Candidates must match a universe entry by
/// substring, clear the threshold and carry a parseable short rate. The winner is the most
/// negative rate; the baseline starts at zero so a non-negative rate is never selected, and the
/// first market seen in snapshot order wins ties.
pub fn best_short_pair(snapshot: &[MarketRecord], universe: &HashSet<String>) -> Selection {
    let threshold = match liquidity_threshold(snapshot) {
        Some(threshold) => threshold,
        None => return Selection::none(),
    };

    let mut best: Option<&MarketRecord> = None;
    let mut best_rate = 0.0;

    for market in snapshot {
        if !universe.iter().any(|pair| market.name.contains(pair.as_str())) {
            continue;
        }
        let combined = match market.combined_liquidity() {
            Some(combined) => combined,
            None => continue,
        };
        if combined < threshold {
            continue;
        }
        if let Some(rate) = market.net_rate_short() {
            if rate < best_rate {
                best_rate = rate;
                best = Some(market);
            }
        }
    }

    match best {
        Some(market) => Selection {
            pair: Some(market.name.clone()),
            rate: best_rate,
        },
        None => Selection::none(),
    }
}

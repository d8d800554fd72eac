//! Greedy change making under a finite coin stock.

use std::collections::BTreeMap;

use crate::Amount;
use crate::model::Coin;

/// Coins to hand back for some owed amount, and what could not be covered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Change {
    /// Denomination to number of coins dispensed. Only positive counts are present.
    pub breakdown: BTreeMap<Amount, u32>,
    /// Part of the owed amount the available coins could not represent.
    pub remainder: Amount,
}

impl Change {
    /// Total value of the dispensed coins.
    pub fn dispensed(&self) -> Amount {
        self.breakdown
            .iter()
            .map(|(&denomination, &count)| denomination * count)
            .sum()
    }

    pub fn is_exact(&self) -> bool {
        self.remainder == Amount::ZERO
    }
}

/// Break `owed` down into coins, largest denomination first, never using more
/// coins of a denomination than are in stock.
///
/// This does not touch the stock; applying the breakdown is up to the caller.
/// The result is optimal when every denomination is at least twice the next
/// smaller one, which [`Inventory`](crate::Inventory) enforces.
pub fn calculate(owed: Amount, coins: &[Coin]) -> Change {
    let mut remaining = owed.cents().max(0);

    let mut ordered: Vec<&Coin> = coins
        .iter()
        .filter(|coin| coin.denomination.is_positive())
        .collect();
    ordered.sort_by(|a, b| b.denomination.cmp(&a.denomination));

    let mut breakdown = BTreeMap::new();
    for coin in ordered {
        let value = coin.denomination.cents();
        let fits = remaining / value;
        let count = fits.min(i64::from(coin.stock));
        if count > 0 {
            // count <= coin.stock, so it fits back into u32
            *breakdown.entry(coin.denomination).or_insert(0) += count as u32;
            remaining -= value * count;
        }
    }

    Change {
        breakdown,
        remainder: Amount::from_cents(remaining),
    }
}

use std::fmt;

use crate::Amount;
use crate::model::ProductId;

/// Where the machine is in a purchase. The selected product is carried by
/// the states that have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Waiting for a product identifier.
    #[default]
    SelectProduct,
    /// A product is selected, waiting for money.
    ReceiveMoney { product: ProductId },
    /// Enough money was received, the product and change are due.
    GiveProduct { product: ProductId },
}

impl State {
    pub fn product(&self) -> Option<ProductId> {
        match self {
            State::SelectProduct => None,
            State::ReceiveMoney { product } | State::GiveProduct { product } => Some(*product),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            State::SelectProduct => "select_product",
            State::ReceiveMoney { .. } => "receive_money",
            State::GiveProduct { .. } => "give_product",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The purchase in progress and the customer's credit.
///
/// `credit` survives the end of a purchase: it holds whatever change could not
/// be dispensed, or money inserted before a cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transaction {
    pub state: State,
    pub credit: Amount,
}

impl Transaction {
    pub fn selected_product(&self) -> Option<ProductId> {
        self.state.product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_default() {
        let transaction = Transaction::default();
        assert_eq!(transaction.state, State::SelectProduct);
        assert_eq!(transaction.credit, Amount::ZERO);
        assert_eq!(transaction.selected_product(), None);
    }

    #[test]
    fn selected_product_follows_state() {
        let transaction = Transaction {
            state: State::ReceiveMoney { product: 2 },
            credit: Amount::from_cents(100),
        };
        assert_eq!(transaction.selected_product(), Some(2));
        assert_eq!(State::GiveProduct { product: 1 }.product(), Some(1));
    }

    #[test]
    fn state_display() {
        assert_eq!(State::SelectProduct.to_string(), "select_product");
        assert_eq!(State::ReceiveMoney { product: 0 }.to_string(), "receive_money");
        assert_eq!(State::GiveProduct { product: 0 }.to_string(), "give_product");
    }
}

//! Error types for machine transitions.

use thiserror::Error;

use super::State;
use crate::inventory::InventoryError;
use crate::model::ProductId;

/// Error returned by a rejected transition. None of them is fatal: the
/// transaction and the inventory are left as they were before the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("number is out of range")]
    OutOfRange,

    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),

    #[error("amount must be a positive number")]
    InvalidAmount,

    #[error("cannot {operation} while in {state}")]
    WrongState {
        operation: &'static str,
        state: State,
    },

    #[error("inventory: {0}")]
    Inventory(#[from] InventoryError),
}

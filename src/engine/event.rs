use crate::Amount;
use crate::change::Change;
use crate::model::{Listing, ProductId};

use super::EngineError;

/// Output of the machine, rendered by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The catalog with current stock.
    ProductList(Vec<Listing>),
    /// The machine waits for a product identifier.
    PromptForIdentifier,
    /// An input was rejected.
    Error(EngineError),
    /// The machine waits for money; carries the amount still due.
    PromptForAmount(Amount),
    /// The selected product was handed out.
    ProductDispensed { product: ProductId, name: String },
    /// Coins handed back after a purchase.
    ChangeDispensed(Change),
    /// Change that no coin combination in stock could cover. Kept as credit.
    UndispensableRemainder(Amount),
    /// Credit held by the machine when a purchase is cancelled.
    RetainedOnCancel(Amount),
}

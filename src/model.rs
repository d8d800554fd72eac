//! Core domain types for the vending machine.

use crate::Amount;

/// Product identifier, the product's index in the catalog.
pub type ProductId = usize;

/// A coin denomination and how many of those coins the machine holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coin {
    pub denomination: Amount,
    pub stock: u32,
}

impl Coin {
    pub fn new(denomination: Amount, stock: u32) -> Self {
        Self {
            denomination,
            stock,
        }
    }
}

/// A product slot of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub stock: u32,
    pub price: Amount,
}

impl Product {
    pub fn new(name: impl Into<String>, stock: u32, price: Amount) -> Self {
        Self {
            name: name.into(),
            stock,
            price,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// One row of the product list shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: ProductId,
    pub name: String,
    pub stock: u32,
    pub price: Amount,
}

/// An already-parsed customer input, the possible inputs of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Pick a product by its identifier.
    Select(ProductId),
    /// Insert money toward the selected product.
    Insert(Amount),
    /// Abort the current purchase. Accepted in every state.
    Cancel,
}

//! Coin and product stock owned by the machine.

use thiserror::Error;

use crate::Amount;
use crate::change::Change;
use crate::model::{Coin, Listing, Product, ProductId};

/// Errors raised when building or drawing from an [`Inventory`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("coin denomination {0} is not positive")]
    NonPositiveDenomination(Amount),

    #[error("duplicate coin denomination {0}")]
    DuplicateDenomination(Amount),

    #[error("coin {larger} is less than twice the next smaller coin {smaller}")]
    DenominationsTooClose { smaller: Amount, larger: Amount },

    #[error("product '{name}' has non-positive price {price}")]
    NonPositivePrice { name: String, price: Amount },

    #[error("product {0} does not exist")]
    UnknownProduct(ProductId),

    #[error("product {0} is out of stock")]
    ProductOutOfStock(ProductId),

    #[error("not enough {denomination} coins: have {available}, need {requested}")]
    InsufficientCoins {
        denomination: Amount,
        available: u32,
        requested: u32,
    },
}

/// Coins sorted by ascending denomination, plus the product catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    coins: Vec<Coin>,
    products: Vec<Product>,
}

impl Inventory {
    /// Build an inventory, checking that the coin set is usable by the greedy
    /// change algorithm: positive, unique denominations where each one is at
    /// least twice the next smaller one.
    pub fn new(mut coins: Vec<Coin>, products: Vec<Product>) -> Result<Self, InventoryError> {
        if let Some(coin) = coins.iter().find(|c| !c.denomination.is_positive()) {
            return Err(InventoryError::NonPositiveDenomination(coin.denomination));
        }

        coins.sort_by_key(|c| c.denomination);
        for pair in coins.windows(2) {
            let (smaller, larger) = (pair[0].denomination, pair[1].denomination);
            if smaller == larger {
                return Err(InventoryError::DuplicateDenomination(smaller));
            }
            // no room to double means the next coin is too close
            let too_close = smaller
                .cents()
                .checked_mul(2)
                .is_none_or(|doubled| doubled > larger.cents());
            if too_close {
                return Err(InventoryError::DenominationsTooClose { smaller, larger });
            }
        }

        if let Some(product) = products.iter().find(|p| !p.price.is_positive()) {
            return Err(InventoryError::NonPositivePrice {
                name: product.name.clone(),
                price: product.price,
            });
        }

        Ok(Self { coins, products })
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn coin(&self, denomination: Amount) -> Option<&Coin> {
        self.coins.iter().find(|c| c.denomination == denomination)
    }

    /// Rows for the product list, in catalog order.
    pub fn listing(&self) -> Vec<Listing> {
        self.products
            .iter()
            .enumerate()
            .map(|(id, product)| Listing {
                id,
                name: product.name.clone(),
                stock: product.stock,
                price: product.price,
            })
            .collect()
    }

    /// Remove one unit of a product.
    pub fn take_product(&mut self, id: ProductId) -> Result<(), InventoryError> {
        let product = self
            .products
            .get_mut(id)
            .ok_or(InventoryError::UnknownProduct(id))?;
        product.stock = product
            .stock
            .checked_sub(1)
            .ok_or(InventoryError::ProductOutOfStock(id))?;
        Ok(())
    }

    /// Remove the coins of a change breakdown. Either every denomination is
    /// decremented or, on error, none is.
    pub fn take_coins(&mut self, change: &Change) -> Result<(), InventoryError> {
        for (&denomination, &requested) in &change.breakdown {
            let available = self.coin(denomination).map_or(0, |c| c.stock);
            if available < requested {
                return Err(InventoryError::InsufficientCoins {
                    denomination,
                    available,
                    requested,
                });
            }
        }

        for coin in &mut self.coins {
            if let Some(&count) = change.breakdown.get(&coin.denomination) {
                coin.stock -= count;
            }
        }
        Ok(())
    }
}

impl Default for Inventory {
    /// Five coin denominations with ten coins each, and three single-unit products.
    fn default() -> Self {
        let coins = [25, 50, 100, 200, 500]
            .into_iter()
            .map(|cents| Coin::new(Amount::from_cents(cents), 10))
            .collect();
        let products = vec![
            Product::new("good 1", 1, Amount::from_cents(250)),
            Product::new("good 2", 1, Amount::from_cents(100)),
            Product::new("good 3", 1, Amount::from_cents(100)),
        ];
        Self { coins, products }
    }
}

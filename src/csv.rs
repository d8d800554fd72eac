use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::Amount;
use crate::inventory::{Inventory, InventoryError};
use crate::model::{Coin, Product};

/// Errors that can occur when loading a catalog csv
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to open catalog: {0}")]
    Open(csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized kind '{kind}'")]
    UnrecognizedKind { line: usize, kind: String },

    #[error("line {line}: product missing name")]
    MissingName { line: usize },

    #[error("invalid catalog: {0}")]
    Inventory(#[from] InventoryError),
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    kind: String,
    name: Option<String>,
    stock: u32,
    value: Amount,
}

/// Read the machine's coins and products from a csv file.
///
/// Rows have the form `kind,name,stock,value` where `kind` is `coin` (value
/// is the denomination) or `product` (value is the price).
pub fn read_catalog(path: impl AsRef<Path>) -> Result<Inventory, CatalogError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(CatalogError::Open)?;

    let mut coins = Vec::new();
    let mut products = Vec::new();

    for (idx, result) in reader.into_deserialize::<CatalogRow>().enumerate() {
        let line = idx + 2; // 1-indexed, skip header
        let row = result.map_err(|source| CatalogError::Parse { line, source })?;
        match row.kind.as_str() {
            "coin" => coins.push(Coin::new(row.value, row.stock)),
            "product" => {
                let name = row
                    .name
                    .filter(|name| !name.is_empty())
                    .ok_or(CatalogError::MissingName { line })?;
                products.push(Product::new(name, row.stock, row.value));
            }
            other => {
                return Err(CatalogError::UnrecognizedKind {
                    line,
                    kind: other.to_string(),
                });
            }
        }
    }

    Ok(Inventory::new(coins, products)?)
}

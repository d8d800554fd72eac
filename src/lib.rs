pub mod amount;
pub mod change;
pub mod cli;
pub mod csv;
pub mod engine;
pub mod inventory;
pub mod model;

pub use amount::Amount;
pub use change::{Change, calculate};
pub use engine::{EngineError, Event, Machine, State, Transaction};
pub use inventory::{Inventory, InventoryError};
pub use model::{Coin, Command, Listing, Product, ProductId};

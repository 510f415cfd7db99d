//! Store and order documents plus their request shapes.

mod order;
mod store;

pub use order::*;
pub use store::*;

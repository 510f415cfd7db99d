//! Repositories for the `stores` and `orders` collections.

mod orders;
mod stores;

pub use orders::OrderRepository;
pub use stores::StoreRepository;

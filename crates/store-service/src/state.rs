//! Application state.

use mongodb::Database;

use bazaar_gateway::GatewayState;

use crate::db::{OrderRepository, StoreRepository};

/// Shared state for the store service.
#[derive(Clone)]
pub struct AppState {
    pub gateway: GatewayState,
    pub stores: StoreRepository,
    pub orders: OrderRepository,
    db: Database,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: GatewayState, db: Database) -> Self {
        Self {
            gateway,
            stores: StoreRepository::new(&db),
            orders: OrderRepository::new(&db),
            db,
        }
    }

    /// Database handle, for the readiness probe.
    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }
}

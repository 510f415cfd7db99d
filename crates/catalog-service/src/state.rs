//! Application state.

use mongodb::Database;

use bazaar_gateway::GatewayState;

use crate::db::ItemRepository;

/// Shared state for the catalog service.
#[derive(Clone)]
pub struct AppState {
    pub gateway: GatewayState,
    pub items: ItemRepository,
    db: Database,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: GatewayState, db: Database) -> Self {
        Self {
            gateway,
            items: ItemRepository::new(&db),
            db,
        }
    }

    /// Database handle, for the readiness probe.
    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }
}

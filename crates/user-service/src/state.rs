//! Application state.

use mongodb::Database;

use bazaar_gateway::GatewayState;

use crate::db::UserRepository;

/// Shared state for the identity service.
#[derive(Clone)]
pub struct AppState {
    pub gateway: GatewayState,
    pub users: UserRepository,
    db: Database,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: GatewayState, db: Database) -> Self {
        Self {
            gateway,
            users: UserRepository::new(&db),
            db,
        }
    }

    /// Database handle, for the readiness probe.
    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }
}

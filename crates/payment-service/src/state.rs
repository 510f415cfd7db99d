//! Application state.

use mongodb::Database;

use bazaar_gateway::GatewayState;

use crate::db::PaymentRepository;

/// Shared state for the payment service.
#[derive(Clone)]
pub struct AppState {
    pub gateway: GatewayState,
    pub payments: PaymentRepository,
    db: Database,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: GatewayState, db: Database) -> Self {
        Self {
            gateway,
            payments: PaymentRepository::new(&db),
            db,
        }
    }

    /// Database handle, for the readiness probe.
    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }
}

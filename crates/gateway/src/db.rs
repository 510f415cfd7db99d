//! Document-store connection helper and repository error taxonomy.
//!
//! Each service owns its collections and accesses them through repository
//! structs; this module only provides the shared connection setup and the
//! error type those repositories return.

use std::time::Duration;

use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use secrecy::ExposeSecret;

/// Errors returned by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Driver-level failure (connectivity, write errors, bad responses).
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// The referenced document does not exist.
    #[error("document not found")]
    NotFound,

    /// A uniqueness or state constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored document failed to round-trip through its model type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a database handle with sensible defaults.
///
/// # Errors
///
/// Returns `mongodb::error::Error` if the URI cannot be parsed. The driver
/// connects lazily, so reachability problems surface on first use (or via
/// the readiness probe).
pub async fn connect(
    mongo_uri: &secrecy::SecretString,
    database: &str,
) -> Result<Database, mongodb::error::Error> {
    let mut options = ClientOptions::parse(mongo_uri.expose_secret()).await?;
    options.server_selection_timeout = Some(Duration::from_secs(10));
    options.max_pool_size = Some(10);

    let client = Client::with_options(options)?;
    Ok(client.database(database))
}

/// Ping the database, for readiness probes.
///
/// # Errors
///
/// Returns `mongodb::error::Error` if the server does not respond.
pub async fn ping(db: &Database) -> Result<(), mongodb::error::Error> {
    db.run_command(bson::doc! { "ping": 1 }).await?;
    Ok(())
}

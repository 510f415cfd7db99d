//! Per-service configuration loaded from environment variables.
//!
//! Every service calls [`ServiceConfig::from_env`] with its own prefix
//! (e.g. `USER_SERVICE`), so one deployment file can configure all four
//! services side by side.
//!
//! # Environment Variables
//!
//! ## Required
//! - `{PREFIX}_MONGO_URI` (fallback `MONGO_URI`) - MongoDB connection string
//! - `BAZAAR_JWT_SECRET` - Session-token signing secret (min 32 chars, high entropy)
//! - `BAZAAR_CSRF_SECRET` - CSRF-token signing secret (same requirements)
//!
//! ## Optional
//! - `{PREFIX}_HOST` - Bind address (default: 127.0.0.1)
//! - `{PREFIX}_PORT` - Listen port (default: per service)
//! - `{PREFIX}_DATABASE` - Database name (default: bazaar)
//! - `BAZAAR_SESSION_TTL_SECS` - Session token lifetime (default: 24h)
//! - `BAZAAR_CSRF_TTL_SECS` - CSRF token lifetime (default: 1h)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default session token lifetime: 24 hours.
const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Default CSRF token lifetime: 1 hour.
const DEFAULT_CSRF_TTL_SECS: u64 = 60 * 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Configuration shared by every Bazaar service binary.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// MongoDB connection URI (may contain credentials)
    pub mongo_uri: SecretString,
    /// Database name
    pub database: String,
    /// Session-token signing secret
    pub jwt_secret: SecretString,
    /// CSRF-token signing secret
    pub csrf_secret: SecretString,
    /// Session token lifetime in seconds
    pub session_ttl_secs: i64,
    /// CSRF token lifetime in seconds
    pub csrf_ttl_secs: u64,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env(prefix: &str, default_port: u16) -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host_var = format!("{prefix}_HOST");
        let host = get_env_or_default(&host_var, "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar(host_var, e.to_string()))?;

        let port_var = format!("{prefix}_PORT");
        let port = get_env_or_default(&port_var, &default_port.to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar(port_var, e.to_string()))?;

        let mongo_uri = get_mongo_uri(&format!("{prefix}_MONGO_URI"))?;
        let database = get_env_or_default(&format!("{prefix}_DATABASE"), "bazaar");

        let jwt_secret = get_validated_secret("BAZAAR_JWT_SECRET")?;
        let csrf_secret = get_validated_secret("BAZAAR_CSRF_SECRET")?;

        let session_ttl_secs = get_env_or_default(
            "BAZAAR_SESSION_TTL_SECS",
            &DEFAULT_SESSION_TTL_SECS.to_string(),
        )
        .parse::<i64>()
        .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_SESSION_TTL_SECS".to_owned(), e.to_string()))?;

        let csrf_ttl_secs = get_env_or_default(
            "BAZAAR_CSRF_TTL_SECS",
            &DEFAULT_CSRF_TTL_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_CSRF_TTL_SECS".to_owned(), e.to_string()))?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            mongo_uri,
            database,
            jwt_secret,
            csrf_secret,
            session_ttl_secs,
            csrf_ttl_secs,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get the Mongo URI with fallback to the generic `MONGO_URI`.
fn get_mongo_uri(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("MONGO_URI") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SECRET_LENGTH,
                secret.len()
            ),
        ));
    }

    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real signing secrets are randomly generated and have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-signing-key-here-your-signing", "TEST_VAR");
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_too_short() {
        let result = validate_secret_strength("aB3$xY9!", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServiceConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 8081,
            mongo_uri: SecretString::from("mongodb://localhost:27017"),
            database: "bazaar".to_owned(),
            jwt_secret: SecretString::from("x".repeat(32)),
            csrf_secret: SecretString::from("y".repeat(32)),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            csrf_ttl_secs: DEFAULT_CSRF_TTL_SECS,
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8081);
    }
}

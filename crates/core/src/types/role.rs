//! User roles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not one of the known roles.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleError(pub String);

/// The role attached to a user account.
///
/// Roles are stored as their exact wire strings (`"Buyer"`, `"Merchant"`,
/// `"Admin"`) and travel inside the session token, so every service can
/// read them without a user-service round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// A customer placing orders and leaving reviews.
    Buyer,
    /// A store owner managing a catalog.
    Merchant,
    /// Platform administration.
    Admin,
}

impl Role {
    /// Returns the wire string for this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "Buyer",
            Self::Merchant => "Merchant",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buyer" => Ok(Self::Buyer),
            "Merchant" => Ok(Self::Merchant),
            "Admin" => Ok(Self::Admin),
            other => Err(RoleError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for role in [Role::Buyer, Role::Merchant, Role::Admin] {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_unknown_role() {
        assert!("Superuser".parse::<Role>().is_err());
        // Case matters: the wire format is capitalized
        assert!("buyer".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_wire_strings() {
        assert_eq!(serde_json::to_string(&Role::Merchant).unwrap(), "\"Merchant\"");
        let role: Role = serde_json::from_str("\"Admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}

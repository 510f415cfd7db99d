//! Order and payment status enums.
//!
//! Status strings arrive from clients as free text; parsing them through
//! these enums is what turns "update the status" into a closed contract
//! instead of an arbitrary string write.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not a member of the enum.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind} status: {value}")]
pub struct StatusError {
    /// Which status family was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Lifecycle of an order.
///
/// Orders only move forward: `Pending -> Confirmed -> Dispatched ->
/// Delivered`. Merchants and admins drive the transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Dispatched,
    Delivered,
}

impl OrderStatus {
    /// Returns the wire string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Dispatched => "Dispatched",
            Self::Delivered => "Delivered",
        }
    }

    /// Whether `next` is a forward step from this status.
    ///
    /// Repeating the current status is allowed (idempotent updates);
    /// moving backwards is not.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        self.rank() <= next.rank()
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Confirmed => 1,
            Self::Dispatched => 2,
            Self::Delivered => 3,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Dispatched" => Ok(Self::Dispatched),
            "Delivered" => Ok(Self::Delivered),
            other => Err(StatusError {
                kind: "order",
                value: other.to_owned(),
            }),
        }
    }
}

/// Lifecycle of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Returns the wire string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            other => Err(StatusError {
                kind: "payment",
                value: other.to_owned(),
            }),
        }
    }
}

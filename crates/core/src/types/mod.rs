//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod numeric;
pub mod role;
pub mod status;

pub use id::*;
pub use numeric::{Discount, NumericError, Price, Quantity, Rating};
pub use role::{Role, RoleError};
pub use status::*;

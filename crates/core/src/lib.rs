//! Bazaar Core - Shared types library.
//!
//! This crate provides common types used across all Bazaar services:
//! - `user-service` - Identity and session management
//! - `catalog-service` - Item catalog and item reviews
//! - `store-service` - Stores with embedded items, and orders
//! - `payment-service` - Payment records and per-store totals
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, validated numerics,
//!   roles, and status enums
//! - [`sanitize`] - HTML-entity escaping for client-supplied free text

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod sanitize;
pub mod types;

pub use types::*;

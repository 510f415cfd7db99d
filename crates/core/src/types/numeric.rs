//! Boundary-validated numeric fields.
//!
//! Prices, quantities, discounts, and ratings arrive as raw JSON numbers.
//! These wrappers are the only way such values enter a model, so the range
//! constraints (price > 0, discount 0-100, rating 1-5, quantity >= 0) hold
//! everywhere past the request boundary.

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a numeric field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NumericError {
    /// The price must be a finite number greater than zero.
    #[error("price must be greater than zero")]
    InvalidPrice,
    /// The discount must be a whole percentage between 0 and 100.
    #[error("discount must be between 0 and 100")]
    InvalidDiscount,
    /// The rating must be between 1 and 5.
    #[error("rating must be between 1 and 5")]
    InvalidRating,
    /// The quantity must be zero or more.
    #[error("quantity cannot be negative")]
    InvalidQuantity,
}

/// A unit price in the store's currency.
///
/// Stored as a float, matching the document format the services share with
/// the frontend; validation happens once at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(f64);

impl Price {
    /// Validate a client-supplied price.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::InvalidPrice`] unless the value is finite
    /// and strictly positive.
    pub fn parse(value: f64) -> Result<Self, NumericError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(NumericError::InvalidPrice)
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(&self) -> f64 {
        self.0
    }
}

/// A discount percentage (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Discount(u32);

impl Discount {
    /// Validate a client-supplied discount percentage.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::InvalidDiscount`] if the value exceeds 100.
    pub const fn parse(value: u32) -> Result<Self, NumericError> {
        if value <= 100 {
            Ok(Self(value))
        } else {
            Err(NumericError::InvalidDiscount)
        }
    }

    /// Get the underlying percentage.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// A review rating (1-5 stars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Validate a client-supplied rating.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::InvalidRating`] unless the value is 1-5.
    pub const fn parse(value: u8) -> Result<Self, NumericError> {
        if matches!(value, 1..=5) {
            Ok(Self(value))
        } else {
            Err(NumericError::InvalidRating)
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// A stock or order quantity (>= 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    /// Validate a client-supplied quantity.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::InvalidQuantity`] for negative values.
    pub const fn parse(value: i64) -> Result<Self, NumericError> {
        if value >= 0 {
            Ok(Self(value))
        } else {
            Err(NumericError::InvalidQuantity)
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_positive_only() {
        assert!(Price::parse(0.01).is_ok());
        assert!(Price::parse(199.99).is_ok());
        assert_eq!(Price::parse(0.0), Err(NumericError::InvalidPrice));
        assert_eq!(Price::parse(-5.0), Err(NumericError::InvalidPrice));
        assert_eq!(Price::parse(f64::NAN), Err(NumericError::InvalidPrice));
        assert_eq!(Price::parse(f64::INFINITY), Err(NumericError::InvalidPrice));
    }

    #[test]
    fn test_discount_range() {
        assert!(Discount::parse(0).is_ok());
        assert!(Discount::parse(100).is_ok());
        assert_eq!(Discount::parse(101), Err(NumericError::InvalidDiscount));
    }

    #[test]
    fn test_rating_range() {
        assert_eq!(Rating::parse(0), Err(NumericError::InvalidRating));
        assert!(Rating::parse(1).is_ok());
        assert!(Rating::parse(5).is_ok());
        assert_eq!(Rating::parse(6), Err(NumericError::InvalidRating));
    }

    #[test]
    fn test_quantity_non_negative() {
        assert!(Quantity::parse(0).is_ok());
        assert!(Quantity::parse(250).is_ok());
        assert_eq!(Quantity::parse(-1), Err(NumericError::InvalidQuantity));
    }

    #[test]
    fn test_serde_transparent() {
        let price = Price::parse(12.5).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "12.5");

        let rating: Rating = serde_json::from_str("4").unwrap();
        assert_eq!(rating.get(), 4);
    }
}

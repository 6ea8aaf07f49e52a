//! Static coupon table and code lookup.
//!
//! Coupons are a fixed in-memory table; lookup is a local operation, so there
//! is nothing to retry. At most one coupon is applied to a checkout at a time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a coupon's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// `value` percent off the subtotal.
    Percentage,
    /// `value` currency units off the subtotal.
    Fixed,
}

/// A discount code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
}

/// Errors from [`Coupon::lookup`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Please enter a coupon code")]
    Empty,
    #[error("Invalid coupon code: {0}")]
    Unknown(String),
}

/// `(code, kind, value)` rows of the coupon table.
const COUPONS: &[(&str, CouponKind, i64)] = &[
    ("WELCOME10", CouponKind::Percentage, 10),
    ("MAISON15", CouponKind::Percentage, 15),
    ("FLAT200", CouponKind::Fixed, 200),
    ("FRAGRANCE500", CouponKind::Fixed, 500),
];

impl Coupon {
    /// Find a coupon by user input. The input is trimmed and uppercased.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::Empty` for blank input and
    /// `CouponError::Unknown` when the code is not in the table.
    pub fn lookup(input: &str) -> Result<Self, CouponError> {
        let code = input.trim().to_uppercase();
        if code.is_empty() {
            return Err(CouponError::Empty);
        }

        COUPONS
            .iter()
            .find(|(known, _, _)| *known == code)
            .map(|&(known, kind, value)| Self {
                code: known.to_string(),
                kind,
                value: Decimal::from(value),
            })
            .ok_or(CouponError::Unknown(code))
    }

    /// Short description for the order summary, e.g. "10% off" or "₹200 off".
    #[must_use]
    pub fn describe(&self) -> String {
        match self.kind {
            CouponKind::Percentage => format!("{}% off", self.value.normalize()),
            CouponKind::Fixed => format!("₹{} off", self.value.normalize()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_normalizes_input() {
        let coupon = Coupon::lookup("  welcome10 ").unwrap();
        assert_eq!(coupon.code, "WELCOME10");
        assert_eq!(coupon.kind, CouponKind::Percentage);
        assert_eq!(coupon.value, Decimal::from(10));
    }

    #[test]
    fn test_lookup_fixed() {
        let coupon = Coupon::lookup("FLAT200").unwrap();
        assert_eq!(coupon.kind, CouponKind::Fixed);
        assert_eq!(coupon.describe(), "₹200 off");
    }

    #[test]
    fn test_lookup_unknown() {
        assert_eq!(
            Coupon::lookup("bogus"),
            Err(CouponError::Unknown("BOGUS".to_string()))
        );
    }

    #[test]
    fn test_lookup_empty() {
        assert_eq!(Coupon::lookup("   "), Err(CouponError::Empty));
    }

    #[test]
    fn test_describe_percentage() {
        assert_eq!(Coupon::lookup("MAISON15").unwrap().describe(), "15% off");
    }
}

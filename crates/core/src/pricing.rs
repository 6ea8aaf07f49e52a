//! Subtotal, discount, shipping, tax, and total calculation.
//!
//! All amounts are in major currency units (rupees):
//!
//! ```text
//! subtotal   = Σ price × quantity
//! discount   = round(subtotal × pct / 100)      percentage coupon
//!            = min(value, subtotal)             fixed coupon
//! discounted = subtotal − discount
//! shipping   = 0 if discounted ≥ 2500 else 150
//! tax        = round(discounted × 0.18)
//! total      = discounted + shipping + tax
//! ```
//!
//! The cash-on-delivery handling fee is not part of [`Totals::total`]; it is
//! added by [`Totals::payable`] wherever the payment method is known.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::checkout::PaymentMethod;
use crate::coupon::{Coupon, CouponKind};
use crate::types::round_currency;

/// Discounted subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(2500, 0, 0, false, 0);

/// Shipping charged below the free-shipping threshold.
pub const FLAT_SHIPPING: Decimal = Decimal::from_parts(150, 0, 0, false, 0);

/// GST applied to the discounted subtotal (18%).
pub const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Handling fee added for cash on delivery.
pub const COD_FEE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Order totals before any payment-method surcharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Subtotal after the coupon discount.
    #[must_use]
    pub fn discounted_subtotal(&self) -> Decimal {
        self.subtotal - self.discount
    }

    /// Fee charged on top of `total` for the given payment method.
    #[must_use]
    pub fn surcharge(&self, method: PaymentMethod) -> Decimal {
        if method.is_cod() { COD_FEE } else { Decimal::ZERO }
    }

    /// Amount the shopper actually pays with the given method.
    #[must_use]
    pub fn payable(&self, method: PaymentMethod) -> Decimal {
        self.total + self.surcharge(method)
    }

    /// How much more the shopper must add to unlock free shipping.
    #[must_use]
    pub fn remaining_for_free_shipping(&self) -> Decimal {
        (FREE_SHIPPING_THRESHOLD - self.discounted_subtotal()).max(Decimal::ZERO)
    }
}

/// Compute order totals for a set of cart items and an optional coupon.
#[must_use]
pub fn calculate_totals(items: &[CartItem], coupon: Option<&Coupon>) -> Totals {
    let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();

    let discount = coupon.map_or(Decimal::ZERO, |coupon| match coupon.kind {
        CouponKind::Percentage => {
            round_currency(subtotal * coupon.value / Decimal::ONE_HUNDRED).min(subtotal)
        }
        CouponKind::Fixed => coupon.value.min(subtotal),
    });
    let discount = discount.max(Decimal::ZERO);

    let discounted = subtotal - discount;
    let shipping = if discounted >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING
    };
    let tax = round_currency(discounted * TAX_RATE);

    Totals {
        subtotal,
        discount,
        shipping,
        tax,
        total: discounted + shipping + tax,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{ProductId, VariantId};

    fn line(price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(format!("prod_{price}")),
            variant_id: Some(VariantId::new(format!("variant_{price}"))),
            handle: "candle".to_string(),
            name: "Candle".to_string(),
            variant_title: None,
            price: Decimal::from(price),
            quantity,
            image: None,
        }
    }

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_empty_cart_still_charges_flat_shipping() {
        let totals = calculate_totals(&[], None);
        assert_eq!(
            totals,
            Totals {
                subtotal: dec(0),
                discount: dec(0),
                shipping: dec(150),
                tax: dec(0),
                total: dec(150),
            }
        );
    }

    #[test]
    fn test_free_shipping_boundary_is_inclusive() {
        let totals = calculate_totals(&[line(2500, 1)], None);
        assert_eq!(totals.shipping, dec(0));
        assert_eq!(totals.tax, dec(450));
        assert_eq!(totals.total, dec(2950));

        let below = calculate_totals(&[line(2499, 1)], None);
        assert_eq!(below.shipping, dec(150));
    }

    #[test]
    fn test_percentage_coupon() {
        let coupon = Coupon::lookup("WELCOME10").unwrap();
        let totals = calculate_totals(&[line(500, 2)], Some(&coupon));

        assert_eq!(totals.subtotal, dec(1000));
        assert_eq!(totals.discount, dec(100));
        assert_eq!(totals.shipping, dec(150));
        assert_eq!(totals.tax, dec(162));
        assert_eq!(totals.total, dec(1212));
    }

    #[test]
    fn test_percentage_discount_rounds_half_up() {
        let coupon = Coupon::lookup("WELCOME10").unwrap();
        let totals = calculate_totals(&[line(1005, 1)], Some(&coupon));
        assert_eq!(totals.discount, dec(101));
    }

    #[test]
    fn test_fixed_coupon_is_clamped_to_subtotal() {
        let coupon = Coupon::lookup("FRAGRANCE500").unwrap();
        let totals = calculate_totals(&[line(300, 1)], Some(&coupon));

        assert_eq!(totals.discount, dec(300));
        assert_eq!(totals.discounted_subtotal(), dec(0));
        assert_eq!(totals.tax, dec(0));
        assert_eq!(totals.total, dec(150));
        assert!(totals.total >= Decimal::ZERO);
    }

    #[test]
    fn test_threshold_uses_discounted_subtotal() {
        let coupon = Coupon::lookup("FLAT200").unwrap();
        let totals = calculate_totals(&[line(2600, 1)], Some(&coupon));

        assert_eq!(totals.discounted_subtotal(), dec(2400));
        assert_eq!(totals.shipping, dec(150));
        assert_eq!(totals.remaining_for_free_shipping(), dec(100));
    }

    #[test]
    fn test_tax_rounding() {
        // 18% of 999 = 179.82
        let totals = calculate_totals(&[line(999, 1)], None);
        assert_eq!(totals.tax, dec(180));
    }

    #[test]
    fn test_cod_fee_is_outside_total() {
        let totals = calculate_totals(&[line(1000, 1)], None);
        assert_eq!(totals.total, dec(1330));
        assert_eq!(totals.payable(PaymentMethod::CashOnDelivery), dec(1380));
        assert_eq!(totals.payable(PaymentMethod::Upi), dec(1330));
    }
}

//! The three-step checkout: Shipping → Payment → Review.
//!
//! Steps move forward only through [`Checkout::advance`], which enforces the
//! guard of the step being left. Going back is always allowed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::address::ShippingDetails;
use crate::address::SavedAddress;
use crate::coupon::{Coupon, CouponError};
use crate::types::AddressId;
use crate::validation::{self, ValidationErrors};

// =============================================================================
// Steps
// =============================================================================

/// A checkout step, numbered as shown to the shopper.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Shipping = 1,
    Payment = 2,
    Review = 3,
}

impl CheckoutStep {
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Review => "Review",
        }
    }

    /// URL path of the step page.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Shipping => "/checkout/shipping",
            Self::Payment => "/checkout/payment",
            Self::Review => "/checkout/review",
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Shipping => Some(Self::Payment),
            Self::Payment => Some(Self::Review),
            Self::Review => None,
        }
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Shipping => None,
            Self::Payment => Some(Self::Shipping),
            Self::Review => Some(Self::Payment),
        }
    }

    pub const ALL: [Self; 3] = [Self::Shipping, Self::Payment, Self::Review];
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Payment methods
// =============================================================================

/// How the shopper intends to pay.
///
/// Everything except cash on delivery is collected by the hosted payment
/// widget, so no method-specific fields are captured here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Upi,
    NetBanking,
    Wallet,
    CashOnDelivery,
}

impl PaymentMethod {
    pub const ALL: [Self; 5] = [
        Self::Card,
        Self::Upi,
        Self::NetBanking,
        Self::Wallet,
        Self::CashOnDelivery,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::NetBanking => "netbanking",
            Self::Wallet => "wallet",
            Self::CashOnDelivery => "cod",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Card => "Credit / Debit Card",
            Self::Upi => "UPI",
            Self::NetBanking => "Net Banking",
            Self::Wallet => "Wallet",
            Self::CashOnDelivery => "Cash on Delivery",
        }
    }

    #[must_use]
    pub const fn is_cod(self) -> bool {
        matches!(self, Self::CashOnDelivery)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "netbanking" | "net_banking" => Ok(Self::NetBanking),
            "wallet" => Ok(Self::Wallet),
            "cod" | "cash_on_delivery" => Ok(Self::CashOnDelivery),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

// =============================================================================
// Checkout state
// =============================================================================

/// Checkout state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("Cannot skip ahead from {from} to {to}")]
    ForwardJump {
        from: CheckoutStep,
        to: CheckoutStep,
    },
    #[error("Checkout is already on the last step")]
    AlreadyOnReview,
}

/// Everything the shopper has entered so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    pub step: CheckoutStep,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub selected_address_id: Option<AddressId>,
    #[serde(default)]
    pub shipping: ShippingDetails,
    #[serde(default = "default_true")]
    pub billing_same_as_shipping: bool,
    #[serde(default)]
    pub billing: Option<ShippingDetails>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub coupon: Option<Coupon>,
}

const fn default_true() -> bool {
    true
}

impl Default for Checkout {
    fn default() -> Self {
        Self {
            step: CheckoutStep::Shipping,
            email: String::new(),
            selected_address_id: None,
            shipping: ShippingDetails::default(),
            billing_same_as_shipping: true,
            billing: None,
            payment_method: None,
            coupon: None,
        }
    }
}

impl Checkout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a saved address, binding its fields as the shipping details.
    pub fn select_address(&mut self, address: &SavedAddress) {
        self.selected_address_id = Some(address.id.clone());
        self.shipping = address.details();
    }

    /// Forget the selected address if it was the one deleted.
    pub fn forget_address(&mut self, id: &AddressId) {
        if self.selected_address_id.as_ref() == Some(id) {
            self.selected_address_id = None;
            self.shipping = ShippingDetails::default();
        }
    }

    /// Address used for billing.
    #[must_use]
    pub fn billing_details(&self) -> &ShippingDetails {
        if self.billing_same_as_shipping {
            &self.shipping
        } else {
            self.billing.as_ref().unwrap_or(&self.shipping)
        }
    }

    /// Guard for leaving the Shipping step.
    #[must_use]
    pub fn validate_shipping(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check("email", validation::email(&self.email));
        if self.selected_address_id.is_none() {
            errors.add("address", "Please select a shipping address");
        }
        for (field, message) in self.shipping.validate().iter() {
            errors.add(field, message);
        }
        if !self.billing_same_as_shipping {
            match &self.billing {
                Some(billing) => {
                    for (field, message) in billing.validate().iter() {
                        errors.add(billing_field(field), message);
                    }
                }
                None => errors.add("billing", "Please enter a billing address"),
            }
        }
        errors
    }

    /// Guard for leaving the Payment step.
    #[must_use]
    pub fn validate_payment(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.payment_method.is_none() {
            errors.add("payment_method", "Please select a payment method");
        }
        errors
    }

    /// Move to the next step if the current step's guard holds.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` with the failing fields, or
    /// `CheckoutError::AlreadyOnReview` on the last step.
    pub fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        let errors = match self.step {
            CheckoutStep::Shipping => self.validate_shipping(),
            CheckoutStep::Payment => self.validate_payment(),
            CheckoutStep::Review => return Err(CheckoutError::AlreadyOnReview),
        };
        errors.into_result().map_err(CheckoutError::Validation)?;

        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Go back one step. Stays put on Shipping.
    pub fn back(&mut self) -> CheckoutStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Jump to an earlier (or the current) step.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::ForwardJump` when `step` is ahead of the
    /// current step.
    pub fn go_to(&mut self, step: CheckoutStep) -> Result<CheckoutStep, CheckoutError> {
        if step > self.step {
            return Err(CheckoutError::ForwardJump {
                from: self.step,
                to: step,
            });
        }
        self.step = step;
        Ok(step)
    }

    /// Apply a coupon code, replacing any coupon already applied.
    ///
    /// An invalid code leaves the current coupon in place.
    ///
    /// # Errors
    ///
    /// Returns the lookup error for blank or unknown codes.
    pub fn apply_coupon(&mut self, code: &str) -> Result<&Coupon, CouponError> {
        let coupon = Coupon::lookup(code)?;
        Ok(self.coupon.insert(coupon))
    }

    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        self.coupon.take()
    }

    /// On Review with every earlier guard still satisfied.
    #[must_use]
    pub fn is_ready_to_place(&self) -> bool {
        self.step == CheckoutStep::Review
            && self.validate_shipping().is_empty()
            && self.validate_payment().is_empty()
    }
}

fn billing_field(field: &str) -> &'static str {
    match field {
        "name" => "billing_name",
        "address_line1" => "billing_address_line1",
        "city" => "billing_city",
        "state" => "billing_state",
        "pincode" => "billing_pincode",
        "phone" => "billing_phone",
        _ => "billing",
    }
}

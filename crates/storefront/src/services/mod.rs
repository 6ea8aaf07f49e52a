//! Business logic services for storefront.
//!
//! # Services
//!
//! - `shopper` - Typed cart, Ledger, address and checkout state in the session
//! - `checkout` - Order placement and payment verification

pub mod checkout;
pub mod shopper;

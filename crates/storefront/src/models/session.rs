//! Session-related types.
//!
//! The session is the shopper's identity: there are no accounts, so the cart,
//! the Ledger, saved addresses and in-progress checkout all live here.

use serde::{Deserialize, Serialize};

use maison_core::cart::CartItem;
use maison_core::checkout::Checkout;
use maison_core::pricing::calculate_totals;
use maison_core::{OrderNumber, to_minor_units};

/// A gateway order waiting for the browser widget to report back.
///
/// Holds the cart lines and checkout the shopper is paying for. Completion
/// uses this snapshot, never the live session cart, which stays editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub order_number: OrderNumber,
    pub razorpay_order_id: String,
    /// Amount the gateway order was created for, in paise.
    pub amount_paise: i64,
    pub items: Vec<CartItem>,
    pub checkout: Checkout,
}

impl PendingPayment {
    /// Whether this payment was started for exactly these lines and checkout.
    #[must_use]
    pub fn covers(&self, items: &[CartItem], checkout: &Checkout) -> bool {
        self.items == items && self.checkout == *checkout
    }

    /// What the snapshot costs, in paise. `None` without a payment method.
    #[must_use]
    pub fn expected_paise(&self) -> Option<i64> {
        let method = self.checkout.payment_method?;
        let totals = calculate_totals(&self.items, self.checkout.coupon.as_ref());
        to_minor_units(totals.payable(method))
    }
}

/// Maximum order numbers remembered per session.
pub const ORDER_HISTORY_LIMIT: usize = 20;

/// Session keys for shopper state.
pub mod keys {
    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for the Ledger (saved items).
    pub const LEDGER: &str = "ledger";

    /// Key for saved shipping addresses.
    pub const ADDRESSES: &str = "addresses";

    /// Key for in-progress checkout state.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the gateway order awaiting verification.
    pub const PENDING_PAYMENT: &str = "pending_payment";

    /// Key for order numbers placed from this session, newest first.
    pub const ORDER_HISTORY: &str = "order_history";
}

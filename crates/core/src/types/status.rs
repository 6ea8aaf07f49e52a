//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Lifecycle of a storefront order record.
///
/// ```text
/// PendingPayment -> PaymentVerified -> Placed
/// PendingPayment -> Failed
/// PaymentVerified -> Failed
/// (cash on delivery) -> Placed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Gateway order created, waiting for the shopper to pay.
    #[default]
    PendingPayment,
    /// Gateway signature checked, commerce order not yet completed.
    PaymentVerified,
    /// Commerce backend accepted the order.
    Placed,
    /// The flow was abandoned after an upstream failure.
    Failed,
}

impl OrderStatus {
    /// Whether the order has reached a final state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Placed | Self::Failed)
    }

    /// Human-readable label for order history pages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PendingPayment => "Awaiting payment",
            Self::PaymentVerified => "Payment received",
            Self::Placed => "Placed",
            Self::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingPayment => write!(f, "pending_payment"),
            Self::PaymentVerified => write!(f, "payment_verified"),
            Self::Placed => write!(f, "placed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_payment" => Ok(Self::PendingPayment),
            "payment_verified" => Ok(Self::PaymentVerified),
            "placed" => Ok(Self::Placed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_from_str_agree() {
        for status in [
            OrderStatus::PendingPayment,
            OrderStatus::PaymentVerified,
            OrderStatus::Placed,
            OrderStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&OrderStatus::PaymentVerified).unwrap();
        assert_eq!(json, "\"payment_verified\"");
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Placed.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(!OrderStatus::PendingPayment.is_terminal());
        assert!(!OrderStatus::PaymentVerified.is_terminal());
    }
}

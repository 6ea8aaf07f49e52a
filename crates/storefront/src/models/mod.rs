//! Domain models for storefront.

pub mod session;

pub use session::{ORDER_HISTORY_LIMIT, PendingPayment, keys as session_keys};

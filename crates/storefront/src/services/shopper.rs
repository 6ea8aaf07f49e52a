//! Typed access to shopper state in the session.
//!
//! The session is the single owner of the cart, Ledger, saved addresses and
//! checkout progress. A value that no longer deserializes (for example after
//! a field was renamed) is discarded with a warning and treated as empty.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use maison_core::OrderNumber;
use maison_core::address::AddressBook;
use maison_core::cart::Cart;
use maison_core::checkout::Checkout;
use maison_core::ledger::Ledger;

use crate::models::{ORDER_HISTORY_LIMIT, PendingPayment, session_keys};

async fn load<T: DeserializeOwned + Default>(
    session: &Session,
    key: &str,
) -> Result<T, SessionError> {
    match session.get::<T>(key).await {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(SessionError::SerdeJson(e)) => {
            tracing::warn!(key, error = %e, "Discarding unreadable session value");
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

async fn save<T: Serialize + Sync>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), SessionError> {
    session.insert(key, value).await
}

// =============================================================================
// Cart
// =============================================================================

/// The shopper's cart. Empty when none has been stored.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn cart(session: &Session) -> Result<Cart, SessionError> {
    load(session, session_keys::CART).await
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), SessionError> {
    save(session, session_keys::CART, cart).await
}

// =============================================================================
// Ledger
// =============================================================================

/// The shopper's Ledger.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn ledger(session: &Session) -> Result<Ledger, SessionError> {
    load(session, session_keys::LEDGER).await
}

/// Persist the Ledger.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_ledger(session: &Session, ledger: &Ledger) -> Result<(), SessionError> {
    save(session, session_keys::LEDGER, ledger).await
}

// =============================================================================
// Addresses and checkout
// =============================================================================

/// Saved shipping addresses.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn addresses(session: &Session) -> Result<AddressBook, SessionError> {
    load(session, session_keys::ADDRESSES).await
}

/// Persist saved addresses.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_addresses(session: &Session, book: &AddressBook) -> Result<(), SessionError> {
    save(session, session_keys::ADDRESSES, book).await
}

/// In-progress checkout.
///
/// A fresh checkout preselects the default saved address, so a returning
/// shopper lands on Shipping with an address already bound.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn checkout(session: &Session) -> Result<Checkout, SessionError> {
    if let Some(checkout) = load::<Option<Checkout>>(session, session_keys::CHECKOUT).await? {
        return Ok(checkout);
    }

    let mut checkout = Checkout::new();
    if let Some(address) = addresses(session).await?.preselected() {
        checkout.select_address(address);
    }
    Ok(checkout)
}

/// Persist checkout progress.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_checkout(session: &Session, checkout: &Checkout) -> Result<(), SessionError> {
    save(session, session_keys::CHECKOUT, checkout).await
}

// =============================================================================
// Payment and order history
// =============================================================================

/// The gateway order awaiting verification, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn pending_payment(session: &Session) -> Result<Option<PendingPayment>, SessionError> {
    load(session, session_keys::PENDING_PAYMENT).await
}

/// Remember the gateway order the widget is paying against.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_pending_payment(
    session: &Session,
    pending: &PendingPayment,
) -> Result<(), SessionError> {
    save(session, session_keys::PENDING_PAYMENT, pending).await
}

/// Order numbers placed from this session, newest first.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn order_history(session: &Session) -> Result<Vec<OrderNumber>, SessionError> {
    load(session, session_keys::ORDER_HISTORY).await
}

/// Whether `number` was placed from this session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn owns_order(session: &Session, number: &OrderNumber) -> Result<bool, SessionError> {
    Ok(order_history(session).await?.contains(number))
}

/// Clear the cart, checkout and pending payment after a successful order and
/// record the order number at the head of the history.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn finish_order(session: &Session, number: &OrderNumber) -> Result<(), SessionError> {
    save_cart(session, &Cart::new()).await?;
    session.remove_value(session_keys::CHECKOUT).await?;
    session.remove_value(session_keys::PENDING_PAYMENT).await?;

    let mut history = order_history(session).await?;
    history.retain(|existing| existing != number);
    history.insert(0, number.clone());
    history.truncate(ORDER_HISTORY_LIMIT);
    save(session, session_keys::ORDER_HISTORY, &history).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use maison_core::ProductId;
    use maison_core::address::{AddressLabel, ShippingDetails};
    use maison_core::cart::CartItem;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn item(id: &str) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            variant_id: None,
            handle: id.to_string(),
            name: "Oud Candle".to_string(),
            variant_title: None,
            price: Decimal::from(1200),
            quantity: 1,
            image: None,
        }
    }

    fn details() -> ShippingDetails {
        ShippingDetails {
            name: "Asha Rao".to_string(),
            address_line1: "12 Residency Road".to_string(),
            address_line2: String::new(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560025".to_string(),
            phone: "9876543210".to_string(),
        }
    }

    #[tokio::test]
    async fn test_cart_defaults_to_empty() {
        let session = session();
        assert!(cart(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cart_round_trips_through_session() {
        let session = session();
        let mut stored = Cart::new();
        stored.add(item("prod_1"));
        save_cart(&session, &stored).await.unwrap();

        assert_eq!(cart(&session).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_unreadable_value_is_treated_as_empty() {
        let session = session();
        session.insert(session_keys::CART, "not a cart").await.unwrap();

        assert!(cart(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fresh_checkout_preselects_default_address() {
        let session = session();
        let mut book = AddressBook::default();
        let id = book.add(&details(), AddressLabel::Home).unwrap();
        save_addresses(&session, &book).await.unwrap();

        let checkout = checkout(&session).await.unwrap();
        assert_eq!(checkout.selected_address_id, Some(id));
        assert_eq!(checkout.shipping.city, "Bengaluru");
    }

    #[tokio::test]
    async fn test_finish_order_clears_state_and_records_history() {
        let session = session();
        let mut stored = Cart::new();
        stored.add(item("prod_1"));
        save_cart(&session, &stored).await.unwrap();
        save_checkout(&session, &Checkout::new()).await.unwrap();

        let number = OrderNumber::new("MSN-00000001");
        finish_order(&session, &number).await.unwrap();

        assert!(cart(&session).await.unwrap().is_empty());
        assert!(pending_payment(&session).await.unwrap().is_none());
        assert_eq!(order_history(&session).await.unwrap(), vec![number.clone()]);
        assert!(owns_order(&session, &number).await.unwrap());
    }

    #[tokio::test]
    async fn test_order_history_is_capped_newest_first() {
        let session = session();
        for i in 0..25 {
            finish_order(&session, &OrderNumber::new(format!("MSN-{i:08}")))
                .await
                .unwrap();
        }

        let history = order_history(&session).await.unwrap();
        assert_eq!(history.len(), ORDER_HISTORY_LIMIT);
        assert_eq!(history.first().unwrap().as_str(), "MSN-00000024");
        assert!(!history.contains(&OrderNumber::new("MSN-00000000")));
    }
}

//! Order placement.
//!
//! Turns a ready checkout into an order:
//!
//! ```text
//! Cash on delivery:  mirror cart to Medusa -> complete -> record Placed
//! Online payment:    create Razorpay order -> record PendingPayment -> widget
//!                    verify signature -> PaymentVerified -> mirror -> complete -> Placed
//! ```
//!
//! The session cart is only cleared once the backend has accepted the order.
//! Nothing is retried automatically; the shopper re-invokes the action.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use maison_core::cart::{Cart, CartItem};
use maison_core::checkout::{Checkout, PaymentMethod};
use maison_core::pricing::{Totals, calculate_totals};
use maison_core::validation::ValidationErrors;
use maison_core::{OrderNumber, OrderStatus, to_minor_units};

use crate::db::{NewOrder, OrderRepository};
use crate::error::{AppError, add_breadcrumb, set_sentry_shopper};
use crate::medusa::{CompletedOrder, MedusaClient, MedusaError, StoreAddress};
use crate::models::PendingPayment;
use crate::services::shopper;
use crate::state::AppState;

/// Currency every order is charged in.
const CURRENCY: &str = "INR";

/// What the browser should do after "Place order".
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlaceOrderOutcome {
    /// The order is placed; go to the confirmation page.
    Placed {
        order_number: OrderNumber,
        redirect_url: String,
    },
    /// Open the payment widget with these parameters.
    AwaitingPayment(PaymentRequest),
}

/// Parameters for the Razorpay Checkout widget.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub key_id: String,
    pub razorpay_order_id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
    pub order_number: OrderNumber,
    pub store_name: String,
    pub description: String,
    pub prefill: Prefill,
}

/// Shopper details the widget pre-fills.
#[derive(Debug, Clone, Serialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// Values the widget hands back after a successful payment.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfirmation {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Place the order for the session's cart and checkout.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an empty cart, `AppError::Validation`
/// when the checkout is no longer ready, or the upstream error that halted
/// placement.
#[instrument(skip(state, session))]
pub async fn place_order(state: &AppState, session: &Session) -> Result<PlaceOrderOutcome, AppError> {
    let cart = shopper::cart(session).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Your bag is empty".to_string()));
    }

    let checkout = shopper::checkout(session).await?;
    let method = ready_payment_method(&checkout)?;
    let totals = calculate_totals(cart.items(), checkout.coupon.as_ref());
    let order_number = OrderNumber::generate();

    set_sentry_shopper(&checkout.email);
    add_breadcrumb(
        "checkout",
        "Placing order",
        Some(&[
            ("order_number", order_number.as_str()),
            ("payment_method", method.as_str()),
        ]),
    );

    if method.is_cod() {
        place_cash_on_delivery(state, session, &cart, &checkout, &totals, &order_number).await
    } else {
        start_online_payment(state, session, &cart, &checkout, method, &totals, &order_number).await
    }
}

/// Verify the widget's payment and complete the order.
///
/// The backend order is built from the lines captured when the payment
/// started, so cart edits made while the widget was open are not shipped.
/// A failure after the signature check leaves the order `PaymentVerified`
/// and the pending payment in the session, so calling this again completes
/// the same order.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when no matching payment is pending,
/// `RazorpayError::InvalidSignature` for a forged callback, or the upstream
/// error that halted completion.
#[instrument(skip(state, session, confirmation), fields(razorpay_order_id = %confirmation.razorpay_order_id))]
pub async fn verify_payment(
    state: &AppState,
    session: &Session,
    confirmation: &PaymentConfirmation,
) -> Result<OrderNumber, AppError> {
    let pending = shopper::pending_payment(session)
        .await?
        .ok_or_else(|| AppError::BadRequest("No payment is in progress".to_string()))?;

    if pending.razorpay_order_id != confirmation.razorpay_order_id {
        return Err(AppError::BadRequest(
            "This payment does not belong to your checkout".to_string(),
        ));
    }

    let (items, checkout) = paid_snapshot(&pending)?;
    let orders = OrderRepository::new(state.pool());

    if let Err(e) = state.razorpay().verify_payment_signature(
        &confirmation.razorpay_order_id,
        &confirmation.razorpay_payment_id,
        &confirmation.razorpay_signature,
    ) {
        tracing::warn!(order_number = %pending.order_number, "Payment signature mismatch");
        orders
            .mark_failed(&pending.order_number, "payment signature mismatch")
            .await?;
        return Err(e.into());
    }

    orders
        .mark_payment_verified(&pending.order_number, &confirmation.razorpay_payment_id)
        .await?;
    add_breadcrumb(
        "checkout",
        "Payment verified",
        Some(&[("order_number", pending.order_number.as_str())]),
    );

    let completed = mirror_and_complete(state.medusa(), items, checkout)
        .await
        .inspect_err(|e| {
            tracing::error!(
                order_number = %pending.order_number,
                error = %e,
                "Paid order could not be completed"
            );
        })?;

    shopper::finish_order(session, &pending.order_number).await?;
    orders
        .mark_placed(&pending.order_number, &completed.id, completed.display_id)
        .await?;

    tracing::info!(
        order_number = %pending.order_number,
        medusa_order_id = %completed.id,
        "Order placed"
    );
    Ok(pending.order_number)
}

/// The selected payment method, once every step's guard holds.
fn ready_payment_method(checkout: &Checkout) -> Result<PaymentMethod, AppError> {
    let mut errors = ValidationErrors::new();
    for (field, message) in checkout.validate_shipping().iter() {
        errors.add(field, message);
    }
    for (field, message) in checkout.validate_payment().iter() {
        errors.add(field, message);
    }
    errors.into_result()?;

    if !checkout.is_ready_to_place() {
        return Err(AppError::BadRequest(
            "Please review your order before placing it".to_string(),
        ));
    }

    checkout
        .payment_method
        .ok_or_else(|| AppError::BadRequest("Please select a payment method".to_string()))
}

/// The lines and checkout a pending payment pays for.
///
/// Refuses a snapshot whose recomputed amount differs from what the gateway
/// order was created for.
fn paid_snapshot(pending: &PendingPayment) -> Result<(&[CartItem], &Checkout), AppError> {
    if pending.items.is_empty() {
        return Err(AppError::BadRequest("Your bag is empty".to_string()));
    }
    if pending.expected_paise() != Some(pending.amount_paise) {
        return Err(AppError::Internal(format!(
            "pending payment for {} no longer matches its amount",
            pending.order_number
        )));
    }
    Ok((&pending.items, &pending.checkout))
}

async fn place_cash_on_delivery(
    state: &AppState,
    session: &Session,
    cart: &Cart,
    checkout: &Checkout,
    totals: &Totals,
    order_number: &OrderNumber,
) -> Result<PlaceOrderOutcome, AppError> {
    let completed = mirror_and_complete(state.medusa(), cart.items(), checkout).await?;

    // The backend owns the order from here; never leave a cart that could be
    // submitted twice.
    let recorded = async {
        shopper::finish_order(session, order_number).await?;

        let orders = OrderRepository::new(state.pool());
        let new_order = new_order(
            order_number,
            cart,
            checkout,
            PaymentMethod::CashOnDelivery,
            OrderStatus::Placed,
            totals,
            None,
        );
        orders.insert(&new_order).await?;
        orders
            .mark_placed(order_number, &completed.id, completed.display_id)
            .await?;
        Ok::<_, AppError>(())
    }
    .await;

    if let Err(e) = recorded {
        tracing::error!(
            order_number = %order_number,
            medusa_order_id = %completed.id,
            error = %e,
            "Placed order could not be recorded"
        );
        return Err(e);
    }

    tracing::info!(
        order_number = %order_number,
        medusa_order_id = %completed.id,
        "Cash on delivery order placed"
    );

    Ok(PlaceOrderOutcome::Placed {
        order_number: order_number.clone(),
        redirect_url: confirmation_url(order_number),
    })
}

async fn start_online_payment(
    state: &AppState,
    session: &Session,
    cart: &Cart,
    checkout: &Checkout,
    method: PaymentMethod,
    totals: &Totals,
    order_number: &OrderNumber,
) -> Result<PlaceOrderOutcome, AppError> {
    let payable = totals.payable(method);
    let amount_paise = to_minor_units(payable)
        .ok_or_else(|| AppError::Internal(format!("order amount {payable} out of range")))?;

    // Placing again with nothing changed reopens the same gateway order.
    let previous = shopper::pending_payment(session).await?;
    if let Some(pending) = previous
        .as_ref()
        .filter(|p| p.amount_paise == amount_paise && p.covers(cart.items(), checkout))
    {
        tracing::info!(order_number = %pending.order_number, "Reusing pending payment");
        return Ok(PlaceOrderOutcome::AwaitingPayment(payment_request(
            state,
            pending,
            CURRENCY.to_string(),
        )));
    }

    let notes = serde_json::json!({
        "order_number": order_number.as_str(),
        "email": checkout.email,
        "payment_method": method.as_str(),
    });
    let gateway_order = state
        .razorpay()
        .create_order(amount_paise, CURRENCY, order_number.as_str(), &notes)
        .await?;

    let orders = OrderRepository::new(state.pool());
    let new_order = new_order(
        order_number,
        cart,
        checkout,
        method,
        OrderStatus::PendingPayment,
        totals,
        Some(&gateway_order.id),
    );
    orders.insert(&new_order).await?;

    let pending = PendingPayment {
        order_number: order_number.clone(),
        razorpay_order_id: gateway_order.id,
        amount_paise: gateway_order.amount,
        items: cart.items().to_vec(),
        checkout: checkout.clone(),
    };
    shopper::set_pending_payment(session, &pending).await?;

    if let Some(previous) = previous {
        let reason = format!("replaced by {order_number}");
        if let Err(e) = orders.mark_abandoned(&previous.order_number, &reason).await {
            tracing::warn!(
                order_number = %previous.order_number,
                error = %e,
                "Could not mark replaced payment as failed"
            );
        }
    }

    Ok(PlaceOrderOutcome::AwaitingPayment(payment_request(
        state,
        &pending,
        gateway_order.currency,
    )))
}

fn payment_request(state: &AppState, pending: &PendingPayment, currency: String) -> PaymentRequest {
    let checkout = &pending.checkout;
    PaymentRequest {
        key_id: state.razorpay().key_id().to_string(),
        razorpay_order_id: pending.razorpay_order_id.clone(),
        amount: pending.amount_paise,
        currency,
        order_number: pending.order_number.clone(),
        store_name: state.config().store_name.clone(),
        description: format!("Order {}", pending.order_number),
        prefill: Prefill {
            name: checkout.shipping.name.clone(),
            email: checkout.email.clone(),
            contact: checkout.shipping.phone.clone(),
        },
    }
}

fn new_order<'a>(
    order_number: &'a OrderNumber,
    cart: &'a Cart,
    checkout: &'a Checkout,
    payment_method: PaymentMethod,
    status: OrderStatus,
    totals: &'a Totals,
    razorpay_order_id: Option<&'a str>,
) -> NewOrder<'a> {
    NewOrder {
        order_number,
        email: &checkout.email,
        payment_method,
        status,
        totals,
        cod_fee: if payment_method.is_cod() {
            totals.surcharge(payment_method)
        } else {
            Decimal::ZERO
        },
        coupon_code: checkout.coupon.as_ref().map(|c| c.code.as_str()),
        razorpay_order_id,
        shipping_address: &checkout.shipping,
        items: cart.items(),
    }
}

/// Build a backend cart from the session cart and complete it.
///
/// The first offered shipping option is used.
///
/// # Errors
///
/// Returns the first failing backend call's error, or
/// `MedusaError::NoShippingOptions` when the backend offers none.
pub async fn mirror_and_complete(
    medusa: &MedusaClient,
    items: &[CartItem],
    checkout: &Checkout,
) -> Result<CompletedOrder, MedusaError> {
    let cart = medusa.create_cart(Some(&checkout.email)).await?;

    for item in items {
        let variant = item
            .variant_id
            .as_ref()
            .map_or_else(|| item.id.as_str(), |v| v.as_str());
        medusa
            .add_line_item(&cart.id, variant, item.quantity)
            .await?;
    }

    let shipping = StoreAddress::from(&checkout.shipping);
    let billing = StoreAddress::from(checkout.billing_details());
    medusa
        .update_cart(
            &cart.id,
            Some(&checkout.email),
            Some(&shipping),
            Some(&billing),
        )
        .await?;

    let option = medusa
        .list_shipping_options(&cart.id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| MedusaError::NoShippingOptions(cart.id.clone()))?;
    medusa.add_shipping_method(&cart.id, &option.id).await?;

    let collection = medusa.create_payment_collection(&cart.id).await?;
    medusa.create_payment_session(&collection.id).await?;

    medusa.complete_cart(&cart.id).await
}

/// Confirmation page for an order.
#[must_use]
pub fn confirmation_url(order_number: &OrderNumber) -> String {
    format!("/checkout/confirmation/{order_number}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maison_core::ProductId;
    use maison_core::address::{AddressBook, AddressLabel, ShippingDetails};
    use maison_core::checkout::CheckoutStep;

    use super::*;

    fn item(id: &str, price: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            variant_id: None,
            handle: id.to_string(),
            name: "Oud Candle".to_string(),
            variant_title: None,
            price: Decimal::from(price),
            quantity: 1,
            image: None,
        }
    }

    fn pending_for(cart: &Cart, checkout: &Checkout) -> PendingPayment {
        let method = checkout.payment_method.unwrap();
        let totals = calculate_totals(cart.items(), checkout.coupon.as_ref());
        PendingPayment {
            order_number: OrderNumber::new("MSN-00000001"),
            razorpay_order_id: "order_rzp_1".to_string(),
            amount_paise: to_minor_units(totals.payable(method)).unwrap(),
            items: cart.items().to_vec(),
            checkout: checkout.clone(),
        }
    }

    fn ready_checkout(method: PaymentMethod) -> Checkout {
        let mut book = AddressBook::default();
        let details = ShippingDetails {
            name: "Asha Rao".to_string(),
            address_line1: "12 Residency Road".to_string(),
            address_line2: String::new(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560025".to_string(),
            phone: "9876543210".to_string(),
        };
        let id = book.add(&details, AddressLabel::Home).unwrap();

        let mut checkout = Checkout::new();
        checkout.email = "asha@example.com".to_string();
        checkout.select_address(book.get(&id).unwrap());
        checkout.advance().unwrap();
        checkout.payment_method = Some(method);
        checkout.advance().unwrap();
        checkout
    }

    #[test]
    fn test_ready_checkout_yields_method() {
        let checkout = ready_checkout(PaymentMethod::Upi);
        assert_eq!(checkout.step, CheckoutStep::Review);
        assert_eq!(
            ready_payment_method(&checkout).unwrap(),
            PaymentMethod::Upi
        );
    }

    #[test]
    fn test_checkout_not_on_review_is_rejected() {
        let mut checkout = ready_checkout(PaymentMethod::Card);
        checkout.back();
        assert!(matches!(
            ready_payment_method(&checkout),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_invalidated_checkout_reports_fields() {
        let mut checkout = ready_checkout(PaymentMethod::Card);
        checkout.email = "not-an-email".to_string();
        checkout.payment_method = None;

        let Err(AppError::Validation(errors)) = ready_payment_method(&checkout) else {
            panic!("expected validation errors");
        };
        assert!(errors.get("email").is_some());
        assert!(errors.get("payment_method").is_some());
    }

    #[test]
    fn test_cod_fee_only_recorded_for_cod() {
        let checkout = ready_checkout(PaymentMethod::CashOnDelivery);
        let cart = Cart::new();
        let totals = calculate_totals(cart.items(), None);
        let number = OrderNumber::new("MSN-00000001");

        let cod = new_order(
            &number,
            &cart,
            &checkout,
            PaymentMethod::CashOnDelivery,
            OrderStatus::Placed,
            &totals,
            None,
        );
        assert_eq!(cod.cod_fee, Decimal::from(50));

        let card = new_order(
            &number,
            &cart,
            &checkout,
            PaymentMethod::Card,
            OrderStatus::PendingPayment,
            &totals,
            Some("order_1"),
        );
        assert_eq!(card.cod_fee, Decimal::ZERO);
        assert_eq!(card.razorpay_order_id, Some("order_1"));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = PlaceOrderOutcome::Placed {
            order_number: OrderNumber::new("MSN-ABCDEF12"),
            redirect_url: confirmation_url(&OrderNumber::new("MSN-ABCDEF12")),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "placed");
        assert_eq!(json["redirect_url"], "/checkout/confirmation/MSN-ABCDEF12");
    }

    #[test]
    fn test_paid_snapshot_ignores_later_cart_edits() {
        let checkout = ready_checkout(PaymentMethod::Upi);
        let mut cart = Cart::new();
        cart.add(item("prod_1", 1200));
        let pending = pending_for(&cart, &checkout);

        // Shopper keeps shopping in another tab while the widget is open
        cart.add(item("prod_2", 900));
        cart.add(item("prod_1", 1200));

        let (items, snapshot_checkout) = paid_snapshot(&pending).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_str(), "prod_1");
        assert_eq!(items[0].quantity, 1);
        assert_eq!(snapshot_checkout, &checkout);
        assert!(!pending.covers(cart.items(), &checkout));
    }

    #[test]
    fn test_paid_snapshot_rejects_amount_mismatch() {
        let checkout = ready_checkout(PaymentMethod::Card);
        let mut cart = Cart::new();
        cart.add(item("prod_1", 1200));
        let mut pending = pending_for(&cart, &checkout);
        pending.amount_paise += 100;

        assert!(matches!(
            paid_snapshot(&pending),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_paid_snapshot_rejects_empty_snapshot() {
        let checkout = ready_checkout(PaymentMethod::Card);
        let pending = pending_for(&Cart::new(), &checkout);

        assert!(matches!(
            paid_snapshot(&pending),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_pending_payment_covers_unchanged_checkout_only() {
        let mut checkout = ready_checkout(PaymentMethod::Upi);
        let mut cart = Cart::new();
        cart.add(item("prod_1", 1200));
        let pending = pending_for(&cart, &checkout);
        assert!(pending.covers(cart.items(), &checkout));

        checkout.apply_coupon("WELCOME10").unwrap();
        assert!(!pending.covers(cart.items(), &checkout));
    }
}

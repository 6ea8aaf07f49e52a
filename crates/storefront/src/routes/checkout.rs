//! Checkout route handlers.
//!
//! Three steps (Shipping → Payment → Review) rendered as full pages with
//! plain form posts. The order summary coupon box is swapped with HTMX and
//! placement/verification are JSON endpoints driven by `checkout.js`.
//!
//! Every page refuses an empty cart by redirecting to `/cart`, and visiting
//! a step ahead of the current one redirects back to the current step.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use maison_core::address::{AddressBook, AddressError, AddressLabel};
use maison_core::cart::Cart;
use maison_core::checkout::{Checkout, CheckoutStep, PaymentMethod, ShippingDetails};
use maison_core::validation::ValidationErrors;
use maison_core::{AddressId, OrderNumber};

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::filters;
use crate::htmx::{ToastLevel, Triggers, toast};
use crate::middleware::CspNonce;
use crate::routes::views::{Layout, OrderView, SummaryView};
use crate::services::checkout::{
    PaymentConfirmation, PlaceOrderOutcome, confirmation_url, place_order, verify_payment,
};
use crate::services::shopper;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// One entry in the step indicator.
#[derive(Clone)]
pub struct StepView {
    pub number: u8,
    pub label: &'static str,
    pub path: &'static str,
    pub current: bool,
    pub completed: bool,
}

fn step_views(current: CheckoutStep) -> Vec<StepView> {
    CheckoutStep::ALL
        .iter()
        .map(|&step| StepView {
            number: step.number(),
            label: step.label(),
            path: step.path(),
            current: step == current,
            completed: step < current,
        })
        .collect()
}

/// A saved address card.
#[derive(Clone)]
pub struct AddressView {
    pub id: String,
    pub label: &'static str,
    pub name: String,
    pub one_line: String,
    pub phone: String,
    pub is_default: bool,
    pub selected: bool,
}

fn address_views(book: &AddressBook, checkout: &Checkout) -> Vec<AddressView> {
    book.iter()
        .map(|address| AddressView {
            id: address.id.to_string(),
            label: address.label.as_str(),
            name: address.name.clone(),
            one_line: address.details().one_line(),
            phone: address.phone.clone(),
            is_default: address.is_default,
            selected: checkout.selected_address_id.as_ref() == Some(&address.id),
        })
        .collect()
}

/// A payment method radio button.
#[derive(Clone)]
pub struct PaymentMethodView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

// =============================================================================
// Templates
// =============================================================================

/// Step 1: contact and shipping address.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping.html")]
pub struct ShippingTemplate {
    pub layout: Layout,
    pub steps: Vec<StepView>,
    pub email: String,
    pub addresses: Vec<AddressView>,
    pub using_new_address: bool,
    /// Values of the new-address form.
    pub address: ShippingDetails,
    pub label: &'static str,
    pub billing_same_as_shipping: bool,
    pub billing: ShippingDetails,
    pub errors: ValidationErrors,
    pub summary: SummaryView,
}

/// Step 2: payment method.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub layout: Layout,
    pub steps: Vec<StepView>,
    pub ship_to: String,
    pub shipping_line: String,
    pub methods: Vec<PaymentMethodView>,
    pub errors: ValidationErrors,
    pub summary: SummaryView,
}

/// Step 3: review and place order.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/review.html")]
pub struct ReviewTemplate {
    pub layout: Layout,
    pub steps: Vec<StepView>,
    pub email: String,
    pub shipping: ShippingDetails,
    pub shipping_line: String,
    pub billing_line: Option<String>,
    pub payment_label: &'static str,
    pub is_cod: bool,
    pub summary: SummaryView,
}

/// Order summary sidebar fragment (for HTMX coupon updates).
#[derive(Template, WebTemplate)]
#[template(path = "partials/order_summary.html")]
pub struct OrderSummaryTemplate {
    pub summary: SummaryView,
}

/// Order confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub layout: Layout,
    pub order: OrderView,
}

// =============================================================================
// Forms
// =============================================================================

/// Shipping step form data.
///
/// `address_id` picks a saved address; when it is empty the address fields
/// describe a new one to save.
#[derive(Debug, Default, Deserialize)]
pub struct ShippingForm {
    #[serde(default)]
    pub email: String,
    pub address_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub phone: String,
    pub label: Option<String>,
    /// Checkbox; present when billing matches shipping.
    pub billing_same: Option<String>,
    #[serde(default)]
    pub billing_name: String,
    #[serde(default)]
    pub billing_address_line1: String,
    #[serde(default)]
    pub billing_address_line2: String,
    #[serde(default)]
    pub billing_city: String,
    #[serde(default)]
    pub billing_state: String,
    #[serde(default)]
    pub billing_pincode: String,
    #[serde(default)]
    pub billing_phone: String,
}

impl ShippingForm {
    fn new_address(&self) -> ShippingDetails {
        ShippingDetails {
            name: self.name.clone(),
            address_line1: self.address_line1.clone(),
            address_line2: self.address_line2.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            pincode: self.pincode.clone(),
            phone: self.phone.clone(),
        }
        .trimmed()
    }

    fn billing_address(&self) -> ShippingDetails {
        ShippingDetails {
            name: self.billing_name.clone(),
            address_line1: self.billing_address_line1.clone(),
            address_line2: self.billing_address_line2.clone(),
            city: self.billing_city.clone(),
            state: self.billing_state.clone(),
            pincode: self.billing_pincode.clone(),
            phone: self.billing_phone.clone(),
        }
        .trimmed()
    }

    fn label(&self) -> AddressLabel {
        self.label
            .as_deref()
            .and_then(|label| label.parse().ok())
            .unwrap_or_default()
    }

    fn selected_address(&self) -> Option<AddressId> {
        self.address_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != "new")
            .map(AddressId::new)
    }
}

/// Payment step form data.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub payment_method: Option<String>,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
}

/// Response to a verified payment.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub order_number: OrderNumber,
    pub redirect_url: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Shopper state every step page needs.
struct CheckoutContext {
    cart: Cart,
    book: AddressBook,
    checkout: Checkout,
}

impl CheckoutContext {
    /// Load the session state, or `None` when the cart is empty.
    async fn load(session: &Session) -> Result<Option<Self>, AppError> {
        let cart = shopper::cart(session).await?;
        if cart.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            cart,
            book: shopper::addresses(session).await?,
            checkout: shopper::checkout(session).await?,
        }))
    }

    fn summary(&self) -> SummaryView {
        SummaryView::new(
            &self.cart,
            self.checkout.coupon.as_ref(),
            self.checkout.payment_method,
        )
    }
}

/// Move the checkout to `step`, or say where to go instead.
///
/// Earlier steps are always reachable; later ones redirect to the current
/// step.
async fn enter_step(
    session: &Session,
    checkout: &mut Checkout,
    step: CheckoutStep,
) -> Result<Option<Redirect>, AppError> {
    if checkout.go_to(step).is_err() {
        return Ok(Some(Redirect::to(checkout.step.path())));
    }
    shopper::save_checkout(session, checkout).await?;
    Ok(None)
}

fn empty_cart_redirect() -> Response {
    Redirect::to("/cart").into_response()
}

fn shipping_page(
    layout: Layout,
    ctx: &CheckoutContext,
    errors: ValidationErrors,
    label: AddressLabel,
) -> ShippingTemplate {
    let checkout = &ctx.checkout;
    // The new-address form is prefilled only while no saved address is chosen
    let address = if checkout.selected_address_id.is_some() {
        ShippingDetails::default()
    } else {
        checkout.shipping.clone()
    };

    ShippingTemplate {
        layout,
        steps: step_views(CheckoutStep::Shipping),
        email: checkout.email.clone(),
        addresses: address_views(&ctx.book, checkout),
        using_new_address: checkout.selected_address_id.is_none(),
        address,
        label: label.as_str(),
        billing_same_as_shipping: checkout.billing_same_as_shipping,
        billing: checkout.billing.clone().unwrap_or_default(),
        errors,
        summary: ctx.summary(),
    }
}

fn payment_page(layout: Layout, ctx: &CheckoutContext, errors: ValidationErrors) -> PaymentTemplate {
    let checkout = &ctx.checkout;
    PaymentTemplate {
        layout,
        steps: step_views(CheckoutStep::Payment),
        ship_to: checkout.shipping.name.clone(),
        shipping_line: checkout.shipping.one_line(),
        methods: PaymentMethod::ALL
            .iter()
            .map(|&method| PaymentMethodView {
                value: method.as_str(),
                label: method.label(),
                selected: checkout.payment_method == Some(method),
            })
            .collect(),
        errors,
        summary: ctx.summary(),
    }
}

// =============================================================================
// Step Pages
// =============================================================================

/// Redirect to the current checkout step.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(session))]
pub async fn index(session: Session) -> Result<Response, AppError> {
    let Some(ctx) = CheckoutContext::load(&session).await? else {
        return Ok(empty_cart_redirect());
    };
    Ok(Redirect::to(ctx.checkout.step.path()).into_response())
}

/// Display the shipping step.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(state, session, nonce))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<Response, AppError> {
    let Some(mut ctx) = CheckoutContext::load(&session).await? else {
        return Ok(empty_cart_redirect());
    };
    if let Some(redirect) = enter_step(&session, &mut ctx.checkout, CheckoutStep::Shipping).await? {
        return Ok(redirect.into_response());
    }

    let layout = Layout::new(&state, nonce, "Checkout - Shipping");
    Ok(shipping_page(layout, &ctx, ValidationErrors::new(), AddressLabel::default()).into_response())
}

/// Submit the shipping step.
///
/// A new address is validated and saved to the address book before it is
/// selected. Invalid input re-renders the page with inline errors.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(state, session, nonce, form))]
pub async fn submit_shipping(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<ShippingForm>,
) -> Result<Response, AppError> {
    let Some(mut ctx) = CheckoutContext::load(&session).await? else {
        return Ok(empty_cart_redirect());
    };
    if let Some(redirect) = enter_step(&session, &mut ctx.checkout, CheckoutStep::Shipping).await? {
        return Ok(redirect.into_response());
    }

    let mut errors = ValidationErrors::new();
    let label = form.label();
    ctx.checkout.email = form.email.trim().to_string();

    if let Some(id) = form.selected_address() {
        match ctx.book.get(&id) {
            Some(address) => ctx.checkout.select_address(address),
            None => errors.add("address", "That address is no longer saved"),
        }
    } else {
        let details = form.new_address();
        match ctx.book.add(&details, label) {
            Ok(id) => {
                shopper::save_addresses(&session, &ctx.book).await?;
                if let Some(address) = ctx.book.get(&id) {
                    ctx.checkout.select_address(address);
                }
                tracing::info!(addresses = ctx.book.len(), "Saved new address");
            }
            Err(AddressError::Invalid(invalid)) => {
                for (field, message) in invalid.iter() {
                    errors.add(field, message);
                }
                ctx.checkout.selected_address_id = None;
                ctx.checkout.shipping = details;
            }
            Err(AddressError::NotFound(_)) => {
                errors.add("address", "Please select a shipping address");
            }
        }
    }

    ctx.checkout.billing_same_as_shipping = form.billing_same.is_some();
    ctx.checkout.billing = (!ctx.checkout.billing_same_as_shipping).then(|| form.billing_address());

    for (field, message) in ctx.checkout.validate_shipping().iter() {
        errors.add(field, message);
    }

    if errors.is_empty() && ctx.checkout.advance().is_ok() {
        shopper::save_checkout(&session, &ctx.checkout).await?;
        return Ok(Redirect::to(ctx.checkout.step.path()).into_response());
    }

    shopper::save_checkout(&session, &ctx.checkout).await?;
    let message = errors
        .first()
        .unwrap_or("Please check your details")
        .to_string();
    let layout = Layout::new(&state, nonce, "Checkout - Shipping").with_toast(Some(message.clone()));

    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        toast(ToastLevel::Error, message),
        shipping_page(layout, &ctx, errors, label),
    )
        .into_response())
}

/// Display the payment step.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(state, session, nonce))]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<Response, AppError> {
    let Some(mut ctx) = CheckoutContext::load(&session).await? else {
        return Ok(empty_cart_redirect());
    };
    if let Some(redirect) = enter_step(&session, &mut ctx.checkout, CheckoutStep::Payment).await? {
        return Ok(redirect.into_response());
    }

    let layout = Layout::new(&state, nonce, "Checkout - Payment");
    Ok(payment_page(layout, &ctx, ValidationErrors::new()).into_response())
}

/// Submit the payment step.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(state, session, nonce))]
pub async fn submit_payment(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<PaymentForm>,
) -> Result<Response, AppError> {
    let Some(mut ctx) = CheckoutContext::load(&session).await? else {
        return Ok(empty_cart_redirect());
    };
    if let Some(redirect) = enter_step(&session, &mut ctx.checkout, CheckoutStep::Payment).await? {
        return Ok(redirect.into_response());
    }

    let mut errors = ValidationErrors::new();
    match form.payment_method.as_deref().map(str::parse::<PaymentMethod>) {
        Some(Ok(method)) => ctx.checkout.payment_method = Some(method),
        Some(Err(_)) => errors.add("payment_method", "Please select a valid payment method"),
        None => {}
    }

    if errors.is_empty() {
        match ctx.checkout.advance() {
            Ok(step) => {
                shopper::save_checkout(&session, &ctx.checkout).await?;
                return Ok(Redirect::to(step.path()).into_response());
            }
            Err(maison_core::checkout::CheckoutError::Validation(invalid)) => errors = invalid,
            Err(e) => return Err(e.into()),
        }
    }

    let message = errors
        .first()
        .unwrap_or("Please select a payment method")
        .to_string();
    let layout = Layout::new(&state, nonce, "Checkout - Payment").with_toast(Some(message.clone()));

    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        toast(ToastLevel::Error, message),
        payment_page(layout, &ctx, errors),
    )
        .into_response())
}

/// Display the review step.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(state, session, nonce))]
pub async fn review(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<Response, AppError> {
    let Some(mut ctx) = CheckoutContext::load(&session).await? else {
        return Ok(empty_cart_redirect());
    };
    if let Some(redirect) = enter_step(&session, &mut ctx.checkout, CheckoutStep::Review).await? {
        return Ok(redirect.into_response());
    }

    let checkout = &ctx.checkout;
    let Some(method) = checkout.payment_method else {
        return Ok(Redirect::to(CheckoutStep::Payment.path()).into_response());
    };

    Ok(ReviewTemplate {
        layout: Layout::new(&state, nonce, "Checkout - Review"),
        steps: step_views(CheckoutStep::Review),
        email: checkout.email.clone(),
        shipping: checkout.shipping.clone(),
        shipping_line: checkout.shipping.one_line(),
        billing_line: (!checkout.billing_same_as_shipping)
            .then(|| checkout.billing_details().one_line()),
        payment_label: method.label(),
        is_cod: method.is_cod(),
        summary: ctx.summary(),
    }
    .into_response())
}

/// Go back one step.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Response, AppError> {
    let Some(mut ctx) = CheckoutContext::load(&session).await? else {
        return Ok(empty_cart_redirect());
    };
    let step = ctx.checkout.back();
    shopper::save_checkout(&session, &ctx.checkout).await?;
    Ok(Redirect::to(step.path()).into_response())
}

// =============================================================================
// Saved Addresses
// =============================================================================

/// Use a saved address for shipping.
///
/// # Errors
///
/// Returns 404 for an unknown address.
#[instrument(skip(session))]
pub async fn select_address(session: Session, Path(id): Path<String>) -> Result<Response, AppError> {
    let Some(mut ctx) = CheckoutContext::load(&session).await? else {
        return Ok(empty_cart_redirect());
    };
    let id = AddressId::new(id);
    let address = ctx
        .book
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Address {id}")))?;
    ctx.checkout.select_address(address);
    shopper::save_checkout(&session, &ctx.checkout).await?;
    Ok(Redirect::to(CheckoutStep::Shipping.path()).into_response())
}

/// Make a saved address the default.
///
/// # Errors
///
/// Returns 404 for an unknown address.
#[instrument(skip(session))]
pub async fn default_address(
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let mut book = shopper::addresses(&session).await?;
    let id = AddressId::new(id);
    book.set_default(&id)
        .map_err(|_| AppError::NotFound(format!("Address {id}")))?;
    shopper::save_addresses(&session, &book).await?;
    Ok(Redirect::to(CheckoutStep::Shipping.path()).into_response())
}

/// Delete a saved address, deselecting it if it was in use.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(session))]
pub async fn delete_address(session: Session, Path(id): Path<String>) -> Result<Response, AppError> {
    let mut book = shopper::addresses(&session).await?;
    let id = AddressId::new(id);
    if book.remove(&id) {
        shopper::save_addresses(&session, &book).await?;
        let mut checkout = shopper::checkout(&session).await?;
        checkout.forget_address(&id);
        shopper::save_checkout(&session, &checkout).await?;
    }
    Ok(Redirect::to(CheckoutStep::Shipping.path()).into_response())
}

// =============================================================================
// Coupons
// =============================================================================

/// Apply a coupon code (HTMX).
///
/// Replaces any coupon already applied. An unknown code keeps the previous
/// coupon and shows the error inline.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(session))]
pub async fn apply_coupon(session: Session, Form(form): Form<CouponForm>) -> Result<Response, AppError> {
    let Some(mut ctx) = CheckoutContext::load(&session).await? else {
        return Ok(empty_cart_redirect());
    };

    let (triggers, error) = match ctx.checkout.apply_coupon(&form.code) {
        Ok(coupon) => {
            let message = format!("{} applied: {}", coupon.code, coupon.describe());
            tracing::info!(code = %coupon.code, "Coupon applied");
            (Triggers::new().toast(ToastLevel::Success, message), None)
        }
        Err(e) => {
            let message = e.to_string();
            (
                Triggers::new().toast(ToastLevel::Error, message.clone()),
                Some(message),
            )
        }
    };
    shopper::save_checkout(&session, &ctx.checkout).await?;

    let mut summary = ctx.summary();
    summary.coupon_error = error;
    Ok((triggers, OrderSummaryTemplate { summary }).into_response())
}

/// Remove the applied coupon (HTMX).
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(session))]
pub async fn remove_coupon(session: Session) -> Result<Response, AppError> {
    let Some(mut ctx) = CheckoutContext::load(&session).await? else {
        return Ok(empty_cart_redirect());
    };

    let triggers = match ctx.checkout.remove_coupon() {
        Some(coupon) => {
            shopper::save_checkout(&session, &ctx.checkout).await?;
            Triggers::new().toast(ToastLevel::Info, format!("{} removed", coupon.code))
        }
        None => Triggers::new(),
    };

    Ok((
        triggers,
        OrderSummaryTemplate {
            summary: ctx.summary(),
        },
    )
        .into_response())
}

// =============================================================================
// Placement
// =============================================================================

/// Place the order (JSON).
///
/// # Errors
///
/// Returns the error that stopped placement; the cart is left intact.
#[instrument(skip(state, session))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PlaceOrderOutcome>, AppError> {
    place_order(&state, &session).await.map(Json)
}

/// Verify a completed Razorpay payment (JSON).
///
/// # Errors
///
/// Returns the error that stopped verification or completion.
#[instrument(skip(state, session, confirmation))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Json(confirmation): Json<PaymentConfirmation>,
) -> Result<Json<VerifyResponse>, AppError> {
    let order_number = verify_payment(&state, &session, &confirmation).await?;
    Ok(Json(VerifyResponse {
        redirect_url: confirmation_url(&order_number),
        order_number,
    }))
}

/// Display an order confirmation.
///
/// Only orders placed from this session are shown.
///
/// # Errors
///
/// Returns 404 for an order this session did not place.
#[instrument(skip(state, session, nonce))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Path(number): Path<String>,
) -> Result<Response, AppError> {
    let number = OrderNumber::new(number);
    if !shopper::owns_order(&session, &number).await? {
        return Err(AppError::NotFound(format!("Order {number}")));
    }

    let order = OrderRepository::new(state.pool())
        .get_by_number(&number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {number}")))?;

    Ok(ConfirmationTemplate {
        layout: Layout::new(&state, nonce, format!("Order {number}")),
        order: OrderView::from(&order),
    }
    .into_response())
}

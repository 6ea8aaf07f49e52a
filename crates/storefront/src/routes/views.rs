//! Display data shared by several templates.
//!
//! Prices are formatted here so templates only print strings.

use rust_decimal::Decimal;

use maison_core::Price;
use maison_core::cart::{Cart, CartItem, MAX_LINE_QUANTITY};
use maison_core::checkout::PaymentMethod;
use maison_core::coupon::Coupon;
use maison_core::ledger::LedgerItem;
use maison_core::pricing::{Totals, calculate_totals};

use crate::db::OrderRecord;
use crate::medusa::Product;
use crate::state::AppState;

/// Format a rupee amount, e.g. `₹1,212.00`.
#[must_use]
pub fn money(amount: Decimal) -> String {
    Price::inr(amount).display()
}

/// Page chrome every full-page template needs.
#[derive(Clone)]
pub struct Layout {
    pub title: String,
    pub description: String,
    pub store_name: String,
    pub nonce: String,
    /// Server-rendered toast for non-HTMX form posts.
    pub toast: Option<String>,
}

impl Layout {
    #[must_use]
    pub fn new(state: &AppState, nonce: String, title: impl Into<String>) -> Self {
        let store_name = state.config().store_name.clone();
        Self {
            title: title.into(),
            description: format!("{store_name} - candles, diffusers and home fragrance"),
            store_name,
            nonce,
            toast: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        if let Some(description) = description.filter(|d| !d.is_empty()) {
            self.description = description;
        }
        self
    }

    #[must_use]
    pub fn with_toast(mut self, toast: Option<String>) -> Self {
        self.toast = toast;
        self
    }
}

/// A product tile on listing, collection, home and Ledger pages.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub price: String,
    pub image: Option<String>,
    pub in_ledger: bool,
}

impl ProductCardView {
    #[must_use]
    pub fn from_product(product: &Product, in_ledger: bool) -> Self {
        Self {
            id: product.id.to_string(),
            handle: product.handle.clone(),
            title: product.title.clone(),
            subtitle: product.subtitle.clone(),
            price: product
                .price()
                .map_or_else(|| "Unavailable".to_string(), |p| p.display()),
            image: product.image().map(String::from),
            in_ledger,
        }
    }

    #[must_use]
    pub fn from_ledger_item(item: &LedgerItem) -> Self {
        Self {
            id: item.id.to_string(),
            handle: item.handle.clone(),
            title: item.name.clone(),
            subtitle: None,
            price: money(item.price),
            image: item.image.clone(),
            in_ledger: true,
        }
    }
}

/// A cart line.
#[derive(Clone)]
pub struct CartItemView {
    pub line_id: String,
    pub handle: String,
    pub name: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub image: Option<String>,
    pub can_increase: bool,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            line_id: item.line_id().to_string(),
            handle: item.handle.clone(),
            name: item.name.clone(),
            variant_title: item.variant_title.clone(),
            quantity: item.quantity,
            price: money(item.price),
            line_total: money(item.line_total()),
            image: item.image.clone(),
            can_increase: item.quantity < MAX_LINE_QUANTITY,
        }
    }
}

/// Order totals, formatted.
#[derive(Clone)]
pub struct TotalsView {
    pub subtotal: String,
    pub discount: Option<String>,
    pub shipping: String,
    pub free_shipping: bool,
    pub tax: String,
    pub total: String,
    /// How much more unlocks free shipping, when it is not yet reached.
    pub remaining_for_free_shipping: Option<String>,
    pub cod_fee: Option<String>,
    pub payable: String,
}

impl TotalsView {
    #[must_use]
    pub fn new(totals: &Totals, method: Option<PaymentMethod>) -> Self {
        let remaining = totals.remaining_for_free_shipping();
        let surcharge = method.map_or(Decimal::ZERO, |m| totals.surcharge(m));
        Self {
            subtotal: money(totals.subtotal),
            discount: (!totals.discount.is_zero()).then(|| money(totals.discount)),
            shipping: money(totals.shipping),
            free_shipping: totals.shipping.is_zero(),
            tax: money(totals.tax),
            total: money(totals.total),
            remaining_for_free_shipping: (!remaining.is_zero()).then(|| money(remaining)),
            cod_fee: (!surcharge.is_zero()).then(|| money(surcharge)),
            payable: money(totals.total + surcharge),
        }
    }
}

/// The cart with its totals.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub totals: TotalsView,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, coupon: Option<&Coupon>) -> Self {
        let totals = calculate_totals(cart.items(), coupon);
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            item_count: cart.item_count(),
            totals: TotalsView::new(&totals, None),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Applied coupon, formatted.
#[derive(Clone)]
pub struct CouponView {
    pub code: String,
    pub description: String,
}

impl From<&Coupon> for CouponView {
    fn from(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            description: coupon.describe(),
        }
    }
}

/// Order summary sidebar on the checkout steps.
#[derive(Clone)]
pub struct SummaryView {
    pub items: Vec<CartItemView>,
    pub totals: TotalsView,
    pub coupon: Option<CouponView>,
    pub coupon_error: Option<String>,
}

impl SummaryView {
    #[must_use]
    pub fn new(cart: &Cart, coupon: Option<&Coupon>, method: Option<PaymentMethod>) -> Self {
        let totals = calculate_totals(cart.items(), coupon);
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            totals: TotalsView::new(&totals, method),
            coupon: coupon.map(CouponView::from),
            coupon_error: None,
        }
    }
}

/// A stored order on the confirmation and order history pages.
#[derive(Clone)]
pub struct OrderView {
    pub number: String,
    pub status: String,
    pub status_key: String,
    pub placed_on: String,
    pub email: String,
    pub payment: String,
    pub ship_to: String,
    pub shipping_line: String,
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub discount: Option<String>,
    pub coupon_code: Option<String>,
    pub shipping: String,
    pub tax: String,
    pub cod_fee: Option<String>,
    pub total: String,
    pub reference: Option<i64>,
}

impl From<&OrderRecord> for OrderView {
    fn from(order: &OrderRecord) -> Self {
        Self {
            number: order.order_number.to_string(),
            status: order.status.label().to_string(),
            status_key: order.status.to_string(),
            placed_on: order.created_at.format("%d %b %Y").to_string(),
            email: order.email.clone(),
            payment: order.payment_method.label().to_string(),
            ship_to: order.shipping_address.name.clone(),
            shipping_line: order.shipping_address.one_line(),
            items: order.items.iter().map(CartItemView::from).collect(),
            item_count: order.item_count(),
            subtotal: money(order.totals.subtotal),
            discount: (!order.totals.discount.is_zero()).then(|| money(order.totals.discount)),
            coupon_code: order.coupon_code.clone(),
            shipping: money(order.totals.shipping),
            tax: money(order.totals.tax),
            cod_fee: (!order.cod_fee.is_zero()).then(|| money(order.cod_fee)),
            total: money(order.amount_payable()),
            reference: order.medusa_display_id,
        }
    }
}

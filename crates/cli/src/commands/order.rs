//! Order lookup for support.
//!
//! # Usage
//!
//! ```bash
//! maison-cli order MSN-3F9A0C12
//! ```

use maison_core::OrderNumber;
use maison_storefront::db::{OrderRecord, OrderRepository, create_pool};

use super::{CommandError, database_url};

/// Print a stored order.
///
/// # Errors
///
/// Returns `CommandError::OrderNotFound` when no order has that number.
pub async fn show(number: &str) -> Result<(), CommandError> {
    let pool = create_pool(&database_url()?).await?;
    let order_number = OrderNumber::new(number.trim().to_uppercase());

    let order = OrderRepository::new(&pool)
        .get_by_number(&order_number)
        .await?
        .ok_or_else(|| CommandError::OrderNotFound(order_number.to_string()))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", describe(&order));
    }
    Ok(())
}

fn describe(order: &OrderRecord) -> String {
    let mut lines = vec![
        format!("Order:    {}", order.order_number),
        format!("Status:   {}", order.status.label()),
        format!("Placed:   {}", order.created_at.format("%Y-%m-%d %H:%M UTC")),
        format!("Email:    {}", order.email),
        format!("Payment:  {}", order.payment_method.label()),
        format!(
            "Ship to:  {}, {}",
            order.shipping_address.name,
            order.shipping_address.one_line()
        ),
        format!("Items:    {}", order.item_count()),
        format!("Payable:  {}", order.amount_payable()),
    ];
    if let Some(code) = &order.coupon_code {
        lines.push(format!("Coupon:   {code}"));
    }
    if let Some(id) = &order.medusa_order_id {
        lines.push(format!("Medusa:   {id}"));
    }
    if let Some(id) = &order.razorpay_order_id {
        lines.push(format!("Razorpay: {id}"));
    }
    if let Some(reason) = &order.failure_reason {
        lines.push(format!("Failure:  {reason}"));
    }
    lines.join("\n")
}

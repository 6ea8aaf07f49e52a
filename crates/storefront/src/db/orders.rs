//! Order records.
//!
//! Queries are checked at runtime (`sqlx::query_as`) so the crate builds
//! without a live database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use maison_core::cart::CartItem;
use maison_core::checkout::{PaymentMethod, ShippingDetails};
use maison_core::pricing::Totals;
use maison_core::{OrderNumber, OrderStatus};

use super::RepositoryError;

/// Columns selected for every order read.
const ORDER_COLUMNS: &str = r"
    id, order_number, email, payment_method, status,
    subtotal, discount, shipping, tax, cod_fee, total,
    coupon_code, medusa_order_id, medusa_display_id,
    razorpay_order_id, razorpay_payment_id, failure_reason,
    shipping_address, items, created_at, updated_at
";

/// A stored order.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: Uuid,
    pub order_number: OrderNumber,
    pub email: String,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub totals: Totals,
    pub cod_fee: Decimal,
    pub coupon_code: Option<String>,
    pub medusa_order_id: Option<String>,
    pub medusa_display_id: Option<i64>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub failure_reason: Option<String>,
    pub shipping_address: ShippingDetails,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Amount charged, including any cash-on-delivery fee.
    #[must_use]
    pub fn amount_payable(&self) -> Decimal {
        self.totals.total + self.cod_fee
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    email: String,
    payment_method: String,
    status: OrderStatus,
    subtotal: Decimal,
    discount: Decimal,
    shipping: Decimal,
    tax: Decimal,
    cod_fee: Decimal,
    total: Decimal,
    coupon_code: Option<String>,
    medusa_order_id: Option<String>,
    medusa_display_id: Option<i64>,
    razorpay_order_id: Option<String>,
    razorpay_payment_id: Option<String>,
    failure_reason: Option<String>,
    shipping_address: Json<ShippingDetails>,
    items: Json<Vec<CartItem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_method = row.payment_method.parse::<PaymentMethod>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment method in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            order_number: OrderNumber::new(row.order_number),
            email: row.email,
            payment_method,
            status: row.status,
            totals: Totals {
                subtotal: row.subtotal,
                discount: row.discount,
                shipping: row.shipping,
                tax: row.tax,
                total: row.total,
            },
            cod_fee: row.cod_fee,
            coupon_code: row.coupon_code,
            medusa_order_id: row.medusa_order_id,
            medusa_display_id: row.medusa_display_id,
            razorpay_order_id: row.razorpay_order_id,
            razorpay_payment_id: row.razorpay_payment_id,
            failure_reason: row.failure_reason,
            shipping_address: row.shipping_address.0,
            items: row.items.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Values for a new order row.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: &'a OrderNumber,
    pub email: &'a str,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub totals: &'a Totals,
    pub cod_fee: Decimal,
    pub coupon_code: Option<&'a str>,
    pub razorpay_order_id: Option<&'a str>,
    pub shipping_address: &'a ShippingDetails,
    pub items: &'a [CartItem],
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(&self, order: &NewOrder<'_>) -> Result<OrderRecord, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO storefront.orders (
                order_number, email, payment_method, status,
                subtotal, discount, shipping, tax, cod_fee, total,
                coupon_code, razorpay_order_id, shipping_address, items
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {ORDER_COLUMNS}
            "
        );

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order.order_number.as_str())
            .bind(order.email)
            .bind(order.payment_method.as_str())
            .bind(order.status)
            .bind(order.totals.subtotal)
            .bind(order.totals.discount)
            .bind(order.totals.shipping)
            .bind(order.totals.tax)
            .bind(order.cod_fee)
            .bind(order.totals.total)
            .bind(order.coupon_code)
            .bind(order.razorpay_order_id)
            .bind(Json(order.shipping_address))
            .bind(Json(order.items))
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("order number already exists".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        row.try_into()
    }

    /// Record a verified payment. Re-verifying an already verified order is
    /// allowed so a failed completion can be retried.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no pending order has that number.
    pub async fn mark_payment_verified(
        &self,
        order_number: &OrderNumber,
        razorpay_payment_id: &str,
    ) -> Result<OrderRecord, RepositoryError> {
        let sql = format!(
            r"
            UPDATE storefront.orders
            SET status = 'payment_verified', razorpay_payment_id = $2, updated_at = NOW()
            WHERE order_number = $1
              AND status IN ('pending_payment', 'payment_verified')
            RETURNING {ORDER_COLUMNS}
            "
        );

        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_number.as_str())
            .bind(razorpay_payment_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?
            .try_into()
    }

    /// Record the backend order the cart was completed into.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn mark_placed(
        &self,
        order_number: &OrderNumber,
        medusa_order_id: &str,
        medusa_display_id: Option<i64>,
    ) -> Result<OrderRecord, RepositoryError> {
        let sql = format!(
            r"
            UPDATE storefront.orders
            SET status = 'placed', medusa_order_id = $2, medusa_display_id = $3,
                failure_reason = NULL, updated_at = NOW()
            WHERE order_number = $1
            RETURNING {ORDER_COLUMNS}
            "
        );

        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_number.as_str())
            .bind(medusa_order_id)
            .bind(medusa_display_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?
            .try_into()
    }

    /// Mark an order as failed. Placed orders are left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_failed(
        &self,
        order_number: &OrderNumber,
        reason: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE storefront.orders
            SET status = 'failed', failure_reason = $2, updated_at = NOW()
            WHERE order_number = $1 AND status <> 'placed'
            ",
        )
        .bind(order_number.as_str())
        .bind(reason)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Mark an order failed only while it is still awaiting payment.
    ///
    /// Used when the shopper starts a new payment in its place. Returns
    /// whether a row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_abandoned(
        &self,
        order_number: &OrderNumber,
        reason: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.orders
            SET status = 'failed', failure_reason = $2, updated_at = NOW()
            WHERE order_number = $1 AND status = 'pending_payment'
            ",
        )
        .bind(order_number.as_str())
        .bind(reason)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get an order by its number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<OrderRecord>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE order_number = $1");

        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_number.as_str())
            .fetch_optional(self.pool)
            .await?
            .map(OrderRecord::try_from)
            .transpose()
    }

    /// Get several orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_numbers(
        &self,
        order_numbers: &[OrderNumber],
    ) -> Result<Vec<OrderRecord>, RepositoryError> {
        if order_numbers.is_empty() {
            return Ok(Vec::new());
        }

        let numbers: Vec<&str> = order_numbers.iter().map(OrderNumber::as_str).collect();
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE order_number = ANY($1) ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(&numbers)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(OrderRecord::try_from)
            .collect()
    }
}

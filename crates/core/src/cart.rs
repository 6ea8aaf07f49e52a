//! Cart line items and merge/update semantics.
//!
//! A cart is a short ordered list of line items. A line is identified by its
//! variant id when it has one, otherwise by its product id, so two sizes of the
//! same product occupy separate lines while re-adding the same size merges.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, VariantId};

/// Upper bound for a single line's quantity.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// A product snapshot in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    /// Product handle, for linking back to the PDP.
    pub handle: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_title: Option<String>,
    /// Unit price in major currency units.
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartItem {
    /// Identity of the line: variant id when present, otherwise product id.
    #[must_use]
    pub fn line_id(&self) -> &str {
        self.variant_id
            .as_ref()
            .map_or_else(|| self.id.as_str(), VariantId::as_str)
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Outcome of a quantity edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now has this quantity.
    Updated(u32),
    /// The quantity reached zero and the line was deleted.
    Removed,
    /// No line with that id exists.
    Missing,
}

/// Clamp a requested quantity into `[0, MAX_LINE_QUANTITY]`.
#[must_use]
pub fn clamp_quantity(requested: i64) -> u32 {
    u32::try_from(requested.clamp(0, i64::from(MAX_LINE_QUANTITY))).unwrap_or(0)
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add an item, merging into an existing line with the same identity.
    ///
    /// On merge the quantity is incremented by `item.quantity` and the price
    /// and image are replaced by the incoming snapshot. Quantities are capped
    /// at [`MAX_LINE_QUANTITY`]. Adding zero units does nothing.
    ///
    /// Returns the resulting quantity of the line.
    pub fn add(&mut self, item: CartItem) -> u32 {
        if item.quantity == 0 {
            return self.get(item.line_id()).map_or(0, |line| line.quantity);
        }

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.line_id() == item.line_id())
        {
            line.quantity = line
                .quantity
                .saturating_add(item.quantity)
                .min(MAX_LINE_QUANTITY);
            line.price = item.price;
            line.image = item.image;
            line.name = item.name;
            line.variant_title = item.variant_title;
            return line.quantity;
        }

        let quantity = item.quantity.min(MAX_LINE_QUANTITY);
        self.items.push(CartItem { quantity, ..item });
        quantity
    }

    /// Set a line's quantity, clamped to `[0, MAX_LINE_QUANTITY]`.
    ///
    /// A resulting quantity of zero deletes the line.
    pub fn set_quantity(&mut self, line_id: &str, requested: i64) -> QuantityChange {
        let quantity = clamp_quantity(requested);

        let Some(index) = self.items.iter().position(|line| line.line_id() == line_id) else {
            return QuantityChange::Missing;
        };

        if quantity == 0 {
            self.items.remove(index);
            return QuantityChange::Removed;
        }

        if let Some(line) = self.items.get_mut(index) {
            line.quantity = quantity;
        }
        QuantityChange::Updated(quantity)
    }

    /// Delete a line. Returns whether anything was removed.
    pub fn remove(&mut self, line_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.line_id() != line_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn get(&self, line_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|line| line.line_id() == line_id)
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// `Σ price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(variant: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new("prod_rose"),
            variant_id: Some(VariantId::new(variant)),
            handle: "rose-candle".to_string(),
            name: "Rose Candle".to_string(),
            variant_title: Some("250ml".to_string()),
            price: Decimal::new(price, 0),
            quantity,
            image: Some("https://cdn.example/rose.jpg".to_string()),
        }
    }

    #[test]
    fn test_add_same_line_twice_increments_quantity() {
        let mut cart = Cart::new();
        cart.add(item("variant_250", 900, 1));
        let quantity = cart.add(item("variant_250", 900, 2));

        assert_eq!(quantity, 3);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_merge_takes_incoming_price_and_image() {
        let mut cart = Cart::new();
        cart.add(item("variant_250", 900, 1));

        let mut updated = item("variant_250", 850, 1);
        updated.image = Some("https://cdn.example/rose-v2.jpg".to_string());
        cart.add(updated);

        let line = cart.get("variant_250").unwrap();
        assert_eq!(line.price, Decimal::new(850, 0));
        assert_eq!(line.image.as_deref(), Some("https://cdn.example/rose-v2.jpg"));
    }

    #[test]
    fn test_different_variants_are_separate_lines() {
        let mut cart = Cart::new();
        cart.add(item("variant_250", 900, 1));
        cart.add(item("variant_500", 1500, 1));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.subtotal(), Decimal::new(2400, 0));
    }

    #[test]
    fn test_line_without_variant_uses_product_id() {
        let mut cart = Cart::new();
        let mut plain = item("unused", 400, 1);
        plain.variant_id = None;
        cart.add(plain.clone());
        cart.add(plain);

        assert_eq!(cart.get("prod_rose").unwrap().quantity, 2);
    }

    #[test]
    fn test_add_caps_at_max_quantity() {
        let mut cart = Cart::new();
        cart.add(item("variant_250", 900, 8));
        assert_eq!(cart.add(item("variant_250", 900, 5)), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(item("variant_250", 900, 0)), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(item("variant_250", 900, 2));

        assert_eq!(cart.set_quantity("variant_250", 0), QuantityChange::Removed);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_clamps() {
        let mut cart = Cart::new();
        cart.add(item("variant_250", 900, 2));

        assert_eq!(
            cart.set_quantity("variant_250", 42),
            QuantityChange::Updated(MAX_LINE_QUANTITY)
        );
        assert_eq!(cart.set_quantity("variant_250", -3), QuantityChange::Removed);
    }

    #[test]
    fn test_set_quantity_missing_line() {
        let mut cart = Cart::new();
        assert_eq!(cart.set_quantity("nope", 1), QuantityChange::Missing);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(item("variant_250", 900, 1));
        cart.add(item("variant_500", 1500, 1));

        assert!(cart.remove("variant_250"));
        assert!(!cart.remove("variant_250"));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let mut cart = Cart::new();
        cart.add(item("variant_250", 900, 1));
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}

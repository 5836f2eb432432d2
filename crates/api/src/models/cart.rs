//! Shopping cart.
//!
//! Carts are ephemeral: they live in process memory keyed by user and are
//! lost on restart. Every mutation recomputes `total` from scratch so it
//! can never drift from the lines.

use rust_decimal::Decimal;
use serde::Serialize;

use emporium_core::ProductId;

/// One cart line with the product details captured when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: i32,
}

/// A user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total: Decimal,
}

impl Cart {
    /// Add a line, merging quantities with an existing line for the product.
    ///
    /// The snapshot fields of an existing line are refreshed from `item`.
    pub fn add(&mut self, item: CartItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            existing.quantity += item.quantity;
            existing.name = item.name;
            existing.price = item.price;
            existing.image = item.image;
        } else {
            self.items.push(item);
        }
        self.recompute_total();
    }

    /// Set the quantity of an existing line. Returns `false` if absent.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i32) -> bool {
        let Some(line) = self.items.iter_mut().find(|l| l.product_id == product_id) else {
            return false;
        };
        line.quantity = quantity;
        self.recompute_total();
        true
    }

    /// Remove the line for `product_id`. Returns `false` if absent.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|l| l.product_id != product_id);
        self.recompute_total();
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute_total();
    }

    /// Quantity already in the cart for `product_id`.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> i32 {
        self.items
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn recompute_total(&mut self) {
        self.total = self
            .items
            .iter()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, cents: i64, quantity: i32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Decimal::new(cents, 2),
            image: String::new(),
            quantity,
        }
    }

    fn expected_total(cart: &Cart) -> Decimal {
        cart.items
            .iter()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum()
    }

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::default();
        cart.add(line(1, 1000, 1));
        cart.add(line(2, 250, 4));
        cart.add(line(1, 1000, 2));
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 3);
        assert_eq!(cart.total, Decimal::new(4000, 2));
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let mut cart = Cart::default();
        cart.add(line(1, 1999, 2));
        cart.add(line(2, 501, 3));
        assert_eq!(cart.total, expected_total(&cart));

        assert!(cart.set_quantity(ProductId::new(2), 1));
        assert_eq!(cart.total, expected_total(&cart));

        assert!(!cart.set_quantity(ProductId::new(99), 1));
        assert!(cart.remove(ProductId::new(1)));
        assert!(!cart.remove(ProductId::new(1)));
        assert_eq!(cart.total, Decimal::new(501, 2));

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
    }
}

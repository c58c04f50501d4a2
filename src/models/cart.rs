//! Cart line items and checkout data.

use serde::{Deserialize, Serialize};

use super::product::lenient_price;
use super::{Product, ProductId};

/// One product line in the cart.
///
/// `quantity` is never below 1 while the entry is held by a
/// [`CartStore`](crate::cart::CartStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    /// Identity used for merging repeated adds.
    pub product_id: ProductId,
    /// Product title at the time it was added.
    pub title: String,
    /// Unit price at the time it was added; never `NaN` or infinite.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
    /// Number of units.
    pub quantity: u32,
    /// Category name.
    #[serde(default)]
    pub category: String,
    /// Product description.
    #[serde(default)]
    pub description: String,
}

impl CartEntry {
    /// Creates a single-unit entry from a product.
    #[inline]
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            price: if product.price.is_finite() { product.price } else { 0.0_f64 },
            quantity: 1,
            category: product.category.clone(),
            description: product.description.clone(),
        }
    }

    /// Returns `price × quantity`, treating a non-finite price as zero.
    #[inline]
    #[must_use]
    pub fn line_total(&self) -> f64 {
        let price = if self.price.is_finite() { self.price } else { 0.0_f64 };
        price * f64::from(self.quantity)
    }
}

/// Delivery details collected at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    /// Recipient name.
    pub full_name: String,
    /// Street and number.
    pub street: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Contact phone number.
    pub phone: String,
}

/// Result of a completed (simulated) checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    /// Entries that were purchased.
    pub entries: Vec<CartEntry>,
    /// Amount charged.
    pub total: f64,
    /// Where the order ships to.
    pub address: ShippingAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp(price: f64) -> Product {
        Product {
            id: ProductId::new("p1"),
            title: "Lamp".to_owned(),
            description: "A warm desk lamp".to_owned(),
            price,
            category: "Home".to_owned(),
            merchant: None,
        }
    }

    #[test]
    fn entry_from_product_starts_at_one() {
        let entry = CartEntry::from_product(&lamp(10.0));
        assert_eq!(entry.quantity, 1);
        assert_eq!(entry.product_id, ProductId::new("p1"));
        assert_eq!(entry.category, "Home");
    }

    #[test]
    fn line_total_multiplies() {
        let mut entry = CartEntry::from_product(&lamp(2.5));
        entry.quantity = 4;
        assert!((entry.line_total() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn line_total_ignores_non_finite_price() {
        let mut entry = CartEntry::from_product(&lamp(f64::NAN));
        entry.quantity = 3;
        assert!(entry.line_total().abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_price_becomes_zero() {
        let entry = CartEntry::from_product(&lamp(f64::INFINITY));
        assert!(entry.price.abs() < f64::EPSILON);
    }

    #[test]
    fn null_or_text_price_is_coerced() {
        let json = r#"[
            {"productId": "p1", "title": "Lamp", "price": null, "quantity": 2},
            {"productId": "p2", "title": "Rug", "price": "7.5", "quantity": 1}
        ]"#;
        let entries: Vec<CartEntry> = serde_json::from_str(json).unwrap();
        assert!(entries[0].price.abs() < f64::EPSILON);
        assert!((entries[1].price - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn entry_serializes_camel_case() {
        let json = serde_json::to_string(&CartEntry::from_product(&lamp(1.0))).unwrap();
        assert!(json.contains(r#""productId":"p1""#));
    }
}

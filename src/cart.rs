//! Shopping cart state mirrored into durable storage.
//!
//! ## Invariants
//! - Entries are unique by product id; adding the same product again
//!   bumps its quantity.
//! - Every held quantity is at least 1.
//! - Entries keep the order in which products were first added.
//!
//! Every mutation rewrites the `cart` key. A failed write is logged and
//! the in-memory cart stays authoritative.

use crate::error::{Result, StorefrontError, ValidationError};
use crate::messages;
use crate::models::{CartEntry, OrderSummary, Product, ProductId, ShippingAddress, ToastKind};
use crate::storage::{CART_KEY, KeyValueStorage};
use crate::toast::Notify;
use crate::validation;

/// Ordered cart entries plus their storage mirror.
#[derive(Debug)]
pub struct CartStore<S: KeyValueStorage> {
    /// Backend holding the serialized entries.
    storage: S,
    /// Entries in first-added order.
    entries: Vec<CartEntry>,
}

impl<S: KeyValueStorage> CartStore<S> {
    /// Creates an empty cart. Call [`CartStore::load`] to restore a
    /// persisted one.
    #[inline]
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self {
            storage,
            entries: Vec::new(),
        }
    }

    /// Replaces the in-memory cart with the persisted one.
    ///
    /// Unreadable data is removed and leaves the cart empty. Returns the
    /// number of restored entries.
    #[tracing::instrument(skip_all)]
    pub fn load(&mut self) -> usize {
        self.entries = match self.read_persisted() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "discarding persisted cart");
                if let Err(remove_err) = self.storage.remove(CART_KEY) {
                    tracing::warn!(error = %remove_err, "failed to remove persisted cart");
                }
                Vec::new()
            }
        };
        tracing::debug!(entries = self.entries.len(), "cart loaded");
        self.entries.len()
    }

    /// Reads and sanitizes the persisted entries.
    fn read_persisted(&self) -> Result<Vec<CartEntry>> {
        let Some(raw) = self.storage.get(CART_KEY)? else {
            return Ok(Vec::new());
        };
        let stored: Vec<CartEntry> = serde_json::from_str(&raw)?;
        let mut entries: Vec<CartEntry> = Vec::with_capacity(stored.len());
        for entry in stored {
            if entry.quantity == 0 {
                continue;
            }
            match entries.iter_mut().find(|held| held.product_id == entry.product_id) {
                Some(held) => held.quantity = held.quantity.saturating_add(entry.quantity),
                None => entries.push(entry),
            }
        }
        Ok(entries)
    }

    /// Writes the current entries to storage.
    fn persist(&self) {
        let written = serde_json::to_string(&self.entries)
            .map_err(StorefrontError::from)
            .and_then(|json| self.storage.set(CART_KEY, &json));
        if let Err(err) = written {
            tracing::warn!(error = %err, "failed to persist cart");
        }
    }

    /// Adds one unit of `product`, merging with an existing entry.
    /// Returns the entry's new quantity.
    #[tracing::instrument(skip_all, fields(product = %product.id))]
    pub fn add_to_cart(&mut self, product: &Product) -> u32 {
        let quantity = match self.entry_mut(&product.id) {
            Some(entry) => {
                entry.quantity = entry.quantity.saturating_add(1);
                entry.quantity
            }
            None => {
                self.entries.push(CartEntry::from_product(product));
                1
            }
        };
        tracing::debug!(quantity, "added to cart");
        self.persist();
        quantity
    }

    /// Adds one unit of `product` and tells the user about it.
    #[inline]
    pub fn add_to_cart_with_notice<N: Notify>(&mut self, product: &Product, notices: &mut N) -> u32 {
        let quantity = self.add_to_cart(product);
        let _toast = notices.notify(&messages::added_to_cart(&product.title), ToastKind::Success);
        quantity
    }

    /// Removes the entry for `product_id`. Returns `false` if there was
    /// none.
    #[tracing::instrument(skip_all, fields(product = %product_id))]
    pub fn remove_from_cart(&mut self, product_id: &ProductId) -> bool {
        let Some(index) = self.position(product_id) else {
            return false;
        };
        let _removed = self.entries.remove(index);
        self.persist();
        true
    }

    /// Sets the quantity of an existing entry.
    ///
    /// Returns `Ok(false)` for an unknown product.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::QuantityTooLow`] for a quantity below 1;
    /// the cart is left untouched.
    #[tracing::instrument(skip_all, fields(product = %product_id, quantity))]
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Result<bool> {
        if quantity < 1 {
            return Err(ValidationError::QuantityTooLow(quantity).into());
        }
        let Some(entry) = self.entry_mut(product_id) else {
            tracing::debug!("quantity update for a product not in the cart");
            return Ok(false);
        };
        entry.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.persist();
        Ok(true)
    }

    /// Empties the cart.
    #[tracing::instrument(skip_all)]
    pub fn clear_cart(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Places a simulated order for the whole cart.
    ///
    /// On success the cart is emptied and the user is told the order
    /// shipped. Failures are surfaced as an error toast too.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCart`] for an empty cart, or the
    /// first address field that fails validation.
    #[tracing::instrument(skip_all)]
    pub fn checkout<N: Notify>(
        &mut self,
        address: ShippingAddress,
        notices: &mut N,
    ) -> Result<OrderSummary> {
        let rejection = if self.entries.is_empty() {
            Some(ValidationError::EmptyCart)
        } else {
            validation::validate_shipping_address(&address).into_iter().next()
        };
        if let Some(err) = rejection {
            tracing::debug!(error = %err, "checkout rejected");
            let _toast = notices.notify(&err.to_string(), ToastKind::Error);
            return Err(err.into());
        }

        let summary = OrderSummary {
            total: self.cart_total(),
            entries: core::mem::take(&mut self.entries),
            address,
        };
        tracing::info!(entries = summary.entries.len(), total = summary.total, "order placed");
        self.persist();
        let _toast = notices.notify(messages::success::ORDER_PLACED, ToastKind::Success);
        Ok(summary)
    }

    /// Returns Σ price × quantity over all entries.
    #[inline]
    #[must_use]
    pub fn cart_total(&self) -> f64 {
        self.entries
            .iter()
            .map(CartEntry::line_total)
            .fold(0.0_f64, |total, line| total + line)
    }

    /// Returns the total number of units in the cart.
    #[inline]
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.entries.iter().map(|entry| u64::from(entry.quantity)).sum()
    }

    /// Returns the number of distinct entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for an empty cart.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries in first-added order.
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Returns the entry for `product_id`.
    #[inline]
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartEntry> {
        self.entries.iter().find(|entry| &entry.product_id == product_id)
    }

    /// Mutable entry for `product_id`.
    fn entry_mut(&mut self, product_id: &ProductId) -> Option<&mut CartEntry> {
        self.entries.iter_mut().find(|entry| &entry.product_id == product_id)
    }

    /// Index of the entry for `product_id`.
    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::InMemoryStorage;
    use crate::toast::NotificationQueue;

    fn product(id: &str, price: f64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: "A perfectly fine product".to_owned(),
            price,
            category: "misc".to_owned(),
            merchant: None,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ada Lovelace".to_owned(),
            street: "1 Analytical Way".to_owned(),
            city: "London".to_owned(),
            state: "LDN".to_owned(),
            zip_code: "N1".to_owned(),
            phone: "555-0100".to_owned(),
        }
    }

    fn store() -> (CartStore<Arc<InMemoryStorage>>, Arc<InMemoryStorage>) {
        let storage = Arc::new(InMemoryStorage::new());
        (CartStore::new(Arc::clone(&storage)), storage)
    }

    #[test]
    fn repeated_adds_merge_into_one_entry() {
        let (mut cart, _storage) = store();
        let p1 = product("p1", 10.0);
        for _ in 0..3 {
            let _quantity = cart.add_to_cart(&p1);
        }
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.entries()[0].quantity, 3);
    }

    #[test]
    fn two_units_at_ten_total_twenty() {
        let (mut cart, _storage) = store();
        let p1 = product("p1", 10.0);
        assert_eq!(cart.add_to_cart(&p1), 1);
        assert_eq!(cart.add_to_cart(&p1), 2);
        assert_eq!(cart.len(), 1);
        assert!((cart.cart_total() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_and_count_over_several_entries() {
        let (mut cart, _storage) = store();
        let _q = cart.add_to_cart(&product("p1", 2.5));
        let _q = cart.add_to_cart(&product("p2", 4.0));
        let _q = cart.add_to_cart(&product("p2", 4.0));
        assert!((cart.cart_total() - 10.5).abs() < f64::EPSILON);
        assert_eq!(cart.cart_count(), 3);
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn empty_cart_totals_zero() {
        let (cart, _storage) = store();
        assert!(cart.cart_total().abs() < f64::EPSILON);
        assert!(cart.cart_total().is_sign_positive());
        assert_eq!(format!("{:.2}", cart.cart_total()), "0.00");
        assert_eq!(cart.cart_count(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn non_finite_price_counts_as_zero() {
        let (mut cart, _storage) = store();
        let _q = cart.add_to_cart(&product("p1", f64::NAN));
        let _q = cart.add_to_cart(&product("p2", 3.0));
        assert!((cart.cart_total() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn insertion_order_is_kept() {
        let (mut cart, _storage) = store();
        for id in ["c", "a", "b", "a"] {
            let _q = cart.add_to_cart(&product(id, 1.0));
        }
        let ids: Vec<&str> = cart.entries().iter().map(|e| e.product_id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn low_quantity_is_rejected_without_change() {
        let (mut cart, _storage) = store();
        let p1 = product("p1", 1.0);
        let _q = cart.add_to_cart(&p1);
        let _q = cart.add_to_cart(&p1);
        for bad in [0, -1, i64::MIN] {
            let err = cart.update_quantity(&p1.id, bad).unwrap_err();
            assert!(matches!(
                err,
                StorefrontError::Validation(ValidationError::QuantityTooLow(q)) if q == bad
            ));
            assert_eq!(cart.get(&p1.id).unwrap().quantity, 2);
        }
    }

    #[test]
    fn update_quantity_sets_value() {
        let (mut cart, _storage) = store();
        let p1 = product("p1", 1.5);
        let _q = cart.add_to_cart(&p1);
        assert!(cart.update_quantity(&p1.id, 4).unwrap());
        assert_eq!(cart.get(&p1.id).unwrap().quantity, 4);
        assert!((cart.cart_total() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn update_quantity_for_unknown_product_is_a_no_op() {
        let (mut cart, storage) = store();
        assert!(!cart.update_quantity(&ProductId::new("ghost"), 2).unwrap());
        assert!(cart.is_empty());
        assert_eq!(storage.get(CART_KEY).unwrap(), None);
    }

    #[test]
    fn remove_and_clear() {
        let (mut cart, _storage) = store();
        let p1 = product("p1", 1.0);
        let p2 = product("p2", 1.0);
        let _q = cart.add_to_cart(&p1);
        let _q = cart.add_to_cart(&p2);
        assert!(cart.remove_from_cart(&p1.id));
        assert!(!cart.remove_from_cart(&p1.id));
        assert_eq!(cart.len(), 1);
        cart.clear_cart();
        assert!(cart.is_empty());
    }

    #[test]
    fn mutations_are_persisted_and_reloaded() {
        let (mut cart, storage) = store();
        let _q = cart.add_to_cart(&product("p1", 10.0));
        let _q = cart.add_to_cart(&product("p1", 10.0));
        let _q = cart.add_to_cart(&product("p2", 5.0));

        let mut reloaded = CartStore::new(Arc::clone(&storage));
        assert_eq!(reloaded.load(), 2);
        assert_eq!(reloaded.entries(), cart.entries());

        cart.clear_cart();
        assert_eq!(storage.get(CART_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn corrupt_persisted_cart_is_discarded() {
        let (mut cart, storage) = store();
        storage.set(CART_KEY, "{oops").unwrap();
        assert_eq!(cart.load(), 0);
        assert_eq!(storage.get(CART_KEY).unwrap(), None);
    }

    #[test]
    fn nan_priced_entry_survives_reload() {
        let (mut cart, storage) = store();
        let _q = cart.add_to_cart(&product("good", 10.0));
        let _q = cart.add_to_cart(&product("bad", f64::NAN));

        let mut reloaded = CartStore::new(Arc::clone(&storage));
        assert_eq!(reloaded.load(), 2);
        assert_eq!(reloaded.get(&ProductId::new("bad")).map(|entry| entry.quantity), Some(1));
        assert!((reloaded.cart_total() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn null_price_in_storage_is_coerced() {
        let (mut cart, storage) = store();
        let raw = r#"[
            {"productId":"good","title":"A","price":10.0,"quantity":1},
            {"productId":"bad","title":"B","price":null,"quantity":2}
        ]"#;
        storage.set(CART_KEY, raw).unwrap();
        assert_eq!(cart.load(), 2);
        assert_eq!(cart.cart_count(), 3);
        assert!((cart.cart_total() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_drops_zero_quantities_and_merges_duplicates() {
        let (mut cart, storage) = store();
        let raw = r#"[
            {"productId":"p1","title":"A","price":1.0,"quantity":2},
            {"productId":"p2","title":"B","price":1.0,"quantity":0},
            {"productId":"p1","title":"A","price":1.0,"quantity":1}
        ]"#;
        storage.set(CART_KEY, raw).unwrap();
        assert_eq!(cart.load(), 1);
        assert_eq!(cart.entries()[0].quantity, 3);
    }

    #[test]
    fn add_with_notice_announces_title() {
        let (mut cart, _storage) = store();
        let mut notices = NotificationQueue::new();
        let _q = cart.add_to_cart_with_notice(&product("p1", 1.0), &mut notices);
        assert_eq!(notices.toasts()[0].message, "Product p1 added to cart!");
        assert_eq!(notices.toasts()[0].kind, ToastKind::Success);
    }

    #[test]
    fn checkout_clears_cart_and_returns_summary() {
        let (mut cart, storage) = store();
        let mut notices = NotificationQueue::new();
        let _q = cart.add_to_cart(&product("p1", 10.0));
        let _q = cart.add_to_cart(&product("p1", 10.0));

        let summary = cart.checkout(address(), &mut notices).unwrap();
        assert_eq!(summary.entries.len(), 1);
        assert!((summary.total - 20.0).abs() < f64::EPSILON);
        assert_eq!(summary.address, address());
        assert!(cart.is_empty());
        assert_eq!(storage.get(CART_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(notices.toasts()[0].message, messages::success::ORDER_PLACED);
    }

    #[test]
    fn checkout_rejects_empty_cart() {
        let (mut cart, _storage) = store();
        let mut notices = NotificationQueue::new();
        let err = cart.checkout(address(), &mut notices).unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(ValidationError::EmptyCart)));
        assert_eq!(notices.toasts()[0].kind, ToastKind::Error);
    }

    #[test]
    fn checkout_rejects_incomplete_address() {
        let (mut cart, _storage) = store();
        let mut notices = NotificationQueue::new();
        let _q = cart.add_to_cart(&product("p1", 1.0));
        let incomplete = ShippingAddress {
            city: String::new(),
            ..address()
        };
        let err = cart.checkout(incomplete, &mut notices).unwrap_err();
        assert!(matches!(
            err,
            StorefrontError::Validation(ValidationError::Required { field: "city" })
        ));
        assert_eq!(cart.len(), 1);
    }
}

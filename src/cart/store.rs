//! Cart Store
//!
//! Keeps the cart in memory as the live source of truth and writes the whole
//! line array to storage after every mutation. Other processes sharing the
//! storage pick up changes through [`CartStore::reload`].

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    cart::{Cart, CartLine, LineKey, summary::CartSummary},
    notify::{SubscriptionId, Subscribers},
    pricing::PricingError,
    storage::{CART_STORAGE_KEY, Storage, StorageError},
};

/// Errors raised by cart mutations.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// The cart could not be written.
    #[error("failed to persist cart")]
    Storage(#[from] StorageError),

    /// The cart could not be serialized.
    #[error("failed to serialize cart")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted shopping cart.
#[derive(Debug)]
pub struct CartStore<S: Storage> {
    storage: S,
    cart: Cart,
    error: Option<String>,
    subscribers: Subscribers<[CartLine]>,
}

impl<S: Storage> CartStore<S> {
    /// Open the cart persisted in `storage`.
    ///
    /// An unreadable cart is not an error: the store starts empty and reports
    /// the problem through [`CartStore::error`].
    pub fn load(storage: S) -> Self {
        let mut store = Self {
            storage,
            cart: Cart::new(),
            error: None,
            subscribers: Subscribers::new(),
        };

        store.reload();

        store
    }

    /// Re-read the persisted cart, replacing the in-memory lines.
    ///
    /// On failure the in-memory lines are kept and the error message is
    /// recorded until the next successful reload.
    pub fn reload(&mut self) {
        match self.read() {
            Ok(lines) => {
                self.error = None;

                if lines != self.cart.lines() {
                    self.cart = Cart::from_lines(lines);
                    self.subscribers.notify(self.cart.lines());
                }
            }
            Err(message) => {
                warn!(%message, "could not read persisted cart");

                self.error = Some(message);
            }
        }
    }

    fn read(&self) -> Result<Vec<CartLine>, String> {
        let raw = self
            .storage
            .get(CART_STORAGE_KEY)
            .map_err(|error| format!("cart storage unavailable: {error}"))?;

        match raw {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|error| format!("cart data is unreadable: {error}")),
        }
    }

    /// Add an item, merging it into the line with the same id, size and variant.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the cart cannot be persisted.
    pub fn add_item(&mut self, item: CartLine) -> Result<(), CartStoreError> {
        let mut cart = self.cart.clone();

        cart.add(item);

        self.commit(cart)
    }

    /// Add one unit to a line. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the cart cannot be persisted.
    pub fn increment(&mut self, key: &LineKey) -> Result<(), CartStoreError> {
        let mut cart = self.cart.clone();

        if cart.increment(key) {
            self.commit(cart)?;
        }

        Ok(())
    }

    /// Take one unit off a line, never going below one. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the cart cannot be persisted.
    pub fn decrement(&mut self, key: &LineKey) -> Result<(), CartStoreError> {
        let mut cart = self.cart.clone();

        if cart.decrement(key) {
            self.commit(cart)?;
        }

        Ok(())
    }

    /// Remove a line. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the cart cannot be persisted.
    pub fn remove_item(&mut self, key: &LineKey) -> Result<(), CartStoreError> {
        let mut cart = self.cart.clone();

        if cart.remove(key) {
            self.commit(cart)?;
        }

        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), CartStoreError> {
        self.commit(Cart::new())
    }

    fn commit(&mut self, cart: Cart) -> Result<(), CartStoreError> {
        let raw = serde_json::to_string(cart.lines())?;

        self.storage.set(CART_STORAGE_KEY, &raw)?;

        debug!(lines = cart.len(), "cart persisted");

        self.cart = cart;
        self.error = None;
        self.subscribers.notify(self.cart.lines());

        Ok(())
    }

    /// Current cart lines.
    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    /// Current cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Totals for the current cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a line total overflows.
    pub fn summary(&self) -> Result<CartSummary, PricingError> {
        CartSummary::from_lines(self.cart.lines())
    }

    /// Last read error, if the persisted cart could not be read.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Be told about every change to the cart lines.
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&[CartLine]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    /// Stop being told about changes.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::storage::MemoryStorage;

    fn line(size: &str, quantity: u32) -> CartLine {
        CartLine::new(
            LineKey::new(1_u64, Some(size), None),
            quantity,
            Decimal::from(10),
        )
    }

    fn key(size: &str) -> LineKey {
        LineKey::new(1_u64, Some(size), None)
    }

    fn persisted(storage: &MemoryStorage) -> Result<Vec<CartLine>, Box<dyn std::error::Error>> {
        let raw = storage.get(CART_STORAGE_KEY)?.ok_or("nothing persisted")?;

        Ok(serde_json::from_str(&raw)?)
    }

    #[test]
    fn every_mutation_writes_the_whole_cart() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CartStore::load(Arc::clone(&storage));

        store.add_item(line("M", 1))?;
        store.add_item(line("L", 1))?;
        store.increment(&key("M"))?;

        let lines = persisted(&storage)?;

        assert_eq!(lines, store.lines());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.first().map(|line| line.quantity), Some(2));

        store.clear()?;

        assert!(persisted(&storage)?.is_empty());

        Ok(())
    }

    #[test]
    fn add_scenario_merges_quantities() -> TestResult {
        let mut store = CartStore::load(MemoryStorage::new());

        store.add_item(line("M", 1))?;
        store.add_item(line("M", 2))?;

        assert_eq!(store.lines().len(), 1);
        assert_eq!(store.lines().first().map(|line| line.quantity), Some(3));

        Ok(())
    }

    #[test]
    fn decrement_never_drops_below_one() -> TestResult {
        let mut store = CartStore::load(MemoryStorage::new());

        store.add_item(line("M", 2))?;

        for _ in 0..3 {
            store.decrement(&key("M"))?;
        }

        assert_eq!(store.lines().first().map(|line| line.quantity), Some(1));

        Ok(())
    }

    #[test]
    fn unreadable_cart_sets_error_until_next_good_read() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());

        storage.set(CART_STORAGE_KEY, "{not json")?;

        let mut store = CartStore::load(Arc::clone(&storage));

        assert!(store.lines().is_empty());
        assert!(store.error().is_some());

        storage.set(CART_STORAGE_KEY, r#"[{"id": 1, "size": "M", "price": 10}]"#)?;
        store.reload();

        assert!(store.error().is_none());
        assert_eq!(store.lines().len(), 1);

        Ok(())
    }

    #[test]
    fn failed_reload_keeps_last_good_lines() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CartStore::load(Arc::clone(&storage));

        store.add_item(line("M", 1))?;
        storage.set(CART_STORAGE_KEY, "garbage")?;
        store.reload();

        assert_eq!(store.lines().len(), 1);
        assert!(store.error().is_some());

        Ok(())
    }

    #[test]
    fn subscribers_hear_mutations_and_reloads() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CartStore::load(Arc::clone(&storage));
        let mut other_tab = CartStore::load(Arc::clone(&storage));

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        other_tab.subscribe(move |lines| {
            counter.store(lines.len(), Ordering::SeqCst);
        });

        store.add_item(line("M", 1))?;
        store.add_item(line("L", 1))?;

        assert_eq!(seen.load(Ordering::SeqCst), 0);

        other_tab.reload();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(other_tab.lines(), store.lines());

        Ok(())
    }

    #[test]
    fn noop_mutations_do_not_notify() -> TestResult {
        let mut store = CartStore::load(MemoryStorage::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        store.add_item(line("M", 1))?;
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.decrement(&key("M"))?;
        store.increment(&key("XL"))?;
        store.remove_item(&key("XL"))?;

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        Ok(())
    }
}

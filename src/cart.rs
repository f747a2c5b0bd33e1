// Cart store: the ordered list of pizzas the visitor intends to order.
// Persisted as a JSON array under one key of the profile's key-value storage
// and shared by every page and tab of the site.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{CartItemError, StorageError};
use crate::storage::KeyValueStorage;

pub const CART_KEY: &str = "cart";

/// One order line. Two items are the same order when name, date and time
/// all match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCartItem")]
pub struct CartItem {
    name: String,
    date: String,
    time: String,
}

#[derive(Deserialize)]
struct RawCartItem {
    name: String,
    date: String,
    time: String,
}

impl TryFrom<RawCartItem> for CartItem {
    type Error = CartItemError;

    fn try_from(raw: RawCartItem) -> Result<Self, Self::Error> {
        CartItem::new(raw.name, raw.date, raw.time)
    }
}

impl CartItem {
    /// Builds an item, trimming surrounding whitespace. Every field must be
    /// non-empty afterwards.
    pub fn new(
        name: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Result<Self, CartItemError> {
        let name = required(name.into(), "name")?;
        let date = required(date.into(), "date")?;
        let time = required(time.into(), "time")?;
        Ok(Self { name, date, time })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn time(&self) -> &str {
        &self.time
    }
}

fn required(value: String, field: &'static str) -> Result<String, CartItemError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CartItemError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Decodes persisted cart text.
///
/// Anything that is not a JSON array reads as an empty cart. Array entries
/// that are not valid items are dropped; the rest keep their order.
pub fn parse_cart(raw: &str) -> Vec<CartItem> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("[Cart] Stored cart is not valid JSON ({}), treating as empty", e);
            return Vec::new();
        }
    };

    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        serde_json::Value::Null => return Vec::new(),
        other => {
            log::warn!("[Cart] Stored cart is not a list ({}), treating as empty", other);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<CartItem>(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("[Cart] Dropping malformed cart entry: {}", e);
                None
            }
        })
        .collect()
}

/// Where a page shows the number of items in the cart.
pub trait CountDisplay: Send + Sync {
    fn show_count(&self, count: usize);
}

/// Text element holding the cart count, as rendered in the page header.
#[derive(Debug, Default)]
pub struct CountBadge {
    text: Mutex<String>,
}

impl CountBadge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

impl CountDisplay for CountBadge {
    fn show_count(&self, count: usize) {
        if let Ok(mut text) = self.text.lock() {
            *text = count.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChangeKind {
    Added(CartItem),
    Removed { index: usize, item: CartItem },
    Saved,
    Cleared,
}

/// Delivered to subscribers after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChange {
    pub kind: CartChangeKind,
    pub cart: Vec<CartItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AddOutcome {
    Added,
    /// The same name, date and time was already in the cart. Nothing changed.
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&CartChange) + Send + Sync>;

pub struct CartStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    count_display: Option<Arc<dyn CountDisplay>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl CartStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, CART_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            count_display: None,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Attaches the page's count element. Pages without one skip count updates.
    pub fn with_count_display(mut self, display: Arc<dyn CountDisplay>) -> Self {
        self.count_display = Some(display);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    pub fn get_cart(&self) -> Vec<CartItem> {
        let cart = match self.storage.get(&self.key) {
            Ok(Some(raw)) => parse_cart(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("[Cart] Failed to read cart: {}, treating as empty", e);
                Vec::new()
            }
        };
        log::debug!("[Cart] Current cart: {:?}", cart);
        cart
    }

    pub fn save_cart(&self, cart: &[CartItem]) -> Result<(), StorageError> {
        self.commit(cart, CartChangeKind::Saved)
    }

    pub fn add_to_cart(&self, item: CartItem) -> Result<AddOutcome, StorageError> {
        let mut cart = self.get_cart();

        if cart.iter().any(|existing| *existing == item) {
            log::info!("[Cart] Item already in cart: {:?}", item);
            return Ok(AddOutcome::Duplicate);
        }

        cart.push(item.clone());
        self.commit(&cart, CartChangeKind::Added(item.clone()))?;
        log::info!("[Cart] Item added to cart: {:?}", item);
        Ok(AddOutcome::Added)
    }

    /// Removes the item at `index`. Out-of-range positions leave the cart alone
    /// and return `None`.
    pub fn remove_item(&self, index: usize) -> Result<Option<CartItem>, StorageError> {
        let mut cart = self.get_cart();
        if index >= cart.len() {
            log::debug!("[Cart] Ignoring remove at {} (cart has {})", index, cart.len());
            return Ok(None);
        }

        let item = cart.remove(index);
        self.commit(
            &cart,
            CartChangeKind::Removed {
                index,
                item: item.clone(),
            },
        )?;
        log::info!("[Cart] Item removed from cart: {:?}", item);
        Ok(Some(item))
    }

    /// Drops the persisted cart entirely (after a successful payment).
    pub fn clear_cart(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)?;
        log::info!("[Cart] Cart cleared");
        self.update_cart_count();
        self.notify(&CartChange {
            kind: CartChangeKind::Cleared,
            cart: Vec::new(),
        });
        Ok(())
    }

    /// Writes the current item count into the page's count element, if any.
    pub fn update_cart_count(&self) -> usize {
        let count = self.get_cart().len();
        if let Some(display) = &self.count_display {
            display.show_count(count);
            log::debug!("[Cart] Cart count updated: {}", count);
        }
        count
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CartChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(existing, _)| *existing != id);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    fn commit(&self, cart: &[CartItem], kind: CartChangeKind) -> Result<(), StorageError> {
        log::debug!("[Cart] Saving cart: {:?}", cart);
        let json = serde_json::to_string(cart)?;
        self.storage.set(&self.key, &json)?;
        self.update_cart_count();
        self.notify(&CartChange {
            kind,
            cart: cart.to_vec(),
        });
        Ok(())
    }

    fn notify(&self, change: &CartChange) {
        // Snapshot so listeners may call back into the store.
        let listeners: Vec<Listener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| l.clone()).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(change);
        }
    }
}

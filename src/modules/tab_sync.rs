// Cross-tab cart synchronization.
//
// Every open page is a tab with its own CartStore over the shared storage.
// The store tells its own tab about a change synchronously (count badge,
// subscribers). This module fans the change out to the other tabs over a
// broadcast channel; each of them re-reads the full cart when it polls.
// Nothing is serialized between tabs: the last write wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use url::Url;

use crate::cart::{CartStore, CountBadge, SubscriptionId};
use crate::modules::cart_page::{self, CartPageView};
use crate::modules::navigation::{NavAction, Page};
use crate::modules::payment;
use crate::storage::KeyValueStorage;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub source_tab: String,
}

/// What a tab should show after reacting to a change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRefresh {
    pub tab_id: String,
    pub count: usize,
    /// Present only for tabs on the cart page.
    pub cart_view: Option<CartPageView>,
    pub navigation: Option<NavAction>,
}

pub struct TabSync {
    sender: broadcast::Sender<StorageEvent>,
    next_tab: AtomicU64,
}

impl Default for TabSync {
    fn default() -> Self {
        Self::new()
    }
}

impl TabSync {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            next_tab: AtomicU64::new(1),
        }
    }

    pub fn publish(&self, event: StorageEvent) {
        // No receivers just means no other tab is open.
        let _ = self.sender.send(event);
    }

    /// Opens a tab at `location` backed by `storage` under `cart_key`.
    pub fn open_tab(
        &self,
        storage: Arc<dyn KeyValueStorage>,
        cart_key: &str,
        location: Url,
    ) -> TabSession {
        let id = format!("tab-{}", self.next_tab.fetch_add(1, Ordering::Relaxed));
        let badge = Arc::new(CountBadge::new());
        let store = Arc::new(CartStore::with_key(storage, cart_key).with_count_display(badge.clone()));

        let sender = self.sender.clone();
        let (source_tab, key) = (id.clone(), cart_key.to_string());
        let subscription = store.subscribe(move |_| {
            let _ = sender.send(StorageEvent {
                key: key.clone(),
                source_tab: source_tab.clone(),
            });
        });

        let session = TabSession {
            id,
            page: Page::from_location(&location),
            location,
            store,
            badge,
            events: self.sender.subscribe(),
            subscription,
        };
        log::info!("[TabSync] Opened {} on {:?}", session.id, session.page);
        session.refresh();
        session
    }
}

pub struct TabSession {
    id: String,
    page: Option<Page>,
    location: Url,
    store: Arc<CartStore>,
    badge: Arc<CountBadge>,
    events: broadcast::Receiver<StorageEvent>,
    subscription: SubscriptionId,
}

impl TabSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page(&self) -> Option<Page> {
        self.page
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn store(&self) -> &CartStore {
        &self.store
    }

    /// Text of the tab's cart count badge.
    pub fn count_text(&self) -> String {
        self.badge.text()
    }

    /// Applies a navigation to this tab. Scrolling leaves the location alone.
    pub fn navigate(&mut self, action: &NavAction) -> Option<Page> {
        if let Some(target) = action.target(&self.location) {
            self.page = Page::from_location(&target);
            self.location = target;
            log::debug!("[TabSync] {} now at {}", self.id, self.location);
            self.store.update_cart_count();
        }
        self.page
    }

    /// Handles storage events raised by other tabs since the last poll.
    /// Several events collapse into a single refresh.
    pub fn poll(&mut self) -> Option<TabRefresh> {
        let mut changed = false;

        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if event.source_tab != self.id && event.key == self.store.key() {
                        log::debug!("[TabSync] {} saw storage event from {}", self.id, event.source_tab);
                        changed = true;
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    log::warn!("[TabSync] {} missed {} events, refreshing", self.id, missed);
                    changed = true;
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => break,
            }
        }

        if !changed {
            return None;
        }
        Some(self.refresh())
    }

    /// Page visibility changed. Hidden tabs do nothing.
    pub fn on_visibility_change(&mut self, visible: bool) -> Option<TabRefresh> {
        if !visible {
            return None;
        }
        log::debug!("[TabSync] {} became visible, refreshing cart", self.id);

        let mut refresh = self.refresh();
        if self.page == Some(Page::Payment) {
            refresh.navigation = Some(payment::on_visible());
        }
        Some(refresh)
    }

    /// Re-reads the cart for this tab's count badge and, on the cart page, its list.
    pub fn refresh(&self) -> TabRefresh {
        let count = self.store.update_cart_count();
        let cart_view = match self.page {
            Some(Page::Cart) => Some(cart_page::display_cart(&self.store)),
            _ => None,
        };

        TabRefresh {
            tab_id: self.id.clone(),
            count,
            cart_view,
            navigation: None,
        }
    }
}

impl Drop for TabSession {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
        log::debug!("[TabSync] Closed {}", self.id);
    }
}

// Shared application state.
// Holds the profile storage, the open tabs and their per-tab page state.
// No Tauri imports here so it can be driven from tests directly.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use url::Url;

use crate::modules::navigation::{NavAction, Page};
use crate::modules::order_modal::OrderModal;
use crate::modules::reveal::{CategoryBrowser, IntersectionEntry, RevealTracker};
use crate::modules::session::RoleStore;
use crate::modules::tab_sync::{TabRefresh, TabSession, TabSync};
use crate::settings::SiteConfig;
use crate::storage::{FileStorage, KeyValueStorage};

pub struct AppState {
    pub config: ArcSwap<SiteConfig>,
    pub storage: Arc<dyn KeyValueStorage>,
    pub sync: TabSync,
    pub tabs: DashMap<String, TabSession>,
    pub modals: DashMap<String, OrderModal>,
    pub reveals: DashMap<String, RevealTracker>,
    pub categories: DashMap<String, CategoryBrowser>,
}

impl AppState {
    pub fn new(config: SiteConfig, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            storage,
            sync: TabSync::new(),
            tabs: DashMap::new(),
            modals: DashMap::new(),
            reveals: DashMap::new(),
            categories: DashMap::new(),
        }
    }

    /// State for a profile living in `data_dir`: config plus file-backed storage.
    pub fn open(data_dir: &Path) -> Self {
        let config = SiteConfig::load(data_dir);
        let storage = Arc::new(FileStorage::open(config.storage_path(data_dir)));
        Self::new(config, storage)
    }

    /// Re-reads the config file. Open tabs keep the cart key they started with.
    pub fn reload_config(&self, data_dir: &Path) {
        self.config.store(Arc::new(SiteConfig::load(data_dir)));
        log::info!("[State] Site config reloaded");
    }

    pub fn roles(&self) -> RoleStore {
        RoleStore::with_key(self.storage.clone(), self.config.load().role_key.clone())
    }

    /// Opens a tab on `location` (relative locations resolve against the site base).
    pub fn open_tab(&self, location: &str) -> Result<TabRefresh, url::ParseError> {
        let config = self.config.load();
        let url = config.base().join(location)?;

        let session = self.sync.open_tab(self.storage.clone(), &config.cart_key, url);
        let refresh = session.refresh();
        self.tabs.insert(session.id().to_string(), session);
        Ok(refresh)
    }

    pub fn close_tab(&self, tab_id: &str) -> bool {
        self.modals.remove(tab_id);
        self.reveals.remove(tab_id);
        self.categories.remove(tab_id);
        self.tabs.remove(tab_id).is_some()
    }

    /// Lets every tab react to changes made elsewhere. Returns one refresh per
    /// tab whose view is stale.
    pub fn sync_tabs(&self) -> Vec<TabRefresh> {
        self.tabs
            .iter_mut()
            .filter_map(|mut tab| tab.value_mut().poll())
            .collect()
    }

    /// Like [`sync_tabs`](Self::sync_tabs) after `source_tab` changed the cart.
    /// The source tab never hears its own storage event, so its refresh is
    /// always included.
    pub fn sync_after_change(&self, source_tab: &str) -> Vec<TabRefresh> {
        self.tabs
            .iter_mut()
            .filter_map(|mut tab| {
                let polled = tab.value_mut().poll();
                if tab.key() == source_tab {
                    Some(polled.unwrap_or_else(|| tab.refresh()))
                } else {
                    polled
                }
            })
            .collect()
    }

    /// Runs a delayed redirect only if the tab is still where it was when the
    /// redirect was scheduled. Returns the new location when it moved.
    pub fn redirect_if_unmoved(&self, tab_id: &str, scheduled_at: &Url, action: &NavAction) -> Option<Url> {
        let mut tab = self.tabs.get_mut(tab_id)?;
        if tab.location() != scheduled_at {
            log::debug!(
                "[State] Dropping redirect of {}: left {} for {}",
                tab_id,
                scheduled_at,
                tab.location()
            );
            return None;
        }
        tab.navigate(action);
        Some(tab.location().clone())
    }

    /// Page load: start watching the page's animated elements.
    pub fn observe_reveals(&self, tab_id: &str, element_ids: &[String]) {
        let mut tracker = RevealTracker::new(self.config.load().reveal_threshold);
        for id in element_ids {
            tracker.observe(id.as_str());
        }
        self.reveals.insert(tab_id.to_string(), tracker);
    }

    /// Elements of `tab_id` that should animate in after this intersection report.
    pub fn report_intersections(&self, tab_id: &str, entries: &[IntersectionEntry]) -> Vec<String> {
        match self.reveals.get_mut(tab_id) {
            Some(mut tracker) => tracker.on_intersections(entries),
            None => Vec::new(),
        }
    }

    /// Page load: remember the menu's category sections.
    pub fn register_categories(&self, tab_id: &str, sections: &[String]) {
        self.categories
            .insert(tab_id.to_string(), CategoryBrowser::new(sections.iter().cloned()));
    }

    pub fn reveal_category(&self, tab_id: &str, category: &str) -> Option<NavAction> {
        self.categories.get_mut(tab_id)?.reveal(category)
    }

    /// Which page `tab_id` currently shows.
    pub fn tab_page(&self, tab_id: &str) -> Option<Page> {
        self.tabs.get(tab_id).and_then(|tab| tab.page())
    }
}

// Login page: remembers which role the visitor picked.
// There is no authentication; the role is a plain string other pages read.

use std::sync::Arc;

use crate::error::StorageError;
use crate::modules::navigation::{NavAction, Page};
use crate::storage::KeyValueStorage;

pub const ROLE_KEY: &str = "role";

pub struct RoleStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl RoleStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, ROLE_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Login form submission: store the role and continue to the dashboard.
    pub fn login(&self, role: &str) -> Result<NavAction, StorageError> {
        self.storage.set(&self.key, role)?;
        log::info!("[Session] Role selected: {}", role);
        Ok(NavAction::to_page(Page::Dashboard))
    }

    pub fn current_role(&self) -> Option<String> {
        match self.storage.get(&self.key) {
            Ok(role) => role,
            Err(e) => {
                log::warn!("[Session] Failed to read role: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_login_stores_role_and_goes_to_dashboard() {
        let storage = Arc::new(MemoryStorage::new());
        let roles = RoleStore::new(storage.clone());
        assert_eq!(roles.current_role(), None);

        let action = roles.login("customer").unwrap();

        assert_eq!(action, NavAction::Navigate { href: "dashboard.html".to_string() });
        assert_eq!(roles.current_role().as_deref(), Some("customer"));
        assert_eq!(storage.get("role").unwrap().as_deref(), Some("customer"));
    }

    #[test]
    fn test_login_overwrites_previous_role() {
        let roles = RoleStore::new(Arc::new(MemoryStorage::new()));
        roles.login("customer").unwrap();
        roles.login("admin").unwrap();
        assert_eq!(roles.current_role().as_deref(), Some("admin"));
    }
}

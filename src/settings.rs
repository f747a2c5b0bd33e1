use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::cart::CART_KEY;
use crate::error::StorageError;
use crate::modules::session::ROLE_KEY;

pub const CONFIG_FILE: &str = "site_config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin the site pages are served from. Page links resolve against it.
    pub base_url: String,
    /// File (inside the data directory) holding the profile's local storage.
    pub storage_file: String,
    pub cart_key: String,
    pub role_key: String,
    /// How long an empty payment page waits before going back to the cart.
    pub empty_cart_redirect_ms: u64,
    /// Fraction of an element that must be on screen before it animates in.
    pub reveal_threshold: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "tauri://localhost/".to_string(),
            storage_file: "local_storage.json".to_string(),
            cart_key: CART_KEY.to_string(),
            role_key: ROLE_KEY.to_string(),
            empty_cart_redirect_ms: 1500,
            reveal_threshold: 0.1,
        }
    }
}

impl SiteConfig {
    pub fn get_path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    pub fn load(data_dir: &Path) -> Self {
        let path = Self::get_path(data_dir);
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    log::warn!("[Config] Failed to parse site config: {}, returning defaults", e);
                    Self::default()
                }),
                Err(e) => {
                    log::warn!("[Config] Failed to read file: {}, returning defaults", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    pub fn save(&self, data_dir: &Path) -> Result<(), StorageError> {
        let path = Self::get_path(data_dir);
        let tmp_path = path.with_extension("tmp");

        fs::create_dir_all(data_dir)?;

        let json = serde_json::to_string_pretty(self)?;

        // Write to tmp, then rename, so a crash never leaves half a file.
        fs::write(&tmp_path, json)?;
        fs::rename(tmp_path, path)?;

        Ok(())
    }

    pub fn storage_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.storage_file)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.empty_cart_redirect_ms)
    }

    /// Parsed `base_url`, falling back to the default origin when unparseable.
    pub fn base(&self) -> Url {
        Url::parse(&self.base_url).unwrap_or_else(|e| {
            log::warn!("[Config] Invalid base_url {:?}: {}, using default", self.base_url, e);
            Url::parse(&Self::default().base_url).expect("default base_url is a valid URL")
        })
    }
}

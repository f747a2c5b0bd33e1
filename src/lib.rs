// Pizza Order Library Entry Point
// Exposes the cart store and page logic so the desktop shell and tests
// can use them independently.

pub mod cart;
pub mod error;
pub mod settings;
pub mod state;
pub mod storage;

// Pure page logic (no Tauri imports)
pub mod modules;

#[cfg(feature = "desktop")]
pub mod desktop;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    desktop::run()
}

// Module exports for pure page logic
pub mod navigation;
pub mod session;        // Login role
pub mod order_modal;    // Date/time capture
pub mod cart_page;      // Cart review rendering
pub mod payment;        // Checkout
pub mod reveal;         // Scroll + category reveal
pub mod tab_sync;       // Cross-tab fan-out

// Payment page: read-only order summary plus a card form.
// No payment is processed. Any four non-empty fields are accepted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cart::{CartItem, CartStore};
use crate::modules::cart_page::escape_html;
use crate::modules::navigation::{Alert, NavAction, Page};

pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty.";
pub const MISSING_DETAILS: &str = "Please fill all payment details.";
pub const PAYMENT_SUCCESS: &str = "Payment successful! Your booking is confirmed.";
pub const PAYMENT_FAILED: &str = "Could not complete your booking. Please try again.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPageView {
    pub items: Vec<CartItem>,
    pub summary_html: String,
    pub form_visible: bool,
    /// Set when the cart is empty: go back to the cart page after a delay.
    pub redirect: Option<NavAction>,
}

impl PaymentPageView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Builds the page from a fresh read of the cart.
pub fn load(store: &CartStore, redirect_delay: Duration) -> PaymentPageView {
    let cart = store.get_cart();
    log::debug!("[Payment] Payment page cart: {:?}", cart);

    if cart.is_empty() {
        log::info!(
            "[Payment] Cart empty, returning to cart page in {}ms",
            redirect_delay.as_millis()
        );
        return PaymentPageView {
            items: cart,
            summary_html: format!("<p>{}</p>", EMPTY_CART_MESSAGE),
            form_visible: false,
            redirect: Some(NavAction::RedirectAfter {
                href: Page::Cart.file_name().to_string(),
                delay_ms: redirect_delay.as_millis() as u64,
            }),
        };
    }

    let summary_html = cart
        .iter()
        .map(|item| {
            format!(
                "<div class=\"cart-item\"><strong>{}</strong><br/>Date: {} | Time: {}<br/><br/></div>",
                escape_html(item.name()),
                escape_html(item.date()),
                escape_html(item.time()),
            )
        })
        .collect();

    PaymentPageView {
        items: cart,
        summary_html,
        form_visible: true,
        redirect: None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub card_name: String,
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
}

impl PaymentDetails {
    fn is_complete(&self) -> bool {
        [&self.card_name, &self.card_number, &self.expiry, &self.cvv]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub alert: Alert,
    pub navigation: NavAction,
}

/// Form submission. On success the cart is gone and the visitor moves on
/// to the confirmation page.
pub fn submit(store: &CartStore, details: &PaymentDetails) -> Result<PaymentReceipt, Alert> {
    if !details.is_complete() {
        return Err(Alert::new(MISSING_DETAILS));
    }

    store.clear_cart().map_err(|e| {
        log::warn!("[Payment] Failed to clear cart after payment: {}", e);
        Alert::new(PAYMENT_FAILED)
    })?;
    log::info!("[Payment] Booking confirmed");

    Ok(PaymentReceipt {
        alert: Alert::new(PAYMENT_SUCCESS),
        navigation: NavAction::to_page(Page::Confirmation),
    })
}

/// The payment page is rebuilt from scratch whenever it becomes visible again.
pub fn on_visible() -> NavAction {
    NavAction::Reload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use rstest::rstest;
    use std::sync::Arc;

    fn details() -> PaymentDetails {
        PaymentDetails {
            card_name: "Ada Lovelace".to_string(),
            card_number: "4111 1111 1111 1111".to_string(),
            expiry: "12/30".to_string(),
            cvv: "123".to_string(),
        }
    }

    fn store_with(names: &[&str]) -> CartStore {
        let store = CartStore::new(Arc::new(MemoryStorage::new()));
        for name in names {
            store
                .add_to_cart(CartItem::new(*name, "2024-07-01", "18:00").unwrap())
                .unwrap();
        }
        store
    }

    #[test]
    fn test_empty_cart_hides_form_and_redirects() {
        let store = store_with(&[]);
        let view = load(&store, Duration::from_millis(1500));

        assert!(view.is_empty());
        assert_eq!(view.summary_html, "<p>Your cart is empty.</p>");
        assert!(!view.form_visible);
        assert_eq!(
            view.redirect,
            Some(NavAction::RedirectAfter {
                href: "cart.html".to_string(),
                delay_ms: 1500
            })
        );
    }

    #[test]
    fn test_summary_lists_every_item() {
        let store = store_with(&["Margherita", "Diavola"]);
        let view = load(&store, Duration::from_millis(1500));

        assert!(view.form_visible);
        assert_eq!(view.redirect, None);
        assert_eq!(view.items.len(), 2);
        assert_eq!(
            view.summary_html,
            "<div class=\"cart-item\"><strong>Margherita</strong><br/>Date: 2024-07-01 | Time: 18:00<br/><br/></div>\
             <div class=\"cart-item\"><strong>Diavola</strong><br/>Date: 2024-07-01 | Time: 18:00<br/><br/></div>"
        );
    }

    #[test]
    fn test_submit_clears_cart_and_confirms() {
        let store = store_with(&["Margherita"]);

        let receipt = submit(&store, &details()).unwrap();

        assert_eq!(receipt.alert.message(), PAYMENT_SUCCESS);
        assert_eq!(receipt.navigation, NavAction::Navigate { href: "confirmation.html".to_string() });
        assert!(store.get_cart().is_empty());
    }

    #[rstest]
    #[case::no_name(PaymentDetails { card_name: " ".to_string(), ..details() })]
    #[case::no_number(PaymentDetails { card_number: String::new(), ..details() })]
    #[case::no_expiry(PaymentDetails { expiry: "\t".to_string(), ..details() })]
    #[case::no_cvv(PaymentDetails { cvv: String::new(), ..details() })]
    fn test_submit_requires_every_field(#[case] incomplete: PaymentDetails) {
        let store = store_with(&["Margherita"]);

        let alert = submit(&store, &incomplete).unwrap_err();

        assert_eq!(alert.message(), MISSING_DETAILS);
        assert_eq!(store.get_cart().len(), 1);
    }

    #[test]
    fn test_any_non_empty_card_is_accepted() {
        let store = store_with(&["Margherita"]);
        let odd = PaymentDetails {
            card_name: "x".to_string(),
            card_number: "not-a-number".to_string(),
            expiry: "whenever".to_string(),
            cvv: "?".to_string(),
        };
        assert!(submit(&store, &odd).is_ok());
    }

    #[test]
    fn test_details_wire_format() {
        let parsed: PaymentDetails = serde_json::from_value(serde_json::json!({
            "cardName": "Ada",
            "cardNumber": "4111",
            "expiry": "12/30",
            "cvv": "123"
        }))
        .unwrap();
        assert_eq!(parsed.card_number, "4111");
    }

    #[test]
    fn test_visible_again_reloads() {
        assert_eq!(on_visible(), NavAction::Reload);
    }
}

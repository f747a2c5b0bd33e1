use std::sync::Arc;

use chrono::Utc;
use pizza_order_lib::modules::cart_page;
use pizza_order_lib::modules::navigation::{self, NavAction, Page};
use pizza_order_lib::modules::order_modal::OrderModal;
use pizza_order_lib::modules::payment::{self, PaymentDetails};
use pizza_order_lib::settings::SiteConfig;
use pizza_order_lib::state::AppState;
use pizza_order_lib::storage::{FileStorage, MemoryStorage};

fn order(state: &AppState, tab_id: &str, name: &str, date: &str, time: &str) {
    let tab = state.tabs.get(tab_id).unwrap();
    let mut modal = OrderModal::new();
    modal.open(name);
    modal.set_date(date);
    modal.set_time(time);
    modal.confirm(tab.store()).unwrap();
}

fn card() -> PaymentDetails {
    PaymentDetails {
        card_name: "Ada Lovelace".to_string(),
        card_number: "4111111111111111".to_string(),
        expiry: "12/30".to_string(),
        cvv: "123".to_string(),
    }
}

#[test]
fn test_order_to_confirmation_across_tabs() {
    let state = AppState::new(SiteConfig::default(), Arc::new(MemoryStorage::new()));
    let menu = state.open_tab("order.html").unwrap().tab_id;
    let cart = state.open_tab("cart.html").unwrap().tab_id;

    order(&state, &menu, "Margherita", "2024-07-01", "18:00");
    order(&state, &menu, "Diavola", "2024-07-01", "19:00");
    order(&state, &menu, "Margherita", "2024-07-01", "18:00");
    assert_eq!(state.tabs.get(&menu).unwrap().count_text(), "2");

    // The cart tab catches up through the cross-tab channel.
    let refreshes = state.sync_tabs();
    assert_eq!(refreshes.len(), 1);
    let view = refreshes[0].cart_view.as_ref().unwrap();
    assert_eq!(view.cards.len(), 2);
    assert!(view.proceed_enabled);

    let (cart_count, proceed) = {
        let mut tab = state.tabs.get_mut(&cart).unwrap();
        let view = cart_page::remove_clicked(tab.store(), "1").unwrap();
        assert_eq!(view.cards.len(), 1);

        let action = navigation::proceed_to_payment(tab.store().get_cart().len(), Utc::now()).unwrap();
        assert_eq!(tab.navigate(&action), Some(Page::Payment));
        (tab.count_text(), action)
    };
    assert_eq!(cart_count, "1");
    assert!(matches!(proceed, NavAction::Navigate { ref href } if href.starts_with("payment.html?")));

    let refreshes = state.sync_tabs();
    assert_eq!(refreshes.len(), 1);
    assert_eq!(refreshes[0].tab_id, menu);
    assert_eq!(refreshes[0].count, 1);

    let mut tab = state.tabs.get_mut(&cart).unwrap();
    let view = payment::load(tab.store(), state.config.load().redirect_delay());
    assert!(view.form_visible);
    assert_eq!(view.items.len(), 1);

    let receipt = payment::submit(tab.store(), &card()).unwrap();
    assert!(tab.store().get_cart().is_empty());
    assert_eq!(tab.navigate(&receipt.navigation), Some(Page::Confirmation));
    drop(tab);

    let refreshes = state.sync_tabs();
    assert_eq!(refreshes[0].count, 0);
}

#[test]
fn test_empty_payment_page_returns_to_cart() {
    let state = AppState::new(SiteConfig::default(), Arc::new(MemoryStorage::new()));
    let tab_id = state.open_tab("payment.html?1").unwrap().tab_id;
    let mut tab = state.tabs.get_mut(&tab_id).unwrap();

    let view = payment::load(tab.store(), state.config.load().redirect_delay());

    assert_eq!(view.summary_html, "<p>Your cart is empty.</p>");
    assert!(!view.form_visible);
    let redirect = view.redirect.unwrap();
    assert_eq!(
        redirect,
        NavAction::RedirectAfter {
            href: "cart.html".to_string(),
            delay_ms: 1500
        }
    );
    assert_eq!(tab.navigate(&redirect), Some(Page::Cart));
}

#[test]
fn test_cart_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local_storage.json");

    {
        let state = AppState::new(SiteConfig::default(), Arc::new(FileStorage::open(&path)));
        let menu = state.open_tab("order.html").unwrap().tab_id;
        order(&state, &menu, "Quattro Formaggi", "2024-07-03", "20:15");
    }

    let state = AppState::new(SiteConfig::default(), Arc::new(FileStorage::open(&path)));
    let refresh = state.open_tab("cart.html").unwrap();
    assert_eq!(refresh.count, 1);
    assert_eq!(refresh.cart_view.unwrap().cards[0].name, "Quattro Formaggi");
}

// Desktop shell: every site page runs in its own webview window ("tab").
// Commands below are thin wrappers over the pure page logic in `modules`;
// cart changes are pushed to every tab, the one that made them included,
// as `cart-changed`.

use std::time::Duration;

use tauri::{AppHandle, Emitter, Manager, State, WebviewUrl};

use crate::cart::CartItem;
use crate::modules::cart_page::{self, CartPageView};
use crate::modules::navigation::{self, NavAction};
use crate::modules::reveal::IntersectionEntry;
use crate::modules::order_modal::{OrderConfirmation, OrderModal};
use crate::modules::payment::{self, PaymentDetails, PaymentPageView, PaymentReceipt};
use crate::modules::tab_sync::{TabRefresh, TabSession};
use crate::state::AppState;

pub const CART_CHANGED_EVENT: &str = "cart-changed";

fn with_tab<T>(
    state: &AppState,
    tab_id: &str,
    f: impl FnOnce(&mut TabSession) -> T,
) -> Result<T, String> {
    let mut tab = state
        .tabs
        .get_mut(tab_id)
        .ok_or_else(|| format!("unknown tab {}", tab_id))?;
    Ok(f(tab.value_mut()))
}

/// Pushes a refresh to `source_tab` and to every tab that has not seen the
/// latest cart yet.
fn broadcast_cart_change(app: &AppHandle, state: &AppState, source_tab: &str) {
    for refresh in state.sync_after_change(source_tab) {
        log::debug!("[Desktop] Storage event, updating {}", refresh.tab_id);
        if let Err(e) = app.emit_to(refresh.tab_id.as_str(), CART_CHANGED_EVENT, &refresh) {
            log::warn!("[Desktop] Failed to notify {}: {}", refresh.tab_id, e);
        }
    }
}

fn open_tab_window(app: &AppHandle, state: &AppState, location: &str) -> Result<TabRefresh, String> {
    let refresh = state.open_tab(location).map_err(|e| e.to_string())?;

    tauri::WebviewWindowBuilder::new(app, refresh.tab_id.as_str(), WebviewUrl::App(location.into()))
        .title("Pizza Order")
        .inner_size(1024.0, 768.0)
        .build()
        .map_err(|e| e.to_string())?;

    Ok(refresh)
}

fn show_location(app: &AppHandle, tab_id: &str, target: url::Url) -> Result<(), String> {
    if let Some(window) = app.get_webview_window(tab_id) {
        window.navigate(target).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn navigate_tab(app: &AppHandle, state: &AppState, tab_id: &str, action: &NavAction) -> Result<(), String> {
    let target = with_tab(state, tab_id, |tab| {
        tab.navigate(action);
        tab.location().clone()
    })?;

    // Scrolling is carried out by the page itself.
    if matches!(action, NavAction::ScrollIntoView { .. }) {
        return Ok(());
    }
    show_location(app, tab_id, target)
}

#[tauri::command]
fn open_tab(app: AppHandle, state: State<AppState>, location: String) -> Result<TabRefresh, String> {
    open_tab_window(&app, &state, &location)
}

#[tauri::command]
fn close_tab(state: State<AppState>, tab_id: String) -> bool {
    state.close_tab(&tab_id)
}

#[tauri::command]
fn get_cart(state: State<AppState>, tab_id: String) -> Result<Vec<CartItem>, String> {
    with_tab(&state, &tab_id, |tab| tab.store().get_cart())
}

#[tauri::command]
fn open_order(state: State<AppState>, tab_id: String, name: String) {
    state.modals.entry(tab_id).or_default().open(&name);
}

#[tauri::command]
fn confirm_order(
    app: AppHandle,
    state: State<AppState>,
    tab_id: String,
    date: String,
    time: String,
) -> Result<OrderConfirmation, String> {
    let confirmation = {
        let mut modal = state.modals.entry(tab_id.clone()).or_insert_with(OrderModal::new);
        modal.set_date(&date);
        modal.set_time(&time);
        with_tab(&state, &tab_id, |tab| modal.confirm(tab.store()))?
    };

    let confirmation = confirmation.map_err(|alert| alert.0)?;
    broadcast_cart_change(&app, &state, &tab_id);
    Ok(confirmation)
}

#[tauri::command]
fn cancel_order(state: State<AppState>, tab_id: String) {
    if let Some(mut modal) = state.modals.get_mut(&tab_id) {
        modal.cancel();
    }
}

#[tauri::command]
fn cart_page(state: State<AppState>, tab_id: String) -> Result<CartPageView, String> {
    with_tab(&state, &tab_id, |tab| cart_page::display_cart(tab.store()))
}

#[tauri::command]
fn remove_item(
    app: AppHandle,
    state: State<AppState>,
    tab_id: String,
    index: String,
) -> Result<CartPageView, String> {
    let view = with_tab(&state, &tab_id, |tab| cart_page::remove_clicked(tab.store(), &index))?
        .map_err(|e| e.to_string())?;
    broadcast_cart_change(&app, &state, &tab_id);
    Ok(view)
}

#[tauri::command]
fn proceed_to_payment(app: AppHandle, state: State<AppState>, tab_id: String) -> Result<NavAction, String> {
    let cart_len = with_tab(&state, &tab_id, |tab| tab.store().get_cart().len())?;
    let action = navigation::proceed_to_payment(cart_len, chrono::Utc::now()).map_err(|alert| alert.0)?;
    navigate_tab(&app, &state, &tab_id, &action)?;
    Ok(action)
}

#[tauri::command]
fn payment_page(app: AppHandle, state: State<AppState>, tab_id: String) -> Result<PaymentPageView, String> {
    let delay = state.config.load().redirect_delay();
    let (view, scheduled_at) =
        with_tab(&state, &tab_id, |tab| (payment::load(tab.store(), delay), tab.location().clone()))?;

    if let Some(redirect) = view.redirect.clone() {
        let app = app.clone();
        let tab_id = tab_id.clone();
        tauri::async_runtime::spawn(async move {
            if let NavAction::RedirectAfter { delay_ms, .. } = &redirect {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            }
            let state = app.state::<AppState>();
            if let Some(target) = state.redirect_if_unmoved(&tab_id, &scheduled_at, &redirect) {
                if let Err(e) = show_location(&app, &tab_id, target) {
                    log::warn!("[Desktop] Redirect of {} failed: {}", tab_id, e);
                }
            }
        });
    }

    Ok(view)
}

#[tauri::command]
fn submit_payment(
    app: AppHandle,
    state: State<AppState>,
    tab_id: String,
    details: PaymentDetails,
) -> Result<PaymentReceipt, String> {
    let receipt = with_tab(&state, &tab_id, |tab| payment::submit(tab.store(), &details))?
        .map_err(|alert| alert.0)?;
    broadcast_cart_change(&app, &state, &tab_id);
    navigate_tab(&app, &state, &tab_id, &receipt.navigation)?;
    Ok(receipt)
}

#[tauri::command]
fn login(app: AppHandle, state: State<AppState>, tab_id: String, role: String) -> Result<NavAction, String> {
    let action = state.roles().login(&role).map_err(|e| e.to_string())?;
    navigate_tab(&app, &state, &tab_id, &action)?;
    Ok(action)
}

#[tauri::command]
fn order_now(app: AppHandle, state: State<AppState>, tab_id: String) -> Result<Vec<NavAction>, String> {
    let actions = navigation::order_now();
    if let Some(first) = actions.first() {
        navigate_tab(&app, &state, &tab_id, first)?;
    }
    // The scroll runs on the menu page once it has loaded.
    Ok(actions)
}

#[tauri::command]
fn call_to_action(app: AppHandle, state: State<AppState>, tab_id: String) -> Result<NavAction, String> {
    let action = navigation::call_to_action();
    navigate_tab(&app, &state, &tab_id, &action)?;
    Ok(action)
}

#[tauri::command]
fn go_back(app: AppHandle, state: State<AppState>, tab_id: String) -> Result<NavAction, String> {
    let action = navigation::go_back();
    navigate_tab(&app, &state, &tab_id, &action)?;
    Ok(action)
}

#[tauri::command]
fn observe_reveals(state: State<AppState>, tab_id: String, element_ids: Vec<String>) {
    state.observe_reveals(&tab_id, &element_ids);
}

#[tauri::command]
fn report_intersections(state: State<AppState>, tab_id: String, entries: Vec<IntersectionEntry>) -> Vec<String> {
    state.report_intersections(&tab_id, &entries)
}

#[tauri::command]
fn register_categories(state: State<AppState>, tab_id: String, sections: Vec<String>) {
    state.register_categories(&tab_id, &sections);
}

#[tauri::command]
fn reveal_category(state: State<AppState>, tab_id: String, category: String) -> Option<NavAction> {
    state.reveal_category(&tab_id, &category)
}

#[tauri::command]
fn visibility_changed(
    app: AppHandle,
    state: State<AppState>,
    tab_id: String,
    visible: bool,
) -> Result<Option<TabRefresh>, String> {
    let refresh = with_tab(&state, &tab_id, |tab| tab.on_visibility_change(visible))?;
    if let Some(nav) = refresh.as_ref().and_then(|r| r.navigation.as_ref()) {
        navigate_tab(&app, &state, &tab_id, nav)?;
    }
    Ok(refresh)
}

pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }

            let data_dir = app.path().app_data_dir()?;
            app.manage(AppState::open(&data_dir));

            let handle = app.handle().clone();
            let state = app.state::<AppState>();
            open_tab_window(&handle, &state, "index.html")?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            open_tab,
            close_tab,
            get_cart,
            open_order,
            confirm_order,
            cancel_order,
            cart_page,
            remove_item,
            proceed_to_payment,
            payment_page,
            submit_payment,
            login,
            order_now,
            call_to_action,
            go_back,
            observe_reveals,
            report_intersections,
            register_categories,
            reveal_category,
            visibility_changed
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

// Order modal on the menu page.
// Clicking a pizza's add button opens the modal for that pizza; the visitor
// picks a date and a time and confirms or cancels.

use serde::Serialize;

use crate::cart::{AddOutcome, CartItem, CartStore};
use crate::error::CartItemError;
use crate::modules::navigation::Alert;

pub const MISSING_DATE_TIME: &str = "Please select both date and time.";
pub const MISSING_ITEM: &str = "Please select an item to order.";
pub const SAVE_FAILED: &str = "Could not save your order. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderModal {
    visible: bool,
    selected_name: String,
    date: String,
    time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderConfirmation {
    pub item: CartItem,
    pub outcome: AddOutcome,
    pub alert: Alert,
}

impl OrderModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn selected_name(&self) -> &str {
        &self.selected_name
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    /// Add button clicked; `name` comes from the button's `data-name`.
    pub fn open(&mut self, name: &str) {
        self.selected_name = name.to_string();
        self.visible = true;
    }

    pub fn set_date(&mut self, date: &str) {
        self.date = date.to_string();
    }

    pub fn set_time(&mut self, time: &str) {
        self.time = time.to_string();
    }

    /// Confirm button. On rejection the modal stays open with its inputs intact.
    pub fn confirm(&mut self, store: &CartStore) -> Result<OrderConfirmation, Alert> {
        if self.date.is_empty() || self.time.is_empty() {
            return Err(Alert::new(MISSING_DATE_TIME));
        }

        let item = CartItem::new(self.selected_name.as_str(), self.date.as_str(), self.time.as_str())
            .map_err(|e| match e {
                CartItemError::MissingField("name") => Alert::new(MISSING_ITEM),
                CartItemError::MissingField(_) => Alert::new(MISSING_DATE_TIME),
            })?;

        let outcome = store.add_to_cart(item.clone()).map_err(|e| {
            log::warn!("[Order] Failed to add {:?}: {}", item, e);
            Alert::new(SAVE_FAILED)
        })?;

        let alert = Alert::new(format!(
            "\"{}\" Ordered for {} at {}",
            item.name(),
            item.date(),
            item.time()
        ));
        self.close();

        Ok(OrderConfirmation { item, outcome, alert })
    }

    /// Cancel button: hide and reset without touching the cart.
    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.visible = false;
        self.date.clear();
        self.time.clear();
    }
}

// Cart review page.
// Every render re-reads the whole cart; there is no incremental update.

use serde::Serialize;

use crate::cart::{CartItem, CartStore};
use crate::error::StorageError;

const DIMMED_OPACITY: f32 = 0.6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartCard {
    /// Position in the cart; carried by the card's remove button.
    pub index: usize,
    pub name: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPageView {
    pub cards: Vec<CartCard>,
    pub empty_message_visible: bool,
    pub proceed_enabled: bool,
    pub proceed_opacity: f32,
}

impl CartPageView {
    pub fn from_cart(cart: &[CartItem]) -> Self {
        let cards: Vec<CartCard> = cart
            .iter()
            .enumerate()
            .map(|(index, item)| CartCard {
                index,
                name: item.name().to_string(),
                date: item.date().to_string(),
                time: item.time().to_string(),
            })
            .collect();
        let empty = cards.is_empty();

        Self {
            cards,
            empty_message_visible: empty,
            proceed_enabled: !empty,
            proceed_opacity: if empty { DIMMED_OPACITY } else { 1.0 },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Markup for the card list container.
    pub fn to_html(&self) -> String {
        self.cards
            .iter()
            .map(|card| {
                format!(
                    concat!(
                        "<div class=\"lab-card\">",
                        "<h3>{name}</h3>",
                        "<p>Date: <strong>{date}</strong></p>",
                        "<p>Time: <strong>{time}</strong></p>",
                        "<button class=\"btn-download\" data-index=\"{index}\">Remove</button>",
                        "</div>"
                    ),
                    name = escape_html(&card.name),
                    date = escape_html(&card.date),
                    time = escape_html(&card.time),
                    index = card.index,
                )
            })
            .collect()
    }
}

/// Re-reads the cart, refreshes the count badge and builds the page.
pub fn display_cart(store: &CartStore) -> CartPageView {
    let cart = store.get_cart();
    store.update_cart_count();
    CartPageView::from_cart(&cart)
}

/// Remove button clicked. `data_index` is the button's `data-index` attribute;
/// values that are not a position in the cart change nothing.
pub fn remove_clicked(store: &CartStore, data_index: &str) -> Result<CartPageView, StorageError> {
    match data_index.trim().parse::<usize>() {
        Ok(index) => {
            store.remove_item(index)?;
        }
        Err(_) => log::debug!("[CartPage] Ignoring remove with index {:?}", data_index),
    }
    Ok(display_cart(store))
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

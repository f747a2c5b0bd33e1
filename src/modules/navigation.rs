// Pure navigation logic - no Tauri imports allowed.
// Page identification, link resolution and the navigation outcomes of the
// site's buttons. The shell decides how to carry an action out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Anchor the order button scrolls to on the landing page.
pub const MENU_SECTION_ID: &str = "menuSection";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Index,
    Login,
    Dashboard,
    Order,
    Cart,
    Payment,
    Confirmation,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::Index,
        Page::Login,
        Page::Dashboard,
        Page::Order,
        Page::Cart,
        Page::Payment,
        Page::Confirmation,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Index => "index.html",
            Self::Login => "login.html",
            Self::Dashboard => "dashboard.html",
            Self::Order => "order.html",
            Self::Cart => "cart.html",
            Self::Payment => "payment.html",
            Self::Confirmation => "confirmation.html",
        }
    }

    /// Which page a tab is showing, judged by the last path segment.
    /// The site root counts as the index page; query and fragment are ignored.
    pub fn from_location(location: &Url) -> Option<Page> {
        let last = location
            .path_segments()
            .and_then(|segments| segments.last())
            .unwrap_or("");

        if last.is_empty() {
            return Some(Page::Index);
        }

        Self::ALL.into_iter().find(|page| page.file_name() == last)
    }

    pub fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        base.join(self.file_name())
    }
}

/// Blocking message shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert(pub String);

impl Alert {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum NavAction {
    Navigate {
        href: String,
    },
    Reload,
    #[serde(rename_all = "camelCase")]
    ScrollIntoView {
        element_id: String,
    },
    #[serde(rename_all = "camelCase")]
    RedirectAfter {
        href: String,
        delay_ms: u64,
    },
}

impl NavAction {
    pub fn to_page(page: Page) -> Self {
        Self::Navigate {
            href: page.file_name().to_string(),
        }
    }

    /// Resolves a relative `href` against the tab's current location.
    pub fn target(&self, current: &Url) -> Option<Url> {
        match self {
            Self::Navigate { href } | Self::RedirectAfter { href, .. } => current.join(href).ok(),
            Self::Reload => Some(current.clone()),
            Self::ScrollIntoView { .. } => None,
        }
    }
}

/// Proceed control on the cart page.
///
/// The payment URL carries the current time as its query so the page is
/// always loaded fresh.
pub fn proceed_to_payment(cart_len: usize, now: DateTime<Utc>) -> Result<NavAction, Alert> {
    if cart_len == 0 {
        return Err(Alert::new("Cart is empty!"));
    }

    Ok(NavAction::Navigate {
        href: format!("{}?{}", Page::Payment.file_name(), now.timestamp_millis()),
    })
}

/// Landing page "Order" button: go to the menu, then bring the menu section into view.
pub fn order_now() -> Vec<NavAction> {
    vec![
        NavAction::to_page(Page::Order),
        NavAction::ScrollIntoView {
            element_id: MENU_SECTION_ID.to_string(),
        },
    ]
}

/// Call-to-action button on the landing page.
pub fn call_to_action() -> NavAction {
    NavAction::to_page(Page::Order)
}

pub fn go_back() -> NavAction {
    NavAction::to_page(Page::Order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("tauri://localhost/", Some(Page::Index))]
    #[case("http://localhost:8080/index.html", Some(Page::Index))]
    #[case("http://localhost:8080/cart.html", Some(Page::Cart))]
    #[case("http://localhost:8080/site/cart.html#top", Some(Page::Cart))]
    #[case("http://localhost:8080/payment.html?1719856800000", Some(Page::Payment))]
    #[case("http://localhost:8080/order.html", Some(Page::Order))]
    #[case("http://localhost:8080/confirmation.html", Some(Page::Confirmation))]
    #[case("http://localhost:8080/about.html", None)]
    #[case("http://localhost:8080/cart.html.bak", None)]
    fn test_page_from_location(#[case] location: &str, #[case] expected: Option<Page>) {
        let url = Url::parse(location).unwrap();
        assert_eq!(Page::from_location(&url), expected);
    }

    #[test]
    fn test_every_page_is_shipped() {
        let site = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("site");
        for page in Page::ALL {
            let html = std::fs::read_to_string(site.join(page.file_name())).unwrap();
            assert!(html.contains("app.js"), "{} does not load app.js", page.file_name());
        }
        assert!(site.join("app.js").exists());
    }

    #[test]
    fn test_page_url_resolves_against_base() {
        let base = Url::parse("http://localhost:8080/site/").unwrap();
        assert_eq!(
            Page::Cart.url(&base).unwrap().as_str(),
            "http://localhost:8080/site/cart.html"
        );
    }

    #[test]
    fn test_proceed_with_empty_cart_alerts() {
        let err = proceed_to_payment(0, Utc::now()).unwrap_err();
        assert_eq!(err.message(), "Cart is empty!");
    }

    #[test]
    fn test_proceed_busts_cache() {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 18, 0, 0).unwrap();
        assert_eq!(
            proceed_to_payment(2, now).unwrap(),
            NavAction::Navigate {
                href: "payment.html?1719856800000".to_string()
            }
        );
    }

    #[test]
    fn test_order_now_navigates_then_scrolls() {
        let actions = order_now();
        assert_eq!(actions[0], NavAction::to_page(Page::Order));
        assert_eq!(
            actions[1],
            NavAction::ScrollIntoView {
                element_id: "menuSection".to_string()
            }
        );
        assert_eq!(call_to_action(), go_back());
    }

    #[test]
    fn test_action_target() {
        let current = Url::parse("http://localhost:8080/cart.html").unwrap();
        let nav = NavAction::Navigate {
            href: "payment.html?42".to_string(),
        };
        assert_eq!(
            nav.target(&current).unwrap().as_str(),
            "http://localhost:8080/payment.html?42"
        );
        assert_eq!(NavAction::Reload.target(&current), Some(current.clone()));
        assert_eq!(
            NavAction::ScrollIntoView {
                element_id: "x".to_string()
            }
            .target(&current),
            None
        );
    }

    #[test]
    fn test_action_wire_format() {
        let json = serde_json::to_value(NavAction::RedirectAfter {
            href: "cart.html".to_string(),
            delay_ms: 1500,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "redirectAfter", "href": "cart.html", "delayMs": 1500})
        );
    }
}

// Scroll reveal animations and the menu's category switcher.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::modules::navigation::NavAction;

/// Class added to an element once it has scrolled into view.
pub const VISIBLE_CLASS: &str = "animate-visible";

/// One element's visibility as reported by the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionEntry {
    pub element_id: String,
    /// Fraction of the element inside the viewport, 0.0 to 1.0.
    pub ratio: f64,
}

/// Tracks which animated elements have been revealed.
///
/// An element is watched until it first crosses the threshold, then it is
/// revealed and never reported again.
#[derive(Debug, Clone)]
pub struct RevealTracker {
    threshold: f64,
    observed: Vec<String>,
    revealed: HashSet<String>,
}

impl RevealTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            observed: Vec::new(),
            revealed: HashSet::new(),
        }
    }

    pub fn observe(&mut self, element_id: impl Into<String>) {
        let id = element_id.into();
        if self.revealed.contains(&id) || self.observed.contains(&id) {
            return;
        }
        self.observed.push(id);
    }

    /// Feeds one round of intersection reports and returns the elements that
    /// should receive [`VISIBLE_CLASS`] now.
    pub fn on_intersections(&mut self, entries: &[IntersectionEntry]) -> Vec<String> {
        let mut newly_revealed = Vec::new();

        for entry in entries {
            let intersecting = entry.ratio > 0.0 && entry.ratio >= self.threshold;
            if !intersecting {
                continue;
            }
            if let Some(pos) = self.observed.iter().position(|id| *id == entry.element_id) {
                let id = self.observed.remove(pos);
                self.revealed.insert(id.clone());
                newly_revealed.push(id);
            }
        }

        newly_revealed
    }

    pub fn is_revealed(&self, element_id: &str) -> bool {
        self.revealed.contains(element_id)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }
}

/// The menu's category sections. At most one is shown at a time.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBrowser {
    sections: Vec<String>,
    shown: Option<String>,
}

impl CategoryBrowser {
    pub fn new<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sections: sections.into_iter().map(Into::into).collect(),
            shown: None,
        }
    }

    /// Category button clicked: hide every section, then show and scroll to
    /// the requested one if the page has it.
    pub fn reveal(&mut self, category: &str) -> Option<NavAction> {
        self.shown = None;

        if !self.sections.iter().any(|s| s == category) {
            log::debug!("[Menu] No section for category {:?}", category);
            return None;
        }

        self.shown = Some(category.to_string());
        Some(NavAction::ScrollIntoView {
            element_id: category.to_string(),
        })
    }

    pub fn shown(&self) -> Option<&str> {
        self.shown.as_deref()
    }

    pub fn is_shown(&self, section: &str) -> bool {
        self.shown.as_deref() == Some(section)
    }
}

//! Category selection policy.

use crate::taxonomy::{self, DEFAULT_CATEGORIES};

/// Resolves requested category codes against the taxonomy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategorySelector;

impl CategorySelector {
    /// Create selector
    pub fn new() -> Self {
        Self
    }

    /// Select categories for a request.
    ///
    /// Absent or empty input yields the default list. Otherwise unknown codes
    /// are dropped (order and duplicates of the rest are kept), and if nothing
    /// survives the default list is returned.
    pub fn select(&self, requested: Option<&[String]>) -> Vec<&'static str> {
        let Some(requested) = requested.filter(|r| !r.is_empty()) else {
            return DEFAULT_CATEGORIES.to_vec();
        };

        let selected: Vec<&'static str> = requested
            .iter()
            .filter_map(|code| taxonomy::lookup(code))
            .collect();

        if selected.is_empty() {
            DEFAULT_CATEGORIES.to_vec()
        } else {
            selected
        }
    }
}

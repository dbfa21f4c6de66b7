use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Construction-time options of a [`SearchCoordinator`](super::SearchCoordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// How long the query must stay unchanged before it is searched.
    pub debounce_delay: Duration,
    /// Shortest debounced query, in characters, that enters search mode.
    pub min_search_length: usize,
    /// When false no fetch of any kind is issued.
    pub enabled: bool,
    pub status: Option<String>,
    pub gender: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(300),
            min_search_length: 0,
            enabled: true,
            status: None,
            gender: None,
        }
    }
}

impl SearchOptions {
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn with_min_search_length(mut self, length: usize) -> Self {
        self.min_search_length = length;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }
}

/// Which paginated query drives the visible list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// No active search term; only facets constrain the list.
    Browse,
    /// A settled, long enough search term is present.
    Search,
}

impl SearchMode {
    /// Mode for a debounced query. Length is counted in characters, not bytes.
    pub fn for_query(debounced: &str, min_search_length: usize) -> Self {
        if !debounced.is_empty() && debounced.chars().count() >= min_search_length {
            SearchMode::Search
        } else {
            SearchMode::Browse
        }
    }

    pub fn other(self) -> Self {
        match self {
            SearchMode::Browse => SearchMode::Search,
            SearchMode::Search => SearchMode::Browse,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Browse => write!(f, "browse"),
            SearchMode::Search => write!(f, "search"),
        }
    }
}

//! Mutable state owned by a search coordinator.

use std::sync::Arc;

use crate::error::RickdashError;
use crate::source::{CharacterFilter, PageInfo};

use super::SearchMode;

/// Pagination state of one mode.
#[derive(Debug)]
pub(crate) struct PageState<T> {
    /// Filter the items were (or are being) fetched with.
    pub filter: Option<CharacterFilter>,
    /// A first page for `filter` was issued and not abandoned.
    pub primed: bool,
    pub items: Vec<T>,
    pub page_info: Option<PageInfo>,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<Arc<RickdashError>>,
    pub load_more_error: Option<Arc<RickdashError>>,
    /// Bumped on every first page; later pages from an older epoch are dropped.
    pub epoch: u64,
    /// Token id of the in-flight first page.
    pub first_page_token: Option<u64>,
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        Self {
            filter: None,
            primed: false,
            items: Vec::new(),
            page_info: None,
            loading: false,
            loading_more: false,
            error: None,
            load_more_error: None,
            epoch: 0,
            first_page_token: None,
        }
    }
}

impl<T> PageState<T> {
    /// Reset for a new first page of `filter` issued under `token_id`.
    pub fn begin_first_page(&mut self, filter: Option<CharacterFilter>, token_id: u64) {
        self.filter = filter;
        self.primed = true;
        self.items.clear();
        self.page_info = None;
        self.loading = true;
        self.loading_more = false;
        self.error = None;
        self.load_more_error = None;
        self.epoch += 1;
        self.first_page_token = Some(token_id);
    }

    /// Abandon the in-flight first page, if it was issued under `token_id`.
    ///
    /// The page is unprimed so the next evaluation fetches it again.
    pub fn release(&mut self, token_id: u64) -> bool {
        if self.first_page_token != Some(token_id) {
            return false;
        }
        self.first_page_token = None;
        self.loading = false;
        self.primed = false;
        true
    }

    /// Abandon whatever first page is in flight.
    pub fn release_any(&mut self) -> bool {
        match self.first_page_token {
            Some(id) => self.release(id),
            None => false,
        }
    }

    pub fn next_page(&self) -> Option<u32> {
        self.page_info.and_then(|info| info.next)
    }

    /// Already showing (or fetching) the first page of `filter`.
    pub fn is_primed_for(&self, filter: &Option<CharacterFilter>) -> bool {
        self.primed && self.filter == *filter
    }
}

/// Everything behind the coordinator's lock.
#[derive(Debug)]
pub(crate) struct CoordinatorState<T> {
    /// Debounced query as last applied.
    pub debounced: String,
    pub status: Option<String>,
    pub gender: Option<String>,
    pub enabled: bool,
    pub closed: bool,
    pub min_search_length: usize,
    pub browse: PageState<T>,
    pub search: PageState<T>,
}

impl<T> CoordinatorState<T> {
    pub fn new(
        min_search_length: usize,
        enabled: bool,
        status: Option<String>,
        gender: Option<String>,
    ) -> Self {
        Self {
            debounced: String::new(),
            status,
            gender,
            enabled,
            closed: false,
            min_search_length,
            browse: PageState::default(),
            search: PageState::default(),
        }
    }

    /// Whether fetches may be issued.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.closed
    }

    pub fn mode(&self) -> SearchMode {
        SearchMode::for_query(&self.debounced, self.min_search_length)
    }

    /// Filter for `mode`: the name only applies while searching.
    pub fn filter(&self, mode: SearchMode) -> Option<CharacterFilter> {
        let name = match mode {
            SearchMode::Search => Some(self.debounced.as_str()),
            SearchMode::Browse => None,
        };
        CharacterFilter::build(name, self.status.as_deref(), self.gender.as_deref())
    }

    pub fn page(&self, mode: SearchMode) -> &PageState<T> {
        match mode {
            SearchMode::Browse => &self.browse,
            SearchMode::Search => &self.search,
        }
    }

    pub fn page_mut(&mut self, mode: SearchMode) -> &mut PageState<T> {
        match mode {
            SearchMode::Browse => &mut self.browse,
            SearchMode::Search => &mut self.search,
        }
    }
}

//! Paginated character sources.
//!
//! The search coordinator only knows the [`PageSource`] contract: ask for a
//! page number with an optional filter, get back page metadata and results.
//! How pages are merged into what is already on screen is a separate
//! [`MergePolicy`], so any transport can satisfy the same contract.

pub mod graphql;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::types::FACET_ALL;

pub use graphql::GraphQlSource;

/// Server-side character filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl CharacterFilter {
    /// Build a filter from a search term and facet values.
    ///
    /// Empty values and the literal `"all"` facet are omitted; `None` is
    /// returned when nothing constrains the query.
    pub fn build(name: Option<&str>, status: Option<&str>, gender: Option<&str>) -> Option<Self> {
        let facet = |value: Option<&str>| {
            value
                .filter(|v| !v.is_empty() && *v != FACET_ALL)
                .map(str::to_string)
        };

        let filter = CharacterFilter {
            name: name.filter(|n| !n.is_empty()).map(str::to_string),
            status: facet(status),
            gender: facet(gender),
        };

        if filter.is_empty() { None } else { Some(filter) }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none() && self.gender.is_none()
    }
}

/// Variables of one page fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<CharacterFilter>,
}

impl PageRequest {
    pub fn first(filter: Option<CharacterFilter>) -> Self {
        Self { page: 1, filter }
    }
}

/// Pagination metadata returned alongside every page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Total number of matching items.
    pub count: u32,
    /// Total number of pages.
    pub pages: u32,
    pub next: Option<u32>,
    pub prev: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub info: PageInfo,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            info: PageInfo::default(),
            results: Vec::new(),
        }
    }
}

/// The paginated query capability the coordinator consumes.
pub trait PageSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    /// Fetch one page.
    ///
    /// Implementations should stop and return
    /// [`RickdashError::Cancelled`](crate::error::RickdashError::Cancelled)
    /// once `token` is cancelled. Callers still check the token before
    /// applying a result, so ignoring it is safe, only wasteful.
    fn fetch_page(
        &self,
        request: &PageRequest,
        token: &CancelToken,
    ) -> impl Future<Output = Result<Page<Self::Item>>> + Send;
}

/// How an incoming page combines with items already accumulated for the
/// same filter.
pub trait MergePolicy<T>: Send + Sync {
    fn merge(&self, existing: Vec<T>, incoming: Page<T>, page: u32) -> Page<T>;
}

/// Page 1 replaces; later pages append and carry their own metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendPages;

impl<T> MergePolicy<T> for AppendPages {
    fn merge(&self, mut existing: Vec<T>, incoming: Page<T>, page: u32) -> Page<T> {
        if page <= 1 {
            return incoming;
        }
        existing.extend(incoming.results);
        Page {
            info: incoming.info,
            results: existing,
        }
    }
}

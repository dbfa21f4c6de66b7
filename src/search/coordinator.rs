//! The search coordinator.
//!
//! Raw query text flows through a [`Debouncer`]; once it settles the
//! coordinator picks a [`SearchMode`], builds the filter for that mode, and
//! drives page 1 of that mode's own page state. Browse and search pages
//! never share items, so toggling between them restores what each had.
//!
//! First pages are guarded by token identity: a response is applied only if
//! the [`CancelToken`] it was issued under is still current and is still the
//! token the page is waiting on. Later pages are guarded by the page epoch.

use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::cancel::{CancelReason, CancelToken, CancellationManager};
use crate::debounce::Debouncer;
use crate::error::{Result, RickdashError};
use crate::scroll::LoadMoreFn;
use crate::source::{AppendPages, MergePolicy, Page, PageInfo, PageRequest, PageSource};

use super::state::CoordinatorState;
use super::{SearchMode, SearchOptions};

/// Read model of a coordinator at one instant.
#[derive(Debug, Clone)]
pub struct SearchSnapshot<T> {
    /// Latest text passed to [`SearchCoordinator::set_query`].
    pub query: String,
    /// Query the visible results were selected with.
    pub debounced_query: String,
    pub is_debouncing: bool,
    pub mode: SearchMode,
    /// Items of the active mode only.
    pub characters: Vec<T>,
    pub page_info: Option<PageInfo>,
    pub is_loading: bool,
    pub is_loading_more: bool,
    /// First-page failure of the active mode.
    pub error: Option<Arc<RickdashError>>,
    /// Failure of the last `load_more` in the active mode.
    pub load_more_error: Option<Arc<RickdashError>>,
    pub has_next_page: bool,
}

struct Inner<S: PageSource> {
    source: Arc<S>,
    merge: Arc<dyn MergePolicy<S::Item>>,
    state: Mutex<CoordinatorState<S::Item>>,
    tokens: CancellationManager,
    debouncer: Debouncer<String>,
    revision: watch::Sender<u64>,
}

/// Handle to a search coordinator. Clones share the same coordinator, which
/// is disposed when the last handle is dropped.
///
/// Must be created and used inside a Tokio runtime.
pub struct SearchCoordinator<S: PageSource> {
    inner: Arc<Inner<S>>,
}

impl<S: PageSource> Clone for SearchCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PageSource> SearchCoordinator<S> {
    /// Create a coordinator that merges pages with [`AppendPages`].
    ///
    /// When `options.enabled` is set the first browse page is requested
    /// immediately.
    pub fn new(source: S, options: SearchOptions) -> Self {
        Self::with_merge_policy(source, options, AppendPages)
    }

    pub fn with_merge_policy(
        source: S,
        options: SearchOptions,
        merge: impl MergePolicy<S::Item> + 'static,
    ) -> Self {
        let SearchOptions {
            debounce_delay,
            min_search_length,
            enabled,
            status,
            gender,
        } = options;

        let inner = Arc::new_cyclic(|weak: &Weak<Inner<S>>| {
            let hook = weak.clone();
            Inner {
                source: Arc::new(source),
                merge: Arc::new(merge),
                state: Mutex::new(CoordinatorState::new(
                    min_search_length,
                    enabled,
                    status,
                    gender,
                )),
                tokens: CancellationManager::new(),
                debouncer: Debouncer::with_hook(String::new(), debounce_delay, move |settled| {
                    if let Some(inner) = hook.upgrade() {
                        inner.on_debounced(settled);
                    }
                }),
                revision: watch::channel(0).0,
            }
        });

        inner.reconcile(false);
        Self { inner }
    }

    /// Update the raw query. Fetching waits for the value to settle.
    pub fn set_query(&self, text: impl Into<String>) {
        self.inner.debouncer.set(text.into());
        self.inner.publish();
    }

    /// Set the status facet; `None` or `"all"` removes the constraint.
    pub fn set_status(&self, status: Option<&str>) {
        self.inner.state.lock().status = status.map(str::to_string);
        self.inner.reconcile(false);
        self.inner.publish();
    }

    /// Set the gender facet; `None` or `"all"` removes the constraint.
    pub fn set_gender(&self, gender: Option<&str>) {
        self.inner.state.lock().gender = gender.map(str::to_string);
        self.inner.reconcile(false);
        self.inner.publish();
    }

    /// Suppress or allow fetching. While disabled the read model is empty.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.state.lock().enabled = enabled;
        self.inner.reconcile(false);
        self.inner.publish();
    }

    /// Fetch the next page of the active mode.
    ///
    /// Resolves immediately when there is no next page or a load is already
    /// running. Failures land in [`SearchSnapshot::load_more_error`].
    pub async fn load_more(&self) {
        self.inner.load_more().await;
    }

    /// Re-issue the first page of the active mode with its current filter.
    pub fn retry(&self) {
        self.inner.reconcile(true);
    }

    /// Clear the query and abort the in-flight request.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Current read model.
    pub fn snapshot(&self) -> SearchSnapshot<S::Item> {
        self.inner.snapshot()
    }

    /// Revision counter bumped on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Wait for the first snapshot satisfying `predicate`.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SearchSnapshot<S::Item>) -> bool,
    ) -> SearchSnapshot<S::Item> {
        let mut rx = self.subscribe();
        loop {
            rx.borrow_and_update();
            let snapshot = self.snapshot();
            if predicate(&snapshot) || rx.changed().await.is_err() {
                return snapshot;
            }
        }
    }

    /// `load_more` as a scroll-trigger callback. The callback does not keep
    /// the coordinator alive.
    pub fn load_more_fn(&self) -> LoadMoreFn {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.load_more().await;
                }
            }
            .boxed()
        })
    }

    /// Dispose the coordinator: cancel the current token and stop
    /// debouncing. No fetch is issued afterwards.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

impl<S: PageSource> Inner<S> {
    fn publish(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn on_debounced(self: &Arc<Self>, settled: &str) {
        self.state.lock().debounced = settled.to_string();
        self.reconcile(false);
        self.publish();
    }

    /// Bring the active mode's page in line with the current inputs, issuing
    /// a first page when its filter changed. `force` refetches regardless.
    fn reconcile(self: &Arc<Self>, force: bool) {
        let (mode, request, token) = {
            let mut state = self.state.lock();
            if !state.is_active() {
                return;
            }

            let mode = state.mode();
            let filter = state.filter(mode);
            if !force && state.page(mode).is_primed_for(&filter) {
                return;
            }

            let token = self.tokens.renew();
            // The renewed token superseded whatever the other mode awaited.
            state.page_mut(mode.other()).release_any();
            state
                .page_mut(mode)
                .begin_first_page(filter.clone(), token.id());
            (mode, PageRequest::first(filter), token)
        };

        debug!(%mode, filter = ?request.filter, token = token.id(), "requesting first page");
        self.publish();
        self.spawn_fetch(request, token, move |inner, request, token, result| {
            inner.apply_first_page(mode, &request, &token, result)
        });
    }

    async fn load_more(self: &Arc<Self>) {
        let (mode, epoch, request, token) = {
            let mut state = self.state.lock();
            if !state.is_active() {
                return;
            }
            let mode = state.mode();
            let page = state.page_mut(mode);
            if page.loading || page.loading_more {
                return;
            }
            let Some(next) = page.next_page() else {
                return;
            };

            page.loading_more = true;
            page.load_more_error = None;
            let request = PageRequest {
                page: next,
                filter: page.filter.clone(),
            };
            (mode, page.epoch, request, self.tokens.current())
        };

        let request_page = request.page;
        debug!(%mode, page = request_page, "loading more");
        self.publish();
        let handle = self.spawn_fetch(request, token, move |inner, request, _token, result| {
            inner.apply_next_page(mode, epoch, &request, result)
        });
        if let Err(err) = handle.await {
            warn!(%mode, page = request_page, error = %err, "load more task failed");
            {
                let mut state = self.state.lock();
                let page = state.page_mut(mode);
                if page.epoch == epoch {
                    page.loading_more = false;
                }
            }
            self.publish();
        }
    }

    /// Fetch on a task that only holds a weak reference to the coordinator,
    /// so a pending request never outlives disposal.
    fn spawn_fetch<F>(
        self: &Arc<Self>,
        request: PageRequest,
        token: CancelToken,
        apply: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(&Inner<S>, PageRequest, CancelToken, Result<Page<S::Item>>) + Send + 'static,
    {
        let source = Arc::clone(&self.source);
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let result = source.fetch_page(&request, &token).await;
            match weak.upgrade() {
                Some(inner) => apply(&*inner, request, token, result),
                None => trace!(page = request.page, "coordinator gone, dropping response"),
            }
        })
    }

    fn apply_first_page(
        &self,
        mode: SearchMode,
        request: &PageRequest,
        token: &CancelToken,
        result: Result<Page<S::Item>>,
    ) {
        {
            let mut state = self.state.lock();
            let current = self.tokens.is_current(token);
            let page = state.page_mut(mode);
            if page.first_page_token != Some(token.id()) || !current {
                trace!(%mode, token = token.id(), "discarding stale first page");
                return;
            }

            page.first_page_token = None;
            page.loading = false;
            match result {
                Ok(incoming) => {
                    let merged = self
                        .merge
                        .merge(std::mem::take(&mut page.items), incoming, request.page);
                    page.items = merged.results;
                    page.page_info = Some(merged.info);
                    page.error = None;
                }
                Err(err) if err.is_cancelled() => {
                    trace!(%mode, "first page cancelled");
                    page.primed = false;
                }
                Err(err) => {
                    warn!(%mode, error = %err, "first page failed");
                    page.items.clear();
                    page.page_info = None;
                    page.error = Some(Arc::new(err));
                }
            }
        }
        self.publish();
    }

    fn apply_next_page(
        &self,
        mode: SearchMode,
        epoch: u64,
        request: &PageRequest,
        result: Result<Page<S::Item>>,
    ) {
        {
            let mut state = self.state.lock();
            let page = state.page_mut(mode);
            if page.epoch != epoch {
                trace!(%mode, page = request.page, "discarding page from a previous filter");
                return;
            }

            page.loading_more = false;
            match result {
                Ok(incoming) => {
                    let merged = self
                        .merge
                        .merge(std::mem::take(&mut page.items), incoming, request.page);
                    page.items = merged.results;
                    page.page_info = Some(merged.info);
                    page.load_more_error = None;
                }
                Err(err) if err.is_cancelled() => {
                    trace!(%mode, page = request.page, "load more cancelled");
                }
                Err(err) => {
                    warn!(%mode, page = request.page, error = %err, "load more failed");
                    page.load_more_error = Some(Arc::new(err));
                }
            }
        }
        self.publish();
    }

    fn cancel(self: &Arc<Self>) {
        let current = self.tokens.current();
        self.tokens.cancel(CancelReason::Requested);
        let browsing = {
            let mut state = self.state.lock();
            state.browse.release(current.id());
            state.search.release(current.id());
            state.mode() == SearchMode::Browse
        };
        debug!(token = current.id(), "search cancelled");
        self.debouncer.set(String::new());
        // No settle follows when the query is already empty, so the browse
        // list must be re-issued here.
        if browsing {
            self.reconcile(false);
        }
        self.publish();
    }

    fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            state.closed = true;
            state.browse.release_any();
            state.search.release_any();
        }
        self.tokens.dispose();
        self.debouncer.shutdown();
        self.publish();
    }

    fn snapshot(&self) -> SearchSnapshot<S::Item> {
        let debounce = self.debouncer.current();
        let state = self.state.lock();
        let mode = state.mode();
        // Still debouncing until the settled value has been applied here.
        let is_debouncing = debounce.pending || debounce.settled != state.debounced;

        if !state.enabled {
            return SearchSnapshot {
                query: debounce.value,
                debounced_query: state.debounced.clone(),
                is_debouncing,
                mode,
                characters: Vec::new(),
                page_info: None,
                is_loading: false,
                is_loading_more: false,
                error: None,
                load_more_error: None,
                has_next_page: false,
            };
        }

        let page = state.page(mode);
        SearchSnapshot {
            query: debounce.value,
            debounced_query: state.debounced.clone(),
            is_debouncing,
            mode,
            characters: page.items.clone(),
            page_info: page.page_info,
            is_loading: page.loading,
            is_loading_more: page.loading_more,
            error: page.error.clone(),
            load_more_error: page.load_more_error.clone(),
            has_next_page: page.next_page().is_some(),
        }
    }
}

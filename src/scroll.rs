//! Infinite-scroll trigger.
//!
//! [`InfiniteScroll`] turns visibility changes of a sentinel placed after the
//! last item into `load_more` calls. The visibility source is abstracted as a
//! [`SentinelObserver`]: an intersection observer, a scroll-position check
//! fed through [`InfiniteScroll::handle_scroll`], or a key press all fit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::search::SearchSnapshot;

/// Callback invoked to load the next page.
pub type LoadMoreFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Pixels from the bottom still counted as "at the bottom".
pub const DEFAULT_BOTTOM_OFFSET: i32 = 10;

/// Parameters handed to an observer when it is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverConfig {
    /// Fraction of the sentinel that must be visible.
    pub threshold: f64,
    /// Grows (or shrinks, if negative) the viewport, in pixels.
    pub root_margin_px: i32,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin_px: 0,
        }
    }
}

/// A platform primitive that reports when the sentinel becomes visible.
pub trait SentinelObserver {
    fn observe(&mut self, config: &ObserverConfig);
    fn disconnect(&mut self);
}

/// Observer for triggers driven by [`InfiniteScroll::handle_scroll`] or
/// explicit visibility calls. It only records whether it is attached.
#[derive(Debug, Default)]
pub struct ManualObserver {
    active: Option<ObserverConfig>,
}

impl ManualObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn config(&self) -> Option<ObserverConfig> {
        self.active
    }
}

impl SentinelObserver for ManualObserver {
    fn observe(&mut self, config: &ObserverConfig) {
        self.active = Some(*config);
    }

    fn disconnect(&mut self) {
        self.active = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerOptions {
    pub has_more: bool,
    pub is_loading: bool,
    pub enabled: bool,
    pub threshold: f64,
    pub root_margin_px: i32,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        let config = ObserverConfig::default();
        Self {
            has_more: false,
            is_loading: false,
            enabled: true,
            threshold: config.threshold,
            root_margin_px: config.root_margin_px,
        }
    }
}

impl TriggerOptions {
    /// Options mirroring a coordinator read model.
    pub fn from_snapshot<T>(snapshot: &SearchSnapshot<T>) -> Self {
        Self {
            has_more: snapshot.has_next_page,
            is_loading: snapshot.is_loading || snapshot.is_loading_more,
            ..Self::default()
        }
    }

    fn observer_config(&self) -> ObserverConfig {
        ObserverConfig {
            threshold: self.threshold,
            root_margin_px: self.root_margin_px,
        }
    }
}

/// Scroll position of a scrollable container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: i32,
    pub scroll_height: i32,
    pub client_height: i32,
}

impl ScrollMetrics {
    pub fn is_near_bottom(&self, offset: i32) -> bool {
        self.scroll_height - self.scroll_top <= self.client_height + offset
    }

    pub fn has_overflow(&self) -> bool {
        self.scroll_height > self.client_height
    }

    /// Whether more content is hidden below, i.e. a bottom fade is due.
    pub fn has_hidden_below(&self, offset: i32) -> bool {
        self.has_overflow() && !self.is_near_bottom(offset)
    }
}

/// Calls `on_load_more` once per "became visible" transition of a sentinel.
pub struct InfiniteScroll<O: SentinelObserver> {
    observer: O,
    options: TriggerOptions,
    on_load_more: LoadMoreFn,
    observing: Option<ObserverConfig>,
    visible: bool,
    in_flight: Arc<AtomicBool>,
}

impl<O: SentinelObserver> InfiniteScroll<O> {
    pub fn new(observer: O, options: TriggerOptions, on_load_more: LoadMoreFn) -> Self {
        let mut trigger = Self {
            observer,
            options,
            on_load_more,
            observing: None,
            visible: false,
            in_flight: Arc::new(AtomicBool::new(false)),
        };
        trigger.sync_observer();
        trigger
    }

    /// Apply new options, attaching or detaching the observer as needed.
    pub fn update(&mut self, options: TriggerOptions) {
        self.options = options;
        self.sync_observer();
    }

    fn sync_observer(&mut self) {
        let wanted = (self.options.enabled && self.options.has_more)
            .then(|| self.options.observer_config());
        if wanted == self.observing {
            return;
        }

        if self.observing.take().is_some() {
            self.observer.disconnect();
        }
        // A fresh observer reports the sentinel's current state again.
        self.visible = false;
        if let Some(config) = wanted {
            self.observer.observe(&config);
            self.observing = Some(config);
        }
    }

    /// Feed a visibility change of the sentinel.
    ///
    /// Returns the spawned load when one was started; it runs to completion
    /// even if the handle is dropped.
    pub fn handle_visibility(&mut self, visible: bool) -> Option<JoinHandle<()>> {
        let became_visible = visible && !self.visible;
        self.visible = visible;

        if !became_visible || self.observing.is_none() || self.options.is_loading {
            return None;
        }
        if self.in_flight.swap(true, Ordering::AcqRel) {
            trace!("load more already in flight");
            return None;
        }

        let guard = InFlight(Arc::clone(&self.in_flight));
        let load = (self.on_load_more)();
        Some(tokio::spawn(async move {
            let _guard = guard;
            load.await;
        }))
    }

    /// Scroll-position trigger: the sentinel counts as visible once the
    /// container is within `root_margin_px` of its bottom.
    pub fn handle_scroll(&mut self, metrics: ScrollMetrics) -> Option<JoinHandle<()>> {
        self.handle_visibility(metrics.is_near_bottom(self.options.root_margin_px))
    }

    pub fn is_observing(&self) -> bool {
        self.observing.is_some()
    }

    pub fn is_loading_more(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

impl<O: SentinelObserver> Drop for InfiniteScroll<O> {
    fn drop(&mut self) {
        if self.observing.take().is_some() {
            self.observer.disconnect();
        }
    }
}

/// Clears the in-flight flag when the load finishes or is aborted.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

//! Trailing-edge debouncing of a rapidly changing value.
//!
//! Each change restarts a timer; only when the timer runs out without a
//! further change does the settled value catch up. Timers are Tokio tasks,
//! so a [`Debouncer`] must be driven from inside a Tokio runtime.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

type SettleHook<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Observable state of a debouncer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debounced<T> {
    /// Latest value passed to [`Debouncer::set`].
    pub value: T,
    /// Value as of the last uninterrupted delay.
    pub settled: T,
    /// True between a change and the settled value catching up.
    pub pending: bool,
}

struct DebounceState<T> {
    value: T,
    settled: T,
    pending: bool,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    closed: bool,
}

impl<T: Clone> DebounceState<T> {
    fn snapshot(&self) -> Debounced<T> {
        Debounced {
            value: self.value.clone(),
            settled: self.settled.clone(),
            pending: self.pending,
        }
    }
}

struct Shared<T> {
    state: Mutex<DebounceState<T>>,
    tx: watch::Sender<Debounced<T>>,
    on_settle: Option<SettleHook<T>>,
}

impl<T: Clone + Send + Sync + 'static> Shared<T> {
    fn settle(&self, generation: u64) {
        let (snapshot, settled) = {
            let mut state = self.state.lock();
            // A newer change (or shutdown) owns the timer now.
            if state.closed || state.generation != generation {
                return;
            }
            state.settled = state.value.clone();
            state.pending = false;
            state.timer = None;
            (state.snapshot(), state.settled.clone())
        };

        self.tx.send_replace(snapshot);
        if let Some(hook) = &self.on_settle {
            hook(&settled);
        }
    }
}

/// Delays propagation of a value until it stops changing for `delay`.
pub struct Debouncer<T> {
    delay: Duration,
    shared: Arc<Shared<T>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        Self::build(initial, delay, None)
    }

    /// Like [`Debouncer::new`], calling `hook` with the settled value each
    /// time a timer runs out. The hook runs on the timer task after the new
    /// state has been published.
    pub fn with_hook(
        initial: T,
        delay: Duration,
        hook: impl Fn(&T) + Send + Sync + 'static,
    ) -> Self {
        Self::build(initial, delay, Some(Box::new(hook)))
    }

    fn build(initial: T, delay: Duration, on_settle: Option<SettleHook<T>>) -> Self {
        let state = DebounceState {
            value: initial.clone(),
            settled: initial,
            pending: false,
            generation: 0,
            timer: None,
            closed: false,
        };
        let (tx, _) = watch::channel(state.snapshot());

        Self {
            delay,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                tx,
                on_settle,
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a new value and restart the timer.
    ///
    /// Setting the value it already holds does nothing, matching a change
    /// detector that only reacts to differences.
    pub fn set(&self, value: T) {
        let snapshot = {
            let mut state = self.shared.state.lock();
            if state.closed || state.value == value {
                return;
            }

            state.value = value;
            state.pending = true;
            state.generation += 1;
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }

            let generation = state.generation;
            let delay = self.delay;
            let shared: Weak<Shared<T>> = Arc::downgrade(&self.shared);
            state.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(shared) = shared.upgrade() {
                    shared.settle(generation);
                }
            }));

            state.snapshot()
        };

        self.shared.tx.send_replace(snapshot);
    }

    pub fn current(&self) -> Debounced<T> {
        self.shared.state.lock().snapshot()
    }

    pub fn value(&self) -> T {
        self.shared.state.lock().value.clone()
    }

    pub fn settled(&self) -> T {
        self.shared.state.lock().settled.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().pending
    }

    /// Watch every change of the debounced state.
    pub fn subscribe(&self) -> watch::Receiver<Debounced<T>> {
        self.shared.tx.subscribe()
    }

    /// Cancel any pending timer; later calls to [`Debouncer::set`] are ignored.
    pub fn shutdown(&self) {
        self.close();
    }
}

impl<T> Debouncer<T> {
    fn close(&self) {
        let mut state = self.shared.state.lock();
        state.closed = true;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.close();
    }
}

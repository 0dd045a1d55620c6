//! Search debounce coordinator.
//!
//! Turns a stream of keystrokes into a stream of query intents. Each input
//! cancels the armed timer and arms a new one; only a timer that survives its
//! whole quiet period emits a [`SearchQuery`], carrying the text captured when
//! it was armed.
//!
//! Timers run on the Tokio clock, so tests drive them with a paused runtime
//! (`start_paused = true`) instead of waiting in real time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// A search the user intends to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
}

#[derive(Debug, Default)]
struct Timer {
    /// Bumped on every arm and cancel. A firing timer only emits if its
    /// generation is still the latest.
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    fn disarm(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Owns the single pending search timer.
#[derive(Debug)]
pub struct Debouncer {
    timer: Arc<Mutex<Timer>>,
    intents: mpsc::UnboundedSender<SearchQuery>,
}

impl Debouncer {
    /// Create a coordinator and the receiving end of its intent stream.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SearchQuery>) {
        let (intents, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            timer: Arc::new(Mutex::new(Timer::default())),
            intents,
        };
        (debouncer, rx)
    }

    /// Record a keystroke.
    ///
    /// Cancels any armed timer and arms a new one that emits `text` after
    /// `quiet_period` unless superseded first. Must be called from within a
    /// Tokio runtime.
    pub fn on_input(&self, text: impl Into<String>, quiet_period: Duration) {
        let query = SearchQuery { text: text.into() };
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        timer.disarm();
        let armed = timer.generation;
        trace!(generation = armed, text = %query.text, "Arming search timer");

        let shared = Arc::clone(&self.timer);
        let intents = self.intents.clone();
        timer.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;

            let mut timer = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if timer.generation != armed {
                return;
            }
            timer.handle = None;
            drop(timer);

            debug!(text = %query.text, "Quiet period elapsed, issuing search");
            if intents.send(query).is_err() {
                debug!("Search intent receiver dropped");
            }
        }));
    }

    /// Cancel the armed timer, if any.
    pub fn cancel(&self) {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .disarm();
    }

    /// Whether a timer is armed and has not fired yet.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

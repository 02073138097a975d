//! # Debounce Timer
//!
//! Cancellable one-shot timer. Arming cancels any in-flight timer and
//! replaces it (the window is never extended). A single flush entry point
//! is shared between the timer and the structural fast path, which keeps
//! the ordering contract in one place.

use std::time::Duration;
use tokio::task::JoinHandle;

/// A cancellable, re-armable one-shot timer.
#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    handle: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    /// Create a timer with the given quiet window.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            handle: None,
        }
    }

    /// Arm the timer: any previously armed action is cancelled and replaced.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Cancel the armed action, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether an action is armed and has not yet fired.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// The configured quiet window.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

//! Cancellable debounce handle.
//!
//! A [`Debouncer`] forwards the last value pushed to it once no new value has
//! arrived for the quiet period. Re-pushing restarts the timer; dropping the
//! handle cancels any pending emission.
//!
//! The timer task and [`Debouncer::cancel`] serialize on the same lock: the
//! sink runs while the lock is held, so once `cancel` (or `drop`) returns no
//! emission for an earlier push can happen. The sink therefore must not call
//! back into the same debouncer.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default quiet period for free-text search input.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    pending: bool,
}

type Sink<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Trailing-edge debouncer owned by the view that created it.
///
/// Must be used from within a Tokio runtime.
pub struct Debouncer<T> {
    quiet_period: Duration,
    slot: Arc<Mutex<Slot>>,
    sink: Sink<T>,
    timer: Option<JoinHandle<()>>,
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("quiet_period", &self.quiet_period)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Debouncer<T> {
    /// Creates a debouncer delivering settled values to `sink`.
    pub fn new(quiet_period: Duration, sink: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            quiet_period,
            slot: Arc::new(Mutex::new(Slot::default())),
            sink: Arc::new(sink),
            timer: None,
        }
    }

    /// Schedules `value`, replacing any value still waiting.
    pub fn push(&mut self, value: T) {
        let generation = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.generation += 1;
            slot.pending = true;
            slot.generation
        };

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let deadline = Instant::now() + self.quiet_period;
        let slot = Arc::clone(&self.slot);
        let sink = Arc::clone(&self.sink);

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.generation != generation || !slot.pending {
                return;
            }
            slot.pending = false;
            tracing::trace!(generation, "debounce window elapsed");
            sink(value);
        }));
    }
}

impl<T> Debouncer<T> {
    /// Drops the pending value, if any.
    pub fn cancel(&mut self) {
        {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.generation += 1;
            slot.pending = false;
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Whether a value is waiting for its quiet period to elapse.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).pending
    }

    /// Configured quiet period.
    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        self.quiet_period
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> (Arc<Mutex<Vec<String>>>, impl Fn(String) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |value: String| seen.lock().unwrap().push(value)
        };
        (seen, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_input_emits_last_value_once() {
        let (seen, sink) = recording();
        let mut debouncer = Debouncer::new(DEFAULT_QUIET_PERIOD, sink);

        for text in ["A", "AC", "ACM", "ACME"] {
            debouncer.push(text.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_millis(399)).await;
        assert!(seen.lock().unwrap().is_empty());
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["ACME".to_string()]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_before_window_emits_nothing() {
        let (seen, sink) = recording();
        let mut debouncer = Debouncer::new(DEFAULT_QUIET_PERIOD, sink);

        debouncer.push("ACME".to_string());
        tokio::time::sleep(Duration::from_millis(200)).await;
        drop(debouncer);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending_value() {
        let (seen, sink) = recording();
        let mut debouncer = Debouncer::new(Duration::from_millis(50), sink);

        debouncer.push("draft".to_string());
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(seen.lock().unwrap().is_empty());

        debouncer.push("approved".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["approved".to_string()]);
    }
}

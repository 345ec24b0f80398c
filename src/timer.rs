//! Single-slot, cancellable one-shot timers.
//!
//! Both the inactivity auto-lock and the clipboard wipe follow the same
//! discipline: at most one pending timer per concern, and arming a new one
//! always aborts the previous one first.  Every arm gets a fresh `TimerId`,
//! so a callback that was already running when it got superseded can tell
//! that it is stale and do nothing.
//!
//! Timers run on the Tokio runtime; `arm` must be called from within one.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Stand-in deadline for delays too large to represent; roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Identifies one arming of a `TimerSlot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct Armed {
    id: TimerId,
    fired: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Holds at most one pending timer.
#[derive(Default)]
pub struct TimerSlot {
    next_id: u64,
    armed: Option<Armed>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending timer, then schedule `on_fire` after `delay`.
    ///
    /// Once the delay elapses the timer is marked fired before `on_fire`
    /// runs; a fired timer cannot be un-fired by re-arming.
    pub fn arm<F, Fut>(&mut self, delay: Duration, on_fire: F) -> TimerId
    where
        F: FnOnce(TimerId) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        self.next_id += 1;
        let id = TimerId(self.next_id);
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE);
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            flag.store(true, Ordering::SeqCst);
            on_fire(id).await;
        });

        self.armed = Some(Armed {
            id,
            fired,
            handle,
        });
        id
    }

    /// Abort the pending timer, if any.
    ///
    /// Returns `true` when a timer that had not yet fired was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(armed) => {
                armed.handle.abort();
                !armed.fired.load(Ordering::SeqCst)
            }
            None => false,
        }
    }

    /// Forget the timer `id` without aborting it.
    ///
    /// Called from a firing callback to clear its own slot; aborting the
    /// task that is currently running the callback would be pointless.
    pub fn release(&mut self, id: TimerId) -> bool {
        if self.is_current(id) {
            self.armed = None;
            true
        } else {
            false
        }
    }

    /// Whether `id` is the most recent arming and has not been cancelled.
    pub fn is_current(&self, id: TimerId) -> bool {
        self.armed.as_ref().is_some_and(|armed| armed.id == id)
    }

    /// Whether the current timer's delay has elapsed.
    pub fn has_fired(&self) -> bool {
        self.armed
            .as_ref()
            .is_some_and(|armed| armed.fired.load(Ordering::SeqCst))
    }

    /// Whether a timer is armed and still waiting.
    pub fn is_pending(&self) -> bool {
        self.armed.is_some() && !self.has_fired()
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();

        let counter = Arc::clone(&hits);
        slot.arm(Duration::from_secs(10), move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(slot.is_pending());

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(slot.has_fired());
        assert!(!slot.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_cancels_previous_timer() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();

        for _ in 0..5 {
            let counter = Arc::clone(&hits);
            slot.arm(Duration::from_secs(10), move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_secs(3)).await;
        }

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();

        let counter = Arc::clone(&hits);
        let id = slot.arm(Duration::from_secs(1), move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(slot.is_current(id));
        assert!(slot.cancel());
        assert!(!slot.is_current(id));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!slot.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ids_are_not_current() {
        let mut slot = TimerSlot::new();
        let first = slot.arm(Duration::from_secs(1), |_| async {});
        let second = slot.arm(Duration::from_secs(1), |_| async {});
        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));
        assert!(!slot.release(first));
        assert!(slot.release(second));
        assert!(!slot.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn huge_delay_waits_instead_of_overflowing() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();

        let counter = Arc::clone(&hits);
        slot.arm(Duration::from_secs(u64::MAX), move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(86_400)).await;
        assert!(slot.is_pending());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}

//! Debounced egress reconnect timer with idempotent scheduling (spec §5
//! "Cancellation & timeout"): "a 2-second reconnect timer backs off
//! egress reconnect attempts; scheduling is idempotent via CAS on
//! `activate-scheduled`. Cancellation clears the timer and then
//! CAS-clears the flag (order matters)."

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// The `activate-scheduled` atomic flag plus the scheduling/cancellation
/// operations that keep it consistent with an in-flight `tokio::time`
/// delay.
#[derive(Debug, Default)]
pub struct ReconnectTimer {
    scheduled: AtomicBool,
}

impl ReconnectTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::Acquire)
    }

    /// Claim the right to schedule a reconnect. Returns `false` if a
    /// reconnect is already pending — scheduling is a no-op in that
    /// case, which is what makes it idempotent.
    fn try_claim(&self) -> bool {
        self.scheduled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the flag, e.g. because the pending reconnect is about to
    /// fire, or because it was explicitly cancelled. Returns whether
    /// this call actually cleared it (so only one of a racing fire vs.
    /// cancel proceeds).
    fn try_release(&self) -> bool {
        self.scheduled
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Schedule `reconnect` to run after `debounce`, unless a reconnect is
/// already pending for this timer. The actual timer (a `tokio::time`
/// sleep) is the thing being "cleared" on cancellation; `cancel_*`
/// racing against this delay firing is resolved by the CAS in
/// [`ReconnectTimer::try_release`].
pub fn schedule<F>(timer: Arc<ReconnectTimer>, debounce: Duration, reconnect: F)
where
    F: FnOnce() + Send + 'static,
{
    if !timer.try_claim() {
        debug!("reconnect already scheduled; ignoring duplicate request");
        return;
    }
    tokio::spawn(async move {
        tokio::time::sleep(debounce).await;
        if timer.try_release() {
            reconnect();
        }
    });
}

/// Cancel a pending reconnect before it fires. Returns whether there was
/// one to cancel.
pub fn cancel(timer: &ReconnectTimer) -> bool {
    timer.try_release()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn schedule_fires_once_after_the_debounce() {
        let timer = Arc::new(ReconnectTimer::new());
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = fired.clone();
        schedule(timer.clone(), Duration::from_secs(2), move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.is_scheduled());

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_scheduled());
    }

    #[test]
    fn duplicate_schedule_requests_are_ignored() {
        let timer = ReconnectTimer::new();
        assert!(timer.try_claim());
        assert!(!timer.try_claim(), "second claim must not succeed while pending");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_fire_suppresses_the_reconnect() {
        let timer = Arc::new(ReconnectTimer::new());
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = fired.clone();
        schedule(timer.clone(), Duration::from_secs(2), move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(cancel(&timer));
        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}

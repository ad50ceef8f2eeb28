use core::time::Duration;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Limits concurrent upstream requests and records rate-limit pauses.
///
/// Wrap in an `Arc` via [`Throttler::new`], then call [`Throttler::acquire`] before
/// each request. At most `max_concurrent` requests are in flight at once, across every
/// repository being aggregated.
///
/// When any request hits the upstream rate limit, [`Throttler::pause_for`] marks the
/// whole client as paused until the reset time. Callers check [`Throttler::is_paused`]
/// and fail fast instead of spending requests that are certain to be refused.
/// Overlapping pauses keep the longest one.
#[derive(Debug)]
pub struct Throttler {
    semaphore: Arc<Semaphore>,
    paused_until: Mutex<Option<Instant>>,
}

impl Throttler {
    /// Minimum extension required for a new pause to override an active one, so that
    /// concurrent callers reporting the same reset time don't each "win".
    const MIN_PAUSE_EXTENSION: Duration = Duration::from_secs(1);

    /// Create a new throttler that allows at most `max_concurrent` requests at a time.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            paused_until: Mutex::new(None),
        })
    }

    /// Acquire a concurrency slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore is never closed")
    }

    /// Returns whether a rate-limit pause is currently in effect.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.remaining_pause().is_some()
    }

    /// Time left until the current pause expires.
    #[must_use]
    pub fn remaining_pause(&self) -> Option<Duration> {
        let guard = self.paused_until.lock().expect("lock not poisoned");
        guard.and_then(|until| until.checked_duration_since(Instant::now())).filter(|d| !d.is_zero())
    }

    /// Pause for `duration`.
    ///
    /// Returns `true` only when a new pause is actually established; `false` if a
    /// pause of similar or longer length is already active.
    pub fn pause_for(&self, duration: Duration) -> bool {
        let new_until = Instant::now() + duration;

        let mut guard = self.paused_until.lock().expect("lock not poisoned");
        if guard.is_some_and(|existing| existing + Self::MIN_PAUSE_EXTENSION >= new_until) {
            return false;
        }

        *guard = Some(new_until);
        true
    }
}

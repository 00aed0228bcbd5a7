use core::time::Duration;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Caps the number of remote calls in flight for one crawl.
///
/// Slots are handed out roughly in arrival order and waiting for one is unbounded, so a crawl that
/// touches thousands of branches still keeps at most `max_concurrent` requests outstanding.
///
/// When the remote asks clients to slow down, [`Throttler::pause_for`] holds back every new
/// acquisition until the pause ends. Calls that already hold a slot are not interrupted.
#[derive(Debug)]
pub struct Throttler {
    slots: Arc<Semaphore>,
    paused_until: Mutex<Option<Instant>>,
}

impl Throttler {
    /// Create a throttler allowing `max_concurrent` calls at a time (at least one).
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
            paused_until: Mutex::new(None),
        })
    }

    /// Wait out any pause, then take a slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        // a pause may be extended while we sleep, so check again after every wake-up
        while let Some(until) = self.pause_deadline() {
            tokio::time::sleep_until(until).await;
        }

        Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .expect("semaphore is never closed")
    }

    /// Hold back new acquisitions for `duration`.
    ///
    /// Returns `false` if a pause lasting at least as long is already running, in which case
    /// nothing changes.
    pub fn pause_for(&self, duration: Duration) -> bool {
        let until = Instant::now() + duration;
        let mut paused_until = self.paused_until.lock().expect("lock not poisoned");
        if paused_until.is_some_and(|current| current >= until) {
            return false;
        }

        *paused_until = Some(until);
        true
    }

    /// End of the running pause, if any.
    fn pause_deadline(&self) -> Option<Instant> {
        let mut paused_until = self.paused_until.lock().expect("lock not poisoned");
        match *paused_until {
            Some(until) if until > Instant::now() => Some(until),
            _ => {
                *paused_until = None;
                None
            }
        }
    }
}

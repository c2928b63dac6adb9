// Request Coalescing Module
//
// Deduplicates concurrent pipeline runs for the same fingerprint.
// When several clients request the same uncached resource at once:
// - First request (leader): runs fetch -> rewrite -> optimize, then publishes the outcome
// - Subsequent requests (followers): wait on the leader's channel and share its outcome
// - Failures are shared too; the slot is released so the next request starts afresh
//
// The in-flight map lock is only held for map operations, never across an await.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

use crate::fingerprint::Fingerprint;

type InFlight<T> = Arc<Mutex<HashMap<Fingerprint, watch::Receiver<Option<T>>>>>;

/// Request coalescing manager
/// Tracks in-flight pipeline runs keyed by fingerprint
#[derive(Debug)]
pub struct RequestCoalescer<T> {
    in_flight: InFlight<T>,
}

impl<T> Clone for RequestCoalescer<T> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T: Clone> RequestCoalescer<T> {
    /// Create a new request coalescer
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Acquire a coalescing slot for a fingerprint
    ///
    /// Returns `CoalescingSlot::Leader` if nothing is in flight for the key.
    /// The leader must run the computation and call [`LeaderGuard::complete`].
    ///
    /// Returns `CoalescingSlot::Follower` if another request is already running it.
    pub fn acquire(&self, key: &Fingerprint) -> CoalescingSlot<T> {
        let mut in_flight = self.in_flight.lock();

        if let Some(receiver) = in_flight.get(key) {
            return CoalescingSlot::Follower(Follower {
                receiver: receiver.clone(),
            });
        }

        let (sender, receiver) = watch::channel(None);
        in_flight.insert(key.clone(), receiver);

        CoalescingSlot::Leader(LeaderGuard {
            key: key.clone(),
            in_flight: Arc::clone(&self.in_flight),
            sender,
        })
    }

    /// Get current number of in-flight computations
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }
}

impl<T: Clone> Default for RequestCoalescer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of acquiring a coalescing slot
#[derive(Debug)]
pub enum CoalescingSlot<T> {
    /// First request for the key: run the computation and publish the outcome.
    Leader(LeaderGuard<T>),

    /// A computation is already running: wait for its outcome.
    Follower(Follower<T>),
}

impl<T> CoalescingSlot<T> {
    pub fn is_leader(&self) -> bool {
        matches!(self, CoalescingSlot::Leader(_))
    }

    pub fn is_follower(&self) -> bool {
        matches!(self, CoalescingSlot::Follower(_))
    }
}

/// Handle held by a request waiting on someone else's computation
#[derive(Debug)]
pub struct Follower<T> {
    receiver: watch::Receiver<Option<T>>,
}

impl<T: Clone> Follower<T> {
    /// Wait for the leader's outcome
    ///
    /// Returns `None` if the leader went away without publishing (its task was
    /// cancelled); the caller should try again.
    pub async fn wait(mut self) -> Option<T> {
        if let Ok(outcome) = self.receiver.wait_for(Option::is_some).await {
            return outcome.clone();
        }
        self.receiver.borrow().clone()
    }
}

/// Guard held by the leader request
///
/// Dropping it releases the in-flight slot. Followers still waiting on a
/// guard dropped without [`complete`](LeaderGuard::complete) get `None`.
#[derive(Debug)]
pub struct LeaderGuard<T> {
    key: Fingerprint,
    in_flight: InFlight<T>,
    sender: watch::Sender<Option<T>>,
}

impl<T> LeaderGuard<T> {
    /// Publish the outcome to all followers and release the slot
    pub fn complete(self, outcome: T) {
        self.sender.send_replace(Some(outcome));
    }

    pub fn key(&self) -> &Fingerprint {
        &self.key
    }
}

impl<T> Drop for LeaderGuard<T> {
    fn drop(&mut self) {
        // Only this guard's entry can exist under the key while it is alive
        self.in_flight.lock().remove(&self.key);
    }
}

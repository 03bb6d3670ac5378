//! Priority ordered spawn queue
//!
//! Requests are drained from the front. Normal requests are appended at the tail,
//! higher priorities are inserted in front of the first strictly lower one, so
//! requests of equal priority keep their submission order.

use std::collections::VecDeque;

use crate::pool::{Handle, SpawnPriority, SpawnRequest};

/// Ordered pending spawn requests of one factory.
#[derive(Debug, Default)]
pub struct SpawnQueue {
    requests: VecDeque<SpawnRequest>,
}

impl SpawnQueue {
    /// Default initial capacity.
    const DEFAULT_CAPACITY: usize = 32;

    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: VecDeque::with_capacity(Self::DEFAULT_CAPACITY),
        }
    }

    /// Insert a request according to its priority.
    pub fn push(&mut self, request: SpawnRequest) {
        if request.priority == SpawnPriority::Normal {
            self.requests.push_back(request);
            return;
        }

        let at = self
            .requests
            .iter()
            .position(|queued| queued.priority < request.priority)
            .unwrap_or(self.requests.len());
        self.requests.insert(at, request);
    }

    /// Put back a request taken from this queue earlier.
    ///
    /// It goes behind queued requests of higher priority and ahead of those of
    /// equal or lower priority, which were all submitted after it.
    pub fn requeue(&mut self, request: SpawnRequest) {
        let at = self
            .requests
            .iter()
            .position(|queued| queued.priority <= request.priority)
            .unwrap_or(self.requests.len());
        self.requests.insert(at, request);
    }

    /// Take the next request.
    #[inline]
    pub fn pop_front(&mut self) -> Option<SpawnRequest> {
        self.requests.pop_front()
    }

    /// Remove the request with the given handle.
    pub fn dequeue_by_handle(&mut self, handle: &Handle) -> Option<SpawnRequest> {
        let at = self
            .requests
            .iter()
            .position(|queued| &queued.handle == handle)?;
        self.requests.remove(at)
    }

    /// Check if a request with the given handle is queued
    #[must_use]
    pub fn contains(&self, handle: &Handle) -> bool {
        self.requests.iter().any(|queued| &queued.handle == handle)
    }

    /// Iterate over the queued requests in drain order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SpawnRequest> {
        self.requests.iter()
    }

    /// Number of queued requests
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true if nothing is queued
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Drop every queued request
    pub fn clear(&mut self) -> usize {
        let count = self.requests.len();
        self.requests.clear();
        count
    }
}

//! Staggered creation pipeline
//!
//! Pairs a factory with its spawn queue and the tick the queue is due at. The
//! registry drives it: a due pipeline moves a bounded batch from the front of the
//! queue into flight, the registry completes those requests one by one, then the
//! pipeline reschedules itself if anything is left.

use std::collections::VecDeque;

use crate::factory::PoolFactory;
use crate::pool::{Handle, SpawnQueue, SpawnRequest};

/// A bound factory with its pending requests.
pub struct SpawnPipeline {
    factory: Box<dyn PoolFactory>,
    queue: SpawnQueue,
    /// Requests taken from the queue by the batch being processed
    in_flight: VecDeque<SpawnRequest>,
    /// Tick the next batch is due at
    scheduled_tick: Option<u64>,
}

impl SpawnPipeline {
    /// Wrap a factory with an empty queue.
    #[must_use]
    pub fn new(factory: Box<dyn PoolFactory>) -> Self {
        Self {
            factory,
            queue: SpawnQueue::new(),
            in_flight: VecDeque::new(),
            scheduled_tick: None,
        }
    }

    /// The wrapped factory
    #[must_use]
    pub fn factory(&self) -> &dyn PoolFactory {
        self.factory.as_ref()
    }

    /// The wrapped factory, mutably
    pub fn factory_mut(&mut self) -> &mut dyn PoolFactory {
        self.factory.as_mut()
    }

    /// Swap the factory; pending requests stay and are built by the new one.
    pub fn replace_factory(&mut self, factory: Box<dyn PoolFactory>) -> Box<dyn PoolFactory> {
        std::mem::replace(&mut self.factory, factory)
    }

    /// Unwrap the factory, dropping every pending request.
    #[must_use]
    pub fn into_factory(self) -> Box<dyn PoolFactory> {
        self.factory
    }

    /// Queue a request and make sure a batch is scheduled after `now`.
    pub fn enqueue(&mut self, request: SpawnRequest, now: u64) {
        log::debug!(
            "Queued {} for '{}' ({:?})",
            request.handle,
            self.factory.name(),
            request.priority
        );
        self.queue.push(request);

        if self.scheduled_tick.is_none() {
            self.scheduled_tick = Some(now + 1);
        }
    }

    /// Returns true if a batch should run at tick `now`
    #[must_use]
    pub fn is_due(&self, now: u64) -> bool {
        self.scheduled_tick.is_some_and(|tick| tick <= now)
    }

    /// Tick the next batch is scheduled at
    #[must_use]
    pub fn scheduled_tick(&self) -> Option<u64> {
        self.scheduled_tick
    }

    /// Move up to `limit` requests from the front of the queue into flight.
    ///
    /// Returns the batch size.
    pub fn begin_batch(&mut self, limit: usize) -> usize {
        self.scheduled_tick = None;

        let count = limit.min(self.queue.len());
        for _ in 0..count {
            if let Some(request) = self.queue.pop_front() {
                self.in_flight.push_back(request);
            }
        }
        count
    }

    /// Take the next request of the running batch
    pub fn next_in_flight(&mut self) -> Option<SpawnRequest> {
        self.in_flight.pop_front()
    }

    /// Close the running batch; reschedules if requests are left.
    pub fn finish_batch(&mut self, now: u64) {
        if !self.queue.is_empty() && self.scheduled_tick.is_none() {
            self.scheduled_tick = Some(now + 1);
        }
    }

    /// Put the unprocessed part of the running batch back into the queue.
    ///
    /// Each request lands ahead of the requests of equal or lower priority
    /// queued since the batch started.
    pub fn abort_batch(&mut self, now: u64) {
        while let Some(request) = self.in_flight.pop_back() {
            self.queue.requeue(request);
        }
        self.finish_batch(now);
    }

    /// Remove a pending request from the queue or the running batch.
    pub fn dequeue_by_handle(&mut self, handle: &Handle) -> Option<SpawnRequest> {
        let request = match self.queue.dequeue_by_handle(handle) {
            Some(request) => Some(request),
            None => self
                .in_flight
                .iter()
                .position(|request| &request.handle == handle)
                .and_then(|at| self.in_flight.remove(at)),
        };

        if self.queue.is_empty() {
            self.scheduled_tick = None;
        }
        request
    }

    /// Check if a request is pending
    #[must_use]
    pub fn contains(&self, handle: &Handle) -> bool {
        self.queue.contains(handle) || self.in_flight.iter().any(|r| &r.handle == handle)
    }

    /// Number of requests not constructed yet
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.len() + self.in_flight.len()
    }

    /// Drop every pending request; returns how many were dropped.
    pub fn clear_pending(&mut self) -> usize {
        let count = self.queue.clear() + self.in_flight.len();
        self.in_flight.clear();
        self.scheduled_tick = None;
        count
    }
}

impl std::fmt::Debug for SpawnPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnPipeline")
            .field("factory", &self.factory.name())
            .field("queued", &self.queue.len())
            .field("in_flight", &self.in_flight.len())
            .field("scheduled_tick", &self.scheduled_tick)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Archetype;
    use crate::factory::ObjectFactory;

    fn pipeline() -> SpawnPipeline {
        SpawnPipeline::new(Box::new(ObjectFactory))
    }

    fn request() -> SpawnRequest {
        SpawnRequest::new(Archetype::OBJECT)
    }

    #[test]
    fn test_schedules_next_tick() {
        let mut pipeline = pipeline();
        assert!(!pipeline.is_due(0));

        pipeline.enqueue(request(), 3);
        assert!(!pipeline.is_due(3));
        assert!(pipeline.is_due(4));
    }

    #[test]
    fn test_batches_are_bounded() {
        let mut pipeline = pipeline();
        for _ in 0..5 {
            pipeline.enqueue(request(), 0);
        }

        let mut sizes = Vec::new();
        for now in 1..=4 {
            if pipeline.is_due(now) {
                let size = pipeline.begin_batch(2);
                while pipeline.next_in_flight().is_some() {}
                pipeline.finish_batch(now);
                sizes.push(size);
            } else {
                sizes.push(0);
            }
        }

        assert_eq!(sizes, vec![2, 2, 1, 0]);
        assert_eq!(pipeline.scheduled_tick(), None);
    }

    #[test]
    fn test_abort_requeues_in_order() {
        let mut pipeline = pipeline();
        let requests: Vec<_> = (0..3).map(|_| request()).collect();
        let handles: Vec<_> = requests.iter().map(|r| r.handle.clone()).collect();
        for request in requests {
            pipeline.enqueue(request, 0);
        }

        assert_eq!(pipeline.begin_batch(3), 3);
        let first = pipeline.next_in_flight().map(|r| r.handle);
        assert_eq!(first.as_ref(), Some(&handles[0]));

        pipeline.abort_batch(1);
        assert_eq!(pipeline.pending_count(), 2);
        assert!(pipeline.is_due(2));
        assert_eq!(pipeline.begin_batch(5), 2);
        assert_eq!(pipeline.next_in_flight().map(|r| r.handle), Some(handles[1].clone()));
        assert_eq!(pipeline.next_in_flight().map(|r| r.handle), Some(handles[2].clone()));
    }

    #[test]
    fn test_replace_factory_keeps_queue() {
        let mut pipeline = pipeline();
        pipeline.enqueue(request(), 0);
        pipeline.begin_batch(0);
        pipeline.enqueue(request(), 0);

        let old = pipeline.replace_factory(Box::new(ObjectFactory));
        assert_eq!(old.name(), "object");
        assert_eq!(pipeline.pending_count(), 2);
        assert!(pipeline.is_due(1));
    }

    #[test]
    fn test_dequeue_searches_in_flight() {
        let mut pipeline = pipeline();
        let first = request();
        let second = request();
        let (a, b) = (first.handle.clone(), second.handle.clone());
        pipeline.enqueue(first, 0);
        pipeline.enqueue(second, 0);

        pipeline.begin_batch(1);
        assert!(pipeline.contains(&a));
        assert!(pipeline.dequeue_by_handle(&a).is_some());
        assert!(pipeline.dequeue_by_handle(&b).is_some());
        assert_eq!(pipeline.pending_count(), 0);
        assert_eq!(pipeline.clear_pending(), 0);
    }
}

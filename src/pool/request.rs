//! Spawn requests
//!
//! A request carries everything a factory needs to construct one object later:
//! the handle the caller already holds, the placement, the priority and the hooks
//! to run once the object exists.

use std::fmt;

use crate::core::Archetype;
use crate::ecs::Transform;
use crate::pool::{Handle, ObjectRecord, PoolRegistry};

/// Hook invoked with the record of a spawned object.
pub type SpawnCallback = Box<dyn FnOnce(&mut PoolRegistry, &ObjectRecord)>;

/// Hook invoked once with the records of a whole batch.
pub type SpawnAllCallback = Box<dyn FnOnce(&mut PoolRegistry, &[ObjectRecord])>;

/// Priority of a spawn request.
///
/// Ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SpawnPriority {
    /// Appended to the end of the queue
    #[default]
    Normal,
    /// Queued behind High and Critical
    Medium,
    /// Queued behind Critical
    High,
    /// Constructed immediately, bypassing the queue
    Critical,
}

/// Hooks attached to a spawn request.
#[derive(Default)]
pub struct SpawnCallbacks {
    /// Runs before the factory finalizes the object
    pub on_pre_registered: Option<SpawnCallback>,
    /// Runs once the object is fully spawned
    pub on_post_spawned: Option<SpawnCallback>,
}

/// A pending construction of one object.
pub struct SpawnRequest {
    /// Handle the object will be known by
    pub handle: Handle,
    /// Where to place the object
    pub placement: Transform,
    /// Queue priority
    pub priority: SpawnPriority,
    /// Hooks to run on completion
    pub callbacks: SpawnCallbacks,
}

impl SpawnRequest {
    /// Create a Normal priority request with a fresh handle.
    #[must_use]
    pub fn new(archetype: Archetype) -> Self {
        Self {
            handle: Handle::new(archetype),
            placement: Transform::default(),
            priority: SpawnPriority::Normal,
            callbacks: SpawnCallbacks::default(),
        }
    }

    /// Set the priority
    #[must_use]
    pub fn with_priority(mut self, priority: SpawnPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the placement
    #[must_use]
    pub fn with_placement(mut self, placement: Transform) -> Self {
        self.placement = placement;
        self
    }

    /// Set the hook to run once the object is spawned
    #[must_use]
    pub fn with_on_post_spawned(
        mut self,
        callback: impl FnOnce(&mut PoolRegistry, &ObjectRecord) + 'static,
    ) -> Self {
        self.callbacks.on_post_spawned = Some(Box::new(callback));
        self
    }

    /// Set the hook to run before the factory finalizes the object
    #[must_use]
    pub fn with_on_pre_registered(
        mut self,
        callback: impl FnOnce(&mut PoolRegistry, &ObjectRecord) + 'static,
    ) -> Self {
        self.callbacks.on_pre_registered = Some(Box::new(callback));
        self
    }

    /// Archetype of the requested object
    #[must_use]
    pub fn archetype(&self) -> &Archetype {
        self.handle.archetype()
    }

    /// A request is valid when its handle is
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Build `amount` requests of the same archetype and priority.
    #[must_use]
    pub fn make_requests(
        archetype: &Archetype,
        amount: usize,
        priority: SpawnPriority,
    ) -> Vec<Self> {
        (0..amount)
            .map(|_| Self::new(archetype.clone()).with_priority(priority))
            .collect()
    }
}

impl fmt::Debug for SpawnRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnRequest")
            .field("handle", &self.handle)
            .field("placement", &self.placement)
            .field("priority", &self.priority)
            .field("has_pre_registered", &self.callbacks.on_pre_registered.is_some())
            .field("has_post_spawned", &self.callbacks.on_post_spawned.is_some())
            .finish()
    }
}

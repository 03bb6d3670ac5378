//! Components of pooled actors

use glam::{Quat, Vec3};

use crate::pool::Handle;

/// Placement of an object: position, rotation and scale.
///
/// Also used as the placement of spawn requests, where the pool treats it as opaque.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
    /// Scale factor
    pub scale: Vec3,
}

impl Transform {
    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Simulation flags of an actor, toggled when it enters or leaves its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorState {
    /// Not rendered
    pub hidden: bool,
    /// Takes part in collision
    pub collision: bool,
    /// Receives per-frame updates
    pub ticking: bool,
}

impl ActorState {
    /// Everything off, the state of a parked actor
    pub const DORMANT: Self = Self {
        hidden: true,
        collision: false,
        ticking: false,
    };

    /// Everything on, the state of an actor in use
    pub const LIVE: Self = Self {
        hidden: false,
        collision: true,
        ticking: true,
    };

    /// Returns true if the actor is visible, colliding and ticking
    pub fn is_live(&self) -> bool {
        *self == Self::LIVE
    }
}

impl Default for ActorState {
    fn default() -> Self {
        Self::DORMANT
    }
}

/// Marks an actor whose construction has not been finalized yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredSpawn;

/// Handle under which the actor is pooled.
#[derive(Debug, Clone)]
pub struct Pooled(pub Handle);

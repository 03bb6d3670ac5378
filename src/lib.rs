//! Archetype-keyed object pooling
//!
//! This crate provides:
//! - Pools of reusable objects partitioned by archetype
//! - Handles issued before deferred construction completes
//! - A priority ordered spawn queue drained a bounded number per tick
//! - Pluggable factories for plain data, hecs actors and UI panels

pub mod core;
pub mod ecs;
pub mod factory;
pub mod pool;
pub mod ui;

pub use crate::core::{PoolError, Result};

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::{Archetype, Archetypes, PoolError, PoolSettings, PoolStats};
    pub use crate::ecs::{Name, Transform, World};
    pub use crate::factory::{ActorFactory, FactoryCatalog, ObjectFactory, PoolFactory, WidgetFactory};
    pub use crate::pool::{
        Handle, ObjectRecord, ObjectRef, ObjectState, PoolObject, PoolObjectCallback,
        PoolRegistry, SpawnPriority, SpawnRequest,
    };
    pub use crate::ui::{Anchor, Panel, Rect, Viewport};
    pub use glam::{Quat, Vec2, Vec3};
}

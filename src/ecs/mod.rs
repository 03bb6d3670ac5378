//! Entity Component System module
//!
//! Built on top of the hecs ECS library; hosts the entities of pooled actors

mod components;
mod world;

pub use components::{ActorState, DeferredSpawn, Name, Pooled, Transform};
pub use world::World;

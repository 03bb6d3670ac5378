//! Factories
//!
//! A factory knows how one family of archetypes is constructed, destroyed and
//! switched between its pooled states. Each factory bound in the registry owns a
//! spawn pipeline that staggers queued constructions over ticks.
//!
//! # Built-in factories
//!
//! - [`ObjectFactory`]: plain data objects built by the archetype table's constructors
//! - [`ActorFactory`]: entities in a hecs world, parked far away while pooled
//! - [`WidgetFactory`]: panel trees attached to a viewport, collapsed while pooled

mod actor;
mod catalog;
mod object;
mod pipeline;
mod widget;

pub use actor::{Actor, ActorFactory, Prefab};
pub use catalog::FactoryCatalog;
pub use object::ObjectFactory;
pub use pipeline::SpawnPipeline;
pub use widget::{Layout, WidgetFactory};

use crate::core::{Archetypes, Result};
use crate::ecs::Transform;
use crate::pool::{ObjectRecord, ObjectRef, ObjectState, SpawnRequest};

/// Construction strategy for one family of archetypes.
///
/// Only construction and destruction are required; the state hooks default to
/// doing nothing. The registry notifies the objects themselves, factories only
/// handle the family-specific side.
pub trait PoolFactory {
    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    /// Construct the object described by the request.
    ///
    /// The object must report the requested archetype.
    fn spawn_now(&mut self, request: &SpawnRequest, archetypes: &Archetypes) -> Result<ObjectRef>;

    /// Tear an object down for good
    fn destroy(&mut self, object: &ObjectRef);

    /// Finalize a freshly constructed object right after it was registered
    fn on_pre_registered(&mut self, _request: &SpawnRequest, _record: &ObjectRecord) {}

    /// A free object is about to be handed out again
    fn on_acquire(&mut self, _object: &ObjectRef, _placement: &Transform) {}

    /// An object is being returned to its pool
    fn on_release(&mut self, _object: &ObjectRef) {}

    /// An object was activated or deactivated
    fn on_state_changed(&mut self, _state: ObjectState, _object: &ObjectRef) {}
}

//! Generic factory for plain data objects

use crate::core::{Archetypes, PoolError, Result};
use crate::factory::PoolFactory;
use crate::pool::{ObjectRef, SpawnRequest};

/// Builds objects with the constructor the archetype table holds for the exact
/// requested archetype. Bound to the root archetype by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectFactory;

impl PoolFactory for ObjectFactory {
    fn name(&self) -> &'static str {
        "object"
    }

    fn spawn_now(&mut self, request: &SpawnRequest, archetypes: &Archetypes) -> Result<ObjectRef> {
        archetypes
            .construct(request.archetype())
            .ok_or_else(|| PoolError::ConstructionFailed {
                factory: self.name(),
                archetype: request.archetype().clone(),
                reason: "archetype has no constructor".into(),
            })
    }

    fn destroy(&mut self, object: &ObjectRef) {
        if let Some(mut object) = object.try_borrow_mut() {
            object.begin_destroy();
        }
    }
}

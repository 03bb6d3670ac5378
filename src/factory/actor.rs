//! Actor factory
//!
//! Pooled actors are entities in a shared hecs world. A free actor stays in the
//! world, parked far outside of it with rendering, collision and ticking off.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use hecs::{Entity, EntityBuilder};
use rustc_hash::FxHashMap;

use crate::core::{Archetype, Archetypes, PoolError, Result};
use crate::ecs::{ActorState, DeferredSpawn, Name, Pooled, Transform, World};
use crate::factory::PoolFactory;
use crate::pool::{ObjectRecord, ObjectRef, ObjectState, PoolObject, SpawnRequest};

/// Where released actors wait to be reused
const PARKING_POSITION: Vec3 = Vec3::splat(1_048_575.0);

/// Adds archetype specific components to a new actor.
pub type Prefab = Box<dyn Fn(&mut EntityBuilder)>;

/// A pooled actor: the entity backing it and its archetype.
#[derive(Debug, Clone)]
pub struct Actor {
    archetype: Archetype,
    entity: Entity,
}

impl Actor {
    /// Entity of the actor
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }
}

impl PoolObject for Actor {
    fn archetype(&self) -> &Archetype {
        &self.archetype
    }
}

/// Factory of [`Actor`]s backed by a shared [`World`].
pub struct ActorFactory {
    world: Rc<RefCell<World>>,
    prefabs: FxHashMap<Archetype, Prefab>,
}

impl ActorFactory {
    /// Create a factory spawning into `world`
    #[must_use]
    pub fn new(world: Rc<RefCell<World>>) -> Self {
        Self {
            world,
            prefabs: FxHashMap::default(),
        }
    }

    /// Register the prefab of an archetype; descendants without their own inherit it.
    #[must_use]
    pub fn with_prefab(
        mut self,
        archetype: Archetype,
        prefab: impl Fn(&mut EntityBuilder) + 'static,
    ) -> Self {
        self.prefabs.insert(archetype, Box::new(prefab));
        self
    }

    /// The world actors are spawned into
    #[must_use]
    pub fn world(&self) -> &Rc<RefCell<World>> {
        &self.world
    }

    fn entity_of(object: &ObjectRef) -> Option<Entity> {
        object.downcast_ref::<Actor>().map(|actor| actor.entity)
    }

    fn update_transform(&self, object: &ObjectRef, update: impl FnOnce(&mut Transform)) {
        let Some(entity) = Self::entity_of(object) else {
            log::warn!("Object of '{}' is not an actor", object.archetype());
            return;
        };

        let mut world = self.world.borrow_mut();
        match world.get_mut::<Transform>(entity) {
            Ok(mut transform) => update(&mut transform),
            Err(err) => log::warn!("Actor {entity:?} has no transform: {err}"),
        }
    }
}

impl PoolFactory for ActorFactory {
    fn name(&self) -> &'static str {
        "actor"
    }

    fn spawn_now(&mut self, request: &SpawnRequest, archetypes: &Archetypes) -> Result<ObjectRef> {
        let archetype = request.archetype();
        if !archetypes.is_a(archetype, &Archetype::ACTOR) {
            return Err(PoolError::ConstructionFailed {
                factory: self.name(),
                archetype: archetype.clone(),
                reason: "archetype is not an actor".into(),
            });
        }

        let mut builder = EntityBuilder::new();
        if let Some(prefab) = archetypes
            .ancestors(archetype)
            .iter()
            .find_map(|ancestor| self.prefabs.get(ancestor))
        {
            prefab(&mut builder);
        }

        builder
            .add(Name::new(archetype.name()))
            .add(Transform::from_position(PARKING_POSITION))
            .add(ActorState::DORMANT)
            .add(Pooled(request.handle.clone()))
            .add(DeferredSpawn);

        let entity = self.world.borrow_mut().spawn_built(&mut builder);
        log::debug!("Spawned actor {entity:?} for {}", request.handle);

        Ok(ObjectRef::new(Actor {
            archetype: archetype.clone(),
            entity,
        }))
    }

    fn destroy(&mut self, object: &ObjectRef) {
        let Some(entity) = Self::entity_of(object) else {
            return;
        };
        if self.world.borrow_mut().despawn(entity).is_err() {
            log::warn!("Actor {entity:?} was already despawned");
        }
    }

    fn on_pre_registered(&mut self, request: &SpawnRequest, record: &ObjectRecord) {
        if let Some(entity) = Self::entity_of(&record.object) {
            let _ = self.world.borrow_mut().remove_one::<DeferredSpawn>(entity);
        }
        self.update_transform(&record.object, |transform| *transform = request.placement);
    }

    fn on_acquire(&mut self, object: &ObjectRef, placement: &Transform) {
        self.update_transform(object, |transform| *transform = *placement);
    }

    fn on_release(&mut self, object: &ObjectRef) {
        self.update_transform(object, |transform| transform.position = PARKING_POSITION);
    }

    fn on_state_changed(&mut self, state: ObjectState, object: &ObjectRef) {
        let Some(entity) = Self::entity_of(object) else {
            return;
        };

        let mut world = self.world.borrow_mut();
        if let Ok(mut actor_state) = world.get_mut::<ActorState>(entity) {
            *actor_state = match state {
                ObjectState::Active => ActorState::LIVE,
                ObjectState::Inactive | ObjectState::None => ActorState::DORMANT,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Speed(f32);

    fn setup() -> (ActorFactory, Archetypes) {
        let mut archetypes = Archetypes::new();
        archetypes.declare("Projectile".into(), Archetype::ACTOR);
        archetypes.declare("Rocket".into(), "Projectile".into());

        let factory = ActorFactory::new(Rc::new(RefCell::new(World::new())))
            .with_prefab("Projectile".into(), |builder| {
                builder.add(Speed(40.0));
            });
        (factory, archetypes)
    }

    #[test]
    fn test_spawn_applies_ancestor_prefab() {
        let (mut factory, archetypes) = setup();
        let request = SpawnRequest::new("Rocket".into());

        let object = factory.spawn_now(&request, &archetypes).unwrap();
        let entity = ActorFactory::entity_of(&object).unwrap();
        let world = factory.world().borrow();

        assert_eq!(*world.get::<Speed>(entity).unwrap(), Speed(40.0));
        assert!(world.has::<DeferredSpawn>(entity));
        assert_eq!(world.get::<Pooled>(entity).unwrap().0, request.handle);
    }

    #[test]
    fn test_finalize_and_park() {
        let (mut factory, archetypes) = setup();
        let placement = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let request = SpawnRequest::new("Projectile".into()).with_placement(placement);

        let object = factory.spawn_now(&request, &archetypes).unwrap();
        let entity = ActorFactory::entity_of(&object).unwrap();
        let record = ObjectRecord::new(object.clone()).with_handle(request.handle.clone());

        factory.on_pre_registered(&request, &record);
        factory.on_state_changed(ObjectState::Active, &object);
        {
            let world = factory.world().borrow();
            assert!(!world.has::<DeferredSpawn>(entity));
            assert_eq!(world.get::<Transform>(entity).unwrap().position, placement.position);
            assert!(world.get::<ActorState>(entity).unwrap().is_live());
        }

        factory.on_release(&object);
        factory.on_state_changed(ObjectState::Inactive, &object);
        {
            let world = factory.world().borrow();
            assert_eq!(world.get::<Transform>(entity).unwrap().position, PARKING_POSITION);
            assert_eq!(*world.get::<ActorState>(entity).unwrap(), ActorState::DORMANT);
        }

        factory.destroy(&object);
        assert!(!factory.world().borrow().contains(entity));
    }

    #[test]
    fn test_rejects_non_actor_archetype() {
        let (mut factory, archetypes) = setup();
        let err = factory
            .spawn_now(&SpawnRequest::new(Archetype::WIDGET), &archetypes)
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Construction);
    }
}

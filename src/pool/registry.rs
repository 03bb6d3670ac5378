//! Pool registry
//!
//! The registry owns every pool container and the archetype→factory bindings, and
//! is the only type callers talk to. Free objects are handed out synchronously;
//! everything else is queued on the factory serving the archetype and constructed
//! by [`PoolRegistry::tick`], a bounded number per factory and tick.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = PoolRegistry::new(archetypes);
//! registry.add_factory(Archetype::ACTOR, Box::new(ActorFactory::new(world)))?;
//!
//! let handle = registry.acquire(
//!     &"Projectile".into(),
//!     SpawnPriority::Normal,
//!     Transform::from_position(muzzle),
//!     |registry, record| log::info!("{} is ready", record.handle),
//! )?;
//!
//! // Once per frame
//! registry.tick()?;
//!
//! registry.release_handle(&handle)?;
//! ```

use crate::core::{Archetype, Archetypes, PoolError, PoolSettings, PoolStats, Result};
use crate::ecs::Transform;
use crate::factory::{FactoryCatalog, ObjectFactory, PoolFactory, SpawnPipeline};
use crate::pool::{
    Handle, ObjectRecord, ObjectRef, ObjectState, PoolContainer, SpawnPriority, SpawnRequest,
};

use rustc_hash::FxHashMap;

/// Façade over every object pool.
pub struct PoolRegistry {
    settings: PoolSettings,
    archetypes: Archetypes,
    /// Bound factories with their spawn queues, keyed by the bound archetype
    factories: FxHashMap<Archetype, SpawnPipeline>,
    /// One container per exact archetype
    pools: FxHashMap<Archetype, PoolContainer>,
    /// Ticks processed so far
    tick: u64,
    stats: PoolStats,
}

impl PoolRegistry {
    /// Create a registry with default settings and the generic factory bound to the root.
    #[must_use]
    pub fn new(archetypes: Archetypes) -> Self {
        Self::with_settings(PoolSettings::default(), archetypes)
    }

    /// Create a registry with the given settings and the generic factory bound to the root.
    ///
    /// Factory bindings in the settings are ignored; see [`PoolRegistry::from_settings`].
    #[must_use]
    pub fn with_settings(settings: PoolSettings, archetypes: Archetypes) -> Self {
        let mut factories = FxHashMap::default();
        factories.insert(Archetype::OBJECT, SpawnPipeline::new(Box::new(ObjectFactory)));

        Self {
            settings,
            archetypes,
            factories,
            pools: FxHashMap::default(),
            tick: 0,
            stats: PoolStats::new(),
        }
    }

    /// Create a registry and bind the factories named in the settings.
    ///
    /// Bindings naming an unknown factory or an undeclared archetype are skipped.
    #[must_use]
    pub fn from_settings(
        settings: PoolSettings,
        archetypes: Archetypes,
        catalog: &FactoryCatalog,
    ) -> Self {
        let bindings = settings.factories.clone();
        let mut registry = Self::with_settings(settings, archetypes);

        for binding in bindings {
            let Some(factory) = catalog.build(&binding.factory) else {
                log::warn!(
                    "Unknown factory '{}' for '{}', skipping",
                    binding.factory,
                    binding.archetype
                );
                continue;
            };
            // Undeclared archetypes are reported by add_factory
            let _ = registry.add_factory(binding.archetype, factory);
        }
        registry
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Active settings
    #[must_use]
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// The archetype table
    #[must_use]
    pub fn archetypes(&self) -> &Archetypes {
        &self.archetypes
    }

    /// The archetype table, for declaring archetypes later on
    pub fn archetypes_mut(&mut self) -> &mut Archetypes {
        &mut self.archetypes
    }

    /// Activity counters
    #[must_use]
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Number of ticks processed so far
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    // ========================================================================
    // Factories
    // ========================================================================

    /// Bind a factory to an archetype and its descendants.
    ///
    /// Replacing a binding hands the requests still pending on the old factory
    /// over to the new one.
    pub fn add_factory(&mut self, archetype: Archetype, factory: Box<dyn PoolFactory>) -> Result<()> {
        self.check_archetype(&archetype)?;

        let name = factory.name();
        match self.factories.get_mut(&archetype) {
            Some(pipeline) => {
                let old = pipeline.replace_factory(factory);
                log::info!(
                    "Replaced factory '{}' of '{archetype}' with '{name}', {} requests kept",
                    old.name(),
                    pipeline.pending_count()
                );
            }
            None => {
                self.factories
                    .insert(archetype.clone(), SpawnPipeline::new(factory));
                log::info!("Bound factory '{name}' to '{archetype}'");
            }
        }
        Ok(())
    }

    /// Unbind the factory of an archetype, dropping its queued requests.
    ///
    /// Pools it served fall back to the nearest ancestor's factory.
    pub fn remove_factory(&mut self, archetype: &Archetype) -> Option<Box<dyn PoolFactory>> {
        let mut pipeline = self.factories.remove(archetype)?;
        self.drop_pending(&mut pipeline, archetype);
        log::info!("Unbound factory '{}' from '{archetype}'", pipeline.factory().name());
        Some(pipeline.into_factory())
    }

    /// Check if a factory is bound directly to the archetype
    #[must_use]
    pub fn has_factory(&self, archetype: &Archetype) -> bool {
        self.factories.contains_key(archetype)
    }

    /// The factory serving an archetype, found by walking up its ancestors
    #[must_use]
    pub fn factory_for(&self, archetype: &Archetype) -> Option<&dyn PoolFactory> {
        self.factory_key(archetype)
            .and_then(|key| self.factories.get(&key))
            .map(SpawnPipeline::factory)
    }

    fn drop_pending(&mut self, pipeline: &mut SpawnPipeline, archetype: &Archetype) {
        let dropped = pipeline.clear_pending();
        if dropped > 0 {
            log::warn!("Dropped {dropped} pending requests of '{archetype}'");
            for _ in 0..dropped {
                self.stats.record_cancel();
            }
        }
    }

    fn factory_key(&self, archetype: &Archetype) -> Option<Archetype> {
        self.archetypes
            .ancestors(archetype)
            .into_iter()
            .find(|ancestor| self.factories.contains_key(ancestor))
    }

    fn resolve_factory(&self, archetype: &Archetype) -> Result<Archetype> {
        self.factory_key(archetype)
            .ok_or_else(|| PoolError::MissingFactory(archetype.clone()).logged())
    }

    fn check_archetype(&self, archetype: &Archetype) -> Result<()> {
        if !archetype.is_valid() {
            return Err(PoolError::InvalidArchetype.logged());
        }
        if !self.archetypes.contains(archetype) {
            return Err(PoolError::UnknownArchetype(archetype.clone()).logged());
        }
        Ok(())
    }

    fn pipeline_mut(&mut self, key: &Archetype) -> Result<&mut SpawnPipeline> {
        self.factories
            .get_mut(key)
            .ok_or_else(|| PoolError::MissingFactory(key.clone()).logged())
    }

    fn container_mut(&mut self, archetype: &Archetype, key: &Archetype) -> &mut PoolContainer {
        let container = self
            .pools
            .entry(archetype.clone())
            .or_insert_with(|| PoolContainer::new(archetype.clone(), key.clone()));
        container.set_factory(key.clone());
        container
    }

    fn apply_state(&mut self, key: &Archetype, object: &ObjectRef, state: ObjectState) {
        if let Some(pipeline) = self.factories.get_mut(key) {
            pipeline.factory_mut().on_state_changed(state, object);
        }
        object.notify_state_changed(state);
    }

    // ========================================================================
    // Acquire
    // ========================================================================

    /// Get an object of `archetype`.
    ///
    /// A free object is reactivated right away and `on_ready` runs before this
    /// returns. Otherwise construction is queued with `priority` (or done right
    /// away for [`SpawnPriority::Critical`]) and `on_ready` runs once it completes.
    /// The returned handle is valid either way.
    pub fn acquire(
        &mut self,
        archetype: &Archetype,
        priority: SpawnPriority,
        placement: Transform,
        on_ready: impl FnOnce(&mut Self, &ObjectRecord) + 'static,
    ) -> Result<Handle> {
        if let Some(record) = self.take_free(archetype, &placement)? {
            let handle = record.handle.clone();
            on_ready(self, &record);
            return Ok(handle);
        }

        let request = SpawnRequest::new(archetype.clone())
            .with_priority(priority)
            .with_placement(placement)
            .with_on_post_spawned(on_ready);
        self.create_new_object(request)
    }

    /// Get `count` objects of `archetype`.
    ///
    /// Free objects are taken first, the rest are requested. `on_all_ready` runs
    /// once with every record, free ones first, after the last request completes.
    pub fn acquire_many(
        &mut self,
        archetype: &Archetype,
        priority: SpawnPriority,
        count: usize,
        on_all_ready: impl FnOnce(&mut Self, &[ObjectRecord]) + 'static,
    ) -> Result<Vec<Handle>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let requests = SpawnRequest::make_requests(archetype, count, priority);
        self.acquire_batch(requests, on_all_ready)
    }

    /// Get one object per request, for any mix of archetypes.
    ///
    /// Requests served by a free object run their post-spawn hook right away.
    /// `on_all_ready` runs once the last submitted request completes, or right
    /// away when every request was served by a free object. It never runs if
    /// the last request is cancelled.
    ///
    /// If a critical construction fails, every object the batch already handed
    /// out is released, its queued requests are cancelled and the error is returned.
    pub fn acquire_batch(
        &mut self,
        mut requests: Vec<SpawnRequest>,
        on_all_ready: impl FnOnce(&mut Self, &[ObjectRecord]) + 'static,
    ) -> Result<Vec<Handle>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let ready = self.take_free_batch(&mut requests)?;
        let mut handles: Vec<Handle> = ready.iter().map(|record| record.handle.clone()).collect();

        let mut pending = Vec::new();
        for mut request in requests {
            let Some(record) = ready.iter().find(|record| record.handle == request.handle) else {
                pending.push(request);
                continue;
            };
            if let Some(hook) = request.callbacks.on_post_spawned.take() {
                hook(self, record);
            }
        }

        if pending.is_empty() {
            on_all_ready(self, &ready);
            return Ok(handles);
        }

        let issued = handles.len();
        handles.extend(pending.iter().map(|request| request.handle.clone()));
        let wanted = handles.clone();
        if let Some(last) = pending.last_mut() {
            let hook = last.callbacks.on_post_spawned.take();
            last.callbacks.on_post_spawned = Some(Box::new(
                move |registry: &mut PoolRegistry, record: &ObjectRecord| {
                    if let Some(hook) = hook {
                        hook(registry, record);
                    }
                    let records = registry.find_by_handles(&wanted);
                    if records.len() != wanted.len() {
                        log::warn!(
                            "Only {} of {} batch objects are pooled",
                            records.len(),
                            wanted.len()
                        );
                    }
                    on_all_ready(registry, &records);
                },
            ));
        }

        for (submitted, request) in pending.into_iter().enumerate() {
            if let Err(err) = self.create_new_object(request) {
                let rollback = &handles[..issued + submitted];
                log::warn!("Batch failed, rolling back {} objects", rollback.len());
                self.release_handles(rollback);
                return Err(err);
            }
        }
        Ok(handles)
    }

    /// Take a free object for every request that can be served without construction.
    ///
    /// Served requests get the handle of their object. Returns the taken
    /// records in request order; the other requests are left untouched.
    pub fn take_free_batch(&mut self, requests: &mut [SpawnRequest]) -> Result<Vec<ObjectRecord>> {
        for request in requests.iter() {
            self.check_archetype(request.archetype())?;
            self.resolve_factory(request.archetype())?;
        }

        let mut taken = Vec::new();
        for request in requests.iter_mut() {
            if let Some(record) = self.take_free(request.archetype(), &request.placement)? {
                request.handle = record.handle.clone();
                taken.push(record);
            }
        }
        Ok(taken)
    }

    /// Reactivate the first free object of `archetype`, if there is one.
    pub fn take_free(
        &mut self,
        archetype: &Archetype,
        placement: &Transform,
    ) -> Result<Option<ObjectRecord>> {
        self.check_archetype(archetype)?;
        let key = self.resolve_factory(archetype)?;

        let Some(container) = self.pools.get_mut(archetype) else {
            return Ok(None);
        };
        container.set_factory(key.clone());
        let Some(record) = container.first_free_mut() else {
            return Ok(None);
        };
        record.active = true;
        let record = record.clone();

        self.pipeline_mut(&key)?
            .factory_mut()
            .on_acquire(&record.object, placement);
        record.object.notify_taken(false, placement);
        self.apply_state(&key, &record.object, ObjectState::Active);

        self.stats.record_reuse();
        log::debug!("Reused {}", record.handle);
        Ok(Some(record))
    }

    /// Queue the construction of a new object, skipping free ones.
    ///
    /// Critical requests are constructed before this returns.
    pub fn create_new_object(&mut self, mut request: SpawnRequest) -> Result<Handle> {
        let archetype = request.archetype().clone();
        self.check_archetype(&archetype)?;
        let key = self.resolve_factory(&archetype)?;
        self.container_mut(&archetype, &key);

        if !request.handle.is_valid() {
            request.handle = Handle::new(archetype.clone());
        }

        let handle = request.handle.clone();
        if request.priority == SpawnPriority::Critical {
            self.complete_spawn(&key, request)?;
        } else {
            let now = self.tick;
            self.pipeline_mut(&key)?.enqueue(request, now);
        }
        Ok(handle)
    }

    fn complete_spawn(&mut self, key: &Archetype, mut request: SpawnRequest) -> Result<ObjectRecord> {
        let pipeline = self
            .factories
            .get_mut(key)
            .ok_or_else(|| PoolError::MissingFactory(key.clone()).logged())?;
        let factory = pipeline.factory_mut();
        let object = factory
            .spawn_now(&request, &self.archetypes)
            .map_err(PoolError::logged)?;

        if object.archetype() != request.archetype() {
            factory.destroy(&object);
            return Err(PoolError::ConstructionFailed {
                factory: factory.name(),
                archetype: request.archetype().clone(),
                reason: format!("constructed '{}' instead", object.archetype()),
            }
            .logged());
        }

        let record = ObjectRecord::new(object)
            .with_handle(request.handle.clone())
            .with_active(true);
        self.register(record.clone())?;

        if let Some(hook) = request.callbacks.on_pre_registered.take() {
            hook(self, &record);
        }
        if let Some(pipeline) = self.factories.get_mut(key) {
            pipeline.factory_mut().on_pre_registered(&request, &record);
        }
        if let Some(hook) = request.callbacks.on_post_spawned.take() {
            hook(self, &record);
        }
        record.object.notify_taken(true, &request.placement);

        self.stats.record_spawn();
        log::debug!("Spawned {}", record.handle);
        Ok(record)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance one tick and construct the queued objects that are due.
    ///
    /// Returns how many objects were constructed. If a construction fails, the
    /// rest of that factory's batch is put back for the next tick and the first
    /// error is returned once every due factory had its turn.
    pub fn tick(&mut self) -> Result<usize> {
        self.tick += 1;
        let now = self.tick;
        let limit = self.settings.objects_per_tick();

        let mut due: Vec<Archetype> = self
            .factories
            .iter()
            .filter(|(_, pipeline)| pipeline.is_due(now))
            .map(|(key, _)| key.clone())
            .collect();
        due.sort();

        let mut spawned = 0;
        let mut failure = None;
        for key in due {
            match self.run_batch(&key, limit, now) {
                Ok(count) => spawned += count,
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }

        self.stats.record_tick(spawned);
        match failure {
            Some(err) => Err(err),
            None => Ok(spawned),
        }
    }

    fn run_batch(&mut self, key: &Archetype, limit: usize, now: u64) -> Result<usize> {
        let size = self.pipeline_mut(key)?.begin_batch(limit);

        let mut spawned = 0;
        while let Some(request) = self
            .factories
            .get_mut(key)
            .and_then(SpawnPipeline::next_in_flight)
        {
            if let Err(err) = self.complete_spawn(key, request) {
                if let Some(pipeline) = self.factories.get_mut(key) {
                    pipeline.abort_batch(now);
                }
                return Err(err);
            }
            spawned += 1;
        }

        if let Some(pipeline) = self.factories.get_mut(key) {
            pipeline.finish_batch(now);
        }
        log::debug!("Factory of '{key}' spawned {spawned}/{size} on tick {now}");
        Ok(spawned)
    }

    /// Number of requests waiting for construction
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.factories.values().map(SpawnPipeline::pending_count).sum()
    }

    /// Check if the handle belongs to a request waiting for construction
    #[must_use]
    pub fn is_pending(&self, handle: &Handle) -> bool {
        self.factories
            .values()
            .any(|pipeline| pipeline.contains(handle))
    }

    // ========================================================================
    // Release
    // ========================================================================

    /// Return an active object to its pool.
    pub fn release(&mut self, object: &ObjectRef) -> Result<()> {
        let archetype = object.archetype().clone();
        let record = self
            .pools
            .get(&archetype)
            .and_then(|container| container.find_by_object(object))
            .ok_or_else(|| PoolError::UnknownObject(archetype.clone()).logged())?;
        if !record.is_active() {
            return Err(PoolError::NotActive(archetype).logged());
        }
        let handle = record.handle.clone();
        let key = self.resolve_factory(&archetype)?;

        self.pools
            .get_mut(&archetype)
            .and_then(|container| container.find_by_object_mut(object))
            .ok_or_else(|| PoolError::MissingRecord(archetype.clone()).logged())?
            .active = false;

        self.pipeline_mut(&key)?.factory_mut().on_release(object);
        object.notify_returned();
        self.apply_state(&key, object, ObjectState::Inactive);

        log::debug!("Released {handle}");
        Ok(())
    }

    /// Release the object behind a handle, or cancel its pending construction.
    pub fn release_handle(&mut self, handle: &Handle) -> Result<()> {
        if !handle.is_valid() {
            return Err(PoolError::InvalidHandle.logged());
        }

        if let Some(record) = self.find_by_handle(handle) {
            let object = record.object.clone();
            return self.release(&object);
        }

        for pipeline in self.factories.values_mut() {
            if pipeline.dequeue_by_handle(handle).is_some() {
                self.stats.record_cancel();
                log::debug!("Cancelled pending {handle}");
                return Ok(());
            }
        }

        Err(PoolError::UnknownHandle(handle.clone()).logged())
    }

    /// Release several objects; returns true if every release succeeded.
    pub fn release_many(&mut self, objects: &[ObjectRef]) -> bool {
        objects
            .iter()
            .fold(true, |all, object| self.release(object).is_ok() && all)
    }

    /// Release or cancel several handles; returns true if every one succeeded.
    pub fn release_handles(&mut self, handles: &[Handle]) -> bool {
        handles
            .iter()
            .fold(true, |all, handle| self.release_handle(handle).is_ok() && all)
    }

    /// Release an object, adopting it as a free object if it is not pooled yet.
    pub fn release_or_register(&mut self, object: &ObjectRef) -> Result<()> {
        if self.contains_object(object) {
            return self.release(object);
        }
        self.register(ObjectRecord::new(object.clone())).map(|_| ())
    }

    // ========================================================================
    // Registration and clearing
    // ========================================================================

    /// Add an externally created object to its archetype's pool.
    ///
    /// Returns `Ok(false)` without side effects if the object or its handle is
    /// already pooled. A missing handle is generated.
    pub fn register(&mut self, mut record: ObjectRecord) -> Result<bool> {
        let archetype = record.object.archetype().clone();
        self.check_archetype(&archetype)?;
        if record.handle.is_valid() && record.handle.archetype() != &archetype {
            return Err(PoolError::ArchetypeMismatch {
                handle: record.handle.archetype().clone(),
                object: archetype,
            }
            .logged());
        }
        let key = self.resolve_factory(&archetype)?;

        if let Some(container) = self.pools.get(&archetype) {
            let known_object = container.find_by_object(&record.object).is_some();
            let known_handle =
                record.handle.is_valid() && container.find_by_handle(&record.handle).is_some();
            if known_object || known_handle {
                log::debug!("Object of '{archetype}' is already pooled");
                return Ok(false);
            }
        }

        if !record.is_valid() {
            record.handle = Handle::new(archetype.clone());
        }
        let state = if record.active {
            ObjectState::Active
        } else {
            ObjectState::Inactive
        };
        let object = record.object.clone();
        log::debug!("Registered {} as {state:?}", record.handle);

        self.container_mut(&archetype, &key).push(record);
        self.apply_state(&key, &object, state);
        Ok(true)
    }

    /// Destroy every object of `archetype` and drop its pool.
    ///
    /// Returns how many objects were destroyed.
    pub fn empty_pool(&mut self, archetype: &Archetype) -> Result<usize> {
        if !self.pools.contains_key(archetype) {
            return Ok(0);
        }
        let key = self.resolve_factory(archetype)?;
        let records = self
            .pools
            .remove(archetype)
            .map(|mut container| container.take_records())
            .unwrap_or_default();

        Ok(self.destroy_records(&key, &records))
    }

    /// Destroy every pooled object.
    ///
    /// Pools whose factory can not be resolved are kept; the first such error is
    /// returned after the others were emptied.
    pub fn empty_all(&mut self) -> Result<usize> {
        let mut archetypes: Vec<Archetype> = self.pools.keys().cloned().collect();
        archetypes.sort();

        let mut destroyed = 0;
        let mut failure = None;
        for archetype in archetypes {
            match self.empty_pool(&archetype) {
                Ok(count) => destroyed += count,
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(destroyed),
        }
    }

    /// Destroy the pooled objects matching `predicate`, in every pool.
    pub fn empty_by_predicate(
        &mut self,
        mut predicate: impl FnMut(&ObjectRecord) -> bool,
    ) -> Result<usize> {
        let mut archetypes: Vec<Archetype> = self.pools.keys().cloned().collect();
        archetypes.sort();

        let mut destroyed = 0;
        for archetype in archetypes {
            let key = self.resolve_factory(&archetype)?;
            let Some(container) = self.pools.get_mut(&archetype) else {
                continue;
            };

            let (doomed, kept): (Vec<_>, Vec<_>) = container
                .take_records()
                .into_iter()
                .partition(|record| predicate(record));
            for record in kept {
                container.push(record);
            }

            destroyed += self.destroy_records(&key, &doomed);
        }
        Ok(destroyed)
    }

    fn destroy_records(&mut self, key: &Archetype, records: &[ObjectRecord]) -> usize {
        if let Some(pipeline) = self.factories.get_mut(key) {
            let factory = pipeline.factory_mut();
            for record in records {
                factory.destroy(&record.object);
            }
        }

        self.stats.record_destroyed(records.len());
        log::debug!("Destroyed {} objects", records.len());
        records.len()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Pool state of an object
    #[must_use]
    pub fn state(&self, object: &ObjectRef) -> ObjectState {
        self.find_record(object)
            .map_or(ObjectState::None, ObjectRecord::state)
    }

    /// Check if an object is pooled
    #[must_use]
    pub fn contains_object(&self, object: &ObjectRef) -> bool {
        self.find_record(object).is_some()
    }

    /// Check if a pool exists for the exact archetype
    #[must_use]
    pub fn contains_archetype(&self, archetype: &Archetype) -> bool {
        self.pools.contains_key(archetype)
    }

    /// Check if an object is pooled and taken
    #[must_use]
    pub fn is_active(&self, object: &ObjectRef) -> bool {
        self.find_record(object).is_some_and(ObjectRecord::is_active)
    }

    /// Check if an object is pooled and free
    #[must_use]
    pub fn is_free(&self, object: &ObjectRef) -> bool {
        self.find_record(object).is_some_and(ObjectRecord::is_free)
    }

    /// Check if a constructed object is pooled under the handle
    #[must_use]
    pub fn is_registered(&self, handle: &Handle) -> bool {
        self.find_by_handle(handle).is_some()
    }

    /// Number of free objects of the archetype
    #[must_use]
    pub fn free_count(&self, archetype: &Archetype) -> usize {
        self.pools
            .get(archetype)
            .map_or(0, PoolContainer::free_count)
    }

    /// Number of pooled objects of the archetype
    #[must_use]
    pub fn registered_count(&self, archetype: &Archetype) -> usize {
        self.pools
            .get(archetype)
            .map_or(0, PoolContainer::registered_count)
    }

    /// Find the record of a handle
    #[must_use]
    pub fn find_by_handle(&self, handle: &Handle) -> Option<&ObjectRecord> {
        if !handle.is_valid() {
            return None;
        }
        self.pools
            .get(handle.archetype())
            .and_then(|container| container.find_by_handle(handle))
    }

    /// Find the handle of a pooled object
    #[must_use]
    pub fn find_handle(&self, object: &ObjectRef) -> Option<Handle> {
        self.find_record(object).map(|record| record.handle.clone())
    }

    /// Records of the given handles, in the given order, skipping unknown ones
    #[must_use]
    pub fn find_by_handles(&self, handles: &[Handle]) -> Vec<ObjectRecord> {
        handles
            .iter()
            .filter_map(|handle| self.find_by_handle(handle))
            .cloned()
            .collect()
    }

    /// The pool of the exact archetype
    #[must_use]
    pub fn pool(&self, archetype: &Archetype) -> Option<&PoolContainer> {
        self.pools.get(archetype)
    }

    fn find_record(&self, object: &ObjectRef) -> Option<&ObjectRecord> {
        self.pools
            .get(object.archetype())
            .and_then(|container| container.find_by_object(object))
    }
}

impl Drop for PoolRegistry {
    fn drop(&mut self) {
        let pending = self.pending_count();
        if pending > 0 {
            log::debug!("Dropping {pending} pending requests");
        }
        if let Err(err) = self.empty_all() {
            log::warn!("Some pools were left behind: {err}");
        }
    }
}

impl std::fmt::Debug for PoolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("tick", &self.tick)
            .field("factories", &self.factories)
            .field("pools", &self.pools.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use glam::Vec3;
    use rustc_hash::FxHashSet;

    use super::*;
    use crate::core::{ErrorKind, PoolSettings};
    use crate::ecs::{ActorState, World};
    use crate::factory::{Actor, ActorFactory};
    use crate::pool::{PoolObject, PoolObjectCallback};

    // ------------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------------

    #[derive(Debug, Default)]
    struct Projectile {
        archetype: Archetype,
        taken: Vec<bool>,
        returned: usize,
        states: Vec<ObjectState>,
    }

    impl PoolObject for Projectile {
        fn archetype(&self) -> &Archetype {
            &self.archetype
        }

        fn callbacks(&mut self) -> Option<&mut dyn PoolObjectCallback> {
            Some(self)
        }
    }

    impl PoolObjectCallback for Projectile {
        fn on_take_from_pool(&mut self, is_new_spawned: bool, _placement: &Transform) {
            self.taken.push(is_new_spawned);
        }

        fn on_return_to_pool(&mut self) {
            self.returned += 1;
        }

        fn on_changed_state_in_pool(&mut self, state: ObjectState) {
            self.states.push(state);
        }
    }

    #[derive(Debug, Default)]
    struct Counters {
        spawned: Cell<usize>,
        destroyed: Cell<usize>,
        finalized: Cell<usize>,
        acquired: Cell<usize>,
        released: Cell<usize>,
        fail: Cell<bool>,
    }

    struct CountingFactory {
        counters: Rc<Counters>,
    }

    impl PoolFactory for CountingFactory {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn spawn_now(&mut self, request: &SpawnRequest, _: &Archetypes) -> Result<ObjectRef> {
            if self.counters.fail.get() {
                return Err(PoolError::ConstructionFailed {
                    factory: self.name(),
                    archetype: request.archetype().clone(),
                    reason: "out of ammo".into(),
                });
            }
            self.counters.spawned.set(self.counters.spawned.get() + 1);
            Ok(ObjectRef::new(Projectile {
                archetype: request.archetype().clone(),
                ..Default::default()
            }))
        }

        fn destroy(&mut self, _object: &ObjectRef) {
            self.counters.destroyed.set(self.counters.destroyed.get() + 1);
        }

        fn on_pre_registered(&mut self, _request: &SpawnRequest, _record: &ObjectRecord) {
            self.counters.finalized.set(self.counters.finalized.get() + 1);
        }

        fn on_acquire(&mut self, _object: &ObjectRef, _placement: &Transform) {
            self.counters.acquired.set(self.counters.acquired.get() + 1);
        }

        fn on_release(&mut self, _object: &ObjectRef) {
            self.counters.released.set(self.counters.released.get() + 1);
        }
    }

    fn projectile() -> Archetype {
        Archetype::from("Projectile")
    }

    fn rocket() -> Archetype {
        Archetype::from("Rocket")
    }

    fn archetypes() -> Archetypes {
        let mut archetypes = Archetypes::new();
        archetypes.declare(projectile(), Archetype::OBJECT);
        archetypes.declare(rocket(), projectile());
        archetypes
    }

    fn setup(objects_per_tick: i32) -> (PoolRegistry, Rc<Counters>) {
        let settings = PoolSettings::default().with_objects_per_tick(objects_per_tick);
        let mut registry = PoolRegistry::with_settings(settings, archetypes());
        let counters = Rc::new(Counters::default());
        registry
            .add_factory(
                projectile(),
                Box::new(CountingFactory {
                    counters: counters.clone(),
                }),
            )
            .unwrap();
        (registry, counters)
    }

    fn acquire(registry: &mut PoolRegistry, priority: SpawnPriority) -> Handle {
        registry
            .acquire(&projectile(), priority, Transform::default(), |_, _| {})
            .unwrap()
    }

    fn object_of(registry: &PoolRegistry, handle: &Handle) -> ObjectRef {
        registry.find_by_handle(handle).unwrap().object.clone()
    }

    // ------------------------------------------------------------------------
    // Acquire and the spawn pipeline
    // ------------------------------------------------------------------------

    #[test]
    fn test_handles_are_unique() {
        let (mut registry, _) = setup(5);
        let handles: FxHashSet<Handle> = (0..64)
            .map(|_| acquire(&mut registry, SpawnPriority::Normal))
            .collect();

        assert_eq!(handles.len(), 64);
        assert_eq!(registry.pending_count(), 64);
    }

    #[test]
    fn test_queued_construction_completes_on_next_tick() {
        let (mut registry, counters) = setup(5);
        let ready = Rc::new(Cell::new(false));
        let flag = ready.clone();

        let handle = registry
            .acquire(&projectile(), SpawnPriority::Normal, Transform::default(), move |_, _| {
                flag.set(true)
            })
            .unwrap();

        assert!(registry.is_pending(&handle));
        assert!(!registry.is_registered(&handle));
        assert!(!ready.get());

        assert_eq!(registry.tick().unwrap(), 1);
        assert!(ready.get());
        assert!(registry.is_registered(&handle));
        assert_eq!(counters.spawned.get(), 1);
        assert_eq!(counters.finalized.get(), 1);

        let object = object_of(&registry, &handle);
        assert!(registry.is_active(&object));
        let projectile = object.downcast_ref::<Projectile>().unwrap();
        assert_eq!(projectile.taken, vec![true]);
        assert_eq!(projectile.states, vec![ObjectState::Active]);
    }

    #[test]
    fn test_no_double_hand_out() {
        let (mut registry, counters) = setup(5);
        let object = ObjectRef::new(Projectile {
            archetype: projectile(),
            ..Default::default()
        });
        assert!(registry.register(ObjectRecord::new(object.clone())).unwrap());

        let first = acquire(&mut registry, SpawnPriority::Normal);
        let second = acquire(&mut registry, SpawnPriority::Normal);

        assert_eq!(registry.find_handle(&object), Some(first.clone()));
        assert!(registry.is_active(&object));
        assert!(registry.is_pending(&second));
        assert_ne!(first, second);
        assert_eq!(counters.acquired.get(), 1);
    }

    #[test]
    fn test_priority_order() {
        let (mut registry, _) = setup(4);
        let order = Rc::new(RefCell::new(Vec::new()));

        let mut submit = |priority| {
            let order = order.clone();
            registry
                .acquire(&projectile(), priority, Transform::default(), move |_, record| {
                    order.borrow_mut().push(record.handle.clone())
                })
                .unwrap()
        };
        let a = submit(SpawnPriority::Normal);
        let b = submit(SpawnPriority::High);
        let c = submit(SpawnPriority::Medium);
        let d = submit(SpawnPriority::High);

        assert_eq!(registry.tick().unwrap(), 4);
        assert_eq!(*order.borrow(), vec![b, d, c, a]);
    }

    #[test]
    fn test_critical_bypasses_queue() {
        let (mut registry, counters) = setup(5);
        acquire(&mut registry, SpawnPriority::Normal);

        let ready = Rc::new(Cell::new(false));
        let flag = ready.clone();
        let handle = registry
            .acquire(&projectile(), SpawnPriority::Critical, Transform::default(), move |_, _| {
                flag.set(true)
            })
            .unwrap();

        assert!(ready.get());
        assert!(registry.is_registered(&handle));
        assert_eq!(counters.spawned.get(), 1);
        assert_eq!(registry.pending_count(), 1);
    }

    #[test]
    fn test_staggered_construction() {
        let (mut registry, counters) = setup(2);
        for _ in 0..5 {
            acquire(&mut registry, SpawnPriority::Normal);
        }

        let per_tick: Vec<usize> = (0..4).map(|_| registry.tick().unwrap()).collect();

        assert_eq!(per_tick, vec![2, 2, 1, 0]);
        assert_eq!(counters.spawned.get(), 5);
        assert_eq!(registry.stats().peak_tick_spawned(), 2);
        assert_eq!(registry.current_tick(), 4);
    }

    #[test]
    fn test_objects_per_tick_is_clamped() {
        let (mut registry, _) = setup(0);
        acquire(&mut registry, SpawnPriority::Normal);
        acquire(&mut registry, SpawnPriority::Normal);

        assert_eq!(registry.tick().unwrap(), 1);
        assert_eq!(registry.tick().unwrap(), 1);
    }

    #[test]
    fn test_request_from_callback_waits_for_next_tick() {
        let (mut registry, _) = setup(5);
        registry
            .acquire(&projectile(), SpawnPriority::Normal, Transform::default(), |registry, _| {
                registry
                    .acquire(&projectile(), SpawnPriority::Normal, Transform::default(), |_, _| {})
                    .unwrap();
            })
            .unwrap();

        assert_eq!(registry.tick().unwrap(), 1);
        assert_eq!(registry.pending_count(), 1);
        assert_eq!(registry.tick().unwrap(), 1);
        assert_eq!(registry.registered_count(&projectile()), 2);
    }

    #[test]
    fn test_factory_resolved_through_ancestors() {
        let (mut registry, counters) = setup(5);
        let handle = registry
            .acquire(&rocket(), SpawnPriority::Critical, Transform::default(), |_, _| {})
            .unwrap();

        assert_eq!(counters.spawned.get(), 1);
        assert!(registry.contains_archetype(&rocket()));
        assert!(!registry.contains_archetype(&projectile()));
        assert_eq!(registry.pool(&rocket()).unwrap().factory(), &projectile());
        assert_eq!(handle.archetype(), &rocket());
        assert_eq!(registry.factory_for(&rocket()).map(|f| f.name()), Some("counting"));
    }

    #[test]
    fn test_invalid_archetypes() {
        let (mut registry, _) = setup(5);

        let err = registry
            .acquire(&Archetype::NONE, SpawnPriority::Normal, Transform::default(), |_, _| {})
            .unwrap_err();
        assert_eq!(err, PoolError::InvalidArchetype);

        let err = registry
            .acquire(&"Ghost".into(), SpawnPriority::Normal, Transform::default(), |_, _| {})
            .unwrap_err();
        assert_eq!(err, PoolError::UnknownArchetype("Ghost".into()));
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(registry.pending_count(), 0);
    }

    // ------------------------------------------------------------------------
    // Batches
    // ------------------------------------------------------------------------

    #[test]
    fn test_acquire_many_reports_all_records() {
        let (mut registry, _) = setup(5);
        let existing = acquire(&mut registry, SpawnPriority::Critical);
        registry.release_handle(&existing).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let handles = registry
            .acquire_many(&projectile(), SpawnPriority::Normal, 3, move |_, records| {
                sink.borrow_mut()
                    .extend(records.iter().map(|record| record.handle.clone()));
            })
            .unwrap();

        assert_eq!(handles.len(), 3);
        assert_eq!(handles[0], existing);
        assert!(seen.borrow().is_empty());

        registry.tick().unwrap();
        assert_eq!(*seen.borrow(), handles);
    }

    #[test]
    fn test_acquire_many_from_free_objects_is_synchronous() {
        let (mut registry, _) = setup(5);
        let a = acquire(&mut registry, SpawnPriority::Critical);
        let b = acquire(&mut registry, SpawnPriority::Critical);
        assert!(registry.release_handles(&[a, b]));

        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        registry
            .acquire_many(&projectile(), SpawnPriority::Normal, 2, move |_, records| {
                sink.set(records.len())
            })
            .unwrap();

        assert_eq!(count.get(), 2);
        assert_eq!(registry.pending_count(), 0);
        assert_eq!(registry.stats().reused_total(), 2);
    }

    #[test]
    fn test_acquire_many_zero_is_noop() {
        let (mut registry, _) = setup(5);
        let handles = registry
            .acquire_many(&projectile(), SpawnPriority::Normal, 0, |_, _| {
                panic!("nothing was requested")
            })
            .unwrap();

        assert!(handles.is_empty());
        assert!(!registry.contains_archetype(&projectile()));
    }

    #[test]
    fn test_acquire_batch_mixed_archetypes() {
        let (mut registry, _) = setup(5);
        let requests = vec![
            SpawnRequest::new(rocket()).with_priority(SpawnPriority::High),
            SpawnRequest::new(projectile()),
        ];

        let done = Rc::new(Cell::new(0));
        let sink = done.clone();
        let handles = registry
            .acquire_batch(requests, move |_, records| sink.set(records.len()))
            .unwrap();

        registry.tick().unwrap();
        assert_eq!(done.get(), 2);
        assert!(handles.iter().all(|handle| registry.is_registered(handle)));
    }

    #[test]
    fn test_failed_batch_rolls_back_issued_objects() {
        let (mut registry, counters) = setup(5);
        let trip = counters.clone();
        let requests = vec![
            SpawnRequest::new(projectile()),
            SpawnRequest::new(projectile())
                .with_priority(SpawnPriority::Critical)
                .with_on_post_spawned(move |_, _| trip.fail.set(true)),
            SpawnRequest::new(projectile()).with_priority(SpawnPriority::Critical),
        ];

        let err = registry
            .acquire_batch(requests, |_, _| panic!("the batch failed"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Construction);
        assert_eq!(registry.pending_count(), 0);
        assert_eq!(registry.stats().cancelled_total(), 1);
        assert_eq!(registry.registered_count(&projectile()), 1);
        assert_eq!(registry.free_count(&projectile()), 1);
        assert_eq!(counters.released.get(), 1);
    }

    #[test]
    fn test_take_free_batch_only_takes_free_objects() {
        let (mut registry, counters) = setup(5);
        let free = acquire(&mut registry, SpawnPriority::Critical);
        registry.release_handle(&free).unwrap();

        let mut requests = SpawnRequest::make_requests(&projectile(), 2, SpawnPriority::Normal);
        let unserved = requests[1].handle.clone();
        let taken = registry.take_free_batch(&mut requests).unwrap();

        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].handle, free);
        assert_eq!(requests[0].handle, free);
        assert_eq!(requests[1].handle, unserved);
        assert_eq!(registry.pending_count(), 0);
        assert_eq!(counters.spawned.get(), 1);
        assert_eq!(counters.acquired.get(), 1);
    }

    // ------------------------------------------------------------------------
    // Release and cancellation
    // ------------------------------------------------------------------------

    #[test]
    fn test_round_trip_returns_same_instance() {
        let (mut registry, counters) = setup(5);
        let first = acquire(&mut registry, SpawnPriority::Critical);
        let object = object_of(&registry, &first);

        registry.release(&object).unwrap();
        assert!(registry.is_free(&object));
        assert_eq!(registry.state(&object), ObjectState::Inactive);

        let second = acquire(&mut registry, SpawnPriority::Normal);

        assert_eq!(first, second);
        assert!(registry.is_active(&object));
        assert_eq!(counters.spawned.get(), 1);
        assert_eq!(counters.released.get(), 1);
        assert_eq!(counters.acquired.get(), 1);

        let projectile = object.downcast_ref::<Projectile>().unwrap();
        assert_eq!(projectile.taken, vec![true, false]);
        assert_eq!(projectile.returned, 1);
        assert_eq!(
            projectile.states,
            vec![ObjectState::Active, ObjectState::Inactive, ObjectState::Active]
        );
    }

    #[test]
    fn test_cancel_pending_request() {
        let (mut registry, counters) = setup(5);
        let ready = Rc::new(Cell::new(false));
        let flag = ready.clone();
        let handle = registry
            .acquire(&projectile(), SpawnPriority::Normal, Transform::default(), move |_, _| {
                flag.set(true)
            })
            .unwrap();

        registry.release_handle(&handle).unwrap();

        assert_eq!(registry.pending_count(), 0);
        assert_eq!(registry.tick().unwrap(), 0);
        assert!(!ready.get());
        assert_eq!(counters.spawned.get(), 0);
        assert_eq!(registry.stats().cancelled_total(), 1);
        assert_eq!(
            registry.release_handle(&handle),
            Err(PoolError::UnknownHandle(handle))
        );
    }

    #[test]
    fn test_cancel_from_callback_within_batch() {
        let (mut registry, counters) = setup(5);
        let victim = Rc::new(RefCell::new(Handle::EMPTY));
        let target = victim.clone();

        registry
            .acquire(&projectile(), SpawnPriority::High, Transform::default(), move |registry, _| {
                let handle = target.borrow().clone();
                registry.release_handle(&handle).unwrap();
            })
            .unwrap();
        *victim.borrow_mut() = acquire(&mut registry, SpawnPriority::Normal);

        assert_eq!(registry.tick().unwrap(), 1);
        assert_eq!(counters.spawned.get(), 1);
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn test_release_errors() {
        let (mut registry, _) = setup(5);
        let stray = ObjectRef::new(Projectile {
            archetype: projectile(),
            ..Default::default()
        });
        assert_eq!(
            registry.release(&stray),
            Err(PoolError::UnknownObject(projectile()))
        );

        let handle = acquire(&mut registry, SpawnPriority::Critical);
        let object = object_of(&registry, &handle);
        registry.release(&object).unwrap();
        assert_eq!(registry.release(&object), Err(PoolError::NotActive(projectile())));

        assert_eq!(registry.release_handle(&Handle::EMPTY), Err(PoolError::InvalidHandle));
        assert!(!registry.release_many(&[object, stray]));
    }

    #[test]
    fn test_release_or_register_adopts_unknown_object() {
        let (mut registry, counters) = setup(5);
        let object = ObjectRef::new(Projectile {
            archetype: projectile(),
            ..Default::default()
        });

        registry.release_or_register(&object).unwrap();

        assert_eq!(registry.state(&object), ObjectState::Inactive);
        assert_eq!(registry.free_count(&projectile()), 1);
        assert_eq!(counters.released.get(), 0);

        acquire(&mut registry, SpawnPriority::Normal);
        registry.release_or_register(&object).unwrap();
        assert_eq!(counters.released.get(), 1);
    }

    // ------------------------------------------------------------------------
    // Registration and clearing
    // ------------------------------------------------------------------------

    #[test]
    fn test_register_is_idempotent() {
        let (mut registry, _) = setup(5);
        let object = ObjectRef::new(Projectile {
            archetype: projectile(),
            ..Default::default()
        });

        assert!(registry.register(ObjectRecord::new(object.clone())).unwrap());
        assert!(!registry.register(ObjectRecord::new(object.clone())).unwrap());
        assert_eq!(registry.registered_count(&projectile()), 1);

        let handle = registry.find_handle(&object).unwrap();
        assert!(handle.is_valid());

        let other = ObjectRef::new(Projectile {
            archetype: projectile(),
            ..Default::default()
        });
        let clash = ObjectRecord::new(other).with_handle(handle);
        assert!(!registry.register(clash).unwrap());
        assert_eq!(registry.registered_count(&projectile()), 1);
    }

    #[test]
    fn test_register_rejects_mismatched_handle() {
        let (mut registry, _) = setup(5);
        let object = ObjectRef::new(Projectile {
            archetype: projectile(),
            ..Default::default()
        });
        let record = ObjectRecord::new(object).with_handle(Handle::new(rocket()));

        assert_eq!(
            registry.register(record),
            Err(PoolError::ArchetypeMismatch {
                handle: rocket(),
                object: projectile(),
            })
        );
    }

    #[test]
    fn test_empty_pool_destroys_each_once() {
        let (mut registry, counters) = setup(5);
        let handles: Vec<Handle> = (0..3)
            .map(|_| acquire(&mut registry, SpawnPriority::Critical))
            .collect();
        registry.release_handle(&handles[0]).unwrap();

        assert_eq!(registry.empty_pool(&projectile()).unwrap(), 3);

        assert_eq!(counters.destroyed.get(), 3);
        assert_eq!(registry.registered_count(&projectile()), 0);
        assert_eq!(registry.free_count(&projectile()), 0);
        assert!(!registry.is_registered(&handles[1]));
        assert_eq!(registry.empty_pool(&projectile()).unwrap(), 0);
        assert_eq!(registry.stats().destroyed_total(), 3);
    }

    #[test]
    fn test_empty_by_predicate_and_all() {
        let (mut registry, counters) = setup(5);
        let handles: Vec<Handle> = (0..3)
            .map(|_| acquire(&mut registry, SpawnPriority::Critical))
            .collect();
        registry
            .acquire(&rocket(), SpawnPriority::Critical, Transform::default(), |_, _| {})
            .unwrap();
        registry.release_handle(&handles[2]).unwrap();

        assert_eq!(registry.empty_by_predicate(ObjectRecord::is_free).unwrap(), 1);
        assert_eq!(registry.registered_count(&projectile()), 2);
        assert!(registry.is_registered(&handles[0]));

        assert_eq!(registry.empty_all().unwrap(), 3);
        assert_eq!(counters.destroyed.get(), 4);
        assert!(!registry.contains_archetype(&rocket()));
    }

    // ------------------------------------------------------------------------
    // Factories and failures
    // ------------------------------------------------------------------------

    #[test]
    fn test_construction_failure_requeues_batch() {
        let (mut registry, counters) = setup(5);
        for _ in 0..3 {
            acquire(&mut registry, SpawnPriority::Normal);
        }

        counters.fail.set(true);
        let err = registry.tick().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert_eq!(registry.pending_count(), 2);

        counters.fail.set(false);
        assert_eq!(registry.tick().unwrap(), 2);
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn test_failed_batch_keeps_priority_order() {
        let (mut registry, counters) = setup(5);
        let order = Rc::new(RefCell::new(Vec::new()));
        let tagged = |tag: &'static str| {
            let order = order.clone();
            move |_: &mut PoolRegistry, _: &ObjectRecord| order.borrow_mut().push(tag)
        };

        let follow_up = tagged("H1");
        let trip = counters.clone();
        registry
            .acquire(&projectile(), SpawnPriority::Normal, Transform::default(), move |registry, _| {
                registry
                    .acquire(&projectile(), SpawnPriority::High, Transform::default(), follow_up)
                    .unwrap();
                trip.fail.set(true);
            })
            .unwrap();
        registry
            .acquire(&projectile(), SpawnPriority::Normal, Transform::default(), tagged("N2"))
            .unwrap();
        registry
            .acquire(&projectile(), SpawnPriority::Normal, Transform::default(), tagged("N3"))
            .unwrap();

        assert!(registry.tick().is_err());
        counters.fail.set(false);
        registry
            .acquire(&projectile(), SpawnPriority::High, Transform::default(), tagged("H2"))
            .unwrap();

        assert_eq!(registry.tick().unwrap(), 3);
        assert_eq!(*order.borrow(), vec!["H1", "H2", "N3"]);
    }

    #[test]
    fn test_replacing_factory_keeps_pending_requests() {
        let (mut registry, previous) = setup(5);
        let ready = Rc::new(Cell::new(false));
        let flag = ready.clone();
        let handle = registry
            .acquire(&projectile(), SpawnPriority::Normal, Transform::default(), move |_, _| {
                flag.set(true)
            })
            .unwrap();

        let counters = Rc::new(Counters::default());
        registry
            .add_factory(
                projectile(),
                Box::new(CountingFactory {
                    counters: counters.clone(),
                }),
            )
            .unwrap();
        assert!(registry.is_pending(&handle));

        assert_eq!(registry.tick().unwrap(), 1);
        assert!(ready.get());
        assert!(registry.is_registered(&handle));
        assert_eq!(counters.spawned.get(), 1);
        assert_eq!(previous.spawned.get(), 0);
        assert_eq!(registry.stats().cancelled_total(), 0);
        assert_eq!(registry.release_handle(&handle), Ok(()));
    }

    #[test]
    fn test_drop_destroys_pooled_objects() {
        let (mut registry, counters) = setup(5);
        acquire(&mut registry, SpawnPriority::Critical);
        let free = acquire(&mut registry, SpawnPriority::Critical);
        acquire(&mut registry, SpawnPriority::Normal);
        registry.release_handle(&free).unwrap();

        drop(registry);

        assert_eq!(counters.spawned.get(), 2);
        assert_eq!(counters.destroyed.get(), 2);
    }

    #[test]
    fn test_remove_factory_falls_back_to_ancestor() {
        let (mut registry, _) = setup(5);
        acquire(&mut registry, SpawnPriority::Normal);

        let removed = registry.remove_factory(&projectile()).unwrap();
        assert_eq!(removed.name(), "counting");
        assert_eq!(registry.pending_count(), 0);
        assert!(!registry.has_factory(&projectile()));
        assert_eq!(registry.factory_for(&projectile()).map(|f| f.name()), Some("object"));

        // The generic factory has no constructor for it
        let err = registry
            .acquire(&projectile(), SpawnPriority::Critical, Transform::default(), |_, _| {})
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_factory_is_invariant_violation() {
        let (mut registry, _) = setup(5);
        registry.remove_factory(&projectile());
        registry.remove_factory(&Archetype::OBJECT);

        let err = registry
            .acquire(&projectile(), SpawnPriority::Normal, Transform::default(), |_, _| {})
            .unwrap_err();
        assert_eq!(err, PoolError::MissingFactory(projectile()));
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn test_from_settings_binds_catalog_factories() {
        let counters = Rc::new(Counters::default());
        let shared = counters.clone();
        let mut catalog = FactoryCatalog::new();
        catalog.register("counting", move || {
            Box::new(CountingFactory {
                counters: shared.clone(),
            })
        });

        let settings = PoolSettings::default()
            .with_objects_per_tick(3)
            .with_factory(projectile(), "counting")
            .with_factory(rocket(), "missing")
            .with_factory("Ghost".into(), "object");
        let mut registry = PoolRegistry::from_settings(settings, archetypes(), &catalog);

        assert!(registry.has_factory(&projectile()));
        assert!(!registry.has_factory(&rocket()));
        assert!(!registry.has_factory(&"Ghost".into()));

        for _ in 0..4 {
            acquire(&mut registry, SpawnPriority::Normal);
        }
        assert_eq!(registry.tick().unwrap(), 3);
        assert_eq!(counters.spawned.get(), 3);
    }

    #[test]
    fn test_actor_factory_through_registry() {
        let world = Rc::new(RefCell::new(World::new()));
        let mut archetypes = Archetypes::new();
        archetypes.declare("Bullet".into(), Archetype::ACTOR);
        let mut registry = PoolRegistry::new(archetypes);
        registry
            .add_factory(Archetype::ACTOR, Box::new(ActorFactory::new(world.clone())))
            .unwrap();

        let placement = Transform::from_position(Vec3::new(4.0, 0.0, -2.0));
        let handle = registry
            .acquire(&"Bullet".into(), SpawnPriority::Normal, placement, |_, _| {})
            .unwrap();
        registry.tick().unwrap();

        let object = object_of(&registry, &handle);
        let entity = object.downcast_ref::<Actor>().unwrap().entity();
        assert!(world.borrow().get::<ActorState>(entity).unwrap().is_live());
        assert_eq!(
            world.borrow().get::<Transform>(entity).unwrap().position,
            placement.position
        );

        registry.release(&object).unwrap();
        assert!(!world.borrow().get::<ActorState>(entity).unwrap().is_live());

        for _ in 0..2 {
            registry
                .acquire(&"Bullet".into(), SpawnPriority::Critical, placement, |_, _| {})
                .unwrap();
        }
        assert_eq!(world.borrow().len(), 2);

        drop(registry);
        assert!(world.borrow().is_empty());
    }
}

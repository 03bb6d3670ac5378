//! Per-archetype pool storage
//!
//! A container holds every record of exactly one archetype. Records keep their
//! insertion order, which is also the order free objects are handed out in.

use crate::core::Archetype;
use crate::pool::{Handle, ObjectRecord, ObjectRef};

/// All pooled objects of one archetype.
#[derive(Debug, Clone)]
pub struct PoolContainer {
    /// Archetype shared by every record
    archetype: Archetype,
    /// Key of the factory binding that serves this archetype
    factory: Archetype,
    /// Records in insertion order
    records: Vec<ObjectRecord>,
}

impl PoolContainer {
    /// Create an empty container served by the factory bound at `factory`.
    #[must_use]
    pub fn new(archetype: Archetype, factory: Archetype) -> Self {
        Self {
            archetype,
            factory,
            records: Vec::new(),
        }
    }

    /// Archetype of this pool
    #[must_use]
    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    /// Key of the factory binding serving this pool
    #[must_use]
    pub fn factory(&self) -> &Archetype {
        &self.factory
    }

    pub(crate) fn set_factory(&mut self, factory: Archetype) {
        self.factory = factory;
    }

    /// Find the record of an object
    #[must_use]
    pub fn find_by_object(&self, object: &ObjectRef) -> Option<&ObjectRecord> {
        self.records.iter().find(|record| &record.object == object)
    }

    pub(crate) fn find_by_object_mut(&mut self, object: &ObjectRef) -> Option<&mut ObjectRecord> {
        self.records.iter_mut().find(|record| &record.object == object)
    }

    /// Find the record of a handle
    #[must_use]
    pub fn find_by_handle(&self, handle: &Handle) -> Option<&ObjectRecord> {
        self.records.iter().find(|record| &record.handle == handle)
    }

    /// First free record in insertion order
    pub(crate) fn first_free_mut(&mut self) -> Option<&mut ObjectRecord> {
        self.records.iter_mut().find(|record| record.is_free())
    }

    pub(crate) fn push(&mut self, record: ObjectRecord) {
        self.records.push(record);
    }

    /// Remove every record, leaving the container empty
    pub(crate) fn take_records(&mut self) -> Vec<ObjectRecord> {
        std::mem::take(&mut self.records)
    }

    /// Number of free records
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_free()).count()
    }

    /// Number of active records
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_active()).count()
    }

    /// Number of records
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.records.len()
    }

    /// Iterate over records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.records.iter()
    }
}

//! Pool bookkeeping entries

use crate::pool::{Handle, ObjectRef, ObjectState};

/// The pool's entry for one concrete object.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    /// The pooled object
    pub object: ObjectRef,
    /// Handle the object is known by
    pub handle: Handle,
    /// True while the object is taken from the pool
    pub active: bool,
}

impl ObjectRecord {
    /// Create an inactive record without a handle.
    ///
    /// Registration generates the handle when it is missing.
    #[must_use]
    pub fn new(object: ObjectRef) -> Self {
        Self {
            object,
            handle: Handle::EMPTY,
            active: false,
        }
    }

    /// Set the handle
    #[must_use]
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = handle;
        self
    }

    /// Set the active flag
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Returns true if the record has a valid handle
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Returns true if the object is valid and ready to be taken
    #[must_use]
    #[inline]
    pub fn is_free(&self) -> bool {
        !self.active && self.is_valid()
    }

    /// Returns true if the object is valid and taken
    #[must_use]
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active && self.is_valid()
    }

    /// State of the object according to this record
    #[must_use]
    pub fn state(&self) -> ObjectState {
        if !self.is_valid() {
            ObjectState::None
        } else if self.active {
            ObjectState::Active
        } else {
            ObjectState::Inactive
        }
    }
}

impl PartialEq for ObjectRecord {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

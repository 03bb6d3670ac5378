//! Pool object handles
//!
//! A handle references a pooled object indirectly. It is issued the moment an
//! object is requested, so it exists before the object does when construction is
//! deferred to a later tick.

use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

use crate::core::Archetype;

/// Unique reference to a pooled object that may not be constructed yet.
///
/// Handles compare and hash by their id only. Ids are random and never reused,
/// so a stale handle can not alias an object handed out later.
#[derive(Debug, Clone)]
pub struct Handle {
    /// Archetype of the referenced object
    archetype: Archetype,
    /// Random 128-bit identifier
    id: Uuid,
}

impl Handle {
    /// The empty handle. Never valid.
    pub const EMPTY: Self = Self {
        archetype: Archetype::NONE,
        id: Uuid::nil(),
    };

    /// Generate a new handle for the given archetype.
    ///
    /// Returns [`Handle::EMPTY`] if the archetype is not set.
    #[must_use]
    pub fn new(archetype: Archetype) -> Self {
        if !archetype.is_valid() {
            log::warn!("Archetype is not set, can't generate a new handle");
            return Self::EMPTY;
        }

        Self {
            archetype,
            id: Uuid::new_v4(),
        }
    }

    /// Get the archetype of the referenced object
    #[must_use]
    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    /// Get the unique id
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns true if the archetype is set and the id was generated
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.archetype.is_valid() && !self.id.is_nil()
    }

    /// Reset to the empty handle
    pub fn invalidate(&mut self) {
        *self = Self::EMPTY;
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.archetype, self.id)
    }
}

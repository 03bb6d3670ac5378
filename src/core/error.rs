//! Error types for pool operations

use thiserror::Error;

use crate::core::Archetype;
use crate::pool::Handle;

/// Result type alias for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// How severe a [`PoolError`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed something invalid; pool bookkeeping is untouched.
    Usage,
    /// Pool bookkeeping is inconsistent; the setup is broken.
    Invariant,
    /// A factory could not produce an object.
    Construction,
}

/// Errors returned by the pool registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// No archetype was given
    #[error("archetype is not set")]
    InvalidArchetype,

    /// The archetype is missing from the archetype table
    #[error("archetype '{0}' is not declared")]
    UnknownArchetype(Archetype),

    /// An empty handle was passed where a valid one is required
    #[error("handle is empty")]
    InvalidHandle,

    /// The handle is neither pooled nor waiting in a spawn queue
    #[error("handle {0} is neither pooled nor queued")]
    UnknownHandle(Handle),

    /// The object is not registered in its archetype's pool
    #[error("object of archetype '{0}' is not registered in any pool")]
    UnknownObject(Archetype),

    /// Release of an object that is already free
    #[error("object of archetype '{0}' is not active")]
    NotActive(Archetype),

    /// A record's handle names another archetype than its object
    #[error("handle archetype '{handle}' does not match object archetype '{object}'")]
    ArchetypeMismatch {
        /// Archetype stored in the handle
        handle: Archetype,
        /// Archetype reported by the object
        object: Archetype,
    },

    /// Neither the archetype nor any of its ancestors has a factory
    #[error("no factory is bound to '{0}' or any of its ancestors")]
    MissingFactory(Archetype),

    /// A record that has to exist is gone
    #[error("pool record for '{0}' is missing")]
    MissingRecord(Archetype),

    /// A factory failed to produce an object
    #[error("factory '{factory}' failed to construct '{archetype}': {reason}")]
    ConstructionFailed {
        /// Name of the factory
        factory: &'static str,
        /// Requested archetype
        archetype: Archetype,
        /// What went wrong
        reason: String,
    },
}

impl PoolError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingFactory(_) | Self::MissingRecord(_) => ErrorKind::Invariant,
            Self::ConstructionFailed { .. } => ErrorKind::Construction,
            _ => ErrorKind::Usage,
        }
    }

    /// Returns true if continuing would corrupt pool bookkeeping.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Usage)
    }

    /// Log the error at the level matching its kind and hand it back.
    pub(crate) fn logged(self) -> Self {
        match self.kind() {
            ErrorKind::Usage => log::warn!("{self}"),
            ErrorKind::Invariant | ErrorKind::Construction => log::error!("{self}"),
        }
        self
    }
}

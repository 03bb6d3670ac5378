//! Core module
//!
//! Archetypes, settings, errors and statistics shared by the pool and its factories

mod archetype;
mod error;
mod settings;
mod stats;

pub use archetype::{Archetype, Archetypes, Constructor};
pub use error::{ErrorKind, PoolError, Result};
pub use settings::{FactoryBinding, PoolSettings, SettingsError};
pub use stats::PoolStats;

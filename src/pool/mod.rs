//! Object pooling
//!
//! Handles, records, per-archetype containers, spawn requests and the
//! [`PoolRegistry`] façade tying them together.

mod container;
mod handle;
mod object;
mod queue;
mod record;
mod registry;
mod request;

pub use container::PoolContainer;
pub use handle::Handle;
pub use object::{AsAny, ObjectRef, ObjectState, PoolObject, PoolObjectCallback};
pub use queue::SpawnQueue;
pub use record::ObjectRecord;
pub use registry::PoolRegistry;
pub use request::{SpawnAllCallback, SpawnCallback, SpawnCallbacks, SpawnPriority, SpawnRequest};

//! Pooled objects
//!
//! Anything implementing [`PoolObject`] can be pooled. The registry keeps objects
//! behind [`ObjectRef`], a shared single-threaded reference that compares by
//! identity, so the same instance can be found again on release.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::core::Archetype;
use crate::ecs::Transform;

// ============================================================================
// Object State
// ============================================================================

/// State of an object as seen by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectState {
    /// Not handled by any pool
    #[default]
    None,
    /// In a pool, free and ready to be taken
    Inactive,
    /// Taken from its pool, can be released back
    Active,
}

// ============================================================================
// Pool Object Traits
// ============================================================================

/// Upcast to [`Any`] for downcasting trait objects.
pub trait AsAny: Any {
    /// Get `self` as `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// Get `self` as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An object that can live in a pool.
pub trait PoolObject: AsAny {
    /// The exact archetype of this object. Must never change.
    fn archetype(&self) -> &Archetype;

    /// Expose the optional pool feedback capability.
    ///
    /// Checked once when the object is wrapped into an [`ObjectRef`].
    fn callbacks(&mut self) -> Option<&mut dyn PoolObjectCallback> {
        None
    }

    /// Called by the generic factory right before the object is dropped.
    fn begin_destroy(&mut self) {}
}

/// Optional feedback capability of pooled objects.
///
/// Implement it and return `Some(self)` from [`PoolObject::callbacks`] to be told
/// about pool transitions.
pub trait PoolObjectCallback {
    /// The object was taken from the pool; `is_new_spawned` is true right after construction.
    fn on_take_from_pool(&mut self, _is_new_spawned: bool, _placement: &Transform) {}

    /// The object was returned to the pool.
    fn on_return_to_pool(&mut self) {}

    /// The object was activated or deactivated.
    fn on_changed_state_in_pool(&mut self, _state: ObjectState) {}
}

// ============================================================================
// Object Reference
// ============================================================================

/// Shared reference to a pooled object.
///
/// Equality and hashing use the address of the object, not its contents.
#[derive(Clone)]
pub struct ObjectRef {
    inner: Rc<RefCell<dyn PoolObject>>,
    archetype: Archetype,
    has_callbacks: bool,
}

impl ObjectRef {
    /// Wrap an object.
    pub fn new<T: PoolObject>(mut object: T) -> Self {
        let has_callbacks = object.callbacks().is_some();
        let archetype = object.archetype().clone();
        Self {
            inner: Rc::new(RefCell::new(object)),
            archetype,
            has_callbacks,
        }
    }

    /// Archetype reported by the object when it was wrapped
    #[must_use]
    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    /// Returns true if the object implements [`PoolObjectCallback`]
    #[must_use]
    pub const fn has_callbacks(&self) -> bool {
        self.has_callbacks
    }

    /// Borrow the object
    ///
    /// # Panics
    ///
    /// Panics if the object is currently borrowed mutably
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, dyn PoolObject> {
        self.inner.borrow()
    }

    /// Borrow the object mutably
    ///
    /// # Panics
    ///
    /// Panics if the object is currently borrowed
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, dyn PoolObject> {
        self.inner.borrow_mut()
    }

    /// Borrow the object mutably, or `None` if it is borrowed already
    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, dyn PoolObject>> {
        let object = self.inner.try_borrow_mut().ok();
        if object.is_none() {
            log::warn!("Object of '{}' is borrowed, left untouched", self.archetype);
        }
        object
    }

    /// Borrow the object as its concrete type.
    ///
    /// `None` if it has another type or is borrowed mutably.
    #[must_use]
    pub fn downcast_ref<T: PoolObject>(&self) -> Option<Ref<'_, T>> {
        let object = self.inner.try_borrow().ok()?;
        Ref::filter_map(object, |object| object.as_any().downcast_ref::<T>()).ok()
    }

    /// Borrow the object mutably as its concrete type.
    ///
    /// `None` if it has another type or is borrowed.
    #[must_use]
    pub fn downcast_mut<T: PoolObject>(&self) -> Option<RefMut<'_, T>> {
        let object = self.try_borrow_mut()?;
        RefMut::filter_map(object, |object| object.as_any_mut().downcast_mut::<T>()).ok()
    }

    /// Check the concrete type of the object
    #[must_use]
    pub fn is<T: PoolObject>(&self) -> bool {
        let object = self.inner.borrow();
        (*object).as_any().is::<T>()
    }

    /// Returns true if both references point to the same object
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.inner), Rc::as_ptr(&other.inner))
    }

    /// Number of live references to the object
    #[must_use]
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    fn with_callbacks(&self, notify: impl FnOnce(&mut dyn PoolObjectCallback)) {
        if !self.has_callbacks {
            return;
        }

        let mut object = self.try_borrow_mut();
        if let Some(callbacks) = object.as_deref_mut().and_then(|object| object.callbacks()) {
            notify(callbacks);
        }
    }

    pub(crate) fn notify_taken(&self, is_new_spawned: bool, placement: &Transform) {
        self.with_callbacks(|callbacks| callbacks.on_take_from_pool(is_new_spawned, placement));
    }

    pub(crate) fn notify_returned(&self) {
        self.with_callbacks(|callbacks| callbacks.on_return_to_pool());
    }

    pub(crate) fn notify_state_changed(&self, state: ObjectState) {
        self.with_callbacks(|callbacks| callbacks.on_changed_state_in_pool(state));
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.inner).cast::<()>().hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("archetype", &self.archetype)
            .field("ptr", &Rc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

//! Widget factory
//!
//! Pooled widgets are [`Panel`] trees attached to a shared [`Viewport`]. A free
//! panel stays attached but collapsed.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::{Archetype, Archetypes, PoolError, Result};
use crate::ecs::Transform;
use crate::factory::PoolFactory;
use crate::pool::{ObjectRef, ObjectState, SpawnRequest};
use crate::ui::{Panel, Viewport, Visibility};

/// Builds the panel tree of an archetype.
pub type Layout = Box<dyn Fn(&Archetype) -> Panel>;

/// Factory of [`Panel`] trees.
pub struct WidgetFactory {
    viewport: Rc<RefCell<Viewport>>,
    layouts: FxHashMap<Archetype, Layout>,
}

impl WidgetFactory {
    /// Create a factory attaching panels to `viewport`
    #[must_use]
    pub fn new(viewport: Rc<RefCell<Viewport>>) -> Self {
        Self {
            viewport,
            layouts: FxHashMap::default(),
        }
    }

    /// Register the layout of an archetype; descendants without their own inherit it.
    #[must_use]
    pub fn with_layout(
        mut self,
        archetype: Archetype,
        layout: impl Fn(&Archetype) -> Panel + 'static,
    ) -> Self {
        self.layouts.insert(archetype, Box::new(layout));
        self
    }

    /// The viewport panels are attached to
    #[must_use]
    pub fn viewport(&self) -> &Rc<RefCell<Viewport>> {
        &self.viewport
    }
}

impl PoolFactory for WidgetFactory {
    fn name(&self) -> &'static str {
        "widget"
    }

    fn spawn_now(&mut self, request: &SpawnRequest, archetypes: &Archetypes) -> Result<ObjectRef> {
        let archetype = request.archetype();
        if !archetypes.is_a(archetype, &Archetype::WIDGET) {
            return Err(PoolError::ConstructionFailed {
                factory: self.name(),
                archetype: archetype.clone(),
                reason: "archetype is not a widget".into(),
            });
        }

        let mut panel = archetypes
            .ancestors(archetype)
            .iter()
            .find_map(|ancestor| self.layouts.get(ancestor))
            .map_or_else(|| Panel::new(archetype.clone()), |layout| layout(archetype));

        panel.visibility = Visibility::Collapsed;
        panel.rect.move_to(request.placement.position.truncate());
        self.viewport.borrow_mut().attach(panel.id());

        Ok(ObjectRef::new(panel))
    }

    fn destroy(&mut self, object: &ObjectRef) {
        match object.downcast_mut::<Panel>() {
            Some(mut panel) => panel.destroy(&mut self.viewport.borrow_mut()),
            None => log::warn!("Object of '{}' was not torn down", object.archetype()),
        }
    }

    fn on_acquire(&mut self, object: &ObjectRef, placement: &Transform) {
        if let Some(mut panel) = object.downcast_mut::<Panel>() {
            panel.rect.move_to(placement.position.truncate());
        }
    }

    fn on_state_changed(&mut self, state: ObjectState, object: &ObjectRef) {
        if let Some(mut panel) = object.downcast_mut::<Panel>() {
            panel.visibility = match state {
                ObjectState::Active => Visibility::Visible,
                ObjectState::Inactive | ObjectState::None => Visibility::Collapsed,
            };
        }
    }
}

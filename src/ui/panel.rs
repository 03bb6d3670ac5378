//! Panels and the viewport they are shown in

use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashSet;

use crate::core::Archetype;
use crate::pool::PoolObject;
use crate::ui::Rect;

static NEXT_PANEL_ID: AtomicU64 = AtomicU64::new(1);

/// Unique id of a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(u64);

impl PanelId {
    fn next() -> Self {
        Self(NEXT_PANEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Visibility of a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Laid out and drawn
    #[default]
    Visible,
    /// Takes no space and is not drawn
    Collapsed,
}

/// A UI panel with nested child panels.
#[derive(Debug)]
pub struct Panel {
    id: PanelId,
    archetype: Archetype,
    /// Placement inside the parent
    pub rect: Rect,
    /// Current visibility
    pub visibility: Visibility,
    /// Nested panels, owned by this one
    pub children: Vec<Panel>,
    destroyed: bool,
}

impl Panel {
    /// Create an empty, visible panel
    #[must_use]
    pub fn new(archetype: Archetype) -> Self {
        Self {
            id: PanelId::next(),
            archetype,
            rect: Rect::default(),
            visibility: Visibility::Visible,
            children: Vec::new(),
            destroyed: false,
        }
    }

    /// Set the rectangle
    #[must_use]
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Add a nested panel
    #[must_use]
    pub fn with_child(mut self, child: Panel) -> Self {
        self.children.push(child);
        self
    }

    /// Get the panel id
    #[must_use]
    pub const fn id(&self) -> PanelId {
        self.id
    }

    /// Returns true if the panel is drawn
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    /// Returns true once the panel was torn down
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of panels in this tree, including itself
    #[must_use]
    pub fn tree_len(&self) -> usize {
        1 + self.children.iter().map(Panel::tree_len).sum::<usize>()
    }

    /// Tear the panel tree down, innermost panels first.
    ///
    /// Every torn down panel is collapsed and detached from the viewport.
    pub fn destroy(&mut self, viewport: &mut Viewport) {
        for child in &mut self.children {
            if !child.children.is_empty() {
                child.destroy(viewport);
            } else {
                child.teardown(viewport);
            }
        }
        self.teardown(viewport);
    }

    fn teardown(&mut self, viewport: &mut Viewport) {
        self.visibility = Visibility::Collapsed;
        viewport.detach(self.id);
        self.destroyed = true;
    }
}

impl PoolObject for Panel {
    fn archetype(&self) -> &Archetype {
        &self.archetype
    }
}

/// The screen area panels are attached to.
#[derive(Debug, Default)]
pub struct Viewport {
    attached: FxHashSet<PanelId>,
}

impl Viewport {
    /// Create an empty viewport
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a panel; returns false if it was attached already
    pub fn attach(&mut self, id: PanelId) -> bool {
        self.attached.insert(id)
    }

    /// Detach a panel; returns false if it was not attached
    pub fn detach(&mut self, id: PanelId) -> bool {
        self.attached.remove(&id)
    }

    /// Check if a panel is attached
    #[must_use]
    pub fn contains(&self, id: PanelId) -> bool {
        self.attached.contains(&id)
    }

    /// Number of attached panels
    #[must_use]
    pub fn len(&self) -> usize {
        self.attached.len()
    }

    /// Returns true if no panel is attached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

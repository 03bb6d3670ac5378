//! UI module
//!
//! Panel trees served by the widget factory

mod panel;
mod rect;

pub use panel::{Panel, PanelId, Visibility, Viewport};
pub use rect::{Anchor, Rect};

//! Rectangle and layout primitives
//!
//! Positioning and sizing of pooled panels inside the viewport.

use glam::Vec2;

/// Anchor point for positioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Top-left corner
    #[default]
    TopLeft,
    /// Top-center
    TopCenter,
    /// Center
    Center,
    /// Bottom-center
    BottomCenter,
    /// Bottom-right corner
    BottomRight,
}

/// A 2D rectangle for panel layout
#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    /// Position (in pixels from anchor)
    pub position: Vec2,
    /// Size (width, height)
    pub size: Vec2,
    /// Anchor point
    pub anchor: Anchor,
}

impl Rect {
    /// Create a new rectangle
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
            anchor: Anchor::TopLeft,
        }
    }

    /// Set anchor
    #[must_use]
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Move the rectangle, keeping its size and anchor
    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 100.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_keeps_size_and_anchor() {
        let mut rect = Rect::new(0.0, 0.0, 100.0, 50.0).with_anchor(Anchor::Center);

        rect.move_to(Vec2::new(10.0, -4.0));

        assert_eq!(rect.position, Vec2::new(10.0, -4.0));
        assert_eq!(rect.size, Vec2::new(100.0, 50.0));
        assert_eq!(rect.anchor, Anchor::Center);
    }
}

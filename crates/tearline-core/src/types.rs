//! Spatial and common types

use serde::{Deserialize, Serialize};

/// Card tilt in degrees. `rot_x` pitches the top edge toward the viewer,
/// `rot_y` turns the left/right edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tilt {
    pub rot_x: f32,
    pub rot_y: f32,
}

impl Tilt {
    pub const ZERO: Self = Self {
        rot_x: 0.0,
        rot_y: 0.0,
    };

    pub const fn new(rot_x: f32, rot_y: f32) -> Self {
        Self { rot_x, rot_y }
    }
}

/// Axis-aligned rectangle in window pixels (origin top-left, y down)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centred on a point
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width * 0.5, cy - height * 0.5, width, height)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// Pointer offset relative to the centre, normalized to [-0.5, 0.5] on each axis.
    /// Returns `None` for degenerate rectangles.
    pub fn normalized_offset(&self, px: f32, py: f32) -> Option<(f32, f32)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let x = (px - self.x) / self.width - 0.5;
        let y = (py - self.y) / self.height - 0.5;
        Some((x, y))
    }
}

/// Sampling window into a texture, in UV units with a bottom-left origin.
///
/// The sampled coordinate is `offset + uv * repeat`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextureRegion {
    pub offset: [f32; 2],
    pub repeat: [f32; 2],
}

impl TextureRegion {
    pub const FULL: Self = Self {
        offset: [0.0, 0.0],
        repeat: [1.0, 1.0],
    };

    pub const fn new(offset: [f32; 2], repeat: [f32; 2]) -> Self {
        Self { offset, repeat }
    }

    /// Map a mesh UV into the texture window
    pub fn apply(&self, uv: [f32; 2]) -> [f32; 2] {
        [
            self.offset[0] + uv[0] * self.repeat[0],
            self.offset[1] + uv[1] * self.repeat[1],
        ]
    }
}

impl Default for TextureRegion {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_normalized_offset_center_and_corner() {
        let rect = Rect::new(100.0, 50.0, 200.0, 400.0);
        assert_eq!(rect.normalized_offset(200.0, 250.0), Some((0.0, 0.0)));
        assert_eq!(rect.normalized_offset(100.0, 50.0), Some((-0.5, -0.5)));
        assert_eq!(rect.normalized_offset(300.0, 450.0), Some((0.5, 0.5)));
    }

    #[test]
    fn degenerate_rect_has_no_offset() {
        let rect = Rect::new(0.0, 0.0, 0.0, 10.0);
        assert!(rect.normalized_offset(0.0, 0.0).is_none());
    }

    #[test]
    fn rect_centered_contains_center() {
        let rect = Rect::centered(640.0, 360.0, 100.0, 200.0);
        assert!(rect.contains(640.0, 360.0));
        assert!(!rect.contains(0.0, 0.0));
        assert_eq!(rect.center(), (640.0, 360.0));
    }

    #[test]
    fn region_maps_uv_into_window() {
        let top = TextureRegion::new([0.0, 0.95], [1.0, 0.05]);
        let mapped = top.apply([1.0, 1.0]);
        assert!((mapped[0] - 1.0).abs() < 1e-6);
        assert!((mapped[1] - 1.0).abs() < 1e-6);
        assert_eq!(TextureRegion::FULL.apply([0.3, 0.7]), [0.3, 0.7]);
    }
}

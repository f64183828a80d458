//! Detection regions.
//!
//! A region is stored as a normalized rectangle in `[0.0, 1.0]` and
//! carries a derived pixel rectangle in grid-cell coordinates. The pixel
//! rectangle is a pure function of the normalized rectangle and the
//! current grid size; `fixup` re-derives it after every mutation so the
//! two can never drift apart.

use serde::{Deserialize, Serialize};

use crate::vector::CompositeVector;

/// Motion level assigned to a region each frame: 0 none, 1 small-object
/// detect, 2 large-object detect.
pub type MotionLevel = u8;

/// One configured detection region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionRegion {
    /// Normalized rectangle, fractions of the full grid.
    pub xf0: f32,
    pub yf0: f32,
    pub dxf: f32,
    pub dyf: f32,

    /// Derived rectangle in grid cells. Never mutated directly.
    #[serde(skip)]
    pub x: i32,
    #[serde(skip)]
    pub y: i32,
    #[serde(skip)]
    pub dx: i32,
    #[serde(skip)]
    pub dy: i32,

    /// Stable index equal to the region's position in the store.
    #[serde(skip)]
    pub index: usize,

    /// This frame's composite vector.
    #[serde(skip)]
    pub vector: CompositeVector,

    /// This frame's direction-filter rejects within the region.
    #[serde(skip)]
    pub reject_count: i32,

    /// This frame's isolated sparkle cells within the region.
    #[serde(skip)]
    pub sparkle_count: i32,

    /// This frame's motion level.
    #[serde(skip)]
    pub motion: MotionLevel,
}

impl MotionRegion {
    /// Create a region from a normalized rectangle. The pixel rectangle
    /// stays zero until the first `fixup` against a real grid.
    pub fn from_normalized(xf0: f32, yf0: f32, dxf: f32, dyf: f32) -> Self {
        Self {
            xf0,
            yf0,
            dxf,
            dyf,
            ..Self::default()
        }
    }

    /// Clamp the normalized rectangle into range and re-derive the pixel
    /// rectangle for the given grid size.
    ///
    /// Origin is clamped to at least zero, the extent floored to two grid
    /// cells, and origin + extent clamped to 1.0. A zero grid (before the
    /// first resolution configuration) skips the cell-size clamps.
    pub fn fixup(&mut self, grid_width: usize, grid_height: usize) {
        if self.xf0 < 0.0 {
            self.xf0 = 0.0;
        }
        if self.yf0 < 0.0 {
            self.yf0 = 0.0;
        }

        if grid_width > 0 && grid_height > 0 {
            let delta = 2.0 / grid_width as f32;
            if self.xf0 > 1.0 - delta {
                self.xf0 = 1.0 - delta;
            }
            if self.dxf < delta {
                self.dxf = delta;
            }
            let delta = 2.0 / grid_height as f32;
            if self.yf0 > 1.0 - delta {
                self.yf0 = 1.0 - delta;
            }
            if self.dyf < delta {
                self.dyf = delta;
            }
        }

        if self.xf0 + self.dxf > 1.0 {
            self.dxf = 1.0 - self.xf0;
        }
        if self.yf0 + self.dyf > 1.0 {
            self.dyf = 1.0 - self.yf0;
        }

        self.x = (grid_width as f32 * self.xf0) as i32;
        self.y = (grid_height as f32 * self.yf0) as i32;
        self.dx = (grid_width as f32 * self.dxf) as i32;
        self.dy = (grid_height as f32 * self.dyf) as i32;
    }

    /// Reset the per-frame classification results.
    pub fn reset_frame(&mut self) {
        self.vector = CompositeVector::ZERO;
        self.reject_count = 0;
        self.sparkle_count = 0;
        self.motion = 0;
    }
}

//! Composite vectors and motion bounding areas.

use serde::{Deserialize, Serialize};

/// The averaged position and displacement of a cluster of accepted
/// motion-vector cells, plus the density box used for the final
/// concentration filter.
///
/// A zero-valued composite means the owning region produced no confirmed
/// vector this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeVector {
    /// Mean cell position in grid coordinates.
    pub x: i32,
    pub y: i32,

    /// Mean displacement.
    pub vx: i32,
    pub vy: i32,

    /// Squared magnitude of the mean displacement.
    pub mag2: i32,

    /// Number of cells contributing to the mean.
    pub mag2_count: i32,

    /// Density box dimensions in grid cells.
    pub box_w: i32,
    pub box_h: i32,

    /// Accepted and rejected cells falling inside the density box.
    pub in_box_count: i32,
    pub in_box_rejects: i32,

    /// Set when the mean displacement is near-vertical (`vy^2 > 20*vx^2`).
    pub vertical: bool,
}

impl CompositeVector {
    pub const ZERO: CompositeVector = CompositeVector {
        x: 0,
        y: 0,
        vx: 0,
        vy: 0,
        mag2: 0,
        mag2_count: 0,
        box_w: 0,
        box_h: 0,
        in_box_count: 0,
        in_box_rejects: 0,
        vertical: false,
    };

    /// True when no cells contributed.
    pub fn is_zero(&self) -> bool {
        self.mag2_count == 0
    }
}

/// Axis-aligned bounding area over accepted cells, in grid coordinates.
///
/// A coordinate of zero is treated as "unset": cell (0, 0) lies on the
/// excluded grid perimeter so accepted cells never land there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionArea {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl MotionArea {
    /// Reset to the unset state.
    pub fn clear(&mut self) {
        *self = MotionArea::default();
    }

    /// Grow the area to include the accepted cell at `(x, y)`.
    pub fn extend(&mut self, x: i32, y: i32) {
        if self.x0 == 0 || self.x0 > x {
            self.x0 = x;
        }
        if self.x1 < x {
            self.x1 = x;
        }
        if self.y0 == 0 || self.y0 > y {
            self.y0 = y;
        }
        if self.y1 < y {
            self.y1 = y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_composite_is_zero() {
        assert!(CompositeVector::ZERO.is_zero());
        let mut cvec = CompositeVector::ZERO;
        cvec.mag2_count = 3;
        assert!(!cvec.is_zero());
    }

    #[test]
    fn test_area_extend_tracks_extremes() {
        let mut area = MotionArea::default();
        area.extend(5, 7);
        area.extend(2, 9);
        area.extend(8, 3);
        assert_eq!(area, MotionArea { x0: 2, y0: 3, x1: 8, y1: 9 });
    }

    #[test]
    fn test_area_clear_resets() {
        let mut area = MotionArea::default();
        area.extend(4, 4);
        area.clear();
        assert_eq!(area, MotionArea::default());
    }
}

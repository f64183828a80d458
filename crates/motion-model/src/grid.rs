//! Bounds-checked grids over the encoder's macroblock lattice.
//!
//! The motion estimator emits one `(vx, vy)` pair per 16x16 macroblock
//! plus one padding column and row, so a `width x height` video yields a
//! `width/16 + 1` by `height/16 + 1` cell grid. Both grids here are flat
//! row-major buffers indexed by `(x, y)` with an explicit row stride;
//! all access is range-checked.

use serde::{Deserialize, Serialize};

/// Size in pixels of one motion-estimation macroblock.
pub const MACROBLOCK_SIZE: u32 = 16;

/// A single per-macroblock motion vector from the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionVector {
    pub vx: i16,
    pub vy: i16,
}

impl MotionVector {
    pub fn new(vx: i16, vy: i16) -> Self {
        Self { vx, vy }
    }

    /// Squared magnitude, widened so `i16::MIN` components cannot overflow.
    pub fn mag2(&self) -> i64 {
        let vx = i64::from(self.vx);
        let vy = i64::from(self.vy);
        vx * vx + vy * vy
    }
}

/// Grid dimensions derived from a video resolution.
pub fn grid_dims(video_width: u32, video_height: u32) -> (usize, usize) {
    (
        (video_width / MACROBLOCK_SIZE) as usize + 1,
        (video_height / MACROBLOCK_SIZE) as usize + 1,
    )
}

/// The dense per-frame motion vector grid.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorGrid {
    width: usize,
    height: usize,
    cells: Vec<MotionVector>,
}

impl VectorGrid {
    /// Create a zeroed grid with the given cell dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![MotionVector::default(); width * height],
        }
    }

    /// Create a zeroed grid sized for a video resolution.
    pub fn for_video(video_width: u32, video_height: u32) -> Self {
        let (w, h) = grid_dims(video_width, video_height);
        Self::new(w, h)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at `(x, y)`. Panics when out of range.
    pub fn at(&self, x: usize, y: usize) -> MotionVector {
        assert!(x < self.width && y < self.height, "cell out of grid");
        self.cells[y * self.width + x]
    }

    /// Overwrite the cell at `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, v: MotionVector) {
        assert!(x < self.width && y < self.height, "cell out of grid");
        self.cells[y * self.width + x] = v;
    }

    /// Replace this grid's contents from another grid of the same shape.
    pub fn copy_from(&mut self, other: &VectorGrid) {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "grid shape mismatch"
        );
        self.cells.copy_from_slice(&other.cells);
    }
}

/// Per-frame classification scratch grid, same shape as the vector grid.
///
/// Cell values: `0` below magnitude threshold, `TRIGGER_SPARKLE` for an
/// isolated cell excluded from composites, `TRIGGER_REJECT` for a cell
/// rejected by the direction filter, anything larger is the cell's
/// squared magnitude (an accepted candidate). The squared magnitude of a
/// thresholded cell is always at least 9 so the flag values cannot
/// collide.
#[derive(Debug, Clone)]
pub struct TriggerGrid {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

/// Trigger value marking an isolated sparkle cell.
pub const TRIGGER_SPARKLE: u32 = 1;

/// Trigger value marking a direction-filter reject.
pub const TRIGGER_REJECT: u32 = 2;

impl TriggerGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Zero every cell. Called once per frame before classification.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn at(&self, x: usize, y: usize) -> u32 {
        assert!(x < self.width && y < self.height, "cell out of grid");
        self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u32) {
        assert!(x < self.width && y < self.height, "cell out of grid");
        self.cells[y * self.width + x] = value;
    }

    /// Cell value, or zero when `(x, y)` lies outside the grid.
    pub fn at_or_zero(&self, x: isize, y: isize) -> u32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0;
        }
        self.cells[y as usize * self.width + x as usize]
    }

    /// True when none of the eight neighbors of `(x, y)` is triggered.
    pub fn neighbors_all_zero(&self, x: usize, y: usize) -> bool {
        let (x, y) = (x as isize, y as isize);
        for dy in -1..=1isize {
            for dx in -1..=1isize {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if self.at_or_zero(x + dx, y + dy) != 0 {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_dims_for_1080p() {
        let (w, h) = grid_dims(1920, 1080);
        assert_eq!(w, 121);
        assert_eq!(h, 68);
    }

    #[test]
    fn test_vector_mag2_cannot_overflow() {
        let v = MotionVector::new(i16::MIN, i16::MIN);
        assert_eq!(v.mag2(), 2 * 32768 * 32768);
    }

    #[test]
    fn test_vector_grid_roundtrip() {
        let mut grid = VectorGrid::new(8, 6);
        grid.set(3, 2, MotionVector::new(-4, 9));
        assert_eq!(grid.at(3, 2), MotionVector::new(-4, 9));
        assert_eq!(grid.at(2, 3), MotionVector::default());
    }

    #[test]
    #[should_panic(expected = "cell out of grid")]
    fn test_vector_grid_rejects_out_of_range() {
        let grid = VectorGrid::new(8, 6);
        let _ = grid.at(8, 0);
    }

    #[test]
    fn test_trigger_clear_zeroes_all() {
        let mut trigger = TriggerGrid::new(4, 4);
        trigger.set(1, 1, 100);
        trigger.set(3, 3, TRIGGER_REJECT);
        trigger.clear();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(trigger.at(x, y), 0);
            }
        }
    }

    #[test]
    fn test_neighbors_all_zero_detects_isolation() {
        let mut trigger = TriggerGrid::new(5, 5);
        trigger.set(2, 2, 50);
        assert!(trigger.neighbors_all_zero(2, 2));

        trigger.set(3, 3, 50);
        assert!(!trigger.neighbors_all_zero(2, 2));
        assert!(!trigger.neighbors_all_zero(3, 3));
    }

    #[test]
    fn test_neighbors_treats_border_as_zero() {
        let mut trigger = TriggerGrid::new(3, 3);
        trigger.set(0, 0, 50);
        assert!(trigger.neighbors_all_zero(0, 0));
    }
}

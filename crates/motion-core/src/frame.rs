//! Per-session motion frame state.

use vigilcam_common::config::MotionConfig;
use vigilcam_model::{
    grid_dims, CompositeVector, MotionArea, MotionRegion, MotionStatus, TriggerGrid, VectorGrid,
};

/// The complete mutable state of one camera's motion detector.
///
/// One instance per session, owned by the engine behind its region lock.
/// Buffers are sized for the current grid resolution and reallocated only
/// by [`MotionFrame::configure_resolution`], which must run between
/// frames, never during one.
#[derive(Debug)]
pub struct MotionFrame {
    /// Grid dimensions in cells.
    pub width: usize,
    pub height: usize,

    /// Latest motion vectors from the encoder.
    pub vectors: VectorGrid,

    /// Per-frame classification scratch.
    pub trigger: TriggerGrid,

    /// Ordered detection regions. A region's `index` always equals its
    /// position here.
    pub regions: Vec<MotionRegion>,

    /// Currently selected region for operator editing.
    pub selected: Option<usize>,

    /// Selection to restore when `select_region </>` follows a deselect.
    pub prev_selected: usize,

    /// Preview display toggles.
    pub show_regions: bool,
    pub show_vectors: bool,

    /// Live magnitude threshold (squared). Reset from config before each
    /// region so a dynamic adjustment cannot leak across regions.
    pub mag2_limit: i32,

    /// Live minimum composite count; raised within a cap by sparkle noise.
    pub mag2_limit_count: i32,

    /// Frame-level composite vector and number of contributing regions.
    pub frame_vector: CompositeVector,
    pub cvec_count: i32,

    /// Bounding area over all accepted cells this frame.
    pub motion_area: MotionArea,

    /// Best region vector of this frame (central-third comparator).
    pub best_region_vector: CompositeVector,

    /// Frame-wide counters.
    pub any_count: i32,
    pub reject_count: i32,
    pub sparkle_count: i32,
    pub vertical_count: i32,

    /// This frame's motion decision.
    pub motion_status: MotionStatus,

    /// Noise floors.
    pub sparkle_expma: f32,
    pub any_count_expma: f32,

    /// Saturating burst frame counter.
    pub burst_frame: i32,

    /// Pending-confirmation countdown in preview frames.
    pub frame_window: u32,

    /// Best region vector across the whole active recording.
    pub best_motion_vector: CompositeVector,

    /// Staged preview candidate, consumed when a preview is saved.
    pub preview_frame_vector: CompositeVector,
    pub preview_motion_area: MotionArea,

    /// Per-recording detection bookkeeping.
    pub first_detect: MotionStatus,
    pub direction_detects: u32,
    pub burst_detects: u32,
    pub first_burst_count: i32,
    pub max_burst_count: i32,
}

impl MotionFrame {
    /// Create an unconfigured frame with a zero grid. No classification
    /// happens until a resolution is configured.
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            vectors: VectorGrid::new(0, 0),
            trigger: TriggerGrid::new(0, 0),
            regions: Vec::new(),
            selected: None,
            prev_selected: 0,
            show_regions: false,
            show_vectors: false,
            mag2_limit: 0,
            mag2_limit_count: 0,
            frame_vector: CompositeVector::ZERO,
            cvec_count: 0,
            motion_area: MotionArea::default(),
            best_region_vector: CompositeVector::ZERO,
            any_count: 0,
            reject_count: 0,
            sparkle_count: 0,
            vertical_count: 0,
            motion_status: MotionStatus::NONE,
            sparkle_expma: 0.0,
            any_count_expma: 0.0,
            burst_frame: 0,
            frame_window: 0,
            best_motion_vector: CompositeVector::ZERO,
            preview_frame_vector: CompositeVector::ZERO,
            preview_motion_area: MotionArea::default(),
            first_detect: MotionStatus::NONE,
            direction_detects: 0,
            burst_detects: 0,
            first_burst_count: 0,
            max_burst_count: 0,
        }
    }

    /// Size the grids for a video resolution and re-derive every region's
    /// pixel rectangle. Must be called between frames.
    pub fn configure_resolution(&mut self, video_width: u32, video_height: u32) {
        let (width, height) = grid_dims(video_width, video_height);
        self.width = width;
        self.height = height;
        self.vectors = VectorGrid::new(width, height);
        self.trigger = TriggerGrid::new(width, height);
        for region in &mut self.regions {
            region.fixup(width, height);
        }
        self.motion_status = MotionStatus::NONE;
        tracing::info!(width, height, "Motion grid configured");
    }

    /// True once a real resolution has been configured.
    pub fn configured(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Reset all per-frame state and load the configured limits.
    pub fn begin_frame(&mut self, config: &MotionConfig) {
        self.motion_status = MotionStatus::NONE;
        self.sparkle_count = 0;
        self.reject_count = 0;
        self.any_count = 0;
        self.vertical_count = 0;
        self.trigger.clear();
        self.best_region_vector = CompositeVector::ZERO;
        self.motion_area.clear();
        self.frame_vector = CompositeVector::ZERO;
        self.cvec_count = 0;
        self.reset_limits(config);
        for region in &mut self.regions {
            region.reset_frame();
        }
    }

    /// Restore the configured thresholds, discarding any dynamic
    /// adjustment made while classifying a region.
    pub fn reset_limits(&mut self, config: &MotionConfig) {
        self.mag2_limit = config.mag2_limit();
        self.mag2_limit_count = config.magnitude_limit_count;
    }
}

impl Default for MotionFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigilcam_model::MotionVector;

    #[test]
    fn test_configure_resolution_sizes_grids() {
        let mut frame = MotionFrame::new();
        assert!(!frame.configured());
        frame.configure_resolution(640, 480);
        assert!(frame.configured());
        assert_eq!(frame.width, 41);
        assert_eq!(frame.height, 31);
        assert_eq!(frame.vectors.width(), 41);
        assert_eq!(frame.trigger.height(), 31);
    }

    #[test]
    fn test_configure_resolution_rederives_region_rects() {
        let mut frame = MotionFrame::new();
        frame.regions.push(MotionRegion::from_normalized(0.0, 0.0, 1.0, 1.0));
        frame.configure_resolution(640, 480);
        assert_eq!(frame.regions[0].dx, 41);
        assert_eq!(frame.regions[0].dy, 31);

        frame.configure_resolution(1920, 1080);
        assert_eq!(frame.regions[0].dx, 121);
        assert_eq!(frame.regions[0].dy, 68);
    }

    #[test]
    fn test_begin_frame_clears_scratch() {
        let mut frame = MotionFrame::new();
        frame.configure_resolution(320, 240);
        frame.vectors.set(5, 5, MotionVector::new(10, 0));
        frame.trigger.set(5, 5, 100);
        frame.any_count = 12;
        frame.mag2_limit_count = 15;

        frame.begin_frame(&MotionConfig::default());
        assert_eq!(frame.trigger.at(5, 5), 0);
        assert_eq!(frame.any_count, 0);
        assert_eq!(frame.mag2_limit_count, 4);
        assert_eq!(frame.mag2_limit, 49);
        // Vector data is the encoder's, not frame scratch.
        assert_eq!(frame.vectors.at(5, 5), MotionVector::new(10, 0));
    }
}

//! Single entry point tying the per-frame stages together.

use vigilcam_common::config::{CameraConfig, MotionConfig};
use vigilcam_model::VectorGrid;

use crate::aggregate::aggregate_frame;
use crate::classifier::classify_region;
use crate::detect::{self, FrameDecision, RecordingState};
use crate::frame::MotionFrame;
use crate::noise::update_noise;

/// Run one encoder vector grid through classification, aggregation,
/// noise tracking, and detection.
///
/// The adaptive count floor a region's sparkles raise is reverted after
/// each region so regions classify independently.
pub fn process_frame(
    frame: &mut MotionFrame,
    vectors: &VectorGrid,
    config: &MotionConfig,
    camera: &CameraConfig,
    recording: RecordingState,
) -> FrameDecision {
    debug_assert!(frame.configured(), "process_frame before resolution set");

    frame.vectors.copy_from(vectors);
    frame.begin_frame(config);

    for index in 0..frame.regions.len() {
        classify_region(frame, index, config);
        frame.reset_limits(config);
    }

    let tally = aggregate_frame(frame);
    let burst_triggered = update_noise(frame, tally, config.burst_count, config.burst_frames);

    detect::evaluate(frame, tally, burst_triggered, config, camera, recording)
}

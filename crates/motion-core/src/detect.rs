//! The pending/burst/detected state machine.

use vigilcam_common::config::{CameraConfig, MotionConfig, PreviewSaveMode};
use vigilcam_model::MotionStatus;

use crate::aggregate::RegionTally;
use crate::classifier::better_vector;
use crate::frame::MotionFrame;

/// What the recording collaborator is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// No recording running; a detect may start one.
    Idle,
    /// An operator-initiated recording is running; motion detects are
    /// ignored.
    Manual,
    /// A motion-triggered recording is running; detects extend it.
    MotionRecord,
}

/// Side effect requested from the recording collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    /// Start a motion recording; the preview candidate has been staged.
    Start,
    /// Push the scheduled stop out to now + post-capture. When
    /// `restage_preview` is set, a better vector arrived and the preview
    /// candidate was re-staged ("best" save mode).
    Extend { restage_preview: bool },
}

/// Outcome of one frame's detection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDecision {
    pub status: MotionStatus,
    pub action: Option<RecordAction>,
}

/// Combine the region tallies, frame aggregate, and burst state into the
/// frame's motion status, manage the pending window, and stage recording
/// side effects.
pub fn evaluate(
    frame: &mut MotionFrame,
    tally: RegionTally,
    burst_triggered: bool,
    config: &MotionConfig,
    camera: &CameraConfig,
    recording: RecordingState,
) -> FrameDecision {
    let mut status = MotionStatus::NONE;

    if tally.motion_count > 0 && tally.fail_count == 0 {
        if recording != RecordingState::MotionRecord
            && frame.frame_window == 0
            && config.confirm_gap_secs > 0
        {
            frame.frame_window =
                camera.video_fps * config.confirm_gap_secs / camera.mjpeg_divider.max(1);
            status = MotionStatus::pending();
        } else {
            status = MotionStatus::detected_vector();
        }
    }

    if burst_triggered {
        status.apply_burst();
        frame.frame_window = 0;
    }

    // The pending window expires silently; only a later clean frame or a
    // burst promotes it.
    if frame.frame_window > 0 {
        frame.frame_window -= 1;
    }

    if frame.frame_vector.mag2_count > 0 {
        tracing::debug!(
            x = frame.frame_vector.x,
            y = frame.frame_vector.y,
            vx = frame.frame_vector.vx,
            vy = frame.frame_vector.vy,
            mag2 = frame.frame_vector.mag2,
            count = frame.frame_vector.mag2_count,
            any_expma = frame.any_count_expma,
            burst_frame = frame.burst_frame,
            "frame composite"
        );
    }
    if tally.motion_count > 0 || tally.fail_count > 0 {
        tracing::debug!(
            any = frame.any_count,
            rejects = frame.reject_count,
            sparkles = frame.sparkle_count,
            sparkle_expma = frame.sparkle_expma,
            motion = tally.motion_count,
            fail = tally.fail_count,
            window = frame.frame_window,
            status = status.label(),
            "frame summary"
        );
    }

    if burst_triggered {
        frame.burst_frame = 0;
    }

    frame.motion_status = status;

    let mut action = None;
    if status.detected && config.enable {
        match recording {
            RecordingState::Idle => {
                // Stage the preview candidate up front so a preview save
                // command never has to wait for another detect.
                frame.best_motion_vector = frame.best_region_vector;
                frame.preview_frame_vector = frame.frame_vector;
                frame.preview_motion_area = frame.motion_area;
                frame.first_detect = status;
                frame.direction_detects = 0;
                frame.burst_detects = 0;
                frame.first_burst_count = 0;
                frame.max_burst_count = 0;
                if status.vector {
                    frame.direction_detects = 1;
                }
                if status.burst {
                    frame.burst_detects = 1;
                    frame.first_burst_count = frame.frame_vector.mag2_count;
                    frame.max_burst_count = frame.frame_vector.mag2_count + frame.reject_count;
                }
                action = Some(RecordAction::Start);
            }
            RecordingState::MotionRecord => {
                let restage = config.preview_save_mode == PreviewSaveMode::Best
                    && better_vector(
                        frame.width,
                        &frame.best_region_vector,
                        &frame.best_motion_vector,
                    );
                if restage {
                    frame.best_motion_vector = frame.best_region_vector;
                    frame.preview_frame_vector = frame.frame_vector;
                    frame.preview_motion_area = frame.motion_area;
                }
                if status.vector {
                    frame.direction_detects += 1;
                }
                if status.burst {
                    frame.burst_detects += 1;
                    let burst_count = frame.frame_vector.mag2_count + frame.reject_count;
                    if frame.max_burst_count < burst_count {
                        frame.max_burst_count = burst_count;
                    }
                }
                action = Some(RecordAction::Extend {
                    restage_preview: restage,
                });
            }
            // A manual recording is in progress; leave it alone.
            RecordingState::Manual => {}
        }
    }

    FrameDecision { status, action }
}

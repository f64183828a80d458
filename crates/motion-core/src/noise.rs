//! Adaptive noise floors and burst counting.

use crate::aggregate::RegionTally;
use crate::frame::MotionFrame;

/// Smoothing factor for the sparkle noise floor.
pub const SPARKLE_EXPMA_SMOOTHING: f32 = 0.01;

/// Smoothing factor for the background activity floor.
pub const ANY_COUNT_EXPMA_SMOOTHING: f32 = 0.03;

/// Update the noise floors and the burst frame counter.
///
/// Returns true when the burst counter reached `burst_frames` this frame,
/// which is a burst trigger. The caller resets the counter once the
/// trigger has been consumed.
///
/// `any_count_expma` tracks background activity and is only fed on true
/// idle frames (no region confirmed motion and none failed the filters),
/// so genuine activity cannot inflate the floor. Sparkles are already
/// excluded from `any_count`.
pub fn update_noise(
    frame: &mut MotionFrame,
    tally: RegionTally,
    burst_count: i32,
    burst_frames: i32,
) -> bool {
    frame.sparkle_expma = SPARKLE_EXPMA_SMOOTHING * frame.sparkle_count as f32
        + (1.0 - SPARKLE_EXPMA_SMOOTHING) * frame.sparkle_expma;

    let activity = frame.frame_vector.mag2_count + frame.reject_count;
    if activity > burst_count + frame.any_count_expma as i32 {
        if frame.burst_frame < burst_frames {
            frame.burst_frame += 1;
        }
    } else {
        if tally.motion_count == 0 && tally.fail_count == 0 {
            frame.any_count_expma = ANY_COUNT_EXPMA_SMOOTHING * frame.any_count as f32
                + (1.0 - ANY_COUNT_EXPMA_SMOOTHING) * frame.any_count_expma;
        }
        if frame.burst_frame > 0 {
            frame.burst_frame -= 1;
        }
    }

    frame.burst_frame == burst_frames
}

//! Per-region vector clustering and direction filtering.

use vigilcam_common::config::MotionConfig;
use vigilcam_model::{CompositeVector, MotionLevel, TRIGGER_REJECT, TRIGGER_SPARKLE};

use crate::frame::MotionFrame;

/// Composite counts below this use the stricter small-object filter.
pub const SMALL_OBJECT_COUNT: i32 = 15;

/// Minimum scaled squared cosine between a cell vector and the tentative
/// mean direction: `100 * cos(25deg)^2`.
const DIRECTION_COS2_MIN: i64 = 82;

/// Preference order between two candidate region vectors.
///
/// Returns true when `a` should replace `b` as the frame's best vector:
/// a vector inside the central third of the grid width beats one outside
/// it; between two central vectors the larger contributing count wins;
/// between two off-center vectors the one closer to the horizontal
/// center wins.
pub fn better_vector(grid_width: usize, a: &CompositeVector, b: &CompositeVector) -> bool {
    let xm = grid_width as i32 / 2;
    let xt = grid_width as i32 / 3;

    let da = (xm - a.x).abs();
    let db = (xm - b.x).abs();
    if db < xt {
        da < xt && a.mag2_count > b.mag2_count
    } else {
        da < db
    }
}

/// Classify one region against the current vector grid.
///
/// Produces the region's composite vector and motion level, accumulates
/// the frame-wide any/reject/sparkle counters, extends the frame motion
/// area, and may take over the frame's best region vector. May raise the
/// live `mag2_limit_count`; the caller restores the configured limits
/// before the next region.
pub fn classify_region(frame: &mut MotionFrame, index: usize, config: &MotionConfig) {
    let (rx, ry, rdx, rdy) = {
        let region = &frame.regions[index];
        (region.x, region.y, region.dx, region.dy)
    };

    // The outermost grid row/column only exists as encoder padding and
    // carries unreliable vectors; it is excluded from thresholding but
    // still read (as zero) by the sparkle adjacency checks.
    let y0 = (ry.max(1)) as usize;
    let y1 = ((ry + rdy).min(frame.height as i32 - 1)).max(0) as usize;
    let x0 = (rx.max(1)) as usize;
    let x1 = ((rx + rdx).min(frame.width as i32 - 1)).max(0) as usize;

    // Threshold pass: record the squared magnitude of every cell at or
    // above the limit.
    for y in y0..y1 {
        for x in x0..x1 {
            let mag2 = frame.vectors.at(x, y).mag2();
            if mag2 >= i64::from(frame.mag2_limit) {
                frame.trigger.set(x, y, mag2 as u32);
            }
        }
    }

    // Sparkle pass: demote isolated cells, accumulate the rest into a
    // tentative composite. Scan order matters: a cell already demoted
    // still reads as nonzero to its neighbors, so any 2-connected
    // cluster survives intact. Dim light (dusk/dawn) can produce large
    // sparkle counts.
    let mut tvec = CompositeVector::ZERO;
    let mut sparkles = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            if frame.trigger.at(x, y) != 0 && frame.trigger.neighbors_all_zero(x, y) {
                frame.trigger.set(x, y, TRIGGER_SPARKLE);
                frame.sparkle_count += 1;
                sparkles += 1;
            }
            if frame.trigger.at(x, y) > TRIGGER_SPARKLE {
                let mv = frame.vectors.at(x, y);
                tvec.mag2_count += 1;
                tvec.vx += i32::from(mv.vx);
                tvec.vy += i32::from(mv.vy);
                tvec.x += x as i32;
                tvec.y += y as i32;
                frame.any_count += 1;
            }
        }
    }

    // Sparkle noise raises the live count floor toward a cap so dusk/dawn
    // sensor noise cannot trigger on its own. The cap is lower when no
    // confirm gap backstops spurious detects.
    let cap = if config.confirm_gap_secs > 0 {
        SMALL_OBJECT_COUNT
    } else {
        2 * SMALL_OBJECT_COUNT / 3
    };
    if frame.mag2_limit_count < cap {
        frame.mag2_limit_count += 2 * sparkles / 3;
        if frame.mag2_limit_count > cap {
            frame.mag2_limit_count = cap;
        }
    }

    // Direction filter: keep only cells pointing with the tentative mean
    // direction. The squared cosine avoids a sqrt:
    //   cos(a)^2 = (v1 . v2)^2 / (|v1|^2 |v2|^2),  100 * cos(25)^2 = 82
    let mut cvec = CompositeVector::ZERO;
    let mut rejects = 0;
    if tvec.mag2_count >= frame.mag2_limit_count {
        tvec.vx /= tvec.mag2_count;
        tvec.vy /= tvec.mag2_count;
        tvec.mag2 = tvec.vx * tvec.vx + tvec.vy * tvec.vy;

        for y in y0..y1 {
            for x in x0..x1 {
                let mvmag2 = frame.trigger.at(x, y);
                if mvmag2 <= TRIGGER_REJECT {
                    continue;
                }

                let mv = frame.vectors.at(x, y);
                let dot = tvec.vx * i32::from(mv.vx) + tvec.vy * i32::from(mv.vy);
                let aligned = dot > 0
                    && tvec.mag2 > 0
                    && 100 * i64::from(dot) * i64::from(dot)
                        / (i64::from(tvec.mag2) * i64::from(mvmag2))
                        >= DIRECTION_COS2_MIN;
                if aligned {
                    cvec.mag2_count += 1;
                    cvec.vx += i32::from(mv.vx);
                    cvec.vy += i32::from(mv.vy);
                    cvec.x += x as i32;
                    cvec.y += y as i32;
                    frame.motion_area.extend(x as i32, y as i32);
                } else {
                    frame.trigger.set(x, y, TRIGGER_REJECT);
                    frame.reject_count += 1;
                    rejects += 1;
                }
            }
        }
    }

    // Final composite: every surviving cell has sufficient magnitude and
    // points with some spread in the same direction. The distribution
    // inside a density box decides the motion level.
    let mut motion: MotionLevel = 0;
    if cvec.mag2_count >= frame.mag2_limit_count {
        cvec.x /= cvec.mag2_count;
        cvec.y /= cvec.mag2_count;
        cvec.vx /= cvec.mag2_count;
        cvec.vy /= cvec.mag2_count;
        cvec.mag2 = cvec.vx * cvec.vx + cvec.vy * cvec.vy;

        // Vertical composites are flagged for the optional rain filter.
        cvec.vertical = cvec.vy * cvec.vy > 20 * cvec.vx * cvec.vx;
        if cvec.vertical {
            frame.vertical_count += 1;
        }

        // Grow a box that would hold at least twice the accepted count,
        // then tally accepted/rejected cells inside it.
        cvec.box_w = 4;
        cvec.box_h = 4;
        while cvec.box_w * cvec.box_h <= 2 * cvec.mag2_count {
            if cvec.box_h <= cvec.box_w {
                cvec.box_h += 2;
            } else {
                cvec.box_w += 2;
            }
        }

        cvec.in_box_count = 0;
        cvec.in_box_rejects = 0;
        for y in (cvec.y - cvec.box_h / 2)..=(cvec.y + cvec.box_h / 2) {
            for x in (cvec.x - cvec.box_w / 2)..=(cvec.x + cvec.box_w / 2) {
                let trig = frame.trigger.at_or_zero(x as isize, y as isize);
                if trig > TRIGGER_REJECT {
                    cvec.in_box_count += 1;
                } else if trig == TRIGGER_REJECT {
                    cvec.in_box_rejects += 1;
                }
            }
        }

        // Concentration filters. Small-object composites (fast bird
        // fly-bys, close insects) always enforce the reject ratio, which
        // also filters noisy frames: rain, camera burps. Ratios are
        // empirical.
        if !cvec.vertical || !config.vertical_filter {
            if cvec.mag2_count < SMALL_OBJECT_COUNT {
                if cvec.in_box_count > cvec.mag2_count * 8 / 10
                    && cvec.mag2 < 5 * frame.mag2_limit
                    && rejects < cvec.mag2_count / 2
                {
                    motion = 1;
                }
            } else if cvec.in_box_count > cvec.mag2_count * 7 / 10
                || (cvec.in_box_count > cvec.mag2_count * 5 / 10
                    && rejects < cvec.mag2_count * 4 / 10)
            {
                motion = 2;
            }
        }

        if motion > 0 && better_vector(frame.width, &cvec, &frame.best_region_vector) {
            frame.best_region_vector = cvec;
        }

        tracing::debug!(
            region = index,
            x = cvec.x,
            y = cvec.y,
            vx = cvec.vx,
            vy = cvec.vy,
            mag2 = cvec.mag2,
            count = cvec.mag2_count,
            rejects,
            box_w = cvec.box_w,
            box_h = cvec.box_h,
            in_box = cvec.in_box_count,
            in_box_rejects = cvec.in_box_rejects,
            motion,
            vertical = cvec.vertical,
            sparkles,
            limit_count = frame.mag2_limit_count,
            "region composite"
        );
    } else {
        cvec = CompositeVector::ZERO;
    }

    let region = &mut frame.regions[index];
    region.vector = cvec;
    region.reject_count = rejects;
    region.sparkle_count = sparkles;
    region.motion = motion;
}

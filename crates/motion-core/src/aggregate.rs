//! Frame-level aggregation of region composite vectors.

use vigilcam_model::CompositeVector;

use crate::frame::MotionFrame;

/// Per-frame region tallies feeding the detection state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionTally {
    /// Regions that reached motion level > 0.
    pub motion_count: i32,

    /// Regions that produced a composite vector but failed the
    /// concentration filters.
    pub fail_count: i32,
}

/// Merge all region composites into the frame composite vector.
///
/// The frame vector is the plain mean over contributing regions (not
/// weighted by per-region counts), and its box half-widths are the
/// maximum distance from the frame mean to any contributing region's box
/// edges. That density-based box is usually tighter than the geometric
/// extremes recorded in the motion area.
pub fn aggregate_frame(frame: &mut MotionFrame) -> RegionTally {
    let mut tally = RegionTally::default();
    frame.frame_vector = CompositeVector::ZERO;
    frame.cvec_count = 0;

    for region in &frame.regions {
        let cvec = &region.vector;
        if cvec.mag2_count > 0 && region.motion == 0 {
            tally.fail_count += 1;
        } else if region.motion > 0 {
            tally.motion_count += 1;
        }

        if cvec.mag2_count > 0 {
            frame.frame_vector.x += cvec.x;
            frame.frame_vector.y += cvec.y;
            frame.frame_vector.vx += cvec.vx;
            frame.frame_vector.vy += cvec.vy;
            frame.frame_vector.mag2_count += cvec.mag2_count;
            frame.cvec_count += 1;
        }
    }

    if frame.cvec_count > 0 {
        let fvec = &mut frame.frame_vector;
        fvec.x /= frame.cvec_count;
        fvec.y /= frame.cvec_count;
        fvec.vx /= frame.cvec_count;
        fvec.vy /= frame.cvec_count;
        fvec.mag2 = fvec.vx * fvec.vx + fvec.vy * fvec.vy;

        let (mut x0, mut y0, mut x1, mut y1) = (0, 0, 0, 0);
        for region in &frame.regions {
            let cvec = &region.vector;
            if cvec.mag2_count == 0 {
                continue;
            }
            let t = cvec.x - cvec.box_w / 2;
            if x0 == 0 || t < x0 {
                x0 = t;
            }
            let t = cvec.x + cvec.box_w / 2;
            if t > x1 {
                x1 = t;
            }
            let t = cvec.y - cvec.box_h / 2;
            if y0 == 0 || t < y0 {
                y0 = t;
            }
            let t = cvec.y + cvec.box_h / 2;
            if t > y1 {
                y1 = t;
            }
        }
        let fvec = &mut frame.frame_vector;
        fvec.box_w = 2 * (fvec.x - x0).max(x1 - fvec.x);
        fvec.box_h = 2 * (fvec.y - y0).max(y1 - fvec.y);
    }

    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigilcam_model::MotionRegion;

    fn region_with_vector(cvec: CompositeVector, motion: u8) -> MotionRegion {
        MotionRegion {
            vector: cvec,
            motion,
            ..MotionRegion::default()
        }
    }

    #[test]
    fn test_mean_is_unweighted_by_counts() {
        let mut frame = MotionFrame::new();
        frame.configure_resolution(320, 240);
        frame.regions.push(region_with_vector(
            CompositeVector {
                x: 10,
                y: 10,
                vx: 4,
                vy: 0,
                mag2_count: 100,
                box_w: 4,
                box_h: 4,
                ..CompositeVector::ZERO
            },
            2,
        ));
        frame.regions.push(region_with_vector(
            CompositeVector {
                x: 20,
                y: 14,
                vx: 8,
                vy: 2,
                mag2_count: 2,
                box_w: 4,
                box_h: 4,
                ..CompositeVector::ZERO
            },
            1,
        ));

        let tally = aggregate_frame(&mut frame);
        assert_eq!(tally.motion_count, 2);
        assert_eq!(tally.fail_count, 0);
        assert_eq!(frame.cvec_count, 2);
        // Plain mean of (10,20) and (4,8), not weighted by 100 vs 2.
        assert_eq!(frame.frame_vector.x, 15);
        assert_eq!(frame.frame_vector.vx, 6);
        assert_eq!(frame.frame_vector.mag2_count, 102);
        assert_eq!(frame.frame_vector.mag2, 37);
    }

    #[test]
    fn test_fail_region_counts_but_contributes() {
        let mut frame = MotionFrame::new();
        frame.configure_resolution(320, 240);
        frame.regions.push(region_with_vector(
            CompositeVector {
                x: 12,
                y: 9,
                vx: 5,
                vy: 0,
                mag2_count: 20,
                box_w: 6,
                box_h: 6,
                ..CompositeVector::ZERO
            },
            0,
        ));

        let tally = aggregate_frame(&mut frame);
        assert_eq!(tally.fail_count, 1);
        assert_eq!(tally.motion_count, 0);
        // A disqualified composite still contributes to the frame vector.
        assert_eq!(frame.cvec_count, 1);
        assert_eq!(frame.frame_vector.x, 12);
    }

    #[test]
    fn test_box_spans_to_farthest_region_edge() {
        let mut frame = MotionFrame::new();
        frame.configure_resolution(320, 240);
        for (x, y) in [(8, 10), (16, 10)] {
            frame.regions.push(region_with_vector(
                CompositeVector {
                    x,
                    y,
                    vx: 3,
                    vy: 0,
                    mag2_count: 6,
                    box_w: 4,
                    box_h: 4,
                    ..CompositeVector::ZERO
                },
                1,
            ));
        }

        aggregate_frame(&mut frame);
        // Mean x = 12; farthest edges at 8-2=6 and 16+2=18.
        assert_eq!(frame.frame_vector.x, 12);
        assert_eq!(frame.frame_vector.box_w, 12);
        assert_eq!(frame.frame_vector.box_h, 4);
    }

    #[test]
    fn test_no_contributors_leaves_zero_vector() {
        let mut frame = MotionFrame::new();
        frame.configure_resolution(320, 240);
        frame.regions.push(region_with_vector(CompositeVector::ZERO, 0));

        let tally = aggregate_frame(&mut frame);
        assert_eq!(tally, RegionTally::default());
        assert!(frame.frame_vector.is_zero());
    }
}

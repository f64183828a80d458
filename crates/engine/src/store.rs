//! Region store mutation: add, select, move, assign, delete, limits.
//!
//! The regions live on the session's `MotionFrame`; every function here
//! runs under the session lock. Region `index` always equals the region's
//! position in the store, deletion reindexes.

use vigilcam_common::config::MotionConfig;
use vigilcam_model::{DeleteTarget, MotionRegion, RegionAxis, SelectMove};
use vigilcam_motion::MotionFrame;

/// Coarse nudge step as a fraction of the frame.
const COARSE_STEP: f32 = 0.1;

/// Append a region from normalized coordinates. The new region becomes
/// the selected one and region display turns on.
pub fn add_region(frame: &mut MotionFrame, xf0: f32, yf0: f32, dxf: f32, dyf: f32) {
    let mut region = MotionRegion::from_normalized(xf0, yf0, dxf, dyf);
    region.fixup(frame.width, frame.height);
    region.index = frame.regions.len();
    frame.selected = Some(region.index);
    frame.prev_selected = region.index;
    frame.regions.push(region);
    frame.show_regions = true;
}

/// Change the selection. A deselected store restores the previously
/// selected index instead of stepping; otherwise previous/next wrap
/// around. No-op on an empty store.
pub fn select_region(frame: &mut MotionFrame, select: SelectMove) {
    let n = frame.regions.len();
    if n == 0 {
        return;
    }
    let selected = match (select, frame.selected) {
        (SelectMove::Last, _) => n - 1,
        (_, None) => frame.prev_selected.min(n - 1),
        (SelectMove::Previous, Some(i)) => {
            if i == 0 {
                n - 1
            } else {
                i - 1
            }
        }
        (SelectMove::Next, Some(i)) => {
            if i + 1 >= n {
                0
            } else {
                i + 1
            }
        }
    };
    frame.selected = Some(selected);
    frame.prev_selected = selected;
    frame.show_regions = true;
}

/// Nudge one edge coordinate of the selected region by an explicit
/// normalized step. Returns false when nothing is selected.
pub fn nudge_selected(frame: &mut MotionFrame, axis: RegionAxis, step: f32) -> bool {
    let Some(index) = frame.selected else {
        return false;
    };
    let (grid_w, grid_h) = (frame.width, frame.height);
    let Some(region) = frame.regions.get_mut(index) else {
        return false;
    };
    match axis {
        RegionAxis::X => region.xf0 += step,
        RegionAxis::Y => region.yf0 += step,
        RegionAxis::Dx => region.dxf += step,
        RegionAxis::Dy => region.dyf += step,
    }
    region.fixup(grid_w, grid_h);
    true
}

/// One-macroblock nudge: the step is one grid cell on the axis involved.
pub fn move_fine(frame: &mut MotionFrame, axis: RegionAxis, positive: bool) -> bool {
    let cells = if axis.horizontal() {
        frame.width
    } else {
        frame.height
    };
    if cells == 0 {
        return false;
    }
    let step = 1.0 / cells as f32;
    nudge_selected(frame, axis, if positive { step } else { -step })
}

/// Tenth-of-frame nudge.
pub fn move_coarse(frame: &mut MotionFrame, axis: RegionAxis, positive: bool) -> bool {
    let step = if positive { COARSE_STEP } else { -COARSE_STEP };
    nudge_selected(frame, axis, step)
}

/// Shift a region by relative normalized deltas.
pub fn move_region(
    frame: &mut MotionFrame,
    index: usize,
    dxf0: f32,
    dyf0: f32,
    ddxf: f32,
    ddyf: f32,
) {
    let (grid_w, grid_h) = (frame.width, frame.height);
    if let Some(region) = frame.regions.get_mut(index) {
        region.xf0 += dxf0;
        region.yf0 += dyf0;
        region.dxf += ddxf;
        region.dyf += ddyf;
        region.fixup(grid_w, grid_h);
    }
}

/// Overwrite a region's rectangle with absolute normalized coordinates.
pub fn assign_region(
    frame: &mut MotionFrame,
    index: usize,
    xf0: f32,
    yf0: f32,
    dxf: f32,
    dyf: f32,
) {
    let (grid_w, grid_h) = (frame.width, frame.height);
    if let Some(region) = frame.regions.get_mut(index) {
        region.xf0 = xf0;
        region.yf0 = yf0;
        region.dxf = dxf;
        region.dyf = dyf;
        region.fixup(grid_w, grid_h);
    }
}

/// Delete regions, keep indexes contiguous, and clamp the selection.
/// Returns false when a selected/index delete had no region to act on.
pub fn delete_regions(frame: &mut MotionFrame, target: DeleteTarget) -> bool {
    let acted = match target {
        DeleteTarget::All => {
            frame.regions.clear();
            true
        }
        DeleteTarget::Selected => match frame.selected {
            Some(i) if i < frame.regions.len() => {
                frame.regions.remove(i);
                true
            }
            _ => false,
        },
        DeleteTarget::Index(i) => {
            if i < frame.regions.len() {
                frame.regions.remove(i);
                true
            } else {
                false
            }
        }
    };

    for (i, region) in frame.regions.iter_mut().enumerate() {
        region.index = i;
    }

    let n = frame.regions.len();
    match frame.selected {
        Some(sel) if n > 0 && sel >= n - 1 => {
            frame.selected = Some(n - 1);
            frame.prev_selected = 0;
        }
        Some(_) if n == 0 => {
            frame.selected = None;
            frame.prev_selected = 0;
        }
        _ => {}
    }
    acted
}

/// Set the magnitude/count trigger limits with real clamps. The count
/// cap is half the grid cell count so a limit can never exceed what a
/// region could produce.
pub fn set_limits(config: &mut MotionConfig, frame: &MotionFrame, magnitude: i32, count: i32) {
    config.magnitude_limit = magnitude.clamp(3, 120);
    let cap = (frame.width * frame.height) as i32 / 2;
    config.magnitude_limit_count = count.clamp(2, cap.max(2));
}

/// Set the burst count/frames thresholds, same count cap as the limits.
pub fn set_burst(config: &mut MotionConfig, frame: &MotionFrame, count: i32, frames: i32) {
    let cap = (frame.width * frame.height) as i32 / 2;
    config.burst_count = count.clamp(20, cap.max(20));
    config.burst_frames = frames.clamp(2, 20);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame_with_regions(n: usize) -> MotionFrame {
        let mut frame = MotionFrame::new();
        frame.configure_resolution(320, 240);
        for i in 0..n {
            add_region(&mut frame, 0.1 * i as f32, 0.1, 0.2, 0.2);
        }
        frame
    }

    #[test]
    fn test_add_selects_new_region_and_shows() {
        let mut frame = frame_with_regions(0);
        frame.show_regions = false;
        add_region(&mut frame, 0.25, 0.25, 0.5, 0.5);
        assert_eq!(frame.regions.len(), 1);
        assert_eq!(frame.selected, Some(0));
        assert!(frame.show_regions);
        assert_eq!(frame.regions[0].index, 0);
        // Pixel rect derived on add.
        assert!(frame.regions[0].dx > 0);
    }

    #[test]
    fn test_select_wraps_both_directions() {
        let mut frame = frame_with_regions(3);
        assert_eq!(frame.selected, Some(2));
        select_region(&mut frame, SelectMove::Next);
        assert_eq!(frame.selected, Some(0));
        select_region(&mut frame, SelectMove::Previous);
        assert_eq!(frame.selected, Some(2));
        select_region(&mut frame, SelectMove::Last);
        assert_eq!(frame.selected, Some(2));
    }

    #[test]
    fn test_select_restores_previous_when_deselected() {
        let mut frame = frame_with_regions(3);
        select_region(&mut frame, SelectMove::Next);
        assert_eq!(frame.selected, Some(0));
        frame.selected = None;
        select_region(&mut frame, SelectMove::Next);
        assert_eq!(frame.selected, Some(0));
    }

    #[test]
    fn test_select_on_empty_store_is_noop() {
        let mut frame = frame_with_regions(0);
        select_region(&mut frame, SelectMove::Next);
        assert_eq!(frame.selected, None);
    }

    #[test]
    fn test_move_fine_steps_one_grid_cell() {
        let mut frame = frame_with_regions(1);
        let before = frame.regions[0].xf0;
        assert!(move_fine(&mut frame, RegionAxis::X, true));
        let step = 1.0 / frame.width as f32;
        assert!((frame.regions[0].xf0 - before - step).abs() < 1e-6);
    }

    #[test]
    fn test_nudge_without_selection_reports_failure() {
        let mut frame = frame_with_regions(1);
        frame.selected = None;
        assert!(!move_coarse(&mut frame, RegionAxis::Y, true));
    }

    #[test]
    fn test_coarse_nudge_clamps_at_frame_edge() {
        let mut frame = frame_with_regions(0);
        add_region(&mut frame, 0.95, 0.5, 0.05, 0.2);
        move_coarse(&mut frame, RegionAxis::X, true);
        let region = &frame.regions[0];
        assert!(region.xf0 + region.dxf <= 1.0 + 1e-6);
    }

    #[test]
    fn test_assign_overwrites_rect() {
        let mut frame = frame_with_regions(1);
        assign_region(&mut frame, 0, 0.5, 0.5, 0.25, 0.25);
        assert!((frame.regions[0].xf0 - 0.5).abs() < 1e-6);
        assert!((frame.regions[0].dxf - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_delete_reindexes_and_clamps_selection() {
        let mut frame = frame_with_regions(3);
        assert!(delete_regions(&mut frame, DeleteTarget::Index(1)));
        assert_eq!(frame.regions.len(), 2);
        assert_eq!(frame.regions[0].index, 0);
        assert_eq!(frame.regions[1].index, 1);
        // Selection was 2, past the new end.
        assert_eq!(frame.selected, Some(1));
        assert_eq!(frame.prev_selected, 0);
    }

    #[test]
    fn test_delete_all_clears_selection() {
        let mut frame = frame_with_regions(2);
        assert!(delete_regions(&mut frame, DeleteTarget::All));
        assert!(frame.regions.is_empty());
        assert_eq!(frame.selected, None);
    }

    #[test]
    fn test_delete_selected_without_selection_fails() {
        let mut frame = frame_with_regions(1);
        frame.selected = None;
        assert!(!delete_regions(&mut frame, DeleteTarget::Selected));
        assert_eq!(frame.regions.len(), 1);
    }

    #[test]
    fn test_limits_clamp_to_grid_cap() {
        let mut frame = frame_with_regions(0);
        let mut config = MotionConfig::default();
        let cap = (frame.width * frame.height) as i32 / 2;
        set_limits(&mut config, &frame, 500, 100_000);
        assert_eq!(config.magnitude_limit, 120);
        assert_eq!(config.magnitude_limit_count, cap);
        set_limits(&mut config, &frame, 1, 0);
        assert_eq!(config.magnitude_limit, 3);
        assert_eq!(config.magnitude_limit_count, 2);
    }

    #[test]
    fn test_burst_clamps() {
        let mut frame = frame_with_regions(0);
        let mut config = MotionConfig::default();
        set_burst(&mut config, &frame, 5, 100);
        assert_eq!(config.burst_count, 20);
        assert_eq!(config.burst_frames, 20);
        set_burst(&mut config, &frame, 100_000, 1);
        assert_eq!(config.burst_count, (frame.width * frame.height) as i32 / 2);
        assert_eq!(config.burst_frames, 2);
    }

    proptest! {
        // Indices match store positions through any delete sequence.
        #[test]
        fn prop_indices_stay_contiguous(
            initial in 1usize..8,
            deletes in proptest::collection::vec(0usize..8, 0..8),
        ) {
            let mut frame = frame_with_regions(initial);
            for target in deletes {
                delete_regions(&mut frame, DeleteTarget::Index(target));
                for (i, region) in frame.regions.iter().enumerate() {
                    prop_assert_eq!(region.index, i);
                }
                if let Some(sel) = frame.selected {
                    prop_assert!(sel < frame.regions.len());
                }
            }
        }
    }
}

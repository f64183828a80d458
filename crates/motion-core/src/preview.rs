//! Map a staged detection onto a crop rectangle in the mjpeg preview
//! stream.
//!
//! The frame composite's box comes from vector density counts and tends
//! to under-frame the motion, while the motion area can include spurious
//! vectors outside the motion of interest. The crop starts from the
//! composite box and grows toward the motion area edges, horizontal
//! deficits at one third weight and vertical deficits at full weight.

use vigilcam_common::config::CameraConfig;
use vigilcam_model::{CompositeVector, MotionArea};

/// Crop rectangle in mjpeg pixel coordinates, center plus size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewCrop {
    pub cx: i32,
    pub cy: i32,
    pub width: i32,
    pub height: i32,
}

impl PreviewCrop {
    pub fn left(&self) -> i32 {
        self.cx - self.width / 2
    }

    pub fn top(&self) -> i32 {
        self.cy - self.height / 2
    }
}

fn to_mjpeg(v: i32, mjpeg_dim: u32, grid_dim: usize) -> i32 {
    v * mjpeg_dim as i32 / grid_dim as i32
}

/// Compute the preview crop for a staged frame vector and motion area.
///
/// Coordinates come in as grid units and go out as mjpeg pixels. Returns
/// `None` until a video resolution has been configured.
pub fn frame_preview_crop(
    staged_vector: &CompositeVector,
    staged_area: &MotionArea,
    grid_w: usize,
    grid_h: usize,
    camera: &CameraConfig,
    area_min_side: i32,
) -> Option<PreviewCrop> {
    if grid_w == 0 || grid_h == 0 {
        return None;
    }
    let mjpeg_w = camera.mjpeg_width as i32;
    let mjpeg_h = camera.mjpeg_height as i32;

    let x0 = to_mjpeg(staged_area.x0, camera.mjpeg_width, grid_w);
    let y0 = to_mjpeg(staged_area.y0, camera.mjpeg_height, grid_h);
    let x1 = to_mjpeg(staged_area.x1, camera.mjpeg_width, grid_w);
    let y1 = to_mjpeg(staged_area.y1, camera.mjpeg_height, grid_h);

    let mut x = to_mjpeg(staged_vector.x, camera.mjpeg_width, grid_w);
    let mut y = to_mjpeg(staged_vector.y, camera.mjpeg_height, grid_h);
    let mut dx = to_mjpeg(staged_vector.box_w, camera.mjpeg_width, grid_w);
    let mut dy = to_mjpeg(staged_vector.box_h, camera.mjpeg_height, grid_h);

    let d = x + dx / 2;
    if d < x1 {
        dx += (x1 - d) / 3;
    }
    let d = x - dx / 2;
    if d > x0 {
        dx += (d - x0) / 3;
    }
    let d = y - dy / 2;
    if d > y0 {
        dy += d - y0;
    }
    let d = y + dy / 2;
    if d < y1 {
        dy += y1 - d;
    }
    if dx < area_min_side {
        dx = area_min_side;
    }
    if dy < area_min_side {
        dy = area_min_side;
    }

    // Faster objects lag in the camera video path; shift the crop back
    // along the motion direction so they stay framed.
    let sign = if staged_vector.vx >= 0 { -1 } else { 1 };
    let d = staged_vector.vx.abs() - 5;
    if d > 0 {
        x += sign * 8 * d / 10;
    }
    if x + dx / 2 >= mjpeg_w {
        x = mjpeg_w - dx / 2 - 1;
    }
    if x - dx / 2 < 0 {
        x = dx / 2 + 1;
    }

    let sign = if staged_vector.vy >= 0 { -1 } else { 1 };
    let d = staged_vector.vy.abs() - 5;
    if d > 0 {
        y += sign * 8 * d / 10;
    }
    if y + dy / 2 >= mjpeg_h {
        y = mjpeg_h - dy / 2 - 1;
    }
    if y - dy / 2 < 0 {
        y = dy / 2 + 1;
    }

    Some(PreviewCrop {
        cx: x,
        cy: y,
        width: dx,
        height: dy,
    })
}

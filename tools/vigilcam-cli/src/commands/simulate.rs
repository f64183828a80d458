//! Drive a detection session with a synthetic moving object.

use std::sync::Arc;
use std::time::Instant;

use vigilcam_common::config::AppConfig;
use vigilcam_common::error::VigilResult;
use vigilcam_engine::{MotionSession, OperatorNotify, RecordingControl};
use vigilcam_model::{grid_dims, MotionVector, VectorGrid};
use vigilcam_motion::PreviewCrop;

/// Recording collaborator that narrates to stdout.
struct PrintControl;

impl RecordingControl for PrintControl {
    fn start(&mut self, _stop_deadline: Instant) -> VigilResult<()> {
        println!(">>> motion record start");
        Ok(())
    }

    fn extend(&mut self, _stop_deadline: Instant) -> VigilResult<()> {
        println!("  > motion record extend");
        Ok(())
    }

    fn save_preview(&mut self, crop: PreviewCrop) -> VigilResult<()> {
        println!(
            "  > preview crop {}x{} at ({}, {})",
            crop.width,
            crop.height,
            crop.left(),
            crop.top()
        );
        Ok(())
    }
}

struct PrintNotify;

impl OperatorNotify for PrintNotify {
    fn inform(&mut self, message: &str) {
        println!("[osd] {message}");
    }
}

pub async fn run(
    mut config: AppConfig,
    frames: u32,
    object_size: usize,
    speed: i16,
    regions: Option<String>,
    stats: bool,
) -> anyhow::Result<()> {
    config.motion.stats = stats;
    let (grid_w, grid_h) = grid_dims(config.camera.video_width, config.camera.video_height);
    println!("Simulating {frames} frames on a {grid_w}x{grid_h} vector grid");

    let session = Arc::new(MotionSession::new(
        config.clone(),
        Box::new(PrintControl),
        Box::new(PrintNotify),
    )?);
    session.force_settled();

    match regions {
        Some(name) => session.handle_command_line(&format!("load_regions {name}")),
        None => session.handle_command_line("add_region 0.0 0.0 1.0 1.0"),
    }
    if session.region_count() == 0 {
        anyhow::bail!("No motion regions to detect in");
    }

    let mut detects = 0u32;
    for frame in 0..frames {
        let grid = synthetic_frame(grid_w, grid_h, frame, object_size, speed);
        let status = session.process_frame(&grid)?;
        if status.detected || status.pending {
            println!("frame {frame:4}  {}", status.label());
        }
        if status.detected {
            detects += 1;
        }
    }

    println!(
        "Done: {detects} detected frames out of {frames} ({} regions)",
        session.region_count()
    );
    Ok(())
}

/// A square cluster sweeping left to right, re-entering on wrap.
fn synthetic_frame(
    grid_w: usize,
    grid_h: usize,
    frame: u32,
    object_size: usize,
    speed: i16,
) -> VectorGrid {
    let mut grid = VectorGrid::new(grid_w, grid_h);
    if grid_w < 3 || grid_h < 3 {
        return grid;
    }
    let x0 = 1 + (frame as usize % grid_w.saturating_sub(object_size + 1).max(1));
    let y0 = grid_h / 2;
    for dy in 0..object_size {
        for dx in 0..object_size {
            let x = x0 + dx;
            let y = y0 + dy;
            if x < grid_w && y < grid_h {
                grid.set(x, y, MotionVector::new(speed, 0));
            }
        }
    }
    grid
}

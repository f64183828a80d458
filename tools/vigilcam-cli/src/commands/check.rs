//! Check configuration and derived detector geometry.

use vigilcam_common::config::AppConfig;
use vigilcam_model::grid_dims;

pub fn run(config: AppConfig) -> anyhow::Result<()> {
    println!("VigilCam Configuration Check");
    println!("{}", "=".repeat(50));

    let camera = &config.camera;
    println!(
        "[OK] Video: {}x{} @ {} fps",
        camera.video_width, camera.video_height, camera.video_fps
    );
    println!(
        "[OK] Preview: {}x{} (divider {})",
        camera.mjpeg_width, camera.mjpeg_height, camera.mjpeg_divider
    );

    let (grid_w, grid_h) = grid_dims(camera.video_width, camera.video_height);
    println!("[OK] Vector grid: {grid_w}x{grid_h} ({} cells)", grid_w * grid_h);

    let motion = &config.motion;
    println!(
        "[{}] Motion detection: magnitude {} (mag2 {}), count {}",
        if motion.enable { "OK" } else { "OFF" },
        motion.magnitude_limit,
        motion.mag2_limit(),
        motion.magnitude_limit_count
    );
    println!(
        "[OK] Burst: count {} over {} frames",
        motion.burst_count, motion.burst_frames
    );
    if motion.confirm_gap_secs > 0 {
        let window = camera.video_fps * motion.confirm_gap_secs / camera.mjpeg_divider.max(1);
        println!(
            "[OK] Confirm gap: {}s ({} preview frames)",
            motion.confirm_gap_secs, window
        );
    } else {
        println!("[OK] Confirm gap: disabled, detects fire immediately");
    }

    let cap = (grid_w * grid_h) as i32 / 2;
    if motion.magnitude_limit_count > cap {
        println!(
            "[WARN] magnitude_limit_count {} exceeds grid cap {cap}",
            motion.magnitude_limit_count
        );
    }
    if motion.burst_count > cap {
        println!("[WARN] burst_count {} exceeds grid cap {cap}", motion.burst_count);
    }

    println!("[OK] Config dir: {}", config.config_dir.display());
    if config.config_dir.is_dir() {
        let profiles = vigilcam_engine::persist::list_regions(&config.config_dir)?;
        println!("[OK] Region profiles: {}", profiles.len());
    } else {
        println!("[WARN] Config dir does not exist yet");
    }

    Ok(())
}

//! Inspect persisted region profiles.

use vigilcam_common::config::AppConfig;
use vigilcam_engine::persist;
use vigilcam_model::{grid_dims, MotionRegion, RegionCommand};

pub fn run(config: AppConfig, name: Option<String>) -> anyhow::Result<()> {
    match name {
        None => {
            let profiles = persist::list_regions(&config.config_dir)?;
            if profiles.is_empty() {
                println!("No region profiles in {}", config.config_dir.display());
            } else {
                println!("Region profiles in {}:", config.config_dir.display());
                for profile in profiles {
                    println!("  {profile}");
                }
            }
        }
        Some(name) => {
            let lines = persist::read_regions(&config.config_dir, &name)?;
            let (grid_w, grid_h) =
                grid_dims(config.camera.video_width, config.camera.video_height);
            println!(
                "Profile {name} ({} grid {grid_w}x{grid_h}):",
                persist::profile_file_name(&name)
            );

            let mut valid = 0usize;
            for (lineno, line) in lines.iter().enumerate() {
                if line.trim().is_empty() || line.trim_start().starts_with('#') {
                    continue;
                }
                match RegionCommand::parse(line) {
                    Some(RegionCommand::AddRegion { xf0, yf0, dxf, dyf }) => {
                        let mut region = MotionRegion::from_normalized(xf0, yf0, dxf, dyf);
                        region.fixup(grid_w, grid_h);
                        println!(
                            "  region {valid}: rect ({:.3}, {:.3}) {:.3}x{:.3} -> cells ({}, {}) {}x{}",
                            region.xf0,
                            region.yf0,
                            region.dxf,
                            region.dyf,
                            region.x,
                            region.y,
                            region.dx,
                            region.dy
                        );
                        valid += 1;
                    }
                    Some(_) => println!("  line {}: non-region command", lineno + 1),
                    None => println!("  line {}: INVALID: {line}", lineno + 1),
                }
            }
            println!("{valid} regions");
        }
    }
    Ok(())
}

//! Region profile persistence.
//!
//! A profile is a plain text file of `add_region` command lines in the
//! config directory. The unnamed/default profile is `motion-regions`,
//! named profiles are `motion-regions-<name>`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use vigilcam_common::error::{VigilError, VigilResult};
use vigilcam_model::MotionRegion;

const PROFILE_PREFIX: &str = "motion-regions";

/// File name for a profile. Empty or "default" maps to the unnamed
/// profile.
pub fn profile_file_name(profile: &str) -> String {
    if profile.is_empty() || profile == "default" {
        PROFILE_PREFIX.to_string()
    } else {
        format!("{PROFILE_PREFIX}-{profile}")
    }
}

/// Profile name recovered from a file name, extension stripped.
pub fn profile_from_file_name(file_name: &str) -> String {
    let base = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    };
    match base.strip_prefix("motion-regions-") {
        Some(name) => name.to_string(),
        None => "default".to_string(),
    }
}

/// Full path for a profile in the config directory.
pub fn profile_path(config_dir: &Path, profile: &str) -> PathBuf {
    config_dir.join(profile_file_name(profile))
}

/// Write the regions as replayable `add_region` lines.
pub fn save_regions(
    regions: &[MotionRegion],
    config_dir: &Path,
    profile: &str,
) -> VigilResult<PathBuf> {
    let path = profile_path(config_dir, profile);
    fs::create_dir_all(config_dir)?;
    let mut file = fs::File::create(&path).map_err(|e| {
        VigilError::region(format!("Failed to save regions to {}: {e}", path.display()))
    })?;
    for region in regions {
        writeln!(
            file,
            "add_region {:.3} {:.3} {:.3} {:.3}",
            region.xf0, region.yf0, region.dxf, region.dyf
        )?;
    }
    tracing::info!(path = %path.display(), regions = regions.len(), "Saved motion regions");
    Ok(path)
}

/// Read a profile's command lines.
pub fn read_regions(config_dir: &Path, profile: &str) -> VigilResult<Vec<String>> {
    let path = profile_path(config_dir, profile);
    let text = fs::read_to_string(&path).map_err(|e| {
        VigilError::region(format!(
            "Failed to open motion regions file {}: {e}",
            path.display()
        ))
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Profile names of every persisted region file in the config directory.
pub fn list_regions(config_dir: &Path) -> VigilResult<Vec<String>> {
    let mut profiles = Vec::new();
    for entry in fs::read_dir(config_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(PROFILE_PREFIX) {
            profiles.push(profile_from_file_name(name));
        }
    }
    profiles.sort();
    Ok(profiles)
}

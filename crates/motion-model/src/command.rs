//! Typed region-editing commands.
//!
//! Commands arrive from the operator control channel as whitespace
//! separated tokens. The parsing stage here turns a token line into a
//! fully validated [`RegionCommand`] or nothing at all: wrong argument
//! count, an unknown command word, or an out-of-range numeric argument
//! rejects the whole line before any mutation can happen.

use std::str::FromStr;

/// Which normalized rectangle field a move command adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionAxis {
    X,
    Y,
    Dx,
    Dy,
}

impl RegionAxis {
    /// True for axes measured along the grid width.
    pub fn horizontal(&self) -> bool {
        matches!(self, RegionAxis::X | RegionAxis::Dx)
    }
}

impl FromStr for RegionAxis {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "x" => Ok(RegionAxis::X),
            "y" => Ok(RegionAxis::Y),
            "dx" => Ok(RegionAxis::Dx),
            "dy" => Ok(RegionAxis::Dy),
            _ => Err(()),
        }
    }
}

/// Selection movement for `select_region`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMove {
    Previous,
    Next,
    Last,
}

/// Target of a `delete_regions` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    All,
    Selected,
    Index(usize),
}

/// A validated region-editing command.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionCommand {
    /// Toggle region outlines on the preview display.
    ShowRegions(bool),

    /// Toggle motion vector overlay on the preview display.
    ShowVectors(bool),

    /// Append a region; fractions in `[0, 1]`. The new region becomes
    /// the selection.
    AddRegion { xf0: f32, yf0: f32, dxf: f32, dyf: f32 },

    /// Apply relative deltas in `[-1, 1]` to the region at `index`.
    MoveRegion { index: usize, dxf0: f32, dyf0: f32, ddxf: f32, ddyf: f32 },

    /// Nudge one axis of the selected region by the coarse step (0.1).
    MoveCoarse { axis: RegionAxis, positive: bool },

    /// Nudge one axis of the selected region by one grid cell.
    MoveFine { axis: RegionAxis, positive: bool },

    /// Overwrite the rectangle of the region at `index`; fractions in
    /// `[0, 1]`.
    AssignRegion { index: usize, xf0: f32, yf0: f32, dxf: f32, dyf: f32 },

    /// Move the selection.
    SelectRegion(SelectMove),

    /// Persist regions under a profile name.
    SaveRegions(String),

    /// Load regions from a profile, optionally turning the display on.
    LoadRegions { name: String, show: bool },

    /// List persisted region profiles to the operator display.
    ListRegions,

    /// Delete one region or all of them.
    DeleteRegions(DeleteTarget),

    /// Set magnitude/count detection limits (clamped on apply).
    SetLimits { magnitude: i32, count: i32 },

    /// Set burst count/frames thresholds (clamped on apply).
    SetBurst { count: i32, frames: i32 },
}

impl RegionCommand {
    /// Parse one command line. Returns `None` for anything malformed;
    /// a leading `#` marks a comment line.
    pub fn parse(line: &str) -> Option<RegionCommand> {
        let mut tokens = line.split_whitespace();
        let word = tokens.next()?;
        if word.starts_with('#') {
            return None;
        }
        let args: Vec<&str> = tokens.collect();

        let cmd = match (word, args.as_slice()) {
            ("show_regions", [flag]) => RegionCommand::ShowRegions(parse_bool(flag)?),
            ("show_vectors", [flag]) => RegionCommand::ShowVectors(parse_bool(flag)?),
            ("add_region", [x, y, dx, dy]) => RegionCommand::AddRegion {
                xf0: parse_fraction(x, 0.0, 1.0)?,
                yf0: parse_fraction(y, 0.0, 1.0)?,
                dxf: parse_fraction(dx, 0.0, 1.0)?,
                dyf: parse_fraction(dy, 0.0, 1.0)?,
            },
            ("move_region", [r, x, y, dx, dy]) => RegionCommand::MoveRegion {
                index: r.parse().ok()?,
                dxf0: parse_fraction(x, -1.0, 1.0)?,
                dyf0: parse_fraction(y, -1.0, 1.0)?,
                ddxf: parse_fraction(dx, -1.0, 1.0)?,
                ddyf: parse_fraction(dy, -1.0, 1.0)?,
            },
            ("move_coarse", [axis, dir]) => RegionCommand::MoveCoarse {
                axis: axis.parse().ok()?,
                positive: parse_direction(dir)?,
            },
            ("move_fine", [axis, dir]) => RegionCommand::MoveFine {
                axis: axis.parse().ok()?,
                positive: parse_direction(dir)?,
            },
            ("assign_region", [r, x, y, dx, dy]) => RegionCommand::AssignRegion {
                index: r.parse().ok()?,
                xf0: parse_fraction(x, 0.0, 1.0)?,
                yf0: parse_fraction(y, 0.0, 1.0)?,
                dxf: parse_fraction(dx, 0.0, 1.0)?,
                dyf: parse_fraction(dy, 0.0, 1.0)?,
            },
            ("select_region", [which]) => RegionCommand::SelectRegion(match *which {
                "last" => SelectMove::Last,
                "<" => SelectMove::Previous,
                ">" => SelectMove::Next,
                _ => return None,
            }),
            ("save_regions", [name]) => RegionCommand::SaveRegions((*name).to_string()),
            ("load_regions", [name]) => RegionCommand::LoadRegions {
                name: (*name).to_string(),
                show: false,
            },
            ("load_regions_show", [name]) => RegionCommand::LoadRegions {
                name: (*name).to_string(),
                show: true,
            },
            ("list_regions", []) => RegionCommand::ListRegions,
            ("delete_regions", [target]) => RegionCommand::DeleteRegions(match *target {
                "all" => DeleteTarget::All,
                "selected" => DeleteTarget::Selected,
                other => DeleteTarget::Index(other.parse().ok()?),
            }),
            ("limits", [magnitude, count]) => RegionCommand::SetLimits {
                magnitude: magnitude.parse().ok()?,
                count: count.parse().ok()?,
            },
            ("burst", [count, frames]) => RegionCommand::SetBurst {
                count: count.parse().ok()?,
                frames: frames.parse().ok()?,
            },
            _ => return None,
        };
        Some(cmd)
    }
}

/// Parse a float and require it to lie in `[low, high]`.
fn parse_fraction(token: &str, low: f32, high: f32) -> Option<f32> {
    let value: f32 = token.parse().ok()?;
    (value >= low && value <= high).then_some(value)
}

fn parse_bool(token: &str) -> Option<bool> {
    match token {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// `+`/`p` grow, `-`/`m` shrink.
fn parse_direction(token: &str) -> Option<bool> {
    match token {
        "+" | "p" => Some(true),
        "-" | "m" => Some(false),
        _ => None,
    }
}

//! VigilCam Data Model
//!
//! Defines the core data contracts for motion detection:
//! - **Grids:** Bounds-checked per-macroblock vector and trigger grids
//! - **Vectors:** Composite vectors and motion bounding areas
//! - **Regions:** Normalized detection rectangles and their pixel derivation
//! - **Commands:** Typed region-editing commands with a token parsing stage
//!
//! Detection region rectangles are normalized to `[0.0, 1.0]` so they
//! survive video resolution changes; pixel rectangles are always derived,
//! never stored independently.

pub mod command;
pub mod grid;
pub mod region;
pub mod status;
pub mod vector;

pub use command::*;
pub use grid::*;
pub use region::*;
pub use status::*;
pub use vector::*;

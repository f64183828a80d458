//! VigilCam Motion Core
//!
//! Frame-by-frame motion classification from the encoder's macroblock
//! vector grid:
//! - **Classifier:** per-region vector clustering, sparkle rejection,
//!   and direction filtering
//! - **Aggregate:** frame-level composite vector and density box
//! - **Noise:** adaptive background/sparkle floors and burst counting
//! - **Detect:** the pending/burst/detected state machine
//! - **Preview:** grid-to-pixel crop box computation for saved previews
//!
//! This crate is pure computation with no I/O, clocks, or locking.
//! All inputs are data; all outputs are data. The engine crate owns the
//! session lock and turns [`detect::RecordAction`]s into collaborator
//! calls.

pub mod aggregate;
pub mod classifier;
pub mod detect;
pub mod frame;
pub mod noise;
pub mod pipeline;
pub mod preview;

pub use detect::{FrameDecision, RecordAction, RecordingState};
pub use frame::MotionFrame;
pub use pipeline::process_frame;
pub use preview::{frame_preview_crop, PreviewCrop};

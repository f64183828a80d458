//! VigilCam Engine
//!
//! The session layer around the motion classification core: region
//! store mutation, region persistence, per-frame stats output, and the
//! recording-control collaborator interface. One session owns one
//! camera's motion state behind a single mutex; commands arrive over an
//! async channel and are serialized by the same lock the frame path
//! takes.

pub mod persist;
pub mod session;
pub mod stats;
pub mod store;

pub use session::{MotionSession, OperatorNotify, RecordingControl, SessionHandle};
pub use stats::StatsWriter;

//! VigilCam Common Utilities
//!
//! Shared infrastructure for all VigilCam crates:
//! - Error types and result aliases
//! - Session clock for recording timing decisions
//! - Tracing/logging initialization
//! - Detection and camera configuration

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;

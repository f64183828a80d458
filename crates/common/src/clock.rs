//! Session clock for recording-timing decisions.
//!
//! Detection side effects are timed against a monotonic epoch captured
//! when the camera session starts: the startup settle window, the
//! last-detect timestamp, and the scheduled recording stop time all use
//! it. Wall-clock time is kept only for log annotation.

use std::time::{Duration, Instant};

/// Monotonic clock anchored at camera session start.
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant the session started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Seconds elapsed since session start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Current monotonic instant.
    pub fn now(&self) -> Instant {
        Instant::now()
    }

    /// An instant `secs` seconds from now, for scheduling a recording stop.
    pub fn deadline_in(&self, secs: u32) -> Instant {
        Instant::now() + Duration::from_secs(u64::from(secs))
    }

    /// True once the camera settle window has passed. Motion vectors are
    /// garbage while the sensor AGC settles after startup.
    pub fn settled(&self, settle_secs: u64) -> bool {
        self.epoch.elapsed() >= Duration::from_secs(settle_secs)
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

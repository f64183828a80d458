//! Frame-level motion status signal.

use serde::{Deserialize, Serialize};

/// The per-frame motion decision consumed by recording control.
///
/// `detected` is further tagged with the trigger kind: `vector` for a
/// direction-confirmed composite, `burst` for sustained activity volume.
/// Both can be set on the same frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionStatus {
    /// A vector detect is waiting out the confirm window.
    pub pending: bool,

    /// Motion detected this frame.
    pub detected: bool,

    /// Detected via directional composite vector.
    pub vector: bool,

    /// Detected via burst activity.
    pub burst: bool,
}

impl MotionStatus {
    pub const NONE: MotionStatus = MotionStatus {
        pending: false,
        detected: false,
        vector: false,
        burst: false,
    };

    pub fn detected_vector() -> Self {
        MotionStatus {
            detected: true,
            vector: true,
            ..Self::NONE
        }
    }

    pub fn pending() -> Self {
        MotionStatus {
            pending: true,
            ..Self::NONE
        }
    }

    /// Fold a burst trigger into this status, overriding any pending state.
    pub fn apply_burst(&mut self) {
        self.pending = false;
        self.detected = true;
        self.burst = true;
    }

    /// Short human-readable tag for logs and stats output.
    pub fn label(&self) -> &'static str {
        match (self.vector, self.burst, self.pending) {
            (true, true, _) => "motion both",
            (true, false, _) => "motion vector",
            (false, true, _) => "motion burst",
            (false, false, true) => "motion pending",
            _ => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_overrides_pending() {
        let mut status = MotionStatus::pending();
        status.apply_burst();
        assert!(!status.pending);
        assert!(status.detected);
        assert!(status.burst);
        assert!(!status.vector);
    }

    #[test]
    fn test_labels() {
        assert_eq!(MotionStatus::NONE.label(), "none");
        assert_eq!(MotionStatus::pending().label(), "motion pending");
        let mut both = MotionStatus::detected_vector();
        both.apply_burst();
        assert_eq!(both.label(), "motion both");
    }
}

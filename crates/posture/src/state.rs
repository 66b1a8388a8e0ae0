//! Detector state tracking

use alerting::WarningGate;
use landmarks::{Point, Side};
use serde::{Deserialize, Serialize};

use crate::analysis::BodyLanguage;
use crate::config::PostureConfig;

/// Debounce/latch state shared by every detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorState {
    /// Consecutive frames the condition has held
    pub stable_frames: u32,

    /// Latched while the condition persists after firing
    pub active: bool,

    /// Frame timestamp of the last firing
    pub last_triggered_ns: Option<u64>,

    /// Lifetime number of firings
    pub trigger_count: u32,
}

impl DetectorState {
    /// Feed one frame's condition. Returns true on the frame the detector fires.
    ///
    /// Firing requires `required` consecutive true frames while unlatched; a
    /// single false frame clears both the counter and the latch.
    pub fn observe(&mut self, condition: bool, required: u32, timestamp_ns: u64) -> bool {
        if !condition {
            self.release();
            return false;
        }

        self.stable_frames = self.stable_frames.saturating_add(1);
        if self.stable_frames >= required && !self.active {
            self.active = true;
            self.trigger_count += 1;
            self.last_triggered_ns = Some(timestamp_ns);
            return true;
        }
        false
    }

    /// Clear the counter and latch, keeping lifetime bookkeeping
    pub fn release(&mut self) {
        self.stable_frames = 0;
        self.active = false;
    }
}

/// Wrist motion tracking for the hand-idle detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandTracker {
    pub previous_left: Option<Point>,
    pub previous_right: Option<Point>,
    pub previous_timestamp_ns: Option<u64>,

    /// Current gesturing status
    pub body_language: BodyLanguage,

    /// Consecutive non-gesturing frames (release debounce)
    pub still_frames: u32,

    /// Last frame with wrist movement above the idle epsilon
    pub last_movement_ns: Option<u64>,

    /// Idle-hand latch and lifetime count
    pub idle: DetectorState,
}

impl HandTracker {
    /// Forget motion history; idle bookkeeping is kept
    pub fn forget_motion(&mut self) {
        self.previous_left = None;
        self.previous_right = None;
        self.previous_timestamp_ns = None;
        self.still_frames = 0;
    }
}

/// Complete engine state carried from one frame to the next
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub arms_crossed: DetectorState,
    pub hand_on_neck: DetectorState,
    pub head: DetectorState,
    pub hands: HandTracker,

    /// Hand that triggered the current hand-on-neck latch
    pub neck_side: Option<Side>,

    /// A face has been observed at least once
    pub face_seen: bool,

    /// Eye visibility from the last face that reported it
    pub eyes_visible: Option<bool>,

    /// Cooldowns for repeated warnings
    pub warnings: WarningGate,

    /// Timestamp of the last processed frame
    pub last_timestamp_ns: Option<u64>,

    pub frames_processed: u64,
}

impl EngineState {
    /// Fresh state for a session using `config`
    pub fn new(config: &PostureConfig) -> Self {
        Self {
            warnings: WarningGate::new(config.warning_config()),
            ..Default::default()
        }
    }
}

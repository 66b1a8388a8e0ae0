//! Posture engine configuration
//!
//! Every threshold the detectors use lives here as a named value. Distances
//! are in normalized image units, angles in radians.

use alerting::WarningConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::PostureError;

/// What a joint-based detector does when its required joints are missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingJointPolicy {
    /// Leave detector state untouched
    #[default]
    Hold,
    /// Treat the frame as a false frame (counter and latch cleared)
    Reset,
}

/// Posture engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// Joints reported below this confidence are ignored
    pub joint_confidence: f32,

    /// Consecutive frames before crossed arms count as an event
    pub arms_crossed_stable_frames: u32,

    /// Max wrist-to-neck distance for a hand on the neck (normalized units)
    pub neck_distance: f64,

    /// Min vertical elbow-to-wrist span for a raised hand (normalized units)
    pub elbow_bend: f64,

    /// Consecutive frames before a hand on the neck counts as an event
    pub required_stable_frames: u32,

    /// Pitch or yaw beyond which the head is moving too much (radians)
    pub head_angle: f64,

    /// Consecutive frames before head movement counts as an event
    pub required_stable_head_frames: u32,

    /// Summed wrist displacement that counts as gesturing
    pub movement_threshold: f64,

    /// Wrist speed below which movement is "slow" (units per second)
    pub velocity_threshold: f64,

    /// Consecutive non-gesturing frames before body language is reported unused
    pub stable_movement_frames: u32,

    /// Per-wrist displacement below which the hand is resting
    pub idle_epsilon: f64,

    /// Resting time before the idle-hand warning (milliseconds)
    pub hand_rest_threshold_ms: u64,

    /// Minimum time between repeated warnings (milliseconds)
    pub warning_cooldown_ms: u64,

    /// Maximum warnings per minute
    pub max_warnings_per_minute: usize,

    pub missing_joint_policy: MissingJointPolicy,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            joint_confidence: 0.3,
            arms_crossed_stable_frames: 1,
            neck_distance: 0.1,
            elbow_bend: 0.1,
            required_stable_frames: 30,
            head_angle: 0.5,
            required_stable_head_frames: 30,
            movement_threshold: 0.03,
            velocity_threshold: 0.02,
            stable_movement_frames: 5,
            idle_epsilon: 0.02,
            hand_rest_threshold_ms: 5000,
            warning_cooldown_ms: 3000,
            max_warnings_per_minute: 30,
            missing_joint_policy: MissingJointPolicy::Hold,
        }
    }
}

impl PostureConfig {
    /// Create strict config (faster, more sensitive feedback)
    pub fn strict() -> Self {
        Self {
            required_stable_frames: 15,
            head_angle: 0.35,
            required_stable_head_frames: 15,
            hand_rest_threshold_ms: 3000,
            warning_cooldown_ms: 2000,
            ..Default::default()
        }
    }

    /// Create lenient config (slower, less sensitive feedback)
    pub fn lenient() -> Self {
        Self {
            required_stable_frames: 45,
            head_angle: 0.7,
            required_stable_head_frames: 45,
            hand_rest_threshold_ms: 8000,
            warning_cooldown_ms: 5000,
            ..Default::default()
        }
    }

    /// Load from a file (TOML, JSON, ...) with `PRZNT__*` environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PostureError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()))
            .add_source(
                ::config::Environment::with_prefix("PRZNT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PostureError::Config(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| PostureError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every threshold
    pub fn validate(&self) -> Result<(), PostureError> {
        if !(0.0..=1.0).contains(&self.joint_confidence) {
            return Err(invalid("joint_confidence", "must be within 0..=1"));
        }

        let frame_counts = [
            ("arms_crossed_stable_frames", self.arms_crossed_stable_frames),
            ("required_stable_frames", self.required_stable_frames),
            ("required_stable_head_frames", self.required_stable_head_frames),
            ("stable_movement_frames", self.stable_movement_frames),
        ];
        for (field, value) in frame_counts {
            if value == 0 {
                return Err(invalid(field, "must be at least 1 frame"));
            }
        }

        let distances = [
            ("neck_distance", self.neck_distance),
            ("elbow_bend", self.elbow_bend),
            ("head_angle", self.head_angle),
            ("movement_threshold", self.movement_threshold),
            ("velocity_threshold", self.velocity_threshold),
            ("idle_epsilon", self.idle_epsilon),
        ];
        for (field, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "must be a non-negative number"));
            }
        }

        if self.max_warnings_per_minute == 0 {
            return Err(invalid("max_warnings_per_minute", "must allow at least 1 warning"));
        }

        if self.hand_rest_threshold_ms == 0 {
            return Err(invalid("hand_rest_threshold_ms", "must be positive"));
        }

        Ok(())
    }

    /// Warning gate settings derived from this config
    pub fn warning_config(&self) -> WarningConfig {
        WarningConfig {
            cooldown_ms: self.warning_cooldown_ms,
            max_warnings_per_minute: self.max_warnings_per_minute,
        }
    }

    pub(crate) fn hand_rest_threshold_ns(&self) -> u64 {
        self.hand_rest_threshold_ms.saturating_mul(1_000_000)
    }
}

fn invalid(field: &'static str, reason: &str) -> PostureError {
    PostureError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}

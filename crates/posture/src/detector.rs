//! Per-frame posture conditions
//!
//! Each detector answers one geometric question about a single frame. They
//! hold only thresholds; debounce and latching live in [`crate::state`].

use landmarks::{Frame, Joint, Point, Side};
use serde::{Deserialize, Serialize};

use crate::config::PostureConfig;
use crate::state::HandTracker;

/// Slack when comparing a wrist displacement against `idle_epsilon`, so a
/// move of exactly the epsilon in decimal coordinates counts as movement
const EPSILON_SLACK: f64 = 1e-9;

/// Estimate a wrist by extending the shoulder→elbow vector past the elbow
pub fn estimate_wrist(elbow: Point, shoulder: Point) -> Point {
    elbow.translate(&elbow.offset_from(&shoulder))
}

/// Crossed-arms detector using elbow/shoulder geometry only
#[derive(Debug, Clone)]
pub struct ArmsCrossedDetector {
    confidence: f32,
}

impl ArmsCrossedDetector {
    pub fn new(config: &PostureConfig) -> Self {
        Self {
            confidence: config.joint_confidence,
        }
    }

    /// `None` when any elbow or shoulder is missing
    pub fn assess(&self, frame: &Frame) -> Option<bool> {
        let arm = |side: Side| -> Option<(Point, Point)> {
            let elbow = frame.observed(side.elbow(), self.confidence)?;
            let shoulder = frame.observed(side.shoulder(), self.confidence)?;
            Some((elbow, estimate_wrist(elbow, shoulder)))
        };
        let (left_elbow, left_wrist) = arm(Side::Left)?;
        let (right_elbow, right_wrist) = arm(Side::Right)?;

        // Estimated wrists end up on the opposite side of the body (an "X")
        Some(left_wrist.x > right_elbow.x && right_wrist.x < left_elbow.x)
    }

    pub fn evaluate(&self, frame: &Frame) -> bool {
        self.assess(frame).unwrap_or(false)
    }
}

/// Hand-on-neck reading for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeckReading {
    /// Neither side had wrist, elbow and neck observed
    Missing,
    /// At least one side observed, no contact
    Clear,
    /// Contact by this hand (right wins when both touch)
    Touching(Side),
}

/// Hand-on-neck detector
#[derive(Debug, Clone)]
pub struct HandOnNeckDetector {
    confidence: f32,
    neck_distance: f64,
    elbow_bend: f64,
}

impl HandOnNeckDetector {
    pub fn new(config: &PostureConfig) -> Self {
        Self {
            confidence: config.joint_confidence,
            neck_distance: config.neck_distance,
            elbow_bend: config.elbow_bend,
        }
    }

    /// Contact check for one side; `None` if that side is not observed
    pub fn side_touching(&self, frame: &Frame, side: Side) -> Option<bool> {
        let neck = frame.observed(Joint::Neck, self.confidence)?;
        let wrist = frame.observed(side.wrist(), self.confidence)?;
        let elbow = frame.observed(side.elbow(), self.confidence)?;

        let distance_to_neck = wrist.distance(&neck);
        let elbow_bend = (elbow.y - wrist.y).abs();

        Some(distance_to_neck < self.neck_distance && elbow_bend > self.elbow_bend)
    }

    pub fn assess(&self, frame: &Frame) -> NeckReading {
        let right = self.side_touching(frame, Side::Right);
        let left = self.side_touching(frame, Side::Left);

        match (right, left) {
            (None, None) => NeckReading::Missing,
            (Some(true), _) => NeckReading::Touching(Side::Right),
            (_, Some(true)) => NeckReading::Touching(Side::Left),
            _ => NeckReading::Clear,
        }
    }

    pub fn evaluate(&self, frame: &Frame) -> bool {
        matches!(self.assess(frame), NeckReading::Touching(_))
    }
}

/// Excess head movement from face pitch/yaw
#[derive(Debug, Clone)]
pub struct HeadStabilityDetector {
    head_angle: f64,
}

impl HeadStabilityDetector {
    pub fn new(config: &PostureConfig) -> Self {
        Self {
            head_angle: config.head_angle,
        }
    }

    /// `None` when no face was detected
    pub fn assess(&self, frame: &Frame) -> Option<bool> {
        let face = frame.face?;
        Some(face.pitch.abs() > self.head_angle || face.yaw.abs() > self.head_angle)
    }

    pub fn evaluate(&self, frame: &Frame) -> bool {
        self.assess(frame).unwrap_or(false)
    }
}

/// Wrist motion between the tracked previous frame and this one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WristMotion {
    pub left: Point,
    pub right: Point,
    pub left_displacement: f64,
    pub right_displacement: f64,
    /// Units per second; zero when no time has elapsed
    pub left_velocity: f64,
    pub right_velocity: f64,
}

impl WristMotion {
    pub fn total_displacement(&self) -> f64 {
        self.left_displacement + self.right_displacement
    }
}

/// Hand movement / idle detector
#[derive(Debug, Clone)]
pub struct HandIdleDetector {
    confidence: f32,
    movement_threshold: f64,
    velocity_threshold: f64,
    idle_epsilon: f64,
}

impl HandIdleDetector {
    pub fn new(config: &PostureConfig) -> Self {
        Self {
            confidence: config.joint_confidence,
            movement_threshold: config.movement_threshold,
            velocity_threshold: config.velocity_threshold,
            idle_epsilon: config.idle_epsilon,
        }
    }

    /// Measure wrist motion; `None` unless both wrists are observed
    pub fn measure(&self, frame: &Frame, tracker: &HandTracker) -> Option<WristMotion> {
        let left = frame.observed(Joint::LeftWrist, self.confidence)?;
        let right = frame.observed(Joint::RightWrist, self.confidence)?;

        let left_displacement = tracker.previous_left.map_or(0.0, |p| p.distance(&left));
        let right_displacement = tracker.previous_right.map_or(0.0, |p| p.distance(&right));

        let elapsed_secs = tracker
            .previous_timestamp_ns
            .map(|prev| frame.timestamp_ns.saturating_sub(prev) as f64 / 1_000_000_000.0)
            .unwrap_or(0.0);

        let velocity = |displacement: f64| {
            if elapsed_secs > 0.0 {
                displacement / elapsed_secs
            } else {
                0.0
            }
        };

        Some(WristMotion {
            left,
            right,
            left_displacement,
            right_displacement,
            left_velocity: velocity(left_displacement),
            right_velocity: velocity(right_displacement),
        })
    }

    /// Large enough, fast enough movement to count as gesturing
    pub fn is_gesturing(&self, motion: &WristMotion) -> bool {
        let slow = motion.left_velocity < self.velocity_threshold
            && motion.right_velocity < self.velocity_threshold;
        motion.total_displacement() > self.movement_threshold && !slow
    }

    /// Both wrists resting this frame
    pub fn is_still(&self, motion: &WristMotion) -> bool {
        let resting = |displacement: f64| displacement + EPSILON_SLACK < self.idle_epsilon;
        resting(motion.left_displacement) && resting(motion.right_displacement)
    }

    /// Whether both wrists are resting relative to the tracked previous frame
    pub fn evaluate(&self, frame: &Frame, tracker: &HandTracker) -> bool {
        self.measure(frame, tracker)
            .map(|m| self.is_still(&m))
            .unwrap_or(false)
    }
}

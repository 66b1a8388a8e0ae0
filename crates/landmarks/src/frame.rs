//! Landmark frame types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::joint::Joint;

/// Normalized image-space coordinate (0..1 on each axis)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Vector from `origin` to this point
    pub fn offset_from(&self, origin: &Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    /// Translate by a vector
    pub fn translate(&self, by: &Point) -> Point {
        Point::new(self.x + by.x, self.y + by.y)
    }
}

/// One joint observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub joint: Joint,
    pub position: Point,
    /// Model confidence (0-1)
    pub confidence: f32,
}

impl JointSample {
    pub fn new(joint: Joint, x: f64, y: f64, confidence: f32) -> Self {
        Self {
            joint,
            position: Point::new(x, y),
            confidence,
        }
    }
}

/// Face orientation (radians) and eye visibility
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceSample {
    /// Up-down tilt
    pub pitch: f64,
    /// Left-right rotation
    pub yaw: f64,
    /// Both eyes found among the face landmarks; `None` if not reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyes_visible: Option<bool>,
}

/// All landmarks observed in a single camera frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Capture timestamp (nanoseconds, monotonic within a session)
    pub timestamp_ns: u64,
    /// Joint samples keyed by joint; absent joints were not reported
    #[serde(with = "joint_list", default)]
    pub joints: BTreeMap<Joint, JointSample>,
    /// Face orientation, if a face was detected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceSample>,
}

impl Frame {
    /// Create an empty frame
    pub fn new(timestamp_ns: u64) -> Self {
        Self {
            timestamp_ns,
            joints: BTreeMap::new(),
            face: None,
        }
    }

    /// Builder: add a joint sample
    pub fn with_joint(mut self, joint: Joint, x: f64, y: f64, confidence: f32) -> Self {
        self.insert(JointSample::new(joint, x, y, confidence));
        self
    }

    /// Builder: attach a face sample
    pub fn with_face(mut self, pitch: f64, yaw: f64) -> Self {
        self.face = Some(FaceSample {
            pitch,
            yaw,
            eyes_visible: None,
        });
        self
    }

    /// Builder: attach a face sample with eye visibility
    pub fn with_face_eyes(mut self, pitch: f64, yaw: f64, eyes_visible: bool) -> Self {
        self.face = Some(FaceSample {
            pitch,
            yaw,
            eyes_visible: Some(eyes_visible),
        });
        self
    }

    /// Insert or replace a joint sample
    pub fn insert(&mut self, sample: JointSample) {
        self.joints.insert(sample.joint, sample);
    }

    /// Position of a joint if it was reported with at least `min_confidence`
    pub fn observed(&self, joint: Joint, min_confidence: f32) -> Option<Point> {
        self.joints
            .get(&joint)
            .filter(|s| s.confidence >= min_confidence)
            .map(|s| s.position)
    }
}

/// Joints travel as a list of samples; each sample already names its joint.
mod joint_list {
    use super::{Joint, JointSample};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(joints: &BTreeMap<Joint, JointSample>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(joints.values())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<Joint, JointSample>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let samples = Vec::<JointSample>::deserialize(deserializer)?;
        Ok(samples.into_iter().map(|s| (s.joint, s)).collect())
    }
}

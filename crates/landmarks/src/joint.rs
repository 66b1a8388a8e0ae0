//! Joint identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::LandmarkError;

/// Body joint reported by the pose model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Joint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    Neck,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    Root,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    /// All joints, in model output order
    pub const ALL: [Joint; 19] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::Neck,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::Root,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// camelCase name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEye => "leftEye",
            Joint::RightEye => "rightEye",
            Joint::LeftEar => "leftEar",
            Joint::RightEar => "rightEar",
            Joint::Neck => "neck",
            Joint::LeftShoulder => "leftShoulder",
            Joint::RightShoulder => "rightShoulder",
            Joint::LeftElbow => "leftElbow",
            Joint::RightElbow => "rightElbow",
            Joint::LeftWrist => "leftWrist",
            Joint::RightWrist => "rightWrist",
            Joint::Root => "root",
            Joint::LeftHip => "leftHip",
            Joint::RightHip => "rightHip",
            Joint::LeftKnee => "leftKnee",
            Joint::RightKnee => "rightKnee",
            Joint::LeftAnkle => "leftAnkle",
            Joint::RightAnkle => "rightAnkle",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Joint {
    type Err = LandmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Joint::ALL
            .iter()
            .copied()
            .find(|j| j.name() == s)
            .ok_or_else(|| LandmarkError::UnknownJoint(s.to_string()))
    }
}

/// Body side, as seen by the pose model (not mirrored)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn wrist(self) -> Joint {
        match self {
            Side::Left => Joint::LeftWrist,
            Side::Right => Joint::RightWrist,
        }
    }

    pub fn elbow(self) -> Joint {
        match self {
            Side::Left => Joint::LeftElbow,
            Side::Right => Joint::RightElbow,
        }
    }

    pub fn shoulder(self) -> Joint {
        match self {
            Side::Left => Joint::LeftShoulder,
            Side::Right => Joint::RightShoulder,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

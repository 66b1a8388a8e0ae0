//! Body Landmark Types
//!
//! Per-frame observations handed to the posture engine by an external
//! landmark provider (body-pose and face models):
//! - Named joints with a normalized 2-D position and a confidence score
//! - Optional face pitch/yaw
//! - Capture timestamp

pub mod frame;
pub mod joint;

pub use frame::{FaceSample, Frame, JointSample, Point};
pub use joint::{Joint, Side};

use thiserror::Error;

/// Landmark error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("Unknown joint name: {0}")]
    UnknownJoint(String),
}

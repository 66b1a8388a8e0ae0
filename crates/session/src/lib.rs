//! Practice Session
//!
//! Drives the posture engine for one practice run:
//! - Bounded frame feed between the capture thread and the engine
//! - Countdown → recording → report lifecycle
//! - End-of-session report with counters, posture gaps and scores

pub mod feed;
pub mod report;
pub mod session;

pub use feed::{FrameFeed, FrameSender};
pub use report::{PostureGap, PresentationScores, SessionReport};
pub use session::{Session, SessionPhase};

use posture::PostureError;
use thiserror::Error;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Operation requires {expected:?} phase, session is {actual:?}")]
    WrongPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },

    #[error("Frame feed closed")]
    FeedClosed,

    #[error("Posture engine error: {0}")]
    Posture(#[from] PostureError),

    #[error("Report encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

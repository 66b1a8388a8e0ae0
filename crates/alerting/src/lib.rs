//! Warning Gate
//!
//! Cooldown and throttling for repeated feedback warnings. Time is taken from
//! frame timestamps so replays are deterministic.

mod manager;

pub use manager::{WarningConfig, WarningGate, WarningState};

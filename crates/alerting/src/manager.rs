//! Warning Gate Implementation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

const NANOS_PER_MS: u64 = 1_000_000;
const MINUTE_NS: u64 = 60_000 * NANOS_PER_MS;

/// Warning gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningConfig {
    /// Minimum time between two warnings with the same key (milliseconds)
    pub cooldown_ms: u64,
    /// Maximum warnings of any key per minute before throttling
    pub max_warnings_per_minute: usize,
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 3000,
            max_warnings_per_minute: 30,
        }
    }
}

/// State of a warning key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningState {
    /// Frame timestamp of the last time this warning was shown
    pub last_fired_ns: u64,
    /// Number of times shown
    pub fire_count: usize,
}

/// Per-key cooldown bookkeeping for feedback warnings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarningGate {
    config: WarningConfig,
    states: HashMap<String, WarningState>,
    /// Warnings fired in the current minute window
    minute_count: usize,
    /// Start of the current minute window
    minute_start_ns: Option<u64>,
}

impl WarningGate {
    /// Create a new gate
    pub fn new(config: WarningConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
            minute_count: 0,
            minute_start_ns: None,
        }
    }

    /// Check if a warning may be shown at `now_ns`
    pub fn should_fire(&mut self, key: &str, now_ns: u64) -> bool {
        if let Some(start) = self.minute_start_ns {
            if now_ns.saturating_sub(start) >= MINUTE_NS {
                self.minute_count = 0;
                self.minute_start_ns = Some(now_ns);
            }
        }

        if self.minute_count >= self.config.max_warnings_per_minute {
            debug!("Warning {} throttled: max warnings per minute reached", key);
            return false;
        }

        if let Some(state) = self.states.get(key) {
            let cooldown_ns = self.config.cooldown_ms.saturating_mul(NANOS_PER_MS);
            if now_ns.saturating_sub(state.last_fired_ns) < cooldown_ns {
                debug!("Warning {} suppressed: in cooldown period", key);
                return false;
            }
        }

        true
    }

    /// Record that a warning was shown at `now_ns`
    pub fn record_fire(&mut self, key: &str, now_ns: u64) {
        if self.minute_start_ns.is_none() {
            self.minute_start_ns = Some(now_ns);
        }
        self.minute_count += 1;

        let state = self.states.entry(key.to_string()).or_insert(WarningState {
            last_fired_ns: now_ns,
            fire_count: 0,
        });
        state.last_fired_ns = now_ns;
        state.fire_count += 1;

        debug!("Warning recorded: {} (count: {})", key, state.fire_count);
    }

    /// `should_fire` followed by `record_fire` when allowed
    pub fn try_fire(&mut self, key: &str, now_ns: u64) -> bool {
        if self.should_fire(key, now_ns) {
            self.record_fire(key, now_ns);
            true
        } else {
            false
        }
    }

    /// Number of times a warning has been shown
    pub fn fire_count(&self, key: &str) -> usize {
        self.states.get(key).map_or(0, |s| s.fire_count)
    }

    /// Warnings shown in the current minute window
    pub fn minute_count(&self) -> usize {
        self.minute_count
    }

    pub fn config(&self) -> &WarningConfig {
        &self.config
    }

    /// Clear all cooldowns and counts
    pub fn clear(&mut self) {
        self.states.clear();
        self.minute_count = 0;
        self.minute_start_ns = None;
    }
}

//! Classification results and feedback

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Posture/behavior events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureEvent {
    /// Hand resting on the neck (highest priority)
    HandOnNeck,

    /// Arms crossed over the chest
    ArmsCrossed,

    /// Head pitch/yaw outside the stable range
    HeadUnstable,

    /// Hands resting too long
    HandIdle,
}

impl PostureEvent {
    /// All events, highest feedback priority first
    pub const ALL: [PostureEvent; 4] = [
        PostureEvent::HandOnNeck,
        PostureEvent::ArmsCrossed,
        PostureEvent::HeadUnstable,
        PostureEvent::HandIdle,
    ];

    /// Stable key used for cooldowns and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            PostureEvent::HandOnNeck => "hand_on_neck",
            PostureEvent::ArmsCrossed => "arms_crossed",
            PostureEvent::HeadUnstable => "head_unstable",
            PostureEvent::HandIdle => "hand_idle",
        }
    }

    /// Human-readable name for the report
    pub fn display_name(&self) -> &'static str {
        match self {
            PostureEvent::HandOnNeck => "Touching the neck",
            PostureEvent::ArmsCrossed => "Crossed arms",
            PostureEvent::HeadUnstable => "Unstable head",
            PostureEvent::HandIdle => "Unused hands",
        }
    }
}

impl fmt::Display for PostureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the presenter is gesturing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyLanguage {
    /// Wrists not observed yet
    #[default]
    Unknown,
    Used,
    NotUsed,
}

impl BodyLanguage {
    /// Status label shown while recording
    pub fn label(&self) -> Option<&'static str> {
        match self {
            BodyLanguage::Unknown => None,
            BodyLanguage::Used => Some("Using body language"),
            BodyLanguage::NotUsed => Some("Not using body language"),
        }
    }
}

/// Lifetime event counters for the session report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounters {
    pub neck_touch_count: u32,
    pub head_movement_count: u32,
    pub arms_crossed_count: u32,
    pub hand_idle_count: u32,
}

impl EventCounters {
    pub fn get(&self, event: PostureEvent) -> u32 {
        match event {
            PostureEvent::HandOnNeck => self.neck_touch_count,
            PostureEvent::ArmsCrossed => self.arms_crossed_count,
            PostureEvent::HeadUnstable => self.head_movement_count,
            PostureEvent::HandIdle => self.hand_idle_count,
        }
    }

    pub fn total(&self) -> u32 {
        PostureEvent::ALL.iter().map(|e| self.get(*e)).sum()
    }
}

/// A message emitted on the frame an event fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub event: PostureEvent,
    pub text: String,
}

/// Result of classifying one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Timestamp of the classified frame
    pub timestamp_ns: u64,

    /// Current posture label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posture_text: Option<String>,

    /// Current feedback line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_text: Option<String>,

    /// Idle-hand prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_movement_text: Option<String>,

    pub body_language: BodyLanguage,

    /// Body-language status label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_language_text: Option<String>,

    /// Eye-contact status while both eyes are visible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_contact_text: Option<String>,

    pub counters: EventCounters,

    /// Conditions currently latched
    pub active_events: BTreeSet<PostureEvent>,

    /// Messages fired on this frame
    pub messages: Vec<FeedbackMessage>,
}

impl ClassificationResult {
    pub fn is_active(&self, event: PostureEvent) -> bool {
        self.active_events.contains(&event)
    }

    /// Highest-priority active event
    pub fn primary_event(&self) -> Option<PostureEvent> {
        // BTreeSet iterates in declaration order, which is priority order
        self.active_events.iter().next().copied()
    }

    /// Check whether `event` fired a message on this frame
    pub fn fired(&self, event: PostureEvent) -> bool {
        self.messages.iter().any(|m| m.event == event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_event_priority() {
        let mut result = ClassificationResult::default();
        result.active_events.insert(PostureEvent::HandIdle);
        result.active_events.insert(PostureEvent::ArmsCrossed);

        assert_eq!(result.primary_event(), Some(PostureEvent::ArmsCrossed));

        result.active_events.insert(PostureEvent::HandOnNeck);
        assert_eq!(result.primary_event(), Some(PostureEvent::HandOnNeck));
    }

    #[test]
    fn test_counters() {
        let counters = EventCounters {
            neck_touch_count: 2,
            head_movement_count: 1,
            ..Default::default()
        };
        assert_eq!(counters.get(PostureEvent::HandOnNeck), 2);
        assert_eq!(counters.get(PostureEvent::HandIdle), 0);
        assert_eq!(counters.total(), 3);
    }

    #[test]
    fn test_serialized_shape() {
        let mut result = ClassificationResult {
            feedback_text: Some("Head position: good".into()),
            ..Default::default()
        };
        result.active_events.insert(PostureEvent::HeadUnstable);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("posture_text").is_none());
        assert_eq!(json["active_events"][0], "head_unstable");
        assert_eq!(json["body_language"], "unknown");
    }
}

//! End-of-session report

use chrono::{DateTime, Utc};
use landmarks::FaceSample;
use posture::{BodyLanguage, ClassificationResult, EventCounters, PostureEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SessionError;

/// A posture the presenter fell into during the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostureGap {
    pub event: PostureEvent,
    pub name: String,
    pub count: u32,
}

/// Running presentation scores (0-1, higher is better)
///
/// Each sample is blended as `score = (score + sample) / 2`. The first sample
/// initializes the score; it is not blended with a zero starting value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PresentationScores {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_stability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gesture_usage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_contact: Option<f64>,
}

impl PresentationScores {
    fn blend(score: &mut Option<f64>, sample: f64) {
        *score = Some(match *score {
            Some(current) => (current + sample) / 2.0,
            None => sample,
        });
    }

    pub fn update_head_stability(&mut self, sample: f64) {
        Self::blend(&mut self.head_stability, sample);
    }

    pub fn update_gesture_usage(&mut self, sample: f64) {
        Self::blend(&mut self.gesture_usage, sample);
    }

    pub fn update_eye_contact(&mut self, sample: f64) {
        Self::blend(&mut self.eye_contact, sample);
    }

    /// Fold one classified frame into the scores
    pub fn update(&mut self, result: &ClassificationResult, face: Option<FaceSample>) {
        if let Some(face) = face {
            let stable = !result.is_active(PostureEvent::HeadUnstable);
            self.update_head_stability(if stable { 1.0 } else { 0.0 });
            if let Some(eyes) = face.eyes_visible {
                self.update_eye_contact(if eyes { 1.0 } else { 0.0 });
            }
        }
        match result.body_language {
            BodyLanguage::Used => self.update_gesture_usage(1.0),
            BodyLanguage::NotUsed => self.update_gesture_usage(0.0),
            BodyLanguage::Unknown => {}
        }
    }

    /// Mean of the available scores
    pub fn overall(&self) -> Option<f64> {
        let scores: Vec<f64> = [self.head_stability, self.gesture_usage, self.eye_contact]
            .into_iter()
            .flatten()
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }
}

/// Report shown after a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Recording length (milliseconds)
    pub elapsed_ms: u64,
    /// Recording length as "m:ss"
    pub formatted_elapsed: String,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub counters: EventCounters,
    pub posture_gaps: Vec<PostureGap>,
    pub scores: PresentationScores,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
}

impl SessionReport {
    pub fn new(
        session_id: Uuid,
        elapsed_ms: u64,
        frames_processed: u64,
        frames_dropped: u64,
        counters: EventCounters,
        scores: PresentationScores,
    ) -> Self {
        let posture_gaps = PostureEvent::ALL
            .iter()
            .filter(|event| counters.get(**event) > 0)
            .map(|event| PostureGap {
                event: *event,
                name: event.display_name().to_string(),
                count: counters.get(*event),
            })
            .collect();

        Self {
            session_id,
            generated_at: Utc::now(),
            elapsed_ms,
            formatted_elapsed: format_elapsed(elapsed_ms),
            frames_processed,
            frames_dropped,
            counters,
            posture_gaps,
            overall_score: scores.overall(),
            scores,
        }
    }

    /// Number of distinct postures to work on
    pub fn gap_count(&self) -> usize {
        self.posture_gaps.len()
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Format milliseconds as "m:ss"
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let secs = elapsed_ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(123_000), "2:03");
        assert_eq!(format_elapsed(59_999), "0:59");
        assert_eq!(format_elapsed(600_000), "10:00");
    }

    #[test]
    fn test_posture_gaps_only_for_fired_events() {
        let counters = EventCounters {
            neck_touch_count: 2,
            arms_crossed_count: 1,
            ..Default::default()
        };
        let report = SessionReport::new(Uuid::new_v4(), 123_000, 3690, 0, counters, PresentationScores::default());

        assert_eq!(report.gap_count(), 2);
        assert_eq!(report.posture_gaps[0].event, PostureEvent::HandOnNeck);
        assert_eq!(report.posture_gaps[0].count, 2);
        assert_eq!(report.posture_gaps[1].name, "Crossed arms");
        assert_eq!(report.formatted_elapsed, "2:03");
        assert!(report.overall_score.is_none());
    }

    #[test]
    fn test_score_blending() {
        let mut scores = PresentationScores::default();
        scores.update_head_stability(1.0);
        scores.update_head_stability(0.0);
        scores.update_head_stability(1.0);

        assert_eq!(scores.head_stability, Some(0.75));
        assert_eq!(scores.overall(), Some(0.75));

        scores.update_gesture_usage(0.25);
        assert_eq!(scores.overall(), Some(0.5));
    }

    #[test]
    fn test_update_from_result() {
        let mut scores = PresentationScores::default();
        let mut result = ClassificationResult {
            body_language: BodyLanguage::Unknown,
            ..Default::default()
        };

        scores.update(&result, None);
        assert_eq!(scores, PresentationScores::default());

        result.active_events.insert(PostureEvent::HeadUnstable);
        result.body_language = BodyLanguage::Used;
        scores.update(&result, Some(FaceSample::default()));
        assert_eq!(scores.head_stability, Some(0.0));
        assert_eq!(scores.gesture_usage, Some(1.0));
        assert_eq!(scores.eye_contact, None);
    }

    #[test]
    fn test_eye_contact_score() {
        let mut scores = PresentationScores::default();
        let result = ClassificationResult::default();
        let face = |eyes| FaceSample {
            eyes_visible: Some(eyes),
            ..Default::default()
        };

        scores.update(&result, Some(face(true)));
        scores.update(&result, Some(face(false)));
        assert_eq!(scores.eye_contact, Some(0.5));

        // head 1.0, eyes 0.5
        assert_eq!(scores.overall(), Some(0.75));
    }

    #[test]
    fn test_report_json() {
        let report = SessionReport::new(
            Uuid::nil(),
            5_000,
            150,
            2,
            EventCounters::default(),
            PresentationScores::default(),
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["formatted_elapsed"], "0:05");
        assert_eq!(json["frames_dropped"], 2);
        assert!(json["posture_gaps"].as_array().unwrap().is_empty());
    }
}

//! Posture Classification Engine
//!
//! Real-time presenter body-language analysis from body landmarks:
//! - Crossed arms
//! - Hand on neck
//! - Head stability
//! - Hand usage / idle hands
//!
//! The engine is a plain state machine: [`classify`] maps a frame and the
//! previous [`EngineState`] to the next state and a [`ClassificationResult`].
//! [`PostureEngine`] wraps that for callers that want to own the state.

pub mod analysis;
pub mod config;
pub mod detector;
pub mod state;

pub use analysis::{BodyLanguage, ClassificationResult, EventCounters, FeedbackMessage, PostureEvent};
pub use config::{MissingJointPolicy, PostureConfig};
pub use detector::{
    ArmsCrossedDetector, HandIdleDetector, HandOnNeckDetector, HeadStabilityDetector, NeckReading,
    WristMotion,
};
pub use state::{DetectorState, EngineState, HandTracker};

use landmarks::{Frame, Side};
use metrics::counter;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Posture engine error types
#[derive(Error, Debug)]
pub enum PostureError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Detector set built from one configuration
#[derive(Debug, Clone)]
struct Detectors {
    config: PostureConfig,
    arms_crossed: ArmsCrossedDetector,
    hand_on_neck: HandOnNeckDetector,
    head: HeadStabilityDetector,
    hands: HandIdleDetector,
}

impl Detectors {
    fn new(config: PostureConfig) -> Self {
        Self {
            arms_crossed: ArmsCrossedDetector::new(&config),
            hand_on_neck: HandOnNeckDetector::new(&config),
            head: HeadStabilityDetector::new(&config),
            hands: HandIdleDetector::new(&config),
            config,
        }
    }

    fn step(&self, state: &mut EngineState, frame: &Frame) -> ClassificationResult {
        let ts = frame.timestamp_ns;
        if let Some(last) = state.last_timestamp_ns {
            if ts < last {
                warn!("Frame timestamp went backwards: {} < {}", ts, last);
            }
        }
        state.last_timestamp_ns = Some(ts);
        state.frames_processed += 1;

        let mut messages = Vec::new();

        self.update_head(state, frame, &mut messages);
        self.update_hand_on_neck(state, frame, &mut messages);
        self.update_hands(state, frame, &mut messages);
        self.update_arms_crossed(state, frame, &mut messages);

        compose_result(state, ts, messages)
    }

    fn update_head(&self, state: &mut EngineState, frame: &Frame, messages: &mut Vec<FeedbackMessage>) {
        // No face: hold the previous head state
        let Some(unstable) = self.head.assess(frame) else {
            return;
        };
        state.face_seen = true;
        if let Some(eyes) = frame.face.and_then(|f| f.eyes_visible) {
            state.eyes_visible = Some(eyes);
        }

        let required = self.config.required_stable_head_frames;
        if state.head.observe(unstable, required, frame.timestamp_ns) {
            let count = state.head.trigger_count;
            fired(PostureEvent::HeadUnstable, count);
            messages.push(FeedbackMessage {
                event: PostureEvent::HeadUnstable,
                text: head_unstable_text(count),
            });
        }
    }

    fn update_hand_on_neck(
        &self,
        state: &mut EngineState,
        frame: &Frame,
        messages: &mut Vec<FeedbackMessage>,
    ) {
        let side = match self.hand_on_neck.assess(frame) {
            NeckReading::Touching(side) => side,
            NeckReading::Clear => {
                state.hand_on_neck.release();
                state.neck_side = None;
                return;
            }
            NeckReading::Missing => {
                if self.config.missing_joint_policy == MissingJointPolicy::Reset {
                    state.hand_on_neck.release();
                    state.neck_side = None;
                }
                return;
            }
        };

        let required = self.config.required_stable_frames;
        if state.hand_on_neck.observe(true, required, frame.timestamp_ns) {
            let count = state.hand_on_neck.trigger_count;
            state.neck_side = Some(side);
            fired(PostureEvent::HandOnNeck, count);
            messages.push(FeedbackMessage {
                event: PostureEvent::HandOnNeck,
                text: neck_detected_text(side),
            });
        } else {
            debug!(
                "Hand on neck frames: {}/{}",
                state.hand_on_neck.stable_frames, required
            );
        }
    }

    fn update_hands(&self, state: &mut EngineState, frame: &Frame, messages: &mut Vec<FeedbackMessage>) {
        let ts = frame.timestamp_ns;
        let Some(motion) = self.hands.measure(frame, &state.hands) else {
            if self.config.missing_joint_policy == MissingJointPolicy::Reset {
                state.hands.forget_motion();
            }
            return;
        };

        let hands = &mut state.hands;

        // Instant onset, debounced release
        if self.hands.is_gesturing(&motion) {
            hands.still_frames = 0;
            if hands.body_language != BodyLanguage::Used {
                debug!("Body language in use");
                hands.body_language = BodyLanguage::Used;
            }
        } else {
            hands.still_frames = hands.still_frames.saturating_add(1);
            if hands.still_frames >= self.config.stable_movement_frames
                && hands.body_language != BodyLanguage::NotUsed
            {
                debug!("Body language not used for {} frames", hands.still_frames);
                hands.body_language = BodyLanguage::NotUsed;
            }
        }

        let resting_too_long = if self.hands.is_still(&motion) {
            let since = *hands.last_movement_ns.get_or_insert(ts);
            ts.saturating_sub(since) > self.config.hand_rest_threshold_ns()
        } else {
            hands.last_movement_ns = Some(ts);
            false
        };

        if hands.idle.observe(resting_too_long, 1, ts) {
            let count = hands.idle.trigger_count;
            fired(PostureEvent::HandIdle, count);
            messages.push(FeedbackMessage {
                event: PostureEvent::HandIdle,
                text: HAND_IDLE_TEXT.to_string(),
            });
        }

        hands.previous_left = Some(motion.left);
        hands.previous_right = Some(motion.right);
        hands.previous_timestamp_ns = Some(ts);
    }

    fn update_arms_crossed(
        &self,
        state: &mut EngineState,
        frame: &Frame,
        messages: &mut Vec<FeedbackMessage>,
    ) {
        let ts = frame.timestamp_ns;
        let Some(crossed) = self.arms_crossed.assess(frame) else {
            if self.config.missing_joint_policy == MissingJointPolicy::Reset {
                state.arms_crossed.release();
            }
            return;
        };

        let required = self.config.arms_crossed_stable_frames;
        if state.arms_crossed.observe(crossed, required, ts) {
            fired(PostureEvent::ArmsCrossed, state.arms_crossed.trigger_count);
        }

        // The warning repeats while the arms stay crossed, at most once per cooldown
        if state.arms_crossed.active && state.warnings.try_fire(PostureEvent::ArmsCrossed.as_str(), ts) {
            messages.push(FeedbackMessage {
                event: PostureEvent::ArmsCrossed,
                text: ARMS_CROSSED_TEXT.to_string(),
            });
        }
    }
}

const ARMS_CROSSED_TEXT: &str =
    "Warning: Uncross your arms - crossed arms can appear defensive or unengaged.";
const HAND_IDLE_TEXT: &str = "Hand not used. Try moving your hand!";
const HEAD_GOOD_TEXT: &str = "Head position: good";
const EYE_CONTACT_GOOD_TEXT: &str = "Eye contact: good";

fn hand_name(side: Side) -> &'static str {
    match side {
        Side::Left => "Left",
        Side::Right => "Right",
    }
}

fn neck_detected_text(side: Side) -> String {
    format!("{} hand on neck detected", hand_name(side))
}

fn head_unstable_text(count: u32) -> String {
    format!("Head movement: try to keep your head more stable ({} times)", count)
}

fn fired(event: PostureEvent, count: u32) {
    info!("{} detected (count: {})", event, count);
    counter!("posture_events_total", "event" => event.as_str()).increment(1);
}

fn counters(state: &EngineState) -> EventCounters {
    EventCounters {
        neck_touch_count: state.hand_on_neck.trigger_count,
        head_movement_count: state.head.trigger_count,
        arms_crossed_count: state.arms_crossed.trigger_count,
        hand_idle_count: state.hands.idle.trigger_count,
    }
}

fn compose_result(state: &EngineState, timestamp_ns: u64, messages: Vec<FeedbackMessage>) -> ClassificationResult {
    let mut result = ClassificationResult {
        timestamp_ns,
        body_language: state.hands.body_language,
        body_language_text: state.hands.body_language.label().map(str::to_string),
        counters: counters(state),
        messages,
        ..Default::default()
    };

    let latches = [
        (PostureEvent::HandOnNeck, state.hand_on_neck.active),
        (PostureEvent::ArmsCrossed, state.arms_crossed.active),
        (PostureEvent::HeadUnstable, state.head.active),
        (PostureEvent::HandIdle, state.hands.idle.active),
    ];
    result.active_events = latches
        .iter()
        .filter(|(_, active)| *active)
        .map(|(event, _)| *event)
        .collect();

    let neck_side = state.neck_side.unwrap_or(Side::Right);

    result.posture_text = match result.primary_event() {
        Some(PostureEvent::HandOnNeck) => Some(format!(
            "{} hand on neck ({} times)",
            hand_name(neck_side),
            state.hand_on_neck.trigger_count
        )),
        _ if state.arms_crossed.active => Some("Arms crossed".to_string()),
        _ => None,
    };

    result.feedback_text = match result.primary_event() {
        Some(PostureEvent::HandOnNeck) => Some(neck_detected_text(neck_side)),
        Some(PostureEvent::ArmsCrossed) => Some(ARMS_CROSSED_TEXT.to_string()),
        Some(PostureEvent::HeadUnstable) => Some(head_unstable_text(state.head.trigger_count)),
        Some(PostureEvent::HandIdle) => Some(HAND_IDLE_TEXT.to_string()),
        None if state.face_seen => Some(HEAD_GOOD_TEXT.to_string()),
        None => None,
    };

    if state.eyes_visible == Some(true) {
        result.eye_contact_text = Some(EYE_CONTACT_GOOD_TEXT.to_string());
    }

    if state.hands.idle.active {
        result.hand_movement_text = Some(HAND_IDLE_TEXT.to_string());
    }

    result
}

/// Classify one frame against a previous state.
///
/// Pure: the input state is not modified and the same inputs always give the
/// same outputs.
pub fn classify(
    config: &PostureConfig,
    state: &EngineState,
    frame: &Frame,
) -> (EngineState, ClassificationResult) {
    let detectors = Detectors::new(config.clone());
    let mut next = state.clone();
    let result = detectors.step(&mut next, frame);
    (next, result)
}

/// Posture engine owning its state between frames
pub struct PostureEngine {
    detectors: Detectors,
    state: EngineState,
}

impl PostureEngine {
    /// Create a new engine with configuration
    pub fn new(config: PostureConfig) -> Result<Self, PostureError> {
        config.validate()?;
        info!("Creating posture engine with config: {:?}", config);
        Ok(Self {
            state: EngineState::new(&config),
            detectors: Detectors::new(config),
        })
    }

    /// Resume from a previously captured state
    pub fn with_state(config: PostureConfig, state: EngineState) -> Result<Self, PostureError> {
        config.validate()?;
        Ok(Self {
            detectors: Detectors::new(config),
            state,
        })
    }

    /// Classify a single frame and advance the state
    pub fn process(&mut self, frame: &Frame) -> ClassificationResult {
        self.detectors.step(&mut self.state, frame)
    }

    /// Clear every counter, latch and cooldown (new session)
    pub fn reset(&mut self) {
        info!(
            "Resetting posture engine after {} frames",
            self.state.frames_processed
        );
        self.state = EngineState::new(&self.detectors.config);
    }

    /// Raw crossed-arms condition for this frame
    pub fn evaluate_arms_crossed(&self, frame: &Frame) -> bool {
        self.detectors.arms_crossed.evaluate(frame)
    }

    /// Raw hand-on-neck condition for this frame
    pub fn evaluate_hand_on_neck(&self, frame: &Frame) -> bool {
        self.detectors.hand_on_neck.evaluate(frame)
    }

    /// Raw excess-head-movement condition for this frame
    pub fn evaluate_head_unstable(&self, frame: &Frame) -> bool {
        self.detectors.head.evaluate(frame)
    }

    /// Raw resting-hands condition relative to the last tracked wrists
    pub fn evaluate_hand_idle(&self, frame: &Frame) -> bool {
        self.detectors.hands.evaluate(frame, &self.state.hands)
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn counters(&self) -> EventCounters {
        counters(&self.state)
    }

    pub fn config(&self) -> &PostureConfig {
        &self.detectors.config
    }
}

//! Practice session lifecycle

use landmarks::Frame;
use posture::{ClassificationResult, PostureConfig, PostureEngine};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::feed::FrameFeed;
use crate::report::{PresentationScores, SessionReport};
use crate::SessionError;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Countdown,
    Recording,
    Finished,
}

/// One practice run: countdown, recording, report
pub struct Session {
    id: Uuid,
    phase: SessionPhase,
    engine: PostureEngine,
    scores: PresentationScores,
    started_ns: Option<u64>,
    last_frame_ns: Option<u64>,
    frames_dropped: u64,
}

impl Session {
    pub fn new(config: PostureConfig) -> Result<Self, SessionError> {
        let engine = PostureEngine::new(config)?;
        let id = Uuid::new_v4();
        info!("Created practice session {}", id);

        Ok(Self {
            id,
            phase: SessionPhase::Idle,
            engine,
            scores: PresentationScores::default(),
            started_ns: None,
            last_frame_ns: None,
            frames_dropped: 0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn scores(&self) -> &PresentationScores {
        &self.scores
    }

    pub fn engine(&self) -> &PostureEngine {
        &self.engine
    }

    fn expect_phase(&self, expected: SessionPhase) -> Result<(), SessionError> {
        if self.phase != expected {
            return Err(SessionError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    /// Idle → Countdown
    pub fn start_countdown(&mut self) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::Idle)?;
        self.phase = SessionPhase::Countdown;
        debug!("Session {} counting down", self.id);
        Ok(())
    }

    /// Countdown → Recording, with a fresh engine state
    pub fn begin_recording(&mut self, timestamp_ns: u64) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::Countdown)?;
        self.engine.reset();
        self.scores = PresentationScores::default();
        self.started_ns = Some(timestamp_ns);
        self.last_frame_ns = None;
        self.frames_dropped = 0;
        self.phase = SessionPhase::Recording;
        info!("Session {} recording", self.id);
        Ok(())
    }

    /// Classify one frame while recording
    pub fn process(&mut self, frame: &Frame) -> Result<ClassificationResult, SessionError> {
        self.expect_phase(SessionPhase::Recording)?;

        let result = self.engine.process(frame);
        self.scores.update(&result, frame.face);
        self.last_frame_ns = Some(frame.timestamp_ns);
        Ok(result)
    }

    /// Recording → Finished, producing the report
    pub fn finish(&mut self, timestamp_ns: u64) -> Result<SessionReport, SessionError> {
        self.expect_phase(SessionPhase::Recording)?;
        self.phase = SessionPhase::Finished;

        let started = self.started_ns.unwrap_or(timestamp_ns);
        let elapsed_ms = timestamp_ns.saturating_sub(started) / 1_000_000;
        let report = SessionReport::new(
            self.id,
            elapsed_ms,
            self.engine.state().frames_processed,
            self.frames_dropped,
            self.engine.counters(),
            self.scores,
        );

        info!(
            "Session {} finished after {} ({} frames, {} posture gaps)",
            self.id,
            report.formatted_elapsed,
            report.frames_processed,
            report.gap_count()
        );
        Ok(report)
    }

    /// Finished → Countdown for another run, clearing everything
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::Finished)?;
        self.engine.reset();
        self.scores = PresentationScores::default();
        self.started_ns = None;
        self.last_frame_ns = None;
        self.frames_dropped = 0;
        self.id = Uuid::new_v4();
        self.phase = SessionPhase::Countdown;
        info!("Restarted as session {}", self.id);
        Ok(())
    }

    /// Drain `feed` until every sender is gone, forwarding each result.
    ///
    /// A session still counting down starts recording at the first frame.
    /// Results are dropped once `results` has no receiver.
    pub async fn run(
        &mut self,
        mut feed: FrameFeed,
        results: mpsc::Sender<ClassificationResult>,
    ) -> Result<SessionReport, SessionError> {
        let mut receiver_gone = false;

        while let Some(frame) = feed.next().await {
            if self.phase == SessionPhase::Countdown {
                self.begin_recording(frame.timestamp_ns)?;
            }

            let result = self.process(&frame)?;
            if !receiver_gone && results.send(result).await.is_err() {
                warn!("Result receiver dropped, continuing without forwarding");
                receiver_gone = true;
            }
        }

        if self.phase == SessionPhase::Countdown {
            // No frames arrived
            self.begin_recording(0)?;
        }

        self.frames_dropped = feed.dropped();
        let end = self.last_frame_ns.or(self.started_ns).unwrap_or(0);
        self.finish(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed;
    use landmarks::Joint;
    use posture::PostureEvent;

    const FRAME_NS: u64 = 33_333_333;

    fn neck_frame(i: u64) -> Frame {
        Frame::new(i * FRAME_NS)
            .with_joint(Joint::Neck, 0.5, 0.6, 0.9)
            .with_joint(Joint::RightWrist, 0.45, 0.6, 0.9)
            .with_joint(Joint::RightElbow, 0.45, 0.4, 0.9)
            .with_face(0.0, 0.0)
    }

    fn recording() -> Session {
        let mut session = Session::new(PostureConfig::default()).unwrap();
        session.start_countdown().unwrap();
        session.begin_recording(0).unwrap();
        session
    }

    #[test]
    fn test_phase_transitions() {
        let mut session = Session::new(PostureConfig::default()).unwrap();
        assert_eq!(session.phase(), SessionPhase::Idle);

        assert!(matches!(
            session.process(&neck_frame(0)),
            Err(SessionError::WrongPhase {
                expected: SessionPhase::Recording,
                actual: SessionPhase::Idle
            })
        ));
        assert!(session.begin_recording(0).is_err());

        session.start_countdown().unwrap();
        session.begin_recording(0).unwrap();
        assert_eq!(session.phase(), SessionPhase::Recording);

        session.finish(FRAME_NS).unwrap();
        assert_eq!(session.phase(), SessionPhase::Finished);
        assert!(session.finish(FRAME_NS).is_err());
    }

    #[test]
    fn test_report_after_recording() {
        let mut session = recording();
        for i in 0..30 {
            session.process(&neck_frame(i)).unwrap();
        }

        let report = session.finish(123 * 1_000_000_000).unwrap();
        assert_eq!(report.session_id, session.id());
        assert_eq!(report.formatted_elapsed, "2:03");
        assert_eq!(report.frames_processed, 30);
        assert_eq!(report.counters.neck_touch_count, 1);
        assert_eq!(report.gap_count(), 1);
        assert_eq!(report.posture_gaps[0].event, PostureEvent::HandOnNeck);
        assert_eq!(report.scores.head_stability, Some(1.0));
    }

    #[test]
    fn test_eye_contact_scored_while_recording() {
        let mut session = recording();
        let result = session
            .process(&Frame::new(0).with_face_eyes(0.0, 0.0, true))
            .unwrap();

        assert_eq!(result.eye_contact_text.as_deref(), Some("Eye contact: good"));
        assert_eq!(session.scores().eye_contact, Some(1.0));
        assert_eq!(session.scores().overall(), Some(1.0));
    }

    #[test]
    fn test_restart_clears_everything() {
        let mut session = recording();
        for i in 0..30 {
            session.process(&neck_frame(i)).unwrap();
        }
        session.finish(30 * FRAME_NS).unwrap();
        let first_id = session.id();

        session.restart().unwrap();
        assert_eq!(session.phase(), SessionPhase::Countdown);
        assert_ne!(session.id(), first_id);
        assert_eq!(session.engine().counters().total(), 0);
        assert_eq!(session.scores(), &PresentationScores::default());
    }

    #[tokio::test]
    async fn test_run_drains_feed() {
        let mut session = Session::new(PostureConfig::default()).unwrap();
        session.start_countdown().unwrap();

        let (tx, feed) = feed::channel(8);
        let (results_tx, mut results_rx) = mpsc::channel::<ClassificationResult>(64);

        let producer = tokio::spawn(async move {
            for i in 0..40 {
                tx.send(neck_frame(i)).await.unwrap();
            }
        });

        let collector = tokio::spawn(async move {
            let mut fired = 0;
            while let Some(result) = results_rx.recv().await {
                if result.fired(PostureEvent::HandOnNeck) {
                    fired += 1;
                }
            }
            fired
        });

        let report = session.run(feed, results_tx).await.unwrap();
        producer.await.unwrap();

        assert_eq!(collector.await.unwrap(), 1);
        assert_eq!(report.frames_processed, 40);
        assert_eq!(report.elapsed_ms, 39 * FRAME_NS / 1_000_000);
        assert_eq!(session.phase(), SessionPhase::Finished);
    }

    #[tokio::test]
    async fn test_run_survives_dropped_receiver() {
        let mut session = recording();
        let (tx, feed) = feed::channel(4);
        let (results_tx, results_rx) = mpsc::channel(1);
        drop(results_rx);

        let producer = tokio::spawn(async move {
            for i in 0..10 {
                tx.send(neck_frame(i)).await.unwrap();
            }
        });

        let report = session.run(feed, results_tx).await.unwrap();
        producer.await.unwrap();
        assert_eq!(report.frames_processed, 10);
    }

    #[tokio::test]
    async fn test_run_reports_dropped_frames() {
        let mut session = recording();
        let (tx, feed) = feed::channel(2);
        let (results_tx, _results_rx) = mpsc::channel(16);

        for i in 0..5 {
            tx.try_send(neck_frame(i)).unwrap();
        }
        drop(tx);

        let report = session.run(feed, results_tx).await.unwrap();
        assert_eq!(report.frames_processed, 2);
        assert_eq!(report.frames_dropped, 3);
    }
}

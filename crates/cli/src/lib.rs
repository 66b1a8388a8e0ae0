//! PRZNT command-line support
//!
//! Replays recorded landmark frames (one JSON frame per line) through a
//! practice session and reports the result.

use anyhow::{Context, Result};
use landmarks::Frame;
use posture::{ClassificationResult, PostureConfig};
use session::report::format_elapsed;
use session::{feed, Session, SessionReport};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Initialize logging on stderr; `RUST_LOG` overrides the default `info` level
pub fn init_logging(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

/// Parse one JSONL line. Blank lines yield `None`.
pub fn parse_frame_line(line: &str, line_number: usize) -> Result<Option<Frame>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let frame = serde_json::from_str(line)
        .with_context(|| format!("Invalid frame on line {}", line_number))?;
    Ok(Some(frame))
}

/// One line of replay output for a fired message
pub fn format_message(result: &ClassificationResult, origin_ns: u64) -> Vec<String> {
    let at = format_elapsed(result.timestamp_ns.saturating_sub(origin_ns) / 1_000_000);
    result
        .messages
        .iter()
        .map(|m| format!("[{}] {}: {}", at, m.event, m.text))
        .collect()
}

/// Replay a JSONL file through a fresh session
pub async fn replay(path: &Path, config: PostureConfig, buffer: usize) -> Result<SessionReport> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut session = Session::new(config)?;
    session.start_countdown()?;

    let (tx, frames) = feed::channel(buffer);
    let (results_tx, mut results_rx) = mpsc::channel::<ClassificationResult>(buffer.max(1));

    let source: PathBuf = path.to_path_buf();
    let producer = tokio::task::spawn_blocking(move || -> Result<u64> {
        let mut sent = 0;
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read {}", source.display()))?;
            if let Some(frame) = parse_frame_line(&line, index + 1)? {
                tx.blocking_send(frame)?;
                sent += 1;
            }
        }
        debug!("Read {} frames from {}", sent, source.display());
        Ok(sent)
    });

    let printer = tokio::spawn(async move {
        let mut origin = None;
        while let Some(result) = results_rx.recv().await {
            let origin = *origin.get_or_insert(result.timestamp_ns);
            for line in format_message(&result, origin) {
                println!("{}", line);
            }
        }
    });

    let report = session.run(frames, results_tx).await?;
    let sent = producer.await.context("Frame reader panicked")??;
    printer.await.context("Result printer panicked")?;

    info!("Replayed {} frames from {}", sent, path.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use posture::PostureEvent;
    use std::io::Write;

    fn neck_line(ts: u64) -> String {
        format!(
            r#"{{"timestamp_ns": {}, "joints": [
                {{"joint": "neck", "position": {{"x": 0.5, "y": 0.6}}, "confidence": 0.9}},
                {{"joint": "rightWrist", "position": {{"x": 0.45, "y": 0.6}}, "confidence": 0.9}},
                {{"joint": "rightElbow", "position": {{"x": 0.45, "y": 0.4}}, "confidence": 0.9}}
            ]}}"#,
            ts
        )
        .replace('\n', " ")
    }

    fn write_session(name: &str, lines: &[String]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("prznt-{}-{}.jsonl", name, std::process::id()));
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn test_parse_frame_line() {
        assert!(parse_frame_line("   ", 1).unwrap().is_none());

        let frame = parse_frame_line(&neck_line(42), 2).unwrap().unwrap();
        assert_eq!(frame.timestamp_ns, 42);
        assert_eq!(frame.joints.len(), 3);

        let err = parse_frame_line("{not json", 7).unwrap_err();
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn test_format_message() {
        let mut result = ClassificationResult {
            timestamp_ns: 65_000_000_000,
            ..Default::default()
        };
        assert!(format_message(&result, 0).is_empty());

        result.messages.push(posture::FeedbackMessage {
            event: PostureEvent::HandIdle,
            text: "Hand not used. Try moving your hand!".into(),
        });
        assert_eq!(
            format_message(&result, 5_000_000_000),
            vec!["[1:00] hand_idle: Hand not used. Try moving your hand!".to_string()]
        );
    }

    #[tokio::test]
    async fn test_replay_file() {
        let mut lines: Vec<String> = (0..40).map(|i| neck_line(i * 33_333_333)).collect();
        lines.insert(10, String::new());
        let path = write_session("replay", &lines);

        let report = replay(&path, PostureConfig::default(), 4).await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(report.frames_processed, 40);
        assert_eq!(report.counters.neck_touch_count, 1);
        assert_eq!(report.frames_dropped, 0);
    }

    #[tokio::test]
    async fn test_replay_rejects_bad_line() {
        let lines = vec![neck_line(0), "garbage".to_string()];
        let path = write_session("bad", &lines);

        let err = replay(&path, PostureConfig::default(), 4).await.unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[tokio::test]
    async fn test_replay_missing_file() {
        let path = std::env::temp_dir().join("prznt-does-not-exist.jsonl");
        assert!(replay(&path, PostureConfig::default(), 4).await.is_err());
    }
}

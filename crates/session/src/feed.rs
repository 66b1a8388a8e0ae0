//! Bounded frame feed between the landmark provider and the engine

use landmarks::Frame;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use crate::SessionError;

/// Default feed capacity (~1 s at 30 fps)
pub const DEFAULT_CAPACITY: usize = 30;

/// Create a bounded feed with the given capacity
pub fn channel(capacity: usize) -> (FrameSender, FrameFeed) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        FrameSender {
            tx,
            dropped: dropped.clone(),
        },
        FrameFeed { rx, dropped },
    )
}

/// Producer half, owned by the capture side
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<Frame>,
    dropped: Arc<AtomicU64>,
}

impl FrameSender {
    /// Send a frame, waiting for room
    pub async fn send(&self, frame: Frame) -> Result<(), SessionError> {
        self.tx.send(frame).await.map_err(|_| SessionError::FeedClosed)
    }

    /// Send without waiting. A full feed drops the frame and returns `Ok(false)`.
    pub fn try_send(&self, frame: Frame) -> Result<bool, SessionError> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(frame)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(
                    "Frame feed full, dropped frame at {} ns (total dropped: {})",
                    frame.timestamp_ns, dropped
                );
                Ok(false)
            }
            Err(TrySendError::Closed(_)) => Err(SessionError::FeedClosed),
        }
    }

    /// Send from a non-async capture thread, waiting for room
    pub fn blocking_send(&self, frame: Frame) -> Result<(), SessionError> {
        self.tx.blocking_send(frame).map_err(|_| SessionError::FeedClosed)
    }

    /// Frames dropped by `try_send`
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half, drained by the session
#[derive(Debug)]
pub struct FrameFeed {
    rx: mpsc::Receiver<Frame>,
    dropped: Arc<AtomicU64>,
}

impl FrameFeed {
    /// Receive the next frame; `None` once every sender is gone
    pub async fn next(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Frames dropped upstream because the feed was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive_in_order() {
        let (tx, mut feed) = channel(4);
        for i in 0..3 {
            tx.send(Frame::new(i)).await.unwrap();
        }
        drop(tx);

        let mut seen = Vec::new();
        while let Some(frame) = feed.next().await {
            seen.push(frame.timestamp_ns);
        }
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_try_send_drops_when_full() {
        let (tx, mut feed) = channel(2);

        assert!(tx.try_send(Frame::new(0)).unwrap());
        assert!(tx.try_send(Frame::new(1)).unwrap());
        assert!(!tx.try_send(Frame::new(2)).unwrap());

        assert_eq!(tx.dropped(), 1);
        assert_eq!(feed.dropped(), 1);
        assert_eq!(feed.next().await.unwrap().timestamp_ns, 0);
    }

    #[tokio::test]
    async fn test_closed_feed() {
        let (tx, feed) = channel(1);
        drop(feed);

        assert!(matches!(tx.try_send(Frame::new(0)), Err(SessionError::FeedClosed)));
        assert!(matches!(tx.send(Frame::new(0)).await, Err(SessionError::FeedClosed)));
    }

    #[tokio::test]
    async fn test_blocking_send_from_capture_thread() {
        let (tx, mut feed) = channel(8);
        let handle = std::thread::spawn(move || {
            for i in 0..5 {
                tx.blocking_send(Frame::new(i)).unwrap();
            }
        });

        let mut count = 0;
        while feed.next().await.is_some() {
            count += 1;
        }
        handle.join().unwrap();
        assert_eq!(count, 5);
    }
}

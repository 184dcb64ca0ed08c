// SPDX-License-Identifier: GPL-3.0-only

//! Preview sink shared between a capture thread and its consumers
//!
//! The sink holds the most recent frame of the attached source. Consumers
//! subscribe and await [`FrameNotifier::next_frame`], which resolves once per
//! newly published frame. Only one source can be attached at a time; a feed
//! left over from a previous attachment is ignored.

use super::types::CameraFrame;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default)]
struct SinkState {
    /// Bumped on every attach, identifies the feed allowed to publish
    generation: u64,
    attached: bool,
    frame: Option<Arc<CameraFrame>>,
    /// Set by the capture side when the device stops delivering frames
    fault: Option<String>,
}

/// What a consumer observes when the sink signals
#[derive(Debug, Clone)]
pub enum SinkEvent {
    /// A new frame is available
    Frame(Arc<CameraFrame>),
    /// The source was detached; no frame to process
    Detached,
    /// The attached device reported an unrecoverable fault
    Fault(String),
}

/// Displayable frame sink
#[derive(Debug, Clone)]
pub struct PreviewSink {
    tx: Arc<watch::Sender<SinkState>>,
}

impl Default for PreviewSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSink {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SinkState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Attach a new source, returning the feed it publishes through
    ///
    /// Returns `None` if a source is already attached.
    pub fn attach(&self) -> Option<SinkFeed> {
        let mut generation = None;
        self.tx.send_if_modified(|state| {
            if state.attached {
                return false;
            }
            state.generation += 1;
            state.attached = true;
            state.frame = None;
            state.fault = None;
            generation = Some(state.generation);
            false
        });

        let generation = generation?;
        debug!(generation, "Source attached to preview sink");
        Some(SinkFeed {
            tx: Arc::clone(&self.tx),
            generation,
        })
    }

    /// Detach the current source and drop its last frame
    ///
    /// Returns `false` if nothing was attached.
    pub fn detach(&self) -> bool {
        let detached = self.tx.send_if_modified(|state| {
            if !state.attached {
                return false;
            }
            state.attached = false;
            state.frame = None;
            true
        });
        if detached {
            debug!("Source detached from preview sink");
        }
        detached
    }

    pub fn is_attached(&self) -> bool {
        self.tx.borrow().attached
    }

    /// Most recent frame, if a source is attached and has produced one
    pub fn current_frame(&self) -> Option<Arc<CameraFrame>> {
        let state = self.tx.borrow();
        if state.attached {
            state.frame.clone()
        } else {
            None
        }
    }

    /// Natural dimensions of the current frame
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.current_frame().map(|f| (f.width, f.height))
    }

    /// Subscribe to frame-ready notifications
    ///
    /// Frames published before the call are not reported.
    pub fn subscribe(&self) -> FrameNotifier {
        FrameNotifier {
            rx: self.tx.subscribe(),
        }
    }
}

/// Publishing half handed to the capture thread of the attached source
#[derive(Debug)]
pub struct SinkFeed {
    tx: Arc<watch::Sender<SinkState>>,
    generation: u64,
}

impl SinkFeed {
    /// Publish a frame; returns `false` if this feed is no longer attached
    pub fn publish(&self, frame: CameraFrame) -> bool {
        let sequence = frame.sequence;
        let frame = Arc::new(frame);
        let accepted = self.tx.send_if_modified(|state| {
            if !state.attached || state.generation != self.generation {
                return false;
            }
            state.frame = Some(frame);
            true
        });
        trace!(sequence, accepted, "Published frame");
        accepted
    }

    /// Report that the device will not deliver further frames
    pub fn fault(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.tx.send_if_modified(|state| {
            if !state.attached || state.generation != self.generation {
                return false;
            }
            state.fault = Some(reason);
            true
        });
    }

    pub fn is_attached(&self) -> bool {
        let state = self.tx.borrow();
        state.attached && state.generation == self.generation
    }
}

/// Single-shot frame-ready notifications from a [`PreviewSink`]
#[derive(Debug)]
pub struct FrameNotifier {
    rx: watch::Receiver<SinkState>,
}

impl FrameNotifier {
    /// Wait until the sink changes, then report what it holds
    ///
    /// Each call consumes one notification; the next call waits for a newer
    /// change. Frames published while nobody was waiting collapse into the
    /// latest one.
    pub async fn next_frame(&mut self) -> SinkEvent {
        if self.rx.changed().await.is_err() {
            return SinkEvent::Detached;
        }
        let state = self.rx.borrow_and_update();
        if let Some(reason) = &state.fault {
            return SinkEvent::Fault(reason.clone());
        }
        match (&state.frame, state.attached) {
            (Some(frame), true) => SinkEvent::Frame(Arc::clone(frame)),
            _ => SinkEvent::Detached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::PixelFormat;

    fn gray_frame(sequence: u64) -> CameraFrame {
        CameraFrame::new(2, 2, PixelFormat::Gray8, vec![0u8; 4]).restamped(sequence)
    }

    #[test]
    fn test_single_attachment() {
        let sink = PreviewSink::new();
        let feed = sink.attach().expect("first attach succeeds");
        assert!(sink.attach().is_none());
        assert!(feed.is_attached());

        assert!(sink.detach());
        assert!(!sink.detach());
        assert!(!feed.is_attached());
        assert!(sink.attach().is_some());
    }

    #[test]
    fn test_stale_feed_is_ignored() {
        let sink = PreviewSink::new();
        let old = sink.attach().unwrap();
        sink.detach();
        let new = sink.attach().unwrap();

        assert!(!old.publish(gray_frame(1)));
        assert!(sink.current_frame().is_none());
        assert!(new.publish(gray_frame(2)));
        assert_eq!(sink.current_frame().unwrap().sequence, 2);
        assert_eq!(sink.dimensions(), Some((2, 2)));
    }

    #[test]
    fn test_detach_clears_frame() {
        let sink = PreviewSink::new();
        let feed = sink.attach().unwrap();
        feed.publish(gray_frame(1));
        sink.detach();
        assert!(sink.current_frame().is_none());
        assert_eq!(sink.dimensions(), None);
    }

    #[tokio::test]
    async fn test_notifier_reports_frames_and_detach() {
        let sink = PreviewSink::new();
        let feed = sink.attach().unwrap();
        let mut notifier = sink.subscribe();

        feed.publish(gray_frame(7));
        match notifier.next_frame().await {
            SinkEvent::Frame(frame) => assert_eq!(frame.sequence, 7),
            other => panic!("unexpected event: {:?}", other),
        }

        sink.detach();
        assert!(matches!(notifier.next_frame().await, SinkEvent::Detached));
    }

    #[tokio::test]
    async fn test_notifier_reports_fault() {
        let sink = PreviewSink::new();
        let feed = sink.attach().unwrap();
        let mut notifier = sink.subscribe();

        feed.fault("unplugged");
        match notifier.next_frame().await {
            SinkEvent::Fault(reason) => assert_eq!(reason, "unplugged"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

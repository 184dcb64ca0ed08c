// SPDX-License-Identifier: GPL-3.0-only

//! Scan session state machine
//!
//! ```text
//! Idle ──acquire──▶ Running ──cancel / fatal error──▶ Stopped
//!                    │    ▲
//!                    └────┘ frame → luminance → decode → report
//! ```
//!
//! A session waits for the preview sink to announce a frame, converts it to a
//! luminance buffer, decodes it and reports hits through the callback. Frames
//! are handled one at a time in arrival order. Cancellation is checked at every
//! suspension point and always wins over a pending frame or decode.
//!
//! The device is released and the sink detached exactly once when the session
//! leaves `Running`, whatever the reason.

use super::tasks::SymbolReader;
use super::types::{DecodeResult, ReadOutcome};
use crate::backends::camera::{
    CameraBackend, CaptureOptions, Facing, FrameSource, PreviewSink, SinkEvent,
};
use crate::errors::{ScanError, ScanResult};
use crate::media::luminance::extract_luminance;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Lifecycle of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Running,
    /// Terminal
    Stopped,
}

/// Counters for a finished session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Frames handed to the decoder
    pub frames: u64,
    /// Frames that yielded a symbol
    pub decoded: u64,
}

/// Releases the frame source once, on whichever path ends the session
struct Teardown {
    source: Option<FrameSource>,
    state: watch::Sender<ScanState>,
}

impl Teardown {
    /// Release on the blocking pool (stopping joins the capture thread)
    async fn release(mut self) {
        if let Some(mut source) = self.source.take() {
            if let Err(e) = tokio::task::spawn_blocking(move || source.stop()).await {
                warn!(error = %e, "Camera release task failed");
            }
        }
        self.state.send_replace(ScanState::Stopped);
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        // Session future dropped mid-await
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
        self.state.send_replace(ScanState::Stopped);
    }
}

/// One scan session over a camera backend
pub struct ScanLoop<R: SymbolReader> {
    backend: Arc<dyn CameraBackend>,
    sink: PreviewSink,
    reader: R,
    facing: Facing,
    options: CaptureOptions,
    state: watch::Sender<ScanState>,
}

impl<R: SymbolReader> ScanLoop<R> {
    pub fn new(backend: Arc<dyn CameraBackend>, sink: PreviewSink, reader: R) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            backend,
            sink,
            reader,
            facing: Facing::default(),
            options: CaptureOptions::default(),
            state,
        }
    }

    /// Camera facing to request (environment by default)
    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_capture_options(mut self, options: CaptureOptions) -> Self {
        self.options = options;
        self
    }

    /// Observe the session state
    pub fn state(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// Run until `cancel` fires or a fatal error occurs
    ///
    /// Cancellation is a clean exit and returns `Ok`. Acquisition failures,
    /// luminance extraction failures, reader errors and a lost device end the
    /// session with `Err` after the device has been released.
    pub async fn run<F>(self, cancel: CancellationToken, mut on_result: F) -> ScanResult<ScanSummary>
    where
        F: FnMut(DecodeResult) + Send,
    {
        let ScanLoop {
            backend,
            sink,
            reader,
            facing,
            options,
            state,
        } = self;

        let mut summary = ScanSummary::default();

        // Subscribe before the source attaches so no early fault is missed
        let mut notifier = sink.subscribe();

        let source = match FrameSource::acquire(backend, facing, &sink, options).await {
            Ok(source) => source,
            Err(e) => {
                state.send_replace(ScanState::Stopped);
                return Err(e);
            }
        };

        let teardown = Teardown {
            source: Some(source),
            state,
        };

        if cancel.is_cancelled() {
            debug!("Scan cancelled during camera acquisition");
            teardown.release().await;
            return Ok(summary);
        }

        teardown.state.send_replace(ScanState::Running);
        info!(%facing, "Scanning");

        let reader = Arc::new(Mutex::new(reader));

        let outcome: ScanResult<()> = loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                event = notifier.next_frame() => event,
            };

            let frame = match event {
                SinkEvent::Frame(frame) => frame,
                SinkEvent::Fault(reason) => break Err(ScanError::DeviceLost(reason)),
                SinkEvent::Detached if sink.is_attached() => continue,
                SinkEvent::Detached => {
                    if cancel.is_cancelled() {
                        break Ok(());
                    }
                    break Err(ScanError::DeviceLost("preview sink detached".into()));
                }
            };

            if cancel.is_cancelled() {
                break Ok(());
            }

            summary.frames += 1;
            let sequence = frame.sequence;
            let reader = Arc::clone(&reader);
            let work = tokio::task::spawn_blocking(move || {
                let luminance = extract_luminance(&frame)?;
                drop(frame);
                let mut reader = reader
                    .lock()
                    .map_err(|_| ScanError::Task("symbol reader lock poisoned".into()))?;
                reader.decode(luminance)
            });

            let decoded = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                decoded = work => decoded,
            };

            match decoded {
                Ok(Ok(ReadOutcome::Found(result))) => {
                    summary.decoded += 1;
                    debug!(sequence, text = %result.text, "Reporting decode");
                    on_result(result);
                }
                Ok(Ok(ReadOutcome::NotFound)) => trace!(sequence, "No symbol"),
                Ok(Err(e)) => break Err(e),
                Err(e) => break Err(e.into()),
            }
        };

        teardown.release().await;

        match outcome {
            Ok(()) => {
                info!(frames = summary.frames, decoded = summary.decoded, "Scan stopped");
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, frames = summary.frames, "Scan ended with error");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::types::{AnchorPoint, Symbology};
    use crate::backends::virtual_camera::{VirtualCamera, VirtualCameraBackend};
    use crate::backends::camera::{CameraFrame, Framerate, PixelFormat};
    use crate::media::luminance::LuminanceBuffer;
    use std::time::Duration;

    /// Reports a hit for every frame whose first pixel is dark
    struct DarkPixelReader;

    impl SymbolReader for DarkPixelReader {
        fn decode(&mut self, image: LuminanceBuffer) -> ScanResult<ReadOutcome> {
            if image.data[0] < 128 {
                Ok(ReadOutcome::Found(DecodeResult {
                    text: "dark".into(),
                    symbology: Symbology::Code128,
                    anchors: vec![AnchorPoint { x: 0.0, y: 0.0 }],
                }))
            } else {
                Ok(ReadOutcome::NotFound)
            }
        }
    }

    fn backend(values: &[u8]) -> Arc<dyn CameraBackend> {
        let frames = values
            .iter()
            .map(|v| CameraFrame::new(4, 4, PixelFormat::Gray8, vec![*v; 16]))
            .collect();
        Arc::new(VirtualCameraBackend::new().with_camera(
            VirtualCamera::new("test", Facing::Environment, frames)
                .with_framerate(Framerate::from_int(200)),
        ))
    }

    #[tokio::test]
    async fn test_reports_hits_until_cancelled() {
        let sink = PreviewSink::new();
        let scan = ScanLoop::new(backend(&[0, 255]), sink.clone(), DarkPixelReader);
        let mut state = scan.state();
        let cancel = CancellationToken::new();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let task = tokio::spawn(scan.run(cancel.clone(), move |r| {
            let _ = tx.send(r);
        }));

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.text, "dark");
        assert_eq!(*state.borrow_and_update(), ScanState::Running);

        cancel.cancel();
        let summary = task.await.unwrap().unwrap();
        assert!(summary.decoded >= 1);
        assert!(summary.frames >= summary.decoded);
        assert_eq!(*state.borrow(), ScanState::Stopped);
        assert!(!sink.is_attached());
    }

    #[tokio::test]
    async fn test_unavailable_device_stops_session() {
        let sink = PreviewSink::new();
        let empty: Arc<dyn CameraBackend> = Arc::new(VirtualCameraBackend::new());
        let scan = ScanLoop::new(empty, sink.clone(), DarkPixelReader);
        let state = scan.state();

        let err = scan
            .run(CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::DeviceUnavailable(_)));
        assert_eq!(*state.borrow(), ScanState::Stopped);
        assert!(!sink.is_attached());
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Live frame source bound to a preview sink
//!
//! Acquiring a source opens a device for the requested facing, attaches it to
//! the preview sink and starts a capture thread that publishes every frame the
//! device produces. Stopping detaches the sink, ends the thread and releases
//! the device.

use super::frame_loop::{CaptureLoopController, LoopAction};
use super::preview::PreviewSink;
use super::{CameraBackend, CameraDevice, CaptureDevice, Facing};
use crate::constants::capture;
use crate::errors::{ScanError, ScanResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Capture thread tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Consecutive capture failures before the device is declared lost
    pub max_consecutive_failures: u32,
    /// Pause after a failed capture before retrying
    pub retry_delay: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_consecutive_failures: capture::MAX_CONSECUTIVE_FAILURES,
            retry_delay: capture::RETRY_DELAY,
        }
    }
}

/// Releases the device when the capture thread lets go of it
struct DeviceGuard(Box<dyn CaptureDevice>);

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        debug!(device = %self.0.info().name, "Releasing capture device");
        self.0.stop();
    }
}

/// Handle to a playing capture device
pub struct FrameSource {
    device: CameraDevice,
    sink: PreviewSink,
    capture_loop: Option<CaptureLoopController>,
}

impl FrameSource {
    /// Open a device for `facing`, bind it to `sink` and begin playback
    ///
    /// Device opening runs on the blocking pool. Fails with
    /// [`ScanError::DeviceUnavailable`] if no device can be opened or started,
    /// and with [`ScanError::SinkBusy`] if the sink already has a source.
    pub async fn acquire(
        backend: Arc<dyn CameraBackend>,
        facing: Facing,
        sink: &PreviewSink,
        options: CaptureOptions,
    ) -> ScanResult<Self> {
        info!(%facing, backend = %backend.backend_type(), "Acquiring camera");

        let device = tokio::task::spawn_blocking(move || {
            let mut device = backend.request_device(facing)?;
            if let Err(e) = device.start() {
                device.stop();
                return Err(e);
            }
            Ok(device)
        })
        .await?
        .map_err(ScanError::from_acquisition)?;

        let info = device.info().clone();
        let mut guard = DeviceGuard(device);

        let Some(feed) = sink.attach() else {
            warn!(device = %info.name, "Preview sink busy, releasing camera");
            drop(guard);
            return Err(ScanError::SinkBusy);
        };

        let mut failures = 0u32;
        let loop_name = format!("capture-{}", info.name);
        let device_name = info.name.clone();

        let capture_loop = CaptureLoopController::start(&loop_name, move || {
            if !feed.is_attached() {
                return LoopAction::Stop;
            }

            match guard.0.capture() {
                Ok(frame) => {
                    failures = 0;
                    feed.publish(frame);
                    LoopAction::Continue
                }
                Err(e) => {
                    failures += 1;
                    if failures >= options.max_consecutive_failures {
                        error!(
                            device = %device_name,
                            failures,
                            error = %e,
                            "Camera stopped delivering frames"
                        );
                        feed.fault(format!("{} ({} consecutive failures)", e, failures));
                        return LoopAction::Stop;
                    }
                    if failures == 1 || failures % 10 == 0 {
                        warn!(device = %device_name, failures, error = %e, "Failed to capture frame");
                    }
                    std::thread::sleep(options.retry_delay);
                    LoopAction::Continue
                }
            }
        });

        let capture_loop = match capture_loop {
            Ok(capture_loop) => capture_loop,
            Err(e) => {
                sink.detach();
                return Err(ScanError::DeviceUnavailable(e.to_string()));
            }
        };

        info!(device = %info.name, path = %info.path, "Camera playing");

        Ok(Self {
            device: info,
            sink: sink.clone(),
            capture_loop: Some(capture_loop),
        })
    }

    /// Device this source was opened from
    pub fn device(&self) -> &CameraDevice {
        &self.device
    }

    /// Whether the capture thread is still delivering frames
    pub fn is_playing(&self) -> bool {
        self.capture_loop
            .as_ref()
            .map(|l| l.is_running())
            .unwrap_or(false)
    }

    /// Detach the sink, end the capture thread and release the device
    ///
    /// Blocks for at most one capture of the device. Idempotent.
    pub fn stop(&mut self) {
        let Some(mut capture_loop) = self.capture_loop.take() else {
            return;
        };
        self.sink.detach();
        capture_loop.stop();
        info!(device = %self.device.name, "Camera stopped");
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

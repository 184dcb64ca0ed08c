// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │     ScanLoop        │
//! └──────────┬──────────┘
//!            │ frame-ready notifications
//!            ▼
//! ┌─────────────────────┐
//! │    PreviewSink      │  ← Latest frame of the attached source
//! └──────────▲──────────┘
//!            │ publish
//! ┌──────────┴──────────┐
//! │    FrameSource      │  ← Capture thread pumping one CaptureDevice
//! └──────────▲──────────┘
//!            │ request_device(facing)
//! ┌──────────┴──────────┐
//! │ CameraBackend Trait │  ← Virtual camera, V4L2
//! └─────────────────────┘
//! ```

pub mod frame_loop;
pub mod frame_source;
pub mod preview;
pub mod types;
#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use frame_loop::{CaptureLoopController, LoopAction};
pub use frame_source::{CaptureOptions, FrameSource};
pub use preview::{FrameNotifier, PreviewSink, SinkEvent, SinkFeed};
pub use types::*;

use crate::config::Config;
use std::sync::Arc;

/// An opened capture device
///
/// Implementations block in [`CaptureDevice::capture`] until the device has a
/// new frame, which paces the capture thread at the device framerate.
pub trait CaptureDevice: Send {
    /// Device this handle was opened from
    fn info(&self) -> &CameraDevice;

    /// Begin streaming
    fn start(&mut self) -> BackendResult<()>;

    /// Wait for and return the next frame
    fn capture(&mut self) -> BackendResult<CameraFrame>;

    /// Halt streaming and release the device
    ///
    /// Must be safe to call more than once.
    fn stop(&mut self);
}

/// Device acquisition capability
pub trait CameraBackend: Send + Sync {
    /// List the cameras this backend can open
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Open a camera oriented toward `facing`
    ///
    /// Fails with [`BackendError::DeviceNotFound`] when no camera can serve
    /// the request.
    fn request_device(&self, facing: Facing) -> BackendResult<Box<dyn CaptureDevice>>;

    /// Get the backend type
    fn backend_type(&self) -> CameraBackendType;
}

/// Pick the camera that best serves a facing request
///
/// Exact facing matches win over cameras of unknown placement; the first
/// listed camera wins among equals.
pub fn select_device(cameras: &[CameraDevice], facing: Facing) -> Option<&CameraDevice> {
    cameras
        .iter()
        .find(|c| c.facing == facing)
        .or_else(|| cameras.iter().find(|c| c.facing.satisfies(facing)))
}

/// Build the backend selected in the configuration
pub fn get_backend(config: &Config) -> BackendResult<Arc<dyn CameraBackend>> {
    match config.backend {
        CameraBackendType::Virtual => Ok(Arc::new(
            crate::backends::virtual_camera::VirtualCameraBackend::from_config(
                &config.virtual_camera,
            )?,
        )),
        #[cfg(feature = "v4l2")]
        CameraBackendType::V4l2 => Ok(Arc::new(v4l2::V4l2Backend::new(config.v4l2.clone()))),
        #[cfg(not(feature = "v4l2"))]
        CameraBackendType::V4l2 => Err(BackendError::NotAvailable(
            "built without the `v4l2` feature".into(),
        )),
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Replays a fixed set of frames as if they came from a live camera, looping
//! forever at a fixed framerate. Frames come from image files or are handed
//! over in memory.

mod file_source;

pub use file_source::{collect_image_paths, load_image_as_frame};

use crate::backends::camera::types::{
    BackendError, BackendResult, CameraBackendType, CameraDevice, CameraFrame, Facing, Framerate,
};
use crate::backends::camera::{CameraBackend, CaptureDevice, select_device};
use crate::config::VirtualCameraConfig;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One virtual camera and the frames it replays
#[derive(Debug, Clone)]
pub struct VirtualCamera {
    device: CameraDevice,
    frames: Arc<[CameraFrame]>,
    framerate: Framerate,
}

impl VirtualCamera {
    /// Create a camera replaying in-memory frames
    pub fn new(name: &str, facing: Facing, frames: Vec<CameraFrame>) -> Self {
        Self {
            device: CameraDevice {
                name: name.to_string(),
                path: format!("virtual:{}", name),
                facing,
            },
            frames: frames.into(),
            framerate: Framerate::default(),
        }
    }

    /// Create a camera replaying image files (directories are expanded)
    pub fn from_images(
        name: &str,
        facing: Facing,
        paths: &[std::path::PathBuf],
    ) -> BackendResult<Self> {
        let frames = collect_image_paths(paths)?
            .iter()
            .map(|p| load_image_as_frame(p))
            .collect::<BackendResult<Vec<_>>>()?;
        Ok(Self::new(name, facing, frames))
    }

    /// Set the replay framerate
    pub fn with_framerate(mut self, framerate: Framerate) -> Self {
        self.framerate = framerate;
        self
    }

    pub fn device(&self) -> &CameraDevice {
        &self.device
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Backend serving a list of virtual cameras
#[derive(Debug, Clone, Default)]
pub struct VirtualCameraBackend {
    cameras: Vec<VirtualCamera>,
}

impl VirtualCameraBackend {
    /// Create a backend without cameras
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a camera
    pub fn with_camera(mut self, camera: VirtualCamera) -> Self {
        self.cameras.push(camera);
        self
    }

    /// Build from configuration; no configured images means no camera
    pub fn from_config(config: &VirtualCameraConfig) -> BackendResult<Self> {
        if config.images.is_empty() {
            debug!("No images configured for the virtual camera");
            return Ok(Self::new());
        }
        let camera = VirtualCamera::from_images("images", config.facing, &config.images)?
            .with_framerate(Framerate::from_int(config.framerate));
        info!(frames = camera.frame_count(), "Virtual camera ready");
        Ok(Self::new().with_camera(camera))
    }
}

impl CameraBackend for VirtualCameraBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.cameras.iter().map(|c| c.device.clone()).collect()
    }

    fn request_device(&self, facing: Facing) -> BackendResult<Box<dyn CaptureDevice>> {
        let devices = self.enumerate_cameras();
        let device = select_device(&devices, facing).ok_or_else(|| {
            BackendError::DeviceNotFound(format!("no virtual camera facing {}", facing))
        })?;
        let camera = self
            .cameras
            .iter()
            .find(|c| c.device == *device)
            .ok_or_else(|| BackendError::DeviceNotFound(device.name.clone()))?;

        if camera.frames.is_empty() {
            return Err(BackendError::InitializationFailed(format!(
                "virtual camera '{}' has no frames",
                camera.device.name
            )));
        }

        Ok(Box::new(VirtualCaptureDevice {
            camera: camera.clone(),
            index: 0,
            next_due: None,
            streaming: false,
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }
}

/// Opened virtual camera
struct VirtualCaptureDevice {
    camera: VirtualCamera,
    index: u64,
    next_due: Option<Instant>,
    streaming: bool,
}

impl CaptureDevice for VirtualCaptureDevice {
    fn info(&self) -> &CameraDevice {
        &self.camera.device
    }

    fn start(&mut self) -> BackendResult<()> {
        self.streaming = true;
        self.next_due = None;
        debug!(camera = %self.camera.device.name, framerate = %self.camera.framerate, "Virtual camera streaming");
        Ok(())
    }

    fn capture(&mut self) -> BackendResult<CameraFrame> {
        if !self.streaming {
            return Err(BackendError::CaptureFailed("camera is not streaming".into()));
        }

        let interval = self.camera.framerate.frame_interval();
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            std::thread::sleep(due - now);
        }
        self.next_due = Some(due.max(now) + interval);

        let slot = (self.index % self.camera.frames.len() as u64) as usize;
        self.index += 1;
        Ok(self.camera.frames[slot].restamped(self.index))
    }

    fn stop(&mut self) {
        if self.streaming {
            debug!(camera = %self.camera.device.name, frames = self.index, "Virtual camera stopped");
        }
        self.streaming = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::PixelFormat;

    fn gray(value: u8) -> CameraFrame {
        CameraFrame::new(2, 1, PixelFormat::Gray8, vec![value; 2])
    }

    #[test]
    fn test_frames_loop_in_order() {
        let backend = VirtualCameraBackend::new().with_camera(
            VirtualCamera::new("cam", Facing::Environment, vec![gray(1), gray(2)])
                .with_framerate(Framerate::from_int(1000)),
        );

        let mut device = backend.request_device(Facing::Environment).unwrap();
        device.start().unwrap();

        let values: Vec<(u8, u64)> = (0..5)
            .map(|_| {
                let frame = device.capture().unwrap();
                (frame.data[0], frame.sequence)
            })
            .collect();
        assert_eq!(values, vec![(1, 1), (2, 2), (1, 3), (2, 4), (1, 5)]);

        device.stop();
        device.stop();
        assert!(device.capture().is_err());
    }

    #[test]
    fn test_capture_requires_start() {
        let backend = VirtualCameraBackend::new()
            .with_camera(VirtualCamera::new("cam", Facing::External, vec![gray(0)]));
        let mut device = backend.request_device(Facing::Environment).unwrap();
        assert!(matches!(
            device.capture(),
            Err(BackendError::CaptureFailed(_))
        ));
    }

    #[test]
    fn test_facing_mismatch() {
        let backend = VirtualCameraBackend::new()
            .with_camera(VirtualCamera::new("selfie", Facing::User, vec![gray(0)]));
        assert!(matches!(
            backend.request_device(Facing::Environment),
            Err(BackendError::DeviceNotFound(_))
        ));
        assert!(backend.request_device(Facing::User).is_ok());
    }

    #[test]
    fn test_empty_camera_cannot_open() {
        let backend = VirtualCameraBackend::new()
            .with_camera(VirtualCamera::new("empty", Facing::Environment, Vec::new()));
        assert!(matches!(
            backend.request_device(Facing::Environment),
            Err(BackendError::InitializationFailed(_))
        ));
    }

    #[test]
    fn test_from_config_without_images() {
        let backend = VirtualCameraBackend::from_config(&VirtualCameraConfig::default()).unwrap();
        assert!(backend.enumerate_cameras().is_empty());
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Video4Linux2 capture backend
//!
//! Cameras come from the configuration when listed there (so their facing is
//! known), otherwise from the system's video nodes with unknown placement.
//! Devices are negotiated to YUYV at the configured size and streamed through
//! memory-mapped buffers.

use super::types::{
    BackendError, BackendResult, CameraBackendType, CameraDevice, CameraFrame, Facing, PixelFormat,
};
use super::{CameraBackend, CaptureDevice, select_device};
use crate::config::V4l2Config;
use crate::constants::v4l2 as defaults;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// V4L2 backend
pub struct V4l2Backend {
    config: V4l2Config,
}

impl V4l2Backend {
    pub fn new(config: V4l2Config) -> Self {
        Self { config }
    }
}

impl CameraBackend for V4l2Backend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        if !self.config.devices.is_empty() {
            return self
                .config
                .devices
                .iter()
                .map(|d| CameraDevice {
                    name: d.name.clone().unwrap_or_else(|| d.path.clone()),
                    path: d.path.clone(),
                    facing: d.facing,
                })
                .collect();
        }

        let mut nodes = v4l::context::enum_devices();
        nodes.sort_by_key(|n| n.index());
        nodes
            .into_iter()
            .map(|node| {
                let path = node.path().to_string_lossy().into_owned();
                CameraDevice {
                    name: node.name().unwrap_or_else(|| path.clone()),
                    path,
                    facing: Facing::External,
                }
            })
            .collect()
    }

    fn request_device(&self, facing: Facing) -> BackendResult<Box<dyn CaptureDevice>> {
        let cameras = self.enumerate_cameras();
        let device = select_device(&cameras, facing)
            .ok_or_else(|| BackendError::DeviceNotFound(format!("no V4L2 camera facing {}", facing)))?
            .clone();

        Ok(Box::new(V4l2Camera {
            device,
            width: self.config.width,
            height: self.config.height,
            stream: None,
            format: None,
            sequence: 0,
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

/// Opened V4L2 camera
struct V4l2Camera {
    device: CameraDevice,
    width: u32,
    height: u32,
    stream: Option<Stream<'static>>,
    format: Option<(PixelFormat, Format)>,
    sequence: u64,
}

impl V4l2Camera {
    fn negotiate(&self, dev: &Device) -> BackendResult<(PixelFormat, Format)> {
        let mut format = dev
            .format()
            .map_err(|e| BackendError::InitializationFailed(format!("Failed to query format: {}", e)))?;
        format.width = self.width;
        format.height = self.height;
        format.fourcc = FourCC::new(b"YUYV");

        let format = match dev.set_format(&format) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "Could not set format, using current device format");
                dev.format().map_err(|e| {
                    BackendError::InitializationFailed(format!("Failed to query format: {}", e))
                })?
            }
        };

        let pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
            BackendError::FormatNotSupported(format!("unsupported pixel format {}", format.fourcc))
        })?;

        info!(
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            stride = format.stride,
            "Set V4L2 format"
        );
        Ok((pixel_format, format))
    }
}

impl CaptureDevice for V4l2Camera {
    fn info(&self) -> &CameraDevice {
        &self.device
    }

    fn start(&mut self) -> BackendResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        info!(path = %self.device.path, width = self.width, height = self.height, "Opening V4L2 device");
        let dev = Device::with_path(&self.device.path).map_err(|e| {
            BackendError::DeviceNotFound(format!("Failed to open {}: {}", self.device.path, e))
        })?;

        let format = self.negotiate(&dev)?;
        let stream = Stream::with_buffers(&dev, Type::VideoCapture, defaults::BUFFER_COUNT)
            .map_err(|e| {
                BackendError::InitializationFailed(format!("Failed to create buffer stream: {}", e))
            })?;

        self.format = Some(format);
        self.stream = Some(stream);
        Ok(())
    }

    fn capture(&mut self) -> BackendResult<CameraFrame> {
        let (Some(stream), Some((pixel_format, format))) = (self.stream.as_mut(), self.format.as_ref())
        else {
            return Err(BackendError::CaptureFailed("camera is not streaming".into()));
        };

        let (buf, meta) = stream
            .next()
            .map_err(|e| BackendError::CaptureFailed(e.to_string()))?;

        let used = (meta.bytesused as usize).min(buf.len());
        let used = if used == 0 { buf.len() } else { used };

        self.sequence += 1;
        Ok(CameraFrame {
            width: format.width,
            height: format.height,
            data: buf[..used].into(),
            format: *pixel_format,
            stride: format.stride.max(pixel_format.min_stride(format.width)),
            captured_at: Instant::now(),
            sequence: self.sequence,
        })
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            debug!(path = %self.device.path, frames = self.sequence, "V4L2 stream stopped");
        }
        self.format = None;
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Error types for scan sessions

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that end a scan session
///
/// A frame without a barcode is not an error; see
/// [`ReadOutcome::NotFound`](crate::app::frame_processor::ReadOutcome).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// No camera matches the request, or it could not be opened
    DeviceUnavailable(String),
    /// The preview sink already has a source attached
    SinkBusy,
    /// A frame could not be converted to a luminance buffer
    CaptureError(String),
    /// The symbol reader failed for a reason other than "no symbol present"
    Decode(String),
    /// The capture device stopped delivering frames
    DeviceLost(String),
    /// A background task panicked or was aborted
    Task(String),
    /// Configuration errors
    Config(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            ScanError::SinkBusy => write!(f, "Preview already has an active source"),
            ScanError::CaptureError(msg) => write!(f, "Frame capture failed: {}", msg),
            ScanError::Decode(msg) => write!(f, "Decoder error: {}", msg),
            ScanError::DeviceLost(msg) => write!(f, "Camera lost: {}", msg),
            ScanError::Task(msg) => write!(f, "Background task failed: {}", msg),
            ScanError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {}

impl ScanError {
    /// Acquisition failures are always reported as an unavailable device
    pub fn from_acquisition(err: BackendError) -> Self {
        ScanError::DeviceUnavailable(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ScanError {
    fn from(err: tokio::task::JoinError) -> Self {
        ScanError::Task(err.to_string())
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Config(err.to_string())
    }
}

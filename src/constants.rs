// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Number of rendered decodes kept in the recent-results list
pub const RECENT_RESULTS_CAPACITY: usize = 10;

/// Capture thread timing
pub mod capture {
    use std::time::Duration;

    /// Consecutive capture failures before a device is declared lost
    pub const MAX_CONSECUTIVE_FAILURES: u32 = 30;

    /// Pause between a failed capture and the retry
    pub const RETRY_DELAY: Duration = Duration::from_millis(10);
}

/// Virtual camera defaults
pub mod virtual_camera {
    /// Framerate at which still images are replayed
    pub const DEFAULT_FRAMERATE: u32 = 30;
}

/// V4L2 defaults
pub mod v4l2 {
    /// Requested capture width
    pub const DEFAULT_WIDTH: u32 = 1280;
    /// Requested capture height
    pub const DEFAULT_HEIGHT: u32 = 720;
    /// Memory-mapped buffers queued with the driver
    pub const BUFFER_COUNT: u32 = 4;
}

/// Supported file formats
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

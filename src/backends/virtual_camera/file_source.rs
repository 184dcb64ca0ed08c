// SPDX-License-Identifier: GPL-3.0-only

//! Image file loading for the virtual camera

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame, PixelFormat};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    debug!(width, height, "Image loaded successfully");

    Ok(CameraFrame::new(width, height, PixelFormat::RGBA, rgba.into_raw()))
}

/// Expand a list of files and directories into image files
///
/// Directories contribute their supported images in name order; explicitly
/// listed files are kept regardless of extension.
pub fn collect_image_paths(paths: &[PathBuf]) -> BackendResult<Vec<PathBuf>> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
                .flatten()
                .map(|entry| entry.path())
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .map(file_formats::is_image_extension)
                        .unwrap_or(false)
                })
                .collect();
            entries.sort();
            debug!(dir = %path.display(), count = entries.len(), "Collected images");
            images.extend(entries);
        } else if path.exists() {
            images.push(path.clone());
        } else {
            return Err(BackendError::DeviceNotFound(format!(
                "no such file: {}",
                path.display()
            )));
        }
    }

    Ok(images)
}

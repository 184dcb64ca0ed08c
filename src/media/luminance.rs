// SPDX-License-Identifier: GPL-3.0-only

//! Grayscale intensity extraction for barcode reading
//!
//! Every pixel is mapped to one 8-bit intensity with the same fixed-point
//! formula on every call, so a given frame always yields the same buffer.
//! YUV frames use their luma samples directly. Fully transparent RGBA pixels
//! count as white.

use crate::backends::camera::preview::PreviewSink;
use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::errors::{ScanError, ScanResult};
use tracing::trace;

/// Row-major grayscale intensities, one byte per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuminanceBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl LuminanceBuffer {
    /// Intensity at a pixel, `None` outside the buffer
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// Weighted RGB to intensity (weights sum to 1024, rounded)
#[inline]
pub fn rgb_to_luma(r: u8, g: u8, b: u8) -> u8 {
    ((306 * r as u32 + 601 * g as u32 + 117 * b as u32 + 0x200) >> 10) as u8
}

#[inline]
fn rgba_to_luma(r: u8, g: u8, b: u8, a: u8) -> u8 {
    if a == 0 { 0xFF } else { rgb_to_luma(r, g, b) }
}

/// Snapshots the current frame of a preview sink into luminance buffers
#[derive(Debug, Clone)]
pub struct LuminanceExtractor {
    sink: PreviewSink,
}

impl LuminanceExtractor {
    pub fn new(sink: PreviewSink) -> Self {
        Self { sink }
    }

    /// Extract the frame the sink currently displays
    ///
    /// Fails with [`ScanError::CaptureError`] when the sink has no frame.
    pub fn extract(&self) -> ScanResult<LuminanceBuffer> {
        let frame = self
            .sink
            .current_frame()
            .ok_or_else(|| ScanError::CaptureError("preview sink has no frame".into()))?;
        extract_luminance(&frame)
    }
}

/// Convert a frame to a luminance buffer of the same dimensions
///
/// Row padding (stride beyond the visible width) is skipped.
pub fn extract_luminance(frame: &CameraFrame) -> ScanResult<LuminanceBuffer> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    if width == 0 || height == 0 {
        return Err(ScanError::CaptureError(format!(
            "cannot rasterize a {}x{} frame",
            frame.width, frame.height
        )));
    }

    let row_bytes = frame.format.min_stride(frame.width) as usize;
    let stride = frame.stride as usize;
    if stride < row_bytes {
        return Err(ScanError::CaptureError(format!(
            "stride {} too small for {} pixels of {:?}",
            stride, width, frame.format
        )));
    }

    let required = stride * (height - 1) + row_bytes;
    if frame.data.len() < required {
        return Err(ScanError::CaptureError(format!(
            "frame buffer holds {} bytes, {}x{} {:?} needs {}",
            frame.data.len(),
            width,
            height,
            frame.format,
            required
        )));
    }

    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        let row = &frame.data[y * stride..y * stride + row_bytes];
        match frame.format {
            PixelFormat::RGBA => {
                data.extend(row.chunks_exact(4).map(|p| rgba_to_luma(p[0], p[1], p[2], p[3])))
            }
            PixelFormat::BGRA => {
                data.extend(row.chunks_exact(4).map(|p| rgba_to_luma(p[2], p[1], p[0], p[3])))
            }
            PixelFormat::RGB24 => {
                data.extend(row.chunks_exact(3).map(|p| rgb_to_luma(p[0], p[1], p[2])))
            }
            PixelFormat::YUYV => data.extend(row.iter().step_by(2)),
            PixelFormat::UYVY => data.extend(row.iter().skip(1).step_by(2)),
            PixelFormat::Gray8 | PixelFormat::NV12 | PixelFormat::I420 => {
                data.extend_from_slice(row)
            }
        }
    }

    trace!(
        width,
        height,
        format = ?frame.format,
        sequence = frame.sequence,
        "Extracted luminance"
    );

    Ok(LuminanceBuffer {
        width: frame.width,
        height: frame.height,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_weights() {
        assert_eq!(rgb_to_luma(0, 0, 0), 0);
        assert_eq!(rgb_to_luma(255, 255, 255), 255);
        assert_eq!(rgb_to_luma(255, 0, 0), 76);
        assert_eq!(rgb_to_luma(0, 255, 0), 150);
        assert_eq!(rgb_to_luma(0, 0, 255), 29);
    }

    #[test]
    fn test_rgba_and_bgra_agree() {
        let rgba = CameraFrame::new(2, 1, PixelFormat::RGBA, vec![255, 0, 0, 255, 0, 0, 0, 0]);
        let bgra = CameraFrame::new(2, 1, PixelFormat::BGRA, vec![0, 0, 255, 255, 0, 0, 0, 0]);

        let a = extract_luminance(&rgba).unwrap();
        let b = extract_luminance(&bgra).unwrap();
        assert_eq!(a, b);
        // transparent pixel reads as white
        assert_eq!(a.data, vec![76, 255]);
    }

    #[test]
    fn test_stride_padding_skipped() {
        let mut frame = CameraFrame::new(2, 2, PixelFormat::Gray8, vec![1, 2, 99, 99, 3, 4]);
        frame.stride = 4;
        let luma = extract_luminance(&frame).unwrap();
        assert_eq!(luma.data, vec![1, 2, 3, 4]);
        assert_eq!(luma.get(1, 1), Some(4));
        assert_eq!(luma.get(2, 0), None);
    }

    #[test]
    fn test_packed_yuv_uses_luma() {
        let yuyv = CameraFrame::new(2, 1, PixelFormat::YUYV, vec![10, 128, 20, 128]);
        let uyvy = CameraFrame::new(2, 1, PixelFormat::UYVY, vec![128, 10, 128, 20]);
        assert_eq!(extract_luminance(&yuyv).unwrap().data, vec![10, 20]);
        assert_eq!(extract_luminance(&uyvy).unwrap().data, vec![10, 20]);
    }

    #[test]
    fn test_nv12_reads_luma_plane() {
        let mut data = vec![7u8; 4];
        data.extend([128u8; 2]);
        let frame = CameraFrame::new(2, 2, PixelFormat::NV12, data);
        assert_eq!(extract_luminance(&frame).unwrap().data, vec![7; 4]);
    }

    #[test]
    fn test_zero_dimensions_fail() {
        let frame = CameraFrame::new(0, 4, PixelFormat::Gray8, Vec::new());
        assert!(matches!(
            extract_luminance(&frame),
            Err(ScanError::CaptureError(_))
        ));
    }

    #[test]
    fn test_short_buffer_fails() {
        let frame = CameraFrame::new(4, 4, PixelFormat::RGBA, vec![0u8; 10]);
        assert!(matches!(
            extract_luminance(&frame),
            Err(ScanError::CaptureError(_))
        ));
    }

    #[test]
    fn test_extractor_without_frame() {
        let extractor = LuminanceExtractor::new(PreviewSink::new());
        assert!(matches!(
            extractor.extract(),
            Err(ScanError::CaptureError(_))
        ));
    }

    #[test]
    fn test_extractor_reads_current_frame() {
        let sink = PreviewSink::new();
        let feed = sink.attach().unwrap();
        feed.publish(CameraFrame::new(1, 1, PixelFormat::RGB24, vec![255, 255, 255]));

        let luma = LuminanceExtractor::new(sink).extract().unwrap();
        assert_eq!(luma.data, vec![255]);
    }
}

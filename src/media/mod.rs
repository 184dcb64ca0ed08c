// SPDX-License-Identifier: GPL-3.0-only

//! Pixel processing utilities
//!
//! - [`luminance`]: Camera frames to grayscale intensity buffers for the
//!   barcode reader

pub mod luminance;

pub use luminance::{LuminanceBuffer, LuminanceExtractor, extract_luminance};

// SPDX-License-Identifier: GPL-3.0-only

//! Barcode Scan - live camera 1-D barcode scanning
//!
//! Frames flow from a camera backend into a preview sink; a scan session
//! converts each frame to luminance, hands it to a symbol reader and reports
//! every decode until it is cancelled.
//!
//! # Architecture
//!
//! - [`backends`]: Camera backends (virtual image replay, V4L2), preview sink
//! - [`media`]: Luminance extraction
//! - [`app`]: Scan loop, symbol reader, controller and recent results
//! - [`config`]: User configuration handling
//! - [`errors`]: Session error taxonomy
//!
//! # Example
//!
//! ```ignore
//! let backend = barcode_scan::backends::camera::get_backend(&config)?;
//! let mut controller = ScanController::from_config(backend, &config);
//! controller.start().await;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;

// Re-export commonly used types
pub use app::frame_processor::{DecodeResult, ReadOutcome, ScanLoop, ScanState, Symbology};
pub use app::{RecentResults, ScanController};
pub use config::Config;
pub use errors::{ScanError, ScanResult};

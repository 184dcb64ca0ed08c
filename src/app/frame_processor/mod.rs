// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing for barcode scanning
//!
//! A [`ScanLoop`] pulls frames from a preview sink, converts them to luminance
//! and hands them to a [`SymbolReader`]. Frames without a symbol are skipped
//! silently; hits are reported as [`DecodeResult`]s.

pub mod scan_loop;
pub mod tasks;
pub mod types;

pub use scan_loop::{ScanLoop, ScanState, ScanSummary};
pub use tasks::{RxingReader, SymbolReader};
pub use types::{AnchorPoint, DecodeResult, ReadOutcome, Symbology};

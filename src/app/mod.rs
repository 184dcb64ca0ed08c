// SPDX-License-Identifier: GPL-3.0-only

//! Scanning application logic
//!
//! - `frame_processor`: Scan loop, symbol reader and result types
//! - `controller`: Session start/stop/toggle and result bookkeeping
//! - `recent_results`: Bounded newest-first list of rendered decodes

pub mod controller;
pub mod frame_processor;
pub mod recent_results;

pub use controller::ScanController;
pub use recent_results::RecentResults;

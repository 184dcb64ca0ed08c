// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Scan Layer                  │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │               Backend Layer                 │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │  Virtual Camera  │  │   V4L2 Camera   │  │
//! │  │  (image replay)  │  │ (feature v4l2)  │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Backend traits, frame types, capture thread and preview sink
//! - [`virtual_camera`]: Still images replayed as a live camera

pub mod camera;
pub mod virtual_camera;

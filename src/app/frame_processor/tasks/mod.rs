// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks

pub mod barcode_reader;

pub use barcode_reader::{RxingReader, SymbolReader};

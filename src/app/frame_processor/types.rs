// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing results
//!
//! These types represent the output of the symbol reader and are handed to
//! the reporting callback of a scan session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-D barcode symbologies the reader can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Symbology {
    /// EAN-8 retail code (8 digits)
    Ean8,
    /// EAN-13 retail code (13 digits)
    Ean13,
    Code39,
    Code93,
    Code128,
}

impl Symbology {
    /// Symbologies enabled when nothing else is configured
    pub const DEFAULT: [Symbology; 5] = [
        Symbology::Ean8,
        Symbology::Ean13,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Code128,
    ];

    /// Parse a symbology name ("ean-8", "EAN8", "code128", ...)
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "ean8" => Some(Self::Ean8),
            "ean13" => Some(Self::Ean13),
            "code39" => Some(Self::Code39),
            "code93" => Some(Self::Code93),
            "code128" => Some(Self::Code128),
            _ => None,
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Symbology::Ean8 => "EAN-8",
            Symbology::Ean13 => "EAN-13",
            Symbology::Code39 => "Code 39",
            Symbology::Code93 => "Code 93",
            Symbology::Code128 => "Code 128",
        };
        f.write_str(name)
    }
}

/// A point locating a decoded symbol, in source frame pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPoint {
    pub x: f32,
    pub y: f32,
}

/// A successful decode
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeResult {
    /// Decoded payload
    pub text: String,
    /// Symbology the payload was read from
    pub symbology: Symbology,
    /// Anchor points in reader order
    pub anchors: Vec<AnchorPoint>,
}

impl DecodeResult {
    /// Render as `text (x1,y1,x2,y2,...)`, the form kept in recent results
    pub fn render(&self) -> String {
        let coords: Vec<String> = self
            .anchors
            .iter()
            .flat_map(|p| [p.x.to_string(), p.y.to_string()])
            .collect();
        format!("{} ({})", self.text, coords.join(","))
    }
}

/// Outcome of reading one frame
///
/// Frames without a symbol are the normal case, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Found(DecodeResult),
    NotFound,
}

impl ReadOutcome {
    pub fn found(self) -> Option<DecodeResult> {
        match self {
            ReadOutcome::Found(result) => Some(result),
            ReadOutcome::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let result = DecodeResult {
            text: "12345670".into(),
            symbology: Symbology::Ean8,
            anchors: vec![AnchorPoint { x: 10.5, y: 20.0 }, AnchorPoint { x: 90.0, y: 20.0 }],
        };
        assert_eq!(result.render(), "12345670 (10.5,20,90,20)");

        let bare = DecodeResult {
            anchors: Vec::new(),
            ..result
        };
        assert_eq!(bare.render(), "12345670 ()");
    }

    #[test]
    fn test_symbology_parse() {
        assert_eq!(Symbology::parse("EAN-8"), Some(Symbology::Ean8));
        assert_eq!(Symbology::parse("ean_13"), Some(Symbology::Ean13));
        assert_eq!(Symbology::parse("Code 128"), Some(Symbology::Code128));
        assert_eq!(Symbology::parse("qr"), None);
    }

    #[test]
    fn test_symbology_serde_names() {
        let json = serde_json::to_string(&Symbology::DEFAULT).unwrap();
        assert_eq!(json, r#"["ean8","ean13","code39","code93","code128"]"#);
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! 1-D barcode reading
//!
//! Luminance buffers are binarized with a hybrid (local block) threshold and
//! handed to a multi-format reader restricted to the configured symbologies.

use crate::app::frame_processor::types::{AnchorPoint, DecodeResult, ReadOutcome, Symbology};
use crate::errors::{ScanError, ScanResult};
use crate::media::luminance::LuminanceBuffer;
use rxing::common::HybridBinarizer;
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintType, DecodeHintValue, DecodingHintDictionary,
    Exceptions, Luma8LuminanceSource, MultiFormatReader,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Stateful symbol reader
///
/// `decode` distinguishes "no symbol in this frame" ([`ReadOutcome::NotFound`])
/// from reader failures (`Err`), which end a scan session.
pub trait SymbolReader: Send + 'static {
    fn decode(&mut self, image: LuminanceBuffer) -> ScanResult<ReadOutcome>;
}

impl<R: SymbolReader + ?Sized> SymbolReader for Box<R> {
    fn decode(&mut self, image: LuminanceBuffer) -> ScanResult<ReadOutcome> {
        (**self).decode(image)
    }
}

fn to_barcode_format(symbology: Symbology) -> BarcodeFormat {
    match symbology {
        Symbology::Ean8 => BarcodeFormat::EAN_8,
        Symbology::Ean13 => BarcodeFormat::EAN_13,
        Symbology::Code39 => BarcodeFormat::CODE_39,
        Symbology::Code93 => BarcodeFormat::CODE_93,
        Symbology::Code128 => BarcodeFormat::CODE_128,
    }
}

fn from_barcode_format(format: &BarcodeFormat) -> Option<Symbology> {
    match format {
        BarcodeFormat::EAN_8 => Some(Symbology::Ean8),
        BarcodeFormat::EAN_13 => Some(Symbology::Ean13),
        BarcodeFormat::CODE_39 => Some(Symbology::Code39),
        BarcodeFormat::CODE_93 => Some(Symbology::Code93),
        BarcodeFormat::CODE_128 => Some(Symbology::Code128),
        _ => None,
    }
}

/// Reader backed by rxing
///
/// Hints are applied to the inner reader once; every frame then reuses its state.
pub struct RxingReader {
    reader: MultiFormatReader,
    hints: DecodingHintDictionary,
    symbologies: Vec<Symbology>,
    decoded: u64,
}

impl Default for RxingReader {
    fn default() -> Self {
        Self::new(&Symbology::DEFAULT)
    }
}

impl RxingReader {
    /// Create a reader restricted to `symbologies` (all supported ones if empty)
    pub fn new(symbologies: &[Symbology]) -> Self {
        let symbologies = if symbologies.is_empty() {
            Symbology::DEFAULT.to_vec()
        } else {
            symbologies.to_vec()
        };
        let formats: HashSet<BarcodeFormat> =
            symbologies.iter().copied().map(to_barcode_format).collect();
        let hints = HashMap::from([(
            DecodeHintType::POSSIBLE_FORMATS,
            DecodeHintValue::PossibleFormats(formats),
        )]);

        let mut reader = MultiFormatReader::default();
        reader.set_hints(&hints);

        let this = Self {
            reader,
            hints,
            symbologies,
            decoded: 0,
        };
        debug!(formats = ?this.possible_formats(), "Reader configured");
        this
    }

    fn possible_formats(&self) -> Option<&HashSet<BarcodeFormat>> {
        match self.hints.get(&DecodeHintType::POSSIBLE_FORMATS) {
            Some(DecodeHintValue::PossibleFormats(formats)) => Some(formats),
            _ => None,
        }
    }

    /// Symbologies this reader looks for
    pub fn symbologies(&self) -> &[Symbology] {
        &self.symbologies
    }

    /// Number of symbols read so far
    pub fn decoded_count(&self) -> u64 {
        self.decoded
    }
}

impl SymbolReader for RxingReader {
    fn decode(&mut self, image: LuminanceBuffer) -> ScanResult<ReadOutcome> {
        let start = std::time::Instant::now();
        let (width, height) = (image.width, image.height);

        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(Luma8LuminanceSource::new(
            image.data, width, height,
        )));

        let result = match self.reader.decode_with_state(&mut bitmap) {
            Ok(result) => result,
            // Reader-level misses: nothing legible in this frame
            Err(
                Exceptions::NotFoundException(_)
                | Exceptions::ChecksumException(_)
                | Exceptions::FormatException(_),
            ) => {
                trace!(width, height, elapsed_ms = start.elapsed().as_millis(), "No symbol in frame");
                return Ok(ReadOutcome::NotFound);
            }
            Err(e) => return Err(ScanError::Decode(e.to_string())),
        };

        let Some(symbology) = from_barcode_format(result.getBarcodeFormat())
            .filter(|s| self.symbologies.contains(s))
        else {
            debug!(format = ?result.getBarcodeFormat(), "Ignoring symbol of unrequested format");
            return Ok(ReadOutcome::NotFound);
        };

        let anchors = result
            .getPoints()
            .iter()
            .map(|p| AnchorPoint { x: p.x, y: p.y })
            .collect();

        self.decoded += 1;
        debug!(
            %symbology,
            text = result.getText(),
            elapsed_ms = start.elapsed().as_millis(),
            "Decoded symbol"
        );

        Ok(ReadOutcome::Found(DecodeResult {
            text: result.getText().to_string(),
            symbology,
            anchors,
        }))
    }
}

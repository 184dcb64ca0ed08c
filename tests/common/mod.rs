// SPDX-License-Identifier: MPL-2.0

//! Shared fixtures for integration tests

#![allow(dead_code)]

use barcode_scan::app::frame_processor::{
    AnchorPoint, DecodeResult, ReadOutcome, SymbolReader, Symbology,
};
use barcode_scan::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraBackendType, CameraDevice, CameraFrame,
    CaptureDevice, Facing, PixelFormat,
};
use barcode_scan::media::LuminanceBuffer;
use barcode_scan::{ScanError, ScanResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const EAN_L_CODES: [&str; 10] = [
    "0001101", "0011001", "0010011", "0111101", "0100011", "0110001", "0101111", "0111011",
    "0110111", "0001011",
];

/// Bar pattern of an EAN-8 symbol (`true` = dark module)
pub fn ean8_modules(digits: &str) -> Vec<bool> {
    assert_eq!(digits.len(), 8, "EAN-8 needs 8 digits");
    let digits: Vec<usize> = digits
        .chars()
        .map(|c| c.to_digit(10).expect("digit") as usize)
        .collect();

    let mut pattern = String::from("101");
    for d in &digits[..4] {
        pattern.push_str(EAN_L_CODES[*d]);
    }
    pattern.push_str("01010");
    for d in &digits[4..] {
        // R codes are the complement of L codes
        pattern.extend(EAN_L_CODES[*d].chars().map(|c| if c == '1' { '0' } else { '1' }));
    }
    pattern.push_str("101");
    pattern.chars().map(|c| c == '1').collect()
}

/// Grayscale frame holding one EAN-8 symbol with a 10-module quiet zone
pub fn ean8_frame(digits: &str, module_px: u32, height: u32) -> CameraFrame {
    let modules = ean8_modules(digits);
    let quiet = 10;
    let width = (modules.len() as u32 + 2 * quiet) * module_px;

    let mut row = vec![255u8; width as usize];
    for (i, dark) in modules.iter().enumerate() {
        if *dark {
            let start = ((quiet + i as u32) * module_px) as usize;
            row[start..start + module_px as usize].fill(0);
        }
    }

    let mut data = Vec::with_capacity((width * height) as usize);
    for _ in 0..height {
        data.extend_from_slice(&row);
    }
    CameraFrame::new(width, height, PixelFormat::Gray8, data)
}

/// Plain white frame
pub fn blank_frame(width: u32, height: u32) -> CameraFrame {
    CameraFrame::new(
        width,
        height,
        PixelFormat::Gray8,
        vec![255u8; (width * height) as usize],
    )
}

/// Counters shared between a scripted backend and the test
#[derive(Debug, Default)]
pub struct DeviceStats {
    pub opened: AtomicUsize,
    pub started: AtomicUsize,
    pub captures: AtomicUsize,
    pub stop_calls: AtomicUsize,
}

impl DeviceStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

/// Backend with one camera replaying fixed frames (or failing every capture)
pub struct ScriptedBackend {
    pub frames: Vec<CameraFrame>,
    pub facing: Facing,
    pub interval: Duration,
    pub fail_captures: bool,
    pub stats: Arc<DeviceStats>,
}

impl ScriptedBackend {
    pub fn new(frames: Vec<CameraFrame>) -> Self {
        Self {
            frames,
            facing: Facing::Environment,
            interval: Duration::from_millis(5),
            fail_captures: false,
            stats: Arc::new(DeviceStats::default()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_captures: true,
            ..Self::new(vec![blank_frame(8, 8)])
        }
    }

    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn shared(self) -> (Arc<dyn CameraBackend>, Arc<DeviceStats>) {
        let stats = Arc::clone(&self.stats);
        (Arc::new(self), stats)
    }

    fn device(&self) -> CameraDevice {
        CameraDevice {
            name: "scripted".into(),
            path: "test:scripted".into(),
            facing: self.facing,
        }
    }
}

impl CameraBackend for ScriptedBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![self.device()]
    }

    fn request_device(&self, facing: Facing) -> BackendResult<Box<dyn CaptureDevice>> {
        let device = self.device();
        if !device.facing.satisfies(facing) {
            return Err(BackendError::DeviceNotFound(format!("no camera facing {}", facing)));
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedDevice {
            info: device,
            frames: self.frames.clone(),
            interval: self.interval,
            fail_captures: self.fail_captures,
            stats: Arc::clone(&self.stats),
            index: 0,
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }
}

struct ScriptedDevice {
    info: CameraDevice,
    frames: Vec<CameraFrame>,
    interval: Duration,
    fail_captures: bool,
    stats: Arc<DeviceStats>,
    index: usize,
}

impl CaptureDevice for ScriptedDevice {
    fn info(&self) -> &CameraDevice {
        &self.info
    }

    fn start(&mut self) -> BackendResult<()> {
        self.stats.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn capture(&mut self) -> BackendResult<CameraFrame> {
        std::thread::sleep(self.interval);
        self.stats.captures.fetch_add(1, Ordering::SeqCst);
        if self.fail_captures {
            return Err(BackendError::CaptureFailed("sensor unplugged".into()));
        }
        let frame = self.frames[self.index % self.frames.len()].restamped(self.index as u64 + 1);
        self.index += 1;
        Ok(frame)
    }

    fn stop(&mut self) {
        self.stats.stop_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// What a [`ScriptedReader`] answers for every frame
#[derive(Debug, Clone)]
pub enum Script {
    NotFound,
    /// Found, with the running hit count as text
    Count,
    Fail(String),
}

/// Reader answering from a script and counting its invocations
pub struct ScriptedReader {
    script: Script,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedReader {
    pub fn new(script: Script) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                script,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl SymbolReader for ScriptedReader {
    fn decode(&mut self, image: LuminanceBuffer) -> ScanResult<ReadOutcome> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.script {
            Script::NotFound => Ok(ReadOutcome::NotFound),
            Script::Count => Ok(ReadOutcome::Found(DecodeResult {
                text: n.to_string(),
                symbology: Symbology::Code128,
                anchors: vec![
                    AnchorPoint { x: 0.0, y: 0.0 },
                    AnchorPoint {
                        x: image.width as f32,
                        y: 0.0,
                    },
                ],
            })),
            Script::Fail(reason) => Err(ScanError::Decode(reason.clone())),
        }
    }
}

/// Poll `cond` until it holds, panicking after `limit`
pub async fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + limit;
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within {:?}",
            limit
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

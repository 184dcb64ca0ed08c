// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Scanning a live feed
//! - Decoding still images
//! - Inspecting and saving the configuration

use barcode_scan::app::frame_processor::{DecodeResult, ReadOutcome, RxingReader, SymbolReader};
use barcode_scan::backends::camera::{CameraBackendType, Facing, get_backend};
use barcode_scan::backends::virtual_camera::load_image_as_frame;
use barcode_scan::config::V4l2DeviceConfig;
use barcode_scan::media::extract_luminance;
use barcode_scan::{Config, ScanController};
use chrono::Local;
use futures::StreamExt;
use futures::channel::mpsc;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fold `scan` flags into the loaded configuration
pub fn apply_scan_overrides(
    mut config: Config,
    images: Vec<PathBuf>,
    device: Option<String>,
    facing: Option<Facing>,
) -> Config {
    if let Some(facing) = facing {
        config.facing = facing;
    }
    if !images.is_empty() {
        config.backend = CameraBackendType::Virtual;
        config.virtual_camera.images = images;
    }
    if let Some(path) = device {
        config.backend = CameraBackendType::V4l2;
        config.v4l2.devices = vec![V4l2DeviceConfig {
            path,
            facing: Facing::External,
            name: None,
        }];
    }
    config
}

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend = get_backend(config)?;
    let cameras = backend.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found ({} backend).", backend.backend_type());
        return Ok(());
    }

    println!("Available cameras ({} backend):", backend.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Path: {}", camera.path);
        println!("      Facing: {}", camera.facing);
    }

    Ok(())
}

/// Scan until Ctrl+C (or the first hit with `once`)
pub async fn scan(config: Config, once: bool) -> Result<(), Box<dyn std::error::Error>> {
    let backend = get_backend(&config)?;

    let (result_tx, mut results) = mpsc::unbounded::<DecodeResult>();
    let mut controller = ScanController::from_config(backend, &config).with_listener(move |r| {
        let _ = result_tx.unbounded_send(r.clone());
    });

    // Set up Ctrl+C handler
    let (stop_tx, mut stop_rx) = mpsc::unbounded::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.unbounded_send(());
    })?;

    controller.start().await;
    println!("Scanning... (press Ctrl+C to stop)");

    let mut check = tokio::time::interval(Duration::from_millis(200));
    let outcome = loop {
        tokio::select! {
            Some(result) = results.next() => {
                println!(
                    "[{}] {}: {}",
                    Local::now().format("%H:%M:%S%.3f"),
                    result.symbology,
                    result.render()
                );
                if once {
                    break controller.stop().await;
                }
            }
            _ = stop_rx.next() => {
                println!();
                println!("Stopping...");
                break controller.stop().await;
            }
            _ = check.tick() => {
                if !controller.is_active() {
                    break controller.wait().await;
                }
            }
        }
    };

    let recent = controller.recent();
    if !recent.is_empty() {
        println!();
        println!("Recent results:");
        for entry in &recent {
            println!("  {}", entry);
        }
    }

    match outcome {
        Some(Ok(summary)) => {
            println!(
                "Processed {} frames, {} barcodes read",
                summary.frames, summary.decoded
            );
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        None => Ok(()),
    }
}

/// Decode every image once
pub fn decode_images(config: &Config, images: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = RxingReader::new(&config.symbologies);
    let mut found = 0usize;

    for path in images {
        let frame = load_image_as_frame(path)?;
        let luminance = extract_luminance(&frame)?;
        match reader.decode(luminance)? {
            ReadOutcome::Found(result) => {
                found += 1;
                println!("{}: {}: {}", path.display(), result.symbology, result.render());
            }
            ReadOutcome::NotFound => println!("{}: no barcode found", path.display()),
        }
    }

    if found == 0 && !images.is_empty() {
        return Err("no barcode found in any image".into());
    }
    Ok(())
}

/// Print the effective configuration, optionally writing it out
pub fn show_config(
    config: &Config,
    path: Option<&Path>,
    save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        let saved = match path {
            Some(path) => {
                config.save_to(path)?;
                path.to_path_buf()
            }
            None => config.save()?,
        };
        println!();
        println!("Config saved: {}", saved.display());
    } else if let Some(default) = Config::default_path() {
        println!();
        println!("Config file: {}", path.unwrap_or(default.as_path()).display());
    }

    Ok(())
}

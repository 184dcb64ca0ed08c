// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=BARCODE_SCAN_VERSION");

    // Packagers pin the version string; local builds get the commit as build metadata
    let version = std::env::var("BARCODE_SCAN_VERSION").unwrap_or_else(|_| {
        let package = env!("CARGO_PKG_VERSION");
        match short_commit() {
            Some(commit) => format!("{}+{}", package, commit),
            None => package.to_string(),
        }
    });

    println!("cargo::rustc-env=BUILD_VERSION={}", version);
}

fn short_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (output.status.success() && !commit.is_empty()).then_some(commit)
}

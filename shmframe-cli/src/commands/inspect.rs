// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmframe inspect` command - Poll a frame region.
//!
//! Maps the region read-only, reports the header and a payload checksum.
//! Never writes to the region.

use std::time::Duration;

use serde::Serialize;
use shmframe_core::shm::{FrameProbe, FrameSnapshot, ProbeState};
use shmframe_core::SharedMemoryError;

use crate::commands::resolve_region_name;

/// One probe result as printed by `--json`.
#[derive(Debug, Serialize)]
struct InspectReport<'a> {
    name: &'a str,
    state: &'static str,
    width: u32,
    height: u32,
    stride: u32,
    sequence: u32,
    region_len: usize,
    payload_crc32: Option<u32>,
}

impl<'a> InspectReport<'a> {
    fn new(name: &'a str, snapshot: &FrameSnapshot) -> Self {
        let state = match snapshot.state {
            ProbeState::Frame => "frame",
            ProbeState::Torn => "torn",
            ProbeState::Closing => "closing",
            ProbeState::Inconsistent => "inconsistent",
        };
        let payload_crc32 = match snapshot.state {
            ProbeState::Frame | ProbeState::Torn => Some(snapshot.payload_crc32()),
            _ => None,
        };
        Self {
            name,
            state,
            width: snapshot.header.width,
            height: snapshot.header.height,
            stride: snapshot.header.stride,
            sequence: snapshot.header.sequence,
            region_len: snapshot.region_len,
            payload_crc32,
        }
    }
}

pub async fn execute(
    config_path: Option<&str>,
    name: Option<String>,
    watch: bool,
    interval_ms: u64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = resolve_region_name(config_path, name)?;
    let probe = FrameProbe::new(name.clone());

    tracing::debug!(name = %name, watch = watch, "Inspecting frame region");

    if !watch {
        return report(&probe, json);
    }

    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A missing region is expected while the publisher restarts.
                if let Err(e) = report(&probe, json) {
                    eprintln!("✗ {}", e);
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}

fn report(probe: &FrameProbe, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = match probe.snapshot() {
        Ok(snapshot) => snapshot,
        Err(SharedMemoryError::NotFound { name }) => {
            return Err(format!("No frame region named '{}'", name).into());
        }
        Err(e) => return Err(e.into()),
    };

    let report = InspectReport::new(probe.name().as_str(), &snapshot);

    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    match snapshot.state {
        ProbeState::Closing => {
            println!("■ {}: publisher closing ({} bytes)", report.name, report.region_len);
        }
        ProbeState::Inconsistent => {
            println!(
                "✗ {}: header {}x{} stride {} exceeds region of {} bytes",
                report.name, report.width, report.height, report.stride, report.region_len
            );
        }
        ProbeState::Frame | ProbeState::Torn => {
            println!(
                "{} {}: {}x{} stride {} seq {} crc32 {:08x}{}",
                if snapshot.state == ProbeState::Frame { "✓" } else { "~" },
                report.name,
                report.width,
                report.height,
                report.stride,
                report.sequence,
                report.payload_crc32.unwrap_or_default(),
                if snapshot.state == ProbeState::Torn { " (torn)" } else { "" }
            );
        }
    }

    Ok(())
}

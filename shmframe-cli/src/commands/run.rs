// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmframe run` command - Publish a synthetic test pattern.
//!
//! Acts as the frame-producing host: one production cycle per tick, a
//! shutdown call on Ctrl-C or after `--frames` cycles.

use std::time::Duration;

use shmframe_core::{CycleOutcome, FrameGrabber, GrabberConfig, PublisherRegistry};

use crate::commands::load_config;
use crate::pattern::TestPattern;

/// Options for the run command.
pub struct RunOptions {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub frames: Option<u64>,
    pub resize_every: Option<u64>,
    pub stats_json: bool,
}

/// Reject options that would fail every cycle or allocate an oversized pattern.
fn check_options(options: &RunOptions, grabber: &GrabberConfig) -> Result<(), String> {
    if options.fps == 0 {
        return Err("--fps must be greater than 0".to_string());
    }
    if options.width == 0 || options.height == 0 {
        return Err("--width and --height must be greater than 0".to_string());
    }
    if options.width > grabber.max_width || options.height > grabber.max_height {
        return Err(format!(
            "{}x{} exceeds the configured maximum of {}x{}",
            options.width, options.height, grabber.max_width, grabber.max_height
        ));
    }
    Ok(())
}

pub async fn execute(
    config_path: Option<&str>,
    options: RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    check_options(&options, &config.grabber)?;

    tracing::info!(
        region = %config.grabber.region_name,
        width = options.width,
        height = options.height,
        fps = options.fps,
        "Starting frame publisher"
    );

    let registry = PublisherRegistry::new_shared();
    let mut grabber = FrameGrabber::new(&registry, config.grabber);

    let full = TestPattern::new(options.width, options.height);
    let half = TestPattern::new((options.width / 2).max(1), (options.height / 2).max(1));
    let mut patterns = [full, half];
    let mut current = 0usize;

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / options.fps as f64));
    let mut cycle: u64 = 0;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    println!(
        "▶ Publishing {}x{} @ {} fps to '{}' (Ctrl-C to stop)",
        options.width,
        options.height,
        options.fps,
        grabber.config().region_name
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }

        if let Some(limit) = options.frames {
            if cycle >= limit {
                break;
            }
        }

        if let Some(every) = options.resize_every {
            if every > 0 && cycle > 0 && cycle % every == 0 {
                current = 1 - current;
            }
        }

        let pattern = &mut patterns[current];
        let (width, height) = (pattern.width(), pattern.height());
        match grabber.on_frame(pattern.render(cycle), width, height) {
            CycleOutcome::Published { sequence } => {
                tracing::trace!(sequence = sequence, "Frame published");
            }
            CycleOutcome::Skipped(reason) => {
                tracing::debug!(reason = ?reason, "Cycle skipped");
            }
        }
        cycle += 1;
    }

    grabber.shutdown();
    let stats = grabber.stats();

    match stats {
        Some(stats) if options.stats_json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Some(stats) => {
            println!("✓ Publisher stopped");
            println!("  Frames published: {}", stats.frames_published);
            println!("  Cycles skipped:   {}", stats.cycles_skipped);
            println!("  Regions opened:   {}", stats.regions_opened);
            println!("  Regions closed:   {}", stats.regions_closed);
        }
        None => {
            for property in grabber.properties() {
                eprintln!("✗ {}", property.text());
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(width: u32, height: u32, fps: u32) -> RunOptions {
        RunOptions {
            width,
            height,
            fps,
            frames: None,
            resize_every: None,
            stats_json: false,
        }
    }

    #[test]
    fn test_check_options_accepts_default_size() {
        assert!(check_options(&options(640, 480, 30), &GrabberConfig::default()).is_ok());
    }

    #[test]
    fn test_check_options_rejects_oversized_frame() {
        let grabber = GrabberConfig::default();
        let err = check_options(&options(70_000, 70_000, 30), &grabber).unwrap_err();
        assert!(err.contains("70000x70000"));
        assert!(check_options(&options(grabber.max_width + 1, 1, 30), &grabber).is_err());
    }

    #[test]
    fn test_check_options_rejects_zero_values() {
        let grabber = GrabberConfig::default();
        assert!(check_options(&options(640, 480, 0), &grabber).is_err());
        assert!(check_options(&options(0, 480, 30), &grabber).is_err());
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmframe validate` command - Validate configuration file.

use shmframe_core::ConfigLoader;

pub async fn execute(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            let grabber = &config.grabber;
            println!("✓ Configuration is valid");
            println!();
            println!("Grabber Settings:");
            println!("  Region Name:      {}", grabber.region_name);
            println!(
                "  Max Frame Size:   {}x{}",
                grabber.max_width, grabber.max_height
            );
            println!("  Flush On Close:   {}", grabber.flush_on_close);
            println!("  Unlink On Close:  {}", grabber.unlink_on_close);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

use serde::{Deserialize, Serialize};

use crate::state::PublisherState;
use crate::types::FrameDimensions;

/// Counters kept by the lifecycle controller.
/// Serialized by the CLI for `run --stats-json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublisherStats {
    pub state: PublisherState,
    pub dimensions: Option<FrameDimensions>,
    pub frames_published: u64,
    pub cycles_skipped: u64,
    pub staging_failures: u64,
    pub regions_opened: u64,
    pub regions_closed: u64,
    pub last_sequence: Option<u32>,
}

impl Default for PublisherStats {
    fn default() -> Self {
        Self {
            state: PublisherState::Uninitialized,
            dimensions: None,
            frames_published: 0,
            cycles_skipped: 0,
            staging_failures: 0,
            regions_opened: 0,
            regions_closed: 0,
            last_sequence: None,
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Lifecycle controller.
//!
//! Runs once per production cycle on the host's thread. Detects frame size
//! changes, recreates the region when they happen (a region cannot grow in
//! place), publishes the frame and writes the termination sentinel on
//! shutdown. Every failure is confined to the cycle it happened in: it is
//! logged, the cycle is skipped, and the next cycle starts over.

use crate::config::GrabberConfig;
use crate::error::{SharedMemoryError, StagingError};
use crate::publisher::FramePublisher;
use crate::shm::{RegionBackend, RegionManager};
use crate::state::{PublisherState, PublisherStateMachine};
use crate::stats::PublisherStats;
use crate::types::FrameDimensions;

/// Why a cycle produced no frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The host reported a zero-sized source.
    ZeroDimensions,
    /// Dimensions overflow the layout or exceed the configured limits.
    InvalidDimensions,
    /// The region could not be created or mapped.
    OpenFailed,
    /// The region vanished; it is dropped and reopened next cycle.
    RegionUnavailable,
    /// The pixel buffer did not match the dimensions.
    PixelBufferMismatch,
    /// Pixel acquisition failed upstream.
    Staging,
    /// The controller has shut down.
    Closed,
}

/// Result of one production cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Published { sequence: u32 },
    Skipped(SkipReason),
}

impl CycleOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// Owns the region manager and drives it through the publisher lifecycle.
#[derive(Debug)]
pub struct LifecycleController {
    manager: RegionManager,
    publisher: FramePublisher,
    state: PublisherStateMachine,
    max_width: u32,
    max_height: u32,
    stats: PublisherStats,
}

impl LifecycleController {
    /// Controller on the native backend, configured from `config`.
    pub fn new(config: &GrabberConfig) -> Self {
        let manager = RegionManager::new(config.region_name.clone());
        Self::with_manager(config, manager)
    }

    /// Controller on an explicit backend.
    pub fn with_backend(config: &GrabberConfig, backend: Box<dyn RegionBackend>) -> Self {
        let manager = RegionManager::with_backend(config.region_name.clone(), backend);
        Self::with_manager(config, manager)
    }

    fn with_manager(config: &GrabberConfig, manager: RegionManager) -> Self {
        Self {
            manager: manager
                .flush_on_close(config.flush_on_close)
                .unlink_on_close(config.unlink_on_close),
            publisher: FramePublisher::new(),
            state: PublisherStateMachine::new(),
            max_width: config.max_width,
            max_height: config.max_height,
            stats: PublisherStats::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PublisherState {
        self.state.state()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> PublisherStats {
        let mut stats = self.stats.clone();
        stats.state = self.state.state();
        stats.dimensions = self.state.open_dimensions();
        stats
    }

    /// Region manager, for inspection.
    pub fn manager(&self) -> &RegionManager {
        &self.manager
    }

    /// Handle one delivered frame.
    pub fn on_frame(&mut self, pixels: &[u8], width: u32, height: u32) -> CycleOutcome {
        if self.state.state().is_terminal() {
            tracing::debug!("Frame delivered after shutdown, ignoring");
            return CycleOutcome::Skipped(SkipReason::Closed);
        }

        if width == 0 || height == 0 {
            return self.skip(SkipReason::ZeroDimensions);
        }

        let dims = match FrameDimensions::new(width, height) {
            Ok(dims) if width <= self.max_width && height <= self.max_height => dims,
            Ok(dims) => {
                tracing::warn!(
                    dims = %dims,
                    max_width = self.max_width,
                    max_height = self.max_height,
                    "Frame exceeds configured limits"
                );
                return self.skip(SkipReason::InvalidDimensions);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rejecting frame");
                return self.skip(SkipReason::InvalidDimensions);
            }
        };

        if let Err(reason) = self.ensure_open(dims) {
            return self.skip(reason);
        }

        let Some(region) = self.manager.region_mut() else {
            self.invalidate();
            return self.skip(SkipReason::RegionUnavailable);
        };

        match self.publisher.publish(region, dims, pixels) {
            Ok(sequence) => {
                self.stats.frames_published += 1;
                self.stats.last_sequence = Some(sequence);
                CycleOutcome::Published { sequence }
            }
            Err(SharedMemoryError::PixelBufferMismatch {
                expected, actual, ..
            }) => {
                tracing::warn!(expected = expected, actual = actual, "Pixel buffer size mismatch");
                self.skip(SkipReason::PixelBufferMismatch)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Publish failed, region will be reopened");
                self.invalidate();
                self.skip(SkipReason::RegionUnavailable)
            }
        }
    }

    /// Record that the host could not acquire pixels this cycle.
    pub fn on_staging_failure(&mut self, error: &StagingError) -> CycleOutcome {
        if self.state.state().is_terminal() {
            return CycleOutcome::Skipped(SkipReason::Closed);
        }
        tracing::warn!(error = %error, "No frame this cycle");
        self.stats.staging_failures += 1;
        self.skip(SkipReason::Staging)
    }

    /// Close the region with a termination sentinel and stop for good.
    ///
    /// Returns the result of the close; repeated calls are no-ops returning true.
    pub fn shutdown(&mut self) -> bool {
        if self.state.state().is_terminal() {
            return true;
        }

        let ok = self.close_region();
        if let Err(e) = self.state.transition_to(PublisherState::Closed) {
            tracing::error!(error = %e, "Unexpected state during shutdown");
        }
        tracing::info!(frames = self.stats.frames_published, "Frame publisher shut down");
        ok
    }

    /// Make sure a region sized for `dims` is open.
    fn ensure_open(&mut self, dims: FrameDimensions) -> Result<(), SkipReason> {
        match self.state.open_dimensions() {
            Some(open) if open == dims && self.manager.is_open() => return Ok(()),
            Some(open) => {
                tracing::info!(from = %open, to = %dims, "Frame dimensions changed, recreating region");
                self.close_region();
            }
            None => {}
        }

        match self.manager.open(dims) {
            Ok(_) => {
                self.publisher.reset();
                self.stats.regions_opened += 1;
                self.transition(PublisherState::Open(dims));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(dims = %dims, error = %e, "Skipping cycle, will retry open next cycle");
                if self.state.open_dimensions().is_some() {
                    self.transition(PublisherState::Uninitialized);
                }
                Err(SkipReason::OpenFailed)
            }
        }
    }

    /// Drop a region that can no longer be written.
    fn invalidate(&mut self) {
        self.close_region();
        if self.state.open_dimensions().is_some() {
            self.transition(PublisherState::Uninitialized);
        }
    }

    fn close_region(&mut self) -> bool {
        if !self.manager.is_open() {
            return true;
        }
        let ok = self.manager.close();
        self.stats.regions_closed += 1;
        ok
    }

    fn transition(&mut self, target: PublisherState) {
        if let Err(e) = self.state.transition_to(target) {
            tracing::error!(error = %e, "Invalid lifecycle transition");
        }
    }

    fn skip(&mut self, reason: SkipReason) -> CycleOutcome {
        self.stats.cycles_skipped += 1;
        tracing::debug!(reason = ?reason, "Cycle skipped");
        CycleOutcome::Skipped(reason)
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::testing::{Behavior, HeapBackend};

    fn controller(backend: &HeapBackend) -> LifecycleController {
        LifecycleController::with_backend(&GrabberConfig::default(), Box::new(backend.clone()))
    }

    fn frame(w: u32, h: u32) -> Vec<u8> {
        vec![0x7F; (w * h * 4) as usize]
    }

    #[test]
    fn test_first_frame_opens_region() {
        let backend = HeapBackend::new();
        let mut ctl = controller(&backend);
        assert_eq!(ctl.state(), PublisherState::Uninitialized);

        let outcome = ctl.on_frame(&frame(4, 3), 4, 3);
        assert_eq!(outcome, CycleOutcome::Published { sequence: 0 });
        assert_eq!(
            ctl.state(),
            PublisherState::Open(FrameDimensions::new(4, 3).unwrap())
        );
        assert_eq!(ctl.manager().region().unwrap().len(), 16 + 4 * 3 * 4);
    }

    #[test]
    fn test_same_dimensions_reuse_region() {
        let backend = HeapBackend::new();
        let mut ctl = controller(&backend);

        for expected in 0..3 {
            assert_eq!(
                ctl.on_frame(&frame(2, 2), 2, 2),
                CycleOutcome::Published { sequence: expected }
            );
        }
        assert_eq!(backend.create_count(), 1);
    }

    #[test]
    fn test_resize_closes_then_opens_once() {
        let backend = HeapBackend::new();
        let mut ctl = controller(&backend);

        ctl.on_frame(&frame(640, 480), 640, 480);
        ctl.on_frame(&frame(640, 480), 640, 480);
        let outcome = ctl.on_frame(&frame(1280, 720), 1280, 720);

        assert_eq!(outcome, CycleOutcome::Published { sequence: 0 });
        let stats = ctl.stats();
        assert_eq!(stats.regions_opened, 2);
        assert_eq!(stats.regions_closed, 1);
        assert_eq!(backend.create_count(), 2);
        assert_eq!(ctl.manager().region().unwrap().len(), 16 + 1280 * 720 * 4);
    }

    #[test]
    fn test_zero_dimensions_skip_without_open() {
        let backend = HeapBackend::new();
        let mut ctl = controller(&backend);

        assert_eq!(
            ctl.on_frame(&[], 0, 480),
            CycleOutcome::Skipped(SkipReason::ZeroDimensions)
        );
        assert_eq!(backend.create_count(), 0);
        assert_eq!(ctl.state(), PublisherState::Uninitialized);
    }

    #[test]
    fn test_open_failure_skips_and_retries() {
        let backend = HeapBackend::new();
        backend.set_behavior(Behavior::FailAllocation);
        let mut ctl = controller(&backend);

        assert_eq!(
            ctl.on_frame(&frame(2, 2), 2, 2),
            CycleOutcome::Skipped(SkipReason::OpenFailed)
        );
        assert_eq!(ctl.state(), PublisherState::Uninitialized);

        backend.set_behavior(Behavior::Succeed);
        assert!(ctl.on_frame(&frame(2, 2), 2, 2).is_published());
        assert_eq!(backend.create_count(), 2);
    }

    #[test]
    fn test_failed_reopen_after_resize_returns_to_uninitialized() {
        let backend = HeapBackend::new();
        let mut ctl = controller(&backend);
        ctl.on_frame(&frame(2, 2), 2, 2);

        backend.set_behavior(Behavior::FailMapping);
        assert_eq!(
            ctl.on_frame(&frame(4, 4), 4, 4),
            CycleOutcome::Skipped(SkipReason::OpenFailed)
        );
        assert_eq!(ctl.state(), PublisherState::Uninitialized);
        assert!(!ctl.manager().is_open());

        backend.set_behavior(Behavior::Succeed);
        assert_eq!(
            ctl.on_frame(&frame(4, 4), 4, 4),
            CycleOutcome::Published { sequence: 0 }
        );
    }

    #[test]
    fn test_unmapped_region_is_reopened_next_cycle() {
        let backend = HeapBackend::new();
        backend.set_behavior(Behavior::NullMapping);
        let mut ctl = controller(&backend);

        assert_eq!(
            ctl.on_frame(&frame(2, 2), 2, 2),
            CycleOutcome::Skipped(SkipReason::RegionUnavailable)
        );
        assert_eq!(ctl.state(), PublisherState::Uninitialized);

        backend.set_behavior(Behavior::Succeed);
        assert!(ctl.on_frame(&frame(2, 2), 2, 2).is_published());
    }

    #[test]
    fn test_pixel_mismatch_keeps_region() {
        let backend = HeapBackend::new();
        let mut ctl = controller(&backend);

        assert_eq!(
            ctl.on_frame(&[0u8; 3], 2, 2),
            CycleOutcome::Skipped(SkipReason::PixelBufferMismatch)
        );
        assert!(ctl.manager().is_open());
        assert_eq!(
            ctl.on_frame(&frame(2, 2), 2, 2),
            CycleOutcome::Published { sequence: 0 }
        );
    }

    #[test]
    fn test_limits_enforced() {
        let backend = HeapBackend::new();
        let config = GrabberConfig {
            max_width: 100,
            max_height: 100,
            ..GrabberConfig::default()
        };
        let mut ctl = LifecycleController::with_backend(&config, Box::new(backend.clone()));

        assert_eq!(
            ctl.on_frame(&frame(101, 1), 101, 1),
            CycleOutcome::Skipped(SkipReason::InvalidDimensions)
        );
        assert_eq!(backend.create_count(), 0);
    }

    #[test]
    fn test_staging_failure_counts_skip() {
        let backend = HeapBackend::new();
        let mut ctl = controller(&backend);

        let outcome = ctl.on_staging_failure(&StagingError::MapFailed {
            width: 2,
            height: 2,
        });
        assert_eq!(outcome, CycleOutcome::Skipped(SkipReason::Staging));
        assert_eq!(ctl.stats().staging_failures, 1);
        assert_eq!(ctl.stats().cycles_skipped, 1);
    }

    #[test]
    fn test_shutdown_is_terminal() {
        let backend = HeapBackend::new();
        let mut ctl = controller(&backend);
        ctl.on_frame(&frame(2, 2), 2, 2);

        assert!(ctl.shutdown());
        assert_eq!(ctl.state(), PublisherState::Closed);
        assert!(!ctl.manager().is_open());
        assert!(ctl.shutdown());

        assert_eq!(
            ctl.on_frame(&frame(2, 2), 2, 2),
            CycleOutcome::Skipped(SkipReason::Closed)
        );
        assert_eq!(backend.create_count(), 1);
        assert_eq!(ctl.stats().regions_closed, 1);
    }

    #[test]
    fn test_shutdown_before_first_frame() {
        let backend = HeapBackend::new();
        let mut ctl = controller(&backend);
        assert!(ctl.shutdown());
        assert_eq!(ctl.state(), PublisherState::Closed);
        assert_eq!(backend.create_count(), 0);
    }
}

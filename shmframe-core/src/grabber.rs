// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! FrameGrabber - the host-facing publisher instance.
//!
//! The host creates one grabber per video source it wants to share, calls
//! [`FrameGrabber::on_frame`] once per production cycle and
//! [`FrameGrabber::shutdown`] at end of life. A grabber created while another
//! one holds the registry lease is inert: it never touches shared memory and
//! reports the conflict through its property sheet.

use std::sync::Arc;

use serde::Serialize;

use crate::config::GrabberConfig;
use crate::error::{FrameShareError, StagingError};
use crate::lifecycle::{CycleOutcome, LifecycleController, SkipReason};
use crate::registry::{PublisherLease, PublisherRegistry};
use crate::shm::RegionBackend;
use crate::state::PublisherState;
use crate::stats::PublisherStats;

/// Display name shown by hosts.
pub const GRABBER_NAME: &str = "Shared Memory Frame Grabber";

/// Message shown by an inert grabber.
pub const ONLY_ONE_INSTANCE: &str = "Only one frame grabber instance allowed";

/// One entry of the grabber's configuration surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Property {
    /// Read-only informational text.
    Info { key: &'static str, text: String },
    /// Error text; hosts should render it prominently.
    Error { key: &'static str, text: String },
}

impl Property {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Info { key, .. } | Self::Error { key, .. } => key,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Info { text, .. } | Self::Error { text, .. } => text,
        }
    }
}

/// Host-facing frame publisher.
#[derive(Debug)]
pub struct FrameGrabber {
    config: GrabberConfig,
    controller: Option<LifecycleController>,
    _lease: Option<PublisherLease>,
    error: Option<FrameShareError>,
}

impl FrameGrabber {
    /// Create a grabber on the native shared memory backend.
    pub fn new(registry: &Arc<PublisherRegistry>, config: GrabberConfig) -> Self {
        Self::build(registry, config, LifecycleController::new)
    }

    /// Create a grabber on an explicit backend.
    pub fn with_backend(
        registry: &Arc<PublisherRegistry>,
        config: GrabberConfig,
        backend: Box<dyn RegionBackend>,
    ) -> Self {
        Self::build(registry, config, move |config| {
            LifecycleController::with_backend(config, backend)
        })
    }

    fn build(
        registry: &Arc<PublisherRegistry>,
        config: GrabberConfig,
        make: impl FnOnce(&GrabberConfig) -> LifecycleController,
    ) -> Self {
        match registry.acquire() {
            Ok(lease) => {
                tracing::info!(region = %config.region_name, "Frame grabber created");
                let controller = make(&config);
                Self {
                    config,
                    controller: Some(controller),
                    _lease: Some(lease),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("{}: {}", GRABBER_NAME, ONLY_ONE_INSTANCE);
                Self {
                    config,
                    controller: None,
                    _lease: None,
                    error: Some(e),
                }
            }
        }
    }

    /// Whether this grabber won the publisher lease when it was created.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Error that made this grabber inert, if any.
    pub fn error(&self) -> Option<&FrameShareError> {
        self.error.as_ref()
    }

    /// The configuration this grabber was created with.
    pub fn config(&self) -> &GrabberConfig {
        &self.config
    }

    /// Lifecycle state, or `None` for an inert grabber.
    pub fn state(&self) -> Option<PublisherState> {
        self.controller.as_ref().map(LifecycleController::state)
    }

    /// Counters, or `None` for an inert grabber.
    pub fn stats(&self) -> Option<PublisherStats> {
        self.controller.as_ref().map(LifecycleController::stats)
    }

    /// Configuration surface shown by the host.
    pub fn properties(&self) -> Vec<Property> {
        if self.error.is_some() {
            return vec![Property::Error {
                key: "error_message",
                text: format!("Error: {}", ONLY_ONE_INSTANCE),
            }];
        }

        vec![
            Property::Info {
                key: "plugin_description",
                text: GRABBER_NAME.to_string(),
            },
            Property::Info {
                key: "description",
                text: format!(
                    "Publishes frames from the video source to shared memory object '{}' \
                     for out-of-process readers.",
                    self.config.region_name
                ),
            },
            Property::Info {
                key: "version",
                text: env!("CARGO_PKG_VERSION").to_string(),
            },
            Property::Info {
                key: "author",
                text: env!("CARGO_PKG_AUTHORS").to_string(),
            },
        ]
    }

    /// Deliver one frame. Inert or shut-down grabbers skip it.
    pub fn on_frame(&mut self, pixels: &[u8], width: u32, height: u32) -> CycleOutcome {
        match self.controller.as_mut() {
            Some(controller) => controller.on_frame(pixels, width, height),
            None => CycleOutcome::Skipped(SkipReason::Closed),
        }
    }

    /// Report that pixels could not be acquired this cycle.
    pub fn on_staging_failure(&mut self, error: &StagingError) -> CycleOutcome {
        match self.controller.as_mut() {
            Some(controller) => controller.on_staging_failure(error),
            None => CycleOutcome::Skipped(SkipReason::Closed),
        }
    }

    /// Close the region and release the lease. Later calls are no-ops.
    pub fn shutdown(&mut self) -> bool {
        let ok = self
            .controller
            .as_mut()
            .map_or(true, LifecycleController::shutdown);
        self._lease = None;
        ok
    }
}

impl Drop for FrameGrabber {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::testing::HeapBackend;

    fn grabber(registry: &Arc<PublisherRegistry>, backend: &HeapBackend) -> FrameGrabber {
        FrameGrabber::with_backend(registry, GrabberConfig::default(), Box::new(backend.clone()))
    }

    #[test]
    fn test_first_grabber_is_valid() {
        let registry = PublisherRegistry::new_shared();
        let backend = HeapBackend::new();
        let mut g = grabber(&registry, &backend);

        assert!(g.is_valid());
        assert!(g.error().is_none());
        assert!(g.on_frame(&[0u8; 16], 2, 2).is_published());
        let keys: Vec<_> = g.properties().iter().map(Property::key).collect();
        assert_eq!(
            keys,
            ["plugin_description", "description", "version", "author"]
        );
        assert!(g
            .properties()
            .iter()
            .all(|p| matches!(p, Property::Info { .. })));
    }

    #[test]
    fn test_second_grabber_is_inert() {
        let registry = PublisherRegistry::new_shared();
        let first_backend = HeapBackend::new();
        let second_backend = HeapBackend::new();
        let _first = grabber(&registry, &first_backend);
        let mut second = grabber(&registry, &second_backend);

        assert!(!second.is_valid());
        assert_eq!(
            second.on_frame(&[0u8; 16], 2, 2),
            CycleOutcome::Skipped(SkipReason::Closed)
        );
        assert!(second.shutdown());
        assert_eq!(second_backend.create_count(), 0);
        assert!(second.stats().is_none());

        let props = second.properties();
        assert_eq!(props.len(), 1);
        assert!(matches!(props[0], Property::Error { .. }));
        assert!(props[0].text().contains(ONLY_ONE_INSTANCE));
        assert!(second.state().is_none());
    }

    #[test]
    fn test_shutdown_releases_lease() {
        let registry = PublisherRegistry::new_shared();
        let backend = HeapBackend::new();
        let mut g = grabber(&registry, &backend);

        g.on_frame(&[0u8; 16], 2, 2);
        assert!(g.shutdown());
        assert!(!registry.is_active());
        assert!(g.shutdown());
        assert!(g.is_valid());
        assert_eq!(g.state(), Some(PublisherState::Closed));
        assert_eq!(g.stats().unwrap().regions_closed, 1);
        assert_eq!(
            g.on_frame(&[0u8; 16], 2, 2),
            CycleOutcome::Skipped(SkipReason::Closed)
        );

        let next = grabber(&registry, &backend);
        assert!(next.is_valid());
    }

    #[test]
    fn test_drop_releases_lease() {
        let registry = PublisherRegistry::new_shared();
        let backend = HeapBackend::new();
        {
            let _g = grabber(&registry, &backend);
            assert!(registry.is_active());
        }
        assert!(!registry.is_active());
    }
}

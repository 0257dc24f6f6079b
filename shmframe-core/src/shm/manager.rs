// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! RegionManager - owns the single frame region.
//!
//! Creation, sizing, mapping and teardown of one named shared memory object.
//! An open region and a held OS handle are the same thing: the mapping value
//! carries both, so neither can outlive the other.

use crate::error::SharedMemoryError;
use crate::shm::layout::FrameHeader;
use crate::shm::region::{MappedRegion, NativeBackend, RegionBackend};
use crate::types::{FrameDimensions, RegionName};

/// Manages at most one mapped frame region.
pub struct RegionManager {
    name: RegionName,
    backend: Box<dyn RegionBackend>,
    region: Option<MappedRegion>,
    flush_on_close: bool,
    unlink_on_close: bool,
}

impl RegionManager {
    /// Create a manager for `name` on the native backend.
    pub fn new(name: RegionName) -> Self {
        Self::with_backend(name, Box::new(NativeBackend))
    }

    /// Create a manager with an explicit backend.
    pub fn with_backend(name: RegionName, backend: Box<dyn RegionBackend>) -> Self {
        Self {
            name,
            backend,
            region: None,
            flush_on_close: true,
            unlink_on_close: false,
        }
    }

    /// Flush the sentinel header before unmapping.
    pub fn flush_on_close(mut self, enabled: bool) -> Self {
        self.flush_on_close = enabled;
        self
    }

    /// Remove the object name after closing.
    ///
    /// Off by default: the name survives so late readers still find the sentinel.
    pub fn unlink_on_close(mut self, enabled: bool) -> Self {
        self.unlink_on_close = enabled;
        self
    }

    /// Name of the managed object.
    pub fn name(&self) -> &RegionName {
        &self.name
    }

    /// Whether a region is currently mapped.
    pub fn is_open(&self) -> bool {
        self.region.is_some()
    }

    /// The mapped region, if open.
    pub fn region(&self) -> Option<&MappedRegion> {
        self.region.as_ref()
    }

    /// Mutable access to the mapped region, if open.
    pub fn region_mut(&mut self) -> Option<&mut MappedRegion> {
        self.region.as_mut()
    }

    /// Open the region sized for `dims`.
    ///
    /// Idempotent: an already open region is returned as-is, whatever its size.
    /// On failure nothing is held.
    pub fn open(&mut self, dims: FrameDimensions) -> Result<&mut MappedRegion, SharedMemoryError> {
        if let Some(ref region) = self.region {
            if region.dimensions() != dims {
                tracing::debug!(
                    name = %self.name,
                    open = %region.dimensions(),
                    requested = %dims,
                    "Region already open at different size"
                );
            }
        } else {
            let size = dims.region_len();
            let inner = self.backend.create(&self.name, size).map_err(|e| {
                tracing::error!(name = %self.name, size = size, error = %e, "Failed to open shared memory");
                e
            })?;

            tracing::info!(name = %self.name, dims = %dims, size = size, "Opened shared memory connection");
            self.region = Some(MappedRegion::new(inner, dims));
        }

        self.region
            .as_mut()
            .ok_or(SharedMemoryError::RegionUnavailable)
    }

    /// Close the region, leaving a termination sentinel for readers.
    ///
    /// Trivially succeeds when nothing is open; safe to call repeatedly.
    /// Returns false if the sentinel could not be written or flushed. The
    /// region is unmapped and released either way.
    pub fn close(&mut self) -> bool {
        let Some(mut region) = self.region.take() else {
            return true;
        };

        let mut ok = true;
        match region.write_header(&FrameHeader::TERMINATION) {
            Ok(()) => {
                if self.flush_on_close {
                    if let Err(e) = region.flush_header() {
                        tracing::warn!(name = %self.name, error = %e, "Failed to flush termination header");
                        ok = false;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(name = %self.name, error = %e, "Failed to write termination header");
                ok = false;
            }
        }

        drop(region);

        if self.unlink_on_close {
            match self.backend.unlink(&self.name) {
                Ok(()) | Err(SharedMemoryError::NotFound { .. }) => {}
                Err(e) => {
                    tracing::warn!(name = %self.name, error = %e, "Failed to unlink shared memory");
                }
            }
        }

        tracing::info!(name = %self.name, "Closed the shared memory");
        ok
    }
}

impl Drop for RegionManager {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for RegionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionManager")
            .field("name", &self.name)
            .field("region", &self.region)
            .field("flush_on_close", &self.flush_on_close)
            .field("unlink_on_close", &self.unlink_on_close)
            .finish()
    }
}

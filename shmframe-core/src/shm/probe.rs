//! Read-only probe of a published frame region.
//!
//! Maps an existing object, reads the header, copies the payload, then reads
//! the header again. A changed header means the copy may be torn.

use crate::error::SharedMemoryError;
use crate::shm::layout::{self, FrameHeader, HEADER_SIZE};
use crate::shm::region::{NativeBackend, RegionBackend};
use crate::types::RegionName;

/// What a probe found in the region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    /// A complete frame whose header did not change during the copy.
    Frame,
    /// The header changed while the payload was copied.
    Torn,
    /// The writer signalled teardown.
    Closing,
    /// Header announces more payload than the region holds.
    Inconsistent,
}

/// Result of one probe.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub header: FrameHeader,
    pub state: ProbeState,
    pub region_len: usize,
    pub pixels: Vec<u8>,
}

impl FrameSnapshot {
    /// CRC32 of the copied payload.
    pub fn payload_crc32(&self) -> u32 {
        crc32fast::hash(&self.pixels)
    }
}

/// Polls a region by name. Holds no mapping between probes.
pub struct FrameProbe {
    name: RegionName,
    backend: Box<dyn RegionBackend>,
}

impl FrameProbe {
    pub fn new(name: RegionName) -> Self {
        Self::with_backend(name, Box::new(NativeBackend))
    }

    pub fn with_backend(name: RegionName, backend: Box<dyn RegionBackend>) -> Self {
        Self { name, backend }
    }

    pub fn name(&self) -> &RegionName {
        &self.name
    }

    /// Take one snapshot of the region.
    pub fn snapshot(&self) -> Result<FrameSnapshot, SharedMemoryError> {
        let region = self.backend.open_existing(&self.name)?;
        let base = region.as_ptr();
        let len = region.len();

        if base.is_null() {
            return Err(SharedMemoryError::RegionUnavailable);
        }
        if len < HEADER_SIZE {
            return Err(SharedMemoryError::RegionTooSmall {
                actual: len,
                required: HEADER_SIZE,
            });
        }

        // SAFETY: mapping is non-null and at least HEADER_SIZE long
        let before = unsafe { layout::read_header(base) };

        if before.is_termination() {
            return Ok(FrameSnapshot {
                header: before,
                state: ProbeState::Closing,
                region_len: len,
                pixels: Vec::new(),
            });
        }

        let payload_len = before.payload_len();
        if HEADER_SIZE + payload_len > len {
            return Ok(FrameSnapshot {
                header: before,
                state: ProbeState::Inconsistent,
                region_len: len,
                pixels: Vec::new(),
            });
        }

        let mut pixels = vec![0u8; payload_len];
        // SAFETY: [HEADER_SIZE, HEADER_SIZE + payload_len) is inside the mapping
        unsafe {
            std::ptr::copy_nonoverlapping(base.add(HEADER_SIZE), pixels.as_mut_ptr(), payload_len);
        }

        // SAFETY: as above
        let after = unsafe { layout::read_header(base) };
        let state = if after == before {
            ProbeState::Frame
        } else if after.is_termination() {
            ProbeState::Closing
        } else {
            ProbeState::Torn
        };

        tracing::trace!(
            name = %self.name,
            sequence = before.sequence,
            state = ?state,
            "Probed frame region"
        );

        Ok(FrameSnapshot {
            header: before,
            state,
            region_len: len,
            pixels,
        })
    }
}

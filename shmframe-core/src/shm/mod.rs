// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shared Memory frame handoff module.
//!
//! One named shared memory object holding a 16-byte header and one frame of
//! 32-bit pixels. Single writer, any number of polling readers, no locks.

pub mod layout;
mod manager;
#[cfg(unix)]
mod posix;
mod probe;
mod region;
#[cfg(windows)]
mod windows;

pub use layout::{FrameHeader, BYTES_PER_PIXEL, HEADER_SIZE, SENTINEL_WORD};
pub use manager::RegionManager;
#[cfg(unix)]
pub use posix::PosixShm;
pub use probe::{FrameProbe, FrameSnapshot, ProbeState};
pub use region::{MappedRegion, NativeBackend, RegionBackend, SharedRegion};
#[cfg(windows)]
pub use windows::NamedMapping;

#[cfg(test)]
pub(crate) use region::testing;

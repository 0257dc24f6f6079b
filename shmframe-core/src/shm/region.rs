// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Platform-neutral view of a mapped shared memory object.
//!
//! The lifecycle controller and frame publisher only see [`SharedRegion`] and
//! [`RegionBackend`]. Each native variant couples the OS handle and the
//! mapping in one owned value: construction maps, `Drop` unmaps and releases.

use crate::error::SharedMemoryError;
use crate::shm::layout::{self, FrameHeader, HEADER_SIZE};
use crate::types::{FrameDimensions, RegionName};

/// A mapped shared memory object.
pub trait SharedRegion: Send {
    /// Name the object was created or opened with.
    fn name(&self) -> &str;

    /// Base address of the mapping. Null means the mapping is gone.
    fn as_ptr(&self) -> *mut u8;

    /// Length of the mapping in bytes.
    fn len(&self) -> usize;

    /// Flush the first `len` bytes so other processes observe them.
    fn flush(&self, len: usize) -> Result<(), SharedMemoryError>;
}

/// Factory for shared memory objects.
pub trait RegionBackend: Send {
    /// Create (or open, if it already exists) `name` read-write, size it to
    /// `len` bytes and map it.
    fn create(&self, name: &RegionName, len: usize)
        -> Result<Box<dyn SharedRegion>, SharedMemoryError>;

    /// Map an existing object read-only, using the object's own size.
    fn open_existing(&self, name: &RegionName) -> Result<Box<dyn SharedRegion>, SharedMemoryError>;

    /// Remove the name so later opens create a fresh object.
    fn unlink(&self, name: &RegionName) -> Result<(), SharedMemoryError>;
}

/// Backend for the current platform.
///
/// POSIX `shm_open` + `mmap` on Unix, a named `CreateFileMappingW` section on Windows.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeBackend;

impl RegionBackend for NativeBackend {
    fn create(
        &self,
        name: &RegionName,
        len: usize,
    ) -> Result<Box<dyn SharedRegion>, SharedMemoryError> {
        #[cfg(unix)]
        {
            Ok(Box::new(crate::shm::posix::PosixShm::create(name, len)?))
        }
        #[cfg(windows)]
        {
            Ok(Box::new(crate::shm::windows::NamedMapping::create(name, len)?))
        }
    }

    fn open_existing(&self, name: &RegionName) -> Result<Box<dyn SharedRegion>, SharedMemoryError> {
        #[cfg(unix)]
        {
            Ok(Box::new(crate::shm::posix::PosixShm::open_existing(name)?))
        }
        #[cfg(windows)]
        {
            Ok(Box::new(crate::shm::windows::NamedMapping::open_existing(name)?))
        }
    }

    fn unlink(&self, name: &RegionName) -> Result<(), SharedMemoryError> {
        #[cfg(unix)]
        {
            crate::shm::posix::PosixShm::unlink(name)
        }
        #[cfg(windows)]
        {
            // Named sections disappear with their last handle.
            let _ = name;
            Ok(())
        }
    }
}

/// The currently open frame region, sized for exactly one frame.
pub struct MappedRegion {
    inner: Box<dyn SharedRegion>,
    dims: FrameDimensions,
}

impl MappedRegion {
    pub(crate) fn new(inner: Box<dyn SharedRegion>, dims: FrameDimensions) -> Self {
        Self { inner, dims }
    }

    /// Name of the underlying object.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Dimensions the region was sized for.
    pub fn dimensions(&self) -> FrameDimensions {
        self.dims
    }

    /// Base address of the mapping.
    pub fn as_ptr(&self) -> *mut u8 {
        self.inner.as_ptr()
    }

    /// Length of the mapping in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the mapping has zero length.
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    /// Whether the mapping is still present.
    pub fn is_mapped(&self) -> bool {
        !self.inner.as_ptr().is_null()
    }

    /// Read the current header.
    pub fn header(&self) -> Result<FrameHeader, SharedMemoryError> {
        self.check_header_space()?;
        // SAFETY: mapping is non-null and at least HEADER_SIZE bytes long.
        Ok(unsafe { layout::read_header(self.as_ptr()) })
    }

    /// Overwrite the header.
    pub(crate) fn write_header(&mut self, header: &FrameHeader) -> Result<(), SharedMemoryError> {
        self.check_header_space()?;
        // SAFETY: mapping is non-null and at least HEADER_SIZE bytes long.
        unsafe { layout::write_header(self.as_ptr(), header) };
        Ok(())
    }

    /// Copy the pixel payload to offset `HEADER_SIZE`.
    pub(crate) fn write_payload(&mut self, pixels: &[u8]) -> Result<(), SharedMemoryError> {
        if !self.is_mapped() {
            return Err(SharedMemoryError::RegionUnavailable);
        }
        let required = HEADER_SIZE + pixels.len();
        if self.len() < required {
            return Err(SharedMemoryError::RegionTooSmall {
                actual: self.len(),
                required,
            });
        }
        // SAFETY: destination range [HEADER_SIZE, required) lies inside the
        // mapping, and the mapping never aliases the caller's pixel buffer.
        unsafe {
            std::ptr::copy_nonoverlapping(
                pixels.as_ptr(),
                self.as_ptr().add(HEADER_SIZE),
                pixels.len(),
            );
        }
        Ok(())
    }

    pub(crate) fn flush_header(&self) -> Result<(), SharedMemoryError> {
        self.inner.flush(HEADER_SIZE)
    }

    fn check_header_space(&self) -> Result<(), SharedMemoryError> {
        if !self.is_mapped() {
            return Err(SharedMemoryError::RegionUnavailable);
        }
        if self.len() < HEADER_SIZE {
            return Err(SharedMemoryError::RegionTooSmall {
                actual: self.len(),
                required: HEADER_SIZE,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("name", &self.name())
            .field("dims", &self.dims)
            .field("len", &self.len())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::HeapRegion;
    use super::*;

    fn heap_mapped(width: u32, height: u32) -> MappedRegion {
        let dims = FrameDimensions::new(width, height).unwrap();
        MappedRegion::new(Box::new(HeapRegion::new("heap", dims.region_len())), dims)
    }

    #[test]
    fn test_header_round_trip_through_mapping() {
        let mut region = heap_mapped(4, 4);
        let header = FrameHeader::for_frame(4, 4, 9);
        region.write_header(&header).unwrap();
        assert_eq!(region.header().unwrap(), header);
        assert!(region.is_mapped());
        assert_eq!(region.len(), 16 + 4 * 4 * 4);
    }

    #[test]
    fn test_payload_too_large_rejected() {
        let mut region = heap_mapped(2, 2);
        let pixels = vec![1u8; 17];
        assert!(matches!(
            region.write_payload(&pixels),
            Err(SharedMemoryError::RegionTooSmall { .. })
        ));
    }
}

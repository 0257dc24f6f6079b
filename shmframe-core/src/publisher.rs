// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Frame publisher.
//!
//! Writes the header and then the pixel payload into an already open region.
//! The header always goes first; readers that re-read it after copying the
//! payload can detect a torn frame. No locking is done here.

use crate::error::SharedMemoryError;
use crate::shm::{FrameHeader, MappedRegion};
use crate::types::FrameDimensions;

/// Writes frames and owns the sequence counter.
#[derive(Debug, Default)]
pub struct FramePublisher {
    next_sequence: u32,
    published: u64,
}

impl FramePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the sequence at 0. Called whenever a fresh region is opened.
    pub fn reset(&mut self) {
        self.next_sequence = 0;
    }

    /// Sequence number the next publish will use.
    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
    }

    /// Total frames written by this publisher.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Publish one frame and return its sequence number.
    ///
    /// `region` must be open at exactly `dims`. The sequence wraps at 2^32.
    pub fn publish(
        &mut self,
        region: &mut MappedRegion,
        dims: FrameDimensions,
        pixels: &[u8],
    ) -> Result<u32, SharedMemoryError> {
        if !region.is_mapped() {
            tracing::error!(name = %region.name(), "Shared memory view is not mapped");
            return Err(SharedMemoryError::RegionUnavailable);
        }

        if region.dimensions() != dims {
            tracing::error!(
                name = %region.name(),
                region = %region.dimensions(),
                frame = %dims,
                "Region sized for different dimensions"
            );
            return Err(SharedMemoryError::RegionUnavailable);
        }

        if pixels.len() != dims.payload_len() {
            return Err(SharedMemoryError::PixelBufferMismatch {
                width: dims.width(),
                height: dims.height(),
                expected: dims.payload_len(),
                actual: pixels.len(),
            });
        }

        let sequence = self.next_sequence;
        let header = FrameHeader::for_frame(dims.width(), dims.height(), sequence);
        region.write_header(&header)?;
        region.write_payload(pixels)?;

        self.next_sequence = sequence.wrapping_add(1);
        self.published += 1;

        tracing::trace!(name = %region.name(), sequence = sequence, dims = %dims, "Published frame");

        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::testing::HeapRegion;

    fn region(w: u32, h: u32) -> (MappedRegion, FrameDimensions) {
        let dims = FrameDimensions::new(w, h).unwrap();
        let region = MappedRegion::new(Box::new(HeapRegion::new("pub", dims.region_len())), dims);
        (region, dims)
    }

    fn region_bytes(region: &MappedRegion) -> Vec<u8> {
        unsafe { std::slice::from_raw_parts(region.as_ptr(), region.len()).to_vec() }
    }

    #[test]
    fn test_publish_zero_frame_2x2() {
        let (mut region, dims) = region(2, 2);
        let mut publisher = FramePublisher::new();

        let seq = publisher.publish(&mut region, dims, &[0u8; 16]).unwrap();
        assert_eq!(seq, 0);

        let header = region.header().unwrap();
        assert_eq!(
            (header.width, header.height, header.stride, header.sequence),
            (2, 2, 8, 0)
        );
        let bytes = region_bytes(&region);
        assert_eq!(&bytes[..16], &[2, 0, 0, 0, 2, 0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[16..], &[0u8; 16]);
    }

    #[test]
    fn test_payload_copied_after_header() {
        let (mut region, dims) = region(3, 2);
        let mut publisher = FramePublisher::new();
        let pixels: Vec<u8> = (0..24).collect();

        publisher.publish(&mut region, dims, &pixels).unwrap();
        assert_eq!(&region_bytes(&region)[16..], pixels.as_slice());
    }

    #[test]
    fn test_sequence_increments() {
        let (mut region, dims) = region(1, 1);
        let mut publisher = FramePublisher::new();

        for expected in 0..5u32 {
            assert_eq!(publisher.publish(&mut region, dims, &[1, 2, 3, 4]).unwrap(), expected);
            assert_eq!(region.header().unwrap().sequence, expected);
        }
        assert_eq!(publisher.published(), 5);
    }

    #[test]
    fn test_sequence_wraps() {
        let (mut region, dims) = region(1, 1);
        let mut publisher = FramePublisher {
            next_sequence: u32::MAX,
            published: 0,
        };

        assert_eq!(publisher.publish(&mut region, dims, &[0; 4]).unwrap(), u32::MAX);
        assert_eq!(publisher.publish(&mut region, dims, &[0; 4]).unwrap(), 0);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let (mut region, dims) = region(1, 1);
        let mut publisher = FramePublisher::new();
        publisher.publish(&mut region, dims, &[0; 4]).unwrap();
        publisher.publish(&mut region, dims, &[0; 4]).unwrap();

        publisher.reset();
        assert_eq!(publisher.next_sequence(), 0);
    }

    #[test]
    fn test_pixel_length_mismatch_writes_nothing() {
        let (mut region, dims) = region(2, 2);
        let mut publisher = FramePublisher::new();

        assert!(matches!(
            publisher.publish(&mut region, dims, &[0xFF; 15]),
            Err(SharedMemoryError::PixelBufferMismatch { expected: 16, actual: 15, .. })
        ));
        assert_eq!(region_bytes(&region), vec![0u8; 32]);
        assert_eq!(publisher.next_sequence(), 0);
    }

    #[test]
    fn test_unmapped_region_is_unavailable() {
        let dims = FrameDimensions::new(2, 2).unwrap();
        let mut region =
            MappedRegion::new(Box::new(HeapRegion::unmapped("pub", dims.region_len())), dims);
        let mut publisher = FramePublisher::new();

        assert!(matches!(
            publisher.publish(&mut region, dims, &[0; 16]),
            Err(SharedMemoryError::RegionUnavailable)
        ));
        assert_eq!(publisher.next_sequence(), 0);
    }

    #[test]
    fn test_dimension_mismatch_is_unavailable() {
        let (mut region, _) = region(2, 2);
        let other = FrameDimensions::new(1, 4).unwrap();
        let mut publisher = FramePublisher::new();

        assert!(matches!(
            publisher.publish(&mut region, other, &[0; 16]),
            Err(SharedMemoryError::RegionUnavailable)
        ));
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Frame header and payload layout.
//!
//! ```text
//! offset 0   width     u32 LE   (0xFFFFFFFF when closing)
//! offset 4   height    u32 LE   (0xFFFFFFFF when closing)
//! offset 8   stride    u32 LE   (0xFFFFFFFF when closing)
//! offset 12  sequence  u32 LE   (0 when closing)
//! offset 16  pixels    height * stride bytes, row-major
//! ```

/// Header size in bytes (four u32 words).
pub const HEADER_SIZE: usize = 16;

/// Fixed 32-bit pixel format.
pub const BYTES_PER_PIXEL: usize = 4;

/// Value written to width, height and stride when the region is torn down.
pub const SENTINEL_WORD: u32 = u32::MAX;

/// Frame header stored at the start of the shared region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub sequence: u32,
}

impl FrameHeader {
    /// Header announcing that the region is about to become invalid.
    pub const TERMINATION: Self = Self {
        width: SENTINEL_WORD,
        height: SENTINEL_WORD,
        stride: SENTINEL_WORD,
        sequence: 0,
    };

    /// Header for a frame of the given size.
    pub fn for_frame(width: u32, height: u32, sequence: u32) -> Self {
        Self {
            width,
            height,
            stride: width.wrapping_mul(BYTES_PER_PIXEL as u32),
            sequence,
        }
    }

    /// Whether the first three words carry the termination sentinel.
    pub fn is_termination(&self) -> bool {
        self.width == SENTINEL_WORD && self.height == SENTINEL_WORD && self.stride == SENTINEL_WORD
    }

    /// Payload length announced by this header.
    pub fn payload_len(&self) -> usize {
        self.height as usize * self.stride as usize
    }

    /// Encode as little-endian words.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.width.to_le_bytes());
        out[4..8].copy_from_slice(&self.height.to_le_bytes());
        out[8..12].copy_from_slice(&self.stride.to_le_bytes());
        out[12..16].copy_from_slice(&self.sequence.to_le_bytes());
        out
    }

    /// Decode from little-endian words.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self {
            width: word(0),
            height: word(4),
            stride: word(8),
            sequence: word(12),
        }
    }
}

/// Write a header at `base` with volatile stores.
///
/// Readers in other processes observe the mapping at any time, so the
/// compiler must not elide or merge these writes.
///
/// # Safety
/// `base` must point to at least `HEADER_SIZE` writable bytes.
pub(crate) unsafe fn write_header(base: *mut u8, header: &FrameHeader) {
    let bytes = header.to_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        std::ptr::write_volatile(base.add(i), *byte);
    }
}

/// Read a header from `base` with volatile loads.
///
/// # Safety
/// `base` must point to at least `HEADER_SIZE` readable bytes.
pub(crate) unsafe fn read_header(base: *const u8) -> FrameHeader {
    let mut bytes = [0u8; HEADER_SIZE];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = std::ptr::read_volatile(base.add(i));
    }
    FrameHeader::from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_termination_bytes() {
        let bytes = FrameHeader::TERMINATION.to_bytes();
        assert_eq!(&bytes[..12], &[0xFF; 12]);
        assert_eq!(&bytes[12..], &[0; 4]);
        assert!(FrameHeader::TERMINATION.is_termination());
    }

    #[test]
    fn test_frame_header_little_endian() {
        let header = FrameHeader::for_frame(2, 2, 0x0102_0304);
        assert_eq!(header.stride, 8);
        assert_eq!(
            header.to_bytes(),
            [2, 0, 0, 0, 2, 0, 0, 0, 8, 0, 0, 0, 4, 3, 2, 1]
        );
        assert!(!header.is_termination());
        assert_eq!(header.payload_len(), 16);
    }

    #[test]
    fn test_volatile_header_access() {
        let mut buf = [0u8; HEADER_SIZE];
        let header = FrameHeader::for_frame(640, 480, 7);
        unsafe {
            write_header(buf.as_mut_ptr(), &header);
            assert_eq!(read_header(buf.as_ptr()), header);
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Following the "Newtype" pattern in Rust to ensure valid state by construction.
//! All types validate their invariants at creation time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;
use crate::shm::layout::{BYTES_PER_PIXEL, HEADER_SIZE};

/// Name of the shared memory object used when none is configured.
pub const DEFAULT_REGION_NAME: &str = "as64_grabber";

/// Longest accepted region name. POSIX `NAME_MAX` is 255 including the leading `/`.
const MAX_REGION_NAME_LEN: usize = 200;

/// Validated shared memory object name.
/// Must be non-empty, at most 200 bytes, with no `/` or NUL characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionName(String);

impl RegionName {
    /// Create a new RegionName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "region_name",
                value: name,
                reason: "Region name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_REGION_NAME_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "region_name",
                value: name.clone(),
                reason: format!(
                    "Region name too long: {} bytes (max {})",
                    name.len(),
                    MAX_REGION_NAME_LEN
                ),
            });
        }

        if name.contains('/') || name.contains('\0') {
            return Err(HardValidationError::InvalidFieldValue {
                field: "region_name",
                value: name,
                reason: "Region name must not contain '/' or NUL".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RegionName {
    fn default() -> Self {
        Self(DEFAULT_REGION_NAME.to_string())
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RegionName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegionName> for String {
    fn from(name: RegionName) -> Self {
        name.0
    }
}

/// Validated frame dimensions.
///
/// Both sides are non-zero, the stride fits the header's 32-bit field, and
/// the full region length fits `usize`. Size helpers therefore never overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDimensions")]
pub struct FrameDimensions {
    width: u32,
    height: u32,
}

/// Unvalidated dimensions as they appear on the wire.
#[derive(Deserialize)]
struct RawDimensions {
    width: u32,
    height: u32,
}

impl TryFrom<RawDimensions> for FrameDimensions {
    type Error = HardValidationError;

    fn try_from(raw: RawDimensions) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.height)
    }
}

impl FrameDimensions {
    /// Create new dimensions with overflow validation.
    pub fn new(width: u32, height: u32) -> Result<Self, HardValidationError> {
        if width == 0 || height == 0 {
            return Err(HardValidationError::InvalidDimensions {
                width,
                height,
                reason: "Width and height must be non-zero".to_string(),
            });
        }

        if width.checked_mul(BYTES_PER_PIXEL as u32).is_none() {
            return Err(HardValidationError::InvalidDimensions {
                width,
                height,
                reason: "Row stride does not fit in 32 bits".to_string(),
            });
        }

        let region_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .and_then(|payload| payload.checked_add(HEADER_SIZE));
        if region_len.is_none() {
            return Err(HardValidationError::InvalidDimensions {
                width,
                height,
                reason: "Region size overflows the address space".to_string(),
            });
        }

        Ok(Self { width, height })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> u32 {
        self.width * BYTES_PER_PIXEL as u32
    }

    /// Pixel payload length in bytes (`height * stride`).
    pub fn payload_len(&self) -> usize {
        self.height as usize * self.stride() as usize
    }

    /// Total shared region length in bytes (header + payload).
    pub fn region_len(&self) -> usize {
        HEADER_SIZE + self.payload_len()
    }
}

impl fmt::Display for FrameDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_name_valid() {
        assert!(RegionName::new("as64_grabber").is_ok());
        assert!(RegionName::new("frame-share.1").is_ok());
        assert_eq!(RegionName::default().as_str(), DEFAULT_REGION_NAME);
    }

    #[test]
    fn test_region_name_invalid() {
        assert!(RegionName::new("").is_err());
        assert!(RegionName::new("a".repeat(201)).is_err());
        assert!(RegionName::new("/as64_grabber").is_err());
        assert!(RegionName::new("bad\0name").is_err());
    }

    #[test]
    fn test_dimensions_deserialize_validated() {
        let dims: FrameDimensions = serde_yaml::from_str("width: 1280\nheight: 720").unwrap();
        assert_eq!(dims, FrameDimensions::new(1280, 720).unwrap());

        assert!(serde_yaml::from_str::<FrameDimensions>("width: 0\nheight: 0").is_err());
        assert!(serde_yaml::from_str::<FrameDimensions>("width: 4294967295\nheight: 1").is_err());
    }

    #[test]
    fn test_dimensions_sizes() {
        let dims = FrameDimensions::new(640, 480).unwrap();
        assert_eq!(dims.stride(), 2560);
        assert_eq!(dims.payload_len(), 640 * 480 * 4);
        assert_eq!(dims.region_len(), 16 + 640 * 480 * 4);
        assert_eq!(dims.to_string(), "640x480");
    }

    #[test]
    fn test_dimensions_zero() {
        assert!(FrameDimensions::new(0, 480).is_err());
        assert!(FrameDimensions::new(640, 0).is_err());
    }

    #[test]
    fn test_dimensions_stride_overflow() {
        assert!(FrameDimensions::new(u32::MAX, 1).is_err());
        assert!(FrameDimensions::new(u32::MAX / 4 + 1, 1).is_err());
        assert!(FrameDimensions::new(u32::MAX / 4, 1).is_ok());
    }
}

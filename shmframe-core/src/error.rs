// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for shmframe.
//!
//! Explicit enum error types throughout. No `Box<dyn Error>` and no
//! `anyhow::Result` in the library: every failure a production cycle can hit
//! is a named variant.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the frame sharing core.
#[derive(Debug, Error)]
pub enum FrameShareError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Shared Memory Errors - Local to One Production Cycle
    // =========================================================================
    #[error("Shared memory error: {0}")]
    SharedMemory(#[from] SharedMemoryError),

    #[error("Frame staging error: {0}")]
    Staging(#[from] StagingError),

    // =========================================================================
    // Instance Errors
    // =========================================================================
    #[error("Only one frame grabber instance allowed per process")]
    InstanceAlreadyActive,

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Validation errors for configuration and validated newtypes.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Frame dimensions {width}x{height} are invalid: {reason}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        reason: String,
    },
}

/// Shared memory errors. None of these escalate past the current cycle.
#[derive(Debug, Error)]
pub enum SharedMemoryError {
    #[error("Failed to allocate shared memory object {name} ({size} bytes): {reason}")]
    AllocationFailed {
        name: String,
        size: usize,
        reason: String,
    },

    #[error("Failed to map shared memory object {name}: {reason}")]
    MapFailed { name: String, reason: String },

    #[error("Shared memory region is not mapped")]
    RegionUnavailable,

    #[error("Pixel buffer is {actual} bytes, expected {expected} for {width}x{height}")]
    PixelBufferMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Region is {actual} bytes, too small for a frame header ({required} bytes)")]
    RegionTooSmall { actual: usize, required: usize },

    #[error("Shared memory object {name} does not exist")]
    NotFound { name: String },
}

/// Upstream pixel acquisition failure reported by the host.
///
/// The core only observes this as "no frame this cycle".
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to map staging surface for {width}x{height}")]
    MapFailed { width: u32, height: u32 },

    #[error("Failed to allocate staging surface for {width}x{height}")]
    AllocationFailed { width: u32, height: u32 },

    #[error("Frame source unavailable: {reason}")]
    SourceUnavailable { reason: String },
}

/// State transition errors for the publisher lifecycle.
///
/// Only logged by the controller; a rejected transition never ends a cycle.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Publisher is in terminal state: {state}")]
    TerminalState { state: &'static str },
}

/// Result type alias using FrameShareError.
pub type FrameShareResult<T> = Result<T, FrameShareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_error_display() {
        let err = SharedMemoryError::AllocationFailed {
            name: "as64_grabber".to_string(),
            size: 1_228_816,
            reason: "ftruncate failed".to_string(),
        };
        assert!(err.to_string().contains("as64_grabber"));
        assert!(err.to_string().contains("1228816"));
    }

    #[test]
    fn test_error_chain() {
        let shm_err = SharedMemoryError::RegionUnavailable;
        let err: FrameShareError = shm_err.into();
        assert!(matches!(
            err,
            FrameShareError::SharedMemory(SharedMemoryError::RegionUnavailable)
        ));

        let staging: FrameShareError = StagingError::MapFailed {
            width: 2,
            height: 2,
        }
        .into();
        assert!(matches!(staging, FrameShareError::Staging(_)));
    }

    #[test]
    fn test_dimension_error_is_validation_error() {
        let err: FrameShareError = crate::types::FrameDimensions::new(0, 480)
            .unwrap_err()
            .into();
        assert!(matches!(
            err,
            FrameShareError::HardValidation(HardValidationError::InvalidDimensions {
                width: 0,
                height: 480,
                ..
            })
        ));

        let short = SharedMemoryError::RegionTooSmall {
            actual: 8,
            required: 16,
        };
        assert!(short.to_string().contains("8 bytes"));
    }

    #[test]
    fn test_transition_error_display() {
        let err = StateTransitionError::InvalidTransition {
            from: "Closed",
            to: "Open",
        };
        assert_eq!(err.to_string(), "Cannot transition from Closed to Open");
    }

    #[test]
    fn test_instance_error_message() {
        let err = FrameShareError::InstanceAlreadyActive;
        assert!(err.to_string().contains("Only one"));
    }
}

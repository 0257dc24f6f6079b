//! shmframe Core Library
//!
//! Publishes one video frame at a time to a named shared memory object so
//! that other processes on the same machine can poll it with minimal latency.
//! Provides the region manager, frame publisher, lifecycle controller,
//! publisher registry, configuration parsing and a read-only frame probe.

pub mod config;
pub mod error;
pub mod grabber;
pub mod lifecycle;
pub mod publisher;
pub mod registry;
pub mod shm;
pub mod state;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigLoader, GrabberConfig};
pub use error::{
    FrameShareError, FrameShareResult, HardValidationError, SharedMemoryError, StagingError,
};
pub use grabber::{FrameGrabber, Property};
pub use lifecycle::{CycleOutcome, LifecycleController, SkipReason};
pub use publisher::FramePublisher;
pub use registry::{PublisherLease, PublisherRegistry};
pub use state::{PublisherState, PublisherStateMachine};
pub use stats::PublisherStats;
pub use types::{FrameDimensions, RegionName, DEFAULT_REGION_NAME};

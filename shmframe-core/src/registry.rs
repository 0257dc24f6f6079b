//! Publisher registry.
//!
//! Enforces at most one active frame publisher per process. Two writers on
//! the same named region would race each other, so the hosting runtime owns
//! one registry and every grabber must hold its lease.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{FrameShareError, FrameShareResult};

/// Registry handing out the single publisher lease.
#[derive(Debug, Default)]
pub struct PublisherRegistry {
    active: AtomicBool,
}

impl PublisherRegistry {
    /// Create a new registry with no active publisher.
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
        }
    }

    /// Create a registry wrapped in an Arc for sharing across threads.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Take the lease. Fails if another publisher holds it.
    pub fn acquire(self: &Arc<Self>) -> FrameShareResult<PublisherLease> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FrameShareError::InstanceAlreadyActive);
        }

        tracing::debug!("Publisher lease acquired");
        Ok(PublisherLease {
            registry: Arc::clone(self),
        })
    }

    /// Whether a lease is currently held.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Proof of being the active publisher. Released on drop.
#[derive(Debug)]
pub struct PublisherLease {
    registry: Arc<PublisherRegistry>,
}

impl Drop for PublisherLease {
    fn drop(&mut self) {
        self.registry.active.store(false, Ordering::Release);
        tracing::debug!("Publisher lease released");
    }
}

//! `shmframe clean` command - Remove a stale region name.
//!
//! Publishers leave the name in place after shutdown so late readers still
//! see the termination sentinel. This removes it.

use shmframe_core::shm::{NativeBackend, RegionBackend};
use shmframe_core::SharedMemoryError;

use crate::commands::resolve_region_name;

pub async fn execute(
    config_path: Option<&str>,
    name: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = resolve_region_name(config_path, name)?;

    match NativeBackend.unlink(&name) {
        Ok(()) => {
            tracing::info!(name = %name, "Removed shared memory name");
            println!("✓ Removed '{}'", name);
            Ok(())
        }
        Err(SharedMemoryError::NotFound { .. }) => {
            println!("Nothing to remove: '{}' does not exist", name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

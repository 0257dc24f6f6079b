//! PosixShm - POSIX shared memory backend.
//!
//! Safe abstraction over `shm_open`, `ftruncate` and `mmap`.
//! The file descriptor and the mapping live and die together.

use std::ffi::CString;
use std::ptr::NonNull;

use crate::error::SharedMemoryError;
use crate::shm::region::SharedRegion;
use crate::types::RegionName;

/// A mapped POSIX shared memory object.
///
/// Owns both the descriptor and the mapping; `Drop` unmaps and closes.
/// The name is left in place on drop so readers can keep polling it.
pub struct PosixShm {
    /// Name of the shared memory object (without the leading `/`).
    name: String,
    /// Pointer to the mapped memory.
    ptr: NonNull<u8>,
    /// Size of the mapped region in bytes.
    size: usize,
    /// File descriptor for the shared memory object.
    fd: i32,
}

// SAFETY: PosixShm owns its mapping; the raw pointer is never shared outside it.
unsafe impl Send for PosixShm {}

fn c_name(name: &RegionName) -> Result<CString, SharedMemoryError> {
    CString::new(format!("/{}", name)).map_err(|e| SharedMemoryError::AllocationFailed {
        name: name.to_string(),
        size: 0,
        reason: format!("Invalid name: {}", e),
    })
}

impl PosixShm {
    /// Create or open the object read-write and size it to `size` bytes.
    ///
    /// Existing objects are reused and resized. Mode is 0666 so readers
    /// running as other users can map it.
    pub fn create(name: &RegionName, size: usize) -> Result<Self, SharedMemoryError> {
        let c_name = c_name(name)?;

        // SAFETY: c_name is a valid CString, flags are valid POSIX flags
        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_RDWR,
                0o666 as libc::mode_t,
            )
        };

        if fd < 0 {
            return Err(SharedMemoryError::AllocationFailed {
                name: name.to_string(),
                size,
                reason: format!("shm_open failed: {}", std::io::Error::last_os_error()),
            });
        }

        // SAFETY: fd is a valid file descriptor
        let result = unsafe { libc::ftruncate(fd, size as libc::off_t) };
        if result < 0 {
            let errno = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(SharedMemoryError::AllocationFailed {
                name: name.to_string(),
                size,
                reason: format!("ftruncate failed: {}", errno),
            });
        }

        let ptr = map(name, fd, size, libc::PROT_READ | libc::PROT_WRITE)?;

        tracing::debug!(name = %name, size = size, "Created shared memory region");

        Ok(Self {
            name: name.to_string(),
            ptr,
            size,
            fd,
        })
    }

    /// Map an existing object read-only at its current size.
    pub fn open_existing(name: &RegionName) -> Result<Self, SharedMemoryError> {
        let c_name = c_name(name)?;

        // SAFETY: c_name is a valid CString
        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDONLY, 0) };
        if fd < 0 {
            let errno = std::io::Error::last_os_error();
            if errno.raw_os_error() == Some(libc::ENOENT) {
                return Err(SharedMemoryError::NotFound {
                    name: name.to_string(),
                });
            }
            return Err(SharedMemoryError::MapFailed {
                name: name.to_string(),
                reason: format!("shm_open failed: {}", errno),
            });
        }

        // SAFETY: stat is plain old data, fully written by fstat on success
        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        if unsafe { libc::fstat(fd, &mut stat) } < 0 {
            let errno = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(SharedMemoryError::MapFailed {
                name: name.to_string(),
                reason: format!("fstat failed: {}", errno),
            });
        }

        let size = stat.st_size as usize;
        if size == 0 {
            unsafe { libc::close(fd) };
            return Err(SharedMemoryError::NotFound {
                name: name.to_string(),
            });
        }

        let ptr = map(name, fd, size, libc::PROT_READ)?;

        tracing::debug!(name = %name, size = size, "Opened shared memory region");

        Ok(Self {
            name: name.to_string(),
            ptr,
            size,
            fd,
        })
    }

    /// Remove the name. Existing mappings stay valid until unmapped.
    pub fn unlink(name: &RegionName) -> Result<(), SharedMemoryError> {
        let c_name = c_name(name)?;
        // SAFETY: c_name is a valid CString
        if unsafe { libc::shm_unlink(c_name.as_ptr()) } < 0 {
            let errno = std::io::Error::last_os_error();
            if errno.raw_os_error() == Some(libc::ENOENT) {
                return Err(SharedMemoryError::NotFound {
                    name: name.to_string(),
                });
            }
            return Err(SharedMemoryError::AllocationFailed {
                name: name.to_string(),
                size: 0,
                reason: format!("shm_unlink failed: {}", errno),
            });
        }
        tracing::debug!(name = %name, "Unlinked shared memory region");
        Ok(())
    }
}

/// Map `fd`, closing it on failure so no half-open object survives.
fn map(name: &RegionName, fd: i32, size: usize, prot: i32) -> Result<NonNull<u8>, SharedMemoryError> {
    // SAFETY: fd is valid, size matches the object, offset 0 is valid
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            size,
            prot,
            libc::MAP_SHARED,
            fd,
            0,
        )
    };

    if ptr == libc::MAP_FAILED {
        let errno = std::io::Error::last_os_error();
        unsafe { libc::close(fd) };
        return Err(SharedMemoryError::MapFailed {
            name: name.to_string(),
            reason: format!("mmap failed: {}", errno),
        });
    }

    NonNull::new(ptr as *mut u8).ok_or_else(|| {
        unsafe { libc::close(fd) };
        SharedMemoryError::MapFailed {
            name: name.to_string(),
            reason: "mmap returned null".to_string(),
        }
    })
}

impl SharedRegion for PosixShm {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn len(&self) -> usize {
        self.size
    }

    fn flush(&self, len: usize) -> Result<(), SharedMemoryError> {
        let len = len.min(self.size);
        // SAFETY: ptr is page-aligned (from mmap) and len is within the mapping
        let result = unsafe {
            libc::msync(self.ptr.as_ptr() as *mut libc::c_void, len, libc::MS_SYNC)
        };
        if result < 0 {
            return Err(SharedMemoryError::MapFailed {
                name: self.name.clone(),
                reason: format!("msync failed: {}", std::io::Error::last_os_error()),
            });
        }
        Ok(())
    }
}

impl Drop for PosixShm {
    fn drop(&mut self) {
        // SAFETY: ptr and size were set during creation
        let result = unsafe { libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size) };
        if result < 0 {
            tracing::error!(
                name = %self.name,
                error = %std::io::Error::last_os_error(),
                "Failed to unmap shared memory"
            );
        }

        // SAFETY: fd was opened during creation
        unsafe { libc::close(self.fd) };
    }
}

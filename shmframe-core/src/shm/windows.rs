//! NamedMapping - Windows named file mapping backend.
//!
//! A pagefile-backed section created with `CreateFileMappingW` and mapped
//! with `MapViewOfFile`. Handle and view are released together on drop.

use std::ffi::c_void;
use std::ptr::NonNull;

use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Memory::{
    CreateFileMappingW, FlushViewOfFile, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile,
    VirtualQuery, FILE_MAP_ALL_ACCESS, FILE_MAP_READ, MEMORY_BASIC_INFORMATION,
    MEMORY_MAPPED_VIEW_ADDRESS, PAGE_READWRITE,
};

use crate::error::SharedMemoryError;
use crate::shm::region::SharedRegion;
use crate::types::RegionName;

const ERROR_FILE_NOT_FOUND: u32 = 2;

/// A mapped view of a named Windows section.
pub struct NamedMapping {
    name: String,
    handle: HANDLE,
    ptr: NonNull<u8>,
    size: usize,
}

// SAFETY: the handle and view are owned exclusively by this value.
unsafe impl Send for NamedMapping {}

fn wide_name(name: &RegionName) -> Vec<u16> {
    name.as_str().encode_utf16().chain(std::iter::once(0)).collect()
}

impl NamedMapping {
    /// Create or open the section read-write with room for `size` bytes.
    pub fn create(name: &RegionName, size: usize) -> Result<Self, SharedMemoryError> {
        let wide = wide_name(name);

        // SAFETY: wide is NUL-terminated; INVALID_HANDLE_VALUE selects the pagefile
        let handle = unsafe {
            CreateFileMappingW(
                INVALID_HANDLE_VALUE,
                std::ptr::null(),
                PAGE_READWRITE,
                ((size as u64) >> 32) as u32,
                size as u32,
                wide.as_ptr(),
            )
        };

        if handle.is_null() {
            return Err(SharedMemoryError::AllocationFailed {
                name: name.to_string(),
                size,
                reason: format!("CreateFileMappingW failed: {}", unsafe { GetLastError() }),
            });
        }

        // SAFETY: handle is a valid section handle
        let view = unsafe { MapViewOfFile(handle, FILE_MAP_ALL_ACCESS, 0, 0, size) };
        let ptr = match NonNull::new(view.Value as *mut u8) {
            Some(ptr) => ptr,
            None => {
                let code = unsafe { GetLastError() };
                unsafe { CloseHandle(handle) };
                return Err(SharedMemoryError::MapFailed {
                    name: name.to_string(),
                    reason: format!("MapViewOfFile failed: {}", code),
                });
            }
        };

        tracing::debug!(name = %name, size = size, "Created named file mapping");

        Ok(Self {
            name: name.to_string(),
            handle,
            ptr,
            size,
        })
    }

    /// Map an existing section read-only. The view size is queried from the OS.
    pub fn open_existing(name: &RegionName) -> Result<Self, SharedMemoryError> {
        let wide = wide_name(name);

        // SAFETY: wide is NUL-terminated
        let handle = unsafe { OpenFileMappingW(FILE_MAP_READ, 0, wide.as_ptr()) };
        if handle.is_null() {
            let code = unsafe { GetLastError() };
            if code == ERROR_FILE_NOT_FOUND {
                return Err(SharedMemoryError::NotFound {
                    name: name.to_string(),
                });
            }
            return Err(SharedMemoryError::MapFailed {
                name: name.to_string(),
                reason: format!("OpenFileMappingW failed: {}", code),
            });
        }

        // SAFETY: handle is a valid section handle; 0 maps the whole section
        let view = unsafe { MapViewOfFile(handle, FILE_MAP_READ, 0, 0, 0) };
        let ptr = match NonNull::new(view.Value as *mut u8) {
            Some(ptr) => ptr,
            None => {
                let code = unsafe { GetLastError() };
                unsafe { CloseHandle(handle) };
                return Err(SharedMemoryError::MapFailed {
                    name: name.to_string(),
                    reason: format!("MapViewOfFile failed: {}", code),
                });
            }
        };

        // SAFETY: info is plain old data written by VirtualQuery
        let mut info: MEMORY_BASIC_INFORMATION = unsafe { std::mem::zeroed() };
        let written = unsafe {
            VirtualQuery(
                ptr.as_ptr() as *const c_void,
                &mut info,
                std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        // Views are page-rounded, so this may exceed the writer's size.
        let size = if written == 0 { 0 } else { info.RegionSize };

        Ok(Self {
            name: name.to_string(),
            handle,
            ptr,
            size,
        })
    }
}

impl SharedRegion for NamedMapping {
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
        // SAFETY: ptr is the base of a live view and len is clamped to it
        let ok = unsafe { FlushViewOfFile(self.ptr.as_ptr() as *const c_void, len.min(self.size)) };
        if ok == 0 {
            return Err(SharedMemoryError::MapFailed {
                name: self.name.clone(),
                reason: format!("FlushViewOfFile failed: {}", unsafe { GetLastError() }),
            });
        }
        Ok(())
    }
}

impl Drop for NamedMapping {
    fn drop(&mut self) {
        let view = MEMORY_MAPPED_VIEW_ADDRESS {
            Value: self.ptr.as_ptr() as *mut c_void,
        };
        // SAFETY: view and handle were produced in create/open_existing
        if unsafe { UnmapViewOfFile(view) } == 0 {
            tracing::error!(
                name = %self.name,
                code = unsafe { GetLastError() },
                "Failed to unmap shared memory view"
            );
        }
        if unsafe { CloseHandle(self.handle) } == 0 {
            tracing::error!(
                name = %self.name,
                code = unsafe { GetLastError() },
                "Failed to close the shared memory handle"
            );
        }
    }
}

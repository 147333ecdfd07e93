use std::{fs::File, os::windows::io::AsRawHandle};

use windows_sys::Win32::{
    Foundation::{CloseHandle, GetLastError, HANDLE},
    System::Memory::{
        CreateFileMappingW, FILE_MAP_READ, FILE_MAP_WRITE, FlushViewOfFile,
        MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, PAGE_READONLY, PAGE_READWRITE, UnmapViewOfFile,
    },
};

/// OS handle of a file-mapping object.
pub type RawMapping = HANDLE;

fn last_error() -> std::io::Error {
    let error = unsafe { GetLastError() };
    std::io::Error::from_raw_os_error(error as i32)
}

/// Creates a file-mapping object covering `len` bytes of `file`.
///
/// # Arguments
///
/// * `file` - The open file to map. Must have been opened with write access if
///   `writable` is set.
/// * `len` - The size of the mapping in bytes; must be non-zero.
/// * `writable` - Whether views of the mapping may be written.
///
/// # Returns
///
/// The mapping handle, which must be released with [`close_mapping`].
///
/// # References
///
/// <https://learn.microsoft.com/en-us/windows/win32/memory/creating-a-file-mapping-object>
pub fn create_mapping(file: &File, len: u64, writable: bool) -> std::io::Result<RawMapping> {
    let protect = if writable {
        PAGE_READWRITE
    } else {
        PAGE_READONLY
    };
    let handle = unsafe {
        CreateFileMappingW(
            file.as_raw_handle() as HANDLE,
            std::ptr::null(),
            protect,
            (len >> 32) as u32,
            len as u32,
            std::ptr::null(),
        )
    };
    if handle.is_null() {
        return Err(last_error());
    }
    Ok(handle)
}

/// Closes a file-mapping object created with [`create_mapping`].
///
/// Views mapped from the object stay valid until they are unmapped.
///
/// # Safety
///
/// `mapping` must have been returned by [`create_mapping`] and not closed yet.
pub unsafe fn close_mapping(mapping: RawMapping) -> std::io::Result<()> {
    if unsafe { CloseHandle(mapping) } == 0 {
        return Err(last_error());
    }
    Ok(())
}

/// Maps the first `len` bytes of the mapping into the address space.
///
/// # Returns
///
/// A pointer to the start of the view, which must be released with
/// [`unmap_view`].
pub fn map_view(
    mapping: RawMapping,
    len: usize,
    writable: bool,
) -> std::io::Result<*mut std::ffi::c_void> {
    let access = if writable {
        FILE_MAP_READ | FILE_MAP_WRITE
    } else {
        FILE_MAP_READ
    };
    let view = unsafe { MapViewOfFile(mapping, access, 0, 0, len) };
    if view.Value.is_null() {
        return Err(last_error());
    }
    Ok(view.Value)
}

/// Unmaps a view created with [`map_view`].
///
/// # Safety
///
/// - `ptr` must be the start of a view returned by [`map_view`]
/// - The view must not have been unmapped already
/// - No references into the view may outlive this call
pub unsafe fn unmap_view(ptr: *mut std::ffi::c_void, _len: usize) -> std::io::Result<()> {
    let address = MEMORY_MAPPED_VIEW_ADDRESS { Value: ptr };
    if unsafe { UnmapViewOfFile(address) } == 0 {
        return Err(last_error());
    }
    Ok(())
}

/// Writes the dirty pages of a view back to the file.
///
/// # Safety
///
/// `ptr` and `len` must describe a live view returned by [`map_view`].
pub unsafe fn flush_view(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<()> {
    if unsafe { FlushViewOfFile(ptr, len) } == 0 {
        return Err(last_error());
    }
    Ok(())
}

use std::{
    fs::File,
    os::fd::{AsRawFd, RawFd},
};

/// OS handle of a file mapping.
///
/// POSIX has no separate mapping object: views are created directly from the
/// file descriptor, which stays owned by the `File` it was taken from.
pub type RawMapping = RawFd;

/// Creates the mapping object for `file`.
///
/// # Arguments
///
/// * `file` - The open file to map. It must outlive the returned handle.
/// * `_len` - The size of the file in bytes.
/// * `_writable` - Whether views of the mapping may be written.
///
/// On POSIX systems this simply returns the file descriptor; access rights are
/// checked when a view is mapped.
pub fn create_mapping(file: &File, _len: u64, _writable: bool) -> std::io::Result<RawMapping> {
    Ok(file.as_raw_fd())
}

/// Closes a mapping created with [`create_mapping`].
///
/// The descriptor is owned by its `File`, so there is nothing to release here.
///
/// # Safety
///
/// `mapping` must have been returned by [`create_mapping`] and not closed yet.
pub unsafe fn close_mapping(_mapping: RawMapping) -> std::io::Result<()> {
    Ok(())
}

/// Maps the first `len` bytes of the mapping into the address space.
///
/// The view is shared with the file: stores through a writable view reach the
/// file once flushed (or when the kernel writes the dirty pages back).
///
/// # Returns
///
/// A pointer to the start of the view, which must be released with
/// [`unmap_view`] using the same `len`.
///
/// # Errors
///
/// Fails if `len` is zero, if the descriptor was not opened with the access
/// required by `writable`, or if the address space is exhausted.
pub fn map_view(
    mapping: RawMapping,
    len: usize,
    writable: bool,
) -> std::io::Result<*mut std::ffi::c_void> {
    let prot = if writable {
        libc::PROT_READ | libc::PROT_WRITE
    } else {
        libc::PROT_READ
    };
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            prot,
            libc::MAP_SHARED,
            mapping,
            0,
        )
    };
    if ptr.is_null() || ptr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    Ok(ptr)
}

/// Unmaps a view created with [`map_view`].
///
/// # Safety
///
/// - `ptr` and `len` must describe a view returned by [`map_view`]
/// - The view must not have been unmapped already
/// - No references into the view may outlive this call
pub unsafe fn unmap_view(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<()> {
    let res = unsafe { libc::munmap(ptr, len) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Synchronously writes the dirty pages of a view back to the file.
///
/// # Safety
///
/// `ptr` and `len` must describe a live view returned by [`map_view`].
pub unsafe fn flush_view(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<()> {
    let res = unsafe { libc::msync(ptr, len, libc::MS_SYNC) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

//! Targets without a supported mapping API: every mapping request fails.

use std::fs::File;

pub type RawMapping = ();

fn unsupported() -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "memory-mapped files are not supported on this platform",
    )
}

pub fn create_mapping(_file: &File, _len: u64, _writable: bool) -> std::io::Result<RawMapping> {
    Err(unsupported())
}

pub unsafe fn close_mapping(_mapping: RawMapping) -> std::io::Result<()> {
    Ok(())
}

pub fn map_view(
    _mapping: RawMapping,
    _len: usize,
    _writable: bool,
) -> std::io::Result<*mut std::ffi::c_void> {
    Err(unsupported())
}

pub unsafe fn unmap_view(_ptr: *mut std::ffi::c_void, _len: usize) -> std::io::Result<()> {
    Err(unsupported())
}

pub unsafe fn flush_view(_ptr: *mut std::ffi::c_void, _len: usize) -> std::io::Result<()> {
    Err(unsupported())
}

//! Platform file-mapping layer.
//!
//! [`FileMapping`](file_mapping::FileMapping) owns an open file together with its
//! OS mapping object, and hands out [`MappedView`](file_mapping::MappedView)s:
//! readable or writable byte views over the whole file that can be flushed back
//! to disk and are unmapped when dropped. The OS-specific calls live in the
//! `mmap` module, selected per target.

pub mod file_mapping;

#[cfg_attr(unix, path = "mmap_unix.rs")]
#[cfg_attr(windows, path = "mmap_win.rs")]
#[cfg_attr(not(any(unix, windows)), path = "mmap_fallback.rs")]
pub mod mmap;

pub use file_mapping::{FileMapping, MappedView, MappingAccess};

#[cfg(test)]
mod tests;

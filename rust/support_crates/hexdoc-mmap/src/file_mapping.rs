//! Memory-mapped file views.
//!
//! This module provides `FileMapping`, an open file together with its OS mapping
//! object, and `MappedView`, a byte view over the whole mapped file.
//!
//! # Lifetime
//!
//! A view does not borrow the mapping it was created from: on every supported
//! platform the mapped pages stay valid until the view itself is unmapped, even
//! if the mapping object is closed first. Owners can therefore release the
//! mapping and the view in either order.
//!
//! # Safety
//!
//! The bytes of a view alias the file on disk. Modifying the file through other
//! means (another process, another mapping, or plain file writes) while a view
//! is alive is not detected and may be observed through the view at any time.

use std::{
    fs::{File, OpenOptions},
    path::Path,
    ptr::NonNull,
};

use crate::mmap;

/// Access rights requested for a file mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingAccess {
    ReadOnly,
    ReadWrite,
}

impl MappingAccess {
    #[inline]
    pub fn is_writable(self) -> bool {
        self == MappingAccess::ReadWrite
    }
}

/// An open file and its OS mapping object.
///
/// The length of the mapping is fixed when it is created; the file is never
/// resized through it.
pub struct FileMapping {
    /// Keeps the descriptor or handle that `raw` refers to open.
    _file: File,
    len: u64,
    access: MappingAccess,
    /// `None` for zero-length files, which the OS refuses to map.
    raw: Option<mmap::RawMapping>,
}

impl FileMapping {
    /// Opens the file at `path` and creates a mapping of its current contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened with the requested access
    /// or if the OS refuses to create the mapping.
    pub fn open(path: impl AsRef<Path>, access: MappingAccess) -> std::io::Result<FileMapping> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(access.is_writable())
            .open(path)?;
        log::debug!("opening {access:?} mapping of {}", path.display());
        FileMapping::from_file(file, access)
    }

    /// Creates a mapping over an already open file.
    ///
    /// The file must have been opened with the rights implied by `access`.
    pub fn from_file(file: File, access: MappingAccess) -> std::io::Result<FileMapping> {
        let len = file.metadata()?.len();
        let raw = if len == 0 {
            None
        } else {
            Some(mmap::create_mapping(&file, len, access.is_writable())?)
        };
        log::debug!("created {access:?} file mapping of {len} bytes");
        Ok(FileMapping {
            _file: file,
            len,
            access,
            raw,
        })
    }

    /// Size of the mapped file in bytes, as observed when the mapping was created.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn access(&self) -> MappingAccess {
        self.access
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.access.is_writable()
    }

    /// Maps a view over the whole file.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when a writable view is requested from a
    /// read-only mapping, `InvalidInput` when the file does not fit into the
    /// address space, or the OS error reported by the mapping call.
    pub fn map_view(&self, writable: bool) -> std::io::Result<MappedView> {
        if writable && !self.is_writable() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "cannot map a writable view of a read-only mapping",
            ));
        }
        let len = usize::try_from(self.len).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "file does not fit into the address space",
            )
        })?;
        match self.raw {
            None => Ok(MappedView::empty(writable)),
            Some(raw) => {
                let ptr = mmap::map_view(raw, len, writable)?;
                Ok(MappedView {
                    ptr: ptr as *mut u8,
                    len,
                    writable,
                })
            }
        }
    }

    /// Closes the mapping object and the file, reporting any failure.
    ///
    /// Views created from this mapping remain usable until they are dropped.
    pub fn close(mut self) -> std::io::Result<()> {
        self.release()
    }

    fn release(&mut self) -> std::io::Result<()> {
        match self.raw.take() {
            Some(raw) => {
                log::debug!("closing file mapping of {} bytes", self.len);
                unsafe { mmap::close_mapping(raw) }
            }
            None => Ok(()),
        }
    }
}

impl Drop for FileMapping {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to close file mapping: {e}");
        }
    }
}

// SAFETY: the mapping handle is an OS object that may be used and closed from
// any thread; `FileMapping` is its sole owner.
unsafe impl Send for FileMapping {}

// SAFETY: shared access only reads the handle to map new views, which the OS
// allows concurrently.
unsafe impl Sync for FileMapping {}

impl std::fmt::Debug for FileMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMapping")
            .field("len", &self.len)
            .field("access", &self.access)
            .field("open", &self.raw.is_some())
            .finish()
    }
}

/// A mapped byte view over a whole file.
///
/// Reads and writes go straight to the mapped pages. [`MappedView::flush`]
/// forces dirty pages to the file; dropping the view unmaps it.
pub struct MappedView {
    /// Start of the view; dangling (never dereferenced) when `len` is zero.
    ptr: *mut u8,
    len: usize,
    writable: bool,
}

impl MappedView {
    fn empty(writable: bool) -> MappedView {
        MappedView {
            ptr: NonNull::dangling().as_ptr(),
            len: 0,
            writable,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Mutable access to the mapped bytes, or `None` for a read-only view.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> Option<&mut [u8]> {
        if self.writable {
            Some(unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) })
        } else {
            None
        }
    }

    /// Forces modified pages of the view to the backing file.
    ///
    /// A no-op for read-only and empty views.
    pub fn flush(&self) -> std::io::Result<()> {
        if !self.writable || self.len == 0 {
            return Ok(());
        }
        unsafe { mmap::flush_view(self.ptr as _, self.len) }
    }

    /// Unmaps the view, reporting any failure.
    pub fn unmap(mut self) -> std::io::Result<()> {
        self.release()
    }

    fn release(&mut self) -> std::io::Result<()> {
        if self.len == 0 || self.ptr.is_null() {
            return Ok(());
        }
        let ptr = std::mem::replace(&mut self.ptr, std::ptr::null_mut());
        unsafe { mmap::unmap_view(ptr as _, self.len) }
    }
}

impl std::ops::Deref for MappedView {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for MappedView {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Drop for MappedView {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to unmap view of {} bytes: {e}", self.len);
        }
    }
}

// SAFETY: MappedView owns its mapped region and unmaps it on drop, so it can be
// moved to another thread.
unsafe impl Send for MappedView {}

// SAFETY: shared references only allow reading the mapped bytes.
unsafe impl Sync for MappedView {}

impl std::fmt::Debug for MappedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedView")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("writable", &self.writable)
            .finish()
    }
}

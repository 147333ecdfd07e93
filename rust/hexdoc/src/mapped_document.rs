//! Binary document over a memory-mapped file.

use std::{path::Path, sync::Arc};

use hexdoc_common::{Error, EventSource, Result, SubscriptionId};
use hexdoc_mmap::{FileMapping, MappedView, MappingAccess};
use hexdoc_ranges::{BitLocation, BitRange, BitRangeUnion, ReadOnlyBitRangeUnion};

use crate::document::{BinaryDocument, ChangeKind, DocumentChange, verify_span};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappedDocumentOptions {
    /// Map the file without write access and reject every write.
    pub read_only: bool,
}

impl MappedDocumentOptions {
    pub fn read_only() -> MappedDocumentOptions {
        MappedDocumentOptions { read_only: true }
    }

    fn access(&self) -> MappingAccess {
        if self.read_only {
            MappingAccess::ReadOnly
        } else {
            MappingAccess::ReadWrite
        }
    }
}

#[derive(Debug)]
enum MappingOwner {
    /// Closed together with the document.
    Owned(FileMapping),
    /// Left open for the other holders.
    Shared(Arc<FileMapping>),
}

impl MappingOwner {
    fn get(&self) -> &FileMapping {
        match self {
            MappingOwner::Owned(mapping) => mapping,
            MappingOwner::Shared(mapping) => mapping.as_ref(),
        }
    }
}

/// Fixed-length binary document backed by a memory-mapped file.
///
/// The whole file is mapped at construction. Writes go straight to the
/// mapped pages and reach the file on [`flush`](BinaryDocument::flush) or
/// when the OS writes the pages back. The length never changes, so insertion
/// and removal are unsupported and the valid ranges stay `[0, len)`.
#[derive(Debug)]
pub struct MemoryMappedBinaryDocument {
    // Declared before `mapping` so that the view is unmapped first on drop.
    view: MappedView,
    mapping: MappingOwner,
    len: u64,
    read_only: bool,
    valid_ranges: BitRangeUnion,
    changed: EventSource<DocumentChange>,
}

impl MemoryMappedBinaryDocument {
    /// Opens the file at `path` for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> Result<MemoryMappedBinaryDocument> {
        MemoryMappedBinaryDocument::open_with_options(path, MappedDocumentOptions::default())
    }

    pub fn open_read_only(path: impl AsRef<Path>) -> Result<MemoryMappedBinaryDocument> {
        MemoryMappedBinaryDocument::open_with_options(path, MappedDocumentOptions::read_only())
    }

    pub fn open_with_options(
        path: impl AsRef<Path>,
        options: MappedDocumentOptions,
    ) -> Result<MemoryMappedBinaryDocument> {
        let path = path.as_ref();
        let mapping = FileMapping::open(path, options.access())
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        MemoryMappedBinaryDocument::from_mapping(mapping, options)
    }

    /// Takes ownership of `mapping`; it is closed together with the document.
    ///
    /// # Errors
    ///
    /// Fails with an invalid-argument error when a writable document is
    /// requested over a read-only mapping.
    pub fn from_mapping(
        mapping: FileMapping,
        options: MappedDocumentOptions,
    ) -> Result<MemoryMappedBinaryDocument> {
        MemoryMappedBinaryDocument::with_owner(MappingOwner::Owned(mapping), options)
    }

    /// Maps a view of a mapping shared with other holders. Closing the
    /// document leaves the mapping open.
    pub fn from_shared_mapping(
        mapping: Arc<FileMapping>,
        options: MappedDocumentOptions,
    ) -> Result<MemoryMappedBinaryDocument> {
        MemoryMappedBinaryDocument::with_owner(MappingOwner::Shared(mapping), options)
    }

    fn with_owner(
        owner: MappingOwner,
        options: MappedDocumentOptions,
    ) -> Result<MemoryMappedBinaryDocument> {
        let mapping = owner.get();
        if !options.read_only && !mapping.is_writable() {
            return Err(Error::invalid_arg(
                "mapping",
                "a writable document requires a writable mapping",
            ));
        }
        let view = mapping
            .map_view(!options.read_only)
            .map_err(|e| Error::io("map view", e))?;
        let len = mapping.len();

        let mut valid_ranges = BitRangeUnion::new();
        valid_ranges.add(BitRange::EMPTY.extend_to(BitLocation::from_byte(len)));
        log::debug!(
            "opened mapped document of {len} bytes (read_only: {})",
            options.read_only
        );
        Ok(MemoryMappedBinaryDocument {
            view,
            mapping: owner,
            len,
            read_only: options.read_only,
            valid_ranges,
            changed: EventSource::new(),
        })
    }

    /// The mapping this document reads from.
    pub fn mapping(&self) -> &FileMapping {
        self.mapping.get()
    }

    /// Unmaps the view and, for an owned mapping, closes it, reporting any
    /// failure. Dropping the document does the same but only logs failures.
    pub fn close(self) -> Result<()> {
        let MemoryMappedBinaryDocument {
            view,
            mapping,
            len,
            ..
        } = self;
        log::debug!("closing mapped document of {len} bytes");
        view.unmap().map_err(|e| Error::io("unmap view", e))?;
        match mapping {
            MappingOwner::Owned(mapping) => {
                mapping.close().map_err(|e| Error::io("close mapping", e))
            }
            MappingOwner::Shared(_) => Ok(()),
        }
    }
}

impl BinaryDocument for MemoryMappedBinaryDocument {
    #[inline]
    fn len(&self) -> u64 {
        self.len
    }

    fn valid_ranges(&self) -> ReadOnlyBitRangeUnion<'_> {
        ReadOnlyBitRangeUnion::new(&self.valid_ranges)
    }

    fn can_insert(&self) -> bool {
        false
    }

    fn can_remove(&self) -> bool {
        false
    }

    #[inline]
    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn read(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        let end = verify_span(offset, buffer.len() as u64, self.len)?;
        buffer.copy_from_slice(&self.view[offset as usize..end as usize]);
        Ok(())
    }

    fn write(&mut self, offset: u64, buffer: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(Error::read_only("write"));
        }
        let end = verify_span(offset, buffer.len() as u64, self.len)?;
        if buffer.is_empty() {
            return Ok(());
        }
        let bytes = self
            .view
            .as_bytes_mut()
            .ok_or_else(|| Error::read_only("write"))?;
        bytes[offset as usize..end as usize].copy_from_slice(buffer);

        let change = DocumentChange::bytes(ChangeKind::Modify, offset, buffer.len() as u64)?;
        log::trace!("mapped document modified {}", change.affected_range);
        self.changed.emit(&change);
        Ok(())
    }

    fn insert(&mut self, _offset: u64, _buffer: &[u8]) -> Result<()> {
        Err(Error::unsupported("insert"))
    }

    fn remove(&mut self, _offset: u64, _length: u64) -> Result<()> {
        Err(Error::unsupported("remove"))
    }

    fn flush(&mut self) -> Result<()> {
        log::trace!("flushing mapped document of {} bytes", self.len);
        self.view.flush().map_err(|e| Error::io("flush view", e))
    }

    fn subscribe(&self, listener: Box<dyn FnMut(&DocumentChange)>) -> SubscriptionId {
        self.changed.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }
}

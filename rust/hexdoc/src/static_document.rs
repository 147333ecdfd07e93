//! In-memory binary document.

use hexdoc_common::{Error, EventSource, Result, SubscriptionId};
use hexdoc_ranges::{BitLocation, BitRange, BitRangeUnion, ReadOnlyBitRangeUnion};

use crate::{
    document::{BinaryDocument, ChangeKind, DocumentChange, verify_position, verify_span},
    gap_buffer::GapBuffer,
};

/// Capabilities of a [`StaticBinaryDocument`].
///
/// The buffer always supports resizing mechanically; insertion and removal
/// are exposed only when the owner opts in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticDocumentOptions {
    pub can_insert: bool,
    pub can_remove: bool,
    pub read_only: bool,
}

impl StaticDocumentOptions {
    /// Writable document that supports both insertion and removal.
    pub fn resizable() -> StaticDocumentOptions {
        StaticDocumentOptions {
            can_insert: true,
            can_remove: true,
            read_only: false,
        }
    }

    /// Document that rejects every mutation.
    pub fn read_only() -> StaticDocumentOptions {
        StaticDocumentOptions {
            read_only: true,
            ..Default::default()
        }
    }
}

/// Binary document backed by a contiguous in-memory [`GapBuffer`].
///
/// Every byte of the buffer is meaningful, so the valid ranges always consist
/// of the single range `[0, len)`: inserts extend it at the end and removals
/// trim the removed length from the end.
#[derive(Debug)]
pub struct StaticBinaryDocument {
    buffer: GapBuffer,
    valid_ranges: BitRangeUnion,
    options: StaticDocumentOptions,
    changed: EventSource<DocumentChange>,
}

impl StaticBinaryDocument {
    /// Zero-filled document of `size` bytes with default options.
    pub fn new(size: usize) -> StaticBinaryDocument {
        StaticBinaryDocument::from_bytes(vec![0u8; size])
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> StaticBinaryDocument {
        StaticBinaryDocument::with_options(bytes, StaticDocumentOptions::default())
    }

    pub fn with_options(
        bytes: impl Into<Vec<u8>>,
        options: StaticDocumentOptions,
    ) -> StaticBinaryDocument {
        let buffer = GapBuffer::from_vec(bytes.into());
        let mut valid_ranges = BitRangeUnion::new();
        valid_ranges.add(BitRange::EMPTY.extend_to(BitLocation::from_byte(buffer.len() as u64)));
        log::debug!(
            "created static document of {} bytes with {options:?}",
            buffer.len()
        );
        StaticBinaryDocument {
            buffer,
            valid_ranges,
            options,
            changed: EventSource::new(),
        }
    }

    #[inline]
    pub fn options(&self) -> StaticDocumentOptions {
        self.options
    }

    /// Copies the whole content into a new vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    fn verify_writable(&self, operation: &str) -> Result<()> {
        if self.options.read_only {
            return Err(Error::read_only(operation));
        }
        Ok(())
    }

    fn emit(&self, kind: ChangeKind, offset: u64, length: u64) -> Result<()> {
        let change = DocumentChange::bytes(kind, offset, length)?;
        log::trace!("static document {kind:?} at {}", change.affected_range);
        self.changed.emit(&change);
        Ok(())
    }
}

impl BinaryDocument for StaticBinaryDocument {
    #[inline]
    fn len(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn valid_ranges(&self) -> ReadOnlyBitRangeUnion<'_> {
        ReadOnlyBitRangeUnion::new(&self.valid_ranges)
    }

    #[inline]
    fn can_insert(&self) -> bool {
        self.options.can_insert
    }

    #[inline]
    fn can_remove(&self) -> bool {
        self.options.can_remove
    }

    #[inline]
    fn is_read_only(&self) -> bool {
        self.options.read_only
    }

    fn read(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        verify_span(offset, buffer.len() as u64, self.len())?;
        self.buffer.read(offset as usize, buffer);
        Ok(())
    }

    fn write(&mut self, offset: u64, buffer: &[u8]) -> Result<()> {
        self.verify_writable("write")?;
        verify_span(offset, buffer.len() as u64, self.len())?;
        if buffer.is_empty() {
            return Ok(());
        }
        self.buffer.write(offset as usize, buffer);
        self.emit(ChangeKind::Modify, offset, buffer.len() as u64)
    }

    fn insert(&mut self, offset: u64, buffer: &[u8]) -> Result<()> {
        self.verify_writable("insert")?;
        if !self.options.can_insert {
            return Err(Error::unsupported("insert"));
        }
        let old_len = self.len();
        verify_position(offset, old_len)?;
        let new_len = old_len
            .checked_add(buffer.len() as u64)
            .ok_or_else(|| Error::out_of_range("buffer", "document length overflows"))?;
        if buffer.is_empty() {
            return Ok(());
        }

        self.buffer.insert(offset as usize, buffer);
        self.valid_ranges.add(BitRange::from_bytes(old_len, new_len)?);
        self.emit(ChangeKind::Insert, offset, buffer.len() as u64)
    }

    fn remove(&mut self, offset: u64, length: u64) -> Result<()> {
        self.verify_writable("remove")?;
        if !self.options.can_remove {
            return Err(Error::unsupported("remove"));
        }
        let old_len = self.len();
        let end = verify_span(offset, length, old_len)?;
        if length == 0 {
            return Ok(());
        }

        self.buffer.remove(offset as usize..end as usize);
        self.valid_ranges.remove(BitRange::from_bytes(old_len - length, old_len)?);
        self.emit(ChangeKind::Remove, offset, length)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn FnMut(&DocumentChange)>) -> SubscriptionId {
        self.changed.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }
}

//! The binary document contract.

use hexdoc_common::{Error, Result, SubscriptionId};
use hexdoc_ranges::{BitRange, ReadOnlyBitRangeUnion};

/// Kind of mutation reported by a [`DocumentChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Bytes were overwritten in place.
    Modify,
    /// Bytes were inserted; content after the range moved forward.
    Insert,
    /// Bytes were removed; content after the range moved backward.
    Remove,
}

/// Notification emitted by a document after a mutation has been applied to
/// both its storage and its valid ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    /// Byte-aligned range affected by the mutation, in offsets of the document
    /// before it (for removals) or after it (for inserts and modifications).
    pub affected_range: BitRange,
}

impl DocumentChange {
    pub fn new(kind: ChangeKind, affected_range: BitRange) -> DocumentChange {
        DocumentChange {
            kind,
            affected_range,
        }
    }

    /// Change covering `length` bytes starting at byte `offset`.
    pub fn bytes(kind: ChangeKind, offset: u64, length: u64) -> Result<DocumentChange> {
        let end = offset
            .checked_add(length)
            .ok_or_else(|| Error::out_of_range("length", "offset + length overflows"))?;
        Ok(DocumentChange::new(kind, BitRange::from_bytes(offset, end)?))
    }
}

/// Uniform access to a byte store addressed by 64-bit offsets.
///
/// Every mutation is validated before any state is touched: a rejected call
/// leaves both the storage and [`valid_ranges`](BinaryDocument::valid_ranges)
/// unchanged. Successful mutations emit a [`DocumentChange`] to subscribers
/// once the storage and valid ranges are both up to date.
///
/// Documents are owned by a single caller; they perform no internal locking.
pub trait BinaryDocument {
    /// Current length of the document in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte ranges that currently hold meaningful content.
    fn valid_ranges(&self) -> ReadOnlyBitRangeUnion<'_>;

    fn can_insert(&self) -> bool;

    fn can_remove(&self) -> bool;

    fn is_read_only(&self) -> bool;

    /// Copies `buffer.len()` bytes starting at `offset` into `buffer`.
    ///
    /// # Errors
    ///
    /// Fails with an out-of-range error if the requested span extends past
    /// the end of the document.
    fn read(&self, offset: u64, buffer: &mut [u8]) -> Result<()>;

    /// Overwrites `buffer.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Fails if the document is read-only or the span extends past its end.
    fn write(&mut self, offset: u64, buffer: &[u8]) -> Result<()>;

    /// Inserts `buffer` at `offset`, growing the document.
    ///
    /// # Errors
    ///
    /// Fails if the document is read-only, does not support insertion, or
    /// `offset` lies past its end.
    fn insert(&mut self, offset: u64, buffer: &[u8]) -> Result<()>;

    /// Removes `length` bytes starting at `offset`, shrinking the document.
    ///
    /// # Errors
    ///
    /// Fails if the document is read-only, does not support removal, or the
    /// span extends past its end.
    fn remove(&mut self, offset: u64, length: u64) -> Result<()>;

    /// Commits buffered state to the backing resource.
    fn flush(&mut self) -> Result<()>;

    /// Registers a listener for [`DocumentChange`] notifications.
    fn subscribe(&self, listener: Box<dyn FnMut(&DocumentChange)>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Reads `length` bytes starting at `offset` into a new vector.
    fn read_to_vec(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; length];
        self.read(offset, &mut buffer)?;
        Ok(buffer)
    }
}

/// Verifies that `[offset, offset + length)` lies within a document of
/// `doc_len` bytes and returns the end of the span.
pub(crate) fn verify_span(offset: u64, length: u64, doc_len: u64) -> Result<u64> {
    let end = offset
        .checked_add(length)
        .filter(|end| *end <= doc_len)
        .ok_or_else(|| {
            Error::out_of_range(
                "offset",
                format!("span of {length} bytes at {offset} exceeds document length {doc_len}"),
            )
        })?;
    Ok(end)
}

/// Verifies that `offset` is a valid insertion point in a document of
/// `doc_len` bytes.
pub(crate) fn verify_position(offset: u64, doc_len: u64) -> Result<()> {
    if offset > doc_len {
        return Err(Error::out_of_range(
            "offset",
            format!("{offset} is past the document end {doc_len}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_change_bytes() {
        let change = DocumentChange::bytes(ChangeKind::Insert, 4, 3).unwrap();
        assert_eq!(change.kind, ChangeKind::Insert);
        assert_eq!(change.affected_range, BitRange::from_bytes(4, 7).unwrap());
        assert!(DocumentChange::bytes(ChangeKind::Modify, u64::MAX, 1).is_err());
    }

    #[test]
    fn test_verify_span() {
        assert_eq!(verify_span(0, 10, 10).unwrap(), 10);
        assert_eq!(verify_span(10, 0, 10).unwrap(), 10);
        assert!(verify_span(5, 6, 10).unwrap_err().is_out_of_range());
        assert!(verify_span(u64::MAX, 2, u64::MAX).is_err());
        assert!(verify_span(11, 0, 10).is_err());
    }

    #[test]
    fn test_verify_position() {
        assert!(verify_position(10, 10).is_ok());
        assert!(verify_position(11, 10).unwrap_err().is_out_of_range());
    }
}

//! Binary document storage for hex editing.
//!
//! A binary document exposes uniform read/write/insert/remove semantics over a
//! byte store addressed with 64-bit offsets, tracks which byte ranges currently
//! hold meaningful content, and notifies observers after every mutation.
//!
//! Two backends implement the [`BinaryDocument`] contract:
//!
//! - [`StaticBinaryDocument`] - a growable in-memory buffer ([`GapBuffer`]),
//!   with opt-in insert and remove support
//! - [`MemoryMappedBinaryDocument`] - a fixed-length memory-mapped file that can
//!   only be modified in place

pub mod document;
pub mod gap_buffer;
pub mod mapped_document;
pub mod static_document;

pub use document::{BinaryDocument, ChangeKind, DocumentChange};
pub use gap_buffer::GapBuffer;
pub use mapped_document::{MappedDocumentOptions, MemoryMappedBinaryDocument};
pub use static_document::{StaticBinaryDocument, StaticDocumentOptions};

pub use hexdoc_common::{Error, ErrorKind, Result, SubscriptionId};
pub use hexdoc_ranges::{
    BitLocation, BitRange, BitRangeUnion, RangeUnionChange, ReadOnlyBitRangeUnion,
};

//! Bit-precision addressing and disjoint range sets.
//!
//! This crate provides the addressing primitives of the binary document core:
//!
//! - [`BitLocation`] - the address of a single bit in a byte-addressed space of up
//!   to 2^64 bytes
//! - [`BitRange`] - a half-open `[start, end)` interval of bit locations
//! - [`BitRangeUnion`] - an always-normalized set of disjoint, non-adjacent ranges
//!   with change notification
//! - [`ReadOnlyBitRangeUnion`] - a borrowing, query-only view of a union

pub mod bit_location;
pub mod bit_range;
pub mod range_union;
pub mod read_only_union;

pub use bit_location::BitLocation;
pub use bit_range::BitRange;
pub use range_union::{BitRangeUnion, RangeUnionChange};
pub use read_only_union::ReadOnlyBitRangeUnion;

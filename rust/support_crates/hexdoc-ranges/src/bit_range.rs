use std::{fmt, ops::Range};

use hexdoc_common::{Error, Result, verify_arg};

use crate::BitLocation;

/// Half-open interval `[start, end)` of bit locations.
///
/// Construction guarantees `end >= start`. A range with `start == end` is empty
/// and contains no location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BitRange {
    start: BitLocation,
    end: BitLocation,
}

impl BitRange {
    /// The zero-length range at `(0, 0)`.
    pub const EMPTY: BitRange = BitRange {
        start: BitLocation::MIN,
        end: BitLocation::MIN,
    };

    pub fn new(start: BitLocation, end: BitLocation) -> Result<BitRange> {
        verify_arg!(end, start <= end);
        Ok(BitRange { start, end })
    }

    /// Builds a range whose ordering the caller has already established.
    #[inline]
    pub(crate) fn new_unchecked(start: BitLocation, end: BitLocation) -> BitRange {
        debug_assert!(start <= end);
        BitRange { start, end }
    }

    /// Byte-aligned range `[start, end)`.
    pub fn from_bytes(start: u64, end: u64) -> Result<BitRange> {
        BitRange::new(BitLocation::from_byte(start), BitLocation::from_byte(end))
    }

    /// Range of `byte_length` bytes beginning at `start`.
    pub fn from_length(start: BitLocation, byte_length: u64) -> Result<BitRange> {
        let end = start.add_bytes(byte_length)?;
        Ok(BitRange { start, end })
    }

    #[inline]
    pub const fn start(&self) -> BitLocation {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> BitLocation {
        self.end
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of byte boundaries between the start and end byte indices.
    #[inline]
    pub const fn byte_length(&self) -> u64 {
        self.end.byte_index() - self.start.byte_index()
    }

    /// Exact number of bits covered by the range.
    ///
    /// Returned as `u128` since a range may span the full 2^64 byte space.
    #[inline]
    pub const fn bit_length(&self) -> u128 {
        self.byte_length() as u128 * 8 + self.end.bit_index() as u128
            - self.start.bit_index() as u128
    }

    #[inline]
    pub fn contains(&self, location: BitLocation) -> bool {
        self.start <= location && location < self.end
    }

    /// Returns `true` if `other` lies entirely within this range.
    #[inline]
    pub fn contains_range(&self, other: &BitRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if the two ranges share at least one location.
    ///
    /// Empty ranges never overlap anything, and ranges that merely touch
    /// (`self.end == other.start`) do not overlap.
    #[inline]
    pub fn overlaps_with(&self, other: &BitRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Widens the range so that `location` becomes one of its boundaries if it
    /// lies outside.
    pub fn extend_to(&self, location: BitLocation) -> BitRange {
        BitRange {
            start: self.start.min(location),
            end: self.end.max(location),
        }
    }

    /// Intersection of the two ranges, or [`BitRange::EMPTY`] when they do not
    /// overlap.
    pub fn clamp(&self, other: &BitRange) -> BitRange {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start >= end {
            BitRange::EMPTY
        } else {
            BitRange { start, end }
        }
    }

    /// Splits the range into `[start, location)` and `[location, end)`.
    ///
    /// Fails unless the range contains `location`; in particular splitting at
    /// `end` is rejected since `end` is exclusive.
    pub fn split(&self, location: BitLocation) -> Result<(BitRange, BitRange)> {
        if !self.contains(location) {
            return Err(Error::out_of_range(
                "location",
                format!("{location} is not inside {self}"),
            ));
        }
        Ok((
            BitRange {
                start: self.start,
                end: location,
            },
            BitRange {
                start: location,
                end: self.end,
            },
        ))
    }
}

impl TryFrom<Range<u64>> for BitRange {
    type Error = Error;

    fn try_from(range: Range<u64>) -> Result<Self> {
        BitRange::from_bytes(range.start, range.end)
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

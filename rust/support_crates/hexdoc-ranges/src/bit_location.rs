//! Bit-precision addressing.
//!
//! A [`BitLocation`] addresses a single bit as a byte index plus a bit index in
//! `0..=7`. Locations are immutable values; every arithmetic operation returns
//! a new location, and operations that would leave the `[MIN, MAX]` address
//! space fail with an out-of-range error instead of wrapping.

use std::{fmt, str::FromStr};

use hexdoc_common::{Error, Result, verify_range};

use crate::BitRange;

/// Address of a single bit within a byte-addressed space of up to 2^64 bytes.
///
/// Locations are ordered by byte index first, then by bit index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitLocation {
    byte_index: u64,
    bit_index: u8,
}

impl BitLocation {
    /// The first addressable bit, `(0, 0)`.
    pub const MIN: BitLocation = BitLocation {
        byte_index: 0,
        bit_index: 0,
    };

    /// The last addressable bit, `(u64::MAX, 7)`.
    pub const MAX: BitLocation = BitLocation {
        byte_index: u64::MAX,
        bit_index: 7,
    };

    pub fn new(byte_index: u64, bit_index: u8) -> Result<BitLocation> {
        verify_range!(bit_index, bit_index <= 7);
        Ok(BitLocation {
            byte_index,
            bit_index,
        })
    }

    /// Location of the first bit of the byte at `byte_index`.
    #[inline]
    pub const fn from_byte(byte_index: u64) -> BitLocation {
        BitLocation {
            byte_index,
            bit_index: 0,
        }
    }

    #[inline]
    pub const fn byte_index(&self) -> u64 {
        self.byte_index
    }

    #[inline]
    pub const fn bit_index(&self) -> u8 {
        self.bit_index
    }

    #[inline]
    pub const fn is_byte_aligned(&self) -> bool {
        self.bit_index == 0
    }

    /// Returns the location `bits` bits after this one.
    ///
    /// When `bits` does not fit into the remainder of the current byte, the
    /// remainder is consumed first (landing on the start of the next byte) and
    /// the rest is split into whole bytes and a bit carry.
    pub fn add_bits(&self, bits: u64) -> Result<BitLocation> {
        let remaining = u64::from(7 - self.bit_index);
        if bits <= remaining {
            return Ok(BitLocation {
                byte_index: self.byte_index,
                bit_index: self.bit_index + bits as u8,
            });
        }

        let rest = bits - remaining - 1;
        let byte_index = self
            .byte_index
            .checked_add(1 + rest / 8)
            .ok_or_else(|| overflow("add_bits"))?;
        Ok(BitLocation {
            byte_index,
            bit_index: (rest % 8) as u8,
        })
    }

    /// Returns the location `bits` bits before this one.
    pub fn subtract_bits(&self, bits: u64) -> Result<BitLocation> {
        let available = u64::from(self.bit_index);
        if bits <= available {
            return Ok(BitLocation {
                byte_index: self.byte_index,
                bit_index: self.bit_index - bits as u8,
            });
        }

        let rest = bits - available - 1;
        let byte_index = self
            .byte_index
            .checked_sub(1 + rest / 8)
            .ok_or_else(|| underflow("subtract_bits"))?;
        Ok(BitLocation {
            byte_index,
            bit_index: 7 - (rest % 8) as u8,
        })
    }

    pub fn add_bytes(&self, bytes: u64) -> Result<BitLocation> {
        let byte_index = self
            .byte_index
            .checked_add(bytes)
            .ok_or_else(|| overflow("add_bytes"))?;
        Ok(BitLocation {
            byte_index,
            bit_index: self.bit_index,
        })
    }

    pub fn subtract_bytes(&self, bytes: u64) -> Result<BitLocation> {
        let byte_index = self
            .byte_index
            .checked_sub(bytes)
            .ok_or_else(|| underflow("subtract_bytes"))?;
        Ok(BitLocation {
            byte_index,
            bit_index: self.bit_index,
        })
    }

    /// Rounds up to the start of the next byte, unless already byte-aligned.
    pub fn align_up(&self) -> Result<BitLocation> {
        if self.is_byte_aligned() {
            return Ok(*self);
        }
        let byte_index = self
            .byte_index
            .checked_add(1)
            .ok_or_else(|| overflow("align_up"))?;
        Ok(BitLocation::from_byte(byte_index))
    }

    /// Rounds down to the start of the current byte.
    #[inline]
    pub const fn align_down(&self) -> BitLocation {
        BitLocation::from_byte(self.byte_index)
    }

    /// The next bit. Fails at [`BitLocation::MAX`].
    pub fn next(&self) -> Result<BitLocation> {
        if *self == Self::MAX {
            return Err(overflow("next"));
        }
        self.add_bits(1)
    }

    /// The previous bit. Fails at [`BitLocation::MIN`].
    pub fn previous(&self) -> Result<BitLocation> {
        if *self == Self::MIN {
            return Err(underflow("previous"));
        }
        self.subtract_bits(1)
    }

    /// The next bit, saturating at [`BitLocation::MAX`].
    pub fn next_or_max(&self) -> BitLocation {
        self.next().unwrap_or(Self::MAX)
    }

    /// The previous bit, saturating at [`BitLocation::MIN`].
    pub fn previous_or_zero(&self) -> BitLocation {
        self.previous().unwrap_or(Self::MIN)
    }

    /// Restricts this location to the bits covered by `range`.
    ///
    /// The result is never before `range.start()` and never after the last bit
    /// of the range. For an empty range the start wins only if it precedes the
    /// last bit before `range.end()`.
    pub fn clamp(self, range: &BitRange) -> BitLocation {
        self.max(range.start()).min(range.end().previous_or_zero())
    }
}

fn overflow(operation: &str) -> Error {
    Error::out_of_range(
        "location",
        format!("{operation} moves past the end of the address space"),
    )
}

fn underflow(operation: &str) -> Error {
    Error::out_of_range(
        "location",
        format!("{operation} moves before the start of the address space"),
    )
}

impl From<u64> for BitLocation {
    #[inline]
    fn from(byte_index: u64) -> Self {
        BitLocation::from_byte(byte_index)
    }
}

impl fmt::Display for BitLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}:{}", self.byte_index, self.bit_index)
    }
}

impl FromStr for BitLocation {
    type Err = Error;

    /// Parses `<hex byte index>[:<bit index>]`, optionally prefixed by `0x`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (byte_part, bit_part) = match s.split_once(':') {
            Some((byte_part, bit_part)) => (byte_part, Some(bit_part)),
            None => (s, None),
        };
        let byte_part = byte_part
            .strip_prefix("0x")
            .or_else(|| byte_part.strip_prefix("0X"))
            .unwrap_or(byte_part);
        let byte_index = u64::from_str_radix(byte_part, 16)
            .map_err(|e| Error::invalid_arg("byte_index", format!("'{byte_part}': {e}")))?;
        let bit_index = match bit_part {
            Some(bit_part) => bit_part
                .parse::<u8>()
                .map_err(|e| Error::invalid_arg("bit_index", format!("'{bit_part}': {e}")))?,
            None => 0,
        };
        BitLocation::new(byte_index, bit_index)
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;

    fn loc(byte_index: u64, bit_index: u8) -> BitLocation {
        BitLocation::new(byte_index, bit_index).unwrap()
    }

    fn to_bits(l: BitLocation) -> u128 {
        l.byte_index() as u128 * 8 + l.bit_index() as u128
    }

    #[test]
    fn test_new_rejects_bit_index() {
        assert!(BitLocation::new(0, 7).is_ok());
        let err = BitLocation::new(0, 8).unwrap_err();
        assert!(err.is_out_of_range());
    }

    #[test]
    fn test_add_bits_within_byte() {
        assert_eq!(loc(5, 3).add_bits(0).unwrap(), loc(5, 3));
        assert_eq!(loc(5, 3).add_bits(4).unwrap(), loc(5, 7));
    }

    #[test]
    fn test_add_bits_carry() {
        assert_eq!(loc(5, 3).add_bits(10).unwrap(), loc(6, 5));
        assert_eq!(loc(5, 3).add_bits(5).unwrap(), loc(6, 0));
        assert_eq!(loc(0, 0).add_bits(8).unwrap(), loc(1, 0));
        assert_eq!(loc(0, 7).add_bits(1).unwrap(), loc(1, 0));
        assert_eq!(loc(0, 0).add_bits(8 * 1000 + 3).unwrap(), loc(1000, 3));
    }

    #[test]
    fn test_add_bits_matches_linear_model() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..1000 {
            let start = loc(rng.u64(0..1 << 40), rng.u8(0..8));
            let bits = rng.u64(0..1 << 20);
            let sum = start.add_bits(bits).unwrap();
            assert_eq!(to_bits(sum), to_bits(start) + bits as u128);
            assert_eq!(sum.subtract_bits(bits).unwrap(), start);
        }
    }

    #[test]
    fn test_add_bits_overflow() {
        assert!(BitLocation::MAX.add_bits(1).unwrap_err().is_out_of_range());
        assert_eq!(loc(u64::MAX, 0).add_bits(7).unwrap(), BitLocation::MAX);
        assert!(loc(u64::MAX - 1, 0).add_bits(16).is_err());
    }

    #[test]
    fn test_subtract_bits() {
        assert_eq!(loc(6, 5).subtract_bits(10).unwrap(), loc(5, 3));
        assert_eq!(loc(1, 0).subtract_bits(1).unwrap(), loc(0, 7));
        assert!(loc(0, 3).subtract_bits(4).is_err());
        assert_eq!(loc(0, 3).subtract_bits(3).unwrap(), BitLocation::MIN);
    }

    #[test]
    fn test_bytes_arithmetic() {
        assert_eq!(loc(10, 2).add_bytes(5).unwrap(), loc(15, 2));
        assert_eq!(loc(10, 2).subtract_bytes(10).unwrap(), loc(0, 2));
        assert!(loc(10, 2).subtract_bytes(11).is_err());
        assert!(loc(u64::MAX, 0).add_bytes(1).is_err());
    }

    #[test]
    fn test_alignment() {
        assert_eq!(loc(3, 0).align_up().unwrap(), loc(3, 0));
        assert_eq!(loc(3, 1).align_up().unwrap(), loc(4, 0));
        assert_eq!(loc(3, 7).align_down(), loc(3, 0));
        assert!(BitLocation::MAX.align_up().is_err());
    }

    #[test]
    fn test_next_previous() {
        assert_eq!(loc(0, 7).next().unwrap(), loc(1, 0));
        assert_eq!(loc(1, 0).previous().unwrap(), loc(0, 7));
        assert!(BitLocation::MAX.next().is_err());
        assert!(BitLocation::MIN.previous().is_err());
        assert_eq!(BitLocation::MAX.next_or_max(), BitLocation::MAX);
        assert_eq!(BitLocation::MIN.previous_or_zero(), BitLocation::MIN);
    }

    #[test]
    fn test_total_order() {
        let mut rng = fastrand::Rng::with_seed(42);
        let sample = |rng: &mut fastrand::Rng| loc(rng.u64(0..4), rng.u8(0..8));
        for _ in 0..500 {
            let (a, b, c) = (sample(&mut rng), sample(&mut rng), sample(&mut rng));
            let relations = [a < b, a == b, a > b];
            assert_eq!(relations.iter().filter(|r| **r).count(), 1);
            assert_eq!(a.cmp(&b), to_bits(a).cmp(&to_bits(b)));
            if a <= b && b <= c {
                assert!(a <= c);
            }
        }
        assert_eq!(loc(1, 0).cmp(&loc(0, 7)), Ordering::Greater);
    }

    #[test]
    fn test_clamp() {
        let range = BitRange::from_bytes(10, 20).unwrap();
        assert_eq!(loc(5, 0).clamp(&range), loc(10, 0));
        assert_eq!(loc(15, 3).clamp(&range), loc(15, 3));
        assert_eq!(loc(25, 0).clamp(&range), loc(19, 7));
    }

    #[test]
    fn test_display_and_parse() {
        let l = loc(0x1A2B, 5);
        assert_eq!(l.to_string(), "1A2B:5");
        assert_eq!("1A2B:5".parse::<BitLocation>().unwrap(), l);
        assert_eq!("0x10".parse::<BitLocation>().unwrap(), loc(16, 0));
        assert!("10:8".parse::<BitLocation>().unwrap_err().is_out_of_range());
        assert!("zz".parse::<BitLocation>().unwrap_err().is_invalid_arg());
    }
}

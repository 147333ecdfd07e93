use hexdoc_common::SubscriptionId;

use crate::{BitLocation, BitRange, BitRangeUnion, RangeUnionChange};

/// Query-only view of a [`BitRangeUnion`] owned by someone else.
///
/// The view borrows the owner's union rather than copying its entries, and
/// subscriptions made through it are registered on the owner, so listeners keep
/// receiving the owner's changes after the view itself is gone.
#[derive(Debug, Clone, Copy)]
pub struct ReadOnlyBitRangeUnion<'a> {
    inner: &'a BitRangeUnion,
}

impl<'a> ReadOnlyBitRangeUnion<'a> {
    pub fn new(inner: &'a BitRangeUnion) -> ReadOnlyBitRangeUnion<'a> {
        ReadOnlyBitRangeUnion { inner }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<BitRange> {
        self.inner.get(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [BitRange] {
        self.inner.as_slice()
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'a, BitRange>> {
        self.inner.iter()
    }

    pub fn enclosing_range(&self) -> BitRange {
        self.inner.enclosing_range()
    }

    pub fn is_fragmented(&self) -> bool {
        self.inner.is_fragmented()
    }

    pub fn contains(&self, location: BitLocation) -> bool {
        self.inner.contains(location)
    }

    pub fn is_superset_of(&self, range: &BitRange) -> bool {
        self.inner.is_superset_of(range)
    }

    pub fn intersects_with(&self, range: &BitRange) -> bool {
        self.inner.intersects_with(range)
    }

    pub fn intersecting(&self, range: BitRange) -> impl Iterator<Item = BitRange> + 'a {
        self.inner.intersecting(range)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&RangeUnionChange) + 'static,
    {
        self.inner.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }
}

impl<'a> From<&'a BitRangeUnion> for ReadOnlyBitRangeUnion<'a> {
    fn from(inner: &'a BitRangeUnion) -> Self {
        ReadOnlyBitRangeUnion::new(inner)
    }
}

impl<'a> IntoIterator for ReadOnlyBitRangeUnion<'a> {
    type Item = BitRange;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, BitRange>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl PartialEq<BitRangeUnion> for ReadOnlyBitRangeUnion<'_> {
    fn eq(&self, other: &BitRangeUnion) -> bool {
        self.inner == other
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    fn bytes(start: u64, end: u64) -> BitRange {
        BitRange::from_bytes(start, end).unwrap()
    }

    #[test]
    fn test_forwards_queries() {
        let union: BitRangeUnion = [bytes(0, 4), bytes(8, 12)].into_iter().collect();
        let view = ReadOnlyBitRangeUnion::new(&union);
        assert_eq!(view.len(), 2);
        assert!(view.is_fragmented());
        assert_eq!(view.enclosing_range(), bytes(0, 12));
        assert!(view.contains(BitLocation::from_byte(9)));
        assert!(view.is_superset_of(&bytes(1, 3)));
        assert!(!view.intersects_with(&bytes(4, 8)));
        assert_eq!(view.get(1), Some(bytes(8, 12)));
        assert_eq!(view.iter().collect::<Vec<_>>(), union.as_slice());
        assert!(view == union);
    }

    #[test]
    fn test_subscription_outlives_view() {
        let mut union = BitRangeUnion::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = {
            let view = ReadOnlyBitRangeUnion::from(&union);
            view.subscribe(move |change| sink.borrow_mut().push(*change))
        };

        union.add(bytes(0, 3));
        assert_eq!(
            *seen.borrow(),
            vec![RangeUnionChange::Added {
                index: 0,
                range: bytes(0, 3)
            }]
        );

        assert!(ReadOnlyBitRangeUnion::new(&union).unsubscribe(id));
        union.add(bytes(10, 11));
        assert_eq!(seen.borrow().len(), 1);
    }
}

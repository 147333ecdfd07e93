//! Normalized set of disjoint bit ranges.
//!
//! [`BitRangeUnion`] stores its entries sorted ascending by start. No two
//! entries overlap or touch: a range added next to an existing entry is merged
//! into it. Every query therefore reduces to a binary search for the first
//! entry that can interact with the argument, followed by a local test against
//! that single entry.

use hexdoc_common::{EventSource, SubscriptionId};

use crate::{BitLocation, BitRange};

/// A single step of a [`BitRangeUnion`] mutation.
///
/// Applying the changes emitted for one operation, in order, to a copy of the
/// entries taken before the operation reproduces the entries after it (see
/// [`RangeUnionChange::apply_to`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeUnionChange {
    /// `range` was inserted at `index`.
    Added { index: usize, range: BitRange },
    /// The entry at `index` was removed.
    Removed { index: usize, range: BitRange },
    /// The entry at `index` changed from `old` to `new`.
    Replaced {
        index: usize,
        old: BitRange,
        new: BitRange,
    },
    /// All entries were removed.
    Reset,
}

impl RangeUnionChange {
    /// Replays this change on a mirrored entry list.
    pub fn apply_to(&self, entries: &mut Vec<BitRange>) {
        match *self {
            RangeUnionChange::Added { index, range } => entries.insert(index, range),
            RangeUnionChange::Removed { index, .. } => {
                entries.remove(index);
            }
            RangeUnionChange::Replaced { index, new, .. } => entries[index] = new,
            RangeUnionChange::Reset => entries.clear(),
        }
    }
}

/// Mutable, always-normalized set of pairwise disjoint, non-adjacent ranges.
#[derive(Debug, Default)]
pub struct BitRangeUnion {
    ranges: Vec<BitRange>,
    changed: EventSource<RangeUnionChange>,
}

impl BitRangeUnion {
    pub fn new() -> BitRangeUnion {
        BitRangeUnion::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<BitRange> {
        self.ranges.get(index).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[BitRange] {
        &self.ranges
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, BitRange>> {
        self.ranges.iter().copied()
    }

    /// `[first.start, last.end)`, or [`BitRange::EMPTY`] for an empty union.
    pub fn enclosing_range(&self) -> BitRange {
        match (self.ranges.first(), self.ranges.last()) {
            (Some(first), Some(last)) => BitRange::new_unchecked(first.start(), last.end()),
            _ => BitRange::EMPTY,
        }
    }

    /// Returns `true` if the union consists of more than one entry.
    #[inline]
    pub fn is_fragmented(&self) -> bool {
        self.ranges.len() > 1
    }

    /// Adds `range` to the union, merging it with every entry it overlaps or
    /// touches.
    pub fn add(&mut self, range: BitRange) {
        if range.is_empty() {
            return;
        }

        // An entry interacts with `range` when its end, extended by one bit,
        // reaches `range.start`, i.e. when it touches or overlaps it.
        let first = self.ranges.partition_point(|e| e.end() < range.start());
        let last = self.ranges.partition_point(|e| e.start() <= range.end());

        let mut changes = Vec::new();
        if first == last {
            self.ranges.insert(first, range);
            changes.push(RangeUnionChange::Added {
                index: first,
                range,
            });
        } else {
            let old = self.ranges[first];
            let merged = BitRange::new_unchecked(
                range.start().min(old.start()),
                range.end().max(self.ranges[last - 1].end()),
            );
            if merged != old {
                self.ranges[first] = merged;
                changes.push(RangeUnionChange::Replaced {
                    index: first,
                    old,
                    new: merged,
                });
            }
            changes.extend(
                self.ranges
                    .drain(first + 1..last)
                    .map(|range| RangeUnionChange::Removed {
                        index: first + 1,
                        range,
                    }),
            );
        }
        self.notify(changes);
    }

    /// Removes every location covered by `range` from the union.
    ///
    /// Entries that lie entirely inside `range` are dropped, entries that
    /// straddle one of its boundaries are truncated, and an entry that
    /// strictly encloses `range` is split in two.
    pub fn remove(&mut self, range: BitRange) {
        if range.is_empty() {
            return;
        }

        let mut changes = Vec::new();
        let mut index = self.ranges.partition_point(|e| e.end() <= range.start());
        while index < self.ranges.len() {
            let entry = self.ranges[index];
            if entry.start() >= range.end() {
                break;
            }

            let keeps_head = entry.start() < range.start();
            let keeps_tail = entry.end() > range.end();
            match (keeps_head, keeps_tail) {
                (true, true) => {
                    let head = BitRange::new_unchecked(entry.start(), range.start());
                    let tail = BitRange::new_unchecked(range.end(), entry.end());
                    self.ranges[index] = head;
                    self.ranges.insert(index + 1, tail);
                    changes.push(RangeUnionChange::Replaced {
                        index,
                        old: entry,
                        new: head,
                    });
                    changes.push(RangeUnionChange::Added {
                        index: index + 1,
                        range: tail,
                    });
                    break;
                }
                (false, false) => {
                    self.ranges.remove(index);
                    changes.push(RangeUnionChange::Removed {
                        index,
                        range: entry,
                    });
                }
                (false, true) => {
                    let tail = BitRange::new_unchecked(range.end(), entry.end());
                    self.ranges[index] = tail;
                    changes.push(RangeUnionChange::Replaced {
                        index,
                        old: entry,
                        new: tail,
                    });
                    break;
                }
                (true, false) => {
                    let head = BitRange::new_unchecked(entry.start(), range.start());
                    self.ranges[index] = head;
                    changes.push(RangeUnionChange::Replaced {
                        index,
                        old: entry,
                        new: head,
                    });
                    index += 1;
                }
            }
        }
        self.notify(changes);
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        if self.ranges.is_empty() {
            return;
        }
        self.ranges.clear();
        self.notify(vec![RangeUnionChange::Reset]);
    }

    pub fn contains(&self, location: BitLocation) -> bool {
        let index = self.first_overlapping(location);
        self.ranges
            .get(index)
            .is_some_and(|entry| entry.contains(location))
    }

    /// Returns `true` if a single entry covers all of `range`.
    pub fn is_superset_of(&self, range: &BitRange) -> bool {
        let index = self.first_overlapping(range.start());
        self.ranges
            .get(index)
            .is_some_and(|entry| entry.contains_range(range))
    }

    /// Returns `true` if any entry shares a location with `range`.
    pub fn intersects_with(&self, range: &BitRange) -> bool {
        let index = self.first_overlapping(range.start());
        self.ranges
            .get(index)
            .is_some_and(|entry| entry.overlaps_with(range))
    }

    /// Iterates the parts of the entries that fall inside `range`, each
    /// clamped to it.
    pub fn intersecting(&self, range: BitRange) -> impl Iterator<Item = BitRange> + '_ {
        let index = self.first_overlapping(range.start());
        self.ranges[index..]
            .iter()
            .take_while(move |entry| entry.start() < range.end())
            .map(move |entry| entry.clamp(&range))
            .filter(|clamped| !clamped.is_empty())
    }

    /// Registers a listener for entry changes.
    ///
    /// The changes of one operation are delivered after the operation has
    /// finished updating the entries.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&RangeUnionChange) + 'static,
    {
        self.changed.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }

    /// Index of the first entry ending after `location`.
    #[inline]
    fn first_overlapping(&self, location: BitLocation) -> usize {
        self.ranges.partition_point(|e| e.end() <= location)
    }

    fn notify(&self, changes: Vec<RangeUnionChange>) {
        if changes.is_empty() {
            return;
        }
        log::trace!("range union changed: {changes:?}");
        for change in &changes {
            self.changed.emit(change);
        }
    }
}

impl PartialEq for BitRangeUnion {
    fn eq(&self, other: &Self) -> bool {
        self.ranges == other.ranges
    }
}

impl Eq for BitRangeUnion {}

impl Extend<BitRange> for BitRangeUnion {
    fn extend<I: IntoIterator<Item = BitRange>>(&mut self, iter: I) {
        for range in iter {
            self.add(range);
        }
    }
}

impl FromIterator<BitRange> for BitRangeUnion {
    fn from_iter<I: IntoIterator<Item = BitRange>>(iter: I) -> Self {
        let mut union = BitRangeUnion::new();
        union.extend(iter);
        union
    }
}

impl<'a> IntoIterator for &'a BitRangeUnion {
    type Item = BitRange;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, BitRange>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

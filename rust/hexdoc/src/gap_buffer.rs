//! Growable byte storage with a movable gap.
//!
//! [`GapBuffer`] keeps its contents in one contiguous allocation split by a gap
//! of unused bytes. Inserts and removals happen at the gap: the gap is first
//! moved to the edit position (copying only the bytes between the old and the
//! new position) and then shrunk or widened. Repeated edits near the same
//! position therefore cost O(edit size), while a jump to a distant position
//! costs O(distance) once. When the gap is exhausted it is regrown to at least
//! the current content length, so growth is amortized O(1) per inserted byte.
//!
//! ```text
//!   buf: [ head ........ | gap .......... | tail ........ ]
//!        0           gap_start         gap_end       buf.len()
//! ```

use std::ops::Range;

/// Smallest gap allocated when the buffer has to grow.
const MIN_GAP: usize = 64;

#[derive(Clone, Default)]
pub struct GapBuffer {
    buf: Vec<u8>,
    gap_start: usize,
    gap_end: usize,
}

impl GapBuffer {
    pub fn new() -> GapBuffer {
        GapBuffer::default()
    }

    /// Creates an empty buffer whose gap can take `capacity` bytes before the
    /// first reallocation.
    pub fn with_capacity(capacity: usize) -> GapBuffer {
        GapBuffer {
            buf: vec![0; capacity],
            gap_start: 0,
            gap_end: capacity,
        }
    }

    /// Takes ownership of `bytes` as the initial content, with the gap at the
    /// end.
    pub fn from_vec(bytes: Vec<u8>) -> GapBuffer {
        let len = bytes.len();
        GapBuffer {
            buf: bytes,
            gap_start: len,
            gap_end: len,
        }
    }

    /// Number of content bytes (the gap excluded).
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len() - self.gap_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn gap_len(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// Content position of the gap.
    #[inline]
    pub fn gap_position(&self) -> usize {
        self.gap_start
    }

    /// The content before and after the gap.
    #[inline]
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        (&self.buf[..self.gap_start], &self.buf[self.gap_end..])
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        if index < self.gap_start {
            Some(self.buf[index])
        } else {
            self.buf.get(index + self.gap_len()).copied()
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let (head, tail) = self.as_slices();
        let mut bytes = Vec::with_capacity(head.len() + tail.len());
        bytes.extend_from_slice(head);
        bytes.extend_from_slice(tail);
        bytes
    }

    /// Inserts `bytes` at content position `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at > self.len()`.
    pub fn insert(&mut self, at: usize, bytes: &[u8]) {
        assert!(at <= self.len(), "insert position {at} out of bounds");
        self.move_gap(at);
        self.reserve_gap(bytes.len());
        self.buf[self.gap_start..self.gap_start + bytes.len()].copy_from_slice(bytes);
        self.gap_start += bytes.len();
    }

    /// Removes the content bytes in `range`.
    ///
    /// # Panics
    ///
    /// Panics if the range is reversed or extends past `self.len()`.
    pub fn remove(&mut self, range: Range<usize>) {
        assert!(
            range.start <= range.end && range.end <= self.len(),
            "remove range {range:?} out of bounds"
        );
        self.move_gap(range.start);
        self.gap_end += range.len();
    }

    /// Copies content bytes starting at `at` into `out`.
    ///
    /// # Panics
    ///
    /// Panics if the span extends past `self.len()`.
    pub fn read(&self, at: usize, out: &mut [u8]) {
        assert!(
            at <= self.len() && out.len() <= self.len() - at,
            "read span out of bounds"
        );
        let (head, tail) = self.as_slices();
        let from_head = head.len().saturating_sub(at).min(out.len());
        if from_head > 0 {
            out[..from_head].copy_from_slice(&head[at..at + from_head]);
        }
        let rest = out.len() - from_head;
        if rest > 0 {
            let tail_at = at + from_head - head.len();
            out[from_head..].copy_from_slice(&tail[tail_at..tail_at + rest]);
        }
    }

    /// Overwrites content bytes starting at `at` with `bytes`.
    ///
    /// The gap does not move.
    ///
    /// # Panics
    ///
    /// Panics if the span extends past `self.len()`.
    pub fn write(&mut self, at: usize, bytes: &[u8]) {
        assert!(
            at <= self.len() && bytes.len() <= self.len() - at,
            "write span out of bounds"
        );
        let to_head = self.gap_start.saturating_sub(at).min(bytes.len());
        if to_head > 0 {
            self.buf[at..at + to_head].copy_from_slice(&bytes[..to_head]);
        }
        let rest = bytes.len() - to_head;
        if rest > 0 {
            let buf_at = at + to_head + self.gap_len();
            self.buf[buf_at..buf_at + rest].copy_from_slice(&bytes[to_head..]);
        }
    }

    /// Moves the gap so that it starts at content position `at`.
    fn move_gap(&mut self, at: usize) {
        if at < self.gap_start {
            let count = self.gap_start - at;
            self.buf.copy_within(at..self.gap_start, self.gap_end - count);
            self.gap_start = at;
            self.gap_end -= count;
        } else if at > self.gap_start {
            let count = at - self.gap_start;
            self.buf.copy_within(self.gap_end..self.gap_end + count, self.gap_start);
            self.gap_start += count;
            self.gap_end += count;
        }
    }

    /// Widens the gap to hold at least `additional` bytes.
    fn reserve_gap(&mut self, additional: usize) {
        if self.gap_len() >= additional {
            return;
        }
        let target = additional.max(self.len()).max(MIN_GAP);
        let grow = target - self.gap_len();
        let old_len = self.buf.len();
        self.buf.resize(old_len + grow, 0);
        self.buf.copy_within(self.gap_end..old_len, self.gap_end + grow);
        self.gap_end += grow;
    }
}

impl From<Vec<u8>> for GapBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        GapBuffer::from_vec(bytes)
    }
}

impl std::fmt::Debug for GapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GapBuffer")
            .field("len", &self.len())
            .field("gap_start", &self.gap_start)
            .field("gap_len", &self.gap_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::GapBuffer;

    #[test]
    fn test_from_vec() {
        let buffer = GapBuffer::from_vec(b"abcdef".to_vec());
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.gap_len(), 0);
        assert_eq!(buffer.to_vec(), b"abcdef");
        assert_eq!(buffer.get(5), Some(b'f'));
        assert_eq!(buffer.get(6), None);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut buffer = GapBuffer::from_vec(b"hello world".to_vec());
        buffer.insert(5, b",");
        assert_eq!(buffer.to_vec(), b"hello, world");
        assert_eq!(buffer.gap_position(), 6);

        buffer.insert(0, b">> ");
        assert_eq!(buffer.to_vec(), b">> hello, world");

        buffer.remove(0..3);
        assert_eq!(buffer.to_vec(), b"hello, world");

        buffer.remove(5..12);
        assert_eq!(buffer.to_vec(), b"hello");
        buffer.insert(5, b"!");
        assert_eq!(buffer.to_vec(), b"hello!");
    }

    #[test]
    fn test_read_and_write_across_gap() {
        let mut buffer = GapBuffer::with_capacity(4);
        buffer.insert(0, b"0123456789");
        buffer.insert(5, b"xx");
        buffer.remove(5..7);
        assert!(buffer.gap_len() > 0);
        assert_eq!(buffer.gap_position(), 5);

        let mut out = [0u8; 6];
        buffer.read(2, &mut out);
        assert_eq!(&out, b"234567");

        buffer.write(3, b"ABCD");
        assert_eq!(buffer.to_vec(), b"012ABCD789");
        assert_eq!(buffer.gap_position(), 5);

        let mut out = [0u8; 3];
        buffer.read(7, &mut out);
        assert_eq!(&out, b"789");
    }

    #[test]
    fn test_empty_spans() {
        let mut buffer = GapBuffer::new();
        buffer.insert(0, b"");
        buffer.remove(0..0);
        buffer.read(0, &mut []);
        buffer.write(0, b"");
        assert!(buffer.is_empty());
    }

    #[test]
    #[should_panic]
    fn test_insert_out_of_bounds() {
        let mut buffer = GapBuffer::from_vec(vec![1, 2, 3]);
        buffer.insert(4, b"x");
    }

    #[test]
    fn test_randomized_against_vec() {
        let mut rng = fastrand::Rng::with_seed(0x6a9);
        let mut buffer = GapBuffer::new();
        let mut model: Vec<u8> = Vec::new();

        for step in 0..2000 {
            match rng.u8(0..4) {
                0 | 1 => {
                    let at = rng.usize(0..=model.len());
                    let bytes: Vec<u8> = (0..rng.usize(0..40)).map(|_| rng.u8(..)).collect();
                    buffer.insert(at, &bytes);
                    model.splice(at..at, bytes);
                }
                2 => {
                    let start = rng.usize(0..=model.len());
                    let end = rng.usize(start..=model.len().min(start + 30));
                    buffer.remove(start..end);
                    model.drain(start..end);
                }
                _ => {
                    let at = rng.usize(0..=model.len());
                    let len = rng.usize(0..=model.len() - at);
                    let bytes: Vec<u8> = (0..len).map(|_| rng.u8(..)).collect();
                    buffer.write(at, &bytes);
                    model[at..at + len].copy_from_slice(&bytes);
                }
            }

            assert_eq!(buffer.len(), model.len(), "step {step}");
            let at = rng.usize(0..=model.len());
            let mut out = vec![0u8; rng.usize(0..=model.len() - at)];
            buffer.read(at, &mut out);
            assert_eq!(out.as_slice(), &model[at..at + out.len()], "step {step}");
        }
        assert_eq!(buffer.to_vec(), model);
    }
}

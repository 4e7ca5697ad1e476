//! Bounded ordered storage for block keys, values and children.

use std::ops::{Index, IndexMut};

use crate::common::{Error, Result};
use crate::storage::codec::{ByteReader, ByteWriter, FixedCodec};

/// A vector with a fixed capacity chosen at construction.
///
/// Blocks keep their keys, values and child handles in these. Every
/// operation checks its preconditions with `assert!`: exceeding the
/// capacity or indexing out of range is a bug in the caller, never a
/// runtime condition.
///
/// The searching helpers ([`lower_bound`](Self::lower_bound),
/// [`upper_bound`](Self::upper_bound), [`insert_sorted`](Self::insert_sorted))
/// assume the contents are sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedSequence<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> OrderedSequence<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Append at the end.
    pub fn push(&mut self, value: T) {
        self.insert_at(self.items.len(), value);
    }

    pub fn insert_at(&mut self, pos: usize, value: T) {
        assert!(
            self.items.len() < self.capacity,
            "sequence full ({} of {})",
            self.items.len(),
            self.capacity
        );
        assert!(
            pos <= self.items.len(),
            "insert position {} past length {}",
            pos,
            self.items.len()
        );
        self.items.insert(pos, value);
    }

    pub fn remove_at(&mut self, pos: usize) -> T {
        assert!(
            pos < self.items.len(),
            "remove position {} past length {}",
            pos,
            self.items.len()
        );
        self.items.remove(pos)
    }

    /// Remove `count` elements starting at `pos`.
    pub fn remove_range(&mut self, pos: usize, count: usize) {
        assert!(
            pos + count <= self.items.len(),
            "range {}..{} past length {}",
            pos,
            pos + count,
            self.items.len()
        );
        self.items.drain(pos..pos + count);
    }

    pub fn pop_last(&mut self) -> T {
        match self.items.pop() {
            Some(value) => value,
            None => panic!("pop from an empty sequence"),
        }
    }

    /// Move `count` elements of `src` starting at `src_offset` into `self`
    /// at `dst_offset`, removing them from `src`.
    pub fn splice(&mut self, src: &mut Self, src_offset: usize, count: usize, dst_offset: usize) {
        assert!(
            src_offset + count <= src.items.len(),
            "source range {}..{} past length {}",
            src_offset,
            src_offset + count,
            src.items.len()
        );
        assert!(
            dst_offset <= self.items.len(),
            "destination {} past length {}",
            dst_offset,
            self.items.len()
        );
        assert!(
            self.items.len() + count <= self.capacity,
            "splice of {} overflows {} of {}",
            count,
            self.items.len(),
            self.capacity
        );
        let moved: Vec<T> = src.items.drain(src_offset..src_offset + count).collect();
        self.items.splice(dst_offset..dst_offset, moved);
    }

    /// Move everything from `at` onwards into a new sequence of the same
    /// capacity.
    pub fn split_off(&mut self, at: usize) -> Self {
        assert!(
            at <= self.items.len(),
            "split point {} past length {}",
            at,
            self.items.len()
        );
        let mut tail = Self::new(self.capacity);
        tail.items = self.items.split_off(at);
        tail
    }

    /// Move everything from `src` to the end of `self`.
    pub fn append(&mut self, src: &mut Self) {
        let count = src.len();
        self.splice(src, 0, count, self.items.len());
    }

    /// Move everything from `src` to the front of `self`.
    pub fn prepend(&mut self, src: &mut Self) {
        let count = src.len();
        self.splice(src, 0, count, 0);
    }
}

impl<T: Ord> OrderedSequence<T> {
    /// First position whose element is not less than `value`.
    #[inline]
    pub fn lower_bound(&self, value: &T) -> usize {
        self.items.partition_point(|item| item < value)
    }

    /// First position whose element is greater than `value`.
    #[inline]
    pub fn upper_bound(&self, value: &T) -> usize {
        self.items.partition_point(|item| item <= value)
    }

    /// Position of an element equal to `value`.
    pub fn position(&self, value: &T) -> Option<usize> {
        self.items.binary_search(value).ok()
    }

    /// Insert after any equal elements and return the position used.
    pub fn insert_sorted(&mut self, value: T) -> usize {
        let pos = self.upper_bound(&value);
        self.insert_at(pos, value);
        pos
    }
}

impl<T: FixedCodec> OrderedSequence<T> {
    /// Bytes taken by a sequence of `capacity` slots: a u32 count and the
    /// full slot array, unused slots zero-filled.
    pub fn encoded_len(capacity: usize) -> usize {
        4 + capacity * T::ENCODED_LEN
    }

    pub(crate) fn encode_into(&self, writer: &mut ByteWriter<'_>) {
        writer.put(&(self.items.len() as u32));
        for item in &self.items {
            writer.put(item);
        }
        writer.skip((self.capacity - self.items.len()) * T::ENCODED_LEN);
    }

    pub(crate) fn decode_from(reader: &mut ByteReader<'_>, capacity: usize) -> Result<Self> {
        let count = reader.get::<u32>() as usize;
        if count > capacity {
            return Err(Error::Corrupted(format!(
                "sequence count {} exceeds capacity {}",
                count, capacity
            )));
        }
        let mut sequence = Self::new(capacity);
        for _ in 0..count {
            sequence.items.push(reader.get());
        }
        reader.skip((capacity - count) * T::ENCODED_LEN);
        Ok(sequence)
    }
}

impl<T> Index<usize> for OrderedSequence<T> {
    type Output = T;

    fn index(&self, pos: usize) -> &T {
        &self.items[pos]
    }
}

impl<T> IndexMut<usize> for OrderedSequence<T> {
    fn index_mut(&mut self, pos: usize) -> &mut T {
        &mut self.items[pos]
    }
}

impl<'a, T> IntoIterator for &'a OrderedSequence<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(values: &[u32], capacity: usize) -> OrderedSequence<u32> {
        let mut s = OrderedSequence::new(capacity);
        for &v in values {
            s.push(v);
        }
        s
    }

    #[test]
    fn test_insert_sorted() {
        let mut s = OrderedSequence::new(4);
        assert_eq!(s.insert_sorted(5u32), 0);
        assert_eq!(s.insert_sorted(1), 0);
        assert_eq!(s.insert_sorted(3), 1);
        assert_eq!(s.insert_sorted(9), 3);
        assert_eq!(s.as_slice(), &[1, 3, 5, 9]);
        assert!(s.is_full());
    }

    #[test]
    fn test_bounds() {
        let s = seq(&[1, 3, 3, 7], 8);
        assert_eq!(s.lower_bound(&3), 1);
        assert_eq!(s.upper_bound(&3), 3);
        assert_eq!(s.lower_bound(&0), 0);
        assert_eq!(s.upper_bound(&7), 4);
        assert_eq!(s.position(&7), Some(3));
        assert_eq!(s.position(&4), None);
    }

    #[test]
    fn test_remove_operations() {
        let mut s = seq(&[1, 2, 3, 4, 5], 8);
        assert_eq!(s.remove_at(1), 2);
        s.remove_range(1, 2);
        assert_eq!(s.as_slice(), &[1, 5]);
        assert_eq!(s.pop_last(), 5);
        assert_eq!(s.as_slice(), &[1]);
    }

    #[test]
    fn test_splice_moves_elements() {
        let mut dst = seq(&[1, 9], 6);
        let mut src = seq(&[4, 5, 6, 7], 6);

        dst.splice(&mut src, 1, 2, 1);
        assert_eq!(dst.as_slice(), &[1, 5, 6, 9]);
        assert_eq!(src.as_slice(), &[4, 7]);

        dst.prepend(&mut src);
        assert_eq!(dst.as_slice(), &[4, 7, 1, 5, 6, 9]);
        assert!(src.is_empty());
    }

    #[test]
    fn test_split_off_keeps_capacity() {
        let mut s = seq(&[1, 2, 3, 4], 4);
        let mut tail = s.split_off(2);
        assert_eq!(s.as_slice(), &[1, 2]);
        assert_eq!(tail.as_slice(), &[3, 4]);
        assert_eq!(tail.capacity(), 4);

        s.append(&mut tail);
        assert_eq!(s.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "sequence full")]
    fn test_insert_past_capacity_panics() {
        let mut s = seq(&[1, 2], 2);
        s.insert_at(0, 0);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_splice_past_capacity_panics() {
        let mut dst = seq(&[1, 2], 3);
        let mut src = seq(&[3, 4], 3);
        dst.append(&mut src);
    }

    #[test]
    #[should_panic(expected = "past length")]
    fn test_remove_out_of_range_panics() {
        let mut s = seq(&[1], 2);
        s.remove_at(1);
    }

    #[test]
    #[should_panic(expected = "empty sequence")]
    fn test_pop_empty_panics() {
        let mut s: OrderedSequence<u32> = OrderedSequence::new(2);
        s.pop_last();
    }

    #[test]
    fn test_encoding_zero_fills_unused_slots() {
        let s = seq(&[7, 8], 4);
        let mut buf = vec![0u8; OrderedSequence::<u32>::encoded_len(4)];
        s.encode_into(&mut ByteWriter::new(&mut buf));

        assert_eq!(&buf[..4], &2u32.to_le_bytes());
        assert_eq!(&buf[4..8], &7u32.to_le_bytes());
        assert!(buf[12..].iter().all(|&b| b == 0));

        let mut reader = ByteReader::new(&buf);
        let decoded = OrderedSequence::<u32>::decode_from(&mut reader, 4).unwrap();
        assert_eq!(decoded, s);
        assert_eq!(reader.position(), buf.len());
    }

    #[test]
    fn test_decode_rejects_oversized_count() {
        let mut buf = vec![0u8; OrderedSequence::<u32>::encoded_len(2)];
        buf[..4].copy_from_slice(&3u32.to_le_bytes());
        let result = OrderedSequence::<u32>::decode_from(&mut ByteReader::new(&buf), 2);
        assert!(matches!(result, Err(Error::Corrupted(_))));
    }
}

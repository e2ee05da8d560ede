//! Bit-packed 2D buffer for boolean masks.
//!
//! Each row starts on a fresh `u64` word so row-wise shifts and ORs can be
//! done a word at a time. Bits past `width` in the last word of a row are
//! always zero.

use std::ops::Index;

/// Number of bits per storage word.
const BITS_PER_WORD: usize = 64;

/// A 2D buffer storing boolean values packed as bits, one word-aligned row
/// after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBuffer2 {
    /// Packed bit storage, `words_per_row` words per row, LSB first.
    words: Vec<u64>,
    width: usize,
    height: usize,
    words_per_row: usize,
}

impl BitBuffer2 {
    /// Create a new bit buffer filled with the given value.
    pub fn new_filled(width: usize, height: usize, value: bool) -> Self {
        let words_per_row = width.div_ceil(BITS_PER_WORD);
        let fill = if value { !0u64 } else { 0u64 };
        let mut buffer = Self {
            words: vec![fill; words_per_row * height],
            width,
            height,
            words_per_row,
        };
        if value {
            buffer.clear_padding();
        }
        buffer
    }

    /// Create a new bit buffer with all bits set to false.
    #[inline]
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new_filled(width, height, false)
    }

    /// Create a bit buffer from row-major booleans.
    ///
    /// The slice length must equal `width * height`.
    pub fn from_slice(width: usize, height: usize, data: &[bool]) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "data length {} does not match dimensions {}x{}",
            data.len(),
            width,
            height
        );

        let mut buffer = Self::new_default(width, height);
        for (i, &value) in data.iter().enumerate() {
            if value {
                buffer.set(i, true);
            }
        }
        buffer
    }

    /// Create a bit buffer from a per-pixel predicate over row-major values.
    pub fn from_predicate<T>(
        width: usize,
        height: usize,
        values: &[T],
        predicate: impl Fn(&T) -> bool,
    ) -> Self {
        assert_eq!(values.len(), width * height, "values length mismatch");

        let mut buffer = Self::new_default(width, height);
        for y in 0..height {
            let row = &values[y * width..(y + 1) * width];
            let words = buffer.row_words_mut(y);
            for (x, value) in row.iter().enumerate() {
                if predicate(value) {
                    words[x / BITS_PER_WORD] |= 1u64 << (x % BITS_PER_WORD);
                }
            }
        }
        buffer
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of pixels (width * height).
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn words_per_row(&self) -> usize {
        self.words_per_row
    }

    /// Get a bit value at the given row-major pixel index.
    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len());
        self.get_xy(idx % self.width, idx / self.width)
    }

    /// Set a bit value at the given row-major pixel index.
    #[inline]
    pub fn set(&mut self, idx: usize, value: bool) {
        debug_assert!(idx < self.len());
        self.set_xy(idx % self.width, idx / self.width, value);
    }

    #[inline]
    pub fn get_xy(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < self.width && y < self.height);
        let word = self.words[y * self.words_per_row + x / BITS_PER_WORD];
        (word >> (x % BITS_PER_WORD)) & 1 != 0
    }

    #[inline]
    pub fn set_xy(&mut self, x: usize, y: usize, value: bool) {
        debug_assert!(x < self.width && y < self.height);
        let word = &mut self.words[y * self.words_per_row + x / BITS_PER_WORD];
        let bit = 1u64 << (x % BITS_PER_WORD);
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    /// All packed words, row after row.
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    #[inline]
    pub fn row_words(&self, y: usize) -> &[u64] {
        let start = y * self.words_per_row;
        &self.words[start..start + self.words_per_row]
    }

    /// Mutable words of row `y`. Callers must leave padding bits zero.
    #[inline]
    pub fn row_words_mut(&mut self, y: usize) -> &mut [u64] {
        let start = y * self.words_per_row;
        &mut self.words[start..start + self.words_per_row]
    }

    /// Mask of the valid bits in the last word of each row.
    #[inline]
    pub fn last_word_mask(&self) -> u64 {
        match self.width % BITS_PER_WORD {
            0 => !0u64,
            bits => (1u64 << bits) - 1,
        }
    }

    /// Intersect in place with another mask of the same dimensions.
    pub fn and_assign(&mut self, other: &Self) {
        assert_eq!(self.width, other.width, "width mismatch");
        assert_eq!(self.height, other.height, "height mismatch");
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= b;
        }
    }

    /// Union in place with another mask of the same dimensions.
    pub fn or_assign(&mut self, other: &Self) {
        assert_eq!(self.width, other.width, "width mismatch");
        assert_eq!(self.height, other.height, "height mismatch");
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    /// Count the number of set bits.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate over all bit values in row-major order.
    #[inline]
    pub fn iter(&self) -> BitIter<'_> {
        BitIter {
            buffer: self,
            idx: 0,
        }
    }

    fn clear_padding(&mut self) {
        if self.words_per_row == 0 {
            return;
        }
        let mask = self.last_word_mask();
        for y in 0..self.height {
            let last = (y + 1) * self.words_per_row - 1;
            self.words[last] &= mask;
        }
    }
}

impl Index<(usize, usize)> for BitBuffer2 {
    type Output = bool;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        if self.get_xy(x, y) {
            &true
        } else {
            &false
        }
    }
}

impl From<&BitBuffer2> for Vec<bool> {
    #[inline]
    fn from(buf: &BitBuffer2) -> Self {
        buf.iter().collect()
    }
}

/// Iterator over bit values in row-major order.
pub struct BitIter<'a> {
    buffer: &'a BitBuffer2,
    idx: usize,
}

impl Iterator for BitIter<'_> {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx < self.buffer.len() {
            let value = self.buffer.get(self.idx);
            self.idx += 1;
            Some(value)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len() - self.idx;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BitIter<'_> {}

//! Segment reorder buffer.
//!
//! Holds one segment (a starter plus its trailing combining marks) as an
//! owned fixed-capacity array, sorts marks into canonical order and, for
//! composing forms, performs greedy pairwise composition.

use crate::form::Form;
use crate::hangul;
use crate::properties::PropertyOracle;

/// Combining marks beyond this count start a new segment instead of being
/// reordered against the current one. The cutoff bounds worst-case memory
/// and latency; changing it would change normalized output for degenerate
/// inputs.
pub const MAX_COMBINING_CHARS: usize = 30;

/// Capacity of the reorder buffer in scalars: one starter, the combining
/// run, and headroom for a decomposition finishing the segment.
pub(crate) const MAX_BUFFERED_RUNES: usize = MAX_COMBINING_CHARS + 2;

/// Largest number of bytes a single flushed segment can occupy. A
/// destination buffer of at least this size is guaranteed to make progress.
pub const MAX_SEGMENT_SIZE: usize = MAX_BUFFERED_RUNES * 4;

#[derive(Clone, Copy, Debug)]
struct Entry {
    ch: char,
    ccc: u8,
}

const EMPTY_ENTRY: Entry = Entry { ch: '\0', ccc: 0 };

/// The buffer is full; the offending scalar starts a new segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Overflow;

/// One segment's worth of scalars plus their combining classes.
///
/// Created per transformer instance and reused across calls; it never
/// aliases source bytes.
pub struct ReorderBuffer {
    entries: [Entry; MAX_BUFFERED_RUNES],
    len: usize,
}

impl Default for ReorderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReorderBuffer {
    pub fn new() -> Self {
        ReorderBuffer {
            entries: [EMPTY_ENTRY; MAX_BUFFERED_RUNES],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of scalars currently buffered.
    pub fn rune_count(&self) -> usize {
        self.len
    }

    /// Inserts `ch`, expanding its decomposition for the active form.
    /// The insert is atomic: on overflow the buffer is left exactly as it
    /// was and the caller must flush and start a new segment.
    pub(crate) fn insert<O: PropertyOracle>(
        &mut self,
        ch: char,
        form: Form,
        oracle: &O,
    ) -> Result<(), Overflow> {
        let saved = self.len;
        self.insert_decomposed(ch, form, oracle).map_err(|e| {
            self.len = saved;
            e
        })
    }

    fn insert_decomposed<O: PropertyOracle>(
        &mut self,
        ch: char,
        form: Form,
        oracle: &O,
    ) -> Result<(), Overflow> {
        if let Some((l, v, t)) = hangul::decompose(ch) {
            self.push(l, 0)?;
            self.push(v, 0)?;
            if let Some(t) = t {
                self.push(t, 0)?;
            }
            return Ok(());
        }
        let props = oracle.properties(ch);
        if let Some(decomposition) = props.decomposition(form) {
            for part in decomposition.chars() {
                self.insert_decomposed(part, form, oracle)?;
            }
            return Ok(());
        }
        self.push(ch, props.ccc())
    }

    fn push(&mut self, ch: char, ccc: u8) -> Result<(), Overflow> {
        if self.len == MAX_BUFFERED_RUNES {
            return Err(Overflow);
        }
        self.entries[self.len] = Entry { ch, ccc };
        self.len += 1;
        Ok(())
    }

    /// Stable-sorts each run of combining marks by combining class.
    /// Starters (class 0) anchor the segment and never move.
    pub(crate) fn sort_marks(&mut self) {
        let mut i = 0;
        while i < self.len {
            if self.entries[i].ccc == 0 {
                i += 1;
                continue;
            }
            let start = i;
            while i < self.len && self.entries[i].ccc != 0 {
                i += 1;
            }
            self.entries[start..i].sort_by_key(|e| e.ccc);
        }
    }

    /// Greedy pairwise recomposition over the sorted buffer.
    ///
    /// Each candidate combines with the most recent starter unless a mark
    /// of equal or higher class sits between them. Hangul is tried first
    /// (algorithmic), then the oracle's pair table; composites the oracle
    /// flags as exclusions are left decomposed.
    pub(crate) fn compose<O: PropertyOracle>(&mut self, oracle: &O) {
        if self.len < 2 {
            return;
        }
        let mut starter = if self.entries[0].ccc == 0 { Some(0) } else { None };
        let mut last_ccc = self.entries[0].ccc;
        let mut i = 1;
        while i < self.len {
            let current = self.entries[i];
            if let Some(s) = starter {
                let reachable = i == s + 1 || (current.ccc != 0 && last_ccc < current.ccc);
                if reachable {
                    let composed = hangul::compose(self.entries[s].ch, current.ch).or_else(|| {
                        oracle
                            .compose_pair(self.entries[s].ch, current.ch)
                            .filter(|&p| !oracle.is_composition_exclusion(p))
                    });
                    if let Some(p) = composed {
                        self.entries[s].ch = p;
                        self.remove(i);
                        continue;
                    }
                }
            }
            if current.ccc == 0 {
                starter = Some(i);
            }
            last_ccc = current.ccc;
            i += 1;
        }
    }

    fn remove(&mut self, index: usize) {
        for j in index..self.len - 1 {
            self.entries[j] = self.entries[j + 1];
        }
        self.len -= 1;
    }

    /// Total UTF-8 length of the buffered scalars.
    pub(crate) fn byte_len(&self) -> usize {
        self.entries[..self.len]
            .iter()
            .map(|e| e.ch.len_utf8())
            .sum()
    }

    /// Writes the buffered scalars to `dst` and clears the buffer, or
    /// returns `None` without writing anything if they do not all fit.
    /// A segment is emitted whole or not at all.
    pub(crate) fn flush(&mut self, dst: &mut [u8]) -> Option<usize> {
        let needed = self.byte_len();
        if needed > dst.len() {
            return None;
        }
        let mut at = 0;
        for entry in &self.entries[..self.len] {
            at += entry.ch.encode_utf8(&mut dst[at..]).len();
        }
        self.len = 0;
        Some(at)
    }

    /// Appends the buffered scalars to `out` and clears the buffer.
    pub(crate) fn flush_vec(&mut self, out: &mut Vec<u8>) {
        let mut scratch = [0u8; 4];
        for entry in &self.entries[..self.len] {
            out.extend_from_slice(entry.ch.encode_utf8(&mut scratch).as_bytes());
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Form;
    use crate::tables::UnicodeTables;

    fn entries(rb: &ReorderBuffer) -> Vec<char> {
        rb.entries[..rb.len].iter().map(|e| e.ch).collect()
    }

    #[test]
    fn insert_expands_recursively() {
        let tables = UnicodeTables::get();
        let mut rb = ReorderBuffer::new();
        // U+1EA7 LATIN SMALL LETTER A WITH CIRCUMFLEX AND GRAVE.
        rb.insert('\u{1EA7}', Form::Nfd, tables).expect("fits");
        assert_eq!(entries(&rb), vec!['a', '\u{302}', '\u{300}']);
    }

    #[test]
    fn marks_sort_stably_within_runs() {
        let tables = UnicodeTables::get();
        let mut rb = ReorderBuffer::new();
        rb.insert('a', Form::Nfd, tables).expect("fits");
        rb.insert('\u{300}', Form::Nfd, tables).expect("fits"); // 230
        rb.insert('\u{323}', Form::Nfd, tables).expect("fits"); // 220
        rb.sort_marks();
        assert_eq!(entries(&rb), vec!['a', '\u{323}', '\u{300}']);
    }

    #[test]
    fn compose_rebuilds_multi_mark_letters() {
        let tables = UnicodeTables::get();
        let mut rb = ReorderBuffer::new();
        for ch in ['a', '\u{302}', '\u{300}'] {
            rb.insert(ch, Form::Nfc, tables).expect("fits");
        }
        rb.sort_marks();
        rb.compose(tables);
        assert_eq!(entries(&rb), vec!['\u{1EA7}']);
    }

    #[test]
    fn equal_class_marks_block_composition() {
        let tables = UnicodeTables::get();
        let mut rb = ReorderBuffer::new();
        // a + diaeresis + grave: both class 230, so the grave is blocked.
        for ch in ['a', '\u{308}', '\u{300}'] {
            rb.insert(ch, Form::Nfc, tables).expect("fits");
        }
        rb.sort_marks();
        rb.compose(tables);
        assert_eq!(entries(&rb), vec!['\u{E4}', '\u{300}']);
    }

    #[test]
    fn lower_class_mark_does_not_block() {
        let tables = UnicodeTables::get();
        let mut rb = ReorderBuffer::new();
        // a + dot-below (220) + grave (230): the dot below composes with
        // the adjacent starter, and the grave, unblocked because 220 is
        // lower than 230, is still offered to the new starter.
        for ch in ['a', '\u{323}', '\u{300}'] {
            rb.insert(ch, Form::Nfc, tables).expect("fits");
        }
        rb.sort_marks();
        rb.compose(tables);
        assert_eq!(entries(&rb), vec!['\u{1EA1}', '\u{300}']);
    }

    #[test]
    fn overflow_is_atomic() {
        let tables = UnicodeTables::get();
        let mut rb = ReorderBuffer::new();
        for _ in 0..MAX_BUFFERED_RUNES - 1 {
            rb.insert('\u{300}', Form::Nfd, tables).expect("fits");
        }
        let before = rb.rune_count();
        // One slot left; a two-scalar decomposition must not half-land.
        assert_eq!(rb.insert('\u{E0}', Form::Nfd, tables), Err(Overflow));
        assert_eq!(rb.rune_count(), before);
    }

    #[test]
    fn flush_is_all_or_nothing() {
        let tables = UnicodeTables::get();
        let mut rb = ReorderBuffer::new();
        rb.insert('\u{E0}', Form::Nfc, tables).expect("fits");
        let mut tiny = [0u8; 1];
        assert_eq!(rb.flush(&mut tiny), None);
        assert_eq!(rb.rune_count(), 1);
        let mut roomy = [0u8; 8];
        assert_eq!(rb.flush(&mut roomy), Some(2));
        assert_eq!(&roomy[..2], "\u{E0}".as_bytes());
        assert!(rb.is_empty());
    }
}

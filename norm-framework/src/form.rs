//! Normalization forms and the streaming driver.
//!
//! [`Form`] names the four canonical representations and carries the
//! one-shot conveniences; [`Normalizer`] is the streaming
//! [`Transformer`] implementation that drives the quick-span scanner and
//! the reorder buffer across repeated calls.

use std::borrow::Cow;

use tracing::trace;
use transform_core::{TransformError, TransformResult, Transformer};

use crate::properties::{Properties, PropertyOracle};
use crate::reorder::{ReorderBuffer, MAX_BUFFERED_RUNES, MAX_COMBINING_CHARS};
use crate::scan::quick_span;
use crate::tables::UnicodeTables;

/// Worst-case UTF-8 bytes per scalar, used for the conservative
/// room-before-flush check.
const UTF8_MAX: usize = 4;

/// A canonical representation of Unicode text.
///
/// The four values are process-wide constants; all per-stream state lives
/// in the [`Normalizer`] a form hands out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Form {
    /// Canonical composition.
    Nfc,
    /// Canonical decomposition.
    Nfd,
    /// Compatibility composition.
    Nfkc,
    /// Compatibility decomposition.
    Nfkd,
}

impl Form {
    pub(crate) fn index(self) -> usize {
        match self {
            Form::Nfc => 0,
            Form::Nfd => 1,
            Form::Nfkc => 2,
            Form::Nfkd => 3,
        }
    }

    /// Whether this form recomposes after decomposing.
    pub fn composing(self) -> bool {
        matches!(self, Form::Nfc | Form::Nfkc)
    }

    /// Whether this form applies compatibility mappings.
    pub fn compatibility(self) -> bool {
        matches!(self, Form::Nfkc | Form::Nfkd)
    }

    /// A streaming transformer for this form, bound to the built-in
    /// property tables. Each call creates an independent session.
    pub fn normalizer(self) -> Normalizer<&'static UnicodeTables> {
        Normalizer::new(self, UnicodeTables::get())
    }

    /// Appends the normalization of `src` to `out`.
    ///
    /// `out` must be empty or already in this form. If `src` extends an
    /// open segment at the end of `out` (for example a combining mark
    /// following a letter from the previous call), that tail is reprocessed
    /// so marks combine across the boundary.
    pub fn append(self, out: &mut Vec<u8>, src: &[u8]) {
        append_with(self, UnicodeTables::get(), out, src);
    }

    /// Returns `f(s)`, borrowing when the input is already normalized.
    pub fn normalize<'a>(self, s: &'a str) -> Cow<'a, str> {
        let oracle = UnicodeTables::get();
        let b = s.as_bytes();
        let span = quick_span(&oracle, self, b, 0, b.len(), true);
        if span.ok {
            return Cow::Borrowed(s);
        }
        let mut out = Vec::with_capacity(b.len());
        out.extend_from_slice(&b[..span.end]);
        let mut rb = ReorderBuffer::new();
        append_inner(self, oracle, &mut rb, &mut out, b, span.end);
        match String::from_utf8(out) {
            Ok(s) => Cow::Owned(s),
            // Unreachable for `&str` input; keep ill-formed bytes visible
            // rather than panicking if an oracle misbehaves.
            Err(e) => Cow::Owned(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }

    /// Whether `b` is already in this form.
    pub fn is_normal(self, b: &[u8]) -> bool {
        is_normal_with(self, UnicodeTables::get(), b)
    }

    /// Whether `s` is already in this form.
    pub fn is_normal_str(self, s: &str) -> bool {
        self.is_normal(s.as_bytes())
    }

    /// Returns a boundary `n` such that `b[..n]` is in this form. Not
    /// guaranteed to be the largest such `n`.
    pub fn quick_span(self, b: &[u8]) -> usize {
        quick_span(&UnicodeTables::get(), self, b, 0, b.len(), true).end
    }

    /// Position of the first segment boundary in `b`, or `None` if `b`
    /// contains none.
    pub fn first_boundary(self, b: &[u8]) -> Option<usize> {
        first_boundary_with(UnicodeTables::get(), b)
    }

    /// Position of the last segment boundary in `b`, or `None` if `b`
    /// contains none.
    pub fn last_boundary(self, b: &[u8]) -> Option<usize> {
        last_boundary_with(UnicodeTables::get(), b)
    }
}

/// Streaming normalizer: a [`Transformer`] producing `form`-normalized
/// output byte-identical to the one-shot computation regardless of how the
/// source and destination are chunked.
///
/// Not safe for concurrent use by multiple threads; distinct instances are
/// fully independent. The oracle is read-only and freely shared.
pub struct Normalizer<O: PropertyOracle> {
    form: Form,
    oracle: O,
    rb: ReorderBuffer,
}

impl<O: PropertyOracle> Normalizer<O> {
    /// Creates a session for `form` over `oracle`. Tests can inject a
    /// synthetic oracle; production code goes through
    /// [`Form::normalizer`].
    pub fn new(form: Form, oracle: O) -> Self {
        Normalizer {
            form,
            oracle,
            rb: ReorderBuffer::new(),
        }
    }

    /// The form this session normalizes to.
    pub fn form(&self) -> Form {
        self.form
    }

    /// The slow path: drive the reorder buffer segment by segment,
    /// interleaved with quick spans over the already-normalized runs.
    fn transform_slow(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult {
        let mut n_dst = 0;
        let mut n_src = 0;
        self.rb.clear();
        loop {
            match decompose_segment(&mut self.rb, &self.oracle, self.form, src, n_src, at_eof) {
                SegmentStatus::NeedInput => {
                    // No output side effects for this segment: the caller
                    // retries with more input and we recompute from n_src.
                    return Err(TransformError::short_src(n_dst, n_src));
                }
                SegmentStatus::Foreign { size } => {
                    let take = if size == 0 { src.len() - n_src } else { size };
                    if dst.len() - n_dst < take {
                        return Err(TransformError::short_dst(n_dst, n_src));
                    }
                    dst[n_dst..n_dst + take].copy_from_slice(&src[n_src..n_src + take]);
                    n_dst += take;
                    n_src += take;
                    if n_src == src.len() {
                        return Ok((n_dst, n_src));
                    }
                    continue;
                }
                SegmentStatus::Segment { end } if end == n_src && self.rb.is_empty() => {
                    // Degenerate oracle data (a decomposition larger than
                    // the buffer): pass the scalar through rather than
                    // loop without progress.
                    let props = self.oracle.lookup(&src[n_src..]);
                    let take = props.size().max(1);
                    if dst.len() - n_dst < take {
                        return Err(TransformError::short_dst(n_dst, n_src));
                    }
                    dst[n_dst..n_dst + take].copy_from_slice(&src[n_src..n_src + take]);
                    n_dst += take;
                    n_src += take;
                    if n_src == src.len() {
                        return Ok((n_dst, n_src));
                    }
                    continue;
                }
                SegmentStatus::Segment { end } => {
                    self.rb.sort_marks();
                    if self.form.composing() {
                        self.rb.compose(&self.oracle);
                    }
                    // Conservative room check: a flush is all or nothing.
                    if dst.len() - n_dst < self.rb.rune_count() * UTF8_MAX {
                        return Err(TransformError::short_dst(n_dst, n_src));
                    }
                    n_src = end;
                    match self.rb.flush(&mut dst[n_dst..]) {
                        Some(written) => n_dst += written,
                        None => return Err(TransformError::short_dst(n_dst, n_src)),
                    }
                }
            }

            // Copy the following already-normalized run, capping the scan
            // so it cannot produce more than dst can hold.
            let mut end = src.len();
            let mut eof = at_eof;
            let mut capped = false;
            let room = n_src + (dst.len() - n_dst);
            if room < end {
                end = room;
                eof = false;
                capped = true;
            }
            let span = quick_span(&self.oracle, self.form, src, n_src, end, eof);
            let copied = span.end - n_src;
            dst[n_dst..n_dst + copied].copy_from_slice(&src[n_src..span.end]);
            n_src += copied;
            n_dst += copied;
            if span.ok {
                if n_src == src.len() {
                    return Ok((n_dst, n_src));
                }
                if !at_eof {
                    return Err(TransformError::short_src(n_dst, n_src));
                }
                // Fully scanned but not fully copied: only the cap can
                // cause this.
                debug_assert!(capped);
                return Err(TransformError::short_dst(n_dst, n_src));
            }
            trace!(n_dst, n_src, "re-entering decomposition");
        }
    }
}

impl<O: PropertyOracle> Transformer for Normalizer<O> {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult {
        // Cap the scan by the destination size so the verbatim fast path
        // cannot overrun dst.
        let mut end = src.len();
        let mut eof = at_eof;
        let mut capped = false;
        if dst.len() < src.len() {
            end = dst.len();
            eof = false;
            capped = true;
        }
        let span = quick_span(&self.oracle, self.form, src, 0, end, eof);
        dst[..span.end].copy_from_slice(&src[..span.end]);
        if !span.ok {
            trace!(form = ?self.form, at = span.end, "quick span stopped; entering slow path");
            let res = self.transform_slow(&mut dst[span.end..], &src[span.end..], at_eof);
            return offset_progress(res, span.end, span.end);
        }
        if span.end == src.len() {
            return Ok((span.end, span.end));
        }
        if !at_eof {
            return Err(TransformError::short_src(span.end, span.end));
        }
        debug_assert!(capped);
        Err(TransformError::short_dst(span.end, span.end))
    }

    fn reset(&mut self) {
        self.rb.clear();
    }
}

/// Shifts the progress counters of `res` by an already-committed prefix.
fn offset_progress(res: TransformResult, dw: usize, dr: usize) -> TransformResult {
    match res {
        Ok((written, read)) => Ok((written + dw, read + dr)),
        Err(TransformError::ShortDst { written, read }) => Err(TransformError::ShortDst {
            written: written + dw,
            read: read + dr,
        }),
        Err(TransformError::ShortSrc { written, read }) => Err(TransformError::ShortSrc {
            written: written + dw,
            read: read + dr,
        }),
        Err(TransformError::Codec {
            written,
            read,
            source,
        }) => Err(TransformError::Codec {
            written: written + dw,
            read: read + dr,
            source,
        }),
        Err(e) => Err(e),
    }
}

/// How one segment-load attempt ended.
enum SegmentStatus {
    /// The segment spans `[start..end)` and sits in the reorder buffer.
    Segment { end: usize },
    /// The segment cannot be completed without more input.
    NeedInput,
    /// Ill-formed bytes (or, at EOF, a truncated tail) of the given size;
    /// `size == 0` means "the rest of the input". Copied through verbatim.
    Foreign { size: usize },
}

/// Scans one segment starting at `start` into `rb`, expanding
/// decompositions, stopping before the next boundary or at the buffer
/// cap. The buffer may be pre-seeded (append's tail merge); entries
/// already present anchor the incoming marks.
fn decompose_segment<O: PropertyOracle>(
    rb: &mut ReorderBuffer,
    oracle: &O,
    form: Form,
    src: &[u8],
    start: usize,
    at_eof: bool,
) -> SegmentStatus {
    let first = oracle.lookup(&src[start..]);
    if first.size() == 0 {
        return if at_eof {
            SegmentStatus::Foreign { size: 0 }
        } else {
            SegmentStatus::NeedInput
        };
    }
    if first.is_illegal() {
        return SegmentStatus::Foreign {
            size: first.size(),
        };
    }

    let mut sp = start;
    loop {
        let props = oracle.lookup(&src[sp..]);
        let ch = match decode_at(src, sp, props.size()) {
            Some(ch) => ch,
            None => break,
        };
        if rb.insert(ch, form, oracle).is_err() {
            // Buffer full: the scalar is not consumed and starts the next
            // segment.
            break;
        }
        sp += props.size();
        if sp >= src.len() {
            if !at_eof && !props.boundary_after() {
                return SegmentStatus::NeedInput;
            }
            break;
        }
        let next = oracle.lookup(&src[sp..]);
        if next.size() == 0 {
            if !at_eof {
                return SegmentStatus::NeedInput;
            }
            break;
        }
        if next.is_illegal() || next.boundary_before() {
            break;
        }
    }
    SegmentStatus::Segment { end: sp }
}

fn decode_at(src: &[u8], at: usize, size: usize) -> Option<char> {
    if size == 0 || at + size > src.len() {
        return None;
    }
    std::str::from_utf8(&src[at..at + size])
        .ok()
        .and_then(|s| s.chars().next())
}

pub(crate) fn append_with<O: PropertyOracle>(
    form: Form,
    oracle: O,
    out: &mut Vec<u8>,
    src: &[u8],
) {
    if src.is_empty() {
        return;
    }
    let mut rb = ReorderBuffer::new();
    let mut p = 0;
    if out.is_empty() {
        let span = quick_span(&oracle, form, src, 0, src.len(), true);
        out.extend_from_slice(&src[..span.end]);
        p = span.end;
        if p == src.len() {
            return;
        }
    } else {
        let first = oracle.lookup(src);
        if first.size() != 0 && !first.is_illegal() && !first.boundary_before() {
            // src extends the destination's trailing segment: pull that
            // open tail back into the buffer before processing src.
            decompose_to_last_boundary(&mut rb, &oracle, form, out);
        } else {
            let span = quick_span(&oracle, form, src, 0, src.len(), true);
            out.extend_from_slice(&src[..span.end]);
            p = span.end;
            if p == src.len() {
                return;
            }
        }
    }
    append_inner(form, oracle, &mut rb, out, src, p);
}

pub(crate) fn append_inner<O: PropertyOracle>(
    form: Form,
    oracle: O,
    rb: &mut ReorderBuffer,
    out: &mut Vec<u8>,
    src: &[u8],
    mut p: usize,
) {
    while p < src.len() {
        match decompose_segment(rb, &oracle, form, src, p, true) {
            SegmentStatus::Segment { end } if end == p && rb.is_empty() => {
                // Degenerate decomposition; pass the scalar through.
                let take = oracle.lookup(&src[p..]).size().max(1);
                out.extend_from_slice(&src[p..p + take]);
                p += take;
            }
            SegmentStatus::Segment { end } => {
                rb.sort_marks();
                if form.composing() {
                    rb.compose(&oracle);
                }
                rb.flush_vec(out);
                p = end;
            }
            SegmentStatus::Foreign { size } => {
                let take = if size == 0 { src.len() - p } else { size };
                out.extend_from_slice(&src[p..p + take]);
                p += take;
            }
            SegmentStatus::NeedInput => {
                // Unreachable with at_eof == true; bail out rather than
                // spin.
                debug_assert!(false, "NeedInput with at_eof");
                break;
            }
        }
        let span = quick_span(&oracle, form, src, p, src.len(), true);
        out.extend_from_slice(&src[p..span.end]);
        p = span.end;
    }
    if !rb.is_empty() {
        // Only reachable when a pre-seeded tail was never extended.
        rb.sort_marks();
        if form.composing() {
            rb.compose(&oracle);
        }
        rb.flush_vec(out);
    }
}

/// Finds the open segment at the end of `out`, removes it and re-inserts
/// its scalars into `rb` so following input can combine with it. An
/// ill-formed or truncated tail counts as a boundary and is left alone.
fn decompose_to_last_boundary<O: PropertyOracle>(
    rb: &mut ReorderBuffer,
    oracle: &O,
    form: Form,
    out: &mut Vec<u8>,
) {
    let (props, start) = match last_rune_start(oracle, out) {
        Some(found) => found,
        None => return,
    };
    if props.size() == 0 || props.is_illegal() || start + props.size() != out.len() {
        return;
    }
    if props.boundary_after() {
        return;
    }

    let mut tail_start = start;
    let mut info = props;
    let mut collected = 1;
    while !info.boundary_before() && tail_start > 0 && collected < MAX_BUFFERED_RUNES {
        let (prev, prev_start) = match last_rune_start(oracle, &out[..tail_start]) {
            Some(found) => found,
            None => break,
        };
        if prev.size() == 0
            || prev.is_illegal()
            || prev_start + prev.size() != tail_start
        {
            break;
        }
        info = prev;
        tail_start = prev_start;
        collected += 1;
    }

    let tail = out.split_off(tail_start);
    match std::str::from_utf8(&tail) {
        Ok(s) => {
            for ch in s.chars() {
                if rb.insert(ch, form, oracle).is_err() {
                    // Make room the way the driver does: commit what we
                    // have as its own segment.
                    rb.sort_marks();
                    if form.composing() {
                        rb.compose(oracle);
                    }
                    rb.flush_vec(out);
                    let _ = rb.insert(ch, form, oracle);
                }
            }
        }
        Err(_) => {
            // Every scalar was individually verified; restore on the
            // off chance of an inconsistent oracle.
            out.extend_from_slice(&tail);
        }
    }
}

/// Properties and position of the last scalar in `b`, or `None` if no
/// scalar start is found.
fn last_rune_start<O: PropertyOracle>(oracle: &O, b: &[u8]) -> Option<(Properties, usize)> {
    let mut p = b.len();
    while p > 0 {
        p -= 1;
        if b[p] & 0xC0 != 0x80 {
            return Some((oracle.lookup(&b[p..]), p));
        }
    }
    None
}

pub(crate) fn is_normal_with<O: PropertyOracle>(form: Form, oracle: O, b: &[u8]) -> bool {
    let span = quick_span(&oracle, form, b, 0, b.len(), true);
    if span.ok {
        return true;
    }
    let mut rb = ReorderBuffer::new();
    let mut scratch = [0u8; crate::reorder::MAX_SEGMENT_SIZE];
    let mut p = span.end;
    while p < b.len() {
        match decompose_segment(&mut rb, &oracle, form, b, p, true) {
            SegmentStatus::Segment { end } if end == p && rb.is_empty() => return false,
            SegmentStatus::Segment { end } => {
                rb.sort_marks();
                if form.composing() {
                    rb.compose(&oracle);
                }
                let written = match rb.flush(&mut scratch) {
                    Some(n) => n,
                    None => return false,
                };
                if end - p != written || b[p..end] != scratch[..written] {
                    return false;
                }
                p = end;
            }
            SegmentStatus::Foreign { size } => {
                p += if size == 0 { b.len() - p } else { size };
            }
            SegmentStatus::NeedInput => return false,
        }
        p = quick_span(&oracle, form, b, p, b.len(), true).end;
    }
    true
}

fn first_boundary_with<O: PropertyOracle>(oracle: O, b: &[u8]) -> Option<usize> {
    // Skip leading non-starters.
    let mut i = 0;
    loop {
        if i >= b.len() {
            return None;
        }
        let props = oracle.lookup(&b[i..]);
        if props.size() == 0 || props.ccc() == 0 {
            break;
        }
        i += props.size();
    }
    let mut props = oracle.lookup(&b[i..]);
    let mut n = 0;
    while props.size() != 0 && !props.boundary_before() {
        i += props.size();
        n += 1;
        if n >= MAX_COMBINING_CHARS {
            return Some(i);
        }
        if i >= b.len() {
            if !props.boundary_after() {
                return None;
            }
            return Some(b.len());
        }
        props = oracle.lookup(&b[i..]);
    }
    if props.size() == 0 {
        return None;
    }
    Some(i)
}

fn last_boundary_with<O: PropertyOracle>(oracle: O, b: &[u8]) -> Option<usize> {
    let (mut props, mut p) = last_rune_start(&oracle, b)?;
    let mut i = b.len();
    if props.size() == 0 {
        // Ends with a truncated sequence.
        if p == 0 {
            return None;
        }
        i = p;
        match last_rune_start(&oracle, &b[..i]) {
            None => return Some(i),
            Some((prev, prev_start)) => {
                props = prev;
                p = prev_start;
            }
        }
    }
    if p + props.size() != i {
        // Trailing bytes that decode to nothing: boundary after them.
        return Some(i);
    }
    if props.boundary_after() {
        return Some(i);
    }
    let mut info = props;
    let mut i = p;
    let mut n = 0;
    loop {
        if info.boundary_before() {
            return Some(i);
        }
        n += 1;
        if n >= MAX_COMBINING_CHARS {
            return Some(b.len());
        }
        match last_rune_start(&oracle, &b[..i]) {
            None => return None,
            Some((prev, prev_start)) => {
                if prev_start + prev.size() != i {
                    return Some(i);
                }
                info = prev;
                i = prev_start;
            }
        }
    }
}

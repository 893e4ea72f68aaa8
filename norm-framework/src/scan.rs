//! Quick-span scanning.
//!
//! Walks a byte window left to right and reports the longest prefix that is
//! verifiably already in the active form, without materializing a reorder
//! buffer. ASCII runs are skipped byte-wise, which is the dominant fast
//! path for typical text.

use crate::form::Form;
use crate::properties::{PropertyOracle, QuickCheck};
use crate::reorder::MAX_COMBINING_CHARS;

/// Result of a quick span: `end` is a safe boundary, `ok` is false when a
/// code point that needs the full engine was found at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub end: usize,
    pub ok: bool,
}

fn skip_ascii(src: &[u8], mut i: usize, end: usize) -> usize {
    while i < end && src[i] < 0x80 {
        i += 1;
    }
    i
}

/// Scans `src[from..to]` and returns a boundary `end` such that
/// `src[from..end]` is already normalized for `form`.
///
/// When `at_eof` is false the span never includes a trailing segment that
/// later input could still change, and never splits a scalar. When
/// `at_eof` is true an ill-formed tail is included verbatim. `ok == false`
/// means the scan stopped at input that is not (or may not be) already
/// normalized; the driver takes over from `end` with the reorder buffer.
pub(crate) fn quick_span<O: PropertyOracle>(
    oracle: &O,
    form: Form,
    src: &[u8],
    from: usize,
    to: usize,
    at_eof: bool,
) -> Span {
    let mut i = from;
    let mut last_seg_start = from;
    let mut last_cc: u8 = 0;
    let mut combining_count: usize = 0;
    let mut found_problem = false;

    while i < to {
        let j = skip_ascii(src, i, to);
        if j != i {
            i = j;
            last_seg_start = i - 1;
            last_cc = 0;
            combining_count = 0;
            continue;
        }
        let props = oracle.lookup(&src[i..to]);
        if props.size() == 0 {
            // The window ends mid-scalar.
            if at_eof {
                // Include the ill-formed tail as literal data.
                return Span { end: to, ok: true };
            }
            return Span {
                end: last_seg_start,
                ok: true,
            };
        }
        if props.quick_check(form) != QuickCheck::Yes {
            found_problem = true;
            break;
        }
        let cc = props.ccc();
        if cc == 0 {
            last_seg_start = i;
            combining_count = 0;
        } else if combining_count >= MAX_COMBINING_CHARS {
            // Forced segment break caps the reorder window.
            last_seg_start = i;
            combining_count = 1;
        } else {
            if last_cc > cc {
                // Out-of-order combining marks: not normalized.
                return Span {
                    end: last_seg_start,
                    ok: false,
                };
            }
            combining_count += 1;
        }
        last_cc = cc;
        i += props.size();
    }

    if !found_problem {
        let end = if at_eof { to } else { last_seg_start };
        return Span { end, ok: true };
    }
    if form.composing() {
        // A composition may reach back into the pending segment.
        Span {
            end: last_seg_start,
            ok: false,
        }
    } else {
        Span { end: i, ok: false }
    }
}

//! Drives the engine against a synthetic map-style oracle, the way the
//! original test suite substitutes a stand-in table.
//!
//! Repertoire (all outside the ASCII fast path): β (class 8) and δ
//! (class 9) are combining marks; α + β composes to γ; α + δ would
//! compose to ε but ε is a composition exclusion; ω canonically
//! decomposes to "αβ".

use norm_framework::{Form, Normalizer, Properties, PropertyOracle, QuickCheck};
use transform_core::Transformer;

const ALPHA: char = '\u{3B1}';
const BETA: char = '\u{3B2}';
const GAMMA: char = '\u{3B3}';
const DELTA: char = '\u{3B4}';
const EPSILON: char = '\u{3B5}';
const OMEGA: char = '\u{3C9}';

struct SyntheticOracle;

impl PropertyOracle for SyntheticOracle {
    fn properties(&self, ch: char) -> Properties {
        let mut p = Properties::inert(ch.len_utf8() as u8);
        match ch {
            ALPHA => {
                p.combines_forward = true;
            }
            BETA | DELTA => {
                p.ccc = if ch == BETA { 8 } else { 9 };
                p.combines_backward = true;
                p.quick_check = [
                    QuickCheck::Maybe,
                    QuickCheck::Yes,
                    QuickCheck::Maybe,
                    QuickCheck::Yes,
                ];
            }
            GAMMA => {
                p.canonical = Some("\u{3B1}\u{3B2}");
                p.quick_check = [
                    QuickCheck::Yes,
                    QuickCheck::No,
                    QuickCheck::Yes,
                    QuickCheck::No,
                ];
            }
            EPSILON | OMEGA => {
                // ε is an excluded composite; ω is a plain decomposable.
                // Neither survives any form unchanged.
                p.canonical = Some(if ch == EPSILON {
                    "\u{3B1}\u{3B4}"
                } else {
                    "\u{3B1}\u{3B2}"
                });
                p.quick_check = [QuickCheck::No; 4];
            }
            _ => {}
        }
        p
    }

    fn compose_pair(&self, first: char, second: char) -> Option<char> {
        match (first, second) {
            (ALPHA, BETA) => Some(GAMMA),
            (ALPHA, DELTA) => Some(EPSILON),
            _ => None,
        }
    }

    fn is_composition_exclusion(&self, ch: char) -> bool {
        ch == EPSILON
    }
}

fn transform_once(form: Form, input: &str) -> String {
    let mut t = Normalizer::new(form, &SyntheticOracle);
    let mut dst = vec![0u8; 64];
    let (written, read) = t
        .transform(&mut dst, input.as_bytes(), true)
        .expect("fits in dst");
    assert_eq!(read, input.len());
    String::from_utf8_lossy(&dst[..written]).into_owned()
}

#[test]
fn synthetic_composition() {
    assert_eq!(transform_once(Form::Nfc, "\u{3B1}\u{3B2}"), "\u{3B3}");
    assert_eq!(transform_once(Form::Nfd, "\u{3B3}"), "\u{3B1}\u{3B2}");
    assert_eq!(transform_once(Form::Nfd, "\u{3C9}"), "\u{3B1}\u{3B2}");
    assert_eq!(transform_once(Form::Nfc, "\u{3C9}"), "\u{3B3}");
}

#[test]
fn synthetic_mark_sorting() {
    // δ (9) before β (8) is out of order; sorting restores "αβδ", then
    // β composes into the starter.
    assert_eq!(transform_once(Form::Nfd, "\u{3B1}\u{3B4}\u{3B2}"), "\u{3B1}\u{3B2}\u{3B4}");
    assert_eq!(transform_once(Form::Nfc, "\u{3B1}\u{3B4}\u{3B2}"), "\u{3B3}\u{3B4}");
}

#[test]
fn engine_honors_exclusions_from_the_oracle() {
    // The pairing exists, but the engine must decline it.
    assert_eq!(transform_once(Form::Nfc, "\u{3B1}\u{3B4}"), "\u{3B1}\u{3B4}");
    assert_eq!(transform_once(Form::Nfd, "\u{3B5}"), "\u{3B1}\u{3B4}");
    assert_eq!(transform_once(Form::Nfc, "\u{3B5}"), "\u{3B1}\u{3B4}");
}

#[test]
fn synthetic_streaming_backpressure() {
    let mut t = Normalizer::new(Form::Nfc, &SyntheticOracle);
    let mut dst = vec![0u8; 64];
    // α alone may still combine with what follows.
    let err = t
        .transform(&mut dst, "\u{3B1}".as_bytes(), false)
        .unwrap_err();
    assert!(err.is_short_src());
    let (written, read) = t
        .transform(&mut dst, "\u{3B1}\u{3B2}".as_bytes(), true)
        .expect("complete");
    assert_eq!(&dst[..written], "\u{3B3}".as_bytes());
    assert_eq!(read, 4);
}

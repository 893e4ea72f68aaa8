//! End-to-end demo: a custom codec stage chained with normalization,
//! pulled through the stream adapter.
//!
//! The custom stage plays the role the peripheral codecs play in a real
//! deployment: it only has to implement the `Transformer` contract to
//! compose with the normalization engine.

use std::io::Read;

use norm_framework::Form;
use stream_pipeline::{Chain, TransformReader};
use transform_core::{TransformError, TransformResult, Transformer};

/// Replaces ASCII tabs with single spaces, byte for byte.
struct TabToSpace;

impl Transformer for TabToSpace {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], _at_eof: bool) -> TransformResult {
        let n = src.len().min(dst.len());
        for (d, s) in dst[..n].iter_mut().zip(&src[..n]) {
            *d = if *s == b'\t' { b' ' } else { *s };
        }
        if n < src.len() {
            return Err(TransformError::short_dst(n, n));
        }
        Ok((n, n))
    }
}

fn main() {
    // Decomposed "déjà vu" with a tab: the chain folds the tab and
    // recomposes the accents in one pass.
    let input = "de\u{301}ja\u{300}\tvu";
    println!("input:  {input:?}");

    let chain = Chain::new(vec![
        Box::new(TabToSpace),
        Box::new(Form::Nfc.normalizer()),
    ]);

    let mut reader = TransformReader::new(input.as_bytes(), chain);
    let mut out = Vec::new();
    match reader.read_to_end(&mut out) {
        Ok(_) => match String::from_utf8(out) {
            Ok(s) => println!("output: {s:?}"),
            Err(e) => eprintln!("output was not UTF-8: {e}"),
        },
        Err(e) => eprintln!("pipeline error: {e}"),
    }
}

use norm_framework::Form;
use transform_core::Transformer;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Outcome {
    Ok,
    ShortDst,
    ShortSrc,
}

fn run(form: Form, input: &str, at_eof: bool, dst_size: usize) -> (String, usize, Outcome) {
    let mut dst = vec![0u8; dst_size];
    let mut t = form.normalizer();
    let (written, read, outcome) = match t.transform(&mut dst, input.as_bytes(), at_eof) {
        Ok((w, r)) => (w, r, Outcome::Ok),
        Err(e) if e.is_short_dst() => {
            let (w, r) = e.progress();
            (w, r, Outcome::ShortDst)
        }
        Err(e) if e.is_short_src() => {
            let (w, r) = e.progress();
            (w, r, Outcome::ShortSrc)
        }
        Err(e) => panic!("unexpected error: {e}"),
    };
    (
        String::from_utf8_lossy(&dst[..written]).into_owned(),
        read,
        outcome,
    )
}

#[test]
fn transform_table() {
    use Outcome::*;
    // (form, input, expected output, at_eof, dst size, expected outcome)
    let tests: &[(Form, &str, &str, bool, usize, Outcome)] = &[
        (Form::Nfc, "ab", "ab", true, 2, Ok),
        (Form::Nfc, "qx", "qx", true, 2, Ok),
        (Form::Nfd, "qx", "qx", true, 2, Ok),
        (Form::Nfc, "", "", true, 1, Ok),
        (Form::Nfd, "", "", true, 1, Ok),
        (Form::Nfc, "", "", false, 1, Ok),
        (Form::Nfd, "", "", false, 1, Ok),
        // Normalized segment does not fit in the destination.
        (Form::Nfd, "\u{F6}", "", true, 1, ShortDst),
        (Form::Nfd, "\u{F6}", "", true, 2, ShortDst),
        // Only full segments are written, even for inert runes.
        (Form::Nfc, "ab", "", true, 1, ShortDst),
        (Form::Nfc, "qx", "", true, 1, ShortDst),
        (Form::Nfc, "a\u{300}abc", "\u{E0}a", true, 4, ShortDst),
        // A segment is withheld while later input could still change it.
        (Form::Nfd, "\u{F6}", "", false, 3, ShortSrc),
        (Form::Nfc, "a\u{300}", "", false, 4, ShortSrc),
        (Form::Nfd, "a\u{300}", "", false, 4, ShortSrc),
        (Form::Nfc, "\u{F6}", "", false, 3, ShortSrc),
        // The conservative room check rounds up to four bytes per rune.
        (Form::Nfc, "a\u{300}", "", true, 1, ShortDst),
        (Form::Nfc, "a\u{300}", "", true, 2, ShortDst),
        (Form::Nfc, "a\u{300}", "", true, 3, ShortDst),
        (Form::Nfc, "a\u{300}", "\u{E0}", true, 4, Ok),
        (Form::Nfd, "\u{F6}a\u{300}", "o\u{308}", false, 8, ShortSrc),
        (Form::Nfd, "\u{F6}a\u{300}\u{F6}", "o\u{308}a\u{300}", true, 8, ShortDst),
        (Form::Nfd, "\u{F6}a\u{300}\u{F6}", "o\u{308}a\u{300}", false, 12, ShortSrc),
    ];
    for (i, &(form, input, want_out, at_eof, dst_size, want_outcome)) in
        tests.iter().enumerate()
    {
        let (out, _, outcome) = run(form, input, at_eof, dst_size);
        assert_eq!(
            (out.as_str(), outcome),
            (want_out, want_outcome),
            "case {i}: {form:?} {input:?} eof={at_eof} dst={dst_size}"
        );
    }
}

#[test]
fn illegal_input_is_copied_verbatim() {
    let mut dst = vec![0u8; 8];
    let mut t = Form::Nfd.normalizer();
    let src = b"\xBD\xB2=\xBC ";
    let (written, read) = t.transform(&mut dst, src, true).expect("passthrough");
    assert_eq!(&dst[..written], src);
    assert_eq!(read, src.len());
}

#[test]
fn success_consumes_all_source() {
    // Ok implies the whole source was read.
    let inputs = ["hello", "\u{E0}\u{323}x", "\u{1100}\u{1161}\u{11A8}"];
    for form in [Form::Nfc, Form::Nfd, Form::Nfkc, Form::Nfkd] {
        for input in inputs {
            let mut dst = vec![0u8; 64];
            let mut t = form.normalizer();
            if let Ok((_, read)) = t.transform(&mut dst, input.as_bytes(), true) {
                assert_eq!(read, input.len(), "{form:?} {input:?}");
            }
        }
    }
}

/// Drives a transformer over `src` with the given source chunk size and
/// destination capacity until completion, concatenating the output.
fn drive(t: &mut dyn Transformer, src: &[u8], src_chunk: usize, dst_cap: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut dst = vec![0u8; dst_cap];
    let mut consumed = 0;
    let mut presented = src_chunk.min(src.len());
    let mut stall = 0;
    loop {
        let before = (consumed, presented, out.len());
        let at_eof = presented == src.len();
        let res = t.transform(&mut dst, &src[consumed..presented], at_eof);
        let (written, read) = match &res {
            Ok(p) => *p,
            Err(e) => e.progress(),
        };
        out.extend_from_slice(&dst[..written]);
        consumed += read;
        match res {
            Ok(_) => {
                if at_eof && consumed == src.len() {
                    return out;
                }
                presented = (presented + src_chunk).min(src.len());
            }
            Err(e) if e.is_short_dst() => {}
            Err(e) if e.is_short_src() => {
                assert!(!at_eof, "ShortSrc at EOF");
                presented = (presented + src_chunk).min(src.len());
            }
            Err(e) => panic!("fatal: {e}"),
        }
        if (consumed, presented, out.len()) == before {
            stall += 1;
            assert!(stall < 3, "transformer stalled at {consumed}/{}", src.len());
        } else {
            stall = 0;
        }
    }
}

#[test]
fn chunked_transform_matches_one_shot() {
    let inputs = [
        "hello world",
        "a\u{300}\u{323}q\u{E0}\u{323}",
        "\u{F6}a\u{300}\u{F6}\u{1EA7}",
        "\u{1100}\u{1161}\u{11A8}\u{AC00}\u{11A8}",
        "\u{FB01}\u{301}\u{BD}x",
        "mixed \u{E9}\u{304B}\u{3099} text",
    ];
    for form in [Form::Nfc, Form::Nfd, Form::Nfkc, Form::Nfkd] {
        for input in inputs {
            let mut want = Vec::new();
            form.append(&mut want, input.as_bytes());
            for src_chunk in [1, 2, 3, 5, 7, 64] {
                for dst_cap in [128, 131, 4096] {
                    let mut t = form.normalizer();
                    let got = drive(&mut t, input.as_bytes(), src_chunk, dst_cap);
                    assert_eq!(
                        got, want,
                        "{form:?} {input:?} chunk={src_chunk} dst={dst_cap}"
                    );
                }
            }
        }
    }
}

#[test]
fn short_src_retry_is_idempotent() {
    // A retry after ShortSrc must not duplicate or lose output.
    let input = "a\u{300}".as_bytes();
    let mut t = Form::Nfc.normalizer();
    let mut dst = vec![0u8; 16];
    let err = t.transform(&mut dst, &input[..2], false).unwrap_err();
    assert!(err.is_short_src());
    let (written, read) = err.progress();
    assert_eq!((written, read), (0, 0));
    let (written, read) = t.transform(&mut dst, input, true).expect("complete");
    assert_eq!(&dst[..written], "\u{E0}".as_bytes());
    assert_eq!(read, input.len());
}

#[test]
fn reset_clears_session_state() {
    let mut t = Form::Nfc.normalizer();
    let mut dst = vec![0u8; 16];
    let _ = t.transform(&mut dst, "a".as_bytes(), false);
    t.reset();
    let (written, _) = t.transform(&mut dst, "b".as_bytes(), true).expect("fresh");
    assert_eq!(&dst[..written], b"b");
}

#[test]
fn long_combining_run_makes_progress() {
    // More marks than the reorder window: output still appears, nothing
    // is dropped, and no call loops forever.
    let mut input = String::from("a");
    for _ in 0..100 {
        input.push('\u{301}');
    }
    let mut want = Vec::new();
    Form::Nfc.append(&mut want, input.as_bytes());
    let mut t = Form::Nfc.normalizer();
    let got = drive(&mut t, input.as_bytes(), 9, 128);
    assert_eq!(got, want);
}

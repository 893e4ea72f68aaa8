//! Normalize stdin to stdout in a chosen form.
//!
//! Usage: `normalize [nfc|nfd|nfkc|nfkd]` (default nfc). The input is
//! streamed through a `TransformReader`, so arbitrarily large files work
//! in constant memory.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use norm_framework::Form;
use stream_pipeline::TransformReader;

fn parse_form(name: &str) -> Option<Form> {
    match name.to_ascii_lowercase().as_str() {
        "nfc" => Some(Form::Nfc),
        "nfd" => Some(Form::Nfd),
        "nfkc" => Some(Form::Nfkc),
        "nfkd" => Some(Form::Nfkd),
        _ => None,
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(io::stderr)
        .init();

    let form = match std::env::args().nth(1) {
        None => Form::Nfc,
        Some(arg) => match parse_form(&arg) {
            Some(form) => form,
            None => {
                eprintln!("unknown form {arg:?}; expected nfc, nfd, nfkc or nfkd");
                return ExitCode::FAILURE;
            }
        },
    };

    let stdin = io::stdin().lock();
    let mut reader = TransformReader::new(stdin, form.normalizer());
    let mut stdout = io::stdout().lock();
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if let Err(e) = stdout.write_all(&buf[..n]) {
                    eprintln!("write error: {e}");
                    return ExitCode::FAILURE;
                }
            }
            Err(e) => {
                eprintln!("normalize error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

//! Inspect normalization properties of a string argument.
//!
//! Prints, per form: whether the input is already normalized, the
//! quick-span prefix, the first and last segment boundaries, and the
//! normalized result.

use std::process::ExitCode;

use norm_framework::Form;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let input = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            eprintln!("usage: boundaries <string>");
            return ExitCode::FAILURE;
        }
    };
    let bytes = input.as_bytes();
    println!("input: {input:?} ({} bytes)", bytes.len());

    for form in [Form::Nfc, Form::Nfd, Form::Nfkc, Form::Nfkd] {
        let normalized = form.normalize(&input);
        println!(
            "{form:?}: normal={} quick_span={} first_boundary={:?} last_boundary={:?} -> {:?}",
            form.is_normal(bytes),
            form.quick_span(bytes),
            form.first_boundary(bytes),
            form.last_boundary(bytes),
            normalized,
        );
    }
    ExitCode::SUCCESS
}

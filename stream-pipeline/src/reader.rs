//! Pull-based stream adapter.

use std::io::{self, Read};

use tracing::trace;
use transform_core::{TransformError, Transformer};

const DEFAULT_BUF_SIZE: usize = 4096;

/// Wraps a byte source and a [`Transformer`] behind `std::io::Read`.
///
/// The reader stages source bytes and transformed bytes in two internal
/// buffers, retrying on short-destination after draining and pulling more
/// source bytes on short-source. A genuine source I/O error takes
/// precedence over a transformer error; end-of-input does not. The
/// terminal error is sticky: once surfaced, subsequent reads report it
/// again.
pub struct TransformReader<R, T> {
    inner: R,
    transformer: T,

    /// dst[dst0..dst1] holds transformed bytes not yet copied out.
    dst: Vec<u8>,
    dst0: usize,
    dst1: usize,

    /// src[src0..src1] holds source bytes not yet consumed.
    src: Vec<u8>,
    src0: usize,
    src1: usize,

    /// The source reported end of input.
    src_eof: bool,
    /// A genuine source error waiting to be applied.
    src_err: Option<io::Error>,

    /// The transformation finished, successfully or not.
    transform_complete: bool,
    /// Sticky terminal error, re-minted on every read after completion.
    final_err: Option<(io::ErrorKind, String)>,
}

impl<R: Read, T: Transformer> TransformReader<R, T> {
    /// Wraps `inner` with default 4096-byte staging buffers.
    pub fn new(inner: R, transformer: T) -> Self {
        Self::with_capacity(DEFAULT_BUF_SIZE, inner, transformer)
    }

    /// Wraps `inner` with staging buffers of `capacity` bytes. The
    /// capacity bounds the largest unit the transformer can emit in one
    /// call.
    pub fn with_capacity(capacity: usize, inner: R, transformer: T) -> Self {
        let capacity = capacity.max(1);
        TransformReader {
            inner,
            transformer,
            dst: vec![0; capacity],
            dst0: 0,
            dst1: 0,
            src: vec![0; capacity],
            src0: 0,
            src1: 0,
            src_eof: false,
            src_err: None,
            transform_complete: false,
            final_err: None,
        }
    }

    /// Consumes the reader, returning the wrapped source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn complete(&mut self, err: Option<(io::ErrorKind, String)>) {
        self.transform_complete = true;
        // The source error takes precedence over the transformer error
        // unless the source merely reached end of input.
        if let Some(source_err) = self.src_err.take() {
            self.final_err = Some((source_err.kind(), source_err.to_string()));
        } else {
            self.final_err = err;
        }
    }
}

impl<R: Read, T: Transformer> Read for TransformReader<R, T> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        loop {
            // Copy out any transformed bytes first.
            if self.dst0 != self.dst1 {
                let n = (self.dst1 - self.dst0).min(out.len());
                out[..n].copy_from_slice(&self.dst[self.dst0..self.dst0 + n]);
                self.dst0 += n;
                return Ok(n);
            }
            if self.transform_complete {
                return match &self.final_err {
                    None => Ok(0),
                    Some((kind, msg)) => Err(io::Error::new(*kind, msg.clone())),
                };
            }

            // Transform staged source bytes, or flush the transformer once
            // the source is exhausted. This runs even after a source error:
            // bytes already read are processed before the error surfaces.
            if self.src0 != self.src1 || self.src_eof || self.src_err.is_some() {
                self.dst0 = 0;
                self.dst1 = 0;
                let at_eof = self.src_eof && self.src_err.is_none();
                let res = self.transformer.transform(
                    &mut self.dst,
                    &self.src[self.src0..self.src1],
                    at_eof,
                );
                match res {
                    Ok((written, read)) => {
                        self.dst1 = written;
                        self.src0 += read;
                        if self.src0 != self.src1 {
                            self.complete(Some((
                                io::ErrorKind::Other,
                                TransformError::InconsistentProgress.to_string(),
                            )));
                        } else if self.src_eof || self.src_err.is_some() {
                            // No more source bytes can arrive.
                            self.complete(None);
                        }
                        continue;
                    }
                    Err(e) if e.is_short_dst() => {
                        let (written, read) = e.progress();
                        self.dst1 = written;
                        self.src0 += read;
                        if written != 0 {
                            // Make room by copying out, then try again.
                            continue;
                        }
                        // The staging buffer cannot hold a single unit.
                        self.complete(Some((io::ErrorKind::Other, e.to_string())));
                        continue;
                    }
                    Err(e) if e.is_short_src() => {
                        let (written, read) = e.progress();
                        self.dst1 = written;
                        self.src0 += read;
                        if self.src_eof || self.src_err.is_some() {
                            // No more input will come.
                            self.complete(Some((io::ErrorKind::UnexpectedEof, e.to_string())));
                            continue;
                        }
                        if self.src1 - self.src0 == self.src.len() {
                            // Staging buffer is full and still short.
                            self.complete(Some((io::ErrorKind::Other, e.to_string())));
                            continue;
                        }
                        // Fall through and read more source bytes.
                    }
                    Err(e) => {
                        let (written, read) = e.progress();
                        self.dst1 = written;
                        self.src0 += read;
                        trace!(error = %e, "transformer failed");
                        let kind = match e {
                            TransformError::Codec { .. } => io::ErrorKind::InvalidData,
                            _ => io::ErrorKind::Other,
                        };
                        self.complete(Some((kind, e.to_string())));
                        continue;
                    }
                }
            }

            // Read more bytes into src, after sliding any unconsumed
            // source bytes to the front of the buffer.
            if self.src0 > 0 {
                self.src.copy_within(self.src0..self.src1, 0);
                self.src1 -= self.src0;
                self.src0 = 0;
            }
            match self.inner.read(&mut self.src[self.src1..]) {
                Ok(0) => self.src_eof = true,
                Ok(n) => self.src1 += n,
                Err(e) => {
                    if e.kind() == io::ErrorKind::Interrupted {
                        continue;
                    }
                    self.src_err = Some(e);
                }
            }
        }
    }
}

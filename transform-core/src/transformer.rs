use crate::error::{TransformError, TransformResult};

/// A streaming byte transducer.
///
/// This is the single integration point between engines (normalizers,
/// codecs, validators) and the composition layer (chains, readers). A
/// transformer consumes some prefix of `src`, produces some prefix of
/// `dst`, and reports exactly how much of each it touched.
pub trait Transformer {
    /// Writes transformed bytes from `src` into `dst` and returns the
    /// number of bytes written and read. `at_eof` tells whether `src`
    /// holds the final bytes of the input.
    ///
    /// Returns `Ok` if and only if all transformed bytes, including any
    /// state carried over from earlier calls, were written to `dst`.
    /// `Ok` implies the whole of `src` was read; the converse does not
    /// hold. Implementations may report progress together with an error;
    /// callers must process those bytes before inspecting the error.
    ///
    /// Any retained state (a partial segment, pending combining marks)
    /// lives inside the transformer value. Repeated calls are the only way
    /// to drive progress; there is no separate flush operation. Callers
    /// should keep calling until the call succeeds or no more progress is
    /// made.
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult;

    /// Clears internal state so the transformer can start a fresh stream.
    /// The default is a no-op for stateless transformers.
    fn reset(&mut self) {}
}

impl<T: Transformer + ?Sized> Transformer for &mut T {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult {
        (**self).transform(dst, src, at_eof)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

impl<T: Transformer + ?Sized> Transformer for Box<T> {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult {
        (**self).transform(dst, src, at_eof)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Copies bytes through unchanged.
///
/// Useful as a chain stage placeholder and in tests. Reports `ShortDst`
/// with partial progress when the destination cannot hold all of `src`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Transformer for Identity {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], _at_eof: bool) -> TransformResult {
        let n = src.len().min(dst.len());
        dst[..n].copy_from_slice(&src[..n]);
        if n < src.len() {
            return Err(TransformError::short_dst(n, n));
        }
        Ok((n, n))
    }
}

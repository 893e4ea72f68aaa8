use thiserror::Error;

/// Result of a single [`Transformer::transform`](crate::Transformer::transform)
/// call: `(written, read)` byte counts on success, or an error that still
/// carries whatever partial progress was made.
///
/// Callers must account for the progress reported by an error before acting
/// on the error itself, the same way `io::Read` callers process `n > 0`
/// bytes before inspecting a failure.
pub type TransformResult = Result<(usize, usize), TransformError>;

/// Errors reported by a transformer.
///
/// `ShortDst` and `ShortSrc` are backpressure signals, not failures: the
/// caller retries with more destination room or more source bytes. Both
/// carry the `(written, read)` progress already made so no bytes are lost
/// across the retry.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The destination buffer was too short to receive all of the
    /// transformed bytes.
    #[error("short destination buffer (wrote {written}, read {read})")]
    ShortDst { written: usize, read: usize },

    /// The source buffer ended mid-unit and more input is expected. Never
    /// returned when `at_eof` is true; a genuine decode failure at EOF is a
    /// `Codec` error instead.
    #[error("short source buffer (wrote {written}, read {read})")]
    ShortSrc { written: usize, read: usize },

    /// A transformer reported success without consuming all of its source.
    /// This violates the contract and marks the transformer as defective.
    #[error("transformer reported success without consuming all input")]
    InconsistentProgress,

    /// A terminal, transformer-specific failure (for example an invalid
    /// encoding). Propagates unchanged through chains and readers.
    #[error("codec error (wrote {written}, read {read}): {source}")]
    Codec {
        written: usize,
        read: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TransformError {
    /// Shorthand constructor for a short-destination signal.
    pub fn short_dst(written: usize, read: usize) -> Self {
        TransformError::ShortDst { written, read }
    }

    /// Shorthand constructor for a short-source signal.
    pub fn short_src(written: usize, read: usize) -> Self {
        TransformError::ShortSrc { written, read }
    }

    /// Wraps a terminal transformer-specific failure.
    pub fn codec<E>(written: usize, read: usize, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TransformError::Codec {
            written,
            read,
            source: Box::new(source),
        }
    }

    /// The `(written, read)` progress made before the error was raised.
    pub fn progress(&self) -> (usize, usize) {
        match *self {
            TransformError::ShortDst { written, read }
            | TransformError::ShortSrc { written, read }
            | TransformError::Codec { written, read, .. } => (written, read),
            TransformError::InconsistentProgress => (0, 0),
        }
    }

    /// Returns true for the recoverable short-destination signal.
    pub fn is_short_dst(&self) -> bool {
        matches!(self, TransformError::ShortDst { .. })
    }

    /// Returns true for the recoverable short-source signal.
    pub fn is_short_src(&self) -> bool {
        matches!(self, TransformError::ShortSrc { .. })
    }

    /// Returns true if the error is terminal (not a retryable
    /// backpressure signal).
    pub fn is_fatal(&self) -> bool {
        !self.is_short_dst() && !self.is_short_src()
    }
}

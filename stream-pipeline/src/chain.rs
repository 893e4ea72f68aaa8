//! Transformer chaining.

use std::io;

use tracing::trace;
use transform_core::{Identity, TransformError, TransformResult, Transformer};

const LINK_BUF_SIZE: usize = 4096;

/// Staging buffer between two adjacent stages. `data[p..n]` holds bytes
/// produced upstream and not yet consumed downstream.
struct StageBuf {
    data: Vec<u8>,
    p: usize,
    n: usize,
}

impl StageBuf {
    fn new(capacity: usize) -> Self {
        StageBuf {
            data: vec![0; capacity],
            p: 0,
            n: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.p == self.n
    }

    fn consume(&mut self, bytes: usize) {
        self.p += bytes;
        if self.p == self.n {
            self.p = 0;
            self.n = 0;
        }
    }

    fn compact(&mut self) {
        if self.p > 0 {
            self.data.copy_within(self.p..self.n, 0);
            self.n -= self.p;
            self.p = 0;
        }
    }

    fn is_full(&self) -> bool {
        self.n - self.p == self.data.len()
    }

    fn clear(&mut self) {
        self.p = 0;
        self.n = 0;
    }
}

/// Most recent outcome of running a stage within one `transform` call.
#[derive(Clone, Copy, PartialEq, Eq)]
enum StageStatus {
    Idle,
    Done,
    ShortDst,
    ShortSrc,
}

/// Combines transformers `T1, …, Tn` into one [`Transformer`], threading
/// the output of each stage into the next through private staging
/// buffers.
///
/// The chain reports the tightest backpressure condition of its stages: a
/// blocked final destination surfaces as `ShortDst`, an exhausted source
/// as `ShortSrc`, and it only reports success when every stage reported
/// success for the bytes processed. A terminal stage error is surfaced
/// once all output produced before the failure has been drained.
pub struct Chain {
    stages: Vec<Box<dyn Transformer>>,
    bufs: Vec<StageBuf>,
    /// Stage flushed everything it will ever produce.
    done: Vec<bool>,
    /// Stage is waiting for downstream room.
    short_dst: Vec<bool>,
    /// A failed stage, with its error, waiting for downstream to drain.
    fatal: Option<(usize, TransformError)>,
    /// A fatal error was already surfaced to the caller.
    failed: bool,
}

impl Chain {
    /// Chains `stages` in order with default staging buffers.
    pub fn new(stages: Vec<Box<dyn Transformer>>) -> Self {
        Self::with_buffer_size(LINK_BUF_SIZE, stages)
    }

    /// Chains `stages` with staging buffers of `capacity` bytes.
    pub fn with_buffer_size(capacity: usize, stages: Vec<Box<dyn Transformer>>) -> Self {
        let capacity = capacity.max(1);
        let links = stages.len().saturating_sub(1);
        Chain {
            done: vec![false; stages.len()],
            short_dst: vec![false; stages.len()],
            bufs: (0..links).map(|_| StageBuf::new(capacity)).collect(),
            stages,
            fatal: None,
            failed: false,
        }
    }

    /// True once the chain has surfaced a terminal error.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn upstream_done(&self, i: usize) -> bool {
        i == 0 || self.done[i - 1]
    }

    /// Runs stage `i` once. Returns the stage result; the caller applies
    /// progress bookkeeping through the returned `(written, read)`.
    fn run_stage(
        &mut self,
        i: usize,
        dst: &mut [u8],
        n_dst: usize,
        src: &[u8],
        n_src: usize,
        stage_eof: bool,
    ) -> TransformResult {
        let k = self.stages.len();
        if k == 1 {
            return self.stages[0].transform(&mut dst[n_dst..], &src[n_src..], stage_eof);
        }
        if i == 0 {
            self.bufs[0].compact();
            let out = &mut self.bufs[0];
            let free = out.n;
            return self.stages[0].transform(&mut out.data[free..], &src[n_src..], stage_eof);
        }
        if i == k - 1 {
            let input = &self.bufs[i - 1];
            return self.stages[i].transform(
                &mut dst[n_dst..],
                &input.data[input.p..input.n],
                stage_eof,
            );
        }
        self.bufs[i].compact();
        let (upstream, downstream) = self.bufs.split_at_mut(i);
        let input = &upstream[i - 1];
        let out = &mut downstream[0];
        self.stages[i].transform(
            &mut out.data[out.n..],
            &input.data[input.p..input.n],
            stage_eof,
        )
    }
}

impl Transformer for Chain {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult {
        if self.stages.is_empty() {
            return Identity.transform(dst, src, at_eof);
        }
        if self.failed {
            return Err(TransformError::codec(
                0,
                0,
                io::Error::new(io::ErrorKind::Other, "chain is in a failed state"),
            ));
        }

        let k = self.stages.len();
        let mut n_dst = 0;
        let mut n_src = 0;
        let mut status = vec![StageStatus::Idle; k];

        loop {
            let mut progressed = false;
            for i in 0..k {
                if let Some((failed_at, _)) = &self.fatal {
                    if i <= *failed_at {
                        continue;
                    }
                }
                let input_empty = if i == 0 {
                    n_src == src.len()
                } else {
                    self.bufs[i - 1].is_empty()
                };
                let stage_eof = at_eof && self.upstream_done(i);
                let want_run =
                    !input_empty || (stage_eof && !self.done[i]) || self.short_dst[i];
                if !want_run {
                    continue;
                }
                // No room downstream; wait for it to drain.
                if i < k - 1 && self.bufs[i].is_full() {
                    continue;
                }

                let res = self.run_stage(i, dst, n_dst, src, n_src, stage_eof);
                let (written, read, outcome) = match res {
                    Ok((w, r)) => (w, r, StageStatus::Done),
                    Err(e) if e.is_short_dst() => {
                        let (w, r) = e.progress();
                        (w, r, StageStatus::ShortDst)
                    }
                    Err(e) if e.is_short_src() => {
                        let (w, r) = e.progress();
                        (w, r, StageStatus::ShortSrc)
                    }
                    Err(e) => {
                        let (w, r) = e.progress();
                        trace!(stage = i, error = %e, "chain stage failed");
                        self.apply_progress(i, w, r, &mut n_dst, &mut n_src);
                        self.fatal = Some((i, e));
                        progressed = true;
                        continue;
                    }
                };
                if written > 0 || read > 0 {
                    progressed = true;
                }
                self.apply_progress(i, written, read, &mut n_dst, &mut n_src);
                self.short_dst[i] = outcome == StageStatus::ShortDst;
                status[i] = outcome;
                if outcome == StageStatus::Done && stage_eof {
                    self.done[i] = true;
                }
            }
            if !progressed {
                break;
            }
        }

        // A failed stage surfaces once everything it produced has been
        // flushed through the stages after it.
        if let Some((failed_at, _)) = &self.fatal {
            let drained = self.bufs[*failed_at..].iter().all(StageBuf::is_empty);
            if drained {
                self.failed = true;
                let (_, e) = match self.fatal.take() {
                    Some(f) => f,
                    None => return Err(TransformError::InconsistentProgress),
                };
                return Err(with_progress(e, n_dst, n_src));
            }
            return Err(TransformError::short_dst(n_dst, n_src));
        }

        let quiescent_ok = n_src == src.len()
            && self.bufs.iter().all(StageBuf::is_empty)
            && !self.short_dst.iter().any(|&b| b)
            && status
                .iter()
                .all(|&s| s == StageStatus::Done || s == StageStatus::Idle);
        if quiescent_ok {
            return Ok((n_dst, n_src));
        }
        if self.short_dst.iter().any(|&b| b) {
            return Err(TransformError::short_dst(n_dst, n_src));
        }
        Err(TransformError::short_src(n_dst, n_src))
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        for buf in &mut self.bufs {
            buf.clear();
        }
        for flag in &mut self.done {
            *flag = false;
        }
        for flag in &mut self.short_dst {
            *flag = false;
        }
        self.fatal = None;
        self.failed = false;
    }
}

impl Chain {
    fn apply_progress(
        &mut self,
        i: usize,
        written: usize,
        read: usize,
        n_dst: &mut usize,
        n_src: &mut usize,
    ) {
        let k = self.stages.len();
        if i == 0 {
            *n_src += read;
        } else {
            self.bufs[i - 1].consume(read);
        }
        if i == k - 1 {
            *n_dst += written;
        } else {
            self.bufs[i].n += written;
        }
    }
}

fn with_progress(e: TransformError, written: usize, read: usize) -> TransformError {
    match e {
        TransformError::ShortDst { .. } => TransformError::ShortDst { written, read },
        TransformError::ShortSrc { .. } => TransformError::ShortSrc { written, read },
        TransformError::Codec { source, .. } => TransformError::Codec {
            written,
            read,
            source,
        },
        TransformError::InconsistentProgress => TransformError::InconsistentProgress,
    }
}

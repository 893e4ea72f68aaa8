//! Norm Framework
//!
//! Streaming Unicode normalization for the four canonical forms (NFC, NFD,
//! NFKC, NFKD), built on the `transform-core` contract.
//!
//! The engine is context-generic: every entry point is generic over a
//! [`PropertyOracle`] that supplies per-code-point properties (combining
//! class, decompositions, quick-check flags, pairwise compositions). The
//! [`Form`] constants bind the built-in [`UnicodeTables`] oracle; tests can
//! substitute a synthetic one.

pub mod form;
pub mod hangul;
pub mod properties;
pub mod reorder;
mod scan;
pub mod tables;

pub use form::{Form, Normalizer};
pub use properties::{Properties, PropertyOracle, QuickCheck};
pub use reorder::{MAX_COMBINING_CHARS, MAX_SEGMENT_SIZE};
pub use tables::UnicodeTables;

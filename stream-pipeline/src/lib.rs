//! Stream Pipeline
//!
//! Composition layer over the `transform-core` contract: [`Chain`] threads
//! several transformers together through private staging buffers, and
//! [`TransformReader`] adapts a byte source plus a transformer into a
//! pull-based `std::io::Read`.

pub mod chain;
pub mod reader;

pub use chain::Chain;
pub use reader::TransformReader;

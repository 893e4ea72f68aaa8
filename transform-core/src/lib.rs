//! Transform Core
//!
//! Shared vocabulary for streaming byte transformation: the [`Transformer`]
//! contract, its error taxonomy and a passthrough implementation. Engine
//! crates (normalization, codecs, validators) implement the contract;
//! composition crates (chains, readers) consume it.

pub mod error;
pub mod transformer;

pub use error::{TransformError, TransformResult};
pub use transformer::{Identity, Transformer};

//! Block-oriented binary compression for homogeneous typed numerical
//! arrays: filters, codecs, a chunk/frame/super-chunk container stack, and
//! an n-dimensional array API on top of it.
//!
//! Grounded on `examples/keller-mark-blusc`'s module layout (`blosc/` +
//! `internal/` split here flattened into one crate, since this crate has
//! no WASM/FFI boundary to keep separate), generalized from c-blosc2's
//! fixed catalogs and `unsafe` pointer plumbing to the tagged-sum,
//! registry, and arena-index patterns documented per module below.

pub mod array;
pub mod chunk;
pub mod codecs;
pub mod constants;
pub mod context;
pub mod error;
pub mod filters;
pub mod frame;
pub mod meta;
pub mod ndim;
pub mod pipeline;
pub mod schunk;

pub use array::Array;
pub use codecs::CodecId;
pub use context::{CompressionParams, Context, DecompressionParams, Runtime};
pub use error::{Error, Result};
pub use filters::{FilterChain, FilterId};
pub use frame::Frame;
pub use ndim::Geometry;
pub use schunk::SChunk;

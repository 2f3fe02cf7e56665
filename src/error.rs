//! Error kinds shared across every public operation.
//!
//! Mirrors the error taxonomy a compression/chunking core needs: argument
//! validation, storage/format problems, codec and filter failures, and
//! metalayer lookup. Every fallible public function in this crate returns
//! `Result<T, Error>`; nothing on a user-reachable path panics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("required value missing: {0}")]
    NullPointer(String),

    #[error("storage error: {0}")]
    InvalidStorage(String),

    #[error("invalid frame or chunk format: {0}")]
    InvalidFormat(String),

    #[error("compression failed: {0}")]
    CompressionFailure(String),

    #[error("decompression failed: {0}")]
    DecompressionFailure(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("filter failed: {0}")]
    FilterFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

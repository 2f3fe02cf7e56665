//! Format constants: versioning, size bounds, and frame/chunk magic bytes.
//!
//! Grounded on `examples/keller-mark-blusc/src/internal/constants.rs`
//! (itself a transcription of c-blosc2's `blosc2.h`); values are kept
//! identical so that frames this crate writes stay self-describing in the
//! same way the teacher's chunk header is.

/// Format major version. Readers must refuse an unknown major (spec §6).
pub const FORMAT_VERSION_MAJOR: u8 = 1;
/// Format minor version. Minor differences must stay forward-readable.
pub const FORMAT_VERSION_MINOR: u8 = 0;

/// First four bytes of every contiguous frame.
pub const FRAME_MAGIC: [u8; 4] = *b"ND2F";
/// Magic written at the very end of the trailer (footer).
pub const FRAME_FOOTER_MAGIC: [u8; 4] = *b"ND2E";

/// Maximum number of (filter, meta) pairs in a single filter chain.
pub const MAX_FILTERS: usize = 6;

/// Maximum number of dimensions an n-d array / chunk / block may have.
pub const MAX_DIM: usize = 8;

/// Fixed-size chunk header length (see `chunk::header`).
pub const CHUNK_HEADER_LENGTH: usize = 32;

/// Per-block header length: 4-byte length + 1-byte flags.
pub const BLOCK_HEADER_LENGTH: usize = 5;

/// Maximum overhead a single block may add over its logical size.
pub const MAX_BLOCK_OVERHEAD: usize = BLOCK_HEADER_LENGTH;

/// Minimum size, in bytes, worth handing to a general-purpose codec; smaller
/// streams are stored raw regardless of what the codec reports.
pub const DEFAULT_MIN_STREAM_SIZE: usize = 32;

/// Default block size target when `cparams.blocksize == 0` ("auto").
pub const DEFAULT_BLOCKSIZE: usize = 128 * 1024;

/// Upper bound on block size; chosen to keep the compressed-size upper
/// bound (`blocksize + overhead`) representable in a `u32` length field.
pub const MAX_BLOCKSIZE: usize = 1024 * 1024 * 1024;

/// Name of the shape-metadata fixed metalayer written by the n-d array API.
pub const ARRAY_METALAYER_NAME: &str = "b2nd";
/// Version byte of the `b2nd` metalayer encoding.
pub const ARRAY_METALAYER_VERSION: u8 = 1;

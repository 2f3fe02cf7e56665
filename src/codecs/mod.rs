//! Codec catalog (C2): the general-purpose compressor applied to each
//! filtered block. Every adapter shares the `compress`/`decompress`
//! contract from spec §4.2 — a `0` return from `compress` means
//! "incompressible, store the block raw," never an error.
//!
//! Mirrors [`crate::filters`]'s tagged-sum-plus-registry shape: built-ins
//! are a closed `CodecId` enum, user codecs are `Custom(id)` resolved
//! through a [`CodecRegistry`].

pub mod blosclz;
pub mod experimental;
pub mod lz4;
pub mod zlib;
pub mod zstd;

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    BloscLz,
    Lz4,
    Zlib,
    Zstd,
    /// Graph-based experimental codec slot (spec §1), backed by `snap`.
    Experimental,
    Custom(u8),
}

impl CodecId {
    pub fn code(self) -> u8 {
        match self {
            CodecId::BloscLz => 0,
            CodecId::Lz4 => 1,
            CodecId::Zlib => 2,
            CodecId::Zstd => 3,
            CodecId::Experimental => 4,
            CodecId::Custom(id) => id,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => CodecId::BloscLz,
            1 => CodecId::Lz4,
            2 => CodecId::Zlib,
            3 => CodecId::Zstd,
            4 => CodecId::Experimental,
            other => CodecId::Custom(other),
        }
    }
}

type CustomCodecCompressFn = dyn Fn(i32, &[u8], &mut [u8]) -> Result<usize> + Send + Sync;
type CustomCodecDecompressFn = dyn Fn(&[u8], &mut [u8]) -> Result<usize> + Send + Sync;

/// A user-registered codec pair, keyed by its id byte.
#[derive(Clone)]
pub struct CustomCodec {
    pub compress: Arc<CustomCodecCompressFn>,
    pub decompress: Arc<CustomCodecDecompressFn>,
}

/// User-registered codecs, append-only, guarded by the single mutex inside
/// [`crate::runtime::Runtime`] (spec §9).
#[derive(Clone, Default)]
pub struct CodecRegistry {
    custom: HashMap<u8, CustomCodec>,
}

impl CodecRegistry {
    pub fn register(&mut self, id: u8, codec: CustomCodec) {
        self.custom.insert(id, codec);
    }
}

/// Compress `src` into `dst` with the named codec at `level` (0-9, meaning
/// is codec-specific). A `0` return means the block did not compress and
/// should be stored raw by the caller.
pub fn compress(id: CodecId, level: i32, src: &[u8], dst: &mut [u8], registry: &CodecRegistry) -> Result<usize> {
    match id {
        CodecId::BloscLz => Ok(blosclz::compress(level, src, dst)),
        CodecId::Lz4 => lz4::compress(level, src, dst),
        CodecId::Zlib => zlib::compress(level, src, dst),
        CodecId::Zstd => zstd::compress(level, src, dst),
        CodecId::Experimental => experimental::compress(level, src, dst),
        CodecId::Custom(code) => match registry.custom.get(&code) {
            Some(codec) => (codec.compress)(level, src, dst),
            None => Err(Error::Unsupported(format!("custom codec id {code} not registered"))),
        },
    }
}

/// Decompress `src` into `dst`, which must be exactly the original block
/// size (the chunk/block header records it, per spec §4.3/§4.4).
pub fn decompress(id: CodecId, src: &[u8], dst: &mut [u8], registry: &CodecRegistry) -> Result<usize> {
    match id {
        CodecId::BloscLz => {
            let n = blosclz::decompress(src, dst);
            if n == 0 && !dst.is_empty() {
                Err(Error::DecompressionFailure("blosclz: malformed stream".into()))
            } else {
                Ok(n)
            }
        }
        CodecId::Lz4 => lz4::decompress(src, dst),
        CodecId::Zlib => zlib::decompress(src, dst),
        CodecId::Zstd => zstd::decompress(src, dst),
        CodecId::Experimental => experimental::decompress(src, dst),
        CodecId::Custom(code) => match registry.custom.get(&code) {
            Some(codec) => (codec.decompress)(src, dst),
            None => Err(Error::Unsupported(format!("custom codec id {code} not registered"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_to_each_builtin() {
        let registry = CodecRegistry::default();
        let src: Vec<u8> = (0..4096u32).map(|i| (i % 61) as u8).collect();
        for id in [
            CodecId::BloscLz,
            CodecId::Lz4,
            CodecId::Zlib,
            CodecId::Zstd,
            CodecId::Experimental,
        ] {
            let mut compressed = vec![0u8; src.len() * 2 + 1024];
            let n = compress(id, 5, &src, &mut compressed, &registry).unwrap();
            assert!(n > 0, "{id:?} failed to compress");
            let mut out = vec![0u8; src.len()];
            let m = decompress(id, &compressed[..n], &mut out, &registry).unwrap();
            assert_eq!(m, src.len(), "{id:?} decompressed wrong length");
            assert_eq!(out, src, "{id:?} round-trip mismatch");
        }
    }

    #[test]
    fn unregistered_custom_codec_is_unsupported() {
        let registry = CodecRegistry::default();
        let err = compress(CodecId::Custom(200), 5, &[1, 2, 3], &mut [0u8; 16], &registry).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn code_round_trips() {
        for id in [
            CodecId::BloscLz,
            CodecId::Lz4,
            CodecId::Zlib,
            CodecId::Zstd,
            CodecId::Experimental,
            CodecId::Custom(77),
        ] {
            assert_eq!(CodecId::from_code(id.code()), id);
        }
    }
}

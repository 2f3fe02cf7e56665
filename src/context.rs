//! Context & config (C9): per-operation parameter bundles plus the
//! process-wide catalog of built-in and user-registered filters/codecs.
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/context.rs`'s
//! `Blosc2Cparams`/`Blosc2Dparams` (here as [`CompressionParams`]/
//! [`DecompressionParams`]), with the teacher's `static mut` global
//! filter/codec tables replaced by a [`Runtime`] holding its catalogs
//! behind a single `Mutex`, per spec §9's "one context per thread, not
//! thread-safe across concurrent calls" rule.

use crate::codecs::{CodecId, CodecRegistry, CustomCodec};
use crate::constants::DEFAULT_MIN_STREAM_SIZE;
use crate::error::{Error, Result};
use crate::filters::{FilterChain, FilterRegistry};
use std::sync::{Arc, Mutex};

/// Parameters governing one compression call. Mirrors spec §4.9.
#[derive(Clone)]
pub struct CompressionParams {
    pub codec: CodecId,
    /// Clamped to `1..=9` on construction.
    pub level: i32,
    pub item_width: usize,
    /// `0` means "auto": [`crate::constants::DEFAULT_BLOCKSIZE`] is used.
    pub blocksize: usize,
    pub nthreads: usize,
    pub filters: FilterChain,
    pub min_stream_size: usize,
}

impl CompressionParams {
    pub fn new(codec: CodecId, level: i32, item_width: usize) -> Self {
        CompressionParams {
            codec,
            level: level.clamp(1, 9),
            item_width,
            blocksize: 0,
            nthreads: 1,
            filters: FilterChain::new(),
            min_stream_size: DEFAULT_MIN_STREAM_SIZE,
        }
    }
}

/// Parameters governing one decompression call.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecompressionParams {
    pub nthreads: usize,
}

#[derive(Default)]
struct Catalogs {
    filters: FilterRegistry,
    codecs: CodecRegistry,
}

/// Owns the process-wide custom filter/codec catalogs. A single
/// [`Runtime`] may be shared across contexts; the mutex only guards
/// catalog mutation (registration), not the (stateless) compress/
/// decompress calls themselves.
#[derive(Clone, Default)]
pub struct Runtime {
    catalogs: Arc<Mutex<Catalogs>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_filter(&self, id: u8, f: Arc<dyn Fn(&[u8], &mut [u8], u8, &crate::filters::FilterContext, bool) -> Result<()> + Send + Sync>) {
        self.catalogs.lock().unwrap().filters.register(id, f);
    }

    pub fn register_codec(&self, id: u8, codec: CustomCodec) {
        self.catalogs.lock().unwrap().codecs.register(id, codec);
    }

    pub fn filter_registry(&self) -> FilterRegistry {
        self.catalogs.lock().unwrap().filters.clone()
    }

    pub fn codec_registry(&self) -> CodecRegistry {
        self.catalogs.lock().unwrap().codecs.clone()
    }
}

/// A compression/decompression context: owns a [`Runtime`] handle plus the
/// parameters for its next operation. Not `Sync`— spec §9 requires one
/// context per thread for concurrent use.
pub struct Context {
    pub runtime: Runtime,
    pub cparams: CompressionParams,
    pub dparams: DecompressionParams,
}

impl Context {
    pub fn new(runtime: Runtime, cparams: CompressionParams, dparams: DecompressionParams) -> Result<Self> {
        if cparams.nthreads == 0 {
            return Err(Error::InvalidArgument("nthreads must be at least 1".into()));
        }
        Ok(Context {
            runtime,
            cparams,
            dparams,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_params_clamp_level() {
        let p = CompressionParams::new(CodecId::Zstd, 99, 4);
        assert_eq!(p.level, 9);
        let p = CompressionParams::new(CodecId::Zstd, -5, 4);
        assert_eq!(p.level, 1);
    }

    #[test]
    fn context_rejects_zero_threads() {
        let runtime = Runtime::new();
        let mut cparams = CompressionParams::new(CodecId::BloscLz, 5, 4);
        cparams.nthreads = 0;
        let err = Context::new(runtime, cparams, DecompressionParams::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn runtime_registries_are_shared_across_clones() {
        let runtime = Runtime::new();
        let other = runtime.clone();
        other.register_codec(
            200,
            CustomCodec {
                compress: Arc::new(|_level, src, dst| {
                    dst[..src.len()].copy_from_slice(src);
                    Ok(src.len())
                }),
                decompress: Arc::new(|src, dst| {
                    dst[..src.len()].copy_from_slice(src);
                    Ok(src.len())
                }),
            },
        );
        let registry = runtime.codec_registry();
        let mut out = vec![0u8; 8];
        let n = crate::codecs::compress(CodecId::Custom(200), 5, b"abcdefgh", &mut out, &registry).unwrap();
        assert_eq!(n, 8);
    }
}

//! Stand-in for spec §1's "experimental graph-based codec" slot.
//!
//! `examples/original_source/internal-complibs/openzl-0.1.0` is c-blosc2's
//! actual experimental codec (a graph-based encoder), but it ships no
//! crate this workspace can depend on. Per spec §1 every general-purpose
//! codec is an out-of-scope black box behind the same `compress`/
//! `decompress` contract, so this slot is wired to `snap` (Snappy) instead
//! — a real, already-vendored codec in the teacher's dependency set
//! (`examples/keller-mark-blusc/Cargo.toml`) that was otherwise unused.
//! See `DESIGN.md` for the open-question writeup.

use crate::error::{Error, Result};
use snap::raw::{Decoder, Encoder};

pub fn compress(_level: i32, src: &[u8], dst: &mut [u8]) -> Result<usize> {
    if dst.len() < snap::raw::max_compress_len(src.len()) {
        return Ok(0);
    }
    match Encoder::new().compress(src, dst) {
        Ok(n) => Ok(n),
        Err(_) => Ok(0),
    }
}

pub fn decompress(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    Decoder::new()
        .decompress(src, dst)
        .map_err(|e| Error::DecompressionFailure(format!("experimental: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let src: Vec<u8> = (0..8192u32).map(|i| (i % 251) as u8).collect();
        let mut compressed = vec![0u8; snap::raw::max_compress_len(src.len())];
        let n = compress(5, &src, &mut compressed).unwrap();
        assert!(n > 0);
        let mut out = vec![0u8; src.len()];
        let m = decompress(&compressed[..n], &mut out).unwrap();
        assert_eq!(m, src.len());
        assert_eq!(out, src);
    }
}

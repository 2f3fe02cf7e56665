//! Zstd codec adapter over `zstd`'s bulk (single-shot, explicit-buffer) API.

use crate::error::{Error, Result};

/// Conservative worst-case output size, independent of `zstd-sys`'s own
/// `ZSTD_compressBound` (not part of the high-level crate's public API).
fn compress_bound(src_len: usize) -> usize {
    src_len + src_len / 8 + 256
}

pub fn compress(level: i32, src: &[u8], dst: &mut [u8]) -> Result<usize> {
    if dst.len() < compress_bound(src.len()) {
        return Ok(0);
    }
    match zstd::bulk::compress_to_buffer(src, dst, level) {
        Ok(n) => Ok(n),
        Err(_) => Ok(0),
    }
}

pub fn decompress(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    zstd::bulk::decompress_to_buffer(src, dst).map_err(|e| Error::DecompressionFailure(format!("zstd: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let src: Vec<u8> = (0..8192u32).map(|i| (i % 251) as u8).collect();
        let mut compressed = vec![0u8; compress_bound(src.len())];
        let n = compress(5, &src, &mut compressed).unwrap();
        assert!(n > 0);
        let mut out = vec![0u8; src.len()];
        let m = decompress(&compressed[..n], &mut out).unwrap();
        assert_eq!(m, src.len());
        assert_eq!(out, src);
    }
}

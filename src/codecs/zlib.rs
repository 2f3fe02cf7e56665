//! Zlib codec adapter over `flate2`'s streaming encoder/decoder, buffered
//! through an intermediate `Vec` since flate2 has no fixed-capacity
//! single-shot entry point.

use crate::error::{Error, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

pub fn compress(level: i32, src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let level = (level.clamp(0, 9)) as u32;
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(src.len()), Compression::new(level));
    encoder
        .write_all(src)
        .map_err(|e| Error::CompressionFailure(format!("zlib: {e}")))?;
    let compressed = encoder
        .finish()
        .map_err(|e| Error::CompressionFailure(format!("zlib: {e}")))?;
    if compressed.len() > dst.len() {
        return Ok(0);
    }
    dst[..compressed.len()].copy_from_slice(&compressed);
    Ok(compressed.len())
}

pub fn decompress(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let mut decoder = ZlibDecoder::new(src);
    let mut out = Vec::with_capacity(dst.len());
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::DecompressionFailure(format!("zlib: {e}")))?;
    if out.len() > dst.len() {
        return Err(Error::DecompressionFailure(
            "zlib: decompressed size exceeds destination capacity".into(),
        ));
    }
    dst[..out.len()].copy_from_slice(&out);
    Ok(out.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let src: Vec<u8> = (0..8192u32).map(|i| (i % 251) as u8).collect();
        let mut compressed = vec![0u8; src.len() + 1024];
        let n = compress(6, &src, &mut compressed).unwrap();
        assert!(n > 0);
        let mut out = vec![0u8; src.len()];
        let m = decompress(&compressed[..n], &mut out).unwrap();
        assert_eq!(m, src.len());
        assert_eq!(out, src);
    }
}

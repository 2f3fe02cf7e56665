//! LZ4 codec adapter over `lz4_flex`'s block API.

use crate::error::{Error, Result};

pub fn compress(_level: i32, src: &[u8], dst: &mut [u8]) -> Result<usize> {
    match lz4_flex::block::compress_into(src, dst) {
        Ok(n) => Ok(n),
        Err(lz4_flex::block::CompressError::OutputTooSmall { .. }) => Ok(0),
        Err(e) => Err(Error::CompressionFailure(format!("lz4: {e}"))),
    }
}

pub fn decompress(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    lz4_flex::block::decompress_into(src, dst).map_err(|e| Error::DecompressionFailure(format!("lz4: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let src: Vec<u8> = (0..8192u32).map(|i| (i % 251) as u8).collect();
        let mut compressed = vec![0u8; lz4_flex::block::get_maximum_output_size(src.len())];
        let n = compress(5, &src, &mut compressed).unwrap();
        assert!(n > 0);
        let mut out = vec![0u8; src.len()];
        let m = decompress(&compressed[..n], &mut out).unwrap();
        assert_eq!(m, src.len());
        assert_eq!(out, src);
    }
}

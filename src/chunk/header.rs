//! Per-chunk header: the self-describing 32-byte prefix defined in spec §6,
//! followed by the block-offset table.
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/blosc2.rs`'s
//! `BloscHeader`/`read_chunk_header`, generalized from `i32` C-ABI fields
//! to Rust-native `u32`/`usize` and from a fixed `[u8; MAX_FILTERS]` to
//! [`crate::filters::FilterChain`].

use crate::codecs::CodecId;
use crate::constants::{CHUNK_HEADER_LENGTH, FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR, MAX_FILTERS};
use crate::error::{Error, Result};
use crate::filters::{FilterChain, FilterId};

/// Flags byte: low nibble reserved for the codec id, high bit for shuffle
/// state mirrored from the filter chain (kept for interop with the byte
/// layout spec §6 mandates; the filter chain itself is the source of truth).
const FLAG_HAS_FILTERS: u8 = 1 << 7;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Logical size after decompression, in bytes.
    pub nbytes: u32,
    pub blocksize: u32,
    /// Total size of this chunk (header + block-offset table + bodies).
    pub cbytes: u32,
    pub codec: CodecId,
    pub codec_level: i32,
    pub typesize: u32,
    pub filters: FilterChain,
    pub nblocks: u32,
}

impl ChunkHeader {
    pub fn write_to(&self, out: &mut [u8]) -> Result<()> {
        if out.len() < CHUNK_HEADER_LENGTH {
            return Err(Error::InvalidArgument("chunk header buffer too small".into()));
        }
        out[0..4].copy_from_slice(&self.nbytes.to_le_bytes());
        out[4..8].copy_from_slice(&self.blocksize.to_le_bytes());
        out[8..12].copy_from_slice(&self.cbytes.to_le_bytes());
        out[12] = self.codec.code() | if self.filters.is_empty() { 0 } else { FLAG_HAS_FILTERS };
        out[13] = FORMAT_VERSION_MAJOR;
        out[14] = FORMAT_VERSION_MINOR;
        out[15] = self.codec_level.clamp(0, 9) as u8;
        out[16..20].copy_from_slice(&self.typesize.to_le_bytes());

        let mut filter_ids = [0u8; MAX_FILTERS];
        let mut filter_metas = [0u8; MAX_FILTERS];
        for (i, slot) in self.filters.slots().iter().enumerate() {
            filter_ids[i] = slot.id.code();
            filter_metas[i] = slot.meta;
        }
        out[20..26].copy_from_slice(&filter_ids);
        out[26..32].copy_from_slice(&filter_metas);
        Ok(())
    }

    pub fn read_from(src: &[u8]) -> Result<Self> {
        if src.len() < CHUNK_HEADER_LENGTH {
            return Err(Error::InvalidFormat("truncated chunk header".into()));
        }
        let nbytes = u32::from_le_bytes(src[0..4].try_into().unwrap());
        let blocksize = u32::from_le_bytes(src[4..8].try_into().unwrap());
        let cbytes = u32::from_le_bytes(src[8..12].try_into().unwrap());
        let codec = CodecId::from_code(src[12] & !FLAG_HAS_FILTERS);
        let version_major = src[13];
        if version_major > FORMAT_VERSION_MAJOR {
            return Err(Error::InvalidFormat(format!(
                "unsupported chunk format major version {version_major}"
            )));
        }
        let codec_level = src[15] as i32;
        let typesize = u32::from_le_bytes(src[16..20].try_into().unwrap());

        let filter_ids = &src[20..26];
        let filter_metas = &src[26..32];
        let mut filters = FilterChain::new();
        for i in 0..MAX_FILTERS {
            let id = FilterId::from_code(filter_ids[i]);
            if id == FilterId::None && filter_metas[i] == 0 {
                continue;
            }
            filters.push(id, filter_metas[i])?;
        }

        if blocksize == 0 {
            return Err(Error::InvalidFormat("chunk header has zero blocksize".into()));
        }
        let nblocks = nbytes.div_ceil(blocksize.max(1));

        Ok(ChunkHeader {
            nbytes,
            blocksize,
            cbytes,
            codec,
            codec_level,
            typesize,
            filters,
            nblocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let mut filters = FilterChain::new();
        filters.push(FilterId::Shuffle, 0).unwrap();
        filters.push(FilterId::Delta, 0).unwrap();
        let header = ChunkHeader {
            nbytes: 4096,
            blocksize: 1024,
            cbytes: 512,
            codec: CodecId::Zstd,
            codec_level: 5,
            typesize: 4,
            filters,
            nblocks: 4,
        };
        let mut buf = [0u8; CHUNK_HEADER_LENGTH];
        header.write_to(&mut buf).unwrap();
        let parsed = ChunkHeader::read_from(&buf).unwrap();
        assert_eq!(parsed.nbytes, header.nbytes);
        assert_eq!(parsed.blocksize, header.blocksize);
        assert_eq!(parsed.codec, header.codec);
        assert_eq!(parsed.filters, header.filters);
        assert_eq!(parsed.nblocks, 4);
    }

    #[test]
    fn rejects_future_major_version() {
        let mut buf = [0u8; CHUNK_HEADER_LENGTH];
        buf[4..8].copy_from_slice(&1024u32.to_le_bytes());
        buf[13] = FORMAT_VERSION_MAJOR + 1;
        assert!(matches!(ChunkHeader::read_from(&buf), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn rejects_truncated_buffer() {
        assert!(matches!(ChunkHeader::read_from(&[0u8; 10]), Err(Error::InvalidFormat(_))));
    }
}

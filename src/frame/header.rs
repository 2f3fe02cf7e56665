//! Frame header: the fixed-size prefix of a contiguous frame (spec §4.5/§6).
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/frame.rs`'s
//! `FRAME_HEADER_*` constant chain, reworked from that file's running
//! byte-offset accumulation into explicit field widths computed once in
//! [`FRAME_HEADER_LENGTH`].

use crate::codecs::CodecId;
use crate::constants::{FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR, FRAME_MAGIC, MAX_FILTERS};
use crate::error::{Error, Result};
use crate::filters::{FilterChain, FilterId};

const FLAG_HAS_VLMETALAYERS: u8 = 1 << 0;
const FLAG_SPARSE: u8 = 1 << 1;

/// magic(4) + major(1) + minor(1) + flags(1) + reserved(1) + typesize(4)
/// + chunksize(4) + blocksize(4) + nchunks(4) + codec(1) + codec_level(1)
/// + filter ids(6) + filter metas(6) + trailer_offset(8).
pub const FRAME_HEADER_LENGTH: usize = 4 + 1 + 1 + 1 + 1 + 4 + 4 + 4 + 4 + 1 + 1 + MAX_FILTERS + MAX_FILTERS + 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub typesize: u32,
    /// Logical, uncompressed size of one chunk, in bytes.
    pub chunksize: u32,
    pub blocksize: u32,
    pub nchunks: u32,
    pub codec: CodecId,
    pub codec_level: i32,
    pub filters: FilterChain,
    pub has_vlmetalayers: bool,
    pub sparse: bool,
    /// Absolute offset of the trailer from the start of the frame.
    pub trailer_offset: u64,
}

impl FrameHeader {
    pub fn write_to(&self, out: &mut [u8]) -> Result<()> {
        if out.len() < FRAME_HEADER_LENGTH {
            return Err(Error::InvalidArgument("frame header buffer too small".into()));
        }
        out[0..4].copy_from_slice(&FRAME_MAGIC);
        out[4] = FORMAT_VERSION_MAJOR;
        out[5] = FORMAT_VERSION_MINOR;
        let mut flags = 0u8;
        if self.has_vlmetalayers {
            flags |= FLAG_HAS_VLMETALAYERS;
        }
        if self.sparse {
            flags |= FLAG_SPARSE;
        }
        out[6] = flags;
        out[7] = 0;
        out[8..12].copy_from_slice(&self.typesize.to_le_bytes());
        out[12..16].copy_from_slice(&self.chunksize.to_le_bytes());
        out[16..20].copy_from_slice(&self.blocksize.to_le_bytes());
        out[20..24].copy_from_slice(&self.nchunks.to_le_bytes());
        out[24] = self.codec.code();
        out[25] = self.codec_level.clamp(0, 9) as u8;

        let mut filter_ids = [0u8; MAX_FILTERS];
        let mut filter_metas = [0u8; MAX_FILTERS];
        for (i, slot) in self.filters.slots().iter().enumerate() {
            filter_ids[i] = slot.id.code();
            filter_metas[i] = slot.meta;
        }
        out[26..26 + MAX_FILTERS].copy_from_slice(&filter_ids);
        out[26 + MAX_FILTERS..26 + 2 * MAX_FILTERS].copy_from_slice(&filter_metas);
        let trailer_off_pos = 26 + 2 * MAX_FILTERS;
        out[trailer_off_pos..trailer_off_pos + 8].copy_from_slice(&self.trailer_offset.to_le_bytes());
        Ok(())
    }

    pub fn read_from(src: &[u8]) -> Result<Self> {
        if src.len() < FRAME_HEADER_LENGTH {
            return Err(Error::InvalidFormat("truncated frame header".into()));
        }
        if src[0..4] != FRAME_MAGIC {
            return Err(Error::InvalidFormat("bad frame magic".into()));
        }
        let major = src[4];
        if major > FORMAT_VERSION_MAJOR {
            return Err(Error::InvalidFormat(format!("unsupported frame major version {major}")));
        }
        let flags = src[6];
        let typesize = u32::from_le_bytes(src[8..12].try_into().unwrap());
        let chunksize = u32::from_le_bytes(src[12..16].try_into().unwrap());
        let blocksize = u32::from_le_bytes(src[16..20].try_into().unwrap());
        let nchunks = u32::from_le_bytes(src[20..24].try_into().unwrap());
        let codec = CodecId::from_code(src[24]);
        let codec_level = src[25] as i32;

        let filter_ids = &src[26..26 + MAX_FILTERS];
        let filter_metas = &src[26 + MAX_FILTERS..26 + 2 * MAX_FILTERS];
        let mut filters = FilterChain::new();
        for i in 0..MAX_FILTERS {
            let id = FilterId::from_code(filter_ids[i]);
            if id == FilterId::None && filter_metas[i] == 0 {
                continue;
            }
            filters.push(id, filter_metas[i])?;
        }
        let trailer_off_pos = 26 + 2 * MAX_FILTERS;
        let trailer_offset = u64::from_le_bytes(src[trailer_off_pos..trailer_off_pos + 8].try_into().unwrap());

        Ok(FrameHeader {
            typesize,
            chunksize,
            blocksize,
            nchunks,
            codec,
            codec_level,
            filters,
            has_vlmetalayers: flags & FLAG_HAS_VLMETALAYERS != 0,
            sparse: flags & FLAG_SPARSE != 0,
            trailer_offset,
        })
    }
}

//! Frame trailer: vlmetalayer table, fixed-metalayer table, chunk index,
//! and footer magic (spec §4.5).
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/frame.rs`'s
//! msgpack-encoded trailer (`FRAME_TRAILER_*` constants), replaced with a
//! small explicit length-prefixed encoding since this crate carries no
//! msgpack dependency — the teacher's `serde`-adjacent stack
//! (`examples/Marcus0086-arx`) favors explicit binary framing over pulling
//! in a new serialization crate for one structure.

use crate::constants::FRAME_FOOTER_MAGIC;
use crate::error::{Error, Result};
use crate::meta::{MetalayerTable, VlMetalayerTable};

fn write_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_blob(out: &mut Vec<u8>, blob: &[u8]) {
    write_u32(out, blob.len() as u32);
    out.extend_from_slice(blob);
}

fn read_u32(src: &[u8], pos: &mut usize) -> Result<u32> {
    if *pos + 4 > src.len() {
        return Err(Error::InvalidFormat("trailer truncated reading u32".into()));
    }
    let v = u32::from_le_bytes(src[*pos..*pos + 4].try_into().unwrap());
    *pos += 4;
    Ok(v)
}

fn read_blob<'a>(src: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let len = read_u32(src, pos)? as usize;
    if *pos + len > src.len() {
        return Err(Error::InvalidFormat("trailer truncated reading blob".into()));
    }
    let blob = &src[*pos..*pos + len];
    *pos += len;
    Ok(blob)
}

/// Everything the trailer carries besides the chunk index itself.
#[derive(Clone, Debug, Default)]
pub struct Trailer {
    pub metalayers: MetalayerTable,
    pub vlmetalayers: VlMetalayerTable,
}

impl Trailer {
    /// Serializes metalayers, the chunk index, and the footer into one
    /// contiguous byte string, ready to be appended after the last chunk.
    pub fn serialize(&self, chunk_index: &[u64], total_frame_length: u64) -> Vec<u8> {
        let mut out = Vec::new();

        write_u32(&mut out, self.metalayers.len() as u32);
        for layer in self.metalayers.iter() {
            write_blob(&mut out, layer.name.as_bytes());
            write_blob(&mut out, &layer.content);
        }

        write_u32(&mut out, self.vlmetalayers.names().len() as u32);
        for (name, content) in self.vlmetalayers.iter() {
            write_blob(&mut out, name.as_bytes());
            write_blob(&mut out, content);
        }

        write_u32(&mut out, chunk_index.len() as u32);
        for &offset in chunk_index {
            out.extend_from_slice(&offset.to_le_bytes());
        }

        out.extend_from_slice(&FRAME_FOOTER_MAGIC);
        out.extend_from_slice(&total_frame_length.to_le_bytes());
        out
    }

    /// Parses a trailer previously produced by [`Trailer::serialize`],
    /// returning the trailer contents, the chunk index, and the recorded
    /// total frame length.
    pub fn deserialize(src: &[u8]) -> Result<(Self, Vec<u64>, u64)> {
        let mut pos = 0usize;

        let nmeta = read_u32(src, &mut pos)?;
        let mut metalayers = MetalayerTable::new();
        for _ in 0..nmeta {
            let name = String::from_utf8(read_blob(src, &mut pos)?.to_vec())
                .map_err(|_| Error::InvalidFormat("metalayer name is not valid utf-8".into()))?;
            let content = read_blob(src, &mut pos)?.to_vec();
            metalayers.set(&name, content)?;
        }

        let nvlmeta = read_u32(src, &mut pos)?;
        let mut vlmetalayers = VlMetalayerTable::new();
        for _ in 0..nvlmeta {
            let name = String::from_utf8(read_blob(src, &mut pos)?.to_vec())
                .map_err(|_| Error::InvalidFormat("vlmetalayer name is not valid utf-8".into()))?;
            let content = read_blob(src, &mut pos)?.to_vec();
            vlmetalayers.set(&name, content);
        }

        let nchunks = read_u32(src, &mut pos)? as usize;
        if pos + nchunks * 8 > src.len() {
            return Err(Error::InvalidFormat("trailer truncated reading chunk index".into()));
        }
        let mut chunk_index = Vec::with_capacity(nchunks);
        for _ in 0..nchunks {
            chunk_index.push(u64::from_le_bytes(src[pos..pos + 8].try_into().unwrap()));
            pos += 8;
        }

        if pos + 4 + 8 > src.len() || src[pos..pos + 4] != FRAME_FOOTER_MAGIC {
            return Err(Error::InvalidFormat("bad or missing frame footer magic".into()));
        }
        pos += 4;
        let total_frame_length = u64::from_le_bytes(src[pos..pos + 8].try_into().unwrap());

        Ok((
            Trailer {
                metalayers,
                vlmetalayers,
            },
            chunk_index,
            total_frame_length,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailer_round_trips_with_metalayers_and_index() {
        let mut trailer = Trailer::default();
        trailer.metalayers.set("b2nd", vec![1, 2, 3, 4]).unwrap();
        trailer.vlmetalayers.set("notes", b"hello".to_vec());

        let index = vec![100u64, 4200, 8300];
        let bytes = trailer.serialize(&index, 9999);

        let (parsed, parsed_index, total_len) = Trailer::deserialize(&bytes).unwrap();
        assert_eq!(parsed.metalayers.get("b2nd"), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(parsed.vlmetalayers.get("notes"), Some(&b"hello"[..]));
        assert_eq!(parsed_index, index);
        assert_eq!(total_len, 9999);
    }

    #[test]
    fn deserialize_rejects_missing_footer_magic() {
        let trailer = Trailer::default();
        let mut bytes = trailer.serialize(&[], 0);
        let len = bytes.len();
        bytes[len - 12] ^= 0xFF;
        assert!(Trailer::deserialize(&bytes).is_err());
    }
}

//! Frame container (C5): the binary layout holding a super-chunk's bytes,
//! either as one contiguous buffer/file or as a directory of per-chunk
//! files (spec §4.5/§6).
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/frame.rs` (header/
//! trailer/chunk-index shape) and `examples/keller-mark-blusc/src/blosc/
//! sframe.rs` (the `%08d.chunk` per-chunk-file naming for sparse frames,
//! here written out instead of stubbed since this crate targets a real
//! filesystem rather than WASM).

pub mod header;
pub mod trailer;

use crate::error::{Error, Result};
use crate::meta::{MetalayerTable, VlMetalayerTable};
use header::{FrameHeader, FRAME_HEADER_LENGTH};
use std::fs;
use std::path::{Path, PathBuf};
use trailer::Trailer;

/// How a frame's chunk bytes are physically stored.
pub enum Storage {
    /// Everything lives in one `Vec<u8>`, optionally backed by a file path
    /// to `save`/`open` from.
    Contiguous { buffer: Vec<u8>, path: Option<PathBuf> },
    /// One file per chunk under `dir`, named `{nchunk:08}.chunk`, plus the
    /// frame header/trailer in `dir/frame.b2frame`.
    Sparse { dir: PathBuf },
}

pub struct Frame {
    pub header: FrameHeader,
    pub trailer: Trailer,
    /// Absolute byte offset of each chunk's first byte (contiguous mode)
    /// or chunk number (sparse mode, matching spec §4.5's "file
    /// identifiers").
    chunk_index: Vec<u64>,
    storage: Storage,
}

const SPARSE_INDEX_FILE: &str = "frame.b2frame";

fn sparse_chunk_path(dir: &Path, nchunk: usize) -> PathBuf {
    dir.join(format!("{nchunk:08}.chunk"))
}

impl Frame {
    /// Creates a new, empty in-memory contiguous frame.
    pub fn new_in_memory(mut header: FrameHeader) -> Self {
        header.nchunks = 0;
        header.sparse = false;
        Frame {
            header,
            trailer: Trailer::default(),
            chunk_index: Vec::new(),
            storage: Storage::Contiguous {
                buffer: Vec::new(),
                path: None,
            },
        }
    }

    /// Creates a new, empty sparse frame rooted at `dir` (created if
    /// missing).
    pub fn new_sparse(mut header: FrameHeader, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        header.nchunks = 0;
        header.sparse = true;
        Ok(Frame {
            header,
            trailer: Trailer::default(),
            chunk_index: Vec::new(),
            storage: Storage::Sparse { dir },
        })
    }

    pub fn nchunks(&self) -> usize {
        self.chunk_index.len()
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self.storage, Storage::Sparse { .. })
    }

    /// Appends a chunk's already-compressed bytes at the end.
    pub fn append_chunk(&mut self, chunk_bytes: &[u8]) -> Result<()> {
        let nchunk = self.chunk_index.len();
        match &mut self.storage {
            Storage::Contiguous { buffer, .. } => {
                let offset = FRAME_HEADER_LENGTH as u64 + buffer.len() as u64;
                buffer.extend_from_slice(chunk_bytes);
                self.chunk_index.push(offset);
            }
            Storage::Sparse { dir } => {
                fs::write(sparse_chunk_path(dir, nchunk), chunk_bytes)?;
                self.chunk_index.push(nchunk as u64);
            }
        }
        self.header.nchunks += 1;
        Ok(())
    }

    /// Inserts a chunk at logical position `k`, shifting everything after
    /// it. `k` may equal `nchunks()` (equivalent to append).
    pub fn insert_chunk(&mut self, k: usize, chunk_bytes: &[u8]) -> Result<()> {
        if k > self.chunk_index.len() {
            return Err(Error::InvalidArgument(format!("insert index {k} out of range")));
        }
        if k == self.chunk_index.len() {
            return self.append_chunk(chunk_bytes);
        }

        match &self.storage {
            Storage::Contiguous { .. } => {
                let mut chunks: Vec<Vec<u8>> = (0..self.chunk_index.len()).map(|i| self.get_chunk_raw(i)).collect::<Result<_>>()?;
                chunks.insert(k, chunk_bytes.to_vec());
                self.rebuild_contiguous(chunks)?;
            }
            Storage::Sparse { dir } => {
                let dir = dir.clone();
                for i in (k..self.chunk_index.len()).rev() {
                    fs::rename(sparse_chunk_path(&dir, i), sparse_chunk_path(&dir, i + 1))?;
                }
                fs::write(sparse_chunk_path(&dir, k), chunk_bytes)?;
                self.chunk_index.insert(k, 0);
                self.renumber_sparse_index();
            }
        }
        self.header.nchunks += 1;
        Ok(())
    }

    /// Replaces chunk `k` in place (the frame may grow or shrink).
    pub fn update_chunk(&mut self, k: usize, chunk_bytes: &[u8]) -> Result<()> {
        if k >= self.chunk_index.len() {
            return Err(Error::InvalidArgument(format!("chunk index {k} out of range")));
        }
        match &self.storage {
            Storage::Contiguous { .. } => {
                let mut chunks: Vec<Vec<u8>> = (0..self.chunk_index.len()).map(|i| self.get_chunk_raw(i)).collect::<Result<_>>()?;
                chunks[k] = chunk_bytes.to_vec();
                self.rebuild_contiguous(chunks)?;
            }
            Storage::Sparse { dir } => {
                fs::write(sparse_chunk_path(dir, k), chunk_bytes)?;
            }
        }
        Ok(())
    }

    /// Removes chunk `k`, compacting the index.
    pub fn delete_chunk(&mut self, k: usize) -> Result<()> {
        if k >= self.chunk_index.len() {
            return Err(Error::InvalidArgument(format!("chunk index {k} out of range")));
        }
        match &self.storage {
            Storage::Contiguous { .. } => {
                let mut chunks: Vec<Vec<u8>> = (0..self.chunk_index.len()).map(|i| self.get_chunk_raw(i)).collect::<Result<_>>()?;
                chunks.remove(k);
                self.rebuild_contiguous(chunks)?;
            }
            Storage::Sparse { dir } => {
                let dir = dir.clone();
                fs::remove_file(sparse_chunk_path(&dir, k))?;
                for i in (k + 1)..self.chunk_index.len() {
                    fs::rename(sparse_chunk_path(&dir, i), sparse_chunk_path(&dir, i - 1))?;
                }
                self.chunk_index.pop();
                self.renumber_sparse_index();
            }
        }
        self.header.nchunks -= 1;
        Ok(())
    }

    /// Returns chunk `k`'s raw (still codec-compressed) bytes, exactly as
    /// [`crate::chunk::compress_chunk`] produced them.
    pub fn get_chunk_raw(&self, k: usize) -> Result<Vec<u8>> {
        if k >= self.chunk_index.len() {
            return Err(Error::InvalidArgument(format!("chunk index {k} out of range")));
        }
        match &self.storage {
            Storage::Contiguous { buffer, .. } => {
                let start = (self.chunk_index[k] - FRAME_HEADER_LENGTH as u64) as usize;
                let end = self
                    .chunk_index
                    .get(k + 1)
                    .map(|&o| (o - FRAME_HEADER_LENGTH as u64) as usize)
                    .unwrap_or(buffer.len());
                Ok(buffer[start..end].to_vec())
            }
            Storage::Sparse { dir } => Ok(fs::read(sparse_chunk_path(dir, k))?),
        }
    }

    fn renumber_sparse_index(&mut self) {
        for (i, slot) in self.chunk_index.iter_mut().enumerate() {
            *slot = i as u64;
        }
    }

    fn rebuild_contiguous(&mut self, chunks: Vec<Vec<u8>>) -> Result<()> {
        let mut buffer = Vec::new();
        let mut index = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            index.push(FRAME_HEADER_LENGTH as u64 + buffer.len() as u64);
            buffer.extend_from_slice(chunk);
        }
        self.chunk_index = index;
        self.header.nchunks = chunks.len() as u32;
        match &mut self.storage {
            Storage::Contiguous { buffer: b, .. } => *b = buffer,
            Storage::Sparse { .. } => unreachable!("rebuild_contiguous only used for Storage::Contiguous"),
        }
        Ok(())
    }

    pub fn set_meta(&mut self, name: &str, content: Vec<u8>) -> Result<()> {
        if !self.chunk_index.is_empty() {
            return Err(Error::InvalidArgument(
                "fixed metalayers must be registered before the first chunk is written".into(),
            ));
        }
        self.trailer.metalayers.set(name, content)
    }

    pub fn get_meta(&self, name: &str) -> Option<&[u8]> {
        self.trailer.metalayers.get(name)
    }

    pub fn metalayers(&self) -> &MetalayerTable {
        &self.trailer.metalayers
    }

    pub fn set_vlmeta(&mut self, name: &str, content: Vec<u8>) {
        self.header.has_vlmetalayers = true;
        self.trailer.vlmetalayers.set(name, content);
    }

    pub fn get_vlmeta(&self, name: &str) -> Option<&[u8]> {
        self.trailer.vlmetalayers.get(name)
    }

    pub fn del_vlmeta(&mut self, name: &str) -> Result<()> {
        self.trailer.vlmetalayers.del(name)
    }

    pub fn vlmetalayers(&self) -> &VlMetalayerTable {
        &self.trailer.vlmetalayers
    }

    /// Serializes this frame (contiguous mode only) as a single byte
    /// buffer: header, chunk bodies, trailer, footer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let Storage::Contiguous { buffer, .. } = &self.storage else {
            return Err(Error::Unsupported("to_bytes is only defined for contiguous frames".into()));
        };
        let mut header = self.header.clone();
        let trailer_offset = FRAME_HEADER_LENGTH as u64 + buffer.len() as u64;
        header.trailer_offset = trailer_offset;

        let mut out = vec![0u8; FRAME_HEADER_LENGTH];
        out.extend_from_slice(buffer);
        // The trailer's own serialized length doesn't depend on the
        // recorded total length, so one pass is enough: serialize once to
        // learn its size, then patch the header and re-emit the trailer.
        let trailer_bytes = self.trailer.serialize(&self.chunk_index, 0);
        let total_len = out.len() as u64 + trailer_bytes.len() as u64;
        header.write_to(&mut out[..FRAME_HEADER_LENGTH])?;
        let trailer_bytes = self.trailer.serialize(&self.chunk_index, total_len);
        out.extend_from_slice(&trailer_bytes);
        Ok(out)
    }

    /// Writes this frame to `path` (contiguous mode) as a single file.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path.as_ref(), &bytes)?;
        if let Storage::Contiguous { path: p, .. } = &mut self.storage {
            *p = Some(path.as_ref().to_path_buf());
        }
        Ok(())
    }

    /// Reopens a contiguous frame previously written by [`Frame::save`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let header = FrameHeader::read_from(&bytes)?;
        let trailer_start = header.trailer_offset as usize;
        if trailer_start > bytes.len() {
            return Err(Error::InvalidFormat("trailer offset past end of frame".into()));
        }
        let (trailer, chunk_index, _total_len) = Trailer::deserialize(&bytes[trailer_start..])?;
        let buffer = bytes[FRAME_HEADER_LENGTH..trailer_start].to_vec();
        Ok(Frame {
            header,
            trailer,
            chunk_index,
            storage: Storage::Contiguous {
                buffer,
                path: Some(path.as_ref().to_path_buf()),
            },
        })
    }

    /// Reopens a sparse frame previously written by [`Frame::new_sparse`]
    /// plus a `save_sparse` call (index metadata lives in
    /// `dir/frame.b2frame`).
    pub fn open_sparse(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let index_bytes = fs::read(dir.join(SPARSE_INDEX_FILE))?;
        let header = FrameHeader::read_from(&index_bytes)?;
        let trailer_start = header.trailer_offset as usize;
        let (trailer, chunk_index, _total_len) = Trailer::deserialize(&index_bytes[trailer_start..])?;
        Ok(Frame {
            header,
            trailer,
            chunk_index,
            storage: Storage::Sparse { dir },
        })
    }

    /// Persists a sparse frame's header/trailer/index (chunk bodies are
    /// already on disk, one file per chunk).
    pub fn save_sparse(&mut self) -> Result<()> {
        let Storage::Sparse { dir } = &self.storage else {
            return Err(Error::Unsupported("save_sparse is only defined for sparse frames".into()));
        };
        let mut header = self.header.clone();
        header.trailer_offset = FRAME_HEADER_LENGTH as u64;
        let mut out = vec![0u8; FRAME_HEADER_LENGTH];
        header.write_to(&mut out)?;
        let trailer_bytes = self.trailer.serialize(&self.chunk_index, 0);
        out.extend_from_slice(&trailer_bytes);
        fs::write(dir.join(SPARSE_INDEX_FILE), &out)?;
        Ok(())
    }
}

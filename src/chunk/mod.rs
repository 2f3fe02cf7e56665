//! Chunk engine (C4): splits a chunk buffer into blocks, compresses them in
//! parallel, and reassembles the chunk body and block-offset table.
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/blosc2.rs`'s serial
//! per-block compress loop for the pipeline contract, and on
//! `examples/jafreck-lz4r/src/io/compress_mt.rs`'s rayon-based worker
//! dispatch for the thread-pool shape (bounded pool, shared cancellation)
//! — generalized here to per-block, not per-file-chunk, units of work.

pub mod header;

use crate::codecs::{CodecId, CodecRegistry};
use crate::constants::BLOCK_HEADER_LENGTH;
use crate::error::{Error, Result};
use crate::filters::{FilterChain, FilterContext, FilterRegistry};
use crate::pipeline::{self, BlockHeader, BlockPipelineParams};
use header::ChunkHeader;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Configuration a chunk compress/decompress call needs, independent of any
/// one chunk's bytes.
pub struct ChunkParams<'a> {
    pub filters: &'a FilterChain,
    pub filter_registry: &'a FilterRegistry,
    pub codec: CodecId,
    pub codec_level: i32,
    pub codec_registry: &'a CodecRegistry,
    pub min_stream_size: usize,
    pub item_width: usize,
    /// N-d shape of a single block, used uniformly for every block in this
    /// chunk (the input buffer is expected already padded to `extchunkshape`
    /// by the caller, per spec §4.7).
    pub block_shape: Vec<usize>,
    pub blocksize: usize,
    pub nthreads: usize,
}

fn pipeline_params<'a>(p: &'a ChunkParams) -> BlockPipelineParams<'a> {
    BlockPipelineParams {
        filters: p.filters,
        filter_registry: p.filter_registry,
        codec: p.codec,
        codec_level: p.codec_level,
        codec_registry: p.codec_registry,
        min_stream_size: p.min_stream_size,
    }
}

/// Compresses `data` (one chunk's worth of raw, already-padded bytes) into
/// a self-describing chunk: header, block-offset table, then block bodies.
pub fn compress_chunk(data: &[u8], params: &ChunkParams) -> Result<Vec<u8>> {
    if params.blocksize == 0 {
        return Err(Error::InvalidArgument("blocksize must be positive".into()));
    }
    let blocks: Vec<&[u8]> = data.chunks(params.blocksize).collect();
    let nblocks = blocks.len();

    let pp = pipeline_params(params);
    let ctx = FilterContext {
        item_width: params.item_width,
        block_shape: &params.block_shape,
        reference_block: if blocks.is_empty() { None } else { Some(blocks[0]) },
    };

    let cancelled = AtomicBool::new(false);
    let first_error: Mutex<Option<Error>> = Mutex::new(None);

    let run_one = |block: &&[u8]| -> Option<(BlockHeader, Vec<u8>)> {
        if cancelled.load(Ordering::Relaxed) {
            return None;
        }
        // Delta needs the chunk's first decompressed block as reference;
        // every block after the first sees it, the first sees `None`.
        let per_block_ctx = FilterContext {
            item_width: ctx.item_width,
            block_shape: ctx.block_shape,
            reference_block: ctx.reference_block,
        };
        match pipeline::compress_block(block, &per_block_ctx, &pp) {
            Ok(result) => Some(result),
            Err(e) => {
                cancelled.store(true, Ordering::Relaxed);
                let mut slot = first_error.lock().unwrap();
                if slot.is_none() {
                    *slot = Some(e);
                }
                None
            }
        }
    };

    let results: Vec<Option<(BlockHeader, Vec<u8>)>> = if params.nthreads <= 1 {
        blocks.iter().map(run_one).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.nthreads)
            .build()
            .map_err(|e| Error::OutOfMemory(format!("failed to build worker pool: {e}")))?;
        pool.install(|| blocks.par_iter().map(run_one).collect())
    };

    if let Some(err) = first_error.into_inner().unwrap() {
        return Err(err);
    }
    let results: Vec<(BlockHeader, Vec<u8>)> = results.into_iter().collect::<Option<Vec<_>>>().ok_or_else(|| {
        Error::CompressionFailure("chunk compression cancelled before completion".into())
    })?;

    let header_placeholder = ChunkHeader {
        nbytes: data.len() as u32,
        blocksize: params.blocksize as u32,
        cbytes: 0,
        codec: params.codec,
        codec_level: params.codec_level,
        typesize: params.item_width as u32,
        filters: params.filters.clone(),
        nblocks: nblocks as u32,
    };

    let offset_table_len = 4 * nblocks;
    let header_len = crate::constants::CHUNK_HEADER_LENGTH;
    let mut body_len = 0usize;
    for (_, body) in &results {
        body_len += BLOCK_HEADER_LENGTH + body.len();
    }

    let mut out = vec![0u8; header_len + offset_table_len + body_len];
    let mut offsets = Vec::with_capacity(nblocks);
    let mut cursor = header_len + offset_table_len;
    for (block_header, body) in &results {
        offsets.push(cursor as u32);
        block_header.write_to(&mut out[cursor..cursor + BLOCK_HEADER_LENGTH]);
        out[cursor + BLOCK_HEADER_LENGTH..cursor + BLOCK_HEADER_LENGTH + body.len()].copy_from_slice(body);
        cursor += BLOCK_HEADER_LENGTH + body.len();
    }
    for (i, off) in offsets.iter().enumerate() {
        out[header_len + i * 4..header_len + i * 4 + 4].copy_from_slice(&off.to_le_bytes());
    }

    let mut final_header = header_placeholder;
    final_header.cbytes = cursor as u32;
    final_header.write_to(&mut out[0..header_len])?;

    Ok(out)
}

/// Decompresses a self-describing chunk produced by [`compress_chunk`].
/// `block_shape` must match what `compress_chunk` used if the chunk's
/// filter chain includes a shape-aware filter (`ndcell`/`ndmean`).
pub fn decompress_chunk(chunk: &[u8], block_shape: &[usize], registries: (&FilterRegistry, &CodecRegistry)) -> Result<Vec<u8>> {
    let header = ChunkHeader::read_from(chunk)?;
    let (filter_registry, codec_registry) = registries;
    let header_len = crate::constants::CHUNK_HEADER_LENGTH;
    let nblocks = header.nblocks as usize;
    let offset_table_len = 4 * nblocks;
    if chunk.len() < header_len + offset_table_len {
        return Err(Error::InvalidFormat("chunk truncated before offset table".into()));
    }
    let mut offsets = Vec::with_capacity(nblocks);
    for i in 0..nblocks {
        let off = u32::from_le_bytes(
            chunk[header_len + i * 4..header_len + i * 4 + 4]
                .try_into()
                .unwrap(),
        );
        offsets.push(off as usize);
    }

    let pp = BlockPipelineParams {
        filters: &header.filters,
        filter_registry,
        codec: header.codec,
        codec_level: header.codec_level,
        codec_registry,
        min_stream_size: 0,
    };

    let mut out = Vec::with_capacity(header.nbytes as usize);
    let mut first_block: Option<Vec<u8>> = None;
    for (i, &start) in offsets.iter().enumerate() {
        if start + BLOCK_HEADER_LENGTH > chunk.len() {
            return Err(Error::InvalidFormat("block offset out of range".into()));
        }
        let block_header = BlockHeader::read_from(&chunk[start..])?;
        let body_start = start + BLOCK_HEADER_LENGTH;
        let stored_len = if block_header.is_raw() {
            block_header.length as usize
        } else {
            let next = offsets.get(i + 1).copied().unwrap_or(chunk.len());
            next - body_start
        };
        if body_start + stored_len > chunk.len() {
            return Err(Error::InvalidFormat("block body out of range".into()));
        }
        let body = &chunk[body_start..body_start + stored_len];

        let ctx = FilterContext {
            item_width: header.typesize as usize,
            block_shape,
            reference_block: first_block.as_deref(),
        };
        let decompressed = pipeline::decompress_block(block_header, body, &ctx, &pp)?;
        if i == 0 {
            first_block = Some(decompressed.clone());
        }
        out.extend_from_slice(&decompressed);
    }

    Ok(out)
}

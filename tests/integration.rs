//! End-to-end scenarios (spec §8): whole compress/decompress, frame
//! save/reopen, and super-chunk/array round trips exercised through the
//! public API rather than any one module's internals.
//!
//! Grounded on the teacher's own top-level round-trip style
//! (`examples/keller-mark-blusc`'s `tests/` directory) and
//! `examples/jafreck-lz4r`'s `e2e/` layout for keeping whole-pipeline
//! checks separate from unit tests.

use ndpack::chunk::{self, ChunkParams};
use ndpack::codecs::CodecRegistry;
use ndpack::context::{CompressionParams, Runtime};
use ndpack::filters::FilterRegistry;
use ndpack::{Array, CodecId, FilterChain, FilterId, SChunk};
use rand::Rng;
use tempfile::tempdir;

fn chunk_params<'a>(
    filters: &'a FilterChain,
    filter_registry: &'a FilterRegistry,
    codec: CodecId,
    codec_level: i32,
    codec_registry: &'a CodecRegistry,
    item_width: usize,
    blocksize: usize,
    nthreads: usize,
) -> ChunkParams<'a> {
    ChunkParams {
        filters,
        filter_registry,
        codec,
        codec_level,
        codec_registry,
        min_stream_size: ndpack::constants::DEFAULT_MIN_STREAM_SIZE,
        item_width,
        block_shape: vec![blocksize / item_width],
        blocksize,
        nthreads,
    }
}

#[test]
fn scenario1_random_256kib_int32_round_trips() {
    let mut rng = rand::rng();
    let data: Vec<u8> = (0..256 * 1024).map(|_| rng.random::<u8>()).collect();

    let filters = FilterChain::new();
    let filter_registry = FilterRegistry::default();
    let codec_registry = CodecRegistry::default();
    let params = chunk_params(&filters, &filter_registry, CodecId::BloscLz, 5, &codec_registry, 4, 32 * 1024, 1);

    let compressed = chunk::compress_chunk(&data, &params).unwrap();
    let decompressed = chunk::decompress_chunk(&compressed, &params.block_shape, (&filter_registry, &codec_registry)).unwrap();
    assert_eq!(decompressed, data);
}

#[test]
fn scenario2_constant_f64_shuffle_zstd_hits_high_ratio() {
    let value: f64 = 3.14;
    let item_bytes = value.to_le_bytes();
    let data: Vec<u8> = item_bytes.iter().cycle().take(1024 * 1024).copied().collect();

    let mut filters = FilterChain::new();
    filters.push(FilterId::Shuffle, 0).unwrap();
    let filter_registry = FilterRegistry::default();
    let codec_registry = CodecRegistry::default();
    let params = chunk_params(&filters, &filter_registry, CodecId::Zstd, 9, &codec_registry, 8, 128 * 1024, 4);

    let compressed = chunk::compress_chunk(&data, &params).unwrap();
    let ratio = data.len() as f64 / compressed.len() as f64;
    assert!(ratio >= 100.0, "expected ratio >= 100, got {ratio}");

    let decompressed = chunk::decompress_chunk(&compressed, &params.block_shape, (&filter_registry, &codec_registry)).unwrap();
    assert_eq!(decompressed, data);
}

#[test]
fn scenario3_3d_array_write_reopen_slice() {
    let shape = vec![40usize, 55, 23];
    let chunkshape = vec![31usize, 5, 22];
    let blockshape = vec![4usize, 4, 4];
    let n: usize = shape.iter().product();
    let data: Vec<u8> = (0..n as u32).flat_map(|i| i.to_le_bytes()).collect();

    let runtime = Runtime::new();
    let mut array = Array::from_buffer(runtime.clone(), CodecId::Lz4, 3, FilterChain::new(), 4, shape.clone(), chunkshape, blockshape, &data).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("cube.ndpack");
    array.save(&path).unwrap();
    let reopened = Array::open(runtime, &path).unwrap();
    assert_eq!(reopened.shape(), shape.as_slice());

    let slice = reopened.get_slice(&[5, 0, 0], &[9, 55, 23]).unwrap();
    let read_u32 = |buf: &[u8], idx: usize| u32::from_le_bytes(buf[idx * 4..idx * 4 + 4].try_into().unwrap());

    let mut out_idx = 0usize;
    for i in 5..9 {
        for j in 0..55 {
            for k in 0..23 {
                let expected = (i * 55 * 23 + j * 23 + k) as u32;
                assert_eq!(read_u32(&slice, out_idx), expected, "mismatch at ({i},{j},{k})");
                out_idx += 1;
            }
        }
    }
}

#[test]
fn scenario4_append_then_delete_preserves_order() {
    let mut cparams = CompressionParams::new(CodecId::BloscLz, 3, 4);
    cparams.filters.push(FilterId::Shuffle, 0).unwrap();
    let mut sc = SChunk::new_in_memory(Runtime::new(), cparams, 64);

    for v in 0u8..10 {
        sc.append_chunk(&[v; 64]).unwrap();
    }
    sc.delete_chunk(4).unwrap();

    assert_eq!(sc.nchunks(), 9);
    let expected_order: [u8; 9] = [0, 1, 2, 3, 5, 6, 7, 8, 9];
    for (k, &v) in expected_order.iter().enumerate() {
        assert_eq!(sc.get_chunk(k).unwrap(), vec![v; 64]);
    }
}

#[test]
fn scenario5_insert_grows_shape_and_shifts_data() {
    let shape = vec![20usize];
    let chunkshape = vec![8usize];
    let blockshape = vec![4usize];
    let data: Vec<u8> = (0..20u32).flat_map(|i| i.to_le_bytes()).collect();

    let runtime = Runtime::new();
    let mut array = Array::from_buffer(runtime, CodecId::Zstd, 5, FilterChain::new(), 4, shape, chunkshape, blockshape, &data).unwrap();

    let fill = vec![0u8; 7 * 4];
    array.insert(&fill, 0, 14, 7).unwrap();
    assert_eq!(array.shape(), &[27]);

    let inserted = array.get_slice(&[14], &[21]).unwrap();
    assert!(inserted.iter().all(|&b| b == 0));

    let tail_original = array.get_slice(&[21], &[27]).unwrap();
    let read_u32 = |buf: &[u8], idx: usize| u32::from_le_bytes(buf[idx * 4..idx * 4 + 4].try_into().unwrap());
    for (idx, expected) in (14u32..20).enumerate() {
        assert_eq!(read_u32(&tail_original, idx), expected);
    }

    let head_original = array.get_slice(&[0], &[14]).unwrap();
    for i in 0..14 {
        assert_eq!(read_u32(&head_original, i), i as u32);
    }
}

#[test]
fn scenario6_vlmetalayer_update_then_reopen_is_last_writer_wins() {
    let mut cparams = CompressionParams::new(CodecId::BloscLz, 3, 4);
    cparams.filters.push(FilterId::Shuffle, 0).unwrap();
    let mut sc = SChunk::new_in_memory(Runtime::new(), cparams, 32);
    sc.append_chunk(&[7u8; 32]).unwrap();

    sc.set_vlmeta("tag", vec![0x05, 0x06]);
    sc.set_vlmeta("tag", vec![0xFFu8; 16]);

    let dir = tempdir().unwrap();
    let path = dir.path().join("vl.ndpack");
    sc.save(&path).unwrap();

    let reopened = ndpack::Frame::open(&path).unwrap();
    assert_eq!(reopened.get_vlmeta("tag"), Some(&vec![0xFFu8; 16][..]));
}

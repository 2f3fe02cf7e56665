//! Benchmark CLI (spec §6): drives the library's compress/decompress path
//! over synthetic buffers and reports ratio and throughput.
//!
//! Grounded on `examples/jafreck-lz4r`'s benchmark-mode argument surface
//! (codec/filter/thread-count/block-size flags, 0/1/2 exit codes), here
//! built with `clap` derive instead of the teacher's hand-rolled argv
//! scanner since this crate already carries `clap` for its own surface.

use clap::{Parser, ValueEnum};
use ndpack::{chunk, codecs::CodecRegistry, filters::FilterRegistry};
use ndpack::{CodecId, FilterChain, FilterId};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CodecArg {
    Blosclz,
    Lz4,
    Zlib,
    Zstd,
    Experimental,
}

impl From<CodecArg> for CodecId {
    fn from(c: CodecArg) -> Self {
        match c {
            CodecArg::Blosclz => CodecId::BloscLz,
            CodecArg::Lz4 => CodecId::Lz4,
            CodecArg::Zlib => CodecId::Zlib,
            CodecArg::Zstd => CodecId::Zstd,
            CodecArg::Experimental => CodecId::Experimental,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FilterArg {
    None,
    Shuffle,
    Bitshuffle,
    Delta,
    Truncprec,
    Bytedelta,
}

impl From<FilterArg> for FilterId {
    fn from(f: FilterArg) -> Self {
        match f {
            FilterArg::None => FilterId::None,
            FilterArg::Shuffle => FilterId::Shuffle,
            FilterArg::Bitshuffle => FilterId::BitShuffle,
            FilterArg::Delta => FilterId::Delta,
            FilterArg::Truncprec => FilterId::TruncPrec,
            FilterArg::Bytedelta => FilterId::ByteDelta,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Suite {
    /// One codec/filter combination, as given on the command line.
    Single,
    /// Every built-in codec at its default level, no filter.
    Suite,
    /// Every built-in codec at level 9.
    Hardsuite,
    /// Every built-in codec at level 9 crossed with shuffle and bitshuffle.
    Extremesuite,
    /// BloscLz only, small buffer; fast sanity check.
    Debugsuite,
}

#[derive(Parser, Debug)]
#[command(name = "ndpack-bench", about = "Benchmarks ndpack codec/filter combinations")]
struct Cli {
    /// Codec to benchmark when --suite=single.
    #[arg(long, value_enum, default_value = "zstd")]
    codec: CodecArg,

    /// Filter to benchmark when --suite=single.
    #[arg(long, value_enum, default_value = "shuffle")]
    filter: FilterArg,

    #[arg(long, value_enum, default_value = "single")]
    suite: Suite,

    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Total buffer size in bytes.
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    buffer_size: usize,

    /// Item width in bytes.
    #[arg(long, default_value_t = 4)]
    item_size: usize,

    /// Significant bits kept by the truncate-precision filter, when used.
    #[arg(long, default_value_t = 0)]
    sig_bits: u8,

    /// Compression level, 1..=9, used outside suite runs that sweep it.
    #[arg(long, default_value_t = 5)]
    level: i32,
}

struct Case {
    codec: CodecId,
    level: i32,
    filter: FilterId,
}

fn cases_for(cli: &Cli) -> Vec<Case> {
    let all_codecs = [CodecId::BloscLz, CodecId::Lz4, CodecId::Zlib, CodecId::Zstd, CodecId::Experimental];
    match cli.suite {
        Suite::Single => vec![Case {
            codec: cli.codec.into(),
            level: cli.level,
            filter: cli.filter.into(),
        }],
        Suite::Suite => all_codecs
            .iter()
            .map(|&codec| Case { codec, level: 5, filter: FilterId::None })
            .collect(),
        Suite::Hardsuite => all_codecs
            .iter()
            .map(|&codec| Case { codec, level: 9, filter: FilterId::None })
            .collect(),
        Suite::Extremesuite => all_codecs
            .iter()
            .flat_map(|&codec| {
                [FilterId::Shuffle, FilterId::BitShuffle]
                    .into_iter()
                    .map(move |filter| Case { codec, level: 9, filter })
            })
            .collect(),
        Suite::Debugsuite => vec![Case {
            codec: CodecId::BloscLz,
            level: 1,
            filter: FilterId::Shuffle,
        }],
    }
}

fn synthetic_buffer(len: usize, item_width: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    for (i, item) in buf.chunks_mut(item_width.max(1)).enumerate() {
        let v = (i % 65536) as u32;
        let bytes = v.to_le_bytes();
        for (b, src) in item.iter_mut().zip(bytes.iter().cycle()) {
            *b = *src;
        }
    }
    buf
}

fn run_case(buf: &[u8], threads: usize, item_width: usize, sig_bits: u8, case: &Case) -> Result<(), ndpack::Error> {
    let mut filters = FilterChain::new();
    if case.filter != FilterId::None {
        let meta = if case.filter == FilterId::TruncPrec { sig_bits } else { 0 };
        filters.push(case.filter, meta)?;
    }

    let blocksize = ndpack::constants::DEFAULT_BLOCKSIZE.min(buf.len().max(1));
    let filter_registry = FilterRegistry::default();
    let codec_registry = CodecRegistry::default();
    let params = chunk::ChunkParams {
        filters: &filters,
        filter_registry: &filter_registry,
        codec: case.codec,
        codec_level: case.level,
        codec_registry: &codec_registry,
        min_stream_size: ndpack::constants::DEFAULT_MIN_STREAM_SIZE,
        item_width,
        block_shape: vec![blocksize / item_width.max(1)],
        blocksize,
        nthreads: threads,
    };

    let t0 = Instant::now();
    let compressed = chunk::compress_chunk(buf, &params)?;
    let compress_elapsed = t0.elapsed();

    let t1 = Instant::now();
    let decompressed = chunk::decompress_chunk(&compressed, &params.block_shape, (&filter_registry, &codec_registry))?;
    let decompress_elapsed = t1.elapsed();

    if decompressed != buf {
        return Err(ndpack::Error::CompressionFailure(
            "round trip mismatch during benchmark".into(),
        ));
    }

    let ratio = buf.len() as f64 / compressed.len().max(1) as f64;
    let compress_mb_s = (buf.len() as f64 / (1024.0 * 1024.0)) / compress_elapsed.as_secs_f64().max(1e-9);
    let decompress_mb_s = (buf.len() as f64 / (1024.0 * 1024.0)) / decompress_elapsed.as_secs_f64().max(1e-9);

    println!(
        "codec={:?} level={} filter={:?} ratio={:.3} compress={:.1}MB/s decompress={:.1}MB/s",
        case.codec, case.level, case.filter, ratio, compress_mb_s, decompress_mb_s
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };
    if cli.threads == 0 {
        eprintln!("error: --threads must be at least 1");
        return ExitCode::from(1);
    }
    if cli.item_size == 0 {
        eprintln!("error: --item-size must be at least 1");
        return ExitCode::from(1);
    }

    let buf = synthetic_buffer(cli.buffer_size, cli.item_size);
    for case in cases_for(&cli) {
        if let Err(e) = run_case(&buf, cli.threads, cli.item_size, cli.sig_bits, &case) {
            match e {
                ndpack::Error::Unsupported(msg) => {
                    eprintln!("error: unsupported codec/filter combination: {msg}");
                    return ExitCode::from(2);
                }
                other => {
                    eprintln!("error: {other}");
                    return ExitCode::from(1);
                }
            }
        }
    }
    ExitCode::SUCCESS
}

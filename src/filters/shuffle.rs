//! Byte shuffle: transpose at item granularity so that bytes of equal
//! significance across items become contiguous.
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/shuffle_generic.rs`;
//! the indexing scheme (`dest[j*n + i] = src[i*w + j]`) is kept verbatim,
//! only rewritten to operate on owned slices without raw pointer casts.

use crate::error::{Error, Result};

/// `forward(src, dst)` where `src.len() == dst.len()` and `item_width >= 1`.
/// Any trailing bytes that don't form a whole item are copied unshuffled.
pub fn forward(src: &[u8], dst: &mut [u8], item_width: usize) -> Result<()> {
    check_lengths(src, dst, item_width)?;
    let n = src.len() / item_width;
    let leftover = src.len() % item_width;

    for j in 0..item_width {
        for i in 0..n {
            dst[j * n + i] = src[i * item_width + j];
        }
    }
    let start = src.len() - leftover;
    dst[start..].copy_from_slice(&src[start..]);
    Ok(())
}

pub fn backward(src: &[u8], dst: &mut [u8], item_width: usize) -> Result<()> {
    check_lengths(src, dst, item_width)?;
    let n = src.len() / item_width;
    let leftover = src.len() % item_width;

    for i in 0..n {
        for j in 0..item_width {
            dst[i * item_width + j] = src[j * n + i];
        }
    }
    let start = src.len() - leftover;
    dst[start..].copy_from_slice(&src[start..]);
    Ok(())
}

fn check_lengths(src: &[u8], dst: &[u8], item_width: usize) -> Result<()> {
    if item_width == 0 {
        return Err(Error::FilterFailure("shuffle: item_width must be >= 1".into()));
    }
    if src.len() != dst.len() {
        return Err(Error::FilterFailure("shuffle: src/dst length mismatch".into()));
    }
    Ok(())
}

//! Chunk-level delta: every block but the first is replaced by its
//! element-wise difference from the chunk's first decompressed block
//! (spec §4.1, "Delta").
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/delta.rs`'s reference-
//! block scheme, but expressed as plain wrapping arithmetic per item
//! (via [`super::arith`]) instead of XOR over raw pointer casts.

use super::arith::{add_le, sub_le};
use crate::error::{Error, Result};

/// `reference` is `None` for the chunk's first block (left untouched) and
/// `Some(first_decompressed_block)` for every later block.
pub fn forward(src: &[u8], dst: &mut [u8], item_width: usize, reference: Option<&[u8]>) -> Result<()> {
    check(src, dst, item_width)?;
    let Some(reference) = reference else {
        dst.copy_from_slice(src);
        return Ok(());
    };
    if reference.len() != src.len() {
        return Err(Error::FilterFailure(
            "delta: reference block length mismatch".into(),
        ));
    }
    for (chunk_src, (chunk_ref, chunk_dst)) in src
        .chunks(item_width)
        .zip(reference.chunks(item_width).zip(dst.chunks_mut(item_width)))
    {
        sub_le(chunk_src, chunk_ref, chunk_dst);
    }
    Ok(())
}

pub fn backward(src: &[u8], dst: &mut [u8], item_width: usize, reference: Option<&[u8]>) -> Result<()> {
    check(src, dst, item_width)?;
    let Some(reference) = reference else {
        dst.copy_from_slice(src);
        return Ok(());
    };
    if reference.len() != src.len() {
        return Err(Error::FilterFailure(
            "delta: reference block length mismatch".into(),
        ));
    }
    for (chunk_src, (chunk_ref, chunk_dst)) in src
        .chunks(item_width)
        .zip(reference.chunks(item_width).zip(dst.chunks_mut(item_width)))
    {
        add_le(chunk_src, chunk_ref, chunk_dst);
    }
    Ok(())
}

fn check(src: &[u8], dst: &[u8], item_width: usize) -> Result<()> {
    if item_width == 0 {
        return Err(Error::FilterFailure("delta: item_width must be >= 1".into()));
    }
    if src.len() != dst.len() {
        return Err(Error::FilterFailure("delta: src/dst length mismatch".into()));
    }
    if src.len() % item_width != 0 {
        return Err(Error::FilterFailure(
            "delta: block length must be a multiple of item_width".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_block_is_untouched() {
        let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut dst = vec![0u8; src.len()];
        forward(&src, &mut dst, 4, None).unwrap();
        assert_eq!(dst, src);
        let mut restored = vec![0u8; src.len()];
        backward(&dst, &mut restored, 4, None).unwrap();
        assert_eq!(restored, src);
    }

    #[test]
    fn later_block_round_trips_against_reference() {
        let reference = vec![10u8, 0, 0, 0, 20, 0, 0, 0];
        let src = vec![13u8, 0, 0, 0, 15, 0, 0, 0];
        let mut delta = vec![0u8; src.len()];
        forward(&src, &mut delta, 4, Some(&reference)).unwrap();
        assert_ne!(delta, src);
        let mut restored = vec![0u8; src.len()];
        backward(&delta, &mut restored, 4, Some(&reference)).unwrap();
        assert_eq!(restored, src);
    }
}

//! Bit shuffle: transpose at the bit level, gathering the k-th bit of every
//! item in a stripe into contiguous output positions.
//!
//! The production bitshuffle algorithm (see
//! `examples/keller-mark-blusc/src/blosc/bitshuffle_generic.rs`) uses an
//! 8x8-at-a-time XOR transpose trick for speed; this is a scalar
//! bit-gather that implements the same *contract* (spec §4.1) without the
//! SIMD-oriented bookkeeping — the filter chain only requires it be
//! reversible, not that it match the teacher's byte layout bit-for-bit.

use crate::error::{Error, Result};

/// Number of items processed together; bitshuffle only operates on whole
/// stripes (a multiple of 8 items). Leftover items are copied unshuffled.
const STRIPE_ITEMS: usize = 8;

pub fn forward(src: &[u8], dst: &mut [u8], item_width: usize) -> Result<()> {
    check(src, dst, item_width)?;
    let n_items = src.len() / item_width;
    let n_stripable = n_items - (n_items % STRIPE_ITEMS);
    let stripable_bytes = n_stripable * item_width;

    dst[..stripable_bytes].fill(0);
    let groups = n_stripable / STRIPE_ITEMS;
    for p in 0..item_width {
        for b in 0..8u8 {
            let stream = p * 8 + b as usize;
            let stream_base = stream * groups;
            for g in 0..groups {
                let mut out_byte = 0u8;
                for k in 0..STRIPE_ITEMS {
                    let item = g * STRIPE_ITEMS + k;
                    let byte = src[item * item_width + p];
                    let bit = (byte >> b) & 1;
                    out_byte |= bit << k;
                }
                dst[stream_base + g] = out_byte;
            }
        }
    }

    let leftover_start = stripable_bytes;
    dst[leftover_start..].copy_from_slice(&src[leftover_start..]);
    Ok(())
}

pub fn backward(src: &[u8], dst: &mut [u8], item_width: usize) -> Result<()> {
    check(src, dst, item_width)?;
    let n_items = src.len() / item_width;
    let n_stripable = n_items - (n_items % STRIPE_ITEMS);
    let stripable_bytes = n_stripable * item_width;

    dst[..stripable_bytes].fill(0);
    let groups = n_stripable / STRIPE_ITEMS;
    for p in 0..item_width {
        for b in 0..8u8 {
            let stream = p * 8 + b as usize;
            let stream_base = stream * groups;
            for g in 0..groups {
                let in_byte = src[stream_base + g];
                for k in 0..STRIPE_ITEMS {
                    let bit = (in_byte >> k) & 1;
                    let item = g * STRIPE_ITEMS + k;
                    dst[item * item_width + p] |= bit << b;
                }
            }
        }
    }

    let leftover_start = stripable_bytes;
    dst[leftover_start..].copy_from_slice(&src[leftover_start..]);
    Ok(())
}

fn check(src: &[u8], dst: &[u8], item_width: usize) -> Result<()> {
    if item_width == 0 {
        return Err(Error::FilterFailure("bitshuffle: item_width must be >= 1".into()));
    }
    if src.len() != dst.len() {
        return Err(Error::FilterFailure("bitshuffle: src/dst length mismatch".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_full_stripes() {
        let src: Vec<u8> = (0u8..=255).cycle().take(256).collect();
        for &w in &[1usize, 2, 4, 8] {
            let mut shuffled = vec![0u8; src.len()];
            forward(&src, &mut shuffled, w).unwrap();
            let mut restored = vec![0u8; src.len()];
            backward(&shuffled, &mut restored, w).unwrap();
            assert_eq!(restored, src, "item_width={w}");
        }
    }

    #[test]
    fn round_trips_with_partial_stripe() {
        // 13 u32 items: not a multiple of 8, exercises the leftover path.
        let n_items = 13;
        let item_width = 4;
        let src: Vec<u8> = (0u8..(n_items * item_width) as u8).collect();
        let mut shuffled = vec![0u8; src.len()];
        forward(&src, &mut shuffled, item_width).unwrap();
        let mut restored = vec![0u8; src.len()];
        backward(&shuffled, &mut restored, item_width).unwrap();
        assert_eq!(restored, src);
    }
}

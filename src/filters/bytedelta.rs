//! Byte-delta: split a block into `item_width` interleaved byte streams and
//! delta-code each stream independently (spec §4.1, "Byte-delta").
//!
//! Two filter ids exist side by side, matching spec §9's compatibility
//! note: [`forward`]/[`backward`] are a plain running delta per stream
//! (each stream's first byte is left unchanged, later bytes are
//! `x[i] - x[i-1]`); [`forward_legacy`]/[`backward_legacy`] reproduce the
//! historical SIMD/scalar-boundary bug described in
//! `examples/original_source/plugins/filters/bytedelta/bytedelta.c`'s
//! `bytedelta_forward_buggy`/`bytedelta_backward_buggy` (issue #524 in that
//! source): the vectorized path there deltas 16 bytes of a stream at a
//! time, carrying the last byte of each 16-byte stripe into the next as
//! the subtrahend; the buggy variant drops that carry the one time a
//! stream's length isn't a multiple of the 16-byte stripe width, so the
//! first byte of the scalar remainder is delta-coded against zero instead
//! of the true preceding byte. Every byte before and after that single
//! reset point matches the fixed variant exactly, so the two only diverge
//! at all when a stream is longer than one stripe (16 bytes) and its
//! length isn't a multiple of 16.

use crate::error::{Error, Result};

/// Width, in bytes, of the original's SIMD stripe (`bytes16`/`uint8x16_t`
/// in `bytedelta.c`). The legacy bug is a scalar-vs-vector boundary
/// artifact at multiples of this width, not a tunable parameter.
const STRIPE: usize = 16;

fn check(src: &[u8], dst: &[u8], item_width: usize) -> Result<()> {
    if item_width == 0 {
        return Err(Error::FilterFailure("bytedelta: item_width must be >= 1".into()));
    }
    if src.len() != dst.len() {
        return Err(Error::FilterFailure("bytedelta: src/dst length mismatch".into()));
    }
    Ok(())
}

/// Byte indices of stream `s` (0-indexed) within a block of `item_width`
/// interleaved streams, in ascending order.
fn stream_indices(block_len: usize, item_width: usize, s: usize) -> Vec<usize> {
    (s..block_len).step_by(item_width).collect()
}

/// How many leading bytes of a `stream_len`-byte stream the original's
/// SIMD loop would have consumed, i.e. `ip` after
/// `for (; ip < stream_len - 15; ip += 16)` runs to completion. `0` when
/// the stream never reaches a full stripe.
fn stripe_boundary(stream_len: usize) -> usize {
    let limit = stream_len.saturating_sub(STRIPE - 1);
    let mut ip = 0;
    while ip < limit {
        ip += STRIPE;
    }
    ip
}

pub fn forward(src: &[u8], dst: &mut [u8], item_width: usize) -> Result<()> {
    check(src, dst, item_width)?;
    for s in 0..item_width {
        let idx = stream_indices(src.len(), item_width, s);
        if idx.is_empty() {
            continue;
        }
        dst[idx[0]] = src[idx[0]];
        for w in 1..idx.len() {
            dst[idx[w]] = src[idx[w]].wrapping_sub(src[idx[w - 1]]);
        }
    }
    Ok(())
}

pub fn backward(src: &[u8], dst: &mut [u8], item_width: usize) -> Result<()> {
    check(src, dst, item_width)?;
    for s in 0..item_width {
        let idx = stream_indices(src.len(), item_width, s);
        if idx.is_empty() {
            continue;
        }
        dst[idx[0]] = src[idx[0]];
        for w in 1..idx.len() {
            dst[idx[w]] = src[idx[w]].wrapping_add(dst[idx[w - 1]]);
        }
    }
    Ok(())
}

pub fn forward_legacy(src: &[u8], dst: &mut [u8], item_width: usize) -> Result<()> {
    check(src, dst, item_width)?;
    for s in 0..item_width {
        let idx = stream_indices(src.len(), item_width, s);
        if idx.is_empty() {
            continue;
        }
        let boundary = stripe_boundary(idx.len());
        let mut carry = 0u8;
        for (w, &i) in idx.iter().enumerate() {
            if w == boundary && boundary > 0 && boundary < idx.len() {
                carry = 0;
            }
            let v = src[i];
            dst[i] = v.wrapping_sub(carry);
            carry = v;
        }
    }
    Ok(())
}

pub fn backward_legacy(src: &[u8], dst: &mut [u8], item_width: usize) -> Result<()> {
    check(src, dst, item_width)?;
    for s in 0..item_width {
        let idx = stream_indices(src.len(), item_width, s);
        if idx.is_empty() {
            continue;
        }
        let boundary = stripe_boundary(idx.len());
        let mut carry = 0u8;
        for (w, &i) in idx.iter().enumerate() {
            if w == boundary && boundary > 0 && boundary < idx.len() {
                carry = 0;
            }
            let v = src[i].wrapping_add(carry);
            dst[i] = v;
            carry = v;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_variant_round_trips() {
        let src: Vec<u8> = (0u8..64).collect();
        for &w in &[1usize, 2, 4, 8] {
            let mut enc = vec![0u8; src.len()];
            forward(&src, &mut enc, w).unwrap();
            let mut dec = vec![0u8; src.len()];
            backward(&enc, &mut dec, w).unwrap();
            assert_eq!(dec, src, "item_width={w}");
        }
    }

    #[test]
    fn legacy_variant_round_trips_within_its_own_era() {
        let src: Vec<u8> = (0u8..250).rev().collect();
        for &w in &[1usize, 2, 4] {
            let mut enc = vec![0u8; src.len()];
            forward_legacy(&src, &mut enc, w).unwrap();
            let mut dec = vec![0u8; src.len()];
            backward_legacy(&enc, &mut dec, w).unwrap();
            assert_eq!(dec, src, "item_width={w}");
        }
    }

    #[test]
    fn legacy_matches_fixed_below_one_stripe() {
        // A single-channel stream shorter than the 16-byte stripe never
        // reaches the original's SIMD loop, so both variants agree.
        let src: Vec<u8> = (0u8..15).collect();
        let mut fixed = vec![0u8; src.len()];
        forward(&src, &mut fixed, 1).unwrap();
        let mut legacy = vec![0u8; src.len()];
        forward_legacy(&src, &mut legacy, 1).unwrap();
        assert_eq!(fixed, legacy);
    }

    #[test]
    fn legacy_diverges_from_fixed_past_one_stripe_with_remainder() {
        // 30 bytes: one full 16-byte stripe, then a 14-byte remainder, so
        // the buggy variant drops the carry exactly at index 16.
        let src: Vec<u8> = (0u8..30).collect();
        let mut fixed = vec![0u8; src.len()];
        forward(&src, &mut fixed, 1).unwrap();
        let mut legacy = vec![0u8; src.len()];
        forward_legacy(&src, &mut legacy, 1).unwrap();

        assert_ne!(fixed, legacy);
        assert_eq!(fixed[..16], legacy[..16], "bytes before the stripe boundary agree");
        assert_eq!(legacy[16], src[16], "legacy resets the carry to zero at the boundary");
        assert_eq!(fixed[16], src[16].wrapping_sub(src[15]));
    }
}

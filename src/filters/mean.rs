//! Mean filter (ndmean): like the cell filter, but each cell's items are
//! replaced with their arithmetic mean broadcast across the cell (spec
//! §4.1). Lossy — only `f32`/`f64` item widths are supported, matching the
//! spec's restriction; any other width is `Error::Unsupported`.
//!
//! Built on top of [`super::cell`]'s permutation: the forward pass reuses
//! the same cell reordering and then overwrites each contiguous cell range
//! with its mean, and the backward pass is exactly [`super::cell::backward`]
//! since there is no value to recover, only the original item ordering.

use super::cell::{cell_group_sizes, cell_permutation};
use crate::error::{Error, Result};

pub fn forward(src: &[u8], dst: &mut [u8], item_width: usize, block_shape: &[usize], cellshape: usize) -> Result<()> {
    let perm = cell_permutation(block_shape, cellshape)?;
    let sizes = cell_group_sizes(block_shape, cellshape)?;
    check(src, dst, item_width, perm.len())?;

    // Reorder into cell order first (identical to the ndcell forward pass).
    for (k, &src_item) in perm.iter().enumerate() {
        let src_range = src_item * item_width..(src_item + 1) * item_width;
        let dst_range = k * item_width..(k + 1) * item_width;
        dst[dst_range].copy_from_slice(&src[src_range]);
    }

    let mut offset = 0usize;
    for size in sizes {
        let byte_range = offset * item_width..(offset + size) * item_width;
        overwrite_with_mean(&mut dst[byte_range], item_width)?;
        offset += size;
    }
    Ok(())
}

pub fn backward(src: &[u8], dst: &mut [u8], item_width: usize, block_shape: &[usize], cellshape: usize) -> Result<()> {
    super::cell::backward(src, dst, item_width, block_shape, cellshape)
}

fn overwrite_with_mean(cell_bytes: &mut [u8], item_width: usize) -> Result<()> {
    let n = cell_bytes.len() / item_width;
    if n == 0 {
        return Ok(());
    }
    match item_width {
        4 => {
            let sum: f64 = cell_bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes(b.try_into().unwrap()) as f64)
                .sum();
            let mean = (sum / n as f64) as f32;
            let bytes = mean.to_le_bytes();
            for chunk in cell_bytes.chunks_exact_mut(4) {
                chunk.copy_from_slice(&bytes);
            }
        }
        8 => {
            let sum: f64 = cell_bytes
                .chunks_exact(8)
                .map(|b| f64::from_le_bytes(b.try_into().unwrap()))
                .sum();
            let mean = sum / n as f64;
            let bytes = mean.to_le_bytes();
            for chunk in cell_bytes.chunks_exact_mut(8) {
                chunk.copy_from_slice(&bytes);
            }
        }
        other => {
            return Err(Error::Unsupported(format!(
                "ndmean: item width {other} is not float or double"
            )))
        }
    }
    Ok(())
}

fn check(src: &[u8], dst: &[u8], item_width: usize, total_items: usize) -> Result<()> {
    if item_width != 4 && item_width != 8 {
        return Err(Error::Unsupported(format!(
            "ndmean: item width {item_width} is not float or double"
        )));
    }
    let expected = total_items * item_width;
    if src.len() != expected || dst.len() != expected {
        return Err(Error::FilterFailure(format!(
            "ndmean: expected {expected} bytes, got src={} dst={}",
            src.len(),
            dst.len()
        )));
    }
    Ok(())
}

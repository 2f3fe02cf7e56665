//! Coordinate math shared by the n-d partitioning engine (C7) and by the
//! cell/mean filters, which need the same row-major enumeration to lay out
//! cells inside a block.
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/b2nd_utils.rs`, which
//! computes the same family of strides and flat-index conversions for
//! c-blosc2's `b2nd` layer, rewritten here over owned `Vec<usize>` instead
//! of fixed-size C arrays.

/// Row-major (C-order) strides: `strides[d] = product(shape[d+1..])`.
pub fn strides_row_major(shape: &[usize]) -> Vec<usize> {
    let ndim = shape.len();
    let mut strides = vec![1usize; ndim];
    for d in (0..ndim.saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// `f = Σ_d c[d] * Π_{e>d} s[e]` inverted: flat index → coordinates.
pub fn unidim_to_multidim(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let strides = strides_row_major(shape);
    let mut coords = vec![0usize; shape.len()];
    for d in 0..shape.len() {
        coords[d] = flat / strides[d];
        flat %= strides[d];
    }
    coords
}

/// Coordinates → flat index, the dual of [`unidim_to_multidim`].
pub fn multidim_to_unidim(coords: &[usize], shape: &[usize]) -> usize {
    let strides = strides_row_major(shape);
    coords.iter().zip(strides.iter()).map(|(c, s)| c * s).sum()
}

/// Every coordinate vector of `shape` in row-major (last axis fastest)
/// order. A zero-dimensional shape yields a single empty coordinate
/// (spec §8: a 0-d array holds exactly one item).
pub fn enumerate_indices(shape: &[usize]) -> Vec<Vec<usize>> {
    let ndim = shape.len();
    if ndim == 0 {
        return vec![Vec::new()];
    }
    if shape.iter().any(|&d| d == 0) {
        return Vec::new();
    }
    let total: usize = shape.iter().product();
    let mut result = Vec::with_capacity(total);
    let mut counter = vec![0usize; ndim];
    for _ in 0..total {
        result.push(counter.clone());
        for i in (0..ndim).rev() {
            counter[i] += 1;
            if counter[i] < shape[i] {
                break;
            }
            counter[i] = 0;
        }
    }
    result
}

/// Smallest multiple of `chunk` that is `>= extent`. Used for both
/// `extshape` (shape → chunkshape) and `extchunkshape` (chunkshape →
/// blockshape) in spec §4.7's invariant 1.
pub fn ceil_to_multiple(extent: usize, chunk: usize) -> usize {
    if chunk == 0 {
        return extent;
    }
    extent.div_ceil(chunk) * chunk
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_match_row_major_layout() {
        assert_eq!(strides_row_major(&[2, 3, 4]), vec![12, 4, 1]);
    }

    #[test]
    fn coordinate_round_trip() {
        let shape = [3usize, 5, 7];
        for flat in 0..(3 * 5 * 7) {
            let coords = unidim_to_multidim(flat, &shape);
            assert_eq!(multidim_to_unidim(&coords, &shape), flat);
        }
    }

    #[test]
    fn enumerate_matches_total_count() {
        let shape = [2usize, 3];
        let all = enumerate_indices(&shape);
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], vec![0, 0]);
        assert_eq!(all[5], vec![1, 2]);
    }

    #[test]
    fn zero_dim_has_one_entry() {
        assert_eq!(enumerate_indices(&[]), vec![Vec::new()]);
    }

    #[test]
    fn zero_extent_is_empty() {
        assert!(enumerate_indices(&[0, 3]).is_empty());
    }

    #[test]
    fn ceil_to_multiple_rounds_up() {
        assert_eq!(ceil_to_multiple(10, 4), 12);
        assert_eq!(ceil_to_multiple(12, 4), 12);
        assert_eq!(ceil_to_multiple(0, 4), 0);
    }
}

//! N-d partitioning (C7): shape/chunkshape/blockshape geometry, padding,
//! and the rectangle-copy primitive slice extraction is built from.
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/b2nd_utils.rs`
//! (`b2nd_copy_buffer2`'s padded-rectangle copy loop) and
//! `examples/keller-mark-blusc/src/blosc/context.rs` (where `extshape`
//! padding is computed), generalized from fixed `B2ND_MAX_DIM` arrays to
//! `Vec`s and from raw pointer arithmetic to slice indexing.

pub mod coords;

use crate::constants::MAX_DIM;
use crate::error::{Error, Result};
use coords::{ceil_to_multiple, strides_row_major};

/// The shape/chunkshape/blockshape hierarchy for one n-d array, plus the
/// derived padded extents and strides spec §4.7 requires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub shape: Vec<usize>,
    pub chunkshape: Vec<usize>,
    pub blockshape: Vec<usize>,
    pub extshape: Vec<usize>,
    pub extchunkshape: Vec<usize>,
}

impl Geometry {
    pub fn new(shape: Vec<usize>, chunkshape: Vec<usize>, blockshape: Vec<usize>) -> Result<Self> {
        let ndim = shape.len();
        if ndim > MAX_DIM {
            return Err(Error::InvalidArgument(format!(
                "ndim must be in 0..={MAX_DIM}, got {ndim}"
            )));
        }
        if chunkshape.len() != ndim || blockshape.len() != ndim {
            return Err(Error::InvalidArgument(
                "shape, chunkshape and blockshape must share the same rank".into(),
            ));
        }
        for d in 0..ndim {
            if chunkshape[d] == 0 || blockshape[d] == 0 {
                return Err(Error::InvalidArgument("chunkshape/blockshape entries must be positive".into()));
            }
            if blockshape[d] > chunkshape[d] {
                return Err(Error::InvalidArgument("blockshape cannot exceed chunkshape on any axis".into()));
            }
        }

        let extshape = (0..ndim).map(|d| ceil_to_multiple(shape[d], chunkshape[d])).collect();
        let extchunkshape = (0..ndim).map(|d| ceil_to_multiple(chunkshape[d], blockshape[d])).collect();

        Ok(Geometry {
            shape,
            chunkshape,
            blockshape,
            extshape,
            extchunkshape,
        })
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of chunks along each axis, covering `extshape`.
    pub fn chunks_per_axis(&self) -> Vec<usize> {
        (0..self.ndim()).map(|d| self.extshape[d] / self.chunkshape[d]).collect()
    }

    pub fn n_chunks(&self) -> usize {
        self.chunks_per_axis().iter().product()
    }

    /// Number of blocks along each axis within one chunk, covering
    /// `extchunkshape`.
    pub fn blocks_per_chunk_axis(&self) -> Vec<usize> {
        (0..self.ndim()).map(|d| self.extchunkshape[d] / self.blockshape[d]).collect()
    }

    pub fn blocks_per_chunk(&self) -> usize {
        self.blocks_per_chunk_axis().iter().product()
    }

    pub fn chunk_nitems(&self) -> usize {
        self.chunkshape.iter().product()
    }

    pub fn block_nitems(&self) -> usize {
        self.blockshape.iter().product()
    }

    /// Row-major strides for a buffer shaped `shape` (item counts, not bytes).
    pub fn strides_for(shape: &[usize]) -> Vec<usize> {
        strides_row_major(shape)
    }
}

/// Copies the rectangle `[src_start, src_stop)` of a buffer laid out as
/// `src_pad_shape` into `dst` laid out as `dst_pad_shape` at `dst_start`,
/// one item (`itemsize` bytes) at a time per contiguous run along the
/// fastest axis. Mirrors `b2nd_copy_buffer2`'s nested-loop copy but walks
/// an arbitrary rank instead of being specialized per-ndim.
#[allow(clippy::too_many_arguments)]
pub fn copy_rectangle(
    itemsize: usize,
    src: &[u8],
    src_pad_shape: &[usize],
    src_start: &[usize],
    src_stop: &[usize],
    dst: &mut [u8],
    dst_pad_shape: &[usize],
    dst_start: &[usize],
) -> Result<()> {
    let ndim = src_pad_shape.len();
    if dst_pad_shape.len() != ndim || src_start.len() != ndim || src_stop.len() != ndim || dst_start.len() != ndim {
        return Err(Error::InvalidArgument("copy_rectangle: rank mismatch".into()));
    }

    let copy_shape: Vec<usize> = (0..ndim)
        .map(|d| {
            src_stop[d]
                .checked_sub(src_start[d])
                .expect("src_stop must be >= src_start")
        })
        .collect();
    if copy_shape.iter().any(|&n| n == 0) {
        return Ok(());
    }
    if ndim == 0 {
        // A 0-d rectangle is exactly one item (spec §8): no axes to stride
        // over, so the whole "region" is the single item at offset 0.
        dst[..itemsize].copy_from_slice(&src[..itemsize]);
        return Ok(());
    }

    let src_strides = strides_row_major(src_pad_shape);
    let dst_strides = strides_row_major(dst_pad_shape);

    let run_len = copy_shape[ndim - 1];
    let outer_shape = &copy_shape[..ndim - 1];
    let outer_total: usize = outer_shape.iter().product();

    let mut outer_idx = vec![0usize; ndim - 1];
    for _ in 0..outer_total {
        let mut src_off = src_start[ndim - 1];
        let mut dst_off = dst_start[ndim - 1];
        for d in 0..ndim - 1 {
            src_off += (src_start[d] + outer_idx[d]) * src_strides[d];
            dst_off += (dst_start[d] + outer_idx[d]) * dst_strides[d];
        }

        let src_byte = src_off * itemsize;
        let dst_byte = dst_off * itemsize;
        let nbytes = run_len * itemsize;
        dst[dst_byte..dst_byte + nbytes].copy_from_slice(&src[src_byte..src_byte + nbytes]);

        if ndim == 1 {
            break;
        }
        for d in (0..ndim - 1).rev() {
            outer_idx[d] += 1;
            if outer_idx[d] < outer_shape[d] {
                break;
            }
            outer_idx[d] = 0;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_shapes_round_up_to_multiples() {
        let geo = Geometry::new(vec![10, 10], vec![4, 4], vec![2, 2]).unwrap();
        assert_eq!(geo.extshape, vec![12, 12]);
        assert_eq!(geo.extchunkshape, vec![4, 4]);
        assert_eq!(geo.n_chunks(), 9);
        assert_eq!(geo.blocks_per_chunk(), 4);
    }

    #[test]
    fn rejects_blockshape_larger_than_chunkshape() {
        assert!(Geometry::new(vec![10], vec![4], vec![8]).is_err());
    }

    #[test]
    fn zero_dim_geometry_holds_exactly_one_item() {
        // spec §8: ndim=0 holds exactly one item; shape/chunkshape/blockshape
        // are all the empty sequence.
        let geo = Geometry::new(vec![], vec![], vec![]).unwrap();
        assert_eq!(geo.ndim(), 0);
        assert_eq!(geo.extshape, Vec::<usize>::new());
        assert_eq!(geo.extchunkshape, Vec::<usize>::new());
        assert_eq!(geo.n_chunks(), 1);
        assert_eq!(geo.blocks_per_chunk(), 1);
        assert_eq!(geo.chunk_nitems(), 1);
        assert_eq!(geo.block_nitems(), 1);
    }

    #[test]
    fn copy_rectangle_extracts_2d_subregion() {
        let itemsize = 4;
        let src_shape = [4usize, 4];
        let mut src = vec![0u8; 16 * itemsize];
        for i in 0..16u32 {
            src[i as usize * itemsize..i as usize * itemsize + itemsize].copy_from_slice(&i.to_le_bytes());
        }
        let dst_shape = [2usize, 2];
        let mut dst = vec![0u8; 4 * itemsize];
        copy_rectangle(itemsize, &src, &src_shape, &[1, 1], &[3, 3], &mut dst, &dst_shape, &[0, 0]).unwrap();

        let read = |buf: &[u8], i: usize| u32::from_le_bytes(buf[i * itemsize..i * itemsize + itemsize].try_into().unwrap());
        assert_eq!(read(&dst, 0), 5);
        assert_eq!(read(&dst, 1), 6);
        assert_eq!(read(&dst, 2), 9);
        assert_eq!(read(&dst, 3), 10);
    }

    #[test]
    fn copy_rectangle_is_noop_on_empty_region() {
        let mut dst = vec![0u8; 16];
        copy_rectangle(4, &[0u8; 16], &[2, 2], &[0, 0], &[0, 2], &mut dst, &[2, 2], &[0, 0]).unwrap();
        assert_eq!(dst, vec![0u8; 16]);
    }
}

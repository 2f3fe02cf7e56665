//! N-d array API (C8): a thin façade over the super-chunk (C6) and
//! partitioning engine (C7) that understands shape.
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/b2nd.rs`'s
//! `Blosc2Array`/`b2nd_from_cbuffer`/`b2nd_to_cbuffer`/`b2nd_get_slice`
//! family, rewritten over [`Geometry`]/[`SChunk`] instead of the teacher's
//! fixed `[i64; B2ND_MAX_DIM]` arrays and `unsafe` pointer copies.

use crate::codecs::CodecId;
use crate::constants::{ARRAY_METALAYER_NAME, ARRAY_METALAYER_VERSION, MAX_DIM};
use crate::context::{CompressionParams, Runtime};
use crate::error::{Error, Result};
use crate::filters::FilterChain;
use crate::ndim::{coords, copy_rectangle, Geometry};
use crate::schunk::SChunk;
use std::path::Path;

/// An n-dimensional typed array backed by a super-chunk.
pub struct Array {
    geometry: Geometry,
    schunk: SChunk,
    item_width: usize,
    /// Raw bytes of the fill value used to pad partial/new chunks; all
    /// zero when unset (spec §4.7).
    fill_value: Vec<u8>,
    /// Kept so operations that rebuild the array onto a fresh `SChunk`
    /// (squeeze/resize/insert/delete) can share the source's custom
    /// filter/codec catalogs.
    runtime_handle: Runtime,
}

fn encode_b2nd_meta(geometry: &Geometry, item_width: usize) -> Vec<u8> {
    let ndim = geometry.ndim();
    let mut out = Vec::with_capacity(1 + 1 + 8 * ndim + 4 * ndim * 2 + 4);
    out.push(ARRAY_METALAYER_VERSION);
    out.push(ndim as u8);
    for &s in &geometry.shape {
        out.extend_from_slice(&(s as i64).to_le_bytes());
    }
    for &s in &geometry.chunkshape {
        out.extend_from_slice(&(s as i32).to_le_bytes());
    }
    for &s in &geometry.blockshape {
        out.extend_from_slice(&(s as i32).to_le_bytes());
    }
    out.extend_from_slice(&(item_width as u32).to_le_bytes());
    out
}

fn decode_b2nd_meta(bytes: &[u8]) -> Result<(Geometry, usize)> {
    if bytes.len() < 2 {
        return Err(Error::InvalidFormat("b2nd metalayer too short".into()));
    }
    let version = bytes[0];
    if version != ARRAY_METALAYER_VERSION {
        return Err(Error::InvalidFormat(format!("unsupported b2nd metalayer version {version}")));
    }
    let ndim = bytes[1] as usize;
    if ndim > MAX_DIM {
        return Err(Error::InvalidFormat(format!("b2nd metalayer has invalid ndim {ndim}")));
    }
    let mut pos = 2usize;
    let need = |pos: usize, n: usize| -> Result<()> {
        if pos + n > bytes.len() {
            Err(Error::InvalidFormat("b2nd metalayer truncated".into()))
        } else {
            Ok(())
        }
    };

    need(pos, 8 * ndim)?;
    let mut shape = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        shape.push(i64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap()) as usize);
        pos += 8;
    }
    need(pos, 4 * ndim)?;
    let mut chunkshape = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        chunkshape.push(i32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize);
        pos += 4;
    }
    need(pos, 4 * ndim)?;
    let mut blockshape = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        blockshape.push(i32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize);
        pos += 4;
    }
    need(pos, 4)?;
    let item_width = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;

    Ok((Geometry::new(shape, chunkshape, blockshape)?, item_width))
}

impl Array {
    fn new_internal(geometry: Geometry, mut schunk: SChunk, item_width: usize, fill_value: Vec<u8>, runtime: Runtime) -> Result<Self> {
        schunk.set_block_shape(geometry.blockshape.clone());
        schunk.set_meta(ARRAY_METALAYER_NAME, encode_b2nd_meta(&geometry, item_width))?;
        Ok(Array {
            geometry,
            schunk,
            item_width,
            fill_value,
            runtime_handle: runtime,
        })
    }

    fn chunk_nbytes(&self) -> usize {
        self.geometry.chunk_nitems() * self.item_width
    }

    /// Builds a padded chunk-shaped buffer, drawing live data from `src`
    /// (laid out as `shape`) intersected with this chunk's region, and
    /// filling everything else with `fill_value`.
    fn build_padded_chunk(&self, src: &[u8], chunk_coords: &[usize]) -> Vec<u8> {
        let ndim = self.geometry.ndim();
        let chunk_nitems = self.geometry.chunk_nitems();
        let mut chunk_buf = vec![0u8; chunk_nitems * self.item_width];
        for dst_item in chunk_buf.chunks_mut(self.item_width) {
            dst_item.copy_from_slice(&self.fill_value);
        }

        let chunk_start: Vec<usize> = (0..ndim).map(|d| chunk_coords[d] * self.geometry.chunkshape[d]).collect();
        let chunk_stop: Vec<usize> = (0..ndim)
            .map(|d| (chunk_start[d] + self.geometry.chunkshape[d]).min(self.geometry.shape[d]))
            .collect();
        if (0..ndim).any(|d| chunk_stop[d] <= chunk_start[d]) {
            return chunk_buf;
        }

        let _ = copy_rectangle(
            self.item_width,
            src,
            &self.geometry.shape,
            &chunk_start,
            &chunk_stop,
            &mut chunk_buf,
            &self.geometry.chunkshape,
            &vec![0usize; ndim],
        );
        chunk_buf
    }

    /// Creates a new array from an in-memory, fully-populated `shape`-sized
    /// buffer.
    pub fn from_buffer(
        runtime: Runtime,
        codec: CodecId,
        level: i32,
        filters: FilterChain,
        item_width: usize,
        shape: Vec<usize>,
        chunkshape: Vec<usize>,
        blockshape: Vec<usize>,
        src: &[u8],
    ) -> Result<Self> {
        let geometry = Geometry::new(shape, chunkshape, blockshape)?;
        let expected_len = geometry.shape.iter().product::<usize>() * item_width;
        if src.len() != expected_len {
            return Err(Error::InvalidArgument(format!(
                "buffer length {} does not match shape ({} bytes expected)",
                src.len(),
                expected_len
            )));
        }

        let mut cparams = CompressionParams::new(codec, level, item_width);
        cparams.filters = filters;
        cparams.blocksize = geometry.block_nitems() * item_width;
        let chunk_nbytes = geometry.chunk_nitems() * item_width;
        let schunk = SChunk::new_in_memory(runtime.clone(), cparams, chunk_nbytes);
        let mut array = Array::new_internal(geometry, schunk, item_width, vec![0u8; item_width], runtime)?;

        let n_chunks = array.geometry.chunks_per_axis();
        for flat in coords::enumerate_indices(&n_chunks) {
            let chunk_buf = array.build_padded_chunk(src, &flat);
            array.schunk.append_chunk(&chunk_buf)?;
        }
        Ok(array)
    }

    /// Allocates an array whose contents are entirely `fill_value` (or
    /// zero, for [`Array::zeros`]), without materializing a `shape`-sized
    /// buffer first.
    fn new_filled(
        runtime: Runtime,
        codec: CodecId,
        level: i32,
        filters: FilterChain,
        item_width: usize,
        shape: Vec<usize>,
        chunkshape: Vec<usize>,
        blockshape: Vec<usize>,
        fill_value: Vec<u8>,
    ) -> Result<Self> {
        let geometry = Geometry::new(shape, chunkshape, blockshape)?;
        let mut cparams = CompressionParams::new(codec, level, item_width);
        cparams.filters = filters;
        let chunk_nbytes = geometry.chunk_nitems() * item_width;
        let schunk = SChunk::new_in_memory(runtime.clone(), cparams, chunk_nbytes);
        let mut array = Array::new_internal(geometry, schunk, item_width, fill_value, runtime)?;

        let mut one_chunk = vec![0u8; array.chunk_nbytes()];
        for dst in one_chunk.chunks_mut(item_width) {
            dst.copy_from_slice(&array.fill_value);
        }
        let n_chunks = array.geometry.n_chunks();
        for _ in 0..n_chunks {
            array.schunk.append_chunk(&one_chunk)?;
        }
        Ok(array)
    }

    pub fn zeros(
        runtime: Runtime,
        codec: CodecId,
        level: i32,
        filters: FilterChain,
        item_width: usize,
        shape: Vec<usize>,
        chunkshape: Vec<usize>,
        blockshape: Vec<usize>,
    ) -> Result<Self> {
        Self::new_filled(runtime, codec, level, filters, item_width, shape, chunkshape, blockshape, vec![0u8; item_width])
    }

    #[allow(clippy::too_many_arguments)]
    pub fn full(
        runtime: Runtime,
        codec: CodecId,
        level: i32,
        filters: FilterChain,
        item_width: usize,
        shape: Vec<usize>,
        chunkshape: Vec<usize>,
        blockshape: Vec<usize>,
        fill_value: Vec<u8>,
    ) -> Result<Self> {
        if fill_value.len() != item_width {
            return Err(Error::InvalidArgument("fill_value length must equal item_width".into()));
        }
        Self::new_filled(runtime, codec, level, filters, item_width, shape, chunkshape, blockshape, fill_value)
    }

    /// Allocates an array without writing any payload bytes (chunks are
    /// appended lazily via [`Array::set_slice_buffer`]); reads before the
    /// first write observe zeroed padding.
    #[allow(clippy::too_many_arguments)]
    pub fn uninit(
        runtime: Runtime,
        codec: CodecId,
        level: i32,
        filters: FilterChain,
        item_width: usize,
        shape: Vec<usize>,
        chunkshape: Vec<usize>,
        blockshape: Vec<usize>,
    ) -> Result<Self> {
        Self::new_filled(runtime, codec, level, filters, item_width, shape, chunkshape, blockshape, vec![0u8; item_width])
    }

    /// Reads the whole array out into a `shape`-sized buffer.
    pub fn to_buffer(&self) -> Result<Vec<u8>> {
        let total_nitems: usize = self.geometry.shape.iter().product();
        let mut out = vec![0u8; total_nitems * self.item_width];
        let ndim = self.geometry.ndim();
        let start = vec![0usize; ndim];
        let stop = self.geometry.shape.clone();
        self.read_region(&start, &stop, &mut out, &self.geometry.shape.clone())?;
        Ok(out)
    }

    /// Copies the `[start, stop)` hyperrectangle into `dst`, laid out
    /// densely as `stop - start` (spec §4.7's slice extraction).
    pub fn get_slice(&self, start: &[usize], stop: &[usize]) -> Result<Vec<u8>> {
        let ndim = self.geometry.ndim();
        if start.len() != ndim || stop.len() != ndim {
            return Err(Error::InvalidArgument("start/stop rank must match array rank".into()));
        }
        for d in 0..ndim {
            if stop[d] > self.geometry.shape[d] || start[d] > stop[d] {
                return Err(Error::InvalidArgument(format!(
                    "slice [{}, {}) out of bounds for axis {d} (extent {})",
                    start[d], stop[d], self.geometry.shape[d]
                )));
            }
        }
        let dst_shape: Vec<usize> = (0..ndim).map(|d| stop[d] - start[d]).collect();
        let mut out = vec![0u8; dst_shape.iter().product::<usize>() * self.item_width];
        self.read_region(start, stop, &mut out, &dst_shape)?;
        Ok(out)
    }

    fn read_region(&self, start: &[usize], stop: &[usize], dst: &mut [u8], dst_shape: &[usize]) -> Result<()> {
        let ndim = self.geometry.ndim();
        let chunks_per_axis = self.geometry.chunks_per_axis();
        let first_chunk: Vec<usize> = (0..ndim).map(|d| start[d] / self.geometry.chunkshape[d]).collect();
        let last_chunk: Vec<usize> = (0..ndim).map(|d| if stop[d] == 0 { 0 } else { (stop[d] - 1) / self.geometry.chunkshape[d] }).collect();
        let span: Vec<usize> = (0..ndim).map(|d| last_chunk[d] - first_chunk[d] + 1).collect();

        for offset in coords::enumerate_indices(&span) {
            let chunk_coords: Vec<usize> = (0..ndim).map(|d| first_chunk[d] + offset[d]).collect();
            if (0..ndim).any(|d| chunk_coords[d] >= chunks_per_axis[d]) {
                continue;
            }
            let chunk_flat = coords::multidim_to_unidim(&chunk_coords, &chunks_per_axis);
            let chunk_buf = self.schunk.get_chunk(chunk_flat)?;

            let chunk_start: Vec<usize> = (0..ndim).map(|d| chunk_coords[d] * self.geometry.chunkshape[d]).collect();
            let local_start: Vec<usize> = (0..ndim).map(|d| start[d].max(chunk_start[d]) - chunk_start[d]).collect();
            let local_stop: Vec<usize> = (0..ndim).map(|d| stop[d].min(chunk_start[d] + self.geometry.chunkshape[d]) - chunk_start[d]).collect();
            let dst_start: Vec<usize> = (0..ndim).map(|d| chunk_start[d] + local_start[d] - start[d]).collect();

            copy_rectangle(
                self.item_width,
                &chunk_buf,
                &self.geometry.chunkshape,
                &local_start,
                &local_stop,
                dst,
                dst_shape,
                &dst_start,
            )?;
        }
        Ok(())
    }

    /// Writes `src` (densely laid out as `stop - start`) into the
    /// `[start, stop)` hyperrectangle, read-modify-writing every
    /// intersecting chunk.
    pub fn set_slice_buffer(&mut self, start: &[usize], stop: &[usize], src: &[u8]) -> Result<()> {
        let ndim = self.geometry.ndim();
        if start.len() != ndim || stop.len() != ndim {
            return Err(Error::InvalidArgument("start/stop rank must match array rank".into()));
        }
        for d in 0..ndim {
            if stop[d] > self.geometry.shape[d] || start[d] > stop[d] {
                return Err(Error::InvalidArgument("set_slice_buffer: region out of bounds".into()));
            }
        }
        let src_shape: Vec<usize> = (0..ndim).map(|d| stop[d] - start[d]).collect();

        let chunks_per_axis = self.geometry.chunks_per_axis();
        let first_chunk: Vec<usize> = (0..ndim).map(|d| start[d] / self.geometry.chunkshape[d]).collect();
        let last_chunk: Vec<usize> = (0..ndim).map(|d| if stop[d] == 0 { 0 } else { (stop[d] - 1) / self.geometry.chunkshape[d] }).collect();
        let span: Vec<usize> = (0..ndim).map(|d| last_chunk[d] - first_chunk[d] + 1).collect();

        for offset in coords::enumerate_indices(&span) {
            let chunk_coords: Vec<usize> = (0..ndim).map(|d| first_chunk[d] + offset[d]).collect();
            if (0..ndim).any(|d| chunk_coords[d] >= chunks_per_axis[d]) {
                continue;
            }
            let chunk_flat = coords::multidim_to_unidim(&chunk_coords, &chunks_per_axis);
            let mut chunk_buf = self.schunk.get_chunk(chunk_flat)?;

            let chunk_start: Vec<usize> = (0..ndim).map(|d| chunk_coords[d] * self.geometry.chunkshape[d]).collect();
            let local_start: Vec<usize> = (0..ndim).map(|d| start[d].max(chunk_start[d]) - chunk_start[d]).collect();
            let local_stop: Vec<usize> = (0..ndim).map(|d| stop[d].min(chunk_start[d] + self.geometry.chunkshape[d]) - chunk_start[d]).collect();
            let src_start: Vec<usize> = (0..ndim).map(|d| chunk_start[d] + local_start[d] - start[d]).collect();
            let src_stop: Vec<usize> = (0..ndim).map(|d| src_start[d] + (local_stop[d] - local_start[d])).collect();

            copy_rectangle(
                self.item_width,
                src,
                &src_shape,
                &src_start,
                &src_stop,
                &mut chunk_buf,
                &self.geometry.chunkshape,
                &local_start,
            )?;
            self.schunk.update_chunk(chunk_flat, &chunk_buf)?;
        }
        Ok(())
    }

    pub fn shape(&self) -> &[usize] {
        &self.geometry.shape
    }

    /// Drops axes of extent 1, returning a lower-rank copy of the data.
    pub fn squeeze(&self) -> Result<Self> {
        let keep: Vec<usize> = (0..self.geometry.ndim()).filter(|&d| self.geometry.shape[d] != 1).collect();
        self.squeeze_axes(&keep)
    }

    /// Drops exactly the named axes, which must all currently have extent 1.
    pub fn squeeze_index(&self, axes: &[usize]) -> Result<Self> {
        for &a in axes {
            if a >= self.geometry.ndim() {
                return Err(Error::InvalidArgument(format!("squeeze axis {a} out of range")));
            }
            if self.geometry.shape[a] != 1 {
                return Err(Error::InvalidArgument(format!("squeeze axis {a} does not have extent 1")));
            }
        }
        let keep: Vec<usize> = (0..self.geometry.ndim()).filter(|d| !axes.contains(d)).collect();
        self.squeeze_axes(&keep)
    }

    fn squeeze_axes(&self, keep: &[usize]) -> Result<Self> {
        if keep.is_empty() {
            return Err(Error::InvalidArgument("squeeze would leave a 0-dimensional array; unsupported".into()));
        }
        let buf = self.to_buffer()?;
        let shape: Vec<usize> = keep.iter().map(|&d| self.geometry.shape[d]).collect();
        let chunkshape: Vec<usize> = keep.iter().map(|&d| self.geometry.chunkshape[d]).collect();
        let blockshape: Vec<usize> = keep.iter().map(|&d| self.geometry.blockshape[d]).collect();
        Array::from_buffer(
            self.schunk_runtime(),
            self.schunk.frame().header.codec,
            self.schunk.frame().header.codec_level,
            self.filters_clone(),
            self.item_width,
            shape,
            chunkshape,
            blockshape,
            &buf,
        )
    }

    fn filters_clone(&self) -> FilterChain {
        self.schunk.frame().header.filters.clone()
    }

    fn schunk_runtime(&self) -> Runtime {
        self.runtime_handle.clone()
    }

    /// Grows or shrinks axis `axis` to `new_extent`, padding growth with
    /// `fill_value` and truncating shrinkage (spec §4.7).
    pub fn resize(&mut self, axis: usize, new_extent: usize) -> Result<()> {
        if axis >= self.geometry.ndim() {
            return Err(Error::InvalidArgument(format!("resize axis {axis} out of range")));
        }
        let old_shape = self.geometry.shape.clone();
        let mut new_shape = old_shape.clone();
        new_shape[axis] = new_extent;

        let rebuilt = self.rebuild_with_shape(new_shape)?;
        *self = rebuilt;
        Ok(())
    }

    /// Inserts `buffer` (shaped like the array except `len` along `axis`)
    /// at position `start` along `axis`, shifting later data outward.
    pub fn insert(&mut self, buffer: &[u8], axis: usize, start: usize, len: usize) -> Result<()> {
        if axis >= self.geometry.ndim() {
            return Err(Error::InvalidArgument(format!("insert axis {axis} out of range")));
        }
        if start > self.geometry.shape[axis] {
            return Err(Error::InvalidArgument("insert start out of range".into()));
        }
        let old = self.to_buffer()?;
        let mut new_shape = self.geometry.shape.clone();
        new_shape[axis] += len;

        let total_new: usize = new_shape.iter().product();
        let mut new_buf = vec![0u8; total_new * self.item_width];

        for flat in coords::enumerate_indices(&new_shape) {
            let src_coord_axis = if flat[axis] < start {
                Some(flat[axis])
            } else if flat[axis] < start + len {
                None
            } else {
                Some(flat[axis] - len)
            };
            let dst_flat = coords::multidim_to_unidim(&flat, &new_shape);
            let dst_off = dst_flat * self.item_width;
            match src_coord_axis {
                Some(src_axis_val) => {
                    let mut src_coord = flat.clone();
                    src_coord[axis] = src_axis_val;
                    let src_flat = coords::multidim_to_unidim(&src_coord, &self.geometry.shape);
                    let src_off = src_flat * self.item_width;
                    new_buf[dst_off..dst_off + self.item_width].copy_from_slice(&old[src_off..src_off + self.item_width]);
                }
                None => {
                    let mut buf_coord = flat.clone();
                    buf_coord[axis] -= start;
                    let mut buf_shape = new_shape.clone();
                    buf_shape[axis] = len;
                    let buf_flat = coords::multidim_to_unidim(&buf_coord, &buf_shape);
                    let buf_off = buf_flat * self.item_width;
                    new_buf[dst_off..dst_off + self.item_width].copy_from_slice(&buffer[buf_off..buf_off + self.item_width]);
                }
            }
        }

        let rebuilt = self.rebuild_with_buffer(new_shape, new_buf)?;
        *self = rebuilt;
        Ok(())
    }

    /// Removes the `[start, start+len)` range along `axis`, shifting later
    /// data inward.
    pub fn delete(&mut self, axis: usize, start: usize, len: usize) -> Result<()> {
        if axis >= self.geometry.ndim() {
            return Err(Error::InvalidArgument(format!("delete axis {axis} out of range")));
        }
        if start + len > self.geometry.shape[axis] {
            return Err(Error::InvalidArgument("delete range out of bounds".into()));
        }
        let old = self.to_buffer()?;
        let mut new_shape = self.geometry.shape.clone();
        new_shape[axis] -= len;
        let total_new: usize = new_shape.iter().product();
        let mut new_buf = vec![0u8; total_new * self.item_width];

        for flat in coords::enumerate_indices(&new_shape) {
            let mut src_coord = flat.clone();
            if src_coord[axis] >= start {
                src_coord[axis] += len;
            }
            let src_flat = coords::multidim_to_unidim(&src_coord, &self.geometry.shape);
            let dst_flat = coords::multidim_to_unidim(&flat, &new_shape);
            let src_off = src_flat * self.item_width;
            let dst_off = dst_flat * self.item_width;
            new_buf[dst_off..dst_off + self.item_width].copy_from_slice(&old[src_off..src_off + self.item_width]);
        }

        let rebuilt = self.rebuild_with_buffer(new_shape, new_buf)?;
        *self = rebuilt;
        Ok(())
    }

    /// Appends `buffer` along `axis` (a convenience wrapper over
    /// [`Array::insert`] at the current extent).
    pub fn append(&mut self, buffer: &[u8], axis: usize, len: usize) -> Result<()> {
        let start = self.geometry.shape[axis];
        self.insert(buffer, axis, start, len)
    }

    fn rebuild_with_shape(&self, new_shape: Vec<usize>) -> Result<Self> {
        let old = self.to_buffer()?;
        let ndim = self.geometry.ndim();
        let total_new: usize = new_shape.iter().product();
        let mut new_buf = vec![0u8; total_new * self.item_width];
        for dst in new_buf.chunks_mut(self.item_width) {
            dst.copy_from_slice(&self.fill_value);
        }
        let common_stop: Vec<usize> = (0..ndim).map(|d| self.geometry.shape[d].min(new_shape[d])).collect();
        let start = vec![0usize; ndim];
        copy_rectangle(self.item_width, &old, &self.geometry.shape, &start, &common_stop, &mut new_buf, &new_shape, &start)?;
        self.rebuild_with_buffer(new_shape, new_buf)
    }

    fn rebuild_with_buffer(&self, new_shape: Vec<usize>, buf: Vec<u8>) -> Result<Self> {
        let chunkshape = self.geometry.chunkshape.clone();
        let blockshape = self.geometry.blockshape.clone();
        Array::from_buffer(
            self.schunk_runtime(),
            self.schunk.frame().header.codec,
            self.schunk.frame().header.codec_level,
            self.filters_clone(),
            self.item_width,
            new_shape,
            chunkshape,
            blockshape,
            &buf,
        )
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.schunk.save(path)
    }

    pub fn open(runtime: Runtime, path: impl AsRef<Path>) -> Result<Self> {
        let frame = crate::frame::Frame::open(path)?;
        Self::from_opened_frame(runtime, frame)
    }

    fn from_opened_frame(runtime: Runtime, frame: crate::frame::Frame) -> Result<Self> {
        let meta = frame
            .get_meta(ARRAY_METALAYER_NAME)
            .ok_or_else(|| Error::NotFound(format!("frame has no {ARRAY_METALAYER_NAME} metalayer")))?;
        let (geometry, item_width) = decode_b2nd_meta(meta)?;
        let mut schunk = SChunk::from_frame(runtime.clone(), frame);
        schunk.set_block_shape(geometry.blockshape.clone());
        Ok(Array {
            geometry,
            schunk,
            item_width,
            fill_value: vec![0u8; item_width],
            runtime_handle: runtime,
        })
    }

    pub fn serialize_meta(&self) -> Vec<u8> {
        encode_b2nd_meta(&self.geometry, self.item_width)
    }

    pub fn deserialize_meta(bytes: &[u8]) -> Result<(Vec<usize>, Vec<usize>, Vec<usize>, usize)> {
        let (geometry, item_width) = decode_b2nd_meta(bytes)?;
        Ok((geometry.shape, geometry.chunkshape, geometry.blockshape, item_width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterId;

    fn make_array(shape: Vec<usize>, chunkshape: Vec<usize>, blockshape: Vec<usize>, data: &[u8]) -> Array {
        let mut filters = FilterChain::new();
        filters.push(FilterId::Shuffle, 0).unwrap();
        Array::from_buffer(Runtime::new(), CodecId::Zstd, 5, filters, 4, shape, chunkshape, blockshape, data).unwrap()
    }

    #[test]
    fn from_buffer_to_buffer_round_trips() {
        let data: Vec<u8> = (0..(6 * 6 * 4u32)).map(|i| (i % 251) as u8).collect();
        let array = make_array(vec![6, 6], vec![4, 4], vec![2, 2], &data);
        let out = array.to_buffer().unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn get_slice_extracts_subregion() {
        let itemsize = 4;
        let mut data = vec![0u8; 4 * 4 * itemsize];
        for i in 0..16u32 {
            data[i as usize * itemsize..i as usize * itemsize + itemsize].copy_from_slice(&i.to_le_bytes());
        }
        let array = make_array(vec![4, 4], vec![2, 2], vec![2, 2], &data);
        let slice = array.get_slice(&[1, 1], &[3, 3]).unwrap();
        let read = |buf: &[u8], i: usize| u32::from_le_bytes(buf[i * itemsize..i * itemsize + itemsize].try_into().unwrap());
        assert_eq!(read(&slice, 0), 5);
        assert_eq!(read(&slice, 3), 10);
    }

    #[test]
    fn set_slice_buffer_then_read_back() {
        let data = vec![0u8; 4 * 4 * 4];
        let mut array = make_array(vec![4, 4], vec![2, 2], vec![2, 2], &data);
        let patch: Vec<u8> = (0..4u32).flat_map(|i| i.to_le_bytes()).collect();
        array.set_slice_buffer(&[1, 1], &[3, 3], &patch).unwrap();
        let out = array.get_slice(&[1, 1], &[3, 3]).unwrap();
        assert_eq!(out, patch);
    }

    #[test]
    fn get_slice_rejects_out_of_bounds() {
        let data = vec![0u8; 4 * 4 * 4];
        let array = make_array(vec![4, 4], vec![2, 2], vec![2, 2], &data);
        assert!(array.get_slice(&[0, 0], &[5, 4]).is_err());
    }

    #[test]
    fn squeeze_drops_unit_axes() {
        let data: Vec<u8> = (0..(4 * 4u32)).flat_map(|i| i.to_le_bytes()).collect();
        let array = make_array(vec![1, 4, 4], vec![1, 2, 2], vec![1, 2, 2], &data);
        let squeezed = array.squeeze().unwrap();
        assert_eq!(squeezed.shape(), &[4, 4]);
        assert_eq!(squeezed.to_buffer().unwrap(), data);
    }

    #[test]
    fn resize_grows_with_zero_padding() {
        let data: Vec<u8> = (0..(2 * 2u32)).flat_map(|i| i.to_le_bytes()).collect();
        let mut array = make_array(vec![2, 2], vec![2, 2], vec![2, 2], &data);
        array.resize(0, 4).unwrap();
        assert_eq!(array.shape(), &[4, 2]);
        let tail = array.get_slice(&[2, 0], &[4, 2]).unwrap();
        assert!(tail.iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_dim_array_round_trips_single_item() {
        // spec §8: ndim=0 holds exactly one item; slice ops are identity.
        let data = 42u32.to_le_bytes().to_vec();
        let array = Array::from_buffer(Runtime::new(), CodecId::Zstd, 5, FilterChain::new(), 4, vec![], vec![], vec![], &data).unwrap();
        assert_eq!(array.shape(), &[] as &[usize]);
        assert_eq!(array.to_buffer().unwrap(), data);
        assert_eq!(array.get_slice(&[], &[]).unwrap(), data);
    }

    #[test]
    fn insert_then_delete_round_trips() {
        let data: Vec<u8> = (0..6u32).flat_map(|i| i.to_le_bytes()).collect();
        let mut array = make_array(vec![6], vec![4], vec![2], &data);
        let patch: Vec<u8> = (100u32..102).flat_map(|i| i.to_le_bytes()).collect();
        array.insert(&patch, 0, 2, 2).unwrap();
        assert_eq!(array.shape(), &[8]);
        array.delete(0, 2, 2).unwrap();
        assert_eq!(array.shape(), &[6]);
        assert_eq!(array.to_buffer().unwrap(), data);
    }
}

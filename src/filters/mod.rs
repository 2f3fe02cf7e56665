//! Filter catalog (C1): a pipeline of pure, block-local byte
//! transformations applied before the compression codec.
//!
//! The built-in catalog is a tagged sum (`FilterId`) rather than the
//! teacher's raw `u8` filter codes plus function-pointer table
//! (`examples/keller-mark-blusc/src/blosc/context.rs`'s `urfilters`);
//! user-registered filters are a separate `Custom(id)` variant resolved
//! through a [`FilterRegistry`], per spec §9's redesign note on dynamic
//! dispatch.

pub mod arith;
pub mod bitshuffle;
pub mod bytedelta;
pub mod cell;
pub mod delta;
pub mod mean;
pub mod shuffle;
pub mod trunc;

use crate::constants::MAX_FILTERS;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// One built-in filter or a reference to a user-registered one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterId {
    /// No-op; always skipped by the chain.
    None,
    Shuffle,
    BitShuffle,
    Delta,
    TruncPrec,
    /// Historical, known-buggy byte-delta, kept for format compatibility.
    ByteDeltaLegacy,
    ByteDelta,
    NdCell,
    NdMean,
    Custom(u8),
}

impl FilterId {
    pub fn code(self) -> u8 {
        match self {
            FilterId::None => 0,
            FilterId::Shuffle => 1,
            FilterId::BitShuffle => 2,
            FilterId::Delta => 3,
            FilterId::TruncPrec => 4,
            FilterId::ByteDeltaLegacy => 5,
            FilterId::ByteDelta => 6,
            FilterId::NdCell => 7,
            FilterId::NdMean => 8,
            FilterId::Custom(id) => id,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => FilterId::None,
            1 => FilterId::Shuffle,
            2 => FilterId::BitShuffle,
            3 => FilterId::Delta,
            4 => FilterId::TruncPrec,
            5 => FilterId::ByteDeltaLegacy,
            6 => FilterId::ByteDelta,
            7 => FilterId::NdCell,
            8 => FilterId::NdMean,
            other => FilterId::Custom(other),
        }
    }
}

/// A single (filter, meta) slot in a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterSlot {
    pub id: FilterId,
    pub meta: u8,
}

/// Ordered list of up to [`MAX_FILTERS`] filter slots, applied forward in
/// index order on compression and in reverse on decompression (spec §4.1).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterChain {
    slots: Vec<FilterSlot>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn push(&mut self, id: FilterId, meta: u8) -> Result<()> {
        if self.slots.len() >= MAX_FILTERS {
            return Err(Error::InvalidArgument(format!(
                "filter chain cannot exceed {MAX_FILTERS} entries"
            )));
        }
        self.slots.push(FilterSlot { id, meta });
        Ok(())
    }

    pub fn slots(&self) -> &[FilterSlot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.id == FilterId::None)
    }
}

/// Per-block context a filter needs beyond its own `meta` byte: the item
/// width, the block's n-d shape (for `ndcell`/`ndmean`), and — only for the
/// chunk-level `Delta` filter — the chunk's first decompressed block.
pub struct FilterContext<'a> {
    pub item_width: usize,
    pub block_shape: &'a [usize],
    pub reference_block: Option<&'a [u8]>,
}

type CustomFilterFn = dyn Fn(&[u8], &mut [u8], u8, &FilterContext, bool) -> Result<()> + Send + Sync;

/// User-registered filters, keyed by their id byte. Append-only, guarded by
/// the single mutex inside [`crate::runtime::Runtime`] (spec §9).
#[derive(Clone, Default)]
pub struct FilterRegistry {
    custom: HashMap<u8, Arc<CustomFilterFn>>,
}

impl FilterRegistry {
    pub fn register(&mut self, id: u8, f: Arc<CustomFilterFn>) {
        self.custom.insert(id, f);
    }
}

/// Run the chain forward (compression direction).
pub fn apply_forward(chain: &FilterChain, block: &[u8], ctx: &FilterContext, registry: &FilterRegistry) -> Result<Vec<u8>> {
    let mut current = block.to_vec();
    for slot in chain.slots() {
        if slot.id == FilterId::None {
            continue;
        }
        let mut out = vec![0u8; current.len()];
        apply_one(slot.id, slot.meta, &current, &mut out, ctx, registry, true)?;
        current = out;
    }
    Ok(current)
}

/// Run the chain backward (decompression direction): reverse order.
pub fn apply_backward(chain: &FilterChain, block: &[u8], ctx: &FilterContext, registry: &FilterRegistry) -> Result<Vec<u8>> {
    let mut current = block.to_vec();
    for slot in chain.slots().iter().rev() {
        if slot.id == FilterId::None {
            continue;
        }
        let mut out = vec![0u8; current.len()];
        apply_one(slot.id, slot.meta, &current, &mut out, ctx, registry, false)?;
        current = out;
    }
    Ok(current)
}

#[allow(clippy::too_many_arguments)]
fn apply_one(
    id: FilterId,
    meta: u8,
    src: &[u8],
    dst: &mut [u8],
    ctx: &FilterContext,
    registry: &FilterRegistry,
    forward: bool,
) -> Result<()> {
    match id {
        FilterId::None => {
            dst.copy_from_slice(src);
            Ok(())
        }
        FilterId::Shuffle => {
            if forward {
                shuffle::forward(src, dst, ctx.item_width)
            } else {
                shuffle::backward(src, dst, ctx.item_width)
            }
        }
        FilterId::BitShuffle => {
            if forward {
                bitshuffle::forward(src, dst, ctx.item_width)
            } else {
                bitshuffle::backward(src, dst, ctx.item_width)
            }
        }
        FilterId::Delta => {
            if forward {
                delta::forward(src, dst, ctx.item_width, ctx.reference_block)
            } else {
                delta::backward(src, dst, ctx.item_width, ctx.reference_block)
            }
        }
        FilterId::TruncPrec => {
            if forward {
                trunc::forward(src, dst, ctx.item_width, meta)
            } else {
                trunc::backward(src, dst)
            }
        }
        FilterId::ByteDelta => {
            if forward {
                bytedelta::forward(src, dst, ctx.item_width)
            } else {
                bytedelta::backward(src, dst, ctx.item_width)
            }
        }
        FilterId::ByteDeltaLegacy => {
            if forward {
                bytedelta::forward_legacy(src, dst, ctx.item_width)
            } else {
                bytedelta::backward_legacy(src, dst, ctx.item_width)
            }
        }
        FilterId::NdCell => {
            if forward {
                cell::forward(src, dst, ctx.item_width, ctx.block_shape, meta as usize)
            } else {
                cell::backward(src, dst, ctx.item_width, ctx.block_shape, meta as usize)
            }
        }
        FilterId::NdMean => {
            if forward {
                mean::forward(src, dst, ctx.item_width, ctx.block_shape, meta as usize)
            } else {
                mean::backward(src, dst, ctx.item_width, ctx.block_shape, meta as usize)
            }
        }
        FilterId::Custom(code) => match registry.custom.get(&code) {
            Some(f) => f(src, dst, meta, ctx, forward),
            None => Err(Error::Unsupported(format!("custom filter id {code} not registered"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_round_trips_shuffle_then_delta() {
        let mut chain = FilterChain::new();
        chain.push(FilterId::Shuffle, 0).unwrap();
        chain.push(FilterId::TruncPrec, 0).unwrap();
        let registry = FilterRegistry::default();
        let block_shape = [8usize];
        let ctx = FilterContext {
            item_width: 4,
            block_shape: &block_shape,
            reference_block: None,
        };
        let src: Vec<u8> = (0u8..32).collect();
        let forward = apply_forward(&chain, &src, &ctx, &registry).unwrap();
        let back = apply_backward(&chain, &forward, &ctx, &registry).unwrap();
        assert_eq!(back, src);
    }

    #[test]
    fn chain_rejects_overflow() {
        let mut chain = FilterChain::new();
        for _ in 0..MAX_FILTERS {
            chain.push(FilterId::None, 0).unwrap();
        }
        assert!(chain.push(FilterId::None, 0).is_err());
    }

    #[test]
    fn unregistered_custom_filter_is_unsupported() {
        let chain = {
            let mut c = FilterChain::new();
            c.push(FilterId::Custom(200), 0).unwrap();
            c
        };
        let registry = FilterRegistry::default();
        let block_shape = [4usize];
        let ctx = FilterContext {
            item_width: 4,
            block_shape: &block_shape,
            reference_block: None,
        };
        let err = apply_forward(&chain, &[0u8; 16], &ctx, &registry).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}

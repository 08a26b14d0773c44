// SPDX-License-Identifier: MIT

//! Block-addressed store with a bounded, shared block cache.
//!
//! Blocks are handed out as [`BlockRef`] handles. A handle pins its block in
//! the cache until it is dropped or explicitly [released](BlockRef::release),
//! so an early return on an error path can never leak a cache reference.
//!
//! Cached bytes are immutable: a write replaces the cached copy instead of
//! editing it, so a reader holding a handle always sees a whole block, either
//! the old content or the new one.

use alloc::{collections::BTreeMap, sync::Arc, vec};
use core::{fmt, ops::Deref};

use log::trace;
use spin::Mutex;

use crate::{Me2IO, Me2IOError, Me2IOResult};

/// Shared, immutable handle to the content of one block.
#[derive(Clone)]
pub struct BlockRef {
    block: u32,
    data: Arc<[u8]>,
}

impl BlockRef {
    #[inline]
    pub fn new(block: u32, data: Arc<[u8]>) -> Self {
        Self { block, data }
    }

    /// Block number this handle was read from.
    #[inline]
    pub fn block(&self) -> u32 {
        self.block
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Releases the handle. Equivalent to dropping it.
    #[inline]
    pub fn release(self) {}

    /// Number of live handles (cache slot included) sharing this block.
    #[inline]
    pub fn pins(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}

impl Deref for BlockRef {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for BlockRef {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockRef")
            .field("block", &self.block)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Block-addressed storage.
///
/// Methods take `&self`: implementations provide their own per-block
/// consistency so that many readers can share one store.
pub trait BlockStore {
    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Reads block `block`.
    fn read_block(&self, block: u32) -> Me2IOResult<BlockRef>;

    /// Writes block `block`. `data.len()` must equal [`Self::block_size`].
    fn write_block(&self, block: u32, data: &[u8]) -> Me2IOResult;
}

impl<S: BlockStore + ?Sized> BlockStore for &S {
    #[inline]
    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    #[inline]
    fn read_block(&self, block: u32) -> Me2IOResult<BlockRef> {
        (**self).read_block(block)
    }

    #[inline]
    fn write_block(&self, block: u32, data: &[u8]) -> Me2IOResult {
        (**self).write_block(block, data)
    }
}

impl<S: BlockStore + ?Sized> BlockStore for Arc<S> {
    #[inline]
    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    #[inline]
    fn read_block(&self, block: u32) -> Me2IOResult<BlockRef> {
        (**self).read_block(block)
    }

    #[inline]
    fn write_block(&self, block: u32, data: &[u8]) -> Me2IOResult {
        (**self).write_block(block, data)
    }
}

/// Cache counters.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub writes: u64,
}

#[derive(Debug)]
struct CacheSlot {
    data: Arc<[u8]>,
    last_use: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    slots: BTreeMap<u32, CacheSlot>,
    tick: u64,
    stats: CacheStats,
}

impl CacheState {
    fn touch(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Evicts the least recently used unpinned block, if any.
    fn evict_one(&mut self) -> bool {
        let victim = self
            .slots
            .iter()
            .filter(|(_, slot)| Arc::strong_count(&slot.data) == 1)
            .min_by_key(|(_, slot)| slot.last_use)
            .map(|(&block, _)| block);

        match victim {
            Some(block) => {
                self.slots.remove(&block);
                self.stats.evictions += 1;
                trace!("block cache: evicted block {block}");
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, block: u32, data: Arc<[u8]>, capacity: usize) {
        // Pinned blocks can push the cache over capacity; it shrinks back
        // once their handles are gone.
        while self.slots.len() >= capacity && !self.slots.contains_key(&block) {
            if !self.evict_one() {
                break;
            }
        }
        let last_use = self.touch();
        self.slots.insert(block, CacheSlot { data, last_use });
    }
}

/// [`BlockStore`] over a byte device with an LRU cache of `capacity` blocks.
///
/// Lock order is device, then cache state: a miss reads the device and
/// publishes the block while still holding the device lock, so a concurrent
/// write can never be overtaken by a stale read.
#[derive(Debug)]
pub struct CachedStore<IO: Me2IO> {
    io: Mutex<IO>,
    block_size: usize,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl<IO: Me2IO> CachedStore<IO> {
    pub fn new(io: IO, block_size: usize, capacity: usize) -> Me2IOResult<Self> {
        if block_size == 0 || !block_size.is_power_of_two() {
            return Err(Me2IOError::Invalid("block size must be a power of two"));
        }
        Ok(Self {
            io: Mutex::new(io),
            block_size,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        })
    }

    #[inline]
    fn offset_of(&self, block: u32) -> u64 {
        block as u64 * self.block_size as u64
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    /// Number of blocks currently resident.
    pub fn cached_blocks(&self) -> usize {
        self.state.lock().slots.len()
    }

    /// Drops the cached copy of `block`. Live handles keep their bytes.
    pub fn invalidate(&self, block: u32) {
        self.state.lock().slots.remove(&block);
    }

    /// Drops every unpinned cached block.
    pub fn shrink(&self) {
        let mut state = self.state.lock();
        state
            .slots
            .retain(|_, slot| Arc::strong_count(&slot.data) > 1);
    }

    pub fn flush(&self) -> Me2IOResult {
        self.io.lock().flush()
    }

    pub fn into_inner(self) -> IO {
        self.io.into_inner()
    }
}

impl<IO: Me2IO> BlockStore for CachedStore<IO> {
    #[inline]
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read_block(&self, block: u32) -> Me2IOResult<BlockRef> {
        {
            let mut state = self.state.lock();
            let tick = state.touch();
            if let Some(slot) = state.slots.get_mut(&block) {
                slot.last_use = tick;
                let data = slot.data.clone();
                state.stats.hits += 1;
                return Ok(BlockRef::new(block, data));
            }
        }

        let mut io = self.io.lock();

        // Another reader may have published the block while we waited.
        let mut state = self.state.lock();
        if let Some(slot) = state.slots.get(&block) {
            let data = slot.data.clone();
            state.stats.hits += 1;
            return Ok(BlockRef::new(block, data));
        }
        drop(state);

        let mut buf = vec![0u8; self.block_size];
        io.read_at(self.offset_of(block), &mut buf)?;
        let data: Arc<[u8]> = buf.into();
        trace!("block cache: miss on block {block}");

        let mut state = self.state.lock();
        state.stats.misses += 1;
        state.insert(block, data.clone(), self.capacity);
        Ok(BlockRef::new(block, data))
    }

    fn write_block(&self, block: u32, data: &[u8]) -> Me2IOResult {
        if data.len() != self.block_size {
            return Err(Me2IOError::Invalid("write_block: length != block size"));
        }

        let mut io = self.io.lock();
        io.write_at(self.offset_of(block), data)?;

        let mut state = self.state.lock();
        state.stats.writes += 1;
        state.slots.remove(&block);
        state.insert(block, Arc::from(data), self.capacity);
        Ok(())
    }
}

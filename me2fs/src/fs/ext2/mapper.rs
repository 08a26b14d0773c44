// SPDX-License-Identifier: MIT

//! Block mapper: logical block index to physical block through the
//! direct / single / double / triple indirect pointer tree.

use log::{trace, warn};
use me2io::prelude::*;

use crate::core::errors::{FsMapError, FsMapResult};
use crate::fs::ext2::{constant::*, meta::Me2Meta, types::Me2Inode};

/// Route of a logical block through the pointer tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPath {
    /// 0 for a direct block, 1..=3 for the indirection level
    pub depth: u8,
    /// `offsets[0]` is the `i_block` slot, `offsets[1..=depth]` the slot in
    /// each indirect block on the way down
    pub offsets: [u32; 4],
}

/// Result of resolving one logical block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapping {
    Mapped(u32),
    /// Unallocated. `depth` is the level of the zero pointer (0 = the
    /// `i_block` slot); `span` counts the logical blocks from the queried
    /// index to the end of the unallocated subtree, all of them holes.
    Hole { depth: u8, span: u64 },
}

pub struct BlockMapper<'a, S: BlockStore + ?Sized> {
    store: &'a S,
    meta: &'a Me2Meta,
}

impl<'a, S: BlockStore + ?Sized> BlockMapper<'a, S> {
    pub fn new(store: &'a S, meta: &'a Me2Meta) -> Self {
        Self { store, meta }
    }

    #[inline]
    pub fn max_logical_blocks(&self) -> u64 {
        self.meta.max_logical_blocks()
    }

    /// Computes the depth and per-depth slots of logical block `index`.
    pub fn block_path(&self, index: u64) -> FsMapResult<BlockPath> {
        let a = self.meta.addr_per_block as u64;
        let mut rel = index;
        // Blocks addressed by each tier: 12, A, A², A³
        let mut capacity = ME2FS_NDIR_BLOCKS as u64;

        for depth in 0..=3u8 {
            if rel < capacity {
                let mut offsets = [0u32; 4];
                if depth == 0 {
                    offsets[0] = rel as u32;
                } else {
                    offsets[0] = (ME2FS_IND_BLOCK + depth as usize - 1) as u32;
                    let mut divisor = capacity / a;
                    for slot in offsets.iter_mut().skip(1).take(depth as usize) {
                        *slot = ((rel / divisor) % a) as u32;
                        divisor /= a;
                    }
                }
                return Ok(BlockPath { depth, offsets });
            }
            rel -= capacity;
            capacity = if depth == 0 { a } else { capacity * a };
        }
        Err(FsMapError::BlockIndexOutOfRange(index))
    }

    /// Resolves logical block `index` of `inode`. Zero pointers anywhere on
    /// the path yield [`Mapping::Hole`].
    pub fn resolve(&self, inode: &Me2Inode, index: u64) -> FsMapResult<Mapping> {
        let path = self.block_path(index)?;
        let mut ptr = inode.block(path.offsets[0] as usize);

        for level in 0..=path.depth {
            if ptr == 0 {
                let span = self.hole_span(&path, level);
                trace!("ext2: block {index} is a hole (depth {level}, span {span})");
                return Ok(Mapping::Hole { depth: level, span });
            }
            if ptr >= self.meta.blocks_count {
                warn!("ext2: block pointer {ptr} beyond end of volume (logical block {index})");
                return Err(FsMapError::InvalidBlock(ptr));
            }
            if level == path.depth {
                break;
            }
            let block = self.store.read_block(ptr)?;
            ptr = read_pointer(&block, path.offsets[level as usize + 1])?;
            block.release();
        }

        trace!("ext2: block {index} -> {ptr}");
        Ok(Mapping::Mapped(ptr))
    }

    /// Like [`Self::resolve`], a hole being an error.
    pub fn resolve_required(&self, inode: &Me2Inode, index: u64) -> FsMapResult<u32> {
        match self.resolve(inode, index)? {
            Mapping::Mapped(block) => Ok(block),
            Mapping::Hole { depth, .. } => Err(FsMapError::HoleInIndirectChain(depth)),
        }
    }

    /// Blocks from the queried index to the end of the subtree whose root
    /// pointer at `level` is zero.
    fn hole_span(&self, path: &BlockPath, level: u8) -> u64 {
        let a = self.meta.addr_per_block as u64;
        let below = (path.depth - level) as u32;
        let subtree = a.pow(below);
        let mut position = 0u64;
        for k in level + 1..=path.depth {
            position = position * a + path.offsets[k as usize] as u64;
        }
        subtree - position
    }
}

/// Reads little-endian pointer `slot` of an indirect block.
#[inline]
pub fn read_pointer(block: &[u8], slot: u32) -> FsMapResult<u32> {
    let at = slot as usize * ME2FS_ADDR_SIZE;
    block
        .get(at..at + ME2FS_ADDR_SIZE)
        .and_then(|raw| raw.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(FsMapError::IO(Me2IOError::OutOfBounds))
}

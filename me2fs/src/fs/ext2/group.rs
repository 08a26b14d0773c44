// SPDX-License-Identifier: MIT

//! Group locator: descriptor table access, backup placement and inode
//! addressing.

use alloc::vec::Vec;

use log::{debug, trace};
use me2io::prelude::*;

use crate::core::errors::{FsGroupError, FsGroupResult, FsLayoutError};
use crate::fs::ext2::{
    constant::*, meta::Me2Meta, types::Me2GroupDesc, utils::is_sparse_super_group,
};

/// Where an inode record lives on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeLocation {
    pub group: u32,
    /// Index within the group's inode table
    pub index: u32,
    /// Inode table block holding the record
    pub block: u32,
    /// Byte offset of the record within `block`
    pub offset: usize,
}

/// Descriptor table of a mounted volume, one pinned block per descriptor
/// block.
#[derive(Debug)]
pub struct GroupTable {
    meta: Me2Meta,
    blocks: Vec<Option<BlockRef>>,
}

impl GroupTable {
    /// An empty table: no descriptor block loaded yet.
    pub fn new(meta: &Me2Meta) -> Self {
        Self {
            meta: *meta,
            blocks: (0..meta.desc_blocks).map(|_| None).collect(),
        }
    }

    /// Loads every descriptor block from the primary copy.
    pub fn load<S: BlockStore + ?Sized>(meta: &Me2Meta, store: &S) -> FsGroupResult<Self> {
        let mut table = Self::new(meta);
        for i in 0..meta.desc_blocks {
            table.load_block(store, i)?;
        }
        debug!(
            "ext2: loaded {} descriptor block(s) for {} group(s)",
            meta.desc_blocks, meta.groups_count
        );
        Ok(table)
    }

    /// Loads descriptor block `i`.
    pub fn load_block<S: BlockStore + ?Sized>(&mut self, store: &S, i: u32) -> FsGroupResult {
        let slot = self
            .blocks
            .get_mut(i as usize)
            .ok_or(FsGroupError::DescriptorBlockMissing(i))?;
        let location = self.meta.first_data_block + 1 + i;
        *slot = Some(store.read_block(location)?);
        trace!("ext2: descriptor block {i} read from block {location}");
        Ok(())
    }

    #[inline]
    pub fn meta(&self) -> &Me2Meta {
        &self.meta
    }

    #[inline]
    pub fn groups_count(&self) -> u32 {
        self.meta.groups_count
    }

    pub fn is_loaded(&self, i: u32) -> bool {
        matches!(self.blocks.get(i as usize), Some(Some(_)))
    }

    /// Block number of descriptor block `i` in the primary copy.
    #[inline]
    pub fn descriptor_block_location(&self, i: u32) -> u32 {
        self.meta.first_data_block + 1 + i
    }

    /// Descriptor of group `group`.
    pub fn descriptor_for(&self, group: u32) -> FsGroupResult<Me2GroupDesc> {
        if group >= self.meta.groups_count {
            return Err(FsGroupError::GroupOutOfRange(group));
        }
        let block = group / self.meta.desc_per_block;
        let offset = (group % self.meta.desc_per_block) as usize * ME2FS_GROUP_DESC_SIZE;

        let data = self
            .blocks
            .get(block as usize)
            .and_then(Option::as_ref)
            .ok_or(FsGroupError::DescriptorBlockMissing(block))?;
        let raw = data
            .get(offset..offset + ME2FS_GROUP_DESC_SIZE)
            .ok_or(FsLayoutError::Truncated {
                needed: offset + ME2FS_GROUP_DESC_SIZE,
                got: data.len(),
            })?;
        Ok(Me2GroupDesc::decode(raw)?)
    }

    /// Iterates over `(group, descriptor)` for every group.
    pub fn descriptors(&self) -> impl Iterator<Item = FsGroupResult<(u32, Me2GroupDesc)>> + '_ {
        (0..self.meta.groups_count).map(|g| self.descriptor_for(g).map(|d| (g, d)))
    }

    /// `true` if `group` starts with a superblock and descriptor table copy.
    pub fn has_superblock_copy(&self, group: u32) -> bool {
        if group <= 1 || !self.meta.is_sparse_super() {
            return true;
        }
        is_sparse_super_group(group)
    }

    /// Groups other than 0 that carry a backup copy.
    pub fn backup_groups(&self) -> impl Iterator<Item = u32> + '_ {
        (1..self.meta.groups_count).filter(|&g| self.has_superblock_copy(g))
    }

    /// First block of `group`. Groups past the end are rejected, so the result
    /// always lies inside the volume.
    #[inline]
    pub fn first_block_of(&self, group: u32) -> FsGroupResult<u32> {
        if group >= self.meta.groups_count {
            return Err(FsGroupError::GroupOutOfRange(group));
        }
        Ok(group * self.meta.blocks_per_group + self.meta.first_data_block)
    }

    /// Last block of `group`. The last group may be short.
    pub fn last_block_of(&self, group: u32) -> FsGroupResult<u32> {
        if group >= self.meta.groups_count {
            return Err(FsGroupError::GroupOutOfRange(group));
        }
        if group == self.meta.groups_count - 1 {
            Ok(self.meta.blocks_count - 1)
        } else {
            Ok(self.first_block_of(group + 1)? - 1)
        }
    }

    /// Blocks taken by the superblock copy and descriptor table at the start
    /// of `group`.
    pub fn reserved_blocks_in_group(&self, group: u32) -> u32 {
        if self.has_superblock_copy(group) {
            1 + self.meta.desc_blocks + self.meta.reserved_gdt_blocks
        } else {
            0
        }
    }

    pub fn first_usable_block_of(&self, group: u32) -> FsGroupResult<u32> {
        Ok(self.first_block_of(group)? + self.reserved_blocks_in_group(group))
    }

    /// Locates inode `ino` (1-based).
    pub fn inode_location(&self, ino: u32) -> FsGroupResult<InodeLocation> {
        if ino == 0 || ino > self.meta.inodes_count {
            return Err(FsGroupError::InvalidInode(ino));
        }
        let group = (ino - 1) / self.meta.inodes_per_group;
        let index = (ino - 1) % self.meta.inodes_per_group;
        let desc = self.descriptor_for(group)?;

        let block = desc
            .inode_table()
            .checked_add(index / self.meta.inodes_per_block)
            .filter(|&block| block < self.meta.blocks_count)
            .ok_or(FsLayoutError::Invalid("inode table beyond end of volume"))?;
        let offset = ((index % self.meta.inodes_per_block) * self.meta.inode_size) as usize;
        Ok(InodeLocation {
            group,
            index,
            block,
            offset,
        })
    }
}

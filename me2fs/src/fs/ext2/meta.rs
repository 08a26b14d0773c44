// SPDX-License-Identifier: MIT

use crate::core::errors::{FsMountError, FsMountResult};
use crate::ensure;
use crate::fs::ext2::{constant::*, types::Me2Superblock};

/// Geometry derived once from the superblock and immutable for the mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Me2Meta {
    pub block_size: u32,
    /// Block pointers per indirect block
    pub addr_per_block: u32,
    pub blocks_count: u32,
    pub inodes_count: u32,
    pub first_data_block: u32,
    pub blocks_per_group: u32,
    pub frags_per_group: u32,
    pub inodes_per_group: u32,
    pub groups_count: u32,
    /// Group descriptors per block
    pub desc_per_block: u32,
    /// Blocks holding the descriptor table
    pub desc_blocks: u32,
    pub inode_size: u32,
    pub inodes_per_block: u32,
    /// Inode table blocks per group
    pub itb_per_group: u32,
    pub first_ino: u32,
    pub reserved_gdt_blocks: u32,
    pub compat: CompatFeatures,
    pub incompat: IncompatFeatures,
    pub ro_compat: RoCompatFeatures,
}

impl Me2Meta {
    /// Computes and validates the geometry. With `check_geometry` the block
    /// and inode counts must agree on the number of groups.
    pub fn from_superblock(sb: &Me2Superblock, check_geometry: bool) -> FsMountResult<Self> {
        let block_size = sb.block_size();
        ensure!(
            block_size.is_power_of_two()
                && (ME2FS_MIN_BLOCK_SIZE..=ME2FS_MAX_BLOCK_SIZE).contains(&block_size),
            FsMountError::Invalid("block size out of range")
        );

        let bitmap_bits = block_size * 8;
        let blocks_per_group = sb.s_blocks_per_group.get();
        let inodes_per_group = sb.s_inodes_per_group.get();
        ensure!(
            blocks_per_group != 0 && blocks_per_group <= bitmap_bits,
            FsMountError::Invalid("blocks per group out of range")
        );
        ensure!(
            inodes_per_group != 0 && inodes_per_group <= bitmap_bits,
            FsMountError::Invalid("inodes per group out of range")
        );

        let inode_size = sb.inode_size() as u32;
        ensure!(
            inode_size.is_power_of_two()
                && (ME2FS_GOOD_OLD_INODE_SIZE as u32..=block_size).contains(&inode_size),
            FsMountError::Invalid("inode size out of range")
        );

        let blocks_count = sb.s_blocks_count.get();
        let inodes_count = sb.s_inodes_count.get();
        let first_data_block = sb.s_first_data_block.get();
        ensure!(
            blocks_count > first_data_block,
            FsMountError::InconsistentGeometry("first data block beyond end of volume")
        );

        let groups_count = (blocks_count - first_data_block - 1) / blocks_per_group + 1;
        let inode_groups = inodes_count.div_ceil(inodes_per_group);
        if check_geometry {
            ensure!(
                groups_count == inode_groups,
                FsMountError::InconsistentGeometry("block and inode counts disagree on group count")
            );
        }

        let desc_per_block = block_size / ME2FS_GROUP_DESC_SIZE as u32;
        let inodes_per_block = block_size / inode_size;

        Ok(Self {
            block_size,
            addr_per_block: block_size / ME2FS_ADDR_SIZE as u32,
            blocks_count,
            inodes_count,
            first_data_block,
            blocks_per_group,
            frags_per_group: sb.s_frags_per_group.get(),
            inodes_per_group,
            groups_count,
            desc_per_block,
            desc_blocks: groups_count.div_ceil(desc_per_block),
            inode_size,
            inodes_per_block,
            itb_per_group: inodes_per_group.div_ceil(inodes_per_block),
            first_ino: sb.first_ino(),
            reserved_gdt_blocks: sb.s_reserved_gdt_blocks.get() as u32,
            compat: sb.compat(),
            incompat: sb.incompat(),
            ro_compat: sb.ro_compat(),
        })
    }

    /// Logical blocks addressable through the 15 pointer slots:
    /// `12 + A + A² + A³`.
    #[inline]
    pub fn max_logical_blocks(&self) -> u64 {
        let a = self.addr_per_block as u64;
        ME2FS_NDIR_BLOCKS as u64 + a + a * a + a * a * a
    }

    #[inline]
    pub fn has_filetype(&self) -> bool {
        self.incompat.contains(IncompatFeatures::FILETYPE)
    }

    #[inline]
    pub fn is_sparse_super(&self) -> bool {
        self.ro_compat.contains(RoCompatFeatures::SPARSE_SUPER)
    }

    #[inline]
    pub fn volume_size_bytes(&self) -> u64 {
        self.blocks_count as u64 * self.block_size as u64
    }
}

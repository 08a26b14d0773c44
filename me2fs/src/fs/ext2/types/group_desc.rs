// SPDX-License-Identifier: MIT
//! ext2 block group descriptor

use zerocopy::{
    FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, Unaligned,
    little_endian::{U16, U32},
};

use crate::core::errors::{FsLayoutError, FsLayoutResult};
use crate::fs::ext2::{constant::ME2FS_GROUP_DESC_SIZE, types::take};

/// On-disk block group descriptor (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Me2GroupDesc {
    pub bg_block_bitmap: U32,
    pub bg_inode_bitmap: U32,
    /// First block of the inode table
    pub bg_inode_table: U32,
    pub bg_free_blocks_count: U16,
    pub bg_free_inodes_count: U16,
    pub bg_used_dirs_count: U16,
    pub bg_pad: U16,
    pub bg_reserved: [u8; 12],
}

const _: () = assert!(core::mem::size_of::<Me2GroupDesc>() == ME2FS_GROUP_DESC_SIZE);

impl Me2GroupDesc {
    pub fn new(
        block_bitmap: u32,
        inode_bitmap: u32,
        inode_table: u32,
        free_blocks: u16,
        free_inodes: u16,
        used_dirs: u16,
    ) -> Self {
        let mut desc = Self::new_zeroed();
        desc.bg_block_bitmap.set(block_bitmap);
        desc.bg_inode_bitmap.set(inode_bitmap);
        desc.bg_inode_table.set(inode_table);
        desc.bg_free_blocks_count.set(free_blocks);
        desc.bg_free_inodes_count.set(free_inodes);
        desc.bg_used_dirs_count.set(used_dirs);
        desc
    }

    pub fn decode(bytes: &[u8]) -> FsLayoutResult<Self> {
        let raw = take::<ME2FS_GROUP_DESC_SIZE>(bytes)?;
        Self::read_from_bytes(raw.as_slice()).map_err(|_| FsLayoutError::Invalid("group descriptor layout"))
    }

    pub fn to_bytes(&self) -> [u8; ME2FS_GROUP_DESC_SIZE] {
        let mut out = [0u8; ME2FS_GROUP_DESC_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    #[inline]
    pub fn block_bitmap(&self) -> u32 {
        self.bg_block_bitmap.get()
    }

    #[inline]
    pub fn inode_bitmap(&self) -> u32 {
        self.bg_inode_bitmap.get()
    }

    #[inline]
    pub fn inode_table(&self) -> u32 {
        self.bg_inode_table.get()
    }

    #[inline]
    pub fn free_blocks(&self) -> u16 {
        self.bg_free_blocks_count.get()
    }

    #[inline]
    pub fn free_inodes(&self) -> u16 {
        self.bg_free_inodes_count.get()
    }

    #[inline]
    pub fn used_dirs(&self) -> u16 {
        self.bg_used_dirs_count.get()
    }
}

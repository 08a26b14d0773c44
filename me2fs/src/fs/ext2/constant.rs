// SPDX-License-Identifier: MIT

// === Superblock ===

/// Superblock magic number
pub const ME2FS_SUPER_MAGIC: u16 = 0xEF53;
/// Byte offset of `s_magic` inside the superblock
pub const ME2FS_MAGIC_OFFSET: usize = 56;
/// Superblock size in bytes
pub const ME2FS_SUPERBLOCK_SIZE: usize = 1024;
/// Byte offset of the primary superblock on the device
pub const ME2FS_SUPERBLOCK_OFFSET: u64 = 1024;

pub const ME2FS_GOOD_OLD_REV: u32 = 0;
pub const ME2FS_DYNAMIC_REV: u32 = 1;

// === Block sizes ===

pub const ME2FS_MIN_BLOCK_LOG_SIZE: u32 = 10;
pub const ME2FS_MIN_BLOCK_SIZE: u32 = 1 << ME2FS_MIN_BLOCK_LOG_SIZE;
pub const ME2FS_MAX_BLOCK_SIZE: u32 = 65536;

// === Inodes ===

pub const ME2FS_BAD_INO: u32 = 1;
pub const ME2FS_ROOT_INO: u32 = 2;
/// First non-reserved inode on revision 0
pub const ME2FS_GOOD_OLD_FIRST_INO: u32 = 11;
/// Inode size on revision 0
pub const ME2FS_GOOD_OLD_INODE_SIZE: u16 = 128;

// === Block pointers ===

pub const ME2FS_NDIR_BLOCKS: usize = 12;
pub const ME2FS_IND_BLOCK: usize = ME2FS_NDIR_BLOCKS;
pub const ME2FS_DIND_BLOCK: usize = ME2FS_IND_BLOCK + 1;
pub const ME2FS_TIND_BLOCK: usize = ME2FS_DIND_BLOCK + 1;
pub const ME2FS_NR_BLOCKS: usize = ME2FS_TIND_BLOCK + 1;
/// Size of one on-disk block pointer
pub const ME2FS_ADDR_SIZE: usize = 4;
/// Bytes available for a fast symlink target (`i_block` storage)
pub const ME2FS_FAST_SYMLINK_MAX: usize = ME2FS_NR_BLOCKS * ME2FS_ADDR_SIZE;

// === Group descriptors ===

pub const ME2FS_GROUP_DESC_SIZE: usize = 32;

// === Directory entries ===

pub const ME2FS_DIR_HEADER_LEN: usize = 8;
pub const ME2FS_DIR_PAD: usize = 4;
pub const ME2FS_NAME_LEN: usize = 255;
/// Smallest legal record: header plus a one-byte name, 4-aligned
pub const ME2FS_DIR_MIN_REC_LEN: usize = rec_len_for(1);
/// On-disk `rec_len` standing for 65536 on 64 KiB blocks
pub const ME2FS_MAX_REC_LEN: u16 = u16::MAX;

/// Record length needed for a name of `name_len` bytes.
#[inline]
pub const fn rec_len_for(name_len: usize) -> usize {
    (ME2FS_DIR_HEADER_LEN + name_len + ME2FS_DIR_PAD - 1) & !(ME2FS_DIR_PAD - 1)
}

// === Directory file-type tags ===

pub const ME2FS_FT_UNKNOWN: u8 = 0;
pub const ME2FS_FT_REG_FILE: u8 = 1;
pub const ME2FS_FT_DIR: u8 = 2;
pub const ME2FS_FT_CHRDEV: u8 = 3;
pub const ME2FS_FT_BLKDEV: u8 = 4;
pub const ME2FS_FT_FIFO: u8 = 5;
pub const ME2FS_FT_SOCK: u8 = 6;
pub const ME2FS_FT_SYMLINK: u8 = 7;
pub const ME2FS_FT_MAX: u8 = 8;

// === Feature sets ===

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompatFeatures: u32 {
        const DIR_PREALLOC  = 0x0001;
        const IMAGIC_INODES = 0x0002;
        const HAS_JOURNAL   = 0x0004;
        const EXT_ATTR      = 0x0008;
        const RESIZE_INODE  = 0x0010;
        const DIR_INDEX     = 0x0020;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IncompatFeatures: u32 {
        const COMPRESSION = 0x0001;
        const FILETYPE    = 0x0002;
        const RECOVER     = 0x0004;
        const JOURNAL_DEV = 0x0008;
        const META_BG     = 0x0010;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RoCompatFeatures: u32 {
        const SPARSE_SUPER = 0x0001;
        const LARGE_FILE   = 0x0002;
        const BTREE_DIR    = 0x0004;
    }
}

/// Incompat features this engine can read.
pub const ME2FS_SUPPORTED_INCOMPAT: IncompatFeatures = IncompatFeatures::FILETYPE;

// SPDX-License-Identifier: MIT
//! ext2 on-disk inode

use time::OffsetDateTime;
use zerocopy::{
    FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, Unaligned,
    little_endian::{U16, U32},
};

use crate::core::errors::{FsLayoutError, FsLayoutResult};
use crate::core::resolver::attr::FileKind;
use crate::core::utils::time_utils::unix_to_offsetdatetime;
use crate::fs::ext2::{attr::InodeMode, constant::*, types::take};

/// Linux flavour of the OS-dependent tail
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Me2InodeOsd2 {
    pub l_i_frag: u8,
    pub l_i_fsize: u8,
    pub i_pad1: U16,
    pub l_i_uid_high: U16,
    pub l_i_gid_high: U16,
    pub l_i_reserved2: U32,
}

/// On-disk inode (the 128-byte revision 0 core; larger records carry extra
/// fields after it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Me2Inode {
    // 0x00
    pub i_mode: U16,
    pub i_uid: U16,
    pub i_size: U32,
    pub i_atime: U32,
    pub i_ctime: U32,
    // 0x10
    pub i_mtime: U32,
    pub i_dtime: U32,
    pub i_gid: U16,
    pub i_links_count: U16,
    /// 512-byte sectors, metadata blocks included
    pub i_blocks: U32,
    // 0x20
    pub i_flags: U32,
    pub i_osd1: U32,
    // 0x28
    pub i_block: [U32; ME2FS_NR_BLOCKS],
    // 0x64
    pub i_generation: U32,
    pub i_file_acl: U32,
    /// High 32 bits of the size for regular files
    pub i_dir_acl: U32,
    pub i_faddr: U32,
    // 0x74
    pub osd2: Me2InodeOsd2,
}

pub const ME2FS_INODE_CORE_SIZE: usize = 128;

const _: () = assert!(core::mem::size_of::<Me2Inode>() == ME2FS_INODE_CORE_SIZE);
const _: () = assert!(core::mem::offset_of!(Me2Inode, i_block) == 40);

impl Me2Inode {
    /// A zeroed inode with the given mode and 32-bit size.
    pub fn new(mode: InodeMode, size: u32) -> Self {
        let mut inode = Self::new_zeroed();
        inode.i_mode.set(mode.bits());
        inode.i_size.set(size);
        inode.i_links_count.set(1);
        inode
    }

    /// Decodes the 128-byte core from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> FsLayoutResult<Self> {
        let raw = take::<ME2FS_INODE_CORE_SIZE>(bytes)?;
        Self::read_from_bytes(raw.as_slice()).map_err(|_| FsLayoutError::Invalid("inode layout"))
    }

    pub fn to_bytes(&self) -> [u8; ME2FS_INODE_CORE_SIZE] {
        let mut out = [0u8; ME2FS_INODE_CORE_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    #[inline]
    pub fn mode(&self) -> InodeMode {
        InodeMode::from_bits_retain(self.i_mode.get())
    }

    #[inline]
    pub fn kind(&self) -> FileKind {
        self.mode().kind()
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind() == FileKind::Directory
    }

    /// Logical size. Regular files on `LARGE_FILE` volumes keep the high
    /// half in `i_dir_acl`.
    #[inline]
    pub fn size(&self, ro: RoCompatFeatures) -> u64 {
        let lo = self.i_size.get() as u64;
        if self.kind() == FileKind::Regular && ro.contains(RoCompatFeatures::LARGE_FILE) {
            lo | (self.i_dir_acl.get() as u64) << 32
        } else {
            lo
        }
    }

    #[inline]
    pub fn uid(&self) -> u32 {
        self.i_uid.get() as u32 | (self.osd2.l_i_uid_high.get() as u32) << 16
    }

    #[inline]
    pub fn gid(&self) -> u32 {
        self.i_gid.get() as u32 | (self.osd2.l_i_gid_high.get() as u32) << 16
    }

    #[inline]
    pub fn links(&self) -> u16 {
        self.i_links_count.get()
    }

    #[inline]
    pub fn flags(&self) -> u32 {
        self.i_flags.get()
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.i_generation.get()
    }

    #[inline]
    pub fn file_acl(&self) -> u32 {
        self.i_file_acl.get()
    }

    /// Allocated 512-byte sectors.
    #[inline]
    pub fn sectors(&self) -> u32 {
        self.i_blocks.get()
    }

    pub fn accessed(&self) -> Option<OffsetDateTime> {
        unix_to_offsetdatetime(self.i_atime.get())
    }

    pub fn modified(&self) -> Option<OffsetDateTime> {
        unix_to_offsetdatetime(self.i_mtime.get())
    }

    pub fn changed(&self) -> Option<OffsetDateTime> {
        unix_to_offsetdatetime(self.i_ctime.get())
    }

    pub fn deleted(&self) -> Option<OffsetDateTime> {
        unix_to_offsetdatetime(self.i_dtime.get())
    }

    /// Block pointer slot `i` (0..15). Out-of-range slots read as 0.
    #[inline]
    pub fn block(&self, i: usize) -> u32 {
        self.i_block.get(i).map_or(0, |b| b.get())
    }

    #[inline]
    pub fn set_block(&mut self, i: usize, block: u32) {
        if let Some(slot) = self.i_block.get_mut(i) {
            slot.set(block);
        }
    }

    pub fn block_pointers(&self) -> [u32; ME2FS_NR_BLOCKS] {
        self.i_block.map(|b| b.get())
    }

    /// Raw `i_block` bytes, which hold the target of a fast symlink.
    #[inline]
    pub fn inline_data(&self) -> &[u8] {
        self.i_block.as_bytes()
    }

    /// A symlink whose target lives in `i_block`: it owns no data block
    /// (an xattr block, if any, is not data).
    pub fn is_fast_symlink(&self, block_size: u32) -> bool {
        let ea_sectors = if self.file_acl() != 0 {
            block_size >> 9
        } else {
            0
        };
        self.kind() == FileKind::Symlink && self.sectors().saturating_sub(ea_sectors) == 0
    }
}

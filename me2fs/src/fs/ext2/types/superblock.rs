// SPDX-License-Identifier: MIT
//! ext2 superblock

use alloc::string::String;
use zerocopy::{
    FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, Unaligned,
    little_endian::{U16, U32},
};

use crate::core::errors::{FsLayoutError, FsLayoutResult};
use crate::fs::ext2::{constant::*, types::take};

/// On-disk superblock (1024 bytes, little-endian)
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Me2Superblock {
    // 0x00
    pub s_inodes_count: U32,
    pub s_blocks_count: U32,
    pub s_r_blocks_count: U32,
    pub s_free_blocks_count: U32,
    // 0x10
    pub s_free_inodes_count: U32,
    pub s_first_data_block: U32,
    /// Block size = 1024 << s_log_block_size
    pub s_log_block_size: U32,
    pub s_log_frag_size: U32,
    // 0x20
    pub s_blocks_per_group: U32,
    pub s_frags_per_group: U32,
    pub s_inodes_per_group: U32,
    pub s_mtime: U32,
    // 0x30
    pub s_wtime: U32,
    pub s_mnt_count: U16,
    pub s_max_mnt_count: U16,
    pub s_magic: U16,
    pub s_state: U16,
    pub s_errors: U16,
    pub s_minor_rev_level: U16,
    // 0x40
    pub s_lastcheck: U32,
    pub s_checkinterval: U32,
    pub s_creator_os: U32,
    pub s_rev_level: U32,
    // 0x50
    pub s_def_resuid: U16,
    pub s_def_resgid: U16,
    // Dynamic revision only
    pub s_first_ino: U32,
    pub s_inode_size: U16,
    pub s_block_group_nr: U16,
    pub s_feature_compat: U32,
    // 0x60
    pub s_feature_incompat: U32,
    pub s_feature_ro_compat: U32,
    pub s_uuid: [u8; 16],
    // 0x78
    pub s_volume_name: [u8; 16],
    // 0x88
    pub s_last_mounted: [u8; 64],
    // 0xC8
    pub s_algorithm_usage_bitmap: U32,
    pub s_prealloc_blocks: u8,
    pub s_prealloc_dir_blocks: u8,
    pub s_reserved_gdt_blocks: U16,
    // 0xD0
    pub s_journal_uuid: [u8; 16],
    // 0xE0
    pub s_journal_inum: U32,
    pub s_journal_dev: U32,
    pub s_last_orphan: U32,
    pub s_hash_seed: [U32; 4],
    pub s_def_hash_version: u8,
    pub s_reserved_char_pad: u8,
    pub s_reserved_word_pad: U16,
    // 0x100
    pub s_default_mount_opts: U32,
    pub s_first_meta_bg: U32,
    // 0x108
    pub s_reserved: [U32; 190],
}

const _: () = assert!(core::mem::size_of::<Me2Superblock>() == ME2FS_SUPERBLOCK_SIZE);
const _: () = assert!(core::mem::offset_of!(Me2Superblock, s_magic) == ME2FS_MAGIC_OFFSET);

impl Me2Superblock {
    /// Decodes a zero-copy view over `bytes`, checking the magic number.
    pub fn view(bytes: &[u8]) -> FsLayoutResult<&Self> {
        let raw = take::<ME2FS_SUPERBLOCK_SIZE>(bytes)?;
        let sb = Self::ref_from_bytes(raw.as_slice())
            .map_err(|_| FsLayoutError::Invalid("superblock layout"))?;
        if sb.s_magic.get() != ME2FS_SUPER_MAGIC {
            return Err(FsLayoutError::InvalidMagic(sb.s_magic.get()));
        }
        Ok(sb)
    }

    /// Owning variant of [`Self::view`].
    pub fn decode(bytes: &[u8]) -> FsLayoutResult<Self> {
        Self::view(bytes).copied()
    }

    /// Encode to raw bytes
    pub fn to_bytes(&self) -> [u8; ME2FS_SUPERBLOCK_SIZE] {
        let mut out = [0u8; ME2FS_SUPERBLOCK_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// A zeroed dynamic-revision superblock with a valid magic number.
    pub fn empty() -> Self {
        let mut sb = Self::new_zeroed();
        sb.s_magic.set(ME2FS_SUPER_MAGIC);
        sb.s_rev_level.set(ME2FS_DYNAMIC_REV);
        sb.s_first_ino.set(ME2FS_GOOD_OLD_FIRST_INO);
        sb.s_inode_size.set(ME2FS_GOOD_OLD_INODE_SIZE);
        sb.s_state.set(1);
        sb.s_errors.set(1);
        sb
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.s_magic.get() == ME2FS_SUPER_MAGIC
    }

    /// Block size in bytes. Out-of-range shifts yield 0 and are rejected by
    /// geometry validation.
    #[inline]
    pub fn block_size(&self) -> u32 {
        match self.s_log_block_size.get() {
            log @ 0..=6 => ME2FS_MIN_BLOCK_SIZE << log,
            _ => 0,
        }
    }

    #[inline]
    pub fn rev_level(&self) -> u32 {
        self.s_rev_level.get()
    }

    /// Inode record size: fixed on revision 0, stored on dynamic revision.
    #[inline]
    pub fn inode_size(&self) -> u16 {
        if self.rev_level() == ME2FS_GOOD_OLD_REV {
            ME2FS_GOOD_OLD_INODE_SIZE
        } else {
            self.s_inode_size.get()
        }
    }

    /// First non-reserved inode.
    #[inline]
    pub fn first_ino(&self) -> u32 {
        if self.rev_level() == ME2FS_GOOD_OLD_REV {
            ME2FS_GOOD_OLD_FIRST_INO
        } else {
            self.s_first_ino.get()
        }
    }

    /// Feature words are only meaningful on dynamic revision.
    #[inline]
    pub fn compat(&self) -> CompatFeatures {
        match self.rev_level() {
            ME2FS_GOOD_OLD_REV => CompatFeatures::empty(),
            _ => CompatFeatures::from_bits_retain(self.s_feature_compat.get()),
        }
    }

    #[inline]
    pub fn incompat(&self) -> IncompatFeatures {
        match self.rev_level() {
            ME2FS_GOOD_OLD_REV => IncompatFeatures::empty(),
            _ => IncompatFeatures::from_bits_retain(self.s_feature_incompat.get()),
        }
    }

    #[inline]
    pub fn ro_compat(&self) -> RoCompatFeatures {
        match self.rev_level() {
            ME2FS_GOOD_OLD_REV => RoCompatFeatures::empty(),
            _ => RoCompatFeatures::from_bits_retain(self.s_feature_ro_compat.get()),
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self.s_state.get() {
            1 => "clean",
            2 => "errors",
            _ => "not clean",
        }
    }

    pub fn errors_behavior(&self) -> &'static str {
        match self.s_errors.get() {
            1 => "continue",
            2 => "remount-ro",
            3 => "panic",
            _ => "unknown",
        }
    }

    pub fn creator_os(&self) -> &'static str {
        match self.s_creator_os.get() {
            0 => "Linux",
            1 => "Hurd",
            2 => "Masix",
            3 => "FreeBSD",
            4 => "Lites",
            _ => "unknown",
        }
    }

    /// Volume UUID in the usual 8-4-4-4-12 form.
    pub fn uuid_string(&self) -> String {
        let mut out = String::with_capacity(36);
        for (i, b) in self.s_uuid.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                out.push('-');
            }
            out.push_str(&format!("{b:02x}"));
        }
        out
    }

    pub fn label(&self) -> String {
        nul_terminated(&self.s_volume_name)
    }

    pub fn last_mounted(&self) -> String {
        nul_terminated(&self.s_last_mounted)
    }
}

fn nul_terminated(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

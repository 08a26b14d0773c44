// SPDX-License-Identifier: MIT
//! ext2 directory entry record

use alloc::{borrow::Cow, string::String, vec::Vec};
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    little_endian::{U16, U32},
};

use crate::core::errors::{FsLayoutError, FsLayoutResult};
use crate::fs::ext2::{attr::FileType, constant::*, types::take};

/// Fixed 8-byte head of every directory record
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Me2DirEntryHeader {
    /// 0 marks an unused record
    pub inode: U32,
    /// Total record length, header, name and padding included
    pub rec_len: U16,
    pub name_len: u8,
    /// `ME2FS_FT_*` tag, meaningful only with the FILETYPE feature
    pub file_type: u8,
}

const _: () = assert!(core::mem::size_of::<Me2DirEntryHeader>() == ME2FS_DIR_HEADER_LEN);

impl Me2DirEntryHeader {
    pub fn decode(bytes: &[u8]) -> FsLayoutResult<Self> {
        let raw = take::<ME2FS_DIR_HEADER_LEN>(bytes)?;
        Self::read_from_bytes(raw.as_slice()).map_err(|_| FsLayoutError::Invalid("dirent layout"))
    }
}

/// Decodes an on-disk `rec_len`. 64 KiB blocks store a full-block record as
/// `0xFFFF`.
#[inline]
pub fn rec_len_from_disk(raw: u16, block_size: usize) -> usize {
    if raw == ME2FS_MAX_REC_LEN && block_size >= 1 << 16 {
        1 << 16
    } else {
        raw as usize
    }
}

/// Inverse of [`rec_len_from_disk`].
#[inline]
pub fn rec_len_to_disk(len: usize, block_size: usize) -> u16 {
    if len >= 1 << 16 && block_size >= 1 << 16 {
        ME2FS_MAX_REC_LEN
    } else {
        len as u16
    }
}

/// Owned directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub inode: u32,
    pub name: Vec<u8>,
    pub file_type: FileType,
    /// Byte offset of the record within the directory
    pub position: u64,
}

impl DirEntry {
    pub fn new(inode: u32, name: &[u8], file_type: FileType) -> Self {
        Self {
            inode,
            name: name.to_vec(),
            file_type,
            position: 0,
        }
    }

    pub fn dot(current_inode: u32) -> Self {
        Self::new(current_inode, b".", FileType::Dir)
    }

    pub fn dotdot(parent_inode: u32) -> Self {
        Self::new(parent_inode, b"..", FileType::Dir)
    }

    /// Minimum record length for this name.
    #[inline]
    pub fn min_rec_len(&self) -> usize {
        rec_len_for(self.name.len())
    }

    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub fn is_dot_or_dotdot(&self) -> bool {
        self.name == b"." || self.name == b".."
    }

    /// Writes the record into `out[..rec_len]`, zero padded.
    pub fn encode_into(&self, out: &mut [u8], rec_len: usize, block_size: usize) -> FsLayoutResult {
        if self.name.is_empty() || self.name.len() > ME2FS_NAME_LEN {
            return Err(FsLayoutError::Invalid("dirent name length"));
        }
        if rec_len < self.min_rec_len() || rec_len % ME2FS_DIR_PAD != 0 {
            return Err(FsLayoutError::Invalid("dirent rec_len"));
        }
        if out.len() < rec_len {
            return Err(FsLayoutError::Truncated {
                needed: rec_len,
                got: out.len(),
            });
        }
        let header = Me2DirEntryHeader {
            inode: U32::new(self.inode),
            rec_len: U16::new(rec_len_to_disk(rec_len, block_size)),
            name_len: self.name.len() as u8,
            file_type: self.file_type.tag(),
        };
        let out = &mut out[..rec_len];
        out.fill(0);
        out[..ME2FS_DIR_HEADER_LEN].copy_from_slice(header.as_bytes());
        out[ME2FS_DIR_HEADER_LEN..ME2FS_DIR_HEADER_LEN + self.name.len()].copy_from_slice(&self.name);
        Ok(())
    }
}

/// Lays `entries` out in one directory block, the last record stretched to
/// the block end.
pub fn pack_dir_block(entries: &[DirEntry], block_size: usize) -> FsLayoutResult<Vec<u8>> {
    let mut block = vec![0u8; block_size];
    let mut pos = 0usize;
    for (i, entry) in entries.iter().enumerate() {
        let rec_len = if i + 1 == entries.len() {
            block_size - pos
        } else {
            entry.min_rec_len()
        };
        if pos + entry.min_rec_len() > block_size {
            return Err(FsLayoutError::Invalid("entries do not fit in one block"));
        }
        entry.encode_into(&mut block[pos..], rec_len, block_size)?;
        pos += rec_len;
    }
    if entries.is_empty() {
        // A single unused record spanning the block
        let header = Me2DirEntryHeader {
            inode: U32::new(0),
            rec_len: U16::new(rec_len_to_disk(block_size, block_size)),
            name_len: 0,
            file_type: 0,
        };
        block[..ME2FS_DIR_HEADER_LEN].copy_from_slice(header.as_bytes());
    }
    Ok(block)
}

// SPDX-License-Identifier: MIT

pub mod dirent;
pub mod group_desc;
pub mod inode;
pub mod superblock;

pub use dirent::*;
pub use group_desc::*;
pub use inode::*;
pub use superblock::*;

use crate::core::errors::{FsLayoutError, FsLayoutResult};

/// Returns the first `N` bytes of `bytes`, or `Truncated`.
#[inline]
pub(crate) fn take<const N: usize>(bytes: &[u8]) -> FsLayoutResult<&[u8; N]> {
    bytes.first_chunk::<N>().ok_or(FsLayoutError::Truncated {
        needed: N,
        got: bytes.len(),
    })
}

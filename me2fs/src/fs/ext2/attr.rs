// SPDX-License-Identifier: MIT

use crate::core::resolver::attr::{FileAttributes, FileKind};
use crate::fs::ext2::{constant::*, types::Me2Inode};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InodeMode: u16 {
        // File type (compare under TYPE_MASK, the values overlap)
        const TYPE_MASK = 0xF000;
        const SOCKET  = 0xC000;
        const SYMLINK = 0xA000;
        const REGULAR = 0x8000;
        const BLOCK   = 0x6000;
        const DIR     = 0x4000;
        const CHARDEV = 0x2000;
        const FIFO    = 0x1000;

        const SETUID = 0x0800;
        const SETGID = 0x0400;
        const STICKY = 0x0200;

        // Owner permissions
        const OWNER_R = 0x0100;
        const OWNER_W = 0x0080;
        const OWNER_X = 0x0040;

        // Group permissions
        const GROUP_R = 0x0020;
        const GROUP_W = 0x0010;
        const GROUP_X = 0x0008;

        // Others permissions
        const OTHER_R = 0x0004;
        const OTHER_W = 0x0002;
        const OTHER_X = 0x0001;
    }
}

impl InodeMode {
    pub fn kind(self) -> FileKind {
        match self.bits() & Self::TYPE_MASK.bits() {
            0xC000 => FileKind::Socket,
            0xA000 => FileKind::Symlink,
            0x8000 => FileKind::Regular,
            0x6000 => FileKind::BlockDevice,
            0x4000 => FileKind::Directory,
            0x2000 => FileKind::CharDevice,
            0x1000 => FileKind::Fifo,
            _ => FileKind::Unknown,
        }
    }

    /// Permission and set-id bits (`0o7777`).
    #[inline]
    pub fn permissions(self) -> u16 {
        self.bits() & 0o7777
    }
}

/// Directory entry file-type tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FileType {
    #[default]
    Unknown,
    RegFile,
    Dir,
    ChrDev,
    BlkDev,
    Fifo,
    Sock,
    Symlink,
}

impl FileType {
    /// Decodes an on-disk tag. Tags at or beyond `ME2FS_FT_MAX` are UNKNOWN.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            ME2FS_FT_REG_FILE => FileType::RegFile,
            ME2FS_FT_DIR => FileType::Dir,
            ME2FS_FT_CHRDEV => FileType::ChrDev,
            ME2FS_FT_BLKDEV => FileType::BlkDev,
            ME2FS_FT_FIFO => FileType::Fifo,
            ME2FS_FT_SOCK => FileType::Sock,
            ME2FS_FT_SYMLINK => FileType::Symlink,
            _ => FileType::Unknown,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            FileType::Unknown => ME2FS_FT_UNKNOWN,
            FileType::RegFile => ME2FS_FT_REG_FILE,
            FileType::Dir => ME2FS_FT_DIR,
            FileType::ChrDev => ME2FS_FT_CHRDEV,
            FileType::BlkDev => ME2FS_FT_BLKDEV,
            FileType::Fifo => ME2FS_FT_FIFO,
            FileType::Sock => ME2FS_FT_SOCK,
            FileType::Symlink => ME2FS_FT_SYMLINK,
        }
    }

    pub fn kind(self) -> FileKind {
        match self {
            FileType::Unknown => FileKind::Unknown,
            FileType::RegFile => FileKind::Regular,
            FileType::Dir => FileKind::Directory,
            FileType::ChrDev => FileKind::CharDevice,
            FileType::BlkDev => FileKind::BlockDevice,
            FileType::Fifo => FileKind::Fifo,
            FileType::Sock => FileKind::Socket,
            FileType::Symlink => FileKind::Symlink,
        }
    }

    pub fn from_kind(kind: FileKind) -> Self {
        match kind {
            FileKind::Unknown => FileType::Unknown,
            FileKind::Regular => FileType::RegFile,
            FileKind::Directory => FileType::Dir,
            FileKind::CharDevice => FileType::ChrDev,
            FileKind::BlockDevice => FileType::BlkDev,
            FileKind::Fifo => FileType::Fifo,
            FileKind::Socket => FileType::Sock,
            FileKind::Symlink => FileType::Symlink,
        }
    }
}

impl FileAttributes {
    pub fn from_ext2_inode(inode: &Me2Inode, ro: RoCompatFeatures) -> Self {
        Self {
            kind: inode.kind(),
            mode: inode.mode().permissions(),
            uid: inode.uid(),
            gid: inode.gid(),
            size: inode.size(ro),
            links: inode.links(),
            accessed: inode.accessed(),
            modified: inode.modified(),
            changed: inode.changed(),
        }
    }

    pub fn as_ext2_mode(&self) -> InodeMode {
        let type_bits = match self.kind {
            FileKind::Regular | FileKind::Unknown => InodeMode::REGULAR,
            FileKind::Directory => InodeMode::DIR,
            FileKind::CharDevice => InodeMode::CHARDEV,
            FileKind::BlockDevice => InodeMode::BLOCK,
            FileKind::Fifo => InodeMode::FIFO,
            FileKind::Socket => InodeMode::SOCKET,
            FileKind::Symlink => InodeMode::SYMLINK,
        };
        type_bits | InodeMode::from_bits_retain(self.mode & 0o7777)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_kind() {
        assert_eq!(InodeMode::from_bits_retain(0o040755).kind(), FileKind::Directory);
        assert_eq!(InodeMode::from_bits_retain(0o100644).kind(), FileKind::Regular);
        assert_eq!(InodeMode::from_bits_retain(0o120777).kind(), FileKind::Symlink);
        assert_eq!(InodeMode::from_bits_retain(0o140000).kind(), FileKind::Socket);
        assert_eq!(InodeMode::from_bits_retain(0o060600).kind(), FileKind::BlockDevice);
        assert_eq!(InodeMode::from_bits_retain(0o000644).kind(), FileKind::Unknown);
        assert_eq!(InodeMode::from_bits_retain(0o104755).permissions(), 0o4755);
    }

    #[test]
    fn test_file_type_tags() {
        for tag in 0..ME2FS_FT_MAX {
            assert_eq!(FileType::from_tag(tag).tag(), tag);
        }
        assert_eq!(FileType::from_tag(ME2FS_FT_MAX), FileType::Unknown);
        assert_eq!(FileType::from_tag(0xFF), FileType::Unknown);
        assert_eq!(FileType::from_tag(ME2FS_FT_SYMLINK).kind(), FileKind::Symlink);
    }

    #[test]
    fn test_attributes_roundtrip_mode() {
        let mut inode = Me2Inode::new(InodeMode::from_bits_retain(0o100640), 42);
        inode.i_gid.set(100);
        let attr = FileAttributes::from_ext2_inode(&inode, RoCompatFeatures::empty());
        assert!(attr.is_file());
        assert_eq!(attr.mode, 0o640);
        assert_eq!(attr.gid, 100);
        assert_eq!(attr.size, 42);
        assert_eq!(attr.as_ext2_mode().bits(), 0o100640);
    }
}

// SPDX-License-Identifier: MIT

use time::OffsetDateTime;

/// Kind of a filesystem object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FileKind {
    #[default]
    Unknown,
    Regular,
    Directory,
    CharDevice,
    BlockDevice,
    Fifo,
    Socket,
    Symlink,
}

impl FileKind {
    /// One-letter tag in the style of `ls -l`.
    pub fn tag(self) -> char {
        match self {
            FileKind::Unknown => '?',
            FileKind::Regular => '-',
            FileKind::Directory => 'd',
            FileKind::CharDevice => 'c',
            FileKind::BlockDevice => 'b',
            FileKind::Fifo => 'p',
            FileKind::Socket => 's',
            FileKind::Symlink => 'l',
        }
    }
}

/// Unix-style metadata of one filesystem object.
///
/// Fields:
/// - `kind`: object kind.
/// - `mode`: permission bits (`0o7777` range, kind bits stripped).
/// - `uid` / `gid`: owner ids.
/// - `size`: logical size in bytes.
/// - `links`: hard link count.
/// - `accessed` / `modified` / `changed`: timestamps, `None` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttributes {
    pub kind: FileKind,
    pub mode: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub links: u16,
    pub accessed: Option<OffsetDateTime>,
    pub modified: Option<OffsetDateTime>,
    pub changed: Option<OffsetDateTime>,
}

impl FileAttributes {
    /// Creates default directory attributes.
    pub fn new_dir() -> Self {
        Self {
            kind: FileKind::Directory,
            mode: 0o755,
            ..Default::default()
        }
    }

    /// Creates default regular file attributes.
    pub fn new_file() -> Self {
        Self {
            kind: FileKind::Regular,
            mode: 0o644,
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::Regular
    }

    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    /// Compares structure only (ignores timestamps).
    pub fn structural_eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.mode == other.mode
            && self.uid == other.uid
            && self.gid == other.gid
            && self.size == other.size
            && self.links == other.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_dir_and_file() {
        let dir = FileAttributes::new_dir();
        assert!(dir.is_dir());
        assert!(!dir.is_file());
        assert_eq!(dir.mode, 0o755);
        assert!(dir.modified.is_none());

        let file = FileAttributes::new_file();
        assert!(file.is_file());
        assert_eq!(file.kind.tag(), '-');
    }

    #[test]
    fn test_structural_eq_ignores_times() {
        let a = FileAttributes {
            size: 10,
            modified: Some(OffsetDateTime::UNIX_EPOCH),
            ..FileAttributes::new_file()
        };
        let b = FileAttributes {
            size: 10,
            ..FileAttributes::new_file()
        };
        assert!(a.structural_eq(&b));
        assert_ne!(a, b);
    }
}

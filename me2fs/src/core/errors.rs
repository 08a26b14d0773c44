// SPDX-License-Identifier: MIT

use core::fmt;

pub use me2io::errors::*;

/// Coarse POSIX-like error classes for a host integration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrnoClass {
    /// EIO: device failure or on-disk corruption.
    Io,
    /// ENOENT
    NotFound,
    /// ENOTDIR
    NotDir,
    /// EISDIR
    IsDir,
    /// ELOOP
    Loop,
    /// EINVAL
    Invalid,
}

macro_rules! impl_chain_display {
    ($($t:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $t {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.msg())?;
                    self.fmt_detail(f)?;
                    let mut current = self.source();
                    while let Some(src) = current {
                        write!(f, "\n  caused by: {}", src.msg())?;
                        current = src.source();
                    }
                    Ok(())
                }
            }

            #[cfg(feature = "std")]
            impl ::std::error::Error for $t {}
        )+
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsLayoutError {
    InvalidMagic(u16),
    Truncated { needed: usize, got: usize },
    Invalid(&'static str),
}

impl FsLayoutError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsLayoutError::InvalidMagic(_) => "Invalid superblock magic",
            FsLayoutError::Truncated { .. } => "Truncated on-disk structure",
            FsLayoutError::Invalid(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        None
    }

    fn fmt_detail(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsLayoutError::InvalidMagic(magic) => write!(f, " (found: {magic:#06x})"),
            FsLayoutError::Truncated { needed, got } => {
                write!(f, " (needed {needed} bytes, got {got})")
            }
            FsLayoutError::Invalid(_) => Ok(()),
        }
    }

    pub fn errno_class(&self) -> ErrnoClass {
        match self {
            FsLayoutError::Truncated { .. } => ErrnoClass::Io,
            FsLayoutError::InvalidMagic(_) | FsLayoutError::Invalid(_) => ErrnoClass::Invalid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsMountError {
    IO(Me2IOError),
    Layout(FsLayoutError),
    Group(FsGroupError),
    InconsistentGeometry(&'static str),
    /// Carries the unsupported incompat feature bits.
    UnsupportedFeature(u32),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsMountError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsMountError::IO(_) => "IO error",
            FsMountError::Layout(_) => "Layout error",
            FsMountError::Group(_) => "Group descriptor error",
            FsMountError::InconsistentGeometry(msg) => msg,
            FsMountError::UnsupportedFeature(_) => "Unsupported incompatible feature",
            FsMountError::Invalid(msg) => msg,
            FsMountError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsMountError::IO(e) => Some(FsError::IO(*e)),
            FsMountError::Layout(e) => Some(FsError::Layout(*e)),
            FsMountError::Group(e) => Some(FsError::Group(*e)),
            _ => None,
        }
    }

    fn fmt_detail(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsMountError::UnsupportedFeature(bits) => write!(f, " (bits: {bits:#x})"),
            _ => Ok(()),
        }
    }

    pub fn errno_class(&self) -> ErrnoClass {
        match self {
            FsMountError::IO(_) | FsMountError::Other(_) => ErrnoClass::Io,
            FsMountError::Layout(e) => e.errno_class(),
            FsMountError::Group(e) => e.errno_class(),
            FsMountError::InconsistentGeometry(_)
            | FsMountError::UnsupportedFeature(_)
            | FsMountError::Invalid(_) => ErrnoClass::Invalid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsGroupError {
    IO(Me2IOError),
    Layout(FsLayoutError),
    GroupOutOfRange(u32),
    DescriptorBlockMissing(u32),
    InvalidInode(u32),
}

impl FsGroupError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsGroupError::IO(_) => "IO error",
            FsGroupError::Layout(_) => "Layout error",
            FsGroupError::GroupOutOfRange(_) => "Group index out of range",
            FsGroupError::DescriptorBlockMissing(_) => "Descriptor block not loaded",
            FsGroupError::InvalidInode(_) => "Invalid inode number",
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsGroupError::IO(e) => Some(FsError::IO(*e)),
            FsGroupError::Layout(e) => Some(FsError::Layout(*e)),
            _ => None,
        }
    }

    fn fmt_detail(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsGroupError::GroupOutOfRange(g) => write!(f, " (group: {g})"),
            FsGroupError::DescriptorBlockMissing(b) => write!(f, " (descriptor block: {b})"),
            FsGroupError::InvalidInode(ino) => write!(f, " (inode: {ino})"),
            _ => Ok(()),
        }
    }

    pub fn errno_class(&self) -> ErrnoClass {
        match self {
            FsGroupError::InvalidInode(_) => ErrnoClass::Invalid,
            FsGroupError::Layout(e) => e.errno_class(),
            _ => ErrnoClass::Io,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsMapError {
    IO(Me2IOError),
    BlockIndexOutOfRange(u64),
    /// The indirect chain is unallocated at this depth (1..=3).
    HoleInIndirectChain(u8),
    InvalidBlock(u32),
}

impl FsMapError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsMapError::IO(_) => "IO error",
            FsMapError::BlockIndexOutOfRange(_) => "Logical block index out of range",
            FsMapError::HoleInIndirectChain(_) => "Hole in indirect block chain",
            FsMapError::InvalidBlock(_) => "Block pointer beyond end of volume",
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsMapError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }

    fn fmt_detail(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsMapError::BlockIndexOutOfRange(i) => write!(f, " (index: {i})"),
            FsMapError::HoleInIndirectChain(depth) => write!(f, " (depth: {depth})"),
            FsMapError::InvalidBlock(b) => write!(f, " (block: {b})"),
            FsMapError::IO(_) => Ok(()),
        }
    }

    pub fn errno_class(&self) -> ErrnoClass {
        match self {
            FsMapError::BlockIndexOutOfRange(_) => ErrnoClass::Invalid,
            _ => ErrnoClass::Io,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsDirError {
    IO(Me2IOError),
    Map(FsMapError),
    /// `rec_len == 0` at this byte position.
    ZeroLengthEntry(u64),
    Corrupted(&'static str),
    NotADirectory,
    InvalidPosition(u64),
}

impl FsDirError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsDirError::IO(_) => "IO error",
            FsDirError::Map(_) => "Block mapping error",
            FsDirError::ZeroLengthEntry(_) => "Zero-length directory entry",
            FsDirError::Corrupted(msg) => msg,
            FsDirError::NotADirectory => "Not a directory",
            FsDirError::InvalidPosition(_) => "Invalid directory position",
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsDirError::IO(e) => Some(FsError::IO(*e)),
            FsDirError::Map(e) => Some(FsError::Map(*e)),
            _ => None,
        }
    }

    fn fmt_detail(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsDirError::ZeroLengthEntry(pos) | FsDirError::InvalidPosition(pos) => {
                write!(f, " (position: {pos})")
            }
            _ => Ok(()),
        }
    }

    pub fn errno_class(&self) -> ErrnoClass {
        match self {
            FsDirError::Map(e) => e.errno_class(),
            FsDirError::NotADirectory => ErrnoClass::NotDir,
            FsDirError::InvalidPosition(_) => ErrnoClass::Invalid,
            _ => ErrnoClass::Io,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsResolverError {
    IO(Me2IOError),
    Group(FsGroupError),
    Map(FsMapError),
    Dir(FsDirError),
    NotFound,
    NotADirectory,
    NotAFile,
    TooManyLinks,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsResolverError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsResolverError::IO(_) => "IO error",
            FsResolverError::Group(_) => "Group error",
            FsResolverError::Map(_) => "Block mapping error",
            FsResolverError::Dir(_) => "Directory error",
            FsResolverError::NotFound => "Path not found",
            FsResolverError::NotADirectory => "Not a directory",
            FsResolverError::NotAFile => "Not a regular file",
            FsResolverError::TooManyLinks => "Too many levels of symbolic links",
            FsResolverError::Invalid(msg) => msg,
            FsResolverError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsResolverError::IO(e) => Some(FsError::IO(*e)),
            FsResolverError::Group(e) => Some(FsError::Group(*e)),
            FsResolverError::Map(e) => Some(FsError::Map(*e)),
            FsResolverError::Dir(e) => Some(FsError::Dir(*e)),
            _ => None,
        }
    }

    fn fmt_detail(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }

    pub fn errno_class(&self) -> ErrnoClass {
        match self {
            FsResolverError::IO(_) | FsResolverError::Other(_) => ErrnoClass::Io,
            FsResolverError::Group(e) => e.errno_class(),
            FsResolverError::Map(e) => e.errno_class(),
            FsResolverError::Dir(e) => e.errno_class(),
            FsResolverError::NotFound => ErrnoClass::NotFound,
            FsResolverError::NotADirectory => ErrnoClass::NotDir,
            FsResolverError::NotAFile => ErrnoClass::IsDir,
            FsResolverError::TooManyLinks => ErrnoClass::Loop,
            FsResolverError::Invalid(_) => ErrnoClass::Invalid,
        }
    }
}

/// Top-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    IO(Me2IOError),
    Layout(FsLayoutError),
    Mount(FsMountError),
    Group(FsGroupError),
    Map(FsMapError),
    Dir(FsDirError),
    Resolver(FsResolverError),
    Other(&'static str),
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(e) => e.msg(),
            FsError::Layout(e) => e.msg(),
            FsError::Mount(e) => e.msg(),
            FsError::Group(e) => e.msg(),
            FsError::Map(e) => e.msg(),
            FsError::Dir(e) => e.msg(),
            FsError::Resolver(e) => e.msg(),
            FsError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsError::Layout(e) => e.source(),
            FsError::Mount(e) => e.source(),
            FsError::Group(e) => e.source(),
            FsError::Map(e) => e.source(),
            FsError::Dir(e) => e.source(),
            FsError::Resolver(e) => e.source(),
            FsError::IO(_) | FsError::Other(_) => None,
        }
    }

    fn fmt_detail(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::Layout(e) => e.fmt_detail(f),
            FsError::Mount(e) => e.fmt_detail(f),
            FsError::Group(e) => e.fmt_detail(f),
            FsError::Map(e) => e.fmt_detail(f),
            FsError::Dir(e) => e.fmt_detail(f),
            FsError::Resolver(e) => e.fmt_detail(f),
            FsError::IO(_) | FsError::Other(_) => Ok(()),
        }
    }

    /// Maps the error onto a POSIX-like class.
    pub fn errno_class(&self) -> ErrnoClass {
        match self {
            FsError::IO(_) | FsError::Other(_) => ErrnoClass::Io,
            FsError::Layout(e) => e.errno_class(),
            FsError::Mount(e) => e.errno_class(),
            FsError::Group(e) => e.errno_class(),
            FsError::Map(e) => e.errno_class(),
            FsError::Dir(e) => e.errno_class(),
            FsError::Resolver(e) => e.errno_class(),
        }
    }
}

impl_chain_display!(
    FsLayoutError,
    FsMountError,
    FsGroupError,
    FsMapError,
    FsDirError,
    FsResolverError,
    FsError,
);

// === type Fs*Result ===

pub type FsResult<T = ()> = Result<T, FsError>;
pub type FsLayoutResult<T = ()> = Result<T, FsLayoutError>;
pub type FsMountResult<T = ()> = Result<T, FsMountError>;
pub type FsGroupResult<T = ()> = Result<T, FsGroupError>;
pub type FsMapResult<T = ()> = Result<T, FsMapError>;
pub type FsDirResult<T = ()> = Result<T, FsDirError>;
pub type FsResolverResult<T = ()> = Result<T, FsResolverError>;

crate::fs_error_wiring! {
    top => FsError {
        Me2IOError      : IO,
        FsLayoutError   : Layout,
        FsMountError    : Mount,
        FsGroupError    : Group,
        FsMapError      : Map,
        FsDirError      : Dir,
        FsResolverError : Resolver,
    },
    str_into => [
        FsMountError,
        FsResolverError,
    ],
    sub => {
        Me2IOError    => [ FsMountError::IO, FsGroupError::IO, FsMapError::IO, FsDirError::IO, FsResolverError::IO ],
        FsLayoutError => [ FsMountError::Layout, FsGroupError::Layout ],
        FsGroupError  => [ FsMountError::Group, FsResolverError::Group ],
        FsMapError    => [ FsDirError::Map, FsResolverError::Map ],
        FsDirError    => [ FsResolverError::Dir ],
    },
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_chain_display() {
        let low = Me2IOError::OutOfBounds;
        let map = FsMapError::from(low);
        let dir = FsDirError::from(map);
        let top = FsError::Resolver(FsResolverError::from(dir));

        let text = top.to_string();
        assert!(text.starts_with("Directory error"));
        assert!(text.contains("caused by: Block mapping error"));
        assert!(text.contains("caused by: IO error"));
        assert!(text.contains("caused by: Out of bounds"));
    }

    #[test]
    fn test_detail_in_display() {
        let e = FsError::from(FsLayoutError::InvalidMagic(0x1234));
        assert_eq!(e.to_string(), "Invalid superblock magic (found: 0x1234)");

        let e = FsDirError::ZeroLengthEntry(24);
        assert_eq!(e.to_string(), "Zero-length directory entry (position: 24)");
    }

    #[test]
    fn test_errno_class() {
        let corrupt = FsError::from(FsResolverError::Dir(FsDirError::ZeroLengthEntry(0)));
        assert_eq!(corrupt.errno_class(), ErrnoClass::Io);

        let missing = FsError::from(FsResolverError::NotFound);
        assert_eq!(missing.errno_class(), ErrnoClass::NotFound);

        let not_dir = FsError::from(FsDirError::NotADirectory);
        assert_eq!(not_dir.errno_class(), ErrnoClass::NotDir);

        let loops = FsError::from(FsResolverError::TooManyLinks);
        assert_eq!(loops.errno_class(), ErrnoClass::Loop);

        let range = FsError::from(FsMapError::BlockIndexOutOfRange(u64::MAX));
        assert_eq!(range.errno_class(), ErrnoClass::Invalid);
    }

    #[test]
    fn test_str_into() {
        let e: FsResolverError = "boom".into();
        assert_eq!(e, FsResolverError::Other("boom"));
        let e: FsError = "boom".into();
        assert_eq!(e.msg(), "boom");
    }
}

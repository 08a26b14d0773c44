// SPDX-License-Identifier: MIT
pub mod attr;
pub mod constant;
pub mod dir;
pub mod group;
pub mod mapper;
pub mod meta;
pub mod mount;
pub mod options;
pub mod resolver;
pub mod types;
pub mod utils;

// Public Interface
pub mod traits {
    pub use super::dir::{DirCodec, DirEntryRef, DirLookup};
    pub use super::group::{GroupTable, InodeLocation};
    pub use super::mapper::{BlockMapper, BlockPath, Mapping};
    pub use super::meta::Me2Meta;
    pub use super::mount::Me2Mount;
    pub use super::options::MountOptions;
    pub use super::resolver::Me2Resolver;
}

pub mod prelude {
    pub use super::attr::{FileType, InodeMode};
    pub use super::constant::{
        CompatFeatures, IncompatFeatures, ME2FS_ROOT_INO, RoCompatFeatures, rec_len_for,
    };
    pub use super::traits::*;
    pub use super::types::{
        DirEntry, Me2DirEntryHeader, Me2GroupDesc, Me2Inode, Me2Superblock, pack_dir_block,
    };
    pub use crate::core::errors::*;
    pub use crate::core::traits::*;
    pub use me2io::prelude::*;
}

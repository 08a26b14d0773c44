// SPDX-License-Identifier: MIT

// === Sub-modules ===
pub mod errors;
pub mod macros;
pub mod resolver;
pub mod utils;

// === Core Traits ===
pub mod traits {
    pub use super::resolver::{
        FsBuildOpts, FsNode, FsNodeCounts, FsResolver, FsTreeDisplay, FsTreeOpts,
        attr::{FileAttributes, FileKind},
    };
}

// === Error types ===
pub use errors::*;

// === Utilities ===
pub use utils::{path_utils::*, time_utils::*};

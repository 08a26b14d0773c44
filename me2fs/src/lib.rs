// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate alloc;

// Core Modules
pub mod core;
pub mod fs;

// Reusable types and traits
pub use self::core::traits::*;
pub use self::core::utils::path_utils::*;

/// ext2 engine.
///
/// See [`ext2::Me2Mount`], [`ext2::BlockMapper`], [`ext2::GroupTable`] and
/// [`ext2::DirCodec`].
pub mod ext2 {
    pub use super::fs::ext2::prelude::*;
}

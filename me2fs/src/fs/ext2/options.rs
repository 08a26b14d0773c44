// SPDX-License-Identifier: MIT

/// Mount-time configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountOptions {
    /// Capacity, in blocks, of the cache created by `Me2Mount::open`
    pub cache_blocks: usize,
    /// Decoded inodes kept by the mount, 0 to decode on every access
    pub inode_cache: usize,
    /// Reject volumes whose block and inode counts disagree on the group count
    pub check_geometry: bool,
    /// Mount even with incompat features this engine does not understand
    pub allow_unknown_incompat: bool,
    /// Symlinks followed by a single path resolution
    pub max_symlink_depth: u32,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            cache_blocks: 256,
            inode_cache: 1024,
            check_geometry: true,
            allow_unknown_incompat: false,
            max_symlink_depth: 8,
        }
    }
}

impl MountOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_blocks(mut self, blocks: usize) -> Self {
        self.cache_blocks = blocks;
        self
    }

    pub fn inode_cache(mut self, inodes: usize) -> Self {
        self.inode_cache = inodes;
        self
    }

    pub fn check_geometry(mut self, value: bool) -> Self {
        self.check_geometry = value;
        self
    }

    pub fn allow_unknown_incompat(mut self, value: bool) -> Self {
        self.allow_unknown_incompat = value;
        self
    }

    pub fn max_symlink_depth(mut self, depth: u32) -> Self {
        self.max_symlink_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let opts = MountOptions::new()
            .cache_blocks(16)
            .inode_cache(4)
            .max_symlink_depth(2);
        assert_eq!(opts.cache_blocks, 16);
        assert_eq!(opts.inode_cache, 4);
        assert_eq!(opts.max_symlink_depth, 2);
        assert!(opts.check_geometry);
        assert!(!opts.allow_unknown_incompat);
    }
}

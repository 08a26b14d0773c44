// SPDX-License-Identifier: MIT
use alloc::{
    string::{String, ToString},
    vec::Vec,
};

pub mod attr;
pub mod node;

pub use node::*;

pub use crate::core::errors::{FsResolverError, FsResolverResult};

use crate::core::resolver::attr::FileKind;
use crate::core::utils::path_utils::*;

/// Read-only access to a filesystem namespace by path.
///
/// The provided [`Self::build_node`] and [`Self::parse_tree`] turn any
/// implementation into an [`FsNode`] tree.
///
/// Notes:
/// - Paths use `/` as separator and are rooted at the volume root.
/// - Wildcards (`path/*`) are supported by [`Self::build_node`].
pub trait FsResolver {
    /// Returns the names of the entries inside the directory at `path`,
    /// without `.` and `..`.
    fn read_dir(&mut self, path: &str) -> FsResolverResult<Vec<String>>;

    /// Returns the full content of the regular file at `path`.
    fn read_file(&mut self, path: &str) -> FsResolverResult<Vec<u8>>;

    /// Returns the target of the symbolic link at `path`.
    fn read_link(&mut self, path: &str) -> FsResolverResult<String>;

    /// Returns the attributes of the entry at `path`. The final component is
    /// not followed if it is a symbolic link.
    fn read_attributes(&mut self, path: &str) -> FsResolverResult<FileAttributes>;

    /// Resolves `path` to the identifier of the object it names (the inode
    /// number on ext2).
    fn resolve_path(&mut self, path: &str) -> FsResolverResult<u32>;

    /// Recursively builds an [`FsNode`] tree starting from `path`.
    ///
    /// If `path` ends with `/*`, a [`FsNode::Container`] is created with all
    /// children of the base path. Directories are traversed only when
    /// `recurse` is true. Children are sorted by name.
    fn build_node(&mut self, path: &str, recurse: bool) -> FsResolverResult<FsNode> {
        let opts = FsBuildOpts {
            max_depth: if recurse { None } else { Some(0) },
            ..FsBuildOpts::default()
        };
        self.build_node_with(path, opts)
    }

    /// Builds an [`FsNode`] tree from `path`, loading only what `opts` asks
    /// for. The node at `path` is at depth 0; a wildcard's children are at 1.
    fn build_node_with(&mut self, path: &str, opts: FsBuildOpts) -> FsResolverResult<FsNode> {
        if is_wildcard(path) {
            let children = self.build_children(strip_wildcard(path), opts, 0)?;
            return Ok(FsNode::Container {
                children,
                attr: FileAttributes::new_dir(),
            });
        }
        self.build_at(path, opts, 0)
    }

    #[doc(hidden)]
    fn build_at(&mut self, path: &str, opts: FsBuildOpts, depth: usize) -> FsResolverResult<FsNode> {
        let attr = self.read_attributes(path)?;
        let name = extract_name_from_path(path).to_string();
        let node = match attr.kind {
            FileKind::Directory => {
                let children = if opts.descends(depth) {
                    self.build_children(path, opts, depth)?
                } else {
                    Vec::new()
                };
                FsNode::Dir {
                    name,
                    children,
                    attr,
                }
            }
            FileKind::Regular => FsNode::File {
                name,
                content: if opts.content {
                    self.read_file(path)?
                } else {
                    Vec::new()
                },
                attr,
            },
            FileKind::Symlink => FsNode::Symlink {
                name,
                target: self.read_link(path)?,
                attr,
            },
            _ => FsNode::Special { name, attr },
        };
        Ok(node)
    }

    /// Children of the directory at `path`, which sits at `depth`.
    #[doc(hidden)]
    fn build_children(
        &mut self,
        path: &str,
        opts: FsBuildOpts,
        depth: usize,
    ) -> FsResolverResult<Vec<FsNode>> {
        let mut children = Vec::new();
        for entry in self.read_dir(path)? {
            let entry_path = join_paths(path, &entry);
            children.push(self.build_at(&entry_path, opts, depth + 1)?);
        }
        children.sort_by_key(|c| c.name().to_ascii_lowercase());
        Ok(children)
    }

    /// Parses an entire directory tree starting from `path`.
    fn parse_tree(&mut self, path: &str) -> FsResolverResult<FsNode> {
        self.build_node(path, true)
    }

    /// Parses a single path without recursing into subdirectories.
    fn parse_path(&mut self, path: &str) -> FsResolverResult<FsNode> {
        self.build_node(path, false)
    }
}

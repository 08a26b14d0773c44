// SPDX-License-Identifier: MIT
pub use crate::core::resolver::attr::FileAttributes;
use core::fmt;

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use crate::core::utils::path_utils::split_path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FsNodeCounts {
    pub dirs: usize,
    pub files: usize,
    pub symlinks: usize,
    pub bytes: u64,
}

impl fmt::Display for FsNodeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.dirs;
        let fi = self.files;
        let l = self.symlinks;
        let d_lbl = if d == 1 { "Dir" } else { "Dirs" };
        let f_lbl = if fi == 1 { "File" } else { "Files" };
        let l_lbl = if l == 1 { "Link" } else { "Links" };
        write!(f, "{d} {d_lbl} • {fi} {f_lbl} • {l} {l_lbl}")
    }
}

/// Generic representation of a filesystem node.
///
/// Variants:
/// - `File`: a regular file with its content
/// - `Dir`: a directory with its children
/// - `Symlink`: a symbolic link with its target
/// - `Special`: device, fifo or socket (no content)
/// - `Container`: an anonymous node grouping several nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsNode {
    File {
        name: String,
        content: Vec<u8>,
        attr: FileAttributes,
    },
    Dir {
        name: String,
        children: Vec<FsNode>,
        attr: FileAttributes,
    },
    Symlink {
        name: String,
        target: String,
        attr: FileAttributes,
    },
    Special {
        name: String,
        attr: FileAttributes,
    },
    Container {
        children: Vec<FsNode>,
        attr: FileAttributes,
    },
}

impl FsNode {
    /// Node name. A container has an empty name.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            FsNode::File { name, .. }
            | FsNode::Dir { name, .. }
            | FsNode::Symlink { name, .. }
            | FsNode::Special { name, .. } => name,
            FsNode::Container { .. } => "",
        }
    }

    #[inline]
    pub fn attr(&self) -> &FileAttributes {
        match self {
            FsNode::File { attr, .. }
            | FsNode::Dir { attr, .. }
            | FsNode::Symlink { attr, .. }
            | FsNode::Special { attr, .. }
            | FsNode::Container { attr, .. } => attr,
        }
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        matches!(self, FsNode::File { .. })
    }
    #[inline]
    pub fn is_dir(&self) -> bool {
        matches!(self, FsNode::Dir { .. })
    }
    #[inline]
    pub fn is_symlink(&self) -> bool {
        matches!(self, FsNode::Symlink { .. })
    }
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, FsNode::Container { .. })
    }

    #[inline]
    pub fn children(&self) -> &[FsNode] {
        match self {
            FsNode::Dir { children, .. } | FsNode::Container { children, .. } => children,
            _ => &[],
        }
    }

    /// Finds a descendant by `/`-separated path relative to this node.
    /// Symlinks are not followed.
    pub fn find(&self, path: &str) -> Option<&FsNode> {
        let mut node = self;
        for part in split_path(path) {
            node = node.children().iter().find(|c| c.name() == part)?;
        }
        Some(node)
    }

    pub fn sort_children_recursively(&mut self) {
        fn rank(n: &FsNode) -> u8 {
            match n {
                FsNode::Container { .. } => 0,
                FsNode::Dir { .. } => 1,
                _ => 2,
            }
        }
        if let FsNode::Dir { children, .. } | FsNode::Container { children, .. } = self {
            children.sort_by(|a, b| {
                rank(a).cmp(&rank(b)).then_with(|| {
                    a.name()
                        .to_ascii_lowercase()
                        .cmp(&b.name().to_ascii_lowercase())
                })
            });
            for c in children {
                c.sort_children_recursively();
            }
        }
    }

    /// Size of a regular file: the loaded content, or the size recorded in
    /// its attributes when the content was not read.
    pub fn file_size(&self) -> Option<u64> {
        match self {
            FsNode::File { content, attr, .. } if content.is_empty() => Some(attr.size),
            FsNode::File { content, .. } => Some(content.len() as u64),
            _ => None,
        }
    }

    pub fn counts(&self) -> FsNodeCounts {
        fn walk(n: &FsNode, acc: &mut FsNodeCounts) {
            match n {
                FsNode::File { .. } => {
                    acc.files += 1;
                    acc.bytes = acc.bytes.saturating_add(n.file_size().unwrap_or(0));
                }
                FsNode::Symlink { .. } => acc.symlinks += 1,
                FsNode::Special { .. } => acc.files += 1,
                FsNode::Dir { children, .. } => {
                    acc.dirs += 1;
                    for c in children {
                        walk(c, acc);
                    }
                }
                // The container itself is not counted.
                FsNode::Container { children, .. } => {
                    for c in children {
                        walk(c, acc);
                    }
                }
            }
        }
        let mut out = FsNodeCounts::default();
        walk(self, &mut out);
        out
    }

    pub fn fmt_tree_with(&self, f: &mut fmt::Formatter<'_>, opts: FsTreeOpts) -> fmt::Result {
        fmt::Display::fmt(&FsTreeDisplay::new(self, opts), f)
    }
}

/// What [`FsResolver::build_node_with`](super::FsResolver::build_node_with)
/// loads while building a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FsBuildOpts {
    /// Read regular file content. Without it files keep only their size in
    /// `attr`.
    pub content: bool,
    /// Directory levels to descend below the start node. `None` is unlimited,
    /// `Some(0)` lists no children.
    pub max_depth: Option<usize>,
}

impl Default for FsBuildOpts {
    fn default() -> Self {
        Self {
            content: true,
            max_depth: None,
        }
    }
}

impl FsBuildOpts {
    /// Names, attributes and link targets down to `max_depth`, no file data.
    pub fn outline(max_depth: Option<usize>) -> Self {
        Self {
            content: false,
            max_depth,
        }
    }

    /// `true` if a directory at `depth` gets its children listed.
    #[inline]
    pub fn descends(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }
}

/// Tree rendering options. `0` means unlimited for depth and lines.
#[derive(Clone, Copy, Debug)]
pub struct FsTreeOpts {
    pub max_depth: usize,
    pub max_lines: usize,
    pub name_width: usize,
    pub show_sizes: bool,
    pub human_size: bool,
    pub show_attrs: bool,
}

impl Default for FsTreeOpts {
    fn default() -> Self {
        Self {
            max_depth: 0,
            max_lines: 0,
            name_width: 40,
            show_sizes: true,
            human_size: true,
            show_attrs: false,
        }
    }
}

pub struct FsTreeDisplay<'a> {
    root: &'a FsNode,
    opts: FsTreeOpts,
}

impl<'a> FsTreeDisplay<'a> {
    pub fn new(root: &'a FsNode, opts: FsTreeOpts) -> Self {
        Self { root, opts }
    }
}

impl fmt::Display for FsTreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // node, prefix, last, depth
        let mut stack: Vec<(&FsNode, String, bool, usize)> = Vec::new();
        stack.push((self.root, String::new(), true, 0));

        let mut printed = 0usize;

        while let Some((node, prefix, last, depth)) = stack.pop() {
            if self.opts.max_lines != 0 && printed >= self.opts.max_lines {
                writeln!(f, "{prefix}    … (+more)")?;
                break;
            }
            if self.opts.max_depth != 0 && depth > self.opts.max_depth {
                continue;
            }

            write!(f, "{}{}", prefix, if last { "└── " } else { "├── " })?;

            match node {
                FsNode::Container { .. } => write!(f, "(container)")?,
                _ => write!(f, "{}", truncate(node.name(), self.opts.name_width))?,
            }
            if let FsNode::Symlink { target, .. } = node {
                write!(f, " -> {target}")?;
            }
            if self.opts.show_attrs {
                let attr = node.attr();
                write!(f, " [{}{:04o} {}:{}]", attr.kind.tag(), attr.mode, attr.uid, attr.gid)?;
            }
            if let (Some(size), true) = (node.file_size(), self.opts.show_sizes) {
                if self.opts.human_size {
                    write!(f, " ({})", pretty_bytes(size))?;
                } else {
                    write!(f, " ({size} bytes)")?;
                }
            }
            writeln!(f)?;
            printed += 1;

            let children = node.children();
            if !children.is_empty() {
                let mut new_prefix = String::with_capacity(prefix.len() + 4);
                new_prefix.push_str(&prefix);
                new_prefix.push_str(if last { "    " } else { "│   " });

                for (i, child) in children.iter().enumerate().rev() {
                    let is_last = i == children.len() - 1;
                    stack.push((child, new_prefix.clone(), is_last, depth + 1));
                }
            }
        }
        Ok(())
    }
}

/// Formats a byte count with binary units.
pub fn pretty_bytes(n: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    let mut val = n as f64;
    let mut idx = 0usize;
    while val >= 1024.0 && idx + 1 < UNITS.len() {
        val /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        n.to_string() + " B"
    } else {
        format!("{:.1} {}", val, UNITS[idx])
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl fmt::Display for FsNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree_with(f, FsTreeOpts::default())
    }
}

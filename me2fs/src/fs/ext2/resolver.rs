// SPDX-License-Identifier: MIT

use alloc::{string::String, vec::Vec};

use log::trace;
use me2io::prelude::*;

use crate::core::resolver::{
    FsResolver, FsResolverError, FsResolverResult,
    attr::{FileAttributes, FileKind},
};
use crate::core::utils::path_utils::*;
use crate::fs::ext2::{
    constant::*,
    mapper::Mapping,
    mount::Me2Mount,
    types::{DirEntry, Me2Inode},
};

/// Read path over a mounted volume: file data, symlinks and path walks.
pub struct Me2Resolver<'a, S: BlockStore> {
    mount: &'a Me2Mount<S>,
}

impl<'a, S: BlockStore> Me2Resolver<'a, S> {
    pub fn new(mount: &'a Me2Mount<S>) -> Self {
        Self { mount }
    }

    #[inline]
    fn block_size(&self) -> u64 {
        self.mount.meta().block_size as u64
    }

    #[inline]
    pub fn size_of(&self, inode: &Me2Inode) -> u64 {
        inode.size(self.mount.meta().ro_compat)
    }

    /// Size of `inode` checked against the blocks the tiers can address.
    pub fn data_size(&self, inode: &Me2Inode) -> FsResolverResult<u64> {
        let size = self.size_of(inode);
        let limit = self.mount.meta().max_logical_blocks().saturating_mul(self.block_size());
        if size > limit {
            trace!("ext2: inode size {size} exceeds addressable {limit}");
            return Err(FsResolverError::Other("file size beyond addressable blocks"));
        }
        Ok(size)
    }

    /// Reads up to `buf.len()` bytes of `inode` data from byte `offset`.
    ///
    /// Holes read as zeroes; the read stops at the file size. Returns the
    /// number of bytes written to `buf`.
    pub fn read_at(&self, inode: &Me2Inode, offset: u64, buf: &mut [u8]) -> FsResolverResult<usize> {
        let size = self.data_size(inode)?;
        if offset >= size || buf.is_empty() {
            return Ok(0);
        }
        let total = (size - offset).min(buf.len() as u64) as usize;
        let bs = self.block_size();
        let mapper = self.mount.mapper();

        let mut done = 0usize;
        while done < total {
            let pos = offset + done as u64;
            let index = pos / bs;
            let in_block = (pos % bs) as usize;
            let remaining = total - done;

            match mapper.resolve(inode, index)? {
                Mapping::Mapped(phys) => {
                    let block = self.mount.store().read_block(phys)?;
                    let len = remaining.min(bs as usize - in_block);
                    buf[done..done + len].copy_from_slice(&block[in_block..in_block + len]);
                    done += len;
                }
                Mapping::Hole { span, .. } => {
                    let hole = (span * bs - in_block as u64).min(remaining as u64) as usize;
                    buf[done..done + hole].fill(0);
                    done += hole;
                }
            }
        }
        Ok(done)
    }

    /// Whole content of `inode`.
    pub fn read_data(&self, inode: &Me2Inode) -> FsResolverResult<Vec<u8>> {
        let size = usize::try_from(self.data_size(inode)?)
            .map_err(|_| FsResolverError::Invalid("file too large for this host"))?;
        let mut out = Vec::new();
        out.try_reserve_exact(size)
            .map_err(|_| FsResolverError::Invalid("file too large to buffer"))?;
        out.resize(size, 0);
        let read = self.read_at(inode, 0, &mut out)?;
        out.truncate(read);
        Ok(out)
    }

    /// Target of the symbolic link `inode`.
    pub fn read_link_inode(&self, inode: &Me2Inode) -> FsResolverResult<String> {
        if inode.kind() != FileKind::Symlink {
            return Err(FsResolverError::Invalid("not a symbolic link"));
        }
        let size = self.size_of(inode) as usize;
        let target = if inode.is_fast_symlink(self.mount.meta().block_size) {
            let inline = inode.inline_data();
            if size > inline.len() {
                return Err(FsResolverError::Invalid("fast symlink longer than i_block"));
            }
            inline[..size].to_vec()
        } else {
            if size > self.block_size() as usize {
                return Err(FsResolverError::Other("symlink target longer than one block"));
            }
            self.read_data(inode)?
        };
        Ok(String::from_utf8_lossy(&target).into_owned())
    }

    /// Inode number of `name` inside directory inode `dir`.
    pub fn lookup_in(&self, dir: u32, name: &str) -> FsResolverResult<u32> {
        let inode = self.mount.inode(dir)?;
        if !inode.is_dir() {
            return Err(FsResolverError::NotADirectory);
        }
        let found = self
            .mount
            .dir()
            .lookup(&inode, name.as_bytes())?
            .ok_or(FsResolverError::NotFound)?;
        Ok(found.inode)
    }

    /// Walks `path` from the root directory. Intermediate symlinks are always
    /// followed, the final one only with `follow_last`.
    pub fn walk(&self, path: &str, follow_last: bool) -> FsResolverResult<u32> {
        let max_links = self.mount.options().max_symlink_depth;
        // Components still to visit, next one last
        let mut pending: Vec<String> = split_path(path).into_iter().rev().map(String::from).collect();
        let mut current = ME2FS_ROOT_INO;
        let mut links = 0u32;

        while let Some(name) = pending.pop() {
            let next = self.lookup_in(current, &name)?;
            let inode = self.mount.inode(next)?;
            let is_last = pending.is_empty();

            if inode.kind() == FileKind::Symlink && (!is_last || follow_last) {
                links += 1;
                if links > max_links {
                    return Err(FsResolverError::TooManyLinks);
                }
                let target = self.read_link_inode(&inode)?;
                if target.is_empty() {
                    return Err(FsResolverError::NotFound);
                }
                trace!("ext2: following symlink {name} -> {target}");
                if is_absolute(&target) {
                    current = ME2FS_ROOT_INO;
                }
                pending.extend(split_path(&target).into_iter().rev().map(String::from));
                continue;
            }
            current = next;
        }
        Ok(current)
    }

    pub fn attributes(&self, ino: u32) -> FsResolverResult<FileAttributes> {
        let inode = self.mount.inode(ino)?;
        Ok(FileAttributes::from_ext2_inode(&inode, self.mount.meta().ro_compat))
    }

    /// Every entry of the directory at `path`, `.` and `..` included.
    pub fn entries(&self, path: &str) -> FsResolverResult<Vec<DirEntry>> {
        let ino = self.walk(path, true)?;
        let inode = self.mount.inode(ino)?;
        if !inode.is_dir() {
            return Err(FsResolverError::NotADirectory);
        }
        Ok(self.mount.dir().read_dir(&inode)?)
    }
}

impl<S: BlockStore> FsResolver for Me2Resolver<'_, S> {
    fn read_dir(&mut self, path: &str) -> FsResolverResult<Vec<String>> {
        Ok(self
            .entries(path)?
            .into_iter()
            .filter(|e| !e.is_dot_or_dotdot())
            .map(|e| e.name_lossy().into_owned())
            .collect())
    }

    fn read_file(&mut self, path: &str) -> FsResolverResult<Vec<u8>> {
        let ino = self.walk(path, true)?;
        let inode = self.mount.inode(ino)?;
        if inode.kind() != FileKind::Regular {
            return Err(FsResolverError::NotAFile);
        }
        self.read_data(&inode)
    }

    fn read_link(&mut self, path: &str) -> FsResolverResult<String> {
        let ino = self.walk(path, false)?;
        let inode = self.mount.inode(ino)?;
        self.read_link_inode(&inode)
    }

    fn read_attributes(&mut self, path: &str) -> FsResolverResult<FileAttributes> {
        let ino = self.walk(path, false)?;
        self.attributes(ino)
    }

    fn resolve_path(&mut self, path: &str) -> FsResolverResult<u32> {
        self.walk(path, true)
    }
}

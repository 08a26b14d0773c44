// SPDX-License-Identifier: MIT

//! Mount context: superblock, geometry, descriptor table and inode cache of
//! one mounted volume. Every engine operation goes through a `&Me2Mount`.

use core::ops::ControlFlow;

use alloc::collections::BTreeMap;
use log::{debug, trace, warn};
use me2io::prelude::*;
use spin::Mutex;

use crate::core::errors::*;
use crate::ensure;
use crate::fs::ext2::{
    constant::*,
    dir::{DirCodec, DirEntryRef, DirLookup},
    group::GroupTable,
    mapper::{BlockMapper, Mapping},
    meta::Me2Meta,
    options::MountOptions,
    resolver::Me2Resolver,
    types::{Me2Inode, Me2Superblock},
};

pub struct Me2Mount<S: BlockStore> {
    store: S,
    sb: Me2Superblock,
    meta: Me2Meta,
    groups: GroupTable,
    options: MountOptions,
    inodes: Mutex<InodeCache>,
}

/// Decoded inodes, least recently used evicted past `capacity`.
#[derive(Debug, Default)]
struct InodeCache {
    slots: BTreeMap<u32, (Me2Inode, u64)>,
    tick: u64,
    capacity: usize,
}

impl InodeCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    fn get(&mut self, ino: u32) -> Option<Me2Inode> {
        self.tick += 1;
        let tick = self.tick;
        self.slots.get_mut(&ino).map(|(inode, last_use)| {
            *last_use = tick;
            *inode
        })
    }

    fn insert(&mut self, ino: u32, inode: Me2Inode) {
        if self.capacity == 0 {
            return;
        }
        while self.slots.len() >= self.capacity && !self.slots.contains_key(&ino) {
            let victim = self
                .slots
                .iter()
                .min_by_key(|(_, (_, last_use))| *last_use)
                .map(|(&ino, _)| ino);
            match victim {
                Some(old) => {
                    self.slots.remove(&old);
                    trace!("ext2: inode {old} dropped from cache");
                }
                None => break,
            }
        }
        self.tick += 1;
        self.slots.insert(ino, (inode, self.tick));
    }
}

impl<S: BlockStore> Me2Mount<S> {
    /// Builds the mount context from the raw 1024-byte superblock region.
    ///
    /// Decode and geometry faults abort the mount. The store must use the
    /// volume block size.
    pub fn build(superblock: &[u8], store: S, options: MountOptions) -> FsMountResult<Self> {
        let sb = Me2Superblock::decode(superblock)?;
        let meta = Me2Meta::from_superblock(&sb, options.check_geometry)?;

        let unknown = meta.incompat.difference(ME2FS_SUPPORTED_INCOMPAT);
        if !unknown.is_empty() {
            if !options.allow_unknown_incompat {
                return Err(FsMountError::UnsupportedFeature(unknown.bits()));
            }
            warn!("ext2: mounting with unsupported incompat features {:#x}", unknown.bits());
        }
        let unknown_ro = meta.ro_compat.bits() & !RoCompatFeatures::all().bits();
        if unknown_ro != 0 {
            warn!("ext2: unknown ro_compat features {unknown_ro:#x}, volume is read only anyway");
        }

        ensure!(
            store.block_size() == meta.block_size as usize,
            FsMountError::Invalid("store block size does not match the volume")
        );

        let groups = GroupTable::load(&meta, &store)?;
        debug!(
            "ext2: mounted {} blocks of {} bytes, {} group(s) ({} blocks / {} inodes per group), {} inodes of {} bytes",
            meta.blocks_count,
            meta.block_size,
            meta.groups_count,
            meta.blocks_per_group,
            meta.inodes_per_group,
            meta.inodes_count,
            meta.inode_size,
        );

        Ok(Self {
            store,
            sb,
            meta,
            groups,
            options,
            inodes: Mutex::new(InodeCache::new(options.inode_cache)),
        })
    }

    #[inline]
    pub fn superblock(&self) -> &Me2Superblock {
        &self.sb
    }

    #[inline]
    pub fn meta(&self) -> &Me2Meta {
        &self.meta
    }

    #[inline]
    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    #[inline]
    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Inode `ino`, served from the mount's inode cache when present.
    pub fn inode(&self, ino: u32) -> FsGroupResult<Me2Inode> {
        if let Some(inode) = self.inodes.lock().get(ino) {
            return Ok(inode);
        }

        let loc = self.groups.inode_location(ino)?;
        let block = self.store.read_block(loc.block)?;
        let inode = Me2Inode::decode(block.get(loc.offset..).unwrap_or_default())?;
        block.release();

        self.inodes.lock().insert(ino, inode);
        Ok(inode)
    }

    #[inline]
    pub fn root(&self) -> FsGroupResult<Me2Inode> {
        self.inode(ME2FS_ROOT_INO)
    }

    /// Drops `ino` from the inode cache. Returns `true` if it was cached.
    pub fn forget_inode(&self, ino: u32) -> bool {
        self.inodes.lock().slots.remove(&ino).is_some()
    }

    pub fn cached_inodes(&self) -> usize {
        self.inodes.lock().slots.len()
    }

    #[inline]
    pub fn mapper(&self) -> BlockMapper<'_, S> {
        BlockMapper::new(&self.store, &self.meta)
    }

    #[inline]
    pub fn dir(&self) -> DirCodec<'_, S> {
        DirCodec::new(&self.store, &self.meta)
    }

    #[inline]
    pub fn resolver(&self) -> Me2Resolver<'_, S> {
        Me2Resolver::new(self)
    }

    /// Logical block `index` of inode `ino`.
    pub fn resolve(&self, ino: u32, index: u64) -> FsResolverResult<Mapping> {
        let inode = self.inode(ino)?;
        Ok(self.mapper().resolve(&inode, index)?)
    }

    /// Looks `name` up in directory `dir`.
    pub fn lookup(&self, dir: u32, name: &[u8]) -> FsResolverResult<Option<DirLookup>> {
        let inode = self.inode(dir)?;
        Ok(self.dir().lookup(&inode, name)?)
    }

    /// Enumerates directory `dir` from byte position `start`.
    /// See [`DirCodec::enumerate`].
    pub fn enumerate<F>(&self, dir: u32, start: u64, emit: F) -> FsResolverResult<u64>
    where
        F: FnMut(DirEntryRef<'_>) -> ControlFlow<()>,
    {
        let inode = self.inode(dir)?;
        Ok(self.dir().enumerate(&inode, start, emit)?)
    }
}

impl<IO: Me2IO> Me2Mount<CachedStore<IO>> {
    /// Reads the superblock at byte 1024 of `io` and mounts the volume over
    /// a block cache of `options.cache_blocks` blocks.
    pub fn open(mut io: IO, options: MountOptions) -> FsMountResult<Self> {
        let mut raw = [0u8; ME2FS_SUPERBLOCK_SIZE];
        io.read_at(ME2FS_SUPERBLOCK_OFFSET, &mut raw)?;

        let sb = Me2Superblock::decode(&raw)?;
        let meta = Me2Meta::from_superblock(&sb, options.check_geometry)?;
        let store = CachedStore::new(io, meta.block_size as usize, options.cache_blocks)?;
        Self::build(&raw, store, options)
    }

    /// Unmounts and hands the device back.
    pub fn into_inner(self) -> IO {
        self.store.into_inner()
    }
}

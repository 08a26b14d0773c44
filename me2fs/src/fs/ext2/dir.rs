// SPDX-License-Identifier: MIT

//! Directory codec: name lookup and restartable enumeration over the packed
//! variable-length records of a directory's data blocks.
//!
//! Positions are byte offsets into the directory's logical data. Records
//! are validated as they are walked; a bad record aborts the current
//! operation only.

use core::ops::ControlFlow;

use alloc::{borrow::Cow, string::String, vec::Vec};
use log::{trace, warn};
use me2io::prelude::*;

use crate::core::errors::{FsDirError, FsDirResult};
use crate::fs::ext2::{
    attr::FileType,
    constant::*,
    mapper::BlockMapper,
    meta::Me2Meta,
    types::{DirEntry, Me2DirEntryHeader, Me2Inode, rec_len_from_disk},
};

/// Borrowed view of one live record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntryRef<'a> {
    pub inode: u32,
    pub rec_len: usize,
    pub file_type: FileType,
    pub name: &'a [u8],
    /// Byte offset of the record within the directory
    pub position: u64,
}

impl DirEntryRef<'_> {
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name)
    }

    pub fn is_dot_or_dotdot(&self) -> bool {
        self.name == b"." || self.name == b".."
    }

    /// Position of the record that follows this one.
    #[inline]
    pub fn next_position(&self) -> u64 {
        self.position + self.rec_len as u64
    }

    pub fn to_entry(&self) -> DirEntry {
        DirEntry {
            inode: self.inode,
            name: self.name.to_vec(),
            file_type: self.file_type,
            position: self.position,
        }
    }
}

/// A successful lookup together with the directory block holding the entry.
///
/// The block stays pinned in the cache until the lookup is dropped or
/// [released](DirLookup::release).
#[derive(Debug)]
pub struct DirLookup {
    pub inode: u32,
    pub file_type: FileType,
    /// Byte offset of the record within the directory
    pub position: u64,
    block: BlockRef,
    offset: usize,
}

impl DirLookup {
    #[inline]
    pub fn block(&self) -> &BlockRef {
        &self.block
    }

    /// Byte offset of the record within [`Self::block`].
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Raw record bytes, header first.
    pub fn record(&self) -> &[u8] {
        &self.block[self.offset..]
    }

    #[inline]
    pub fn release(self) {}
}

/// Decoded and validated record header.
#[derive(Debug, Clone, Copy)]
struct Record {
    inode: u32,
    rec_len: usize,
    name_len: usize,
    tag: u8,
}

pub struct DirCodec<'a, S: BlockStore + ?Sized> {
    store: &'a S,
    meta: &'a Me2Meta,
    mapper: BlockMapper<'a, S>,
}

impl<'a, S: BlockStore + ?Sized> DirCodec<'a, S> {
    pub fn new(store: &'a S, meta: &'a Me2Meta) -> Self {
        Self {
            store,
            meta,
            mapper: BlockMapper::new(store, meta),
        }
    }

    #[inline]
    fn block_size(&self) -> usize {
        self.meta.block_size as usize
    }

    fn dir_size(&self, dir: &Me2Inode) -> FsDirResult<u64> {
        if !dir.is_dir() {
            return Err(FsDirError::NotADirectory);
        }
        Ok(dir.size(self.meta.ro_compat))
    }

    /// Data block `n` of the directory. Directories are never sparse, so a
    /// hole is an error here.
    fn dir_block(&self, dir: &Me2Inode, n: u64) -> FsDirResult<BlockRef> {
        let phys = self.mapper.resolve_required(dir, n)?;
        trace!("ext2: scanning directory block {n} (block {phys})");
        Ok(self.store.read_block(phys)?)
    }

    /// Bytes of block `n` inside the logical directory size.
    #[inline]
    fn last_valid_byte(&self, size: u64, n: u64) -> usize {
        let bs = self.block_size() as u64;
        size.saturating_sub(n * bs).min(bs) as usize
    }

    #[inline]
    fn file_type(&self, tag: u8) -> FileType {
        if self.meta.has_filetype() {
            FileType::from_tag(tag)
        } else {
            FileType::Unknown
        }
    }

    fn corrupted(position: u64, reason: &'static str) -> FsDirError {
        warn!("ext2: bad directory entry at position {position}: {reason}");
        FsDirError::Corrupted(reason)
    }

    fn parse_record(&self, block: &[u8], offset: usize, position: u64) -> FsDirResult<Record> {
        let bs = self.block_size();
        let header = block
            .get(offset..)
            .and_then(|raw| Me2DirEntryHeader::decode(raw).ok())
            .ok_or_else(|| Self::corrupted(position, "entry header past block end"))?;

        let rec_len = rec_len_from_disk(header.rec_len.get(), bs);
        let name_len = header.name_len as usize;
        let inode = header.inode.get();

        if rec_len == 0 {
            warn!("ext2: zero-length directory entry at position {position}");
            return Err(FsDirError::ZeroLengthEntry(position));
        }
        if rec_len < ME2FS_DIR_MIN_REC_LEN {
            return Err(Self::corrupted(position, "rec_len is smaller than minimal"));
        }
        if rec_len % ME2FS_DIR_PAD != 0 {
            return Err(Self::corrupted(position, "unaligned directory entry"));
        }
        if rec_len < rec_len_for(name_len) {
            return Err(Self::corrupted(position, "rec_len is too small for name_len"));
        }
        if offset + rec_len > bs {
            return Err(Self::corrupted(position, "directory entry across blocks"));
        }
        if inode > self.meta.inodes_count {
            return Err(Self::corrupted(position, "inode out of bounds"));
        }

        Ok(Record {
            inode,
            rec_len,
            name_len,
            tag: header.file_type,
        })
    }

    #[inline]
    fn name_of<'b>(block: &'b [u8], offset: usize, rec: &Record) -> &'b [u8] {
        let start = offset + ME2FS_DIR_HEADER_LEN;
        &block[start..start + rec.name_len]
    }

    /// Looks `name` up in `dir`. Names compare as raw bytes.
    ///
    /// `Ok(None)` is the ordinary negative result.
    pub fn lookup(&self, dir: &Me2Inode, name: &[u8]) -> FsDirResult<Option<DirLookup>> {
        let size = self.dir_size(dir)?;
        if name.is_empty() || name.len() > ME2FS_NAME_LEN {
            return Ok(None);
        }

        let bs = self.block_size() as u64;
        let wanted = rec_len_for(name.len());
        let blocks = size.div_ceil(bs);

        for n in 0..blocks {
            let block = self.dir_block(dir, n)?;
            let last_valid = self.last_valid_byte(size, n);
            let mut offset = 0usize;

            while offset + wanted <= last_valid {
                let position = n * bs + offset as u64;
                let rec = self.parse_record(&block, offset, position)?;
                if rec.inode != 0 && Self::name_of(&block, offset, &rec) == name {
                    return Ok(Some(DirLookup {
                        inode: rec.inode,
                        file_type: self.file_type(rec.tag),
                        position,
                        block,
                        offset,
                    }));
                }
                offset += rec.rec_len;
            }
        }
        Ok(None)
    }

    /// Emits the live entries of `dir` from byte position `start` on.
    ///
    /// `emit` returning [`ControlFlow::Break`] means the entry was not
    /// taken: the returned position then points at that entry, so resuming
    /// from it neither skips nor repeats anything. Otherwise the returned
    /// position is past the last record.
    pub fn enumerate<F>(&self, dir: &Me2Inode, start: u64, mut emit: F) -> FsDirResult<u64>
    where
        F: FnMut(DirEntryRef<'_>) -> ControlFlow<()>,
    {
        let size = self.dir_size(dir)?;
        if start % ME2FS_DIR_PAD as u64 != 0 {
            return Err(FsDirError::InvalidPosition(start));
        }
        let min = ME2FS_DIR_MIN_REC_LEN as u64;
        if size < min || start > size - min {
            return Ok(start);
        }

        let bs = self.block_size() as u64;
        let blocks = size.div_ceil(bs);
        let mut n = start / bs;
        let mut offset = (start % bs) as usize;

        while n < blocks {
            let block = self.dir_block(dir, n)?;
            let limit = self.last_valid_byte(size, n);

            while offset + ME2FS_DIR_MIN_REC_LEN <= limit {
                let position = n * bs + offset as u64;
                let rec = self.parse_record(&block, offset, position)?;
                if rec.inode != 0 {
                    let entry = DirEntryRef {
                        inode: rec.inode,
                        rec_len: rec.rec_len,
                        file_type: self.file_type(rec.tag),
                        name: Self::name_of(&block, offset, &rec),
                        position,
                    };
                    if emit(entry).is_break() {
                        return Ok(position);
                    }
                }
                offset += rec.rec_len;
            }

            block.release();
            if limit < bs as usize {
                // Partially valid final block
                return Ok(n * bs + offset as u64);
            }
            n += 1;
            offset = 0;
        }
        Ok(n * bs)
    }

    /// Collects every live entry of `dir`, `.` and `..` included.
    pub fn read_dir(&self, dir: &Me2Inode) -> FsDirResult<Vec<DirEntry>> {
        let mut out = Vec::new();
        self.enumerate(dir, 0, |entry| {
            out.push(entry.to_entry());
            ControlFlow::Continue(())
        })?;
        Ok(out)
    }
}

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use crate::core::errors::FsMapError;
    use crate::fs::ext2::{attr::InodeMode, types::{Me2Superblock, pack_dir_block}};

    const BS: usize = 1024;

    fn meta(filetype: bool) -> Me2Meta {
        let mut sb = Me2Superblock::empty();
        sb.s_first_data_block.set(1);
        sb.s_blocks_per_group.set(8192);
        sb.s_blocks_count.set(64);
        sb.s_inodes_per_group.set(16);
        sb.s_inodes_count.set(16);
        if filetype {
            sb.s_feature_incompat.set(IncompatFeatures::FILETYPE.bits());
        }
        Me2Meta::from_superblock(&sb, true).unwrap()
    }

    fn dir_inode(blocks: &[u32], size: u32) -> Me2Inode {
        let mut inode = Me2Inode::new(InodeMode::DIR | InodeMode::OWNER_R, size);
        for (i, b) in blocks.iter().enumerate() {
            inode.set_block(i, *b);
        }
        inode
    }

    fn put(image: &mut [u8], block: u32, bytes: &[u8]) {
        let at = block as usize * BS;
        image[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn root_block() -> Vec<u8> {
        pack_dir_block(
            &[
                DirEntry::dot(2),
                DirEntry::dotdot(2),
                DirEntry::new(11, b"foo", FileType::RegFile),
            ],
            BS,
        )
        .unwrap()
    }

    fn names(entries: &[DirEntry]) -> Vec<String> {
        entries.iter().map(|e| e.name_lossy().into_owned()).collect()
    }

    #[test]
    fn test_lookup_hits_and_misses() {
        let meta = meta(true);
        let mut image = vec![0u8; 64 * BS];
        put(&mut image, 20, &root_block());
        let store = CachedStore::new(MemIO::new(&mut image), BS, 4).unwrap();
        let codec = DirCodec::new(&store, &meta);
        let dir = dir_inode(&[20], BS as u32);

        let hit = codec.lookup(&dir, b"foo").unwrap().unwrap();
        assert_eq!(hit.inode, 11);
        assert_eq!(hit.file_type, FileType::RegFile);
        assert_eq!(hit.position, 24);
        assert_eq!(hit.offset(), 24);
        assert_eq!(hit.block().block(), 20);
        assert_eq!(&hit.record()[8..11], b"foo");
        hit.release();

        let dot = codec.lookup(&dir, b".").unwrap().unwrap();
        assert_eq!((dot.inode, dot.position), (2, 0));

        assert!(codec.lookup(&dir, b"bar").unwrap().is_none());
        assert!(codec.lookup(&dir, b"fo").unwrap().is_none());
        assert!(codec.lookup(&dir, b"").unwrap().is_none());
        assert!(codec.lookup(&dir, &[b'x'; 256]).unwrap().is_none());
    }

    #[test]
    fn test_file_type_needs_feature() {
        let meta = meta(false);
        let mut image = vec![0u8; 64 * BS];
        put(&mut image, 20, &root_block());
        let store = CachedStore::new(MemIO::new(&mut image), BS, 4).unwrap();
        let codec = DirCodec::new(&store, &meta);
        let dir = dir_inode(&[20], BS as u32);

        let hit = codec.lookup(&dir, b"foo").unwrap().unwrap();
        assert_eq!(hit.file_type, FileType::Unknown);
        let all = codec.read_dir(&dir).unwrap();
        assert!(all.iter().all(|e| e.file_type == FileType::Unknown));
    }

    #[test]
    fn test_enumerate_resumes_without_gaps() {
        let meta = meta(true);
        let mut image = vec![0u8; 64 * BS];
        put(&mut image, 20, &root_block());
        let store = CachedStore::new(MemIO::new(&mut image), BS, 4).unwrap();
        let codec = DirCodec::new(&store, &meta);
        let dir = dir_inode(&[20], BS as u32);

        let mut seen = Vec::new();
        let pos = codec
            .enumerate(&dir, 0, |e| {
                if seen.len() == 2 {
                    return ControlFlow::Break(());
                }
                seen.push(e.to_entry());
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(names(&seen), [".", ".."]);
        assert_eq!(pos, 24);

        let mut rest = Vec::new();
        let end = codec
            .enumerate(&dir, pos, |e| {
                rest.push(e.to_entry());
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(names(&rest), ["foo"]);
        assert_eq!(rest[0].position, 24);
        assert_eq!(end, BS as u64);
    }

    #[test]
    fn test_enumerate_skips_unused_records() {
        let meta = meta(true);
        let mut image = vec![0u8; 64 * BS];
        put(&mut image, 20, &root_block());
        let second = pack_dir_block(
            &[
                DirEntry::new(0, b"gone", FileType::RegFile),
                DirEntry::new(12, b"bar", FileType::Dir),
            ],
            BS,
        )
        .unwrap();
        put(&mut image, 21, &second);
        let store = CachedStore::new(MemIO::new(&mut image), BS, 4).unwrap();
        let codec = DirCodec::new(&store, &meta);
        let dir = dir_inode(&[20, 21], 2 * BS as u32);

        let all = codec.read_dir(&dir).unwrap();
        assert_eq!(names(&all), [".", "..", "foo", "bar"]);
        assert_eq!(all[3].position, (BS + rec_len_for(4)) as u64);
        assert_eq!(all[3].file_type, FileType::Dir);

        assert!(codec.lookup(&dir, b"gone").unwrap().is_none());
        assert_eq!(codec.lookup(&dir, b"bar").unwrap().unwrap().inode, 12);

        // Resuming inside the second block does not read the first one again
        store.shrink();
        let before = store.cache_stats().misses;
        codec
            .enumerate(&dir, BS as u64, |_| ControlFlow::Continue(()))
            .unwrap();
        assert_eq!(store.cache_stats().misses - before, 1);
    }

    #[test]
    fn test_partial_last_block() {
        let meta = meta(true);
        let mut image = vec![0u8; 64 * BS];
        put(&mut image, 20, &root_block());
        // Only the first half of the second block is inside i_size, the rest
        // is zeroes and must never be parsed.
        let half = pack_dir_block(&[DirEntry::new(13, b"tail", FileType::RegFile)], BS / 2).unwrap();
        put(&mut image, 21, &half);
        let store = CachedStore::new(MemIO::new(&mut image), BS, 4).unwrap();
        let codec = DirCodec::new(&store, &meta);
        let dir = dir_inode(&[20, 21], (BS + BS / 2) as u32);

        let all = codec.read_dir(&dir).unwrap();
        assert_eq!(names(&all), [".", "..", "foo", "tail"]);
        assert_eq!(codec.lookup(&dir, b"tail").unwrap().unwrap().inode, 13);
        assert!(codec.lookup(&dir, b"nope").unwrap().is_none());
    }

    #[test]
    fn test_positions_out_of_range() {
        let meta = meta(true);
        let mut image = vec![0u8; 64 * BS];
        put(&mut image, 20, &root_block());
        let store = CachedStore::new(MemIO::new(&mut image), BS, 4).unwrap();
        let codec = DirCodec::new(&store, &meta);
        let dir = dir_inode(&[20], BS as u32);

        assert_eq!(
            codec.enumerate(&dir, 6, |_| ControlFlow::Continue(())),
            Err(FsDirError::InvalidPosition(6))
        );

        let mut calls = 0;
        let pos = codec
            .enumerate(&dir, BS as u64 - 8, |_| {
                calls += 1;
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!((pos, calls), (BS as u64 - 8, 0));
    }

    #[test]
    fn test_zero_length_entry() {
        let meta = meta(true);
        let mut image = vec![0u8; 64 * BS];
        let mut block = root_block();
        // foo's rec_len
        block[28..30].copy_from_slice(&0u16.to_le_bytes());
        put(&mut image, 20, &block);
        let store = CachedStore::new(MemIO::new(&mut image), BS, 4).unwrap();
        let codec = DirCodec::new(&store, &meta);
        let dir = dir_inode(&[20], BS as u32);

        assert_eq!(codec.lookup(&dir, b"foo").unwrap_err(), FsDirError::ZeroLengthEntry(24));
        assert_eq!(codec.read_dir(&dir).unwrap_err(), FsDirError::ZeroLengthEntry(24));

        // Entries before the bad record are still delivered
        let mut seen = 0;
        let err = codec.enumerate(&dir, 0, |_| {
            seen += 1;
            ControlFlow::Continue(())
        });
        assert!(err.is_err());
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_corrupted_records() {
        let meta = meta(true);
        let cases: [(usize, &[u8]); 4] = [
            // rec_len below the minimum
            (28, &8u16.to_le_bytes()),
            // unaligned rec_len
            (28, &1002u16.to_le_bytes()),
            // record crossing the block end
            (28, &1004u16.to_le_bytes()),
            // inode beyond inodes_count
            (24, &99u32.to_le_bytes()),
        ];
        for (at, bytes) in cases {
            let mut image = vec![0u8; 64 * BS];
            let mut block = root_block();
            block[at..at + bytes.len()].copy_from_slice(bytes);
            put(&mut image, 20, &block);
            let store = CachedStore::new(MemIO::new(&mut image), BS, 4).unwrap();
            let codec = DirCodec::new(&store, &meta);
            let dir = dir_inode(&[20], BS as u32);

            assert!(matches!(
                codec.read_dir(&dir),
                Err(FsDirError::Corrupted(_))
            ));
        }
    }

    #[test]
    fn test_name_longer_than_record() {
        let meta = meta(true);
        let mut image = vec![0u8; 64 * BS];
        let mut block = root_block();
        // ".." claims a 9-byte name inside a 12-byte record
        block[12 + 6] = 9;
        put(&mut image, 20, &block);
        let store = CachedStore::new(MemIO::new(&mut image), BS, 4).unwrap();
        let codec = DirCodec::new(&store, &meta);
        let dir = dir_inode(&[20], BS as u32);

        assert_eq!(
            codec.lookup(&dir, b"foo").unwrap_err(),
            FsDirError::Corrupted("rec_len is too small for name_len")
        );
    }

    #[test]
    fn test_not_a_directory_and_holes() {
        let meta = meta(true);
        let mut image = vec![0u8; 64 * BS];
        put(&mut image, 20, &root_block());
        let store = CachedStore::new(MemIO::new(&mut image), BS, 4).unwrap();
        let codec = DirCodec::new(&store, &meta);

        let mut file = Me2Inode::new(InodeMode::REGULAR, BS as u32);
        file.set_block(0, 20);
        assert_eq!(codec.lookup(&file, b"foo").unwrap_err(), FsDirError::NotADirectory);
        assert_eq!(codec.read_dir(&file).unwrap_err(), FsDirError::NotADirectory);

        // Second block of the directory was never allocated
        let dir = dir_inode(&[20], 2 * BS as u32);
        assert_eq!(
            codec.lookup(&dir, b"missing").unwrap_err(),
            FsDirError::Map(FsMapError::HoleInIndirectChain(0))
        );
    }
}

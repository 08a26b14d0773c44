// SPDX-License-Identifier: MIT
#![allow(dead_code)]

//! In-memory ext2 image builder shared by the integration tests.
//!
//! One block group of 1 KiB blocks: superblock in block 1, descriptor table
//! in block 2, bitmaps in 3 and 4, inode table from block 5, data after it.

use me2fs::ext2::*;
use me2fs::fs::ext2::constant::*;
use me2fs::fs::ext2::types::ME2FS_INODE_CORE_SIZE;

pub const BS: usize = 1024;
pub const BLOCKS: u32 = 2048;
pub const INODES: u32 = 64;

const INODE_TABLE: u32 = 5;
const INODE_TABLE_BLOCKS: u32 = INODES * ME2FS_GOOD_OLD_INODE_SIZE as u32 / BS as u32;
const ADDR_PER_BLOCK: u64 = (BS / ME2FS_ADDR_SIZE) as u64;

pub struct ImageBuilder {
    image: Vec<u8>,
    next_block: u32,
    next_ino: u32,
    dirs: u16,
    filetype: bool,
    large_file: bool,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            image: vec![0u8; BLOCKS as usize * BS],
            next_block: INODE_TABLE + INODE_TABLE_BLOCKS,
            next_ino: ME2FS_GOOD_OLD_FIRST_INO,
            dirs: 0,
            filetype: true,
            large_file: false,
        }
    }

    /// Builds a volume without the FILETYPE feature.
    pub fn without_filetype(mut self) -> Self {
        self.filetype = false;
        self
    }

    /// Builds a volume with the LARGE_FILE feature.
    pub fn with_large_file(mut self) -> Self {
        self.large_file = true;
        self
    }

    pub fn alloc_block(&mut self) -> u32 {
        let block = self.next_block;
        assert!(block < BLOCKS, "test image is full");
        self.next_block += 1;
        block
    }

    pub fn alloc_ino(&mut self) -> u32 {
        let ino = self.next_ino;
        assert!(ino <= INODES, "out of test inodes");
        self.next_ino += 1;
        ino
    }

    pub fn block_mut(&mut self, block: u32) -> &mut [u8] {
        let at = block as usize * BS;
        &mut self.image[at..at + BS]
    }

    pub fn write_inode(&mut self, ino: u32, inode: &Me2Inode) {
        let at = INODE_TABLE as usize * BS + (ino - 1) as usize * ME2FS_GOOD_OLD_INODE_SIZE as usize;
        self.image[at..at + ME2FS_INODE_CORE_SIZE].copy_from_slice(&inode.to_bytes());
    }

    pub fn read_inode(&self, ino: u32) -> Me2Inode {
        let at = INODE_TABLE as usize * BS + (ino - 1) as usize * ME2FS_GOOD_OLD_INODE_SIZE as usize;
        Me2Inode::decode(&self.image[at..]).unwrap()
    }

    fn ptr(&self, block: u32, slot: u32) -> u32 {
        let at = block as usize * BS + slot as usize * ME2FS_ADDR_SIZE;
        u32::from_le_bytes(self.image[at..at + 4].try_into().unwrap())
    }

    fn set_ptr(&mut self, block: u32, slot: u32, value: u32) {
        let at = block as usize * BS + slot as usize * ME2FS_ADDR_SIZE;
        self.image[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn ensure_ptr(&mut self, block: u32, slot: u32) -> u32 {
        match self.ptr(block, slot) {
            0 => {
                let fresh = self.alloc_block();
                self.set_ptr(block, slot, fresh);
                fresh
            }
            existing => existing,
        }
    }

    fn ensure_slot(&mut self, inode: &mut Me2Inode, slot: usize) -> u32 {
        if inode.block(slot) == 0 {
            let fresh = self.alloc_block();
            inode.set_block(slot, fresh);
            inode.i_blocks.set(inode.i_blocks.get() + (BS / 512) as u32);
        }
        inode.block(slot)
    }

    /// Points logical block `index` of `inode` at `block` through the
    /// direct, single or double indirect tier.
    pub fn map(&mut self, inode: &mut Me2Inode, index: u64, block: u32) {
        let a = ADDR_PER_BLOCK;
        inode.i_blocks.set(inode.i_blocks.get() + (BS / 512) as u32);
        if index < ME2FS_NDIR_BLOCKS as u64 {
            inode.set_block(index as usize, block);
            return;
        }
        let rel = index - ME2FS_NDIR_BLOCKS as u64;
        if rel < a {
            let ind = self.ensure_slot(inode, ME2FS_IND_BLOCK);
            self.set_ptr(ind, rel as u32, block);
            return;
        }
        let rel = rel - a;
        assert!(rel < a * a, "triple indirect mapping is not needed by the tests");
        let dind = self.ensure_slot(inode, ME2FS_DIND_BLOCK);
        let ind = self.ensure_ptr(dind, (rel / a) as u32);
        self.set_ptr(ind, (rel % a) as u32, block);
    }

    /// Allocates a data block filled with `data` and maps it at `index`.
    pub fn put_data(&mut self, inode: &mut Me2Inode, index: u64, data: &[u8]) -> u32 {
        let block = self.alloc_block();
        self.block_mut(block)[..data.len()].copy_from_slice(data);
        self.map(inode, index, block);
        block
    }

    /// Directory `ino` holding `.`, `..` and `entries`, packed over as many
    /// blocks as needed.
    pub fn dir(&mut self, ino: u32, parent: u32, entries: &[(&str, u32, FileType)]) -> Me2Inode {
        let mut all = vec![DirEntry::dot(ino), DirEntry::dotdot(parent)];
        all.extend(
            entries
                .iter()
                .map(|(name, child, kind)| DirEntry::new(*child, name.as_bytes(), *kind)),
        );
        self.dir_raw(ino, &all)
    }

    /// Directory `ino` with exactly `entries` on disk.
    pub fn dir_raw(&mut self, ino: u32, entries: &[DirEntry]) -> Me2Inode {
        let mut chunks: Vec<Vec<DirEntry>> = vec![Vec::new()];
        let mut used = 0usize;
        for entry in entries {
            if used + entry.min_rec_len() > BS {
                chunks.push(Vec::new());
                used = 0;
            }
            used += entry.min_rec_len();
            if let Some(last) = chunks.last_mut() {
                last.push(entry.clone());
            }
        }

        let mode = InodeMode::DIR | InodeMode::from_bits_retain(0o755);
        let mut inode = Me2Inode::new(mode, (chunks.len() * BS) as u32);
        inode.i_links_count.set(2);
        for (i, chunk) in chunks.iter().enumerate() {
            let bytes = pack_dir_block(chunk, BS).unwrap();
            self.put_data(&mut inode, i as u64, &bytes);
        }
        self.write_inode(ino, &inode);
        self.dirs += 1;
        inode
    }

    /// Regular file `ino` with `data` in consecutive blocks.
    pub fn file(&mut self, ino: u32, data: &[u8]) -> Me2Inode {
        let mode = InodeMode::REGULAR | InodeMode::from_bits_retain(0o644);
        let mut inode = Me2Inode::new(mode, data.len() as u32);
        for (i, chunk) in data.chunks(BS).enumerate() {
            self.put_data(&mut inode, i as u64, chunk);
        }
        self.write_inode(ino, &inode);
        inode
    }

    /// Regular file `ino` of `size` bytes with only the listed logical blocks
    /// allocated, each filled with its byte.
    pub fn sparse_file(&mut self, ino: u32, size: u32, blocks: &[(u64, u8)]) -> Me2Inode {
        let mode = InodeMode::REGULAR | InodeMode::from_bits_retain(0o600);
        let mut inode = Me2Inode::new(mode, size);
        for &(index, fill) in blocks {
            self.put_data(&mut inode, index, &[fill; BS]);
        }
        self.write_inode(ino, &inode);
        inode
    }

    /// Symlink `ino`. Targets shorter than 60 bytes are stored inline.
    pub fn symlink(&mut self, ino: u32, target: &str) -> Me2Inode {
        let mode = InodeMode::SYMLINK | InodeMode::from_bits_retain(0o777);
        let mut inode = Me2Inode::new(mode, target.len() as u32);
        if target.len() < ME2FS_FAST_SYMLINK_MAX {
            let mut inline = [0u8; ME2FS_FAST_SYMLINK_MAX];
            inline[..target.len()].copy_from_slice(target.as_bytes());
            for (i, word) in inline.chunks_exact(ME2FS_ADDR_SIZE).enumerate() {
                inode.set_block(i, u32::from_le_bytes(word.try_into().unwrap()));
            }
        } else {
            self.put_data(&mut inode, 0, target.as_bytes());
        }
        self.write_inode(ino, &inode);
        inode
    }

    /// Writes the superblock and descriptor table and returns the image.
    pub fn finish(mut self) -> Vec<u8> {
        let mut sb = Me2Superblock::empty();
        sb.s_log_block_size.set(0);
        sb.s_log_frag_size.set(0);
        sb.s_first_data_block.set(1);
        sb.s_blocks_count.set(BLOCKS);
        sb.s_blocks_per_group.set(8192);
        sb.s_frags_per_group.set(8192);
        sb.s_inodes_count.set(INODES);
        sb.s_inodes_per_group.set(INODES);
        sb.s_free_blocks_count.set(BLOCKS - self.next_block);
        sb.s_free_inodes_count.set(INODES + 1 - self.next_ino);
        sb.s_creator_os.set(0);
        sb.s_uuid = *b"\x12\x34\x56\x78\x9a\xbc\xde\xf0\x01\x23\x45\x67\x89\xab\xcd\xef";
        sb.s_volume_name[..10].copy_from_slice(b"me2fs-test");
        if self.filetype {
            sb.s_feature_incompat.set(IncompatFeatures::FILETYPE.bits());
        }
        let mut ro = RoCompatFeatures::SPARSE_SUPER;
        if self.large_file {
            ro |= RoCompatFeatures::LARGE_FILE;
        }
        sb.s_feature_ro_compat.set(ro.bits());
        self.image[1024..2048].copy_from_slice(&sb.to_bytes());

        let desc = Me2GroupDesc::new(
            3,
            4,
            INODE_TABLE,
            (BLOCKS - self.next_block) as u16,
            (INODES + 1 - self.next_ino) as u16,
            self.dirs,
        );
        self.image[2 * BS..2 * BS + ME2FS_GROUP_DESC_SIZE].copy_from_slice(&desc.to_bytes());
        self.image
    }
}

// Inode numbers of the sample volume
pub const FOO: u32 = 11;
pub const SUB: u32 = 12;
pub const SPARSE: u32 = 13;
pub const FAST: u32 = 14;
pub const SLOW: u32 = 15;
pub const LOOP: u32 = 16;
pub const ABS: u32 = 17;
pub const INNER: u32 = 18;
pub const UP: u32 = 19;
pub const MANY: u32 = 20;

pub const FOO_DATA: &[u8] = b"hello, ext2\n";
pub const INNER_DATA: &[u8] = b"inner\n";
/// Long enough to need a data block
pub const SLOW_TARGET: &str =
    "/sub/./././././././././././././././././././././././././././inner.txt";
/// Logical blocks of `/sparse`; 269 sits under the double indirect tier
pub const SPARSE_BLOCKS: [(u64, u8); 4] = [(0, b'A'), (5, b'B'), (15, b'C'), (269, b'D')];
pub const SPARSE_SIZE: u32 = 270 * BS as u32;
pub const MANY_FILES: usize = 100;

/// ```text
/// /            . .. foo sub sparse fast slow loop abs many
/// /foo         "hello, ext2\n"
/// /sub         . .. inner.txt up
/// /sub/up  ->  ../foo
/// /sparse      holes around 4 allocated blocks
/// /fast    ->  foo            (inline)
/// /slow    ->  SLOW_TARGET    (data block)
/// /loop    ->  loop
/// /abs     ->  /sub
/// /many        file_000 .. file_099, two blocks
/// ```
pub fn sample_image() -> Vec<u8> {
    let mut b = ImageBuilder::new();
    for _ in FOO..=MANY {
        b.alloc_ino();
    }

    b.dir(
        ME2FS_ROOT_INO,
        ME2FS_ROOT_INO,
        &[
            ("foo", FOO, FileType::RegFile),
            ("sub", SUB, FileType::Dir),
            ("sparse", SPARSE, FileType::RegFile),
            ("fast", FAST, FileType::Symlink),
            ("slow", SLOW, FileType::Symlink),
            ("loop", LOOP, FileType::Symlink),
            ("abs", ABS, FileType::Symlink),
            ("many", MANY, FileType::Dir),
        ],
    );
    b.file(FOO, FOO_DATA);
    b.dir(
        SUB,
        ME2FS_ROOT_INO,
        &[
            ("inner.txt", INNER, FileType::RegFile),
            ("up", UP, FileType::Symlink),
        ],
    );
    b.file(INNER, INNER_DATA);
    b.symlink(UP, "../foo");
    b.sparse_file(SPARSE, SPARSE_SIZE, &SPARSE_BLOCKS);
    b.symlink(FAST, "foo");
    b.symlink(SLOW, SLOW_TARGET);
    b.symlink(LOOP, "loop");
    b.symlink(ABS, "/sub");

    let names: Vec<String> = (0..MANY_FILES).map(|i| format!("file_{i:03}")).collect();
    let entries: Vec<(&str, u32, FileType)> = names
        .iter()
        .map(|n| (n.as_str(), FOO, FileType::RegFile))
        .collect();
    b.dir(MANY, ME2FS_ROOT_INO, &entries);

    b.finish()
}

/// Mounts `image` over a fresh block cache.
pub fn mount(image: &mut [u8]) -> Me2Mount<CachedStore<MemIO<'_>>> {
    Me2Mount::open(MemIO::new(image), MountOptions::default()).unwrap()
}

// SPDX-License-Identifier: MIT
use core::ops::ControlFlow;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use me2fs::ext2::*;

const BS: usize = 1024;
const BLOCKS: u32 = 4096;
const INODES: u32 = 16;
const INODE_TABLE: u32 = 5;
const FILE_INO: u32 = 11;
const DIR_ENTRIES: usize = 400;
/// Direct, single and double indirect tiers
const FILE_BLOCKS: u32 = 400;

struct Volume {
    image: Vec<u8>,
    next: u32,
}

impl Volume {
    fn alloc(&mut self) -> u32 {
        self.next += 1;
        self.next - 1
    }

    fn put(&mut self, block: u32, data: &[u8]) {
        let at = block as usize * BS;
        self.image[at..at + data.len()].copy_from_slice(data);
    }

    fn put_ptr(&mut self, block: u32, slot: u32, value: u32) {
        let at = block as usize * BS + slot as usize * 4;
        self.image[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn put_inode(&mut self, ino: u32, inode: &Me2Inode) {
        let at = INODE_TABLE as usize * BS + (ino - 1) as usize * 128;
        self.image[at..at + 128].copy_from_slice(&inode.to_bytes());
    }
}

/// Root directory of `DIR_ENTRIES` names over several blocks and one large
/// regular file.
fn build_image() -> Vec<u8> {
    let mut vol = Volume {
        image: vec![0u8; BLOCKS as usize * BS],
        next: INODE_TABLE + INODES * 128 / BS as u32,
    };

    let mut entries = vec![DirEntry::dot(ME2FS_ROOT_INO), DirEntry::dotdot(ME2FS_ROOT_INO)];
    entries.extend(
        (0..DIR_ENTRIES).map(|i| DirEntry::new(FILE_INO, format!("entry_{i:04}").as_bytes(), FileType::RegFile)),
    );
    let mut root = Me2Inode::new(InodeMode::DIR, 0);
    let mut chunk = Vec::new();
    let mut used = 0;
    let mut dir_blocks = 0;
    for entry in entries {
        if used + entry.min_rec_len() > BS {
            let block = vol.alloc();
            vol.put(block, &pack_dir_block(&chunk, BS).unwrap());
            root.set_block(dir_blocks, block);
            dir_blocks += 1;
            chunk.clear();
            used = 0;
        }
        used += entry.min_rec_len();
        chunk.push(entry);
    }
    let block = vol.alloc();
    vol.put(block, &pack_dir_block(&chunk, BS).unwrap());
    root.set_block(dir_blocks, block);
    root.i_size.set(((dir_blocks + 1) * BS) as u32);
    vol.put_inode(ME2FS_ROOT_INO, &root);

    let mut file = Me2Inode::new(InodeMode::REGULAR, FILE_BLOCKS * BS as u32);
    let ind = vol.alloc();
    let dind = vol.alloc();
    file.set_block(12, ind);
    file.set_block(13, dind);
    let mut dind_child = 0;
    for index in 0..FILE_BLOCKS {
        let data = vol.alloc();
        vol.put(data, &[index as u8; BS]);
        match index {
            0..12 => file.set_block(index as usize, data),
            12..268 => vol.put_ptr(ind, index - 12, data),
            _ => {
                let rel = index - 268;
                if rel % 256 == 0 {
                    dind_child = vol.alloc();
                    vol.put_ptr(dind, rel / 256, dind_child);
                }
                vol.put_ptr(dind_child, rel % 256, data);
            }
        }
    }
    vol.put_inode(FILE_INO, &file);

    let mut sb = Me2Superblock::empty();
    sb.s_first_data_block.set(1);
    sb.s_blocks_count.set(BLOCKS);
    sb.s_blocks_per_group.set(8192);
    sb.s_inodes_per_group.set(INODES);
    sb.s_inodes_count.set(INODES);
    sb.s_feature_incompat.set(IncompatFeatures::FILETYPE.bits());
    vol.put(1, &sb.to_bytes());
    vol.put(2, &Me2GroupDesc::new(3, 4, INODE_TABLE, 0, 0, 1).to_bytes());
    vol.image
}

fn bench_lookup(c: &mut Criterion) {
    let mut image = build_image();
    let mount = Me2Mount::open(MemIO::new(&mut image), MountOptions::default()).unwrap();

    let mut group = c.benchmark_group("ext2_lookup");
    group.bench_function("first_entry", |b| {
        b.iter(|| mount.lookup(ME2FS_ROOT_INO, b"entry_0000").unwrap().unwrap().inode);
    });
    group.bench_function("last_entry", |b| {
        b.iter(|| mount.lookup(ME2FS_ROOT_INO, b"entry_0399").unwrap().unwrap().inode);
    });
    group.bench_function("miss", |b| {
        b.iter(|| mount.lookup(ME2FS_ROOT_INO, b"missing").unwrap().is_none());
    });
    group.finish();
}

fn bench_enumerate(c: &mut Criterion) {
    let mut image = build_image();
    let mount = Me2Mount::open(MemIO::new(&mut image), MountOptions::default()).unwrap();

    let mut group = c.benchmark_group("ext2_enumerate");
    group.throughput(Throughput::Elements(DIR_ENTRIES as u64 + 2));
    group.bench_function("full_scan", |b| {
        b.iter(|| {
            let mut n = 0usize;
            mount
                .enumerate(ME2FS_ROOT_INO, 0, |_| {
                    n += 1;
                    ControlFlow::Continue(())
                })
                .unwrap();
            n
        });
    });
    group.bench_function("batches_of_16", |b| {
        b.iter(|| {
            let mut pos = 0;
            loop {
                let mut taken = 0;
                pos = mount
                    .enumerate(ME2FS_ROOT_INO, pos, |_| {
                        if taken == 16 {
                            return ControlFlow::Break(());
                        }
                        taken += 1;
                        ControlFlow::Continue(())
                    })
                    .unwrap();
                if taken == 0 {
                    break pos;
                }
            }
        });
    });
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut image = build_image();
    let mount = Me2Mount::open(MemIO::new(&mut image), MountOptions::default()).unwrap();
    let inode = mount.inode(FILE_INO).unwrap();
    let mapper = mount.mapper();

    let mut group = c.benchmark_group("ext2_resolve");
    for (name, index) in [("direct", 3u64), ("single", 100), ("double", 390)] {
        group.bench_function(name, |b| b.iter(|| mapper.resolve(&inode, index).unwrap()));
    }

    let bytes = FILE_BLOCKS as u64 * BS as u64;
    group.throughput(Throughput::Bytes(bytes));
    group.bench_function("read_whole_file", |b| {
        let resolver = mount.resolver();
        b.iter(|| resolver.read_data(&inode).unwrap().len());
    });
    group.finish();
}

criterion_group!(benches, bench_lookup, bench_enumerate, bench_resolve);
criterion_main!(benches);

// SPDX-License-Identifier: MIT
// me2fs-inspect/src/report.rs

use std::fmt::Display;
use std::io::Write;

use colored::Colorize;
use log::warn;
use me2fs::core::resolver::pretty_bytes;
use me2fs::core::unix_to_offsetdatetime;
use me2fs::ext2::*;
use me2fs::fs::ext2::constant::{ME2FS_DIND_BLOCK, ME2FS_IND_BLOCK, ME2FS_NDIR_BLOCKS, ME2FS_TIND_BLOCK};

use crate::utils::string::{attr_mode_string, mode_string, sep_u64, time_string};

fn section(title: &str) {
    println!("{}", title.bold());
}

fn row(label: &str, value: impl Display) {
    println!("  {} {}", format!("{label:<20}").dimmed(), value);
}

fn names<T>(flags: impl Iterator<Item = (&'static str, T)>) -> String {
    let list: Vec<&str> = flags.map(|(name, _)| name).collect();
    if list.is_empty() {
        "(none)".to_string()
    } else {
        list.join(" ")
    }
}

pub fn info<S: BlockStore>(mount: &Me2Mount<S>) {
    let sb = mount.superblock();
    let meta = mount.meta();
    let label = sb.label();

    section("Superblock");
    row("Volume name", if label.is_empty() { "(none)".to_string() } else { label });
    row("UUID", sb.uuid_string());
    row("Revision", format!("{}.{}", sb.rev_level(), sb.s_minor_rev_level.get()));
    row("State", sb.state_name());
    row("Errors behavior", sb.errors_behavior());
    row("Creator OS", sb.creator_os());
    row("Last mounted on", sb.last_mounted());
    row(
        "Mount count",
        format!("{} / {}", sb.s_mnt_count.get(), sb.s_max_mnt_count.get() as i16),
    );
    row("Last mount", time_string(unix_to_offsetdatetime(sb.s_mtime.get())));
    row("Last write", time_string(unix_to_offsetdatetime(sb.s_wtime.get())));
    row("Last check", time_string(unix_to_offsetdatetime(sb.s_lastcheck.get())));

    section("Geometry");
    row("Block size", sep_u64(meta.block_size as u64));
    row(
        "Blocks",
        format!(
            "{} ({} free, {} reserved)",
            sep_u64(meta.blocks_count as u64),
            sep_u64(sb.s_free_blocks_count.get() as u64),
            sep_u64(sb.s_r_blocks_count.get() as u64)
        ),
    );
    row(
        "Inodes",
        format!(
            "{} ({} free)",
            sep_u64(meta.inodes_count as u64),
            sep_u64(sb.s_free_inodes_count.get() as u64)
        ),
    );
    row("Volume size", pretty_bytes(meta.volume_size_bytes()));
    row("First data block", meta.first_data_block);
    row("Groups", meta.groups_count);
    row("Blocks per group", sep_u64(meta.blocks_per_group as u64));
    row("Inodes per group", sep_u64(meta.inodes_per_group as u64));
    row("Inode table blocks", meta.itb_per_group);
    row("Descriptor blocks", meta.desc_blocks);
    row("Reserved GDT blocks", meta.reserved_gdt_blocks);
    row("Inode size", meta.inode_size);
    row("First inode", meta.first_ino);
    row("Max file blocks", sep_u64(meta.max_logical_blocks()));

    section("Features");
    row("compat", names(meta.compat.iter_names()));
    row("incompat", names(meta.incompat.iter_names()));
    row("ro_compat", names(meta.ro_compat.iter_names()));
    let unknown = meta.incompat.difference(IncompatFeatures::all());
    if !unknown.is_empty() {
        row("unknown incompat", format!("{:#x}", unknown.bits()).red().to_string());
    }
}

pub fn groups<S: BlockStore>(mount: &Me2Mount<S>) -> anyhow::Result<()> {
    let table = mount.groups();

    println!(
        "{}",
        format!(
            "{:>5}  {:>10}  {:>10}  {:>8}  {:>8}  {:>8}  {:>7}  {:>7}  {:>5}  {}",
            "group", "first", "last", "bbitmap", "ibitmap", "itable", "fblocks", "finodes", "dirs", "backup"
        )
        .bold()
    );
    for entry in table.descriptors() {
        let (g, desc) = entry?;
        let backup = if g == 0 {
            "primary".green().to_string()
        } else if table.has_superblock_copy(g) {
            "yes".yellow().to_string()
        } else {
            "-".dimmed().to_string()
        };
        println!(
            "{:>5}  {:>10}  {:>10}  {:>8}  {:>8}  {:>8}  {:>7}  {:>7}  {:>5}  {}",
            g,
            table.first_block_of(g)?,
            table.last_block_of(g)?,
            desc.block_bitmap(),
            desc.inode_bitmap(),
            desc.inode_table(),
            desc.free_blocks(),
            desc.free_inodes(),
            desc.used_dirs(),
            backup
        );
    }

    let backups: Vec<String> = table.backup_groups().map(|g| g.to_string()).collect();
    println!();
    row(
        "Backup groups",
        if backups.is_empty() { "(none)".to_string() } else { backups.join(" ") },
    );
    Ok(())
}

pub fn stat<S: BlockStore>(mount: &Me2Mount<S>, path: &str, follow: bool) -> anyhow::Result<()> {
    let resolver = mount.resolver();
    let ino = resolver.walk(path, follow)?;
    let inode = mount.inode(ino)?;
    let loc = mount.groups().inode_location(ino)?;
    let attr = resolver.attributes(ino)?;

    section(&format!("Inode {ino}"));
    row(
        "Location",
        format!("group {}, index {}, block {} + {}", loc.group, loc.index, loc.block, loc.offset),
    );
    row("Mode", format!("{} ({:04o})", attr_mode_string(&attr), attr.mode));
    row("Size", format!("{} ({})", sep_u64(attr.size), pretty_bytes(attr.size)));
    row("Links", attr.links);
    row("Owner", format!("{}:{}", attr.uid, attr.gid));
    row("Sectors", inode.sectors());
    row("Flags", format!("{:#010x}", inode.flags()));
    row("Generation", inode.generation());
    row("File ACL", inode.file_acl());
    row("Accessed", time_string(attr.accessed));
    row("Modified", time_string(attr.modified));
    row("Changed", time_string(attr.changed));
    row("Deleted", time_string(inode.deleted()));

    if attr.is_symlink() && inode.is_fast_symlink(mount.meta().block_size) {
        row("Target", format!("{} (inline)", resolver.read_link_inode(&inode)?));
        return Ok(());
    }
    if attr.is_symlink() {
        row("Target", resolver.read_link_inode(&inode)?);
    }

    let pointers = inode.block_pointers();
    let direct: Vec<String> = pointers[..ME2FS_NDIR_BLOCKS]
        .iter()
        .map(|&b| if b == 0 { "-".to_string() } else { b.to_string() })
        .collect();
    section("Blocks");
    row("Direct", direct.join(" "));
    row("Indirect", pointers[ME2FS_IND_BLOCK]);
    row("Double indirect", pointers[ME2FS_DIND_BLOCK]);
    row("Triple indirect", pointers[ME2FS_TIND_BLOCK]);
    Ok(())
}

pub fn ls<S: BlockStore>(mount: &Me2Mount<S>, path: &str, all: bool) -> anyhow::Result<()> {
    let resolver = mount.resolver();
    let entries = resolver.entries(path)?;

    for entry in entries.iter().filter(|e| all || !e.is_dot_or_dotdot()) {
        let name = entry.name_lossy().into_owned();
        let inode = match mount.inode(entry.inode) {
            Ok(inode) => inode,
            Err(err) => {
                warn!("{name}: inode {}: {err}", entry.inode);
                println!("{:>8}  {:>6}  {}  {}", entry.position, entry.inode, "?".red(), name);
                continue;
            }
        };
        // Without the FILETYPE feature the tag is unknown; the inode knows.
        let kind = match entry.file_type {
            FileType::Unknown => inode.kind(),
            tagged => tagged.kind(),
        };
        let shown = match kind {
            FileKind::Directory => name.as_str().blue().bold().to_string(),
            FileKind::Symlink => {
                let target = resolver.read_link_inode(&inode).unwrap_or_default();
                format!("{} -> {}", name.as_str().cyan(), target)
            }
            _ => name,
        };
        println!(
            "{:>8}  {:>6}  {}  {:>10}  {}",
            entry.position,
            entry.inode,
            mode_string(kind, inode.mode().permissions()),
            sep_u64(resolver.size_of(&inode)),
            shown
        );
    }
    Ok(())
}

const CAT_CHUNK: usize = 64 * 1024;

pub fn cat<S: BlockStore>(mount: &Me2Mount<S>, path: &str) -> anyhow::Result<()> {
    let resolver = mount.resolver();
    let inode = mount.inode(resolver.walk(path, true)?)?;
    if inode.kind() != FileKind::Regular {
        return Err(FsResolverError::NotAFile.into());
    }

    let mut out = std::io::stdout().lock();
    let mut buf = vec![0u8; CAT_CHUNK];
    let mut offset = 0u64;
    loop {
        let n = resolver.read_at(&inode, offset, &mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        offset += n as u64;
    }
    out.flush()?;
    Ok(())
}

pub fn tree<S: BlockStore>(mount: &Me2Mount<S>, path: &str, depth: usize) -> anyhow::Result<()> {
    let limit = (depth != 0).then_some(depth);
    let node = mount.resolver().build_node_with(path, FsBuildOpts::outline(limit))?;
    let opts = FsTreeOpts {
        max_depth: depth,
        ..FsTreeOpts::default()
    };
    print!("{}", FsTreeDisplay::new(&node, opts));

    let counts = node.counts();
    println!(
        "\n{} directories, {} files, {} symlinks, {}",
        counts.dirs,
        counts.files,
        counts.symlinks,
        pretty_bytes(counts.bytes)
    );
    Ok(())
}

pub fn readlink<S: BlockStore>(mount: &Me2Mount<S>, path: &str) -> anyhow::Result<()> {
    println!("{}", mount.resolver().read_link(path)?);
    Ok(())
}

/// Run of contiguous physical blocks.
struct Extent {
    logical: u64,
    physical: u32,
    len: u64,
}

impl Extent {
    fn follows(&self, physical: u32) -> bool {
        self.physical as u64 + self.len == physical as u64
    }

    fn print(&self) {
        println!(
            "  {:>10}..{:<10} -> {}..{}",
            self.logical,
            self.logical + self.len - 1,
            self.physical,
            self.physical as u64 + self.len - 1
        );
    }
}

pub fn bmap<S: BlockStore>(mount: &Me2Mount<S>, path: &str, start: u64, count: u64) -> anyhow::Result<()> {
    let resolver = mount.resolver();
    let ino = resolver.walk(path, true)?;
    let inode = mount.inode(ino)?;
    let blocks = resolver.size_of(&inode).div_ceil(mount.meta().block_size as u64);
    let end = if count == 0 { blocks } else { blocks.min(start.saturating_add(count)) };

    section(&format!("Inode {ino}: {} logical block(s)", sep_u64(blocks)));
    let mapper = mount.mapper();
    let mut run: Option<Extent> = None;
    let (mut mapped, mut holes) = (0u64, 0u64);
    let mut index = start;

    while index < end {
        match mapper.resolve(&inode, index)? {
            Mapping::Mapped(physical) => {
                match run.as_mut() {
                    Some(extent) if extent.follows(physical) => extent.len += 1,
                    _ => {
                        let next = Extent { logical: index, physical, len: 1 };
                        if let Some(done) = run.replace(next) {
                            done.print();
                        }
                    }
                }
                mapped += 1;
                index += 1;
            }
            Mapping::Hole { depth, span } => {
                if let Some(done) = run.take() {
                    done.print();
                }
                let len = span.min(end - index);
                println!(
                    "  {:>10}..{:<10} {}",
                    index,
                    index + len - 1,
                    format!("hole (depth {depth})").dimmed()
                );
                holes += len;
                index += len;
            }
        }
    }
    if let Some(done) = run {
        done.print();
    }
    row("Mapped", sep_u64(mapped));
    row("Holes", sep_u64(holes));
    Ok(())
}

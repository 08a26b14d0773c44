// SPDX-License-Identifier: MIT
// me2fs-inspect/src/main.rs

mod report;
mod utils;

use std::{fs::File, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::debug;
use me2fs::ext2::{CachedStore, Me2Mount, MountOptions, StdIO};

#[derive(Parser)]
#[command(name = "me2fs-inspect", version, about = "Read-only ext2 image inspector", long_about = None)]
struct Cli {
    /// Image file or block device
    image: PathBuf,

    /// Byte offset of the filesystem inside the image (partitioned disks)
    #[arg(long, global = true, default_value_t = 0)]
    offset: u64,

    /// Block cache capacity, in blocks
    #[arg(long, global = true, default_value_t = 256)]
    cache_blocks: usize,

    /// Decoded inodes kept in memory, 0 to disable
    #[arg(long, global = true, default_value_t = 1024)]
    inode_cache: usize,

    /// Symlinks followed by one path resolution
    #[arg(long, global = true, default_value_t = 8)]
    max_links: u32,

    /// Mount even if the groups count from blocks and inodes disagree
    #[arg(long, global = true)]
    no_geometry_check: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the superblock summary
    Info,
    /// Print the block group descriptor table
    Groups,
    /// Print the inode behind a path, block pointers included
    Stat {
        path: String,
        /// Follow a final symbolic link
        #[arg(short = 'L', long)]
        follow: bool,
    },
    /// List the entries of a directory with their positions
    Ls {
        #[arg(default_value = "/")]
        path: String,
        /// Include `.` and `..`
        #[arg(short, long)]
        all: bool,
    },
    /// Write the content of a regular file to stdout
    Cat { path: String },
    /// Print the directory tree below a path
    Tree {
        #[arg(default_value = "/")]
        path: String,
        /// Maximum depth, 0 for unlimited
        #[arg(short, long, default_value_t = 0)]
        depth: usize,
    },
    /// Print the target of a symbolic link
    Readlink { path: String },
    /// Map logical blocks of a file to physical blocks
    Bmap {
        path: String,
        /// First logical block
        #[arg(long, default_value_t = 0)]
        start: u64,
        /// Number of logical blocks, 0 for the whole file
        #[arg(long, default_value_t = 0)]
        count: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    utils::log::init(cli.verbose);

    let file = File::open(&cli.image)
        .with_context(|| format!("opening {}", cli.image.display()))?;
    let options = MountOptions::new()
        .cache_blocks(cli.cache_blocks)
        .inode_cache(cli.inode_cache)
        .max_symlink_depth(cli.max_links)
        .check_geometry(!cli.no_geometry_check);
    let mount = Me2Mount::open(StdIO::new_with_offset(file, cli.offset), options)
        .with_context(|| format!("mounting {}", cli.image.display()))?;

    run(&mount, cli.command)?;

    let stats = mount.store().cache_stats();
    debug!(
        "cache: {} hits, {} misses, {} evictions",
        stats.hits, stats.misses, stats.evictions
    );
    Ok(())
}

fn run(mount: &Me2Mount<CachedStore<StdIO<File>>>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Info => report::info(mount),
        Commands::Groups => report::groups(mount)?,
        Commands::Stat { path, follow } => report::stat(mount, &path, follow)?,
        Commands::Ls { path, all } => report::ls(mount, &path, all)?,
        Commands::Cat { path } => report::cat(mount, &path)?,
        Commands::Tree { path, depth } => report::tree(mount, &path, depth)?,
        Commands::Readlink { path } => report::readlink(mount, &path)?,
        Commands::Bmap { path, start, count } => report::bmap(mount, &path, start, count)?,
    }
    Ok(())
}

// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(all(test, not(feature = "std")))]
extern crate std;

// Core modules
pub mod errors;
#[macro_use]
mod macros;
pub mod stats;

#[cfg(feature = "alloc")]
pub mod store;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::Me2IO;
    pub use super::Me2IOExt;
    pub use super::Me2IOStructExt;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "alloc")]
    pub use super::store::{BlockRef, BlockStore, CacheStats, CachedStore};

    #[cfg(feature = "mem")]
    pub use super::mem::MemIO;

    #[cfg(feature = "std")]
    pub use super::std::StdIO;
}

// Internal use
use errors::*;

// Constants

/// Size of the internal scratch buffer used by chunked and struct helpers.
/// Large enough for any on-disk ext2 metadata record.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Byte-addressed device abstraction.
///
/// Offsets are relative to the partition offset set with [`Me2IO::set_offset`].
/// Implementations may target RAM, image files, or raw block devices.
pub trait Me2IO {
    /// Writes `data` at `offset`.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Me2IOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Me2IOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> Me2IOResult;

    fn set_offset(&mut self, partition_offset: u64) -> u64;
    fn partition_offset(&self) -> u64;
}

/// Extension helpers for `Me2IO`: chunked transfers, zero fill and
/// little-endian primitive access.
pub trait Me2IOExt: Me2IO {
    /// Reads `buf.len()` bytes from `offset` in chunks of `chunk_size` or less.
    #[inline(always)]
    fn read_in_chunks(&mut self, offset: u64, buf: &mut [u8], chunk_size: usize) -> Me2IOResult {
        if chunk_size == 0 {
            return Err(Me2IOError::Invalid("read_in_chunks: zero chunk size"));
        }
        let mut off = offset;
        for chunk in buf.chunks_mut(chunk_size) {
            self.read_at(off, chunk)?;
            off += chunk.len() as u64;
        }
        Ok(())
    }

    /// Writes `buf.len()` bytes at `offset` in chunks of `chunk_size` or less.
    #[inline(always)]
    fn write_in_chunks(&mut self, offset: u64, buf: &[u8], chunk_size: usize) -> Me2IOResult {
        if chunk_size == 0 {
            return Err(Me2IOError::Invalid("write_in_chunks: zero chunk size"));
        }
        let mut off = offset;
        for chunk in buf.chunks(chunk_size) {
            self.write_at(off, chunk)?;
            off += chunk.len() as u64;
        }
        Ok(())
    }

    /// Fills a region with zeroes.
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> Me2IOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }

    // read_u16_at / write_u16_at / read_u16s_at ... up to u64
    me2io_impl_primitive_rw!(u16, u32, u64);
}

impl<T: Me2IO + ?Sized> Me2IOExt for T {}

/// Extension trait for reading and writing `zerocopy` layouts.
pub trait Me2IOStructExt: Me2IO {
    /// Reads a struct of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> Me2IOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(Me2IOError::Invalid("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| Me2IOError::Other("read_struct failed"))
    }

    /// Writes a struct of type `T` at the given offset.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> Me2IOResult {
        self.write_at(offset, val.as_bytes())
    }
}

impl<T: Me2IO + ?Sized> Me2IOStructExt for T {}

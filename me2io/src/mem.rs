// SPDX-License-Identifier: MIT

use crate::{Me2IO, Me2IOError, Me2IOResult};

/// In-memory implementation of `Me2IO`.
///
/// Useful for tests and RAM-backed images.
#[derive(Debug)]
pub struct MemIO<'a> {
    buffer: &'a mut [u8],
    partition_offset: u64,
}

impl<'a> MemIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(buffer: &'a mut [u8], partition_offset: u64) -> Self {
        Self {
            buffer,
            partition_offset,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    fn range(&self, offset: u64, len: usize) -> Me2IOResult<core::ops::Range<usize>> {
        let start = self
            .partition_offset
            .checked_add(offset)
            .ok_or(Me2IOError::OutOfBounds)?;
        let end = start
            .checked_add(len as u64)
            .ok_or(Me2IOError::OutOfBounds)?;
        if end > self.buffer.len() as u64 {
            return Err(Me2IOError::OutOfBounds);
        }
        Ok(start as usize..end as usize)
    }
}

impl<'a> Me2IO for MemIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Me2IOResult {
        let range = self.range(offset, data.len())?;
        self.buffer[range].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Me2IOResult {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.buffer[range]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> Me2IOResult {
        Ok(())
    }

    #[inline]
    fn set_offset(&mut self, partition_offset: u64) -> u64 {
        self.partition_offset = partition_offset;
        partition_offset
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.partition_offset
    }
}

// SPDX-License-Identifier: MIT

use std::io::{Error, ErrorKind, Read, Seek, SeekFrom, Write};

use crate::{Me2IO, Me2IOError, Me2IOResult};

/// `Me2IO` over any seekable `std::io` stream (image file, raw device).
#[derive(Debug)]
pub struct StdIO<T: Read + Write + Seek> {
    io: T,
    partition_offset: u64,
}

impl<T: Read + Write + Seek> StdIO<T> {
    #[inline]
    pub fn new(io: T) -> Self {
        Self {
            io,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(io: T, partition_offset: u64) -> Self {
        Self {
            io,
            partition_offset,
        }
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T: Read + Write + Seek> Me2IO for StdIO<T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Me2IOResult {
        let abs_offset = self.partition_offset + offset;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Me2IOResult {
        let abs_offset = self.partition_offset + offset;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> Me2IOResult {
        self.io.flush()?;
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

impl From<Error> for Me2IOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        match e.kind() {
            ErrorKind::UnexpectedEof => Me2IOError::OutOfBounds,
            ErrorKind::Unsupported => Me2IOError::Unsupported,
            ErrorKind::InvalidInput => Me2IOError::Invalid("invalid I/O argument"),
            ErrorKind::PermissionDenied => Me2IOError::Other("permission denied"),
            _ => Me2IOError::Other("device I/O error"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;
    use tempfile::tempfile;

    #[test]
    fn test_rw() {
        let mut file = tempfile().unwrap();
        let mut io = StdIO::new(&mut file);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_read_past_end_is_out_of_bounds() {
        let mut file = tempfile().unwrap();
        file.set_len(16).unwrap();
        let mut io = StdIO::new(&mut file);

        let mut output = [0u8; 8];
        assert_eq!(io.read_at(12, &mut output), Err(Me2IOError::OutOfBounds));
    }

    #[test]
    fn test_primitives_with_offset() {
        let mut file = tempfile().unwrap();
        let mut io = StdIO::new_with_offset(&mut file, 512);

        io.write_u16_at(0, 0xEF53).unwrap();
        io.write_u64_at(8, 0x0102_0304_0506_0708).unwrap();
        assert_eq!(io.read_u16_at(0).unwrap(), 0xEF53);
        assert_eq!(io.read_u64_at(8).unwrap(), 0x0102_0304_0506_0708);

        io.set_offset(0);
        assert_eq!(io.read_u16_at(512).unwrap(), 0xEF53);
    }

    #[test]
    fn test_zero_fill() {
        let mut file = tempfile().unwrap();
        let mut io = StdIO::new(&mut file);

        io.write_at(42, &[0xFF; 8]).unwrap();
        io.zero_fill(42, 8).unwrap();

        let mut buf = [0xAA; 8];
        io.read_at(42, &mut buf).unwrap();

        assert_eq!(buf, [0u8; 8]);
    }
}

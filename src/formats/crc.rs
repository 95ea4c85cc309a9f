//! CRC32 bookkeeping for CRAM 3.x structures

use flate2::Crc;
use std::io::{self, Read};

/// Reader adapter that checksums and counts every byte passing through
pub struct CrcReader<'a, R: Read + ?Sized> {
    inner: &'a mut R,
    crc: Crc,
}

impl<'a, R: Read + ?Sized> CrcReader<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            crc: Crc::new(),
        }
    }

    /// CRC32 of the bytes read so far
    pub fn sum(&self) -> u32 {
        self.crc.sum()
    }

    /// Number of bytes read so far
    pub fn amount(&self) -> usize {
        self.crc.amount() as usize
    }

    /// Read the little-endian CRC32 that trails the checksummed bytes
    ///
    /// The trailer itself is not fed into the running checksum.
    pub fn read_stored_crc(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

impl<R: Read + ?Sized> Read for CrcReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.crc.update(&buf[..n]);
        Ok(n)
    }
}

/// CRC32 of a byte slice
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(bytes);
    crc.sum()
}

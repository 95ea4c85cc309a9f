//! I/O abstraction layer
//!
//! Two concerns live here:
//!
//! - [`CramStream`], the position-tracking stream every CRAM iterator reads
//!   from. It wraps either a seekable source (files, cursors) or a plain
//!   sequential one (pipes, sockets) and reports which it is.
//! - [`SmartReader`] and friends for index files, with configurable buffer
//!   sizes and optional memory mapping, plus magic-byte sniffing.

use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Default buffer size for BufReader (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Large buffer size for high-throughput I/O (1MB)
pub const LARGE_BUFFER_SIZE: usize = 1024 * 1024;

/// Threshold for using memory mapping (100MB)
pub const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Anything that can be both read and repositioned
pub trait SeekableRead: Read + Seek {}

impl<T: Read + Seek + ?Sized> SeekableRead for T {}

enum Input {
    Sequential(Box<dyn Read>),
    Seekable(Box<dyn SeekableRead>),
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Input::Sequential(reader) => reader.read(buf),
            Input::Seekable(reader) => reader.read(buf),
        }
    }
}

impl Seek for Input {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Input::Sequential(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "stream is not seekable",
            )),
            Input::Seekable(reader) => reader.seek(pos),
        }
    }
}

/// Buffered CRAM byte stream that knows its own position
///
/// The position counts bytes consumed since the stream was handed over,
/// and becomes absolute after the first seek.
pub struct CramStream {
    inner: BufReader<Input>,
    position: u64,
    seekable: bool,
}

impl CramStream {
    /// Open a file as a seekable stream
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::seekable(file))
    }

    /// Wrap a seekable source
    pub fn seekable<R: Read + Seek + 'static>(reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, Input::Seekable(Box::new(reader))),
            position: 0,
            seekable: true,
        }
    }

    /// Wrap a forward-only source
    pub fn sequential<R: Read + 'static>(reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, Input::Sequential(Box::new(reader))),
            position: 0,
            seekable: false,
        }
    }

    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    /// Current byte position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Seek to an absolute byte offset
    pub fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset)).map(|_| ())
    }

    /// True when no further bytes can be read
    pub fn at_eof(&mut self) -> io::Result<bool> {
        Ok(self.fill_buf()?.is_empty())
    }
}

impl Read for CramStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl BufRead for CramStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
        self.position += amt as u64;
    }
}

impl Seek for CramStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = self.inner.seek(pos)?;
        self.position = position;
        Ok(position)
    }
}

/// Read exactly `len` bytes, growing the buffer only as data arrives
///
/// `len` usually comes from a length field on disk, so a corrupt value
/// fails with `UnexpectedEof` instead of allocating up front.
pub fn read_bytes<R: Read + ?Sized>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    Read::take(&mut *reader, len as u64).read_to_end(&mut buf)?;
    if buf.len() < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, found {}", len, buf.len()),
        ));
    }
    Ok(buf)
}

/// I/O strategy selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IoStrategy {
    /// Use buffered reading with configurable buffer size
    Buffered(usize),
    /// Use memory mapping for the entire file
    MemoryMapped,
    /// Automatically select based on file size
    #[default]
    Auto,
}

/// A smart reader that automatically selects the optimal I/O strategy
pub enum SmartReader {
    /// Buffered reader for smaller files or streaming
    Buffered(BufReader<File>),
    /// Memory-mapped reader for large files
    Mapped(MappedReader),
}

/// Memory-mapped file reader
pub struct MappedReader {
    mmap: Mmap,
    position: usize,
}

impl MappedReader {
    /// Create a new memory-mapped reader
    pub fn new(file: &File) -> io::Result<Self> {
        // SAFETY: We assume the file won't be modified while mapped
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap, position: 0 })
    }
}

impl Read for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.mmap[self.position..];
        let to_read = std::cmp::min(buf.len(), remaining.len());
        buf[..to_read].copy_from_slice(&remaining[..to_read]);
        self.position += to_read;
        Ok(to_read)
    }
}

impl BufRead for MappedReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(&self.mmap[self.position..])
    }

    fn consume(&mut self, amt: usize) {
        self.position = std::cmp::min(self.position + amt, self.mmap.len());
    }
}

impl SmartReader {
    /// Open a file with the specified I/O strategy
    pub fn open<P: AsRef<Path>>(path: P, strategy: IoStrategy) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let file_size = file.metadata()?.len();

        match strategy {
            IoStrategy::Buffered(buf_size) => {
                Ok(SmartReader::Buffered(BufReader::with_capacity(buf_size, file)))
            }
            IoStrategy::MemoryMapped => Ok(SmartReader::Mapped(MappedReader::new(&file)?)),
            IoStrategy::Auto => {
                if file_size >= MMAP_THRESHOLD {
                    Ok(SmartReader::Mapped(MappedReader::new(&file)?))
                } else {
                    let buf_size = if file_size > 10 * 1024 * 1024 {
                        LARGE_BUFFER_SIZE
                    } else {
                        DEFAULT_BUFFER_SIZE
                    };
                    Ok(SmartReader::Buffered(BufReader::with_capacity(buf_size, file)))
                }
            }
        }
    }

    /// Check if using memory mapping
    pub fn is_mapped(&self) -> bool {
        matches!(self, SmartReader::Mapped(_))
    }
}

impl Read for SmartReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SmartReader::Buffered(reader) => reader.read(buf),
            SmartReader::Mapped(reader) => reader.read(buf),
        }
    }
}

impl BufRead for SmartReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            SmartReader::Buffered(reader) => reader.fill_buf(),
            SmartReader::Mapped(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            SmartReader::Buffered(reader) => reader.consume(amt),
            SmartReader::Mapped(reader) => reader.consume(amt),
        }
    }
}

/// Compression format of an index file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Plain text (uncompressed)
    Plain,
    /// Gzip compressed (.gz, .crai)
    Gzip,
    /// Bzip2 compressed (.bz2)
    Bzip2,
}

/// Detect compression format from magic bytes
pub fn detect_compression(magic: &[u8]) -> CompressionFormat {
    if magic.len() >= 2 && magic[0] == 0x1f && magic[1] == 0x8b {
        CompressionFormat::Gzip
    } else if magic.len() >= 3 && &magic[..3] == b"BZh" {
        CompressionFormat::Bzip2
    } else {
        CompressionFormat::Plain
    }
}

/// Read up to `N` leading bytes of a file
pub fn read_magic<const N: usize, P: AsRef<Path>>(path: P) -> io::Result<([u8; N], usize)> {
    let mut file = File::open(path.as_ref())?;
    let mut magic = [0u8; N];
    let mut filled = 0;
    while filled < N {
        match file.read(&mut magic[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok((magic, filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_io_strategy_default() {
        assert_eq!(IoStrategy::default(), IoStrategy::Auto);
    }

    #[test]
    fn test_smart_reader_auto_small_file() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        writeln!(temp, "small index")?;

        let reader = SmartReader::open(temp.path(), IoStrategy::Auto)?;
        assert!(!reader.is_mapped());
        Ok(())
    }

    #[test]
    fn test_smart_reader_mapped() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        temp.write_all(b"BAI\x01")?;
        temp.flush()?;

        let mut reader = SmartReader::open(temp.path(), IoStrategy::MemoryMapped)?;
        assert!(reader.is_mapped());
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        assert_eq!(content, b"BAI\x01");
        Ok(())
    }

    #[test]
    fn test_cram_stream_tracks_position() -> io::Result<()> {
        let mut stream = CramStream::seekable(Cursor::new(b"0123456789".to_vec()));
        assert!(stream.is_seekable());

        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf)?;
        assert_eq!(stream.position(), 4);

        stream.seek_to(8)?;
        assert_eq!(stream.position(), 8);
        stream.read_exact(&mut buf[..2])?;
        assert_eq!(&buf[..2], b"89");
        assert!(stream.at_eof()?);
        Ok(())
    }

    #[test]
    fn test_sequential_stream_refuses_seek() {
        let mut stream = CramStream::sequential(Cursor::new(b"abc".to_vec()));
        assert!(!stream.is_seekable());
        let err = stream.seek_to(1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn test_detect_compression() {
        assert_eq!(detect_compression(&[0x1f, 0x8b, 0x08]), CompressionFormat::Gzip);
        assert_eq!(detect_compression(b"BZh"), CompressionFormat::Bzip2);
        assert_eq!(detect_compression(b"1\t"), CompressionFormat::Plain);
        assert_eq!(detect_compression(&[]), CompressionFormat::Plain);
    }

    #[test]
    fn test_read_bytes_does_not_trust_length() {
        let mut cursor = Cursor::new(b"abcdef".to_vec());
        assert_eq!(read_bytes(&mut cursor, 4).unwrap(), b"abcd");

        let err = read_bytes(&mut cursor, usize::MAX >> 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_read_magic_short_file() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        temp.write_all(b"CR")?;
        temp.flush()?;

        let (magic, filled) = read_magic::<4, _>(temp.path())?;
        assert_eq!(filled, 2);
        assert_eq!(&magic[..filled], b"CR");
        Ok(())
    }
}

//! CRAM variable-length integers
//!
//! ITF-8 stores a 32-bit integer in 1-5 bytes and LTF-8 a 64-bit integer in
//! 1-9 bytes. The number of leading 1 bits in the first byte gives the count
//! of bytes that follow.
//!
//! ```text
//! 0xxxxxxx                                      1 byte
//! 10xxxxxx xxxxxxxx                             2 bytes
//! 110xxxxx xxxxxxxx xxxxxxxx                    3 bytes
//! 1110xxxx xxxxxxxx xxxxxxxx xxxxxxxx           4 bytes
//! 1111xxxx xxxxxxxx xxxxxxxx xxxxxxxx 0000xxxx  5 bytes (ITF-8 only)
//! ```

use std::io::{self, Read, Write};

fn read_u8<R: Read + ?Sized>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Decode an ITF-8 integer
pub fn read_itf8<R: Read + ?Sized>(reader: &mut R) -> io::Result<i32> {
    let first = read_u8(reader)? as u32;

    let value = if first & 0x80 == 0 {
        first
    } else if first & 0x40 == 0 {
        let mut rest = [0u8; 1];
        reader.read_exact(&mut rest)?;
        ((first & 0x3F) << 8) | rest[0] as u32
    } else if first & 0x20 == 0 {
        let mut rest = [0u8; 2];
        reader.read_exact(&mut rest)?;
        ((first & 0x1F) << 16) | (rest[0] as u32) << 8 | rest[1] as u32
    } else if first & 0x10 == 0 {
        let mut rest = [0u8; 3];
        reader.read_exact(&mut rest)?;
        ((first & 0x0F) << 24) | (rest[0] as u32) << 16 | (rest[1] as u32) << 8 | rest[2] as u32
    } else {
        // the final byte only contributes its low nibble
        let mut rest = [0u8; 4];
        reader.read_exact(&mut rest)?;
        ((first & 0x0F) << 28)
            | (rest[0] as u32) << 20
            | (rest[1] as u32) << 12
            | (rest[2] as u32) << 4
            | (rest[3] as u32 & 0x0F)
    };

    Ok(value as i32)
}

/// Encode an ITF-8 integer, returning the number of bytes written
pub fn write_itf8<W: Write + ?Sized>(writer: &mut W, value: i32) -> io::Result<usize> {
    let v = value as u32;
    let mut buf = [0u8; 5];
    let len = if v >> 7 == 0 {
        buf[0] = v as u8;
        1
    } else if v >> 14 == 0 {
        buf[0] = 0x80 | (v >> 8) as u8;
        buf[1] = v as u8;
        2
    } else if v >> 21 == 0 {
        buf[0] = 0xC0 | (v >> 16) as u8;
        buf[1] = (v >> 8) as u8;
        buf[2] = v as u8;
        3
    } else if v >> 28 == 0 {
        buf[0] = 0xE0 | (v >> 24) as u8;
        buf[1] = (v >> 16) as u8;
        buf[2] = (v >> 8) as u8;
        buf[3] = v as u8;
        4
    } else {
        buf[0] = 0xF0 | (v >> 28) as u8;
        buf[1] = (v >> 20) as u8;
        buf[2] = (v >> 12) as u8;
        buf[3] = (v >> 4) as u8;
        buf[4] = (v & 0x0F) as u8;
        5
    };
    writer.write_all(&buf[..len])?;
    Ok(len)
}

/// Decode an LTF-8 integer
pub fn read_ltf8<R: Read + ?Sized>(reader: &mut R) -> io::Result<i64> {
    let first = read_u8(reader)?;
    let len = (first.leading_ones() as usize + 1).min(9);

    let mut value: u64 = if len < 8 {
        (first & (0xFF >> len)) as u64
    } else {
        0
    };

    let mut rest = [0u8; 8];
    reader.read_exact(&mut rest[..len - 1])?;
    for &byte in &rest[..len - 1] {
        value = (value << 8) | byte as u64;
    }

    Ok(value as i64)
}

/// Encode an LTF-8 integer, returning the number of bytes written
pub fn write_ltf8<W: Write + ?Sized>(writer: &mut W, value: i64) -> io::Result<usize> {
    let v = value as u64;
    let len = (1..=8usize)
        .find(|&n| v >> (7 * n) == 0)
        .unwrap_or(9);

    let mut buf = [0u8; 9];
    if len == 9 {
        buf[0] = 0xFF;
        buf[1..].copy_from_slice(&v.to_be_bytes());
    } else {
        let prefix = !(0xFFu8 >> (len - 1));
        let payload = v.to_be_bytes();
        // low `len` bytes of the value, big-endian
        buf[..len].copy_from_slice(&payload[8 - len..]);
        buf[0] |= prefix;
    }
    writer.write_all(&buf[..len])?;
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn itf8_bytes(value: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        write_itf8(&mut buf, value).unwrap();
        buf
    }

    fn ltf8_bytes(value: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_ltf8(&mut buf, value).unwrap();
        buf
    }

    #[test]
    fn test_itf8_known_encodings() {
        assert_eq!(itf8_bytes(0), vec![0x00]);
        assert_eq!(itf8_bytes(127), vec![0x7F]);
        assert_eq!(itf8_bytes(128), vec![0x80, 0x80]);
        assert_eq!(itf8_bytes(322), vec![0x81, 0x42]);
        assert_eq!(itf8_bytes(-1), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_itf8_decode_two_bytes() {
        let mut reader = Cursor::new(vec![0x81, 0x42]);
        assert_eq!(read_itf8(&mut reader).unwrap(), 322);
    }

    #[test]
    fn test_itf8_round_trip_boundaries() {
        for value in [0, 1, 127, 128, 16383, 16384, 2_097_151, 2_097_152, 268_435_455, 268_435_456, i32::MAX, -1, i32::MIN] {
            let bytes = itf8_bytes(value);
            let decoded = read_itf8(&mut Cursor::new(bytes)).unwrap();
            assert_eq!(decoded, value, "value {}", value);
        }
    }

    #[test]
    fn test_itf8_truncated() {
        let mut reader = Cursor::new(vec![0xC0, 0x01]);
        let err = read_itf8(&mut reader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_ltf8_known_encodings() {
        assert_eq!(ltf8_bytes(0), vec![0x00]);
        assert_eq!(ltf8_bytes(128), vec![0x80, 0x80]);
        assert_eq!(ltf8_bytes(-1), vec![0xFF; 9]);
    }

    #[test]
    fn test_ltf8_round_trip_boundaries() {
        let mut values = vec![0i64, 1, -1, i64::MAX, i64::MIN];
        for shift in 1..63 {
            values.push((1i64 << shift) - 1);
            values.push(1i64 << shift);
        }
        for value in values {
            let bytes = ltf8_bytes(value);
            let decoded = read_ltf8(&mut Cursor::new(bytes)).unwrap();
            assert_eq!(decoded, value, "value {}", value);
        }
    }

    #[test]
    fn test_ltf8_truncated() {
        let mut reader = Cursor::new(vec![0xE0]);
        assert!(read_ltf8(&mut reader).is_err());
    }
}

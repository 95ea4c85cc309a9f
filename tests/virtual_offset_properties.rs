//! Property-based tests for virtual offsets and variable-length integers
//!
//! **Feature: cram-seek, Property 1: 虚拟偏移编解码**

use cram_seek::core::itf8::{read_itf8, read_ltf8, write_itf8, write_ltf8};
use cram_seek::core::virtual_offset::{decode, encode, MAX_CONTAINER_OFFSET};
use cram_seek::VirtualOffset;
use proptest::prelude::*;
use std::io::Cursor;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Encoding the decoded parts gives back the raw value for every u64
    #[test]
    fn prop_encode_inverts_decode(raw in any::<u64>()) {
        let (offset, slice) = decode(raw);
        prop_assert!(offset <= MAX_CONTAINER_OFFSET);
        prop_assert_eq!(encode(offset, slice), raw);
        prop_assert_eq!(VirtualOffset::from_raw(raw).decode(), (offset, slice));
    }

    /// Parts survive packing when the offset fits in 48 bits
    #[test]
    fn prop_parts_survive_packing(
        offset in 0u64..=MAX_CONTAINER_OFFSET,
        slice in any::<u16>(),
    ) {
        let voffset = VirtualOffset::new(offset, slice);
        prop_assert_eq!(voffset.container_offset(), offset);
        prop_assert_eq!(voffset.sub_unit_index(), slice);
    }

    /// Ordering of virtual offsets is file order, then slice order
    #[test]
    fn prop_ordering_follows_file_then_slice(
        a in (0u64..1 << 40, any::<u16>()),
        b in (0u64..1 << 40, any::<u16>()),
    ) {
        let va = VirtualOffset::new(a.0, a.1);
        let vb = VirtualOffset::new(b.0, b.1);
        prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        prop_assert_eq!(va.same_container(vb), a.0 == b.0);
    }

    /// ITF8 values read back exactly and consume every written byte
    #[test]
    fn prop_itf8_reads_back(value in any::<i32>()) {
        let mut buf = Vec::new();
        let written = write_itf8(&mut buf, value).unwrap();
        prop_assert_eq!(written, buf.len());
        prop_assert!(written <= 5);

        let mut cursor = Cursor::new(&buf);
        prop_assert_eq!(read_itf8(&mut cursor).unwrap(), value);
        prop_assert_eq!(cursor.position() as usize, buf.len());
    }

    /// LTF8 values read back exactly and consume every written byte
    #[test]
    fn prop_ltf8_reads_back(value in any::<i64>()) {
        let mut buf = Vec::new();
        let written = write_ltf8(&mut buf, value).unwrap();
        prop_assert_eq!(written, buf.len());
        prop_assert!(written <= 9);

        let mut cursor = Cursor::new(&buf);
        prop_assert_eq!(read_ltf8(&mut cursor).unwrap(), value);
        prop_assert_eq!(cursor.position() as usize, buf.len());
    }
}

#[test]
fn test_small_itf8_values_take_one_byte() {
    for value in [0, 1, 64, 127] {
        let mut buf = Vec::new();
        assert_eq!(write_itf8(&mut buf, value).unwrap(), 1);
    }
    let mut buf = Vec::new();
    assert_eq!(write_itf8(&mut buf, -1).unwrap(), 5);
}

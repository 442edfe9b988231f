use esedb::{
    EsedbError, PageDecoder, PageFlags, PageKind,
    types::{PAGE_HEADER_SIZE, EXTENDED_PAGE_HEADER_SIZE, XOR32_SEED, page::PageFormat},
    utils::{hash::calculate_xor32, mock::PageBuilder},
};

fn restamp(page: &mut [u8], page_number: u32, format: PageFormat) {
    let checksum = calculate_xor32(
        format.checksum_seed(page_number),
        &page[format.checksum_start()..],
    );
    page[0..4].copy_from_slice(&checksum.to_le_bytes());
}

#[test]
fn test_format_selection() {
    assert_eq!(PageFormat::select(0x09, 8192), PageFormat::Legacy);
    assert_eq!(PageFormat::select(0x0a, 32768), PageFormat::Legacy);
    assert_eq!(PageFormat::select(0x0b, 8192), PageFormat::Extended);
    assert_eq!(PageFormat::select(0x11, 8192), PageFormat::Extended);
    assert_eq!(PageFormat::select(0x10, 32768), PageFormat::Extended);
    assert_eq!(PageFormat::select(0x11, 16384), PageFormat::ExtendedLarge);
    assert_eq!(PageFormat::select(0x14, 32768), PageFormat::ExtendedLarge);

    assert_eq!(PageFormat::Legacy.header_size(), PAGE_HEADER_SIZE);
    assert_eq!(PageFormat::ExtendedLarge.header_size(), EXTENDED_PAGE_HEADER_SIZE);
    assert_eq!(PageFormat::Legacy.checksum_seed(7), XOR32_SEED);
    assert_eq!(PageFormat::Extended.checksum_seed(7), XOR32_SEED ^ 8);
}

#[test]
fn test_decode_legacy_page() {
    let bytes = PageBuilder::new(5, 4096, 0x09)
        .flags(PageFlags::ROOT | PageFlags::LEAF)
        .siblings(4, 6)
        .value(b"first")
        .value(b"second value")
        .build();
    let decoder = PageDecoder::new(4096, 0x09);
    assert_eq!(decoder.format(), PageFormat::Legacy);
    assert!(decoder.verify_checksum(5, &bytes).unwrap().is_valid());

    let page = decoder.decode(5, &bytes).unwrap();
    assert_eq!(page.header.stored_page_number, Some(5));
    assert_eq!(page.header.ecc_checksum, None);
    assert_eq!(page.header.previous_page, 4);
    assert_eq!(page.header.next_page, 6);
    assert_eq!(page.header.father_data_page_object_identifier, 1);
    assert!(page.is_root());
    assert!(page.is_leaf());
    assert_eq!(page.kind(), PageKind::Leaf);

    assert_eq!(page.value_count(), 2);
    assert_eq!(page.values[0].offset as usize, PAGE_HEADER_SIZE);
    assert_eq!(page.get_value(0), Some(&b"first"[..]));
    assert_eq!(page.get_value(1), Some(&b"second value"[..]));
}

#[test]
fn test_extended_checksum_depends_on_page_number() {
    let bytes = PageBuilder::new(9, 8192, 0x0c).value(b"row").build();
    let decoder = PageDecoder::new(8192, 0x0c);

    assert!(decoder.verify_checksum(9, &bytes).unwrap().is_valid());
    // The same bytes read back at another position no longer verify.
    assert!(!decoder.verify_checksum(10, &bytes).unwrap().is_valid());

    let page = decoder.decode(9, &bytes).unwrap();
    assert_eq!(page.header.stored_page_number, None);
    assert!(page.header.ecc_checksum.is_some());
    assert!(page.header.extended.is_none());
}

#[test]
fn test_checksum_detects_flipped_byte() {
    let mut bytes = PageBuilder::new(0, 8192, 0x0c).value(b"row").build();
    bytes[5000] ^= 0x40;
    let checksum = PageDecoder::new(8192, 0x0c).verify_checksum(0, &bytes).unwrap();
    assert!(!checksum.is_valid());
    assert_ne!(checksum.stored, checksum.calculated);
}

#[test]
fn test_decode_large_page_with_extended_header() {
    let bytes = PageBuilder::new(3, 32768, 0x14)
        .value(&[0x01, 0x40, 0xaa, 0xbb])
        .value(b"x")
        .build();
    let decoder = PageDecoder::new(32768, 0x14);
    assert_eq!(decoder.format(), PageFormat::ExtendedLarge);
    assert!(decoder.verify_checksum(3, &bytes).unwrap().is_valid());

    let page = decoder.decode(3, &bytes).unwrap();
    let extended = page.header.extended.as_ref().unwrap();
    assert_eq!(extended.page_number, 4);
    assert_eq!(page.values[0].offset as usize, EXTENDED_PAGE_HEADER_SIZE);
    // Large pages carry the value flags in the top bits of the value's first word.
    assert_eq!(page.values[0].flags, 2);
    assert_eq!(page.values[1].flags, 0);
    assert_eq!(page.get_value(1), Some(&b"x"[..]));
}

#[test]
fn test_small_page_tag_flags() {
    let mut bytes = PageBuilder::new(0, 8192, 0x0c).value(b"abc").build();
    let tag = 8192 - 4;
    let raw_offset = u16::from_le_bytes([bytes[tag + 2], bytes[tag + 3]]) | 0x6000;
    bytes[tag + 2..tag + 4].copy_from_slice(&raw_offset.to_le_bytes());

    let page = PageDecoder::new(8192, 0x0c).decode(0, &bytes).unwrap();
    assert_eq!(page.values[0].flags, 3);
    assert_eq!(page.get_value(0), Some(&b"abc"[..]));
}

#[test]
fn test_value_out_of_bounds() {
    let mut bytes = PageBuilder::new(2, 4096, 0x0c).value(b"abc").build();
    let tag = 4096 - 4;
    bytes[tag..tag + 2].copy_from_slice(&0x1000u16.to_le_bytes());
    restamp(&mut bytes, 2, PageFormat::Extended);

    match PageDecoder::new(4096, 0x0c).decode(2, &bytes) {
        Err(EsedbError::PageValueOutOfBounds {
            page_number,
            index,
            offset,
            size,
            limit,
        }) => {
            assert_eq!(page_number, 2);
            assert_eq!(index, 0);
            assert_eq!(offset, PAGE_HEADER_SIZE);
            assert_eq!(size, 0x1000);
            assert_eq!(limit, 4096 - 4);
        }
        other => panic!("expected out-of-bounds value, got {:?}", other.err()),
    }
}

#[test]
fn test_tag_count_larger_than_page() {
    let mut bytes = PageBuilder::new(0, 4096, 0x0c).build();
    bytes[34..36].copy_from_slice(&2000u16.to_le_bytes());

    assert!(matches!(
        PageDecoder::new(4096, 0x0c).decode(0, &bytes),
        Err(EsedbError::CorruptedPage { page_number: 0, .. })
    ));
}

#[test]
fn test_wrong_buffer_length() {
    let bytes = PageBuilder::new(0, 4096, 0x0c).build();
    let decoder = PageDecoder::new(8192, 0x0c);
    assert!(matches!(
        decoder.decode(0, &bytes),
        Err(EsedbError::CorruptedPage { .. })
    ));
    assert!(matches!(
        decoder.verify_checksum(0, &bytes),
        Err(EsedbError::CorruptedPage { .. })
    ));
}

#[test]
fn test_empty_page_detection() {
    assert!(PageDecoder::is_empty_page(&[0u8; 4096]));
    let built = PageBuilder::new(0, 4096, 0x0c).build();
    assert!(!PageDecoder::is_empty_page(&built));
}

#[test]
fn test_page_kind_precedence() {
    assert_eq!(PageFlags::ROOT.kind(), PageKind::Root);
    assert_eq!((PageFlags::ROOT | PageFlags::PARENT).kind(), PageKind::Branch);
    assert_eq!((PageFlags::ROOT | PageFlags::LEAF).kind(), PageKind::Leaf);
    assert_eq!((PageFlags::LEAF | PageFlags::INDEX).kind(), PageKind::Index);
    assert_eq!((PageFlags::LEAF | PageFlags::LONG_VALUE).kind(), PageKind::LongValue);
    assert_eq!((PageFlags::PARENT | PageFlags::SPACE_TREE).kind(), PageKind::SpaceTree);
    assert_eq!((PageFlags::LEAF | PageFlags::EMPTY).kind(), PageKind::Empty);
    assert_eq!(PageFlags::empty().kind(), PageKind::Unknown);
    assert_eq!(PageFlags::NEW_RECORD_FORMAT.kind(), PageKind::Unknown);
}

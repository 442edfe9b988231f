use chrono::NaiveDate;
use esedb::{
    EsedbError, FileHeader,
    storage::header::{DatabaseState, FileType, OFFSET_CHECKSUM, OFFSET_PAGE_SIZE},
    types::{FILE_HEADER_SIZE, FILE_SIGNATURE, XOR32_SEED, log_time::LogTime},
    utils::hash::calculate_xor32,
};

fn sample_header() -> FileHeader {
    FileHeader {
        format_version: 0x620,
        format_revision: 0x14,
        page_size: 32768,
        database_state: DatabaseState::DirtyShutdown,
        last_object_identifier: 1234,
        database_time: 0x0102_0304_0506_0708,
        consistent_time: LogTime::from_bytes([30, 15, 10, 5, 6, 120, 0, 0]),
        creation_format_version: 0x620,
        creation_format_revision: 0x11,
        ..FileHeader::default()
    }
}

fn restamp(bytes: &mut [u8]) {
    let checksum = calculate_xor32(XOR32_SEED, &bytes[8..FILE_HEADER_SIZE]);
    bytes[OFFSET_CHECKSUM..OFFSET_CHECKSUM + 4].copy_from_slice(&checksum.to_le_bytes());
}

#[test]
fn test_header_serialization_and_decoding() {
    let mut header = sample_header();
    let bytes = header.to_bytes();
    assert_eq!(bytes.len(), FILE_HEADER_SIZE);
    assert_eq!(&bytes[0..4], &FILE_SIGNATURE);

    let decoded = FileHeader::from_bytes(&bytes, 0).unwrap();
    header.checksum = decoded.checksum;
    assert_eq!(decoded, header);
    assert_eq!(decoded.file_type, FileType::Database);
    assert_eq!(decoded.validate_page_size().unwrap(), 32768);
}

#[test]
fn test_fields_read_from_documented_offsets() {
    let mut bytes = FileHeader::default().to_bytes();
    bytes[OFFSET_PAGE_SIZE..OFFSET_PAGE_SIZE + 4].copy_from_slice(&4096u32.to_le_bytes());
    bytes[232..236].copy_from_slice(&0x09u32.to_le_bytes());
    bytes[52..56].copy_from_slice(&5u32.to_le_bytes());
    restamp(&mut bytes);

    let header = FileHeader::from_bytes(&bytes, 0).unwrap();
    assert_eq!(header.page_size, 4096);
    assert_eq!(header.format_revision, 0x09);
    assert_eq!(header.database_state, DatabaseState::ForceDetach);
}

#[test]
fn test_signature_mismatch_takes_precedence() {
    let mut bytes = FileHeader::default().to_bytes();
    bytes[0..4].copy_from_slice(b"SQLi");
    // The signature sits outside the checksummed region.
    match FileHeader::from_bytes(&bytes, 0) {
        Err(EsedbError::SignatureMismatch { found }) => assert_eq!(&found, b"SQLi"),
        other => panic!("expected signature mismatch, got {:?}", other),
    }

    let zeros = vec![0u8; FILE_HEADER_SIZE];
    assert!(matches!(
        FileHeader::from_bytes(&zeros, 0),
        Err(EsedbError::SignatureMismatch { found: [0, 0, 0, 0] })
    ));
}

#[test]
fn test_checksum_mismatch_reports_both_values() {
    let mut bytes = FileHeader::default().to_bytes();
    bytes[2000] ^= 0x10;
    let expected = calculate_xor32(XOR32_SEED, &bytes[8..]);
    let stored = u32::from_le_bytes(bytes[4..8].try_into().unwrap());

    match FileHeader::from_bytes(&bytes, 8192) {
        Err(EsedbError::ChecksumMismatch {
            offset,
            stored: s,
            calculated,
        }) => {
            assert_eq!(offset, 8192);
            assert_eq!(s, stored);
            assert_eq!(calculated, expected);
        }
        other => panic!("expected checksum mismatch, got {:?}", other),
    }
}

#[test]
fn test_every_single_bit_flip_is_detected() {
    let original = sample_header().to_bytes();
    let mut bytes = original.clone();

    for byte in 4..FILE_HEADER_SIZE {
        for bit in 0..8 {
            bytes[byte] ^= 1 << bit;
            assert!(
                matches!(
                    FileHeader::from_bytes(&bytes, 0),
                    Err(EsedbError::ChecksumMismatch { .. })
                ),
                "flip of bit {} in byte {} went undetected",
                bit,
                byte
            );
            bytes[byte] ^= 1 << bit;
        }
    }
    assert_eq!(bytes, original);
}

#[test]
fn test_short_buffer_is_rejected() {
    let bytes = FileHeader::default().to_bytes();
    match FileHeader::from_bytes(&bytes[..100], 0) {
        Err(EsedbError::ShortRead {
            expected, actual, ..
        }) => {
            assert_eq!(expected, FILE_HEADER_SIZE);
            assert_eq!(actual, 100);
        }
        other => panic!("expected short read, got {:?}", other),
    }
}

#[test]
fn test_page_size_validation() {
    for page_size in [2048, 4096, 8192, 16384, 32768] {
        let header = FileHeader {
            page_size,
            ..FileHeader::default()
        };
        assert_eq!(header.validate_page_size().unwrap(), page_size);
    }
    for page_size in [0, 1024, 4097, 65536] {
        let header = FileHeader {
            page_size,
            ..FileHeader::default()
        };
        assert!(matches!(
            header.validate_page_size(),
            Err(EsedbError::UnsupportedPageSize { page_size: p }) if p == page_size
        ));
    }
}

#[test]
fn test_geometry_comparison() {
    let primary = FileHeader::default();
    let same = FileHeader {
        database_time: 99,
        ..FileHeader::default()
    };
    let other_size = FileHeader {
        page_size: 4096,
        ..FileHeader::default()
    };
    assert!(primary.matches_geometry(&same));
    assert!(!primary.matches_geometry(&other_size));
}

#[test]
fn test_log_time_conversion() {
    let time = LogTime::from_bytes([30, 15, 10, 5, 6, 120, 0, 0]);
    let expected = NaiveDate::from_ymd_opt(2020, 6, 5)
        .unwrap()
        .and_hms_opt(10, 15, 30)
        .unwrap();
    assert_eq!(time.to_naive_datetime(), Some(expected));

    assert!(LogTime::default().is_zero());
    assert_eq!(LogTime::default().to_naive_datetime(), None);
    assert_eq!(LogTime::from_bytes([0, 0, 0, 31, 13, 120, 0, 0]).to_naive_datetime(), None);
}

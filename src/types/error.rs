use thiserror::Error;

use crate::types::PageNumber;

#[derive(Error, Debug)]
pub enum EsedbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {details}")]
    Argument { details: String },

    #[error("Unsupported operation: {details}")]
    UnsupportedOperation { details: String },

    #[error("Unable to allocate {what}")]
    Memory { what: String },

    #[error("Unsupported file signature: {found:02x?}")]
    SignatureMismatch { found: [u8; 4] },

    #[error("Mismatch in file header checksum at offset {offset}: stored 0x{stored:08x}, calculated 0x{calculated:08x}")]
    ChecksumMismatch {
        offset: u64,
        stored: u32,
        calculated: u32,
    },

    #[error("Unsupported page size: {page_size}")]
    UnsupportedPageSize { page_size: u32 },

    #[error("Short read at offset {offset}: expected {expected} bytes, got {actual} bytes")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Field at offset {offset} ({length} bytes) exceeds buffer of {available} bytes")]
    OutOfBounds {
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error("I/O handle already has a provider bound")]
    AlreadyBound,

    #[error("File is already open")]
    AlreadyOpen,

    #[error("File is not open")]
    NotOpen,

    #[error("Unsupported value {value} for {what}")]
    UnsupportedValue { what: String, value: i64 },

    #[error("Unable to open block I/O provider: {0}")]
    ProviderOpenFailed(#[source] std::io::Error),

    #[error("Unable to close block I/O provider: {0}")]
    ProviderCloseFailed(#[source] std::io::Error),

    #[error("Page {page_number} out of range (page count: {page_count})")]
    PageOutOfRange {
        page_number: PageNumber,
        page_count: usize,
    },

    #[error("Page {page_number} value {index} (offset {offset}, size {size}) exceeds page boundary {limit}")]
    PageValueOutOfBounds {
        page_number: PageNumber,
        index: usize,
        offset: usize,
        size: usize,
        limit: usize,
    },

    #[error("Corrupted page: page_number={page_number}, reason={reason}")]
    CorruptedPage {
        page_number: PageNumber,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, EsedbError>;

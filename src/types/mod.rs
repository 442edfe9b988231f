pub mod codepage;
pub mod error;
pub mod flags;
pub mod log_time;
pub mod page;

// Common type aliases
pub type PageNumber = u32;
pub type ObjectIdentifier = u32;

// Constants following the ESE on-disk layout
pub const FILE_HEADER_SIZE: usize = 4096;
pub const FILE_SIGNATURE: [u8; 4] = [0xef, 0xcd, 0xab, 0x89];
pub const XOR32_SEED: u32 = 0x89ab_cdef;

/// Number of header-sized slots (primary and shadow) before the page region.
pub const HEADER_SLOT_COUNT: u64 = 2;

pub const SUPPORTED_PAGE_SIZES: [u32; 5] = [2048, 4096, 8192, 16384, 32768];

pub const PAGE_HEADER_SIZE: usize = 40;
pub const EXTENDED_PAGE_HEADER_SIZE: usize = 80;
pub const PAGE_TAG_SIZE: usize = 4;

// Format revisions that change the page layout
pub const FORMAT_REVISION_EXTENDED_PAGE_HEADER: u32 = 0x0b;
pub const FORMAT_REVISION_NEW_RECORD_FORMAT: u32 = 0x11;

pub fn is_supported_page_size(page_size: u32) -> bool {
    SUPPORTED_PAGE_SIZES.contains(&page_size)
}

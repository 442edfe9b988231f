use bitflags::bitflags;
use serde::Serialize;

use crate::{
    types::{
        EXTENDED_PAGE_HEADER_SIZE, FORMAT_REVISION_EXTENDED_PAGE_HEADER,
        FORMAT_REVISION_NEW_RECORD_FORMAT, ObjectIdentifier, PAGE_HEADER_SIZE, PAGE_TAG_SIZE,
        PageNumber, XOR32_SEED, error::EsedbError,
    },
    utils::{
        bytes::{read_u16_le, read_u32_le, read_u64_le},
        hash::{calculate_xor32, extended_page_seed},
    },
};

bitflags! {
    /// Page flags stored at offset 36 of the page header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    pub struct PageFlags: u32 {
        const ROOT = 0x0001;
        const LEAF = 0x0002;
        const PARENT = 0x0004;
        const EMPTY = 0x0008;
        const SPACE_TREE = 0x0020;
        const INDEX = 0x0040;
        const LONG_VALUE = 0x0080;
        const NEW_RECORD_FORMAT = 0x0800;
        const NEW_CHECKSUM_FORMAT = 0x2000;
        const SCRUBBED = 0x4000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageKind {
    Root,
    Branch,
    Leaf,
    SpaceTree,
    Index,
    LongValue,
    Empty,
    Unknown,
}

impl PageFlags {
    pub fn kind(&self) -> PageKind {
        if self.contains(PageFlags::EMPTY) {
            PageKind::Empty
        } else if self.contains(PageFlags::SPACE_TREE) {
            PageKind::SpaceTree
        } else if self.contains(PageFlags::LONG_VALUE) {
            PageKind::LongValue
        } else if self.contains(PageFlags::INDEX) {
            PageKind::Index
        } else if self.contains(PageFlags::LEAF) {
            PageKind::Leaf
        } else if self.contains(PageFlags::PARENT) {
            PageKind::Branch
        } else if self.contains(PageFlags::ROOT) {
            PageKind::Root
        } else {
            PageKind::Unknown
        }
    }
}

/// Page layout generation, selected by format revision and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageFormat {
    /// Checksum covers `[4, page_size)`, page number stored at offset 4.
    Legacy,
    /// Checksum covers `[8, page_size)`, ECC checksum at offset 4.
    Extended,
    /// Extended checksum layout with the 80-byte header of large pages.
    ExtendedLarge,
}

impl PageFormat {
    pub fn select(format_revision: u32, page_size: u32) -> Self {
        if format_revision < FORMAT_REVISION_EXTENDED_PAGE_HEADER {
            PageFormat::Legacy
        } else if format_revision >= FORMAT_REVISION_NEW_RECORD_FORMAT && page_size >= 16384 {
            PageFormat::ExtendedLarge
        } else {
            PageFormat::Extended
        }
    }

    pub fn header_size(&self) -> usize {
        match self {
            PageFormat::ExtendedLarge => EXTENDED_PAGE_HEADER_SIZE,
            _ => PAGE_HEADER_SIZE,
        }
    }

    /// Offset where the XOR-32 checksummed region begins.
    pub fn checksum_start(&self) -> usize {
        match self {
            PageFormat::Legacy => 4,
            _ => 8,
        }
    }

    pub fn checksum_seed(&self, page_number: PageNumber) -> u32 {
        match self {
            PageFormat::Legacy => XOR32_SEED,
            _ => extended_page_seed(page_number),
        }
    }
}

/*
 * Page Header Layout (40 bytes, little-endian)
 * ┌─────────────────────────────────────────────────────────────────┐
 * │ xor_checksum(4) | page_number or ecc_checksum(4)                │
 * │ database_modification_time(8)                                   │
 * │ previous_page(4) | next_page(4) | father_data_page_obj_id(4)    │
 * │ available_data_size(2) | available_uncommitted_data_size(2)     │
 * │ first_available_data_offset(2) | first_available_page_tag(2)    │
 * │ page_flags(4)                                                   │
 * ├─────────────────────────────────────────────────────────────────┤
 * │ extended (large pages only): checksums(3×8) | page_number(8) |  │
 * │ reserved(8)                                                     │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                       VALUE DATA                                │
 * ├─────────────────────────────────────────────────────────────────┤
 * │  ... [tag 2] [tag 1] [tag 0]   each: size(2) | offset(2)        │
 * └─────────────────────────────────────────────────────────────────┘
 */

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedPageHeader {
    pub checksums: [u64; 3],
    pub page_number: u64,
    pub reserved: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageHeader {
    pub xor_checksum: u32,
    /// Only present in the legacy layout.
    pub stored_page_number: Option<PageNumber>,
    /// Only present in the extended layouts; not verified.
    pub ecc_checksum: Option<u32>,
    pub database_modification_time: u64,
    pub previous_page: PageNumber,
    pub next_page: PageNumber,
    pub father_data_page_object_identifier: ObjectIdentifier,
    pub available_data_size: u16,
    pub available_uncommitted_data_size: u16,
    pub first_available_data_offset: u16,
    pub first_available_page_tag: u16,
    pub flags: PageFlags,
    pub extended: Option<ExtendedPageHeader>,
}

impl PageHeader {
    pub fn from_bytes(bytes: &[u8], format: PageFormat) -> Result<Self, EsedbError> {
        let word_at_4 = read_u32_le(bytes, 4)?;
        let (stored_page_number, ecc_checksum) = match format {
            PageFormat::Legacy => (Some(word_at_4), None),
            _ => (None, Some(word_at_4)),
        };

        let extended = match format {
            PageFormat::ExtendedLarge => Some(ExtendedPageHeader {
                checksums: [
                    read_u64_le(bytes, 40)?,
                    read_u64_le(bytes, 48)?,
                    read_u64_le(bytes, 56)?,
                ],
                page_number: read_u64_le(bytes, 64)?,
                reserved: read_u64_le(bytes, 72)?,
            }),
            _ => None,
        };

        Ok(Self {
            xor_checksum: read_u32_le(bytes, 0)?,
            stored_page_number,
            ecc_checksum,
            database_modification_time: read_u64_le(bytes, 8)?,
            previous_page: read_u32_le(bytes, 16)?,
            next_page: read_u32_le(bytes, 20)?,
            father_data_page_object_identifier: read_u32_le(bytes, 24)?,
            available_data_size: read_u16_le(bytes, 28)?,
            available_uncommitted_data_size: read_u16_le(bytes, 30)?,
            first_available_data_offset: read_u16_le(bytes, 32)?,
            first_available_page_tag: read_u16_le(bytes, 34)?,
            flags: PageFlags::from_bits_retain(read_u32_le(bytes, 36)?),
            extended,
        })
    }
}

/// A record pointer decoded from a page tag. `offset` is absolute within the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageValue {
    pub offset: u16,
    pub size: u16,
    pub flags: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChecksum {
    pub stored: u32,
    pub calculated: u32,
}

impl PageChecksum {
    pub fn is_valid(&self) -> bool {
        self.stored == self.calculated
    }
}

pub struct Page {
    pub page_number: PageNumber,
    pub format: PageFormat,
    pub header: PageHeader,
    pub values: Vec<PageValue>,
    pub data: Vec<u8>,
}

impl Page {
    pub fn kind(&self) -> PageKind {
        self.header.flags.kind()
    }

    pub fn is_root(&self) -> bool {
        self.header.flags.contains(PageFlags::ROOT)
    }

    pub fn is_leaf(&self) -> bool {
        self.header.flags.contains(PageFlags::LEAF)
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn get_value(&self, index: usize) -> Option<&[u8]> {
        self.values.get(index).map(|value| {
            let start = value.offset as usize;
            &self.data[start..start + value.size as usize]
        })
    }
}

/// Decodes pages of one file, whose geometry is fixed by its header.
#[derive(Debug, Clone, Copy)]
pub struct PageDecoder {
    page_size: u32,
    format: PageFormat,
}

impl PageDecoder {
    pub fn new(page_size: u32, format_revision: u32) -> Self {
        Self {
            page_size,
            format: PageFormat::select(format_revision, page_size),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn format(&self) -> PageFormat {
        self.format
    }

    pub fn is_empty_page(bytes: &[u8]) -> bool {
        bytes.iter().all(|&b| b == 0)
    }

    pub fn verify_checksum(
        &self,
        page_number: PageNumber,
        bytes: &[u8],
    ) -> Result<PageChecksum, EsedbError> {
        self.check_length(page_number, bytes)?;
        let stored = read_u32_le(bytes, 0)?;
        let calculated = calculate_xor32(
            self.format.checksum_seed(page_number),
            &bytes[self.format.checksum_start()..],
        );
        Ok(PageChecksum { stored, calculated })
    }

    /// Structural decode of the page header and tag array. The checksum is
    /// not checked here, see [`PageDecoder::verify_checksum`].
    pub fn decode(&self, page_number: PageNumber, bytes: &[u8]) -> Result<Page, EsedbError> {
        self.check_length(page_number, bytes)?;
        let header = PageHeader::from_bytes(bytes, self.format)?;
        let values = self.decode_values(page_number, bytes, header.first_available_page_tag)?;

        Ok(Page {
            page_number,
            format: self.format,
            header,
            values,
            data: bytes.to_vec(),
        })
    }

    fn check_length(&self, page_number: PageNumber, bytes: &[u8]) -> Result<(), EsedbError> {
        if bytes.len() != self.page_size as usize {
            return Err(EsedbError::CorruptedPage {
                page_number,
                reason: format!(
                    "expected {} bytes, got {} bytes",
                    self.page_size,
                    bytes.len()
                ),
            });
        }
        Ok(())
    }

    fn decode_values(
        &self,
        page_number: PageNumber,
        bytes: &[u8],
        tag_count: u16,
    ) -> Result<Vec<PageValue>, EsedbError> {
        let page_size = self.page_size as usize;
        let header_size = self.format.header_size();
        let tags_size = tag_count as usize * PAGE_TAG_SIZE;

        if header_size + tags_size > page_size {
            return Err(EsedbError::CorruptedPage {
                page_number,
                reason: format!("{} page tags do not fit in page", tag_count),
            });
        }
        let tags_start = page_size - tags_size;
        let small_page = page_size <= 8192;
        let mask: u16 = if small_page { 0x1fff } else { 0x7fff };

        let mut values = Vec::with_capacity(tag_count as usize);
        for index in 0..tag_count as usize {
            let tag_offset = page_size - PAGE_TAG_SIZE * (index + 1);
            let raw_size = read_u16_le(bytes, tag_offset)?;
            let raw_offset = read_u16_le(bytes, tag_offset + 2)?;

            let size = (raw_size & mask) as usize;
            let offset = header_size + (raw_offset & mask) as usize;

            if offset + size > tags_start {
                return Err(EsedbError::PageValueOutOfBounds {
                    page_number,
                    index,
                    offset,
                    size,
                    limit: tags_start,
                });
            }

            // Large pages keep the value flags in the value's first word.
            let flags = if small_page {
                (raw_offset >> 13) as u8
            } else if size >= 2 {
                (read_u16_le(bytes, offset)? >> 13) as u8
            } else {
                0
            };

            values.push(PageValue {
                offset: offset as u16,
                size: size as u16,
                flags,
            });
        }

        Ok(values)
    }
}

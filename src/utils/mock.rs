//! Synthetic ESE images for tests and benchmarks.

use std::{
    io::Write,
    path::Path,
};

use tempfile::NamedTempFile;

use crate::{
    storage::{header::FileHeader, page_table::page_offset},
    types::{
        FILE_HEADER_SIZE, PAGE_TAG_SIZE, PageNumber,
        page::{PageFlags, PageFormat},
    },
    utils::hash::calculate_xor32,
};

pub struct PageBuilder {
    pub page_number: PageNumber,
    pub page_size: u32,
    pub format_revision: u32,
    pub flags: PageFlags,
    pub previous_page: PageNumber,
    pub next_page: PageNumber,
    pub father_data_page_object_identifier: u32,
    pub values: Vec<Vec<u8>>,
}

impl PageBuilder {
    pub fn new(page_number: PageNumber, page_size: u32, format_revision: u32) -> Self {
        Self {
            page_number,
            page_size,
            format_revision,
            flags: PageFlags::LEAF,
            previous_page: 0,
            next_page: 0,
            father_data_page_object_identifier: 1,
            values: Vec::new(),
        }
    }

    pub fn flags(mut self, flags: PageFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn siblings(mut self, previous_page: PageNumber, next_page: PageNumber) -> Self {
        self.previous_page = previous_page;
        self.next_page = next_page;
        self
    }

    pub fn value(mut self, data: &[u8]) -> Self {
        self.values.push(data.to_vec());
        self
    }

    /// Lays out the header, values after the header and tags from the page
    /// end backwards, then stamps the checksum.
    pub fn build(&self) -> Vec<u8> {
        let page_size = self.page_size as usize;
        let format = PageFormat::select(self.format_revision, self.page_size);
        let header_size = format.header_size();
        let mut page = vec![0u8; page_size];

        if format == PageFormat::Legacy {
            page[4..8].copy_from_slice(&self.page_number.to_le_bytes());
        }
        page[16..20].copy_from_slice(&self.previous_page.to_le_bytes());
        page[20..24].copy_from_slice(&self.next_page.to_le_bytes());
        page[24..28].copy_from_slice(&self.father_data_page_object_identifier.to_le_bytes());
        page[34..36].copy_from_slice(&(self.values.len() as u16).to_le_bytes());
        page[36..40].copy_from_slice(&self.flags.bits().to_le_bytes());
        if format == PageFormat::ExtendedLarge {
            page[64..72].copy_from_slice(&(self.page_number as u64 + 1).to_le_bytes());
        }

        let mut data_offset = 0usize;
        for (index, value) in self.values.iter().enumerate() {
            let start = header_size + data_offset;
            page[start..start + value.len()].copy_from_slice(value);

            let tag_offset = page_size - PAGE_TAG_SIZE * (index + 1);
            page[tag_offset..tag_offset + 2].copy_from_slice(&(value.len() as u16).to_le_bytes());
            page[tag_offset + 2..tag_offset + 4]
                .copy_from_slice(&(data_offset as u16).to_le_bytes());
            data_offset += value.len();
        }
        let free_space = page_size - header_size - data_offset - PAGE_TAG_SIZE * self.values.len();
        page[28..30].copy_from_slice(&(free_space as u16).to_le_bytes());
        page[32..34].copy_from_slice(&(data_offset as u16).to_le_bytes());

        let checksum = calculate_xor32(
            format.checksum_seed(self.page_number),
            &page[format.checksum_start()..],
        );
        page[0..4].copy_from_slice(&checksum.to_le_bytes());
        page
    }
}

pub struct EseImageBuilder {
    pub header: FileHeader,
    pub shadow_header: Option<FileHeader>,
    pub pages: Vec<Vec<u8>>,
}

impl EseImageBuilder {
    pub fn new(page_size: u32, format_revision: u32) -> Self {
        let header = FileHeader {
            page_size,
            format_revision,
            creation_format_revision: format_revision,
            ..FileHeader::default()
        };
        Self {
            shadow_header: Some(header.clone()),
            header,
            pages: Vec::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.header.page_size
    }

    /// Appends `count` leaf pages, each holding two small values.
    pub fn with_leaf_pages(mut self, count: u32) -> Self {
        for _ in 0..count {
            let page_number = self.pages.len() as PageNumber;
            let page = PageBuilder::new(page_number, self.page_size(), self.header.format_revision)
                .siblings(page_number.saturating_sub(1), page_number + 1)
                .value(format!("key_{:06}", page_number).as_bytes())
                .value(format!("record_{:06}", page_number).as_bytes())
                .build();
            self.pages.push(page);
        }
        self
    }

    pub fn with_page(mut self, page: Vec<u8>) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_empty_page(mut self) -> Self {
        self.pages.push(vec![0u8; self.page_size() as usize]);
        self
    }

    pub fn without_shadow_header(mut self) -> Self {
        self.shadow_header = None;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let page_size = self.page_size() as usize;
        let region_start = page_offset(0, self.page_size()) as usize;
        let mut image = vec![0u8; region_start.max(FILE_HEADER_SIZE)];

        image[..FILE_HEADER_SIZE].copy_from_slice(&self.header.to_bytes());
        if let Some(shadow) = &self.shadow_header {
            if page_size >= FILE_HEADER_SIZE {
                image[page_size..page_size + FILE_HEADER_SIZE].copy_from_slice(&shadow.to_bytes());
            }
        }
        image.truncate(region_start);

        for page in &self.pages {
            image.extend_from_slice(page);
        }
        image
    }
}

/// Flips one byte in the body of `page_number`, past the page header.
pub fn corrupt_page(image: &mut [u8], page_number: PageNumber, page_size: u32) {
    let offset = page_offset(page_number, page_size) as usize + page_size as usize / 2;
    image[offset] ^= 0xff;
}

/// An image written to a temporary file, removed on drop.
pub struct TempEseFile {
    file: NamedTempFile,
}

impl TempEseFile {
    pub fn new(image: &[u8]) -> std::io::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(image)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

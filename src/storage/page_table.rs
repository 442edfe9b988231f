use serde::Serialize;

use crate::types::{
    HEADER_SLOT_COUNT, ObjectIdentifier, PageNumber,
    error::EsedbError,
    page::{Page, PageFlags, PageKind},
};

/// File offset of a zero-based data page. The two header slots come first.
pub fn page_offset(page_number: PageNumber, page_size: u32) -> u64 {
    (HEADER_SLOT_COUNT + page_number as u64) * page_size as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageStatus {
    Valid,
    Corrupt,
    /// Fewer than `page_size` bytes remained in the file.
    Truncated,
    /// All bytes zero; the page was never initialised.
    Empty,
}

/// Header fields of a page that decoded successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub kind: PageKind,
    pub flags: PageFlags,
    pub previous_page: PageNumber,
    pub next_page: PageNumber,
    pub father_data_page_object_identifier: ObjectIdentifier,
    pub number_of_values: u16,
}

impl From<&Page> for PageMetadata {
    fn from(page: &Page) -> Self {
        Self {
            kind: page.kind(),
            flags: page.header.flags,
            previous_page: page.header.previous_page,
            next_page: page.header.next_page,
            father_data_page_object_identifier: page.header.father_data_page_object_identifier,
            number_of_values: page.header.first_available_page_tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    pub page_number: PageNumber,
    pub file_offset: u64,
    pub size: u32,
    pub status: PageStatus,
    pub metadata: Option<PageMetadata>,
}

impl PageEntry {
    pub fn is_valid(&self) -> bool {
        self.status == PageStatus::Valid
    }
}

/// Pages in discovery order. Page numbers are dense from zero, so the entry
/// for page `n` lives at index `n`.
#[derive(Debug, Default)]
pub struct PageTable {
    entries: Vec<PageEntry>,
}

impl PageTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: PageEntry) -> Result<(), EsedbError> {
        let expected = self.entries.len();
        if entry.page_number as usize != expected {
            return Err(EsedbError::Argument {
                details: format!(
                    "page {} appended out of order, expected page {}",
                    entry.page_number, expected
                ),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, page_number: PageNumber) -> Option<&PageEntry> {
        self.entries.get(page_number as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageEntry> {
        self.entries.iter()
    }

    pub fn count_by_status(&self, status: PageStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn corrupt_pages(&self) -> Vec<PageNumber> {
        self.entries
            .iter()
            .filter(|e| e.status == PageStatus::Corrupt)
            .map(|e| e.page_number)
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

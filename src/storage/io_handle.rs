use std::io::SeekFrom;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    storage::{header::FileHeader, io_provider::BlockIoProvider, page_table::page_offset},
    types::{FILE_HEADER_SIZE, PageNumber, error::EsedbError},
};

/// Who is responsible for releasing the bound provider.
pub enum ProviderBinding<'a> {
    /// Created by the library for a path-based open; closed and dropped here.
    Owned(Box<dyn BlockIoProvider + 'a>),
    /// Supplied by the caller; never closed or freed here.
    Borrowed(&'a mut (dyn BlockIoProvider + 'a)),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Borrowed,
}

impl ProviderBinding<'_> {
    pub fn ownership(&self) -> Ownership {
        match self {
            ProviderBinding::Owned(_) => Ownership::Owned,
            ProviderBinding::Borrowed(_) => Ownership::Borrowed,
        }
    }
}

/// Result of checking the second header copy against the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShadowHeaderStatus {
    Consistent,
    /// Valid on its own but disagrees with the primary on geometry.
    Divergent,
    /// Fails signature or checksum validation.
    Corrupt,
    /// The file ends before the shadow slot, or the page size leaves no slot.
    Missing,
}

pub struct IoHandle<'a> {
    binding: Option<ProviderBinding<'a>>,
    pub format_version: u32,
    pub format_revision: u32,
    pub page_size: u32,
    header: Option<FileHeader>,
}

impl Default for IoHandle<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IoHandle<'a> {
    pub fn new() -> Self {
        Self {
            binding: None,
            format_version: 0,
            format_revision: 0,
            page_size: 0,
            header: None,
        }
    }

    /// Binds a provider and opens it read-only. A handle binds at most once.
    pub fn open(&mut self, mut binding: ProviderBinding<'a>) -> Result<(), EsedbError> {
        if self.binding.is_some() {
            return Err(EsedbError::AlreadyBound);
        }
        let provider: &mut (dyn BlockIoProvider + 'a) = match &mut binding {
            ProviderBinding::Owned(provider) => provider.as_mut(),
            ProviderBinding::Borrowed(provider) => &mut **provider,
        };
        provider.open(true).map_err(EsedbError::ProviderOpenFailed)?;
        debug!("io handle bound to {:?} provider", binding.ownership());
        self.binding = Some(binding);
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn ownership(&self) -> Option<Ownership> {
        self.binding.as_ref().map(ProviderBinding::ownership)
    }

    pub fn header(&self) -> Option<&FileHeader> {
        self.header.as_ref()
    }

    fn provider_mut(&mut self) -> Result<&mut (dyn BlockIoProvider + 'a), EsedbError> {
        match self.binding.as_mut() {
            Some(ProviderBinding::Owned(provider)) => Ok(provider.as_mut()),
            Some(ProviderBinding::Borrowed(provider)) => Ok(&mut **provider),
            None => Err(EsedbError::NotOpen),
        }
    }

    pub fn file_size(&mut self) -> Result<u64, EsedbError> {
        Ok(self.provider_mut()?.size()?)
    }

    /// Reads up to `length` bytes at `offset`; the result is shorter only at end of file.
    pub fn read_at(&mut self, offset: u64, length: usize) -> Result<Vec<u8>, EsedbError> {
        let provider = self.provider_mut()?;
        provider.seek(SeekFrom::Start(offset))?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(length)
            .map_err(|_| EsedbError::Memory {
                what: format!("{} byte read buffer", length),
            })?;
        buffer.resize(length, 0);
        let count = provider.read_fully(&mut buffer)?;
        buffer.truncate(count);
        Ok(buffer)
    }

    /// Reads and validates the primary header, returning the page size.
    pub fn read_file_header(&mut self) -> Result<u32, EsedbError> {
        debug!("reading file header at offset: 0");
        let data = self.read_at(0, FILE_HEADER_SIZE)?;
        if data.len() != FILE_HEADER_SIZE {
            return Err(EsedbError::ShortRead {
                offset: 0,
                expected: FILE_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let header = FileHeader::from_bytes(&data, 0)?;
        let page_size = header.validate_page_size()?;

        debug!(
            "file header: format version 0x{:x}, revision 0x{:x}, page size {}",
            header.format_version, header.format_revision, page_size
        );
        self.format_version = header.format_version;
        self.format_revision = header.format_revision;
        self.page_size = page_size;
        self.header = Some(header);
        Ok(page_size)
    }

    /// Validates the shadow header copy at offset `page_size`. Diagnostic
    /// only: the primary header stays authoritative.
    pub fn read_shadow_file_header(
        &mut self,
        page_size: u32,
    ) -> Result<ShadowHeaderStatus, EsedbError> {
        // Small-page files have no room for a second copy before the page region.
        if (page_size as usize) < FILE_HEADER_SIZE {
            return Ok(ShadowHeaderStatus::Missing);
        }
        let offset = page_size as u64;
        let data = self.read_at(offset, FILE_HEADER_SIZE)?;
        if data.len() != FILE_HEADER_SIZE {
            return Ok(ShadowHeaderStatus::Missing);
        }

        let shadow = match FileHeader::from_bytes(&data, offset) {
            Ok(shadow) => shadow,
            Err(e) => {
                warn!("shadow file header rejected: {}", e);
                return Ok(ShadowHeaderStatus::Corrupt);
            }
        };

        match &self.header {
            Some(primary) if !primary.matches_geometry(&shadow) => {
                warn!(
                    "shadow file header diverges from primary: version 0x{:x}/0x{:x}, revision 0x{:x}/0x{:x}, page size {}/{}",
                    primary.format_version,
                    shadow.format_version,
                    primary.format_revision,
                    shadow.format_revision,
                    primary.page_size,
                    shadow.page_size
                );
                Ok(ShadowHeaderStatus::Divergent)
            }
            _ => Ok(ShadowHeaderStatus::Consistent),
        }
    }

    pub fn read_page(
        &mut self,
        page_number: PageNumber,
        page_size: u32,
    ) -> Result<Vec<u8>, EsedbError> {
        self.read_at(page_offset(page_number, page_size), page_size as usize)
    }

    /// Releases the binding. Returns `Ok(false)` when nothing was bound.
    /// Owned providers are closed; borrowed ones are left as the caller
    /// handed them in.
    pub fn close(&mut self) -> Result<bool, EsedbError> {
        let Some(binding) = self.binding.take() else {
            return Ok(false);
        };
        self.header = None;
        match binding {
            ProviderBinding::Owned(mut provider) => {
                provider.close().map_err(EsedbError::ProviderCloseFailed)?;
                debug!("closed owned provider");
            }
            ProviderBinding::Borrowed(_) => {
                debug!("released borrowed provider");
            }
        }
        Ok(true)
    }
}

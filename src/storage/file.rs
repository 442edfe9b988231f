use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use log::{debug, info, warn};

use crate::{
    config::FileConfig,
    storage::{
        header::FileHeader,
        io_handle::{IoHandle, Ownership, ProviderBinding, ShadowHeaderStatus},
        io_provider::{BlockIoProvider, FileIoProvider},
        page_table::{PageEntry, PageMetadata, PageStatus, PageTable, page_offset},
    },
    types::{
        PageNumber,
        codepage::AsciiCodepage,
        error::EsedbError,
        flags::AccessFlags,
        page::{Page, PageDecoder},
    },
};

/// Cross-thread handle for cancelling page discovery.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn signal(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_signalled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Complete,
    /// Discovery stopped on an abort signal; pages found so far are kept.
    PartiallyAborted { pages_discovered: usize },
}

/// A read-only ESE database file: one I/O handle plus the page table
/// discovered from it.
pub struct FileHandle<'a> {
    io_handle: IoHandle<'a>,
    page_table: PageTable,
    ascii_codepage: AsciiCodepage,
    abort: Arc<AtomicBool>,
    config: FileConfig,
    shadow_header_status: Option<ShadowHeaderStatus>,
    is_open: bool,
}

impl Default for FileHandle<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> FileHandle<'a> {
    pub fn new() -> Self {
        Self::with_config(FileConfig::default())
    }

    pub fn with_config(config: FileConfig) -> Self {
        Self {
            io_handle: IoHandle::new(),
            page_table: PageTable::new(),
            ascii_codepage: config.ascii_codepage,
            abort: Arc::new(AtomicBool::new(false)),
            config,
            shadow_header_status: None,
            is_open: false,
        }
    }

    /// Opens the file at `path`. The created provider is owned by this
    /// handle and closed with it.
    pub fn open<P: AsRef<Path>>(
        &mut self,
        path: P,
        flags: AccessFlags,
    ) -> Result<OpenOutcome, EsedbError> {
        flags.validate_read_only()?;
        let path = path.as_ref();
        debug!("opening ESE database at path: {}", path.display());
        let provider = FileIoProvider::new(path);
        self.open_binding(ProviderBinding::Owned(Box::new(provider)))
    }

    /// Opens over a caller-supplied provider. The caller keeps ownership;
    /// the provider is never closed by this handle.
    pub fn open_with_provider(
        &mut self,
        provider: &'a mut (dyn BlockIoProvider + 'a),
        flags: AccessFlags,
    ) -> Result<OpenOutcome, EsedbError> {
        flags.validate_read_only()?;
        self.open_binding(ProviderBinding::Borrowed(provider))
    }

    fn open_binding(&mut self, binding: ProviderBinding<'a>) -> Result<OpenOutcome, EsedbError> {
        if self.is_open {
            return Err(EsedbError::AlreadyOpen);
        }
        self.io_handle.open(binding)?;

        match self.open_read() {
            Ok(outcome) => {
                self.is_open = true;
                Ok(outcome)
            }
            Err(e) => {
                warn!("open failed: {}", e);
                self.page_table.clear();
                self.shadow_header_status = None;
                if let Err(close_error) = self.io_handle.close() {
                    warn!("unable to release provider after failed open: {}", close_error);
                }
                Err(e)
            }
        }
    }

    fn open_read(&mut self) -> Result<OpenOutcome, EsedbError> {
        let page_size = self.io_handle.read_file_header()?;

        if self.config.check_shadow_header {
            let status = self.io_handle.read_shadow_file_header(page_size)?;
            debug!("shadow file header: {:?}", status);
            self.shadow_header_status = Some(status);
        }

        let outcome = self.discover_pages(page_size)?;
        info!(
            "opened ESE database: page size {}, {} pages ({} valid, {} corrupt, {} empty, {} truncated)",
            page_size,
            self.page_table.len(),
            self.page_table.count_by_status(PageStatus::Valid),
            self.page_table.count_by_status(PageStatus::Corrupt),
            self.page_table.count_by_status(PageStatus::Empty),
            self.page_table.count_by_status(PageStatus::Truncated),
        );
        Ok(outcome)
    }

    /// Walks every page after the two header slots, recording one entry per
    /// page. Per-page damage is recorded as a status, never raised.
    fn discover_pages(&mut self, page_size: u32) -> Result<OpenOutcome, EsedbError> {
        let file_size = self.io_handle.file_size()?;
        let decoder = PageDecoder::new(page_size, self.io_handle.format_revision);
        debug!(
            "discovering pages: file size {}, page format {:?}",
            file_size,
            decoder.format()
        );

        let mut page_number: PageNumber = 0;
        while page_offset(page_number, page_size) < file_size {
            if self.abort.load(Ordering::Acquire) {
                warn!(
                    "page discovery aborted after {} pages",
                    self.page_table.len()
                );
                return Ok(OpenOutcome::PartiallyAborted {
                    pages_discovered: self.page_table.len(),
                });
            }

            let bytes = self.io_handle.read_page(page_number, page_size)?;
            let entry = self.classify_page(&decoder, page_number, &bytes);
            self.page_table.push(entry)?;

            page_number = match page_number.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(OpenOutcome::Complete)
    }

    fn classify_page(&self, decoder: &PageDecoder, page_number: PageNumber, bytes: &[u8]) -> PageEntry {
        let page_size = decoder.page_size();
        let mut entry = PageEntry {
            page_number,
            file_offset: page_offset(page_number, page_size),
            size: bytes.len() as u32,
            status: PageStatus::Valid,
            metadata: None,
        };

        if bytes.len() < page_size as usize {
            warn!(
                "page {} truncated: {} of {} bytes available",
                page_number,
                bytes.len(),
                page_size
            );
            entry.status = PageStatus::Truncated;
            return entry;
        }
        if PageDecoder::is_empty_page(bytes) {
            entry.status = PageStatus::Empty;
            return entry;
        }

        if self.config.verify_page_checksums {
            match decoder.verify_checksum(page_number, bytes) {
                Ok(checksum) if checksum.is_valid() => {}
                Ok(checksum) => {
                    warn!(
                        "page {} at offset {}: checksum mismatch (stored 0x{:08x}, calculated 0x{:08x})",
                        page_number, entry.file_offset, checksum.stored, checksum.calculated
                    );
                    entry.status = PageStatus::Corrupt;
                }
                Err(e) => {
                    warn!("page {}: {}", page_number, e);
                    entry.status = PageStatus::Corrupt;
                }
            }
        }

        match decoder.decode(page_number, bytes) {
            Ok(page) => entry.metadata = Some(PageMetadata::from(&page)),
            Err(e) => {
                warn!("page {}: {}", page_number, e);
                entry.status = PageStatus::Corrupt;
            }
        }

        entry
    }

    /// Decodes one discovered page on demand. Pages recorded as Corrupt or
    /// Truncated are refused.
    pub fn read_page(&mut self, page_number: PageNumber) -> Result<Page, EsedbError> {
        if !self.is_open {
            return Err(EsedbError::NotOpen);
        }
        let entry = self
            .page_table
            .get(page_number)
            .ok_or(EsedbError::PageOutOfRange {
                page_number,
                page_count: self.page_table.len(),
            })?;
        match entry.status {
            PageStatus::Corrupt => {
                return Err(EsedbError::CorruptedPage {
                    page_number,
                    reason: "page failed validation during discovery".to_string(),
                });
            }
            PageStatus::Truncated => {
                return Err(EsedbError::CorruptedPage {
                    page_number,
                    reason: format!("page truncated to {} bytes", entry.size),
                });
            }
            PageStatus::Valid | PageStatus::Empty => {}
        }

        let page_size = self.io_handle.page_size;
        let bytes = self.io_handle.read_page(page_number, page_size)?;
        PageDecoder::new(page_size, self.io_handle.format_revision).decode(page_number, &bytes)
    }

    /// Closes the file. Returns `Ok(false)` if it was not open.
    pub fn close(&mut self) -> Result<bool, EsedbError> {
        let result = self.io_handle.close();
        if self.is_open {
            debug!("closing ESE database ({} pages)", self.page_table.len());
        }
        self.page_table.clear();
        self.shadow_header_status = None;
        self.abort.store(false, Ordering::Release);
        self.is_open = false;
        result
    }

    pub fn signal_abort(&self) {
        self.abort.store(true, Ordering::Release);
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            flag: Arc::clone(&self.abort),
        }
    }

    pub fn ascii_codepage(&self) -> AsciiCodepage {
        self.ascii_codepage
    }

    pub fn set_ascii_codepage(&mut self, codepage: u32) -> Result<(), EsedbError> {
        self.ascii_codepage = AsciiCodepage::from_u32(codepage)?;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    pub fn file_header(&self) -> Option<&FileHeader> {
        self.io_handle.header()
    }

    pub fn format_version(&self) -> Option<u32> {
        self.file_header().map(|h| h.format_version)
    }

    pub fn format_revision(&self) -> Option<u32> {
        self.file_header().map(|h| h.format_revision)
    }

    pub fn page_size(&self) -> Option<u32> {
        self.file_header().map(|h| h.page_size)
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn shadow_header_status(&self) -> Option<ShadowHeaderStatus> {
        self.shadow_header_status
    }

    pub fn provider_ownership(&self) -> Option<Ownership> {
        self.io_handle.ownership()
    }
}

impl Drop for FileHandle<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.io_handle.close() {
            warn!("unable to close io handle on drop: {}", e);
        }
    }
}

//! Read-only decoding of Extensible Storage Engine (ESE) database files.
//!
//! [`FileHandle`] validates the file header, then walks the page region and
//! records every page in a [`PageTable`], tagging damaged pages instead of
//! failing the whole open.

pub mod config;
pub mod storage;
pub mod types;
pub mod utils;

pub use config::{FileConfig, FileConfigBuilder};
pub use storage::{
    file::{AbortHandle, FileHandle, OpenOutcome},
    header::FileHeader,
    io_handle::{IoHandle, Ownership, ProviderBinding, ShadowHeaderStatus},
    io_provider::{BlockIoProvider, FileIoProvider, MemoryIoProvider},
    page_table::{PageEntry, PageMetadata, PageStatus, PageTable},
};
pub use types::{
    codepage::AsciiCodepage,
    error::{EsedbError, Result},
    flags::AccessFlags,
    page::{Page, PageDecoder, PageFlags, PageKind},
};
pub use utils::hash::calculate_xor32;

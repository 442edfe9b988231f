//! Open-time configuration for a [`FileHandle`](crate::storage::file::FileHandle).
//!
//! Defaults suit forensic use: every page checksum is verified and the
//! shadow header is diagnosed. `FileConfig::from_env()` reads:
//! - ESEDB_ASCII_CODEPAGE = 20127 | 1250 | 1251 | ... (default 1250)
//! - ESEDB_VERIFY_PAGE_CHECKSUMS = 0|1|true|false (default true)
//! - ESEDB_CHECK_SHADOW_HEADER = 0|1|true|false (default true)

use crate::types::{codepage::AsciiCodepage, error::EsedbError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileConfig {
    /// Codepage for non-Unicode text columns.
    pub ascii_codepage: AsciiCodepage,

    /// When false, pages are only decoded structurally and never tagged
    /// Corrupt for a checksum mismatch.
    pub verify_page_checksums: bool,

    /// Validate the shadow header copy during open.
    pub check_shadow_header: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            ascii_codepage: AsciiCodepage::default(),
            verify_page_checksums: true,
            check_shadow_header: true,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl FileConfig {
    pub fn builder() -> FileConfigBuilder {
        FileConfigBuilder::new()
    }

    /// Defaults overridden by environment variables. Unparseable booleans
    /// keep their default; an unsupported codepage is an error.
    pub fn from_env() -> Result<Self, EsedbError> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("ESEDB_ASCII_CODEPAGE") {
            let code = value
                .trim()
                .parse::<u32>()
                .map_err(|_| EsedbError::Argument {
                    details: format!("ESEDB_ASCII_CODEPAGE is not a number: {}", value),
                })?;
            config.ascii_codepage = AsciiCodepage::from_u32(code)?;
        }
        if let Some(v) = std::env::var("ESEDB_VERIFY_PAGE_CHECKSUMS")
            .ok()
            .and_then(|v| parse_bool(&v))
        {
            config.verify_page_checksums = v;
        }
        if let Some(v) = std::env::var("ESEDB_CHECK_SHADOW_HEADER")
            .ok()
            .and_then(|v| parse_bool(&v))
        {
            config.check_shadow_header = v;
        }

        Ok(config)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FileConfigBuilder {
    config: FileConfig,
}

impl FileConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FileConfig::default(),
        }
    }

    pub fn ascii_codepage(mut self, codepage: AsciiCodepage) -> Self {
        self.config.ascii_codepage = codepage;
        self
    }

    pub fn verify_page_checksums(mut self, verify: bool) -> Self {
        self.config.verify_page_checksums = verify;
        self
    }

    pub fn check_shadow_header(mut self, check: bool) -> Self {
        self.config.check_shadow_header = check;
        self
    }

    pub fn build(self) -> FileConfig {
        self.config
    }
}

use serde::Serialize;

use crate::{
    types::{
        FILE_HEADER_SIZE, FILE_SIGNATURE, ObjectIdentifier, XOR32_SEED, error::EsedbError,
        is_supported_page_size, log_time::LogTime,
    },
    utils::{
        bytes::{read_array, read_u32_le, read_u64_le},
        hash::calculate_xor32,
    },
};

/*
 * File Header Layout (little-endian, first 4096 bytes)
 * ┌──────────────────────────────────────────────────────────────────┐
 * │ signature(4) | checksum(4) | format_version(4) | file_type(4)    │
 * │ database_time(8) | database_signature(28) | database_state(4)    │
 * │ consistent_position(8) | consistent_time(8) | attach_time(8)     │
 * │ attach_position(8) | detach_time(8) | detach_position(8)         │
 * │ log_signature(28) | reserved(4) | reserved(4)                    │
 * │ previous_full_backup(24) | previous_incremental_backup(24)       │
 * │ current_full_backup(24) | last_object_identifier(4)              │
 * │ index_update major/minor/build/service pack (4 × 4)              │
 * │ format_revision(4) | page_size(4) | reserved(100)                │
 * │ creation_format_version(4) | creation_format_revision(4)         │
 * │ reserved(320) | unused up to 4096                                │
 * └──────────────────────────────────────────────────────────────────┘
 */

pub const OFFSET_SIGNATURE: usize = 0;
pub const OFFSET_CHECKSUM: usize = 4;
pub const OFFSET_FORMAT_VERSION: usize = 8;
pub const OFFSET_FILE_TYPE: usize = 12;
pub const OFFSET_DATABASE_TIME: usize = 16;
pub const OFFSET_DATABASE_SIGNATURE: usize = 24;
pub const OFFSET_DATABASE_STATE: usize = 52;
pub const OFFSET_CONSISTENT_POSITION: usize = 56;
pub const OFFSET_CONSISTENT_TIME: usize = 64;
pub const OFFSET_ATTACH_TIME: usize = 72;
pub const OFFSET_ATTACH_POSITION: usize = 80;
pub const OFFSET_DETACH_TIME: usize = 88;
pub const OFFSET_DETACH_POSITION: usize = 96;
pub const OFFSET_LOG_SIGNATURE: usize = 104;
pub const OFFSET_PREVIOUS_FULL_BACKUP: usize = 140;
pub const OFFSET_PREVIOUS_INCREMENTAL_BACKUP: usize = 164;
pub const OFFSET_CURRENT_FULL_BACKUP: usize = 188;
pub const OFFSET_LAST_OBJECT_IDENTIFIER: usize = 212;
pub const OFFSET_INDEX_UPDATE_MAJOR_VERSION: usize = 216;
pub const OFFSET_INDEX_UPDATE_MINOR_VERSION: usize = 220;
pub const OFFSET_INDEX_UPDATE_BUILD_NUMBER: usize = 224;
pub const OFFSET_INDEX_UPDATE_SERVICE_PACK_NUMBER: usize = 228;
pub const OFFSET_FORMAT_REVISION: usize = 232;
pub const OFFSET_PAGE_SIZE: usize = 236;
pub const OFFSET_CREATION_FORMAT_VERSION: usize = 340;
pub const OFFSET_CREATION_FORMAT_REVISION: usize = 344;

pub const SIGNATURE_SIZE: usize = 28;
pub const BACKUP_INFORMATION_SIZE: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileType {
    Database,
    StreamingFile,
    Unknown(u32),
}

impl FileType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => FileType::Database,
            1 => FileType::StreamingFile,
            other => FileType::Unknown(other),
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            FileType::Database => 0,
            FileType::StreamingFile => 1,
            FileType::Unknown(value) => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatabaseState {
    JustCreated,
    DirtyShutdown,
    CleanShutdown,
    BeingConverted,
    ForceDetach,
    Unknown(u32),
}

impl DatabaseState {
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => DatabaseState::JustCreated,
            2 => DatabaseState::DirtyShutdown,
            3 => DatabaseState::CleanShutdown,
            4 => DatabaseState::BeingConverted,
            5 => DatabaseState::ForceDetach,
            other => DatabaseState::Unknown(other),
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            DatabaseState::JustCreated => 1,
            DatabaseState::DirtyShutdown => 2,
            DatabaseState::CleanShutdown => 3,
            DatabaseState::BeingConverted => 4,
            DatabaseState::ForceDetach => 5,
            DatabaseState::Unknown(value) => *value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    pub signature: [u8; 4],
    pub checksum: u32,
    pub format_version: u32,
    pub file_type: FileType,
    pub database_time: u64,
    #[serde(skip)]
    pub database_signature: [u8; SIGNATURE_SIZE],
    pub database_state: DatabaseState,
    pub consistent_position: u64,
    pub consistent_time: LogTime,
    pub attach_time: LogTime,
    pub attach_position: u64,
    pub detach_time: LogTime,
    pub detach_position: u64,
    #[serde(skip)]
    pub log_signature: [u8; SIGNATURE_SIZE],
    pub previous_full_backup: [u8; BACKUP_INFORMATION_SIZE],
    pub previous_incremental_backup: [u8; BACKUP_INFORMATION_SIZE],
    pub current_full_backup: [u8; BACKUP_INFORMATION_SIZE],
    pub last_object_identifier: ObjectIdentifier,
    pub index_update_major_version: u32,
    pub index_update_minor_version: u32,
    pub index_update_build_number: u32,
    pub index_update_service_pack_number: u32,
    pub format_revision: u32,
    pub page_size: u32,
    pub creation_format_version: u32,
    pub creation_format_revision: u32,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            signature: FILE_SIGNATURE,
            checksum: 0,
            format_version: 0x620,
            file_type: FileType::Database,
            database_time: 0,
            database_signature: [0; SIGNATURE_SIZE],
            database_state: DatabaseState::CleanShutdown,
            consistent_position: 0,
            consistent_time: LogTime::default(),
            attach_time: LogTime::default(),
            attach_position: 0,
            detach_time: LogTime::default(),
            detach_position: 0,
            log_signature: [0; SIGNATURE_SIZE],
            previous_full_backup: [0; BACKUP_INFORMATION_SIZE],
            previous_incremental_backup: [0; BACKUP_INFORMATION_SIZE],
            current_full_backup: [0; BACKUP_INFORMATION_SIZE],
            last_object_identifier: 0,
            index_update_major_version: 0,
            index_update_minor_version: 0,
            index_update_build_number: 0,
            index_update_service_pack_number: 0,
            format_revision: 0x0c,
            page_size: 8192,
            creation_format_version: 0x620,
            creation_format_revision: 0x0c,
        }
    }
}

impl FileHeader {
    /// Serialize the header into a 4096-byte block with a valid checksum.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; FILE_HEADER_SIZE];

        let mut put = |offset: usize, bytes: &[u8]| {
            buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
        };

        put(OFFSET_SIGNATURE, &self.signature);
        put(OFFSET_FORMAT_VERSION, &self.format_version.to_le_bytes());
        put(OFFSET_FILE_TYPE, &self.file_type.as_u32().to_le_bytes());
        put(OFFSET_DATABASE_TIME, &self.database_time.to_le_bytes());
        put(OFFSET_DATABASE_SIGNATURE, &self.database_signature);
        put(OFFSET_DATABASE_STATE, &self.database_state.as_u32().to_le_bytes());
        put(OFFSET_CONSISTENT_POSITION, &self.consistent_position.to_le_bytes());
        put(OFFSET_CONSISTENT_TIME, &self.consistent_time.raw);
        put(OFFSET_ATTACH_TIME, &self.attach_time.raw);
        put(OFFSET_ATTACH_POSITION, &self.attach_position.to_le_bytes());
        put(OFFSET_DETACH_TIME, &self.detach_time.raw);
        put(OFFSET_DETACH_POSITION, &self.detach_position.to_le_bytes());
        put(OFFSET_LOG_SIGNATURE, &self.log_signature);
        put(OFFSET_PREVIOUS_FULL_BACKUP, &self.previous_full_backup);
        put(OFFSET_PREVIOUS_INCREMENTAL_BACKUP, &self.previous_incremental_backup);
        put(OFFSET_CURRENT_FULL_BACKUP, &self.current_full_backup);
        put(OFFSET_LAST_OBJECT_IDENTIFIER, &self.last_object_identifier.to_le_bytes());
        put(OFFSET_INDEX_UPDATE_MAJOR_VERSION, &self.index_update_major_version.to_le_bytes());
        put(OFFSET_INDEX_UPDATE_MINOR_VERSION, &self.index_update_minor_version.to_le_bytes());
        put(OFFSET_INDEX_UPDATE_BUILD_NUMBER, &self.index_update_build_number.to_le_bytes());
        put(
            OFFSET_INDEX_UPDATE_SERVICE_PACK_NUMBER,
            &self.index_update_service_pack_number.to_le_bytes(),
        );
        put(OFFSET_FORMAT_REVISION, &self.format_revision.to_le_bytes());
        put(OFFSET_PAGE_SIZE, &self.page_size.to_le_bytes());
        put(OFFSET_CREATION_FORMAT_VERSION, &self.creation_format_version.to_le_bytes());
        put(OFFSET_CREATION_FORMAT_REVISION, &self.creation_format_revision.to_le_bytes());

        let checksum = calculate_xor32(XOR32_SEED, &buffer[OFFSET_FORMAT_VERSION..]);
        buffer[OFFSET_CHECKSUM..OFFSET_FORMAT_VERSION].copy_from_slice(&checksum.to_le_bytes());

        buffer
    }

    /// Decode and validate a header block. `offset` is the header's position
    /// in the file and is only used for error context.
    ///
    /// Signature and checksum are verified here; the page size is checked
    /// separately by [`FileHeader::validate_page_size`].
    pub fn from_bytes(bytes: &[u8], offset: u64) -> Result<Self, EsedbError> {
        if bytes.len() < FILE_HEADER_SIZE {
            return Err(EsedbError::ShortRead {
                offset,
                expected: FILE_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let bytes = &bytes[..FILE_HEADER_SIZE];

        let signature = read_array::<4>(bytes, OFFSET_SIGNATURE)?;
        if signature != FILE_SIGNATURE {
            return Err(EsedbError::SignatureMismatch { found: signature });
        }

        let checksum = read_u32_le(bytes, OFFSET_CHECKSUM)?;
        let calculated = calculate_xor32(XOR32_SEED, &bytes[OFFSET_FORMAT_VERSION..]);
        if checksum != calculated {
            return Err(EsedbError::ChecksumMismatch {
                offset,
                stored: checksum,
                calculated,
            });
        }

        Ok(Self {
            signature,
            checksum,
            format_version: read_u32_le(bytes, OFFSET_FORMAT_VERSION)?,
            file_type: FileType::from_u32(read_u32_le(bytes, OFFSET_FILE_TYPE)?),
            database_time: read_u64_le(bytes, OFFSET_DATABASE_TIME)?,
            database_signature: read_array(bytes, OFFSET_DATABASE_SIGNATURE)?,
            database_state: DatabaseState::from_u32(read_u32_le(bytes, OFFSET_DATABASE_STATE)?),
            consistent_position: read_u64_le(bytes, OFFSET_CONSISTENT_POSITION)?,
            consistent_time: LogTime::from_bytes(read_array(bytes, OFFSET_CONSISTENT_TIME)?),
            attach_time: LogTime::from_bytes(read_array(bytes, OFFSET_ATTACH_TIME)?),
            attach_position: read_u64_le(bytes, OFFSET_ATTACH_POSITION)?,
            detach_time: LogTime::from_bytes(read_array(bytes, OFFSET_DETACH_TIME)?),
            detach_position: read_u64_le(bytes, OFFSET_DETACH_POSITION)?,
            log_signature: read_array(bytes, OFFSET_LOG_SIGNATURE)?,
            previous_full_backup: read_array(bytes, OFFSET_PREVIOUS_FULL_BACKUP)?,
            previous_incremental_backup: read_array(bytes, OFFSET_PREVIOUS_INCREMENTAL_BACKUP)?,
            current_full_backup: read_array(bytes, OFFSET_CURRENT_FULL_BACKUP)?,
            last_object_identifier: read_u32_le(bytes, OFFSET_LAST_OBJECT_IDENTIFIER)?,
            index_update_major_version: read_u32_le(bytes, OFFSET_INDEX_UPDATE_MAJOR_VERSION)?,
            index_update_minor_version: read_u32_le(bytes, OFFSET_INDEX_UPDATE_MINOR_VERSION)?,
            index_update_build_number: read_u32_le(bytes, OFFSET_INDEX_UPDATE_BUILD_NUMBER)?,
            index_update_service_pack_number: read_u32_le(
                bytes,
                OFFSET_INDEX_UPDATE_SERVICE_PACK_NUMBER,
            )?,
            format_revision: read_u32_le(bytes, OFFSET_FORMAT_REVISION)?,
            page_size: read_u32_le(bytes, OFFSET_PAGE_SIZE)?,
            creation_format_version: read_u32_le(bytes, OFFSET_CREATION_FORMAT_VERSION)?,
            creation_format_revision: read_u32_le(bytes, OFFSET_CREATION_FORMAT_REVISION)?,
        })
    }

    pub fn validate_page_size(&self) -> Result<u32, EsedbError> {
        if !is_supported_page_size(self.page_size) {
            return Err(EsedbError::UnsupportedPageSize {
                page_size: self.page_size,
            });
        }
        Ok(self.page_size)
    }

    /// Fields a shadow copy must agree on with the primary header.
    pub fn matches_geometry(&self, other: &FileHeader) -> bool {
        self.format_version == other.format_version
            && self.format_revision == other.format_revision
            && self.page_size == other.page_size
    }
}

use std::ops::BitOr;

use crate::types::error::EsedbError;

/// Access flags requested when opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessFlags(u8);

impl AccessFlags {
    pub const NONE: AccessFlags = AccessFlags(0);
    pub const READ: AccessFlags = AccessFlags(0x01);
    pub const WRITE: AccessFlags = AccessFlags(0x02);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: AccessFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Only read-only access is supported; write requests are rejected
    /// explicitly rather than silently downgraded.
    pub fn validate_read_only(&self) -> Result<(), EsedbError> {
        let read = self.contains(Self::READ);
        let write = self.contains(Self::WRITE);
        if !read && !write {
            return Err(EsedbError::Argument {
                details: format!("unsupported access flags: 0x{:02x}", self.0),
            });
        }
        if write {
            return Err(EsedbError::UnsupportedOperation {
                details: "write access to ESE database files is not supported".to_string(),
            });
        }
        Ok(())
    }
}

impl BitOr for AccessFlags {
    type Output = AccessFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        AccessFlags(self.0 | rhs.0)
    }
}

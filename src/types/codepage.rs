use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::error::EsedbError;

/// Legacy single-byte codepages accepted for non-Unicode text columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsciiCodepage {
    Ascii = 20127,
    Windows1250 = 1250,
    Windows1251 = 1251,
    Windows1252 = 1252,
    Windows1253 = 1253,
    Windows1254 = 1254,
    Windows1256 = 1256,
    Windows1257 = 1257,
    Windows1258 = 1258,
}

impl AsciiCodepage {
    pub const ALL: [AsciiCodepage; 9] = [
        AsciiCodepage::Ascii,
        AsciiCodepage::Windows1250,
        AsciiCodepage::Windows1251,
        AsciiCodepage::Windows1252,
        AsciiCodepage::Windows1253,
        AsciiCodepage::Windows1254,
        AsciiCodepage::Windows1256,
        AsciiCodepage::Windows1257,
        AsciiCodepage::Windows1258,
    ];

    pub fn from_u32(value: u32) -> Result<Self, EsedbError> {
        Self::ALL
            .iter()
            .copied()
            .find(|codepage| codepage.as_u32() == value)
            .ok_or(EsedbError::UnsupportedValue {
                what: "ASCII codepage".to_string(),
                value: value as i64,
            })
    }

    pub fn as_u32(&self) -> u32 {
        *self as u32
    }
}

impl Default for AsciiCodepage {
    fn default() -> Self {
        AsciiCodepage::Windows1250
    }
}

impl TryFrom<u32> for AsciiCodepage {
    type Error = EsedbError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_u32(value)
    }
}

impl fmt::Display for AsciiCodepage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsciiCodepage::Ascii => write!(f, "ascii"),
            other => write!(f, "windows-{}", other.as_u32()),
        }
    }
}

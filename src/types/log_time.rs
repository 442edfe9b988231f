use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Raw 8-byte log time as stored in the file header:
/// seconds, minutes, hours, day, month, years since 1900, two filler bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogTime {
    pub raw: [u8; 8],
}

impl LogTime {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self { raw: bytes }
    }

    pub fn is_zero(&self) -> bool {
        self.raw.iter().all(|&b| b == 0)
    }

    /// Returns `None` when the stored fields do not form a valid date.
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        if self.is_zero() {
            return None;
        }
        let [seconds, minutes, hours, day, month, year, _, _] = self.raw;
        NaiveDate::from_ymd_opt(1900 + year as i32, month as u32, day as u32)?.and_hms_opt(
            hours as u32,
            minutes as u32,
            seconds as u32,
        )
    }
}

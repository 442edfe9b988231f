//! Bounds-checked little-endian field extraction at fixed offsets.

use crate::types::error::EsedbError;

pub fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N], EsedbError> {
    let end = offset.checked_add(N).filter(|&end| end <= bytes.len()).ok_or(
        EsedbError::OutOfBounds {
            offset,
            length: N,
            available: bytes.len(),
        },
    )?;
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..end]);
    Ok(out)
}

pub fn read_u16_le(bytes: &[u8], offset: usize) -> Result<u16, EsedbError> {
    read_array::<2>(bytes, offset).map(u16::from_le_bytes)
}

pub fn read_u32_le(bytes: &[u8], offset: usize) -> Result<u32, EsedbError> {
    read_array::<4>(bytes, offset).map(u32::from_le_bytes)
}

pub fn read_u64_le(bytes: &[u8], offset: usize) -> Result<u64, EsedbError> {
    read_array::<8>(bytes, offset).map(u64::from_le_bytes)
}

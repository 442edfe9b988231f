use crate::types::{PageNumber, XOR32_SEED};

/// XOR-folds `data` as little-endian 32-bit words starting from `seed`.
///
/// A trailing partial word is zero-padded in its high-order bytes, so
/// `[0xaa]` folds as `0x000000aa`.
pub fn calculate_xor32(seed: u32, data: &[u8]) -> u32 {
    let mut checksum = seed;
    let mut words = data.chunks_exact(4);

    for word in words.by_ref() {
        checksum ^= u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
    }

    let remainder = words.remainder();
    if !remainder.is_empty() {
        let mut last = [0u8; 4];
        last[..remainder.len()].copy_from_slice(remainder);
        checksum ^= u32::from_le_bytes(last);
    }

    checksum
}

pub fn verify_xor32(seed: u32, data: &[u8], expected: u32) -> bool {
    calculate_xor32(seed, data) == expected
}

/// Seed used by pages with the extended header: the format seed mixed with
/// the one-based on-disk page number.
pub fn extended_page_seed(page_number: PageNumber) -> u32 {
    XOR32_SEED ^ page_number.wrapping_add(1)
}

//! Repeating-key XOR applied to game payloads.
//!
//! This is obfuscation only; it offers no confidentiality.

use bytes::Bytes;

/// Key the stock client uses for game traffic.
pub const DEFAULT_MASK_KEY: u32 = 12345;

/// XOR `buf` in place with the little-endian bytes of `key`, cycling every
/// four bytes. Applying it twice restores the input.
pub fn apply_mask(buf: &mut [u8], key: u32) {
    let key = key.to_le_bytes();
    for (i, b) in buf.iter_mut().enumerate() {
        *b ^= key[i % 4];
    }
}

/// Masked copy of `data`.
pub fn mask(data: &[u8], key: u32) -> Bytes {
    let mut out = data.to_vec();
    apply_mask(&mut out, key);
    Bytes::from(out)
}

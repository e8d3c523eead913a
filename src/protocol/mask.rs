//! Payload masking (RFC 6455 Section 5.3).
//!
//! Masking XORs every payload byte with `key[i % 4]`. Applying the same key
//! twice restores the original bytes.

use crate::error::Result;

/// Scalar byte-by-byte XOR masking.
#[inline]
pub fn apply_mask(data: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

/// XOR masking that processes four bytes at a time.
///
/// Produces the same output as [`apply_mask`].
#[inline]
pub fn apply_mask_fast(data: &mut [u8], mask: [u8; 4]) {
    let mask_u32 = u32::from_ne_bytes(mask);
    let mut chunks = data.chunks_exact_mut(4);

    for chunk in &mut chunks {
        let val = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        chunk.copy_from_slice(&(val ^ mask_u32).to_ne_bytes());
    }

    // Tail starts on a multiple of four, so the key offset restarts at 0.
    for (i, byte) in chunks.into_remainder().iter_mut().enumerate() {
        *byte ^= mask[i];
    }
}

/// Draw a fresh masking key from the operating system RNG.
///
/// # Errors
///
/// Returns `Error::Io` if the RNG is unavailable.
pub fn random_mask_key() -> Result<[u8; 4]> {
    let mut key = [0u8; 4];
    getrandom::getrandom(&mut key).map_err(std::io::Error::from)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masking_reversible() {
        let mask = [0x12, 0x34, 0x56, 0x78];
        let original = b"Hello, WebSocket!".to_vec();
        let mut data = original.clone();

        apply_mask(&mut data, mask);
        assert_ne!(data, original);

        apply_mask(&mut data, mask);
        assert_eq!(data, original);
    }

    #[test]
    fn test_masking_example_from_rfc() {
        let mask = [0x37, 0xfa, 0x21, 0x3d];
        let mut data = b"Hello".to_vec();

        apply_mask(&mut data, mask);
        assert_eq!(data, vec![0x7f, 0x9f, 0x4d, 0x51, 0x58]);
    }

    #[test]
    fn test_masking_empty() {
        let mask = [0x12, 0x34, 0x56, 0x78];
        let mut data: Vec<u8> = vec![];
        apply_mask(&mut data, mask);
        apply_mask_fast(&mut data, mask);
        assert!(data.is_empty());
    }

    #[test]
    fn test_masking_aligned() {
        let mask = [0x11, 0x22, 0x33, 0x44];
        let mut data = vec![0x00; 8];
        apply_mask(&mut data, mask);
        assert_eq!(data, vec![0x11, 0x22, 0x33, 0x44, 0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn test_masking_fast_equivalent() {
        let mask = [0xab, 0xcd, 0xef, 0x12];

        for size in [0, 1, 2, 3, 4, 5, 7, 8, 15, 16, 17, 31, 32, 33, 100, 1024, 4097] {
            let original: Vec<u8> = (0..size).map(|i| (i & 0xff) as u8).collect();

            let mut scalar = original.clone();
            let mut fast = original.clone();

            apply_mask(&mut scalar, mask);
            apply_mask_fast(&mut fast, mask);

            assert_eq!(scalar, fast, "mismatch at size {}", size);
        }
    }

    #[test]
    fn test_random_mask_keys_differ() {
        // Four random bytes colliding eight times in a row is not a realistic outcome.
        let keys: Vec<_> = (0..8).map(|_| random_mask_key().unwrap()).collect();
        assert!(keys.windows(2).any(|w| w[0] != w[1]));
    }
}

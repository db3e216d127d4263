//! Compression service checksums.
//!
//! `qat_comp.c` tracks both a running CRC-32 and an Adler-32 per
//! compression op and returns them in the response. `crc32fast` is already
//! in the dependency stack; Adler-32 is ~15 lines of well-known
//! arithmetic and is implemented directly here rather than pulling in a
//! new crate for it.

const ADLER_MOD: u32 = 65521;

/// CRC-32 (IEEE), matching testable property S5's expected checksum.
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Adler-32, seeded with `a = 1, b = 0` per the standard definition.
pub fn adler32(data: &[u8]) -> u32 {
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for &byte in data {
        a = (a + byte as u32) % ADLER_MOD;
        b = (b + a) % ADLER_MOD;
    }
    (b << 16) | a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_matches_known_vector() {
        let data = b"The quick brown fox jumps over the lazy dog";
        assert_eq!(crc32(data), 0x519025e9);
    }

    #[test]
    fn adler32_of_empty_input_is_one() {
        assert_eq!(adler32(&[]), 1);
    }

    #[test]
    fn adler32_matches_known_vector() {
        assert_eq!(adler32(b"Wikipedia"), 0x11E60398);
    }
}

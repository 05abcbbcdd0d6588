//! CRC-24 implementation for Mode S messages.
//!
//! The CRC is computed by XORing precomputed values for each set bit; because
//! the Mode S CRC-24 is linear over GF(2), those same per-bit values are also
//! the syndrome a single bit flip at that position produces, which is what
//! `error_bit` exploits instead of a second, separately-maintained table.

use std::sync::OnceLock;

/// Precomputed CRC table for Mode S messages.
/// Each entry corresponds to a bit position in the message.
/// For 112-bit messages, all entries are used.
/// For 56-bit messages, only the last 56 entries are used.
///
/// The last 24 entries are zero because the CRC field itself
/// should not affect the computation.
pub const MODES_CHECKSUM_TABLE: [u32; 112] = [
    0x3935ea, 0x1c9af5, 0xf1b77e, 0x78dbbf, 0xc397db, 0x9e31e9, 0xb0e2f0, 0x587178,
    0x2c38bc, 0x161c5e, 0x0b0e2f, 0xfa7d13, 0x82c48d, 0xbe9842, 0x5f4c21, 0xd05c14,
    0x682e0a, 0x341705, 0xe5f186, 0x72f8c3, 0xc68665, 0x9cb936, 0x4e5c9b, 0xd8d449,
    0x939020, 0x49c810, 0x24e408, 0x127204, 0x093902, 0x049c81, 0xfdb444, 0x7eda22,
    0x3f6d11, 0xe04c8c, 0x702646, 0x381323, 0xe3f395, 0x8e03ce, 0x4701e7, 0xdc7af7,
    0x91c77f, 0xb719bb, 0xa476d9, 0xadc168, 0x56e0b4, 0x2b705a, 0x15b82d, 0xf52612,
    0x7a9309, 0xc2b380, 0x6159c0, 0x30ace0, 0x185670, 0x0c2b38, 0x06159c, 0x030ace,
    0x018567, 0xff38b7, 0x80665f, 0xbfc92b, 0xa01e91, 0xaff54c, 0x57faa6, 0x2bfd53,
    0xea04ad, 0x8af852, 0x457c29, 0xdd4410, 0x6ea208, 0x375104, 0x1ba882, 0x0dd441,
    0xf91024, 0x7c8812, 0x3e4409, 0xe0d800, 0x706c00, 0x383600, 0x1c1b00, 0x0e0d80,
    0x0706c0, 0x038360, 0x01c1b0, 0x00e0d8, 0x00706c, 0x003836, 0x001c1b, 0xfff409,
    0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000,
    0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000,
    0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000,
];

/// Calculate the Mode S checksum for a message.
///
/// `msg` must be at least `bits/8` bytes long; `bits` is 56 or 112.
pub fn modes_checksum(msg: &[u8], bits: usize) -> u32 {
    debug_assert!(bits == 56 || bits == 112);
    debug_assert!(msg.len() >= bits / 8);

    let mut crc: u32 = 0;
    // For 56-bit messages, skip the first 56 entries in the table.
    let offset = if bits == 112 { 0 } else { 112 - 56 };

    for j in 0..bits {
        let byte_idx = j / 8;
        let bit_idx = j % 8;
        let bitmask = 1u8 << (7 - bit_idx);

        if msg[byte_idx] & bitmask != 0 {
            crc ^= MODES_CHECKSUM_TABLE[j + offset];
        }
    }

    crc
}

/// Extract the transmitted parity field (last 3 bytes) from a message.
pub fn extract_crc(msg: &[u8], bits: usize) -> u32 {
    let len = bits / 8;
    debug_assert!(msg.len() >= len);

    ((msg[len - 3] as u32) << 16) | ((msg[len - 2] as u32) << 8) | (msg[len - 1] as u32)
}

/// `checksum(frame) XOR received-parity`.
///
/// Zero means no bit error for PI-class frames, or directly gives the ICAO
/// for AP-class frames (the transmitter XORed it into the parity field).
pub fn syndrome(msg: &[u8], bits: usize) -> u32 {
    modes_checksum(msg, bits) ^ extract_crc(msg, bits)
}

/// Verify CRC of a message (syndrome is zero).
pub fn verify_crc(msg: &[u8], bits: usize) -> bool {
    syndrome(msg, bits) == 0
}

fn build_reverse_map(entries: &[u32]) -> Vec<(u32, usize)> {
    let mut map: Vec<(u32, usize)> = entries
        .iter()
        .enumerate()
        .filter(|(_, &v)| v != 0)
        .map(|(i, &v)| (v, i))
        .collect();
    map.sort_unstable_by_key(|&(v, _)| v);
    map
}

fn df17_syndromes() -> &'static [(u32, usize)] {
    static TABLE: OnceLock<Vec<(u32, usize)>> = OnceLock::new();
    TABLE.get_or_init(|| build_reverse_map(&MODES_CHECKSUM_TABLE))
}

fn df11_syndromes() -> &'static [(u32, usize)] {
    static TABLE: OnceLock<Vec<(u32, usize)>> = OnceLock::new();
    TABLE.get_or_init(|| build_reverse_map(&MODES_CHECKSUM_TABLE[56..112]))
}

/// Locate the single bit position a given syndrome accounts for, within a
/// frame of `bits` length (56 or 112). Returns -1 if the syndrome does not
/// match a unique single-bit error, or if the only match falls within the
/// first five (DF field) positions, which are never reportable.
pub fn error_bit(bits: usize, syndrome: u32) -> isize {
    if syndrome == 0 {
        return -1;
    }

    let table = if bits == 112 {
        df17_syndromes()
    } else {
        df11_syndromes()
    };

    match table.binary_search_by_key(&syndrome, |&(v, _)| v) {
        Ok(idx) => {
            let (_, bit) = table[idx];
            if bit < 5 { -1 } else { bit as isize }
        }
        Err(_) => -1,
    }
}

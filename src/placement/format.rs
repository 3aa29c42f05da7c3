//! Format and version information.
//!
//! The error correction level and the mask are stored in a 15-bit BCH(15,5)
//! codeword next to the finder patterns. QR symbols from version 7 on add
//! an 18-bit BCH(18,6) codeword with the version number, rMQR symbols store
//! the level and their size in two 18-bit BCH(18,6) codewords masked with
//! different patterns.
//!
//! All codewords are looked up in tables computed at compile time. When
//! reading, the table entry with the smallest Hamming distance to any copy
//! is picked, as long as the distance does not exceed three bits.
use super::MatrixMap;
use crate::symbol_size::{EcLevel, RmqrSize, Version};

#[cfg(test)]
use pretty_assertions::assert_eq;

const FORMAT_GENERATOR: u32 = 0x537;
const VERSION_GENERATOR: u32 = 0x1F25;

const QR_FORMAT_MASK: u32 = 0x5412;
const MICRO_FORMAT_MASK: u32 = 0x4445;
const RMQR_FORMAT_MASKS: [u32; 2] = [0x1FAB2, 0x20A7B];

const MAX_DISTANCE: u32 = 3;

/// Append the BCH check bits of `data` computed with `generator`.
const fn bch(data: u32, generator: u32, check_bits: u32) -> u32 {
    let mut rem = data << check_bits;
    let mut i = 31;
    while i >= check_bits {
        if (rem >> i) & 1 == 1 {
            rem ^= generator << (i - check_bits);
        }
        i -= 1;
    }
    (data << check_bits) | rem
}

const fn format_table(mask: u32) -> [u32; 32] {
    let mut table = [0; 32];
    let mut data = 0;
    while data < 32 {
        table[data] = bch(data as u32, FORMAT_GENERATOR, 10) ^ mask;
        data += 1;
    }
    table
}

const fn rmqr_table(mask: u32) -> [u32; 64] {
    let mut table = [0; 64];
    let mut data = 0;
    while data < 64 {
        table[data] = bch(data as u32, VERSION_GENERATOR, 12) ^ mask;
        data += 1;
    }
    table
}

const fn version_table() -> [u32; 34] {
    let mut table = [0; 34];
    let mut i = 0;
    while i < 34 {
        table[i] = bch(i as u32 + 7, VERSION_GENERATOR, 12);
        i += 1;
    }
    table
}

/// QR format words indexed by `level bits << 3 | mask`.
pub const QR_FORMAT: [u32; 32] = format_table(QR_FORMAT_MASK);
/// Micro QR format words indexed by `symbol number << 2 | mask`.
pub const MICRO_FORMAT: [u32; 32] = format_table(MICRO_FORMAT_MASK);
/// QR version words for versions 7 to 40.
pub const QR_VERSION: [u32; 34] = version_table();
/// rMQR format words indexed by `level bit << 5 | size index`, for the
/// top left and the bottom right copy.
pub const RMQR_FORMAT: [[u32; 64]; 2] = [
    rmqr_table(RMQR_FORMAT_MASKS[0]),
    rmqr_table(RMQR_FORMAT_MASKS[1]),
];

/// Level and mask read from a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub level: EcLevel,
    pub mask: u8,
}

fn qr_level_bits(level: EcLevel) -> u32 {
    match level {
        EcLevel::L => 0b01,
        EcLevel::M => 0b00,
        EcLevel::Q => 0b11,
        EcLevel::H => 0b10,
    }
}

fn qr_level_from_bits(bits: usize) -> EcLevel {
    match bits & 0b11 {
        0b01 => EcLevel::L,
        0b00 => EcLevel::M,
        0b11 => EcLevel::Q,
        _ => EcLevel::H,
    }
}

/// Module positions `(row, column)` of the format bits, least significant first.
fn qr_positions(n: usize) -> [[(usize, usize); 15]; 2] {
    let mut out = [[(0, 0); 15]; 2];
    for k in 0..15 {
        out[0][k] = match k {
            0..=5 => (k, 8),
            6 => (7, 8),
            7 => (8, 8),
            8 => (8, 7),
            _ => (8, 14 - k),
        };
        out[1][k] = if k < 8 { (8, n - 1 - k) } else { (n - 15 + k, 8) };
    }
    out
}

fn micro_positions() -> [(usize, usize); 15] {
    let mut out = [(0, 0); 15];
    for (k, pos) in out.iter_mut().enumerate() {
        *pos = if k < 7 { (k + 1, 8) } else { (8, 15 - k) };
    }
    out
}

fn version_positions(n: usize) -> [[(usize, usize); 18]; 2] {
    let mut out = [[(0, 0); 18]; 2];
    for k in 0..18 {
        out[0][k] = (n - 11 + k % 3, k / 3);
        out[1][k] = (k / 3, n - 11 + k % 3);
    }
    out
}

/// Positions of the rMQR format bits, the top left copy first.
pub(super) fn rmqr_positions(h: usize, w: usize) -> [[(usize, usize); 18]; 2] {
    let mut out = [[(0, 0); 18]; 2];
    for k in 0..18 {
        out[0][k] = if k < 15 {
            (1 + k % 5, 8 + k / 5)
        } else {
            (k - 14, 11)
        };
        out[1][k] = if k < 15 {
            (h - 6 + k % 5, w - 8 + k / 5)
        } else {
            (h - 6, w - 5 + (k - 15))
        };
    }
    out
}

fn write_word(map: &mut MatrixMap<bool>, positions: &[(usize, usize)], word: u32) {
    for (k, (i, j)) in positions.iter().enumerate() {
        map.set(*i, *j, (word >> k) & 1 == 1);
    }
}

fn read_word(map: &MatrixMap<bool>, positions: &[(usize, usize)]) -> u32 {
    positions
        .iter()
        .enumerate()
        .filter(|(_, (i, j))| *map.get(*i, *j))
        .fold(0, |word, (k, _)| word | 1 << k)
}

/// Index of the table entry closest to one of the read words.
fn nearest(candidates: &[(&[u32], u32)]) -> Option<usize> {
    let mut best: Option<(u32, usize)> = None;
    for (table, word) in candidates {
        for (idx, code) in table.iter().enumerate() {
            let distance = (code ^ word).count_ones();
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, idx));
            }
        }
    }
    best.filter(|(d, _)| *d <= MAX_DISTANCE).map(|(_, idx)| idx)
}

/// Write the format information, and the version information of QR
/// symbols from version 7 on.
///
/// rMQR symbols have a single mask, `mask` is ignored for them.
pub fn write(map: &mut MatrixMap<bool>, level: EcLevel, mask: u8) {
    let (w, h) = (map.width(), map.height());
    match map.version() {
        Version::Qr(v) => {
            let word = QR_FORMAT[(qr_level_bits(level) << 3 | mask as u32 & 0b111) as usize];
            for positions in qr_positions(w) {
                write_word(map, &positions, word);
            }
            if v >= 7 {
                let word = QR_VERSION[v as usize - 7];
                for positions in version_positions(w) {
                    write_word(map, &positions, word);
                }
            }
        }
        Version::Micro(_) => {
            let number = map.version().micro_symbol_number(level).unwrap_or(0);
            let word = MICRO_FORMAT[(number << 2 | mask & 0b11) as usize];
            write_word(map, &micro_positions(), word);
        }
        Version::Rmqr(size) => {
            let data = ((level == EcLevel::H) as usize) << 5 | size.index();
            for (table, positions) in RMQR_FORMAT.iter().zip(rmqr_positions(h, w)) {
                write_word(map, &positions, table[data]);
            }
        }
    }
}

/// Read the format information.
///
/// Returns `None` if no copy is close enough to a valid word or if the
/// stored version does not match the size of the grid.
pub fn read(map: &MatrixMap<bool>) -> Option<Format> {
    let (w, h) = (map.width(), map.height());
    match map.version() {
        Version::Qr(v) => {
            let [first, second] = qr_positions(w);
            let idx = nearest(&[
                (&QR_FORMAT[..], read_word(map, &first)),
                (&QR_FORMAT[..], read_word(map, &second)),
            ])?;
            if v >= 7 {
                let [first, second] = version_positions(w);
                let found = nearest(&[
                    (&QR_VERSION[..], read_word(map, &first)),
                    (&QR_VERSION[..], read_word(map, &second)),
                ])?;
                if found + 7 != v as usize {
                    return None;
                }
            }
            Some(Format {
                level: qr_level_from_bits(idx >> 3),
                mask: (idx & 0b111) as u8,
            })
        }
        Version::Micro(_) => {
            let idx = nearest(&[(&MICRO_FORMAT[..], read_word(map, &micro_positions()))])?;
            let (version, level) = Version::from_micro_symbol_number((idx >> 2) as u8)?;
            (version == map.version()).then_some(Format {
                level,
                mask: (idx & 0b11) as u8,
            })
        }
        Version::Rmqr(size) => {
            let [first, second] = rmqr_positions(h, w);
            let idx = nearest(&[
                (&RMQR_FORMAT[0][..], read_word(map, &first)),
                (&RMQR_FORMAT[1][..], read_word(map, &second)),
            ])?;
            let level = if idx >> 5 == 1 { EcLevel::H } else { EcLevel::M };
            (RmqrSize::from_index(idx & 0b11111) == Some(size)).then_some(Format { level, mask: 0 })
        }
    }
}

#[test]
fn test_known_words() {
    // L, mask 0
    assert_eq!(QR_FORMAT[0b01_000], 0x77C4);
    // M, mask 2 as in the annex example
    assert_eq!(QR_FORMAT[0b00_010], 0b101_1110_0111_1100);
    assert_eq!(QR_VERSION[0], 0x07C94);
    assert_eq!(QR_VERSION[33], 0x28C69);
    assert_eq!(MICRO_FORMAT[0], 0x4445);
    assert_eq!(RMQR_FORMAT[0][0], 0x1FAB2);
    assert_eq!(RMQR_FORMAT[1][0], 0x20A7B);
}

#[test]
fn test_minimum_distance() {
    fn min_distance(table: &[u32]) -> u32 {
        let mut min = u32::MAX;
        for (i, a) in table.iter().enumerate() {
            for b in &table[i + 1..] {
                min = min.min((a ^ b).count_ones());
            }
        }
        min
    }
    assert_eq!(min_distance(&QR_FORMAT), 7);
    assert_eq!(min_distance(&MICRO_FORMAT), 7);
    assert_eq!(min_distance(&QR_VERSION), 8);
    assert_eq!(min_distance(&RMQR_FORMAT[0]), 8);
}

#[test]
fn test_roundtrip() {
    for version in [Version::Qr(1), Version::Qr(7), Version::Qr(40)] {
        for level in enum_iterator::all::<EcLevel>() {
            for mask in 0..8 {
                let mut map = MatrixMap::new(version);
                write(&mut map, level, mask);
                assert_eq!(read(&map), Some(Format { level, mask }));
            }
        }
    }
    for number in 0..8 {
        let (version, level) = Version::from_micro_symbol_number(number).unwrap();
        for mask in 0..4 {
            let mut map = MatrixMap::new(version);
            write(&mut map, level, mask);
            assert_eq!(read(&map), Some(Format { level, mask }));
        }
    }
    for size in enum_iterator::all::<RmqrSize>() {
        for level in [EcLevel::M, EcLevel::H] {
            let mut map = MatrixMap::new(Version::Rmqr(size));
            write(&mut map, level, 0);
            assert_eq!(read(&map), Some(Format { level, mask: 0 }));
        }
    }
}

#[test]
fn test_read_with_errors() {
    let mut map = MatrixMap::new(Version::Qr(8));
    write(&mut map, EcLevel::Q, 5);
    // three errors in the first copy, the second copy destroyed
    for (i, j) in [(0, 8), (3, 8), (8, 2)] {
        map.toggle(i, j);
    }
    for k in 0..8 {
        map.toggle(8, map.width() - 1 - k);
    }
    // two errors in one version copy
    map.toggle(0, map.width() - 11);
    map.toggle(5, map.width() - 9);
    assert_eq!(
        read(&map),
        Some(Format {
            level: EcLevel::Q,
            mask: 5
        })
    );

    let mut map = MatrixMap::new(Version::Micro(2));
    write(&mut map, EcLevel::M, 1);
    for k in 1..=4 {
        map.toggle(k, 8);
    }
    assert_eq!(read(&map), None);
}

#[test]
fn test_version_mismatch() {
    let mut map = MatrixMap::new(Version::Micro(3));
    write(&mut map, EcLevel::M, 2);
    let mut other = MatrixMap::new(Version::Micro(3));
    // M2-L has symbol number 1
    write_word(&mut other, &micro_positions(), MICRO_FORMAT[1 << 2]);
    assert_eq!(read(&other), None);
    assert!(read(&map).is_some());
}

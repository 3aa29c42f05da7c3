//! Shift JIS double byte characters packed into 13 bits.
//!
//! Two ranges of Shift JIS are supported, each is shifted down to zero and
//! then compressed by dropping the unused lower byte values:
//!
//! | Shift JIS       | subtract |
//! |-----------------|----------|
//! | 0x8140 - 0x9FFC | 0x8140   |
//! | 0xE040 - 0xEBBF | 0xC140   |
//!
//! The result `0xHHLL` is stored as `0xHH * 0xC0 + 0xLL`.
use crate::bits::BitBuffer;

/// Compute the 13 bit value of a Shift JIS character.
pub(crate) fn encode_pair(hi: u8, lo: u8) -> Option<u16> {
    if !matches!(lo, 0x40..=0xFC) || lo == 0x7F {
        return None;
    }
    let sjis = u16::from_be_bytes([hi, lo]);
    let base = match sjis {
        0x8140..=0x9FFC => 0x8140,
        0xE040..=0xEBBF => 0xC140,
        _ => return None,
    };
    let [h, l] = (sjis - base).to_be_bytes();
    Some(h as u16 * 0xC0 + l as u16)
}

/// Inverse of [encode_pair].
pub(crate) fn decode_pair(value: u16) -> Option<[u8; 2]> {
    let shifted = (value / 0xC0) << 8 | (value % 0xC0);
    let sjis = if shifted + 0x8140 <= 0x9FFC {
        shifted + 0x8140
    } else {
        shifted.checked_add(0xC140)?
    };
    let [hi, lo] = sjis.to_be_bytes();
    (encode_pair(hi, lo) == Some(value)).then_some([hi, lo])
}

pub(super) fn is_encodable(pair: &[u8]) -> bool {
    matches!(pair, [hi, lo] if encode_pair(*hi, *lo).is_some())
}

pub(super) fn encoding_size(count: usize) -> usize {
    13 * count
}

pub(super) fn encode(data: &[u8], buf: &mut BitBuffer) {
    for pair in data.chunks_exact(2) {
        if let Some(v) = encode_pair(pair[0], pair[1]) {
            buf.write_bits(v as u64, 13);
        }
    }
}

#[test]
fn test_standard_examples() {
    // 点 and 茗 from ISO 18004
    assert_eq!(encode_pair(0x93, 0x5F), Some(0xD9F));
    assert_eq!(encode_pair(0xE4, 0xAA), Some(0x1AAA));
    assert_eq!(decode_pair(0xD9F), Some([0x93, 0x5F]));
    assert_eq!(decode_pair(0x1AAA), Some([0xE4, 0xAA]));
}

#[test]
fn test_invalid_pairs() {
    assert_eq!(encode_pair(0x81, 0x7F), None);
    assert_eq!(encode_pair(0x81, 0x3F), None);
    assert_eq!(encode_pair(0xA0, 0x40), None);
    assert_eq!(encode_pair(0xEB, 0xC0), None);
    assert_eq!(decode_pair(0x1FFF), Some([0xEB, 0xBF]));
    // would map to the lower bytes 0x7F and 0xFF
    assert_eq!(decode_pair(63), None);
    assert_eq!(decode_pair(0xBF), None);
}

#[test]
fn test_all_values_roundtrip() {
    let mut count = 0;
    for value in 0..(1u16 << 13) {
        if let Some([hi, lo]) = decode_pair(value) {
            assert_eq!(encode_pair(hi, lo), Some(value));
            count += 1;
        }
    }
    assert!(count > 7000);
}

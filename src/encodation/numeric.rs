use crate::bits::BitBuffer;

pub(super) fn is_encodable(ch: u8) -> bool {
    ch.is_ascii_digit()
}

/// Number of payload bits for `count` digits.
pub(super) fn encoding_size(count: usize) -> usize {
    10 * (count / 3)
        + match count % 3 {
            0 => 0,
            1 => 4,
            _ => 7,
        }
}

pub(super) fn encode(data: &[u8], buf: &mut BitBuffer) {
    for group in data.chunks(3) {
        let value = group
            .iter()
            .fold(0u64, |acc, d| acc * 10 + (d - b'0') as u64);
        buf.write_bits(value, encoding_size(group.len()));
    }
}

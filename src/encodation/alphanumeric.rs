use crate::bits::BitBuffer;

/// The 45 characters in the order of their values.
pub(crate) const CHARSET: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

pub(crate) fn value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'A'..=b'Z' => Some(ch - b'A' + 10),
        b' ' => Some(36),
        b'$' => Some(37),
        b'%' => Some(38),
        b'*' => Some(39),
        b'+' => Some(40),
        b'-' => Some(41),
        b'.' => Some(42),
        b'/' => Some(43),
        b':' => Some(44),
        _ => None,
    }
}

pub(super) fn is_encodable(ch: u8) -> bool {
    value(ch).is_some()
}

pub(super) fn encoding_size(count: usize) -> usize {
    11 * (count / 2) + 6 * (count % 2)
}

pub(super) fn encode(data: &[u8], buf: &mut BitBuffer) {
    let v = |ch: u8| value(ch).unwrap_or(0) as u64;
    for pair in data.chunks(2) {
        match pair {
            [a, b] => buf.write_bits(v(*a) * 45 + v(*b), 11),
            [a] => buf.write_bits(v(*a), 6),
            _ => {}
        }
    }
}

#[test]
fn test_charset_values() {
    for (i, ch) in CHARSET.iter().enumerate() {
        assert_eq!(value(*ch), Some(i as u8));
    }
    assert_eq!(value(b'a'), None);
    assert_eq!(value(b'#'), None);
}

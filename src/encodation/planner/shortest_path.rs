use alloc::{vec, vec::Vec};

use super::frac::Frac;
use crate::encodation::{is_encodable_at, DataEncodingError, Mode, Segment};
use crate::symbol_size::Version;

#[cfg(test)]
use pretty_assertions::assert_eq;

/// How a state was reached.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Prev {
    /// First segment of the input.
    Start,
    /// Same segment as the previous character.
    Continue,
    /// A new segment, the previous one used the given mode.
    Switch(Mode),
}

/// Cheapest way to encode a prefix of the input with the last character in a fixed mode.
#[derive(Debug, Clone, Copy)]
struct Node {
    cost: Frac,
    /// Input position before the last character.
    from: usize,
    prev: Prev,
}

type Column = [Option<Node>; 4];

fn char_cost(mode: Mode) -> Frac {
    match mode {
        Mode::Numeric => Frac::new(10, 3),
        Mode::Alphanumeric => Frac::new(11, 2),
        Mode::Bytes => Frac::from(8),
        Mode::Kanji => Frac::from(13),
    }
}

fn header_cost(version: Version, mode: Mode) -> u32 {
    (version.mode_indicator_len() + version.char_count_bits(mode)) as u32
}

/// The cheapest finished segment ending at a position.
fn best_end(column: &Column) -> Option<(Frac, Mode)> {
    let mut best: Option<(Frac, Mode)> = None;
    for (i, node) in column.iter().enumerate() {
        let (Some(node), Some(mode)) = (node, Mode::from_index(i)) else {
            continue;
        };
        let cost = node.cost.ceil();
        if best.map_or(true, |(c, _)| cost < c) {
            best = Some((cost, mode));
        }
    }
    best
}

fn invalid_character(data: &[u8], version: Version) -> DataEncodingError {
    let modes = version.modes();
    let widest = [Mode::Bytes, Mode::Alphanumeric, Mode::Numeric]
        .into_iter()
        .find(|m| modes.contains(*m))
        .unwrap_or(Mode::Numeric);
    let position = (0..data.len())
        .find(|i| !modes.into_iter().any(|m| is_encodable_at(m, &data[*i..])))
        .unwrap_or(0);
    DataEncodingError::InvalidCharacter {
        mode: widest,
        position,
        byte: data.get(position).copied().unwrap_or(0),
    }
}

/// Split `data` into segments with the minimal number of bits for `version`.
///
/// The cost of a segment is its mode indicator, its character count
/// indicator and the packed characters. Numeric and Alphanumeric pack several
/// characters together, so costs are tracked in fractions of bits and rounded
/// up when a segment ends.
///
/// Segments are not split if they exceed the character count indicator,
/// see [split_long_segments](crate::encodation::split_long_segments).
pub(crate) fn optimize(data: &[u8], version: Version) -> Result<Vec<Segment>, DataEncodingError> {
    let n = data.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let modes = version.modes();
    let mut table: Vec<Column> = vec![[None; 4]; n + 1];

    for i in 0..n {
        let boundary = if i == 0 {
            Some((Frac::ZERO, None))
        } else {
            best_end(&table[i]).map(|(cost, mode)| (cost, Some(mode)))
        };
        for mode in modes {
            if !is_encodable_at(mode, &data[i..]) {
                continue;
            }
            let cost = char_cost(mode);
            let cont = table[i][mode.index()].map(|node| (node.cost + cost, Prev::Continue));
            let switch = boundary.map(|(c, prev)| {
                (
                    c + header_cost(version, mode) + cost,
                    prev.map_or(Prev::Start, Prev::Switch),
                )
            });
            let best = match (cont, switch) {
                (Some(a), Some(b)) if b.0 < a.0 => Some(b),
                (Some(a), _) => Some(a),
                (None, b) => b,
            };
            let Some((cost, prev)) = best else {
                continue;
            };
            let slot = &mut table[i + mode.bytes_per_char()][mode.index()];
            if slot.map_or(true, |s| cost < s.cost) {
                *slot = Some(Node { cost, from: i, prev });
            }
        }
    }

    let Some((_, mut mode)) = best_end(&table[n]) else {
        return Err(invalid_character(data, version));
    };

    // walk back, collecting (mode, start, end) of every segment
    let mut runs = Vec::new();
    let (mut pos, mut end) = (n, n);
    loop {
        let Some(node) = table[pos][mode.index()] else {
            return Err(invalid_character(data, version));
        };
        match node.prev {
            Prev::Continue => pos = node.from,
            Prev::Start => {
                runs.push((mode, node.from, end));
                break;
            }
            Prev::Switch(prev) => {
                runs.push((mode, node.from, end));
                pos = node.from;
                end = node.from;
                mode = prev;
            }
        }
    }

    let mut segments: Vec<Segment> = Vec::with_capacity(runs.len());
    for (mode, start, end) in runs.into_iter().rev() {
        match segments.last_mut() {
            Some(last) if last.mode == mode => last.data.extend_from_slice(&data[start..end]),
            _ => segments.push(Segment::new(mode, &data[start..end])),
        }
    }
    Ok(segments)
}

#[cfg(test)]
fn bits(segments: &[Segment], version: Version) -> usize {
    segments.iter().map(|s| s.encoded_len(version)).sum()
}

#[cfg(test)]
fn single_mode_bits(data: &[u8], mode: Mode, version: Version) -> Option<usize> {
    let seg = Segment::new(mode, data);
    seg.validate().ok()?;
    Some(seg.encoded_len(version))
}

#[test]
fn test_single_modes() {
    let v = Version::Qr(1);
    assert_eq!(
        optimize(b"01234567", v).unwrap(),
        vec![Segment::new(Mode::Numeric, "01234567")]
    );
    assert_eq!(
        optimize(b"AC-42", v).unwrap(),
        vec![Segment::new(Mode::Alphanumeric, "AC-42")]
    );
    assert_eq!(
        optimize(b"hello", v).unwrap(),
        vec![Segment::new(Mode::Bytes, "hello")]
    );
    assert_eq!(
        optimize(&[0x93, 0x5F, 0xE4, 0xAA], v).unwrap(),
        vec![Segment::new(Mode::Kanji, [0x93, 0x5F, 0xE4, 0xAA])]
    );
    assert_eq!(optimize(b"", v).unwrap(), vec![]);
}

#[test]
fn test_mixed_switches() {
    let v = Version::Qr(1);
    // a long run of digits is worth its own segment
    let plan = optimize(b"a0123456789012b", v).unwrap();
    assert_eq!(
        plan,
        vec![
            Segment::new(Mode::Bytes, "a"),
            Segment::new(Mode::Numeric, "0123456789012"),
            Segment::new(Mode::Bytes, "b"),
        ]
    );
    // but a short one is not
    let plan = optimize(b"a01b", v).unwrap();
    assert_eq!(plan, vec![Segment::new(Mode::Bytes, "a01b")]);
}

#[test]
fn test_never_worse_than_single_mode() {
    let inputs: [&[u8]; 6] = [
        b"HELLO WORLD 12345678901234567890",
        b"https://example.com/ABC/0123456789",
        b"0000000000AAAAAAAAAAaaaaaaaaaa",
        b"1A2B3C4D5E6F",
        &[0x93, 0x5F, b'1', b'2', b'3', 0xE4, 0xAA, b'x'],
        b"A",
    ];
    for version in [Version::Qr(1), Version::Qr(10), Version::Qr(27), Version::Micro(4)] {
        for data in inputs {
            let plan = optimize(data, version).unwrap();
            let planned = bits(&plan, version);
            let joined: Vec<u8> = plan.iter().flat_map(|s| s.data.iter().copied()).collect();
            assert_eq!(&joined[..], data);
            for mode in version.modes() {
                if let Some(single) = single_mode_bits(data, mode, version) {
                    assert!(planned <= single, "{:?} {:?}", plan, mode);
                }
            }
        }
    }
}

#[test]
fn test_micro_restrictions() {
    assert_eq!(
        optimize(b"12345", Version::Micro(1)).unwrap(),
        vec![Segment::new(Mode::Numeric, "12345")]
    );
    assert_eq!(
        optimize(b"12a", Version::Micro(1)),
        Err(DataEncodingError::InvalidCharacter {
            mode: Mode::Numeric,
            position: 2,
            byte: b'a'
        })
    );
    assert_eq!(
        optimize(b"AB#", Version::Micro(2)),
        Err(DataEncodingError::InvalidCharacter {
            mode: Mode::Alphanumeric,
            position: 2,
            byte: b'#'
        })
    );
}

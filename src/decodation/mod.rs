//! Data decodation. This comes after error correction.
//!
//! It performs the inverse of the `encodation` module: the data codewords
//! are read as a bit stream of segments until the terminator or the end
//! of the data bits is reached.
use alloc::{string::String, vec::Vec};

use crate::bits::{BitBuffer, BitBufferError};
use crate::encodation::{alphanumeric, kanji, Mode, Segment};
use crate::symbol_size::Version;

#[cfg(test)]
use pretty_assertions::assert_eq;

pub(crate) mod eci;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DataDecodingError {
    /// The mode indicator is not defined for the version.
    #[error("unknown mode indicator {0:#06b}")]
    UnknownMode(u8),
    /// A group of characters has a value outside of the mode's range.
    #[error("invalid character group in {0} segment")]
    InvalidEncoding(Mode),
    /// The bit stream ended inside a segment.
    #[error("data ended inside a segment")]
    BufferExhausted(#[from] BitBufferError),
    /// A Kanji value which does not map to Shift JIS.
    #[error("kanji value {0:#06x} is not a Shift JIS character")]
    InvalidCharacter(u16),
    /// The bytes are not valid in their character set.
    #[error("data is invalid in its character set")]
    CharsetError,
    #[error("{0} is not supported")]
    NotImplemented(&'static str),
}

/// Segments and ECI designators read from the data codewords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedData {
    pub segments: Vec<Segment>,
    /// ECI designators with the byte offset (in the concatenated
    /// segment data) from which on they apply.
    pub ecis: Vec<(usize, u32)>,
}

impl DecodedData {
    /// Concatenate the data of all segments.
    pub fn data(&self) -> Vec<u8> {
        self.segments
            .iter()
            .flat_map(|s| s.data.iter().copied())
            .collect()
    }

    /// Convert the data to a string.
    ///
    /// Without ECI, bytes are read as UTF-8 if valid and as Latin-1 otherwise.
    /// Kanji segments and ECI character sets other than Latin-1, ASCII and
    /// UTF-8 need the feature `kanji_text`.
    pub fn to_text(&self) -> Result<String, DataDecodingError> {
        eci::convert(&self.segments, &self.ecis)
    }
}

enum Indicator {
    Terminator,
    Mode(Mode),
    Eci,
    StructuredAppend,
    Fnc1First,
    Fnc1Second,
}

fn indicator(version: Version, bits: u8) -> Option<Indicator> {
    let special = match version {
        Version::Qr(_) => match bits {
            0b0000 => Some(Indicator::Terminator),
            0b0111 => Some(Indicator::Eci),
            0b0011 => Some(Indicator::StructuredAppend),
            0b0101 => Some(Indicator::Fnc1First),
            0b1001 => Some(Indicator::Fnc1Second),
            _ => None,
        },
        Version::Rmqr(_) => match bits {
            0b000 => Some(Indicator::Terminator),
            0b111 => Some(Indicator::Eci),
            0b101 => Some(Indicator::Fnc1First),
            0b110 => Some(Indicator::Fnc1Second),
            _ => None,
        },
        Version::Micro(_) => None,
    };
    special.or_else(|| version.mode_from_indicator(bits).map(Indicator::Mode))
}

/// Decode the data codewords of a symbol.
///
/// Only the first `data_bits` bits are used, this matters for M1 and M3
/// symbols which end with a 4-bit codeword.
pub fn decode_data(
    codewords: &[u8],
    version: Version,
    data_bits: usize,
) -> Result<DecodedData, DataDecodingError> {
    let mut buf = BitBuffer::from_bytes(codewords, data_bits);
    let mut out = DecodedData::default();
    let mut offset = 0;
    loop {
        // a terminator is shortened if the capacity is exhausted
        let n = version.terminator_len().min(buf.remaining());
        if n == 0 || buf.peek_bits(n)? == 0 {
            break;
        }
        let bits = buf.read_bits(version.mode_indicator_len())? as u8;
        match indicator(version, bits).ok_or(DataDecodingError::UnknownMode(bits))? {
            Indicator::Terminator => break,
            Indicator::Eci => {
                let designator = read_eci(&mut buf)?;
                out.ecis.push((offset, designator));
            }
            Indicator::StructuredAppend => {
                // symbol index, symbol count and parity of the whole message
                let header = buf.read_bits(16)?;
                tracing::trace!(
                    index = header >> 12,
                    total = ((header >> 8) & 0xF) + 1,
                    parity = header & 0xFF,
                    "structured append"
                );
            }
            Indicator::Fnc1First => tracing::trace!("FNC1 in first position"),
            Indicator::Fnc1Second => {
                let application = buf.read_bits(8)?;
                tracing::trace!(application, "FNC1 in second position");
            }
            Indicator::Mode(mode) => {
                let count = buf.read_bits(version.char_count_bits(mode))? as usize;
                let mut data = Vec::with_capacity(count * 2);
                match mode {
                    Mode::Numeric => decode_numeric(&mut buf, count, &mut data)?,
                    Mode::Alphanumeric => decode_alphanumeric(&mut buf, count, &mut data)?,
                    Mode::Bytes => decode_bytes(&mut buf, count, &mut data)?,
                    Mode::Kanji => decode_kanji(&mut buf, count, &mut data)?,
                }
                offset += data.len();
                out.segments.push(Segment::new(mode, data));
            }
        }
    }
    Ok(out)
}

fn read_eci(buf: &mut BitBuffer) -> Result<u32, DataDecodingError> {
    let first = buf.read_bits(8)? as u32;
    Ok(match first {
        0x00..=0x7F => first,
        0x80..=0xBF => ((first & 0x3F) << 8) | buf.read_bits(8)? as u32,
        0xC0..=0xDF => ((first & 0x1F) << 16) | buf.read_bits(16)? as u32,
        _ => return Err(DataDecodingError::NotImplemented("ECI designator above 999999")),
    })
}

fn decode_numeric(buf: &mut BitBuffer, count: usize, out: &mut Vec<u8>) -> Result<(), DataDecodingError> {
    let mut left = count;
    while left > 0 {
        let (digits, bits, limit) = match left {
            1 => (1, 4, 10),
            2 => (2, 7, 100),
            _ => (3, 10, 1000),
        };
        let value = buf.read_bits(bits)?;
        if value >= limit {
            return Err(DataDecodingError::InvalidEncoding(Mode::Numeric));
        }
        let mut divisor = limit / 10;
        while divisor > 0 {
            out.push(b'0' + ((value / divisor) % 10) as u8);
            divisor /= 10;
        }
        left -= digits;
    }
    Ok(())
}

fn alphanumeric_char(value: u64) -> Result<u8, DataDecodingError> {
    alphanumeric::CHARSET
        .get(value as usize)
        .copied()
        .ok_or(DataDecodingError::InvalidEncoding(Mode::Alphanumeric))
}

fn decode_alphanumeric(buf: &mut BitBuffer, count: usize, out: &mut Vec<u8>) -> Result<(), DataDecodingError> {
    for _ in 0..count / 2 {
        let value = buf.read_bits(11)?;
        if value >= 45 * 45 {
            return Err(DataDecodingError::InvalidEncoding(Mode::Alphanumeric));
        }
        out.push(alphanumeric_char(value / 45)?);
        out.push(alphanumeric_char(value % 45)?);
    }
    if count % 2 == 1 {
        let value = buf.read_bits(6)?;
        out.push(alphanumeric_char(value)?);
    }
    Ok(())
}

fn decode_bytes(buf: &mut BitBuffer, count: usize, out: &mut Vec<u8>) -> Result<(), DataDecodingError> {
    if buf.remaining() < count * 8 {
        return Err(BitBufferError::BufferExhausted.into());
    }
    for _ in 0..count {
        out.push(buf.read_bits(8)? as u8);
    }
    Ok(())
}

fn decode_kanji(buf: &mut BitBuffer, count: usize, out: &mut Vec<u8>) -> Result<(), DataDecodingError> {
    for _ in 0..count {
        let value = buf.read_bits(13)? as u16;
        let pair = kanji::decode_pair(value).ok_or(DataDecodingError::InvalidCharacter(value))?;
        out.extend_from_slice(&pair);
    }
    Ok(())
}

#[cfg(test)]
fn encode(segments: &[Segment], version: Version, level: crate::symbol_size::EcLevel) -> (Vec<u8>, usize) {
    let setup = version.block_setup(level).unwrap();
    let codewords = crate::encodation::segments_to_codewords(segments, version, &setup).unwrap();
    (codewords, setup.data_bits)
}

#[test]
fn test_decode_annex_codewords() {
    let codewords = [
        0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11,
    ];
    let decoded = decode_data(&codewords, Version::Qr(1), 128).unwrap();
    assert_eq!(decoded.segments, [Segment::new(Mode::Numeric, "01234567")]);
    assert!(decoded.ecis.is_empty());
}

#[test]
fn test_roundtrip_all_modes() {
    use crate::symbol_size::{EcLevel, RmqrSize};

    let segments = [
        Segment::new(Mode::Numeric, "314159"),
        Segment::new(Mode::Alphanumeric, "HI:$"),
        Segment::new(Mode::Bytes, [0xC3, 0xA9]),
        Segment::new(Mode::Kanji, [0x93, 0x5F]),
        Segment::new(Mode::Numeric, "7"),
    ];
    // 116 bits in M4, which holds 128
    let versions = [
        (Version::Qr(2), EcLevel::L),
        (Version::Qr(10), EcLevel::H),
        (Version::Micro(4), EcLevel::L),
        (Version::Rmqr(RmqrSize::R13x77), EcLevel::M),
    ];
    for (version, level) in versions {
        let (codewords, data_bits) = encode(&segments, version, level);
        let decoded = decode_data(&codewords, version, data_bits).unwrap();
        assert_eq!(decoded.segments, segments, "{}", version);
    }
}

#[test]
fn test_micro_terminator() {
    use crate::symbol_size::EcLevel;

    for (version, level) in [
        (Version::Micro(1), EcLevel::L),
        (Version::Micro(2), EcLevel::M),
        (Version::Micro(3), EcLevel::M),
    ] {
        let segments = [Segment::new(Mode::Numeric, "42")];
        let (codewords, data_bits) = encode(&segments, version, level);
        let decoded = decode_data(&codewords, version, data_bits).unwrap();
        assert_eq!(decoded.segments, segments);
    }
}

#[test]
fn test_invalid_groups() {
    // QR numeric, count 3, value 1000
    let mut buf = BitBuffer::new();
    buf.write_bits(0b0001, 4);
    buf.write_bits(3, 10);
    buf.write_bits(1000, 10);
    let len = buf.len();
    assert_eq!(
        decode_data(buf.as_bytes(), Version::Qr(1), len),
        Err(DataDecodingError::InvalidEncoding(Mode::Numeric))
    );

    let mut buf = BitBuffer::new();
    buf.write_bits(0b0010, 4);
    buf.write_bits(1, 9);
    buf.write_bits(45, 6);
    let len = buf.len();
    assert_eq!(
        decode_data(buf.as_bytes(), Version::Qr(1), len),
        Err(DataDecodingError::InvalidEncoding(Mode::Alphanumeric))
    );

    let mut buf = BitBuffer::new();
    buf.write_bits(0b1000, 4);
    buf.write_bits(1, 8);
    buf.write_bits(63, 13);
    let len = buf.len();
    assert_eq!(
        decode_data(buf.as_bytes(), Version::Qr(1), len),
        Err(DataDecodingError::InvalidCharacter(63))
    );
}

#[test]
fn test_stream_errors() {
    let mut buf = BitBuffer::new();
    buf.write_bits(0b0100, 4);
    buf.write_bits(200, 8);
    buf.write_bits(0x41, 8);
    let len = buf.len();
    assert_eq!(
        decode_data(buf.as_bytes(), Version::Qr(1), len),
        Err(DataDecodingError::BufferExhausted(BitBufferError::BufferExhausted))
    );
    assert_eq!(
        decode_data(&[0b0110_0000, 0], Version::Qr(1), 16),
        Err(DataDecodingError::UnknownMode(0b0110))
    );
    // structured append header cut short
    assert_eq!(
        decode_data(&[0b0011_0001, 0], Version::Qr(1), 16),
        Err(DataDecodingError::BufferExhausted(BitBufferError::BufferExhausted))
    );
}

#[test]
fn test_skips_structured_append() {
    // symbol 2 of 3, parity 0x5A, then "AB"
    let mut buf = BitBuffer::new();
    buf.write_bits(0b0011, 4);
    buf.write_bits(1, 4);
    buf.write_bits(2, 4);
    buf.write_bits(0x5A, 8);
    buf.write_bits(0b0010, 4);
    buf.write_bits(2, 9);
    buf.write_bits(10 * 45 + 11, 11);
    let len = buf.len();
    let decoded = decode_data(buf.as_bytes(), Version::Qr(1), len).unwrap();
    assert_eq!(decoded.segments, [Segment::new(Mode::Alphanumeric, "AB")]);
}

#[test]
fn test_skips_fnc1() {
    // QR, FNC1 in first position (GS1), then "01"
    let mut buf = BitBuffer::new();
    buf.write_bits(0b0101, 4);
    buf.write_bits(0b0001, 4);
    buf.write_bits(2, 10);
    buf.write_bits(1, 7);
    let len = buf.len();
    let decoded = decode_data(buf.as_bytes(), Version::Qr(1), len).unwrap();
    assert_eq!(decoded.segments, [Segment::new(Mode::Numeric, "01")]);

    // QR, FNC1 in second position with application indicator 37, then byte "x"
    let mut buf = BitBuffer::new();
    buf.write_bits(0b1001, 4);
    buf.write_bits(37, 8);
    buf.write_bits(0b0100, 4);
    buf.write_bits(1, 8);
    buf.write_bytes(b"x");
    let len = buf.len();
    let decoded = decode_data(buf.as_bytes(), Version::Qr(1), len).unwrap();
    assert_eq!(decoded.data(), b"x");

    // rMQR R7x43, FNC1 in second position, then numeric "5"
    let version = Version::Rmqr(crate::symbol_size::RmqrSize::R7x43);
    let mut buf = BitBuffer::new();
    buf.write_bits(0b110, 3);
    buf.write_bits(0xFF, 8);
    buf.write_bits(0b001, 3);
    buf.write_bits(1, version.char_count_bits(Mode::Numeric));
    buf.write_bits(5, 4);
    let len = buf.len();
    let decoded = decode_data(buf.as_bytes(), version, len).unwrap();
    assert_eq!(decoded.segments, [Segment::new(Mode::Numeric, "5")]);
}

#[test]
fn test_eci_positions() {
    let mut buf = BitBuffer::new();
    buf.write_bits(0b0100, 4);
    buf.write_bits(1, 8);
    buf.write_bytes(b"a");
    buf.write_bits(0b0111, 4);
    buf.write_bits(26, 8);
    buf.write_bits(0b0100, 4);
    buf.write_bits(2, 8);
    buf.write_bytes("é".as_bytes());
    let len = buf.len();
    let decoded = decode_data(buf.as_bytes(), Version::Qr(1), len).unwrap();
    assert_eq!(decoded.ecis, [(1, 26)]);
    assert_eq!(decoded.data(), "aé".as_bytes());
    assert_eq!(decoded.to_text().unwrap(), "aé");

    let mut buf = BitBuffer::new();
    buf.write_bits(0b0111, 4);
    buf.write_bits(0b1000_0011, 8);
    buf.write_bits(0xE8, 8);
    let len = buf.len();
    let decoded = decode_data(buf.as_bytes(), Version::Qr(1), len).unwrap();
    assert_eq!(decoded.ecis, [(0, 1000)]);
}

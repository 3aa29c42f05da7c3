use alloc::{string::String, vec::Vec};

use crate::encodation::{Mode, Segment};

use super::DataDecodingError;

/// Convert segments to UTF-8, switching the character set at ECI positions.
///
/// Byte based segments in the same character set are joined before
/// conversion so multi-byte characters may cross segment boundaries.
pub fn convert(segments: &[Segment], ecis: &[(usize, u32)]) -> Result<String, DataDecodingError> {
    let mut out = String::new();
    let mut pending = Vec::new();
    let mut eci = None;
    let mut offset = 0;
    let mut ecis = ecis.iter().peekable();
    for segment in segments {
        while let Some((_, designator)) = ecis.next_if(|(pos, _)| *pos <= offset) {
            convert_chunk(&pending, eci, &mut out)?;
            pending.clear();
            eci = Some(*designator);
        }
        if segment.mode == Mode::Kanji {
            convert_chunk(&pending, eci, &mut out)?;
            pending.clear();
            convert_shift_jis(&segment.data, &mut out)?;
        } else {
            pending.extend_from_slice(&segment.data);
        }
        offset += segment.data.len();
    }
    convert_chunk(&pending, eci, &mut out)?;
    Ok(out)
}

fn push_latin1(bytes: &[u8], out: &mut String) {
    out.extend(bytes.iter().map(|b| *b as char));
}

fn push_utf8(bytes: &[u8], out: &mut String) -> Result<(), DataDecodingError> {
    out.push_str(core::str::from_utf8(bytes).or(Err(DataDecodingError::CharsetError))?);
    Ok(())
}

fn convert_chunk(bytes: &[u8], eci: Option<u32>, out: &mut String) -> Result<(), DataDecodingError> {
    if bytes.is_empty() {
        return Ok(());
    }
    match eci {
        None => match core::str::from_utf8(bytes) {
            Ok(text) => out.push_str(text),
            Err(_) => push_latin1(bytes, out),
        },
        Some(1 | 3) => push_latin1(bytes, out),
        Some(26) => push_utf8(bytes, out)?,
        Some(27 | 170) => {
            if !bytes.is_ascii() {
                return Err(DataDecodingError::CharsetError);
            }
            push_utf8(bytes, out)?;
        }
        Some(other) => convert_chunk_extended(bytes, other, out)?,
    }
    Ok(())
}

#[cfg(feature = "kanji_text")]
fn convert_chunk_extended(bytes: &[u8], eci: u32, out: &mut String) -> Result<(), DataDecodingError> {
    use encoding_rs::*;

    let encoding = match eci {
        4 => ISO_8859_2,
        5 => ISO_8859_3,
        6 => ISO_8859_4,
        7 => ISO_8859_5,
        8 => ISO_8859_6,
        9 => ISO_8859_7,
        10 => ISO_8859_8,
        12 => ISO_8859_10,
        15 => ISO_8859_13,
        16 => ISO_8859_14,
        17 => ISO_8859_15,
        18 => ISO_8859_16,
        20 => SHIFT_JIS,
        21 => WINDOWS_1250,
        22 => WINDOWS_1251,
        23 => WINDOWS_1252,
        24 => WINDOWS_1256,
        25 => UTF_16BE,
        28 => BIG5,
        29 => GB18030,
        30 => EUC_KR,
        _ => return Err(DataDecodingError::NotImplemented("ECI character set")),
    };
    let text = encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(DataDecodingError::CharsetError)?;
    out.push_str(&text);
    Ok(())
}

#[cfg(not(feature = "kanji_text"))]
fn convert_chunk_extended(_bytes: &[u8], _eci: u32, _out: &mut String) -> Result<(), DataDecodingError> {
    Err(DataDecodingError::NotImplemented(
        "ECI character set, enable feature kanji_text",
    ))
}

#[cfg(feature = "kanji_text")]
fn convert_shift_jis(bytes: &[u8], out: &mut String) -> Result<(), DataDecodingError> {
    convert_chunk_extended(bytes, 20, out)
}

#[cfg(not(feature = "kanji_text"))]
fn convert_shift_jis(_bytes: &[u8], _out: &mut String) -> Result<(), DataDecodingError> {
    Err(DataDecodingError::NotImplemented(
        "Shift JIS text, enable feature kanji_text",
    ))
}

#[test]
fn test_default_charset() {
    let segments = [
        Segment::new(Mode::Alphanumeric, "AB"),
        Segment::new(Mode::Bytes, [0xE9, b'!']),
    ];
    assert_eq!(convert(&segments, &[]).unwrap(), "ABé!");
    let segments = [Segment::new(Mode::Bytes, "grüße")];
    assert_eq!(convert(&segments, &[]).unwrap(), "grüße");
}

#[test]
fn test_eci_switches() {
    let segments = [
        Segment::new(Mode::Bytes, [0xE9]),
        Segment::new(Mode::Bytes, [0xC3]),
        Segment::new(Mode::Bytes, [0xA9]),
    ];
    // Latin-1 for the first byte, then UTF-8 split over two segments
    assert_eq!(convert(&segments, &[(0, 3), (1, 26)]).unwrap(), "éé");
    assert_eq!(
        convert(&segments, &[(0, 26)]),
        Err(DataDecodingError::CharsetError)
    );
    assert_eq!(
        convert(&[Segment::new(Mode::Bytes, [0x80])], &[(0, 27)]),
        Err(DataDecodingError::CharsetError)
    );
}

#[cfg(not(feature = "kanji_text"))]
#[test]
fn test_kanji_needs_feature() {
    let segments = [Segment::new(Mode::Kanji, [0x93, 0x5F])];
    assert!(matches!(
        convert(&segments, &[]),
        Err(DataDecodingError::NotImplemented(_))
    ));
}

#[cfg(feature = "kanji_text")]
#[test]
fn test_kanji_text() {
    let segments = [
        Segment::new(Mode::Kanji, [0x93, 0x5F, 0xE4, 0xAA]),
        Segment::new(Mode::Numeric, "1"),
    ];
    assert_eq!(convert(&segments, &[]).unwrap(), "点茗1");
    let segments = [Segment::new(Mode::Bytes, [0xA4])];
    assert_eq!(convert(&segments, &[(0, 17)]).unwrap(), "€");
}

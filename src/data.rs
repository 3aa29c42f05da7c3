//! Data part de- and encoding
//!
//! The codewords of a symbol consist of two parts,
//! the first part is the actual information one wants to encode,
//! the second part error correction codewords.
//!
//! The functions in this module can be used to de- and encode
//! the first part, the data part. They are useful if one needs to work on
//! a lower level, for example to combine the codewords with
//! [errorcode](crate::errorcode) and [placement](crate::placement) in a
//! custom way.
use alloc::vec::Vec;

pub use crate::bits::BitBufferError;
pub use crate::decodation::{DataDecodingError, DecodedData};
pub use crate::encodation::{DataEncodingError, EncodedData, Mode, Segment};

use crate::encodation;
use crate::symbol_size::{EcLevel, SymbolList, Version};

#[cfg(test)]
use pretty_assertions::assert_eq;

/// Encode data to the data codewords of the first version in `symbols` it fits in.
///
/// The half codeword of M1 and M3 symbols is the high nibble of the
/// last codeword.
pub fn encode_data(
    data: &[u8],
    level: EcLevel,
    symbols: &SymbolList,
) -> Result<EncodedData, DataEncodingError> {
    encodation::encode_data(data, level, symbols)
}

/// Decode the data codewords of a symbol.
///
/// The codewords must be corrected already, see [decode_error](crate::errorcode::decode_error).
pub fn decode_data(
    codewords: &[u8],
    version: Version,
    level: EcLevel,
) -> Result<DecodedData, DataDecodingError> {
    let data_bits = version
        .data_bits(level)
        .ok_or(DataDecodingError::NotImplemented("error correction level of this version"))?;
    crate::decodation::decode_data(codewords, version, data_bits)
}

/// Compute the segments with the shortest encoding in `version`.
///
/// The plan minimizes the number of bits, the mode switches are chosen
/// accordingly. Segments are split if they exceed the character count
/// indicator of their mode. Returns an error if some byte can not be
/// encoded with the modes available in the version.
///
/// # Example
///
/// ```rust
/// use qrmatrix::data::plan;
/// use qrmatrix::{Mode, Version};
///
/// let segments = plan(b"ABCDEF0123456789012", Version::Qr(1)).unwrap();
/// assert_eq!(segments[0].mode, Mode::Alphanumeric);
/// assert_eq!(segments[1].mode, Mode::Numeric);
/// ```
pub fn plan(data: &[u8], version: Version) -> Result<Vec<Segment>, DataEncodingError> {
    let segments = encodation::planner::optimize(data, version)?;
    Ok(encodation::split_long_segments(segments, version))
}

#[test]
fn test_codeword_roundtrip() {
    let symbols = SymbolList::micro();
    let encoded = encode_data(b"HELLO4", EcLevel::L, &symbols).unwrap();
    assert_eq!(encoded.version, Version::Micro(2));
    let decoded = decode_data(&encoded.codewords, encoded.version, EcLevel::L).unwrap();
    assert_eq!(decoded.data(), b"HELLO4");
    assert_eq!(decoded.segments, encoded.segments);
}

#[test]
fn test_plan_kanji() {
    let kanji = [0x93, 0x5F, 0xE4, 0xAA].repeat(3);
    let mut data = kanji.clone();
    data.push(b'a');
    let segments = plan(&data, Version::Qr(5)).unwrap();
    assert_eq!(
        segments,
        [Segment::new(Mode::Kanji, kanji), Segment::new(Mode::Bytes, "a")]
    );
    assert!(matches!(
        plan(b"abc", Version::Micro(2)),
        Err(DataEncodingError::InvalidCharacter { position: 0, .. })
    ));
}

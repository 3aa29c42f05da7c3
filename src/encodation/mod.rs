//! Implementation of the data encodation using all character modes.
//!
//! The data part of a symbol is a bit stream of segments. Every segment
//! starts with a mode indicator and a character count indicator, followed
//! by the characters packed as defined by the [Mode]. After the last segment
//! a terminator and padding fill the stream up to the number of data bits.
use alloc::vec::Vec;

use crate::bits::BitBuffer;
use crate::symbol_size::{BlockSetup, EcLevel, SymbolList, Version};

pub(crate) mod alphanumeric;
mod bytes;
pub(crate) mod kanji;
mod mode;
mod numeric;

pub(crate) mod planner;

pub use mode::Mode;

const PAD_CODEWORDS: [u8; 2] = [0xEC, 0x11];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataEncodingError {
    /// A byte can not be represented in the required mode.
    #[error("byte {byte:#04x} at position {position} can not be encoded in {mode} mode")]
    InvalidCharacter { mode: Mode, position: usize, byte: u8 },
    /// The mode is not available in the version.
    #[error("{mode} mode is not available in version {version}")]
    UnsupportedMode { mode: Mode, version: Version },
    /// No version of the symbol list has this error correction level.
    #[error("no allowed version supports error correction level {0:?}")]
    UnsupportedLevel(EcLevel),
    /// The fixed mask is not defined for the version.
    #[error("mask {mask} is not available in version {version}")]
    InvalidMask { mask: u8, version: Version },
    /// The data does not fit into any allowed version.
    #[error("the data is too large for all allowed symbols")]
    DataTooLarge,
    #[error("the symbol list is empty")]
    EmptySymbolList,
}

/// A run of input bytes encoded in one [Mode].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub mode: Mode,
    /// The raw bytes, two bytes per character for [Mode::Kanji].
    pub data: Vec<u8>,
}

impl Segment {
    pub fn new(mode: Mode, data: impl Into<Vec<u8>>) -> Self {
        Self {
            mode,
            data: data.into(),
        }
    }

    /// Number of characters, the value of the character count indicator.
    pub fn char_count(&self) -> usize {
        self.data.len() / self.mode.bytes_per_char()
    }

    /// Check that all bytes can be represented in the segment's mode.
    pub fn validate(&self) -> Result<(), DataEncodingError> {
        let step = self.mode.bytes_per_char();
        let mut position = 0;
        while position < self.data.len() {
            if !is_encodable_at(self.mode, &self.data[position..]) {
                return Err(DataEncodingError::InvalidCharacter {
                    mode: self.mode,
                    position,
                    byte: self.data[position],
                });
            }
            position += step;
        }
        Ok(())
    }

    /// Number of bits of the packed characters.
    pub fn payload_len(&self) -> usize {
        let count = self.char_count();
        match self.mode {
            Mode::Numeric => numeric::encoding_size(count),
            Mode::Alphanumeric => alphanumeric::encoding_size(count),
            Mode::Bytes => bytes::encoding_size(count),
            Mode::Kanji => kanji::encoding_size(count),
        }
    }

    /// Number of bits of the whole segment including its header.
    pub fn encoded_len(&self, version: Version) -> usize {
        version.mode_indicator_len() + version.char_count_bits(self.mode) + self.payload_len()
    }

    /// Append the segment to the bit stream.
    pub(crate) fn write(&self, version: Version, buf: &mut BitBuffer) -> Result<(), DataEncodingError> {
        let indicator = version
            .mode_indicator(self.mode)
            .ok_or(DataEncodingError::UnsupportedMode {
                mode: self.mode,
                version,
            })?;
        if self.char_count() > version.max_char_count(self.mode) {
            return Err(DataEncodingError::DataTooLarge);
        }
        buf.write_bits(indicator as u64, version.mode_indicator_len());
        buf.write_bits(self.char_count() as u64, version.char_count_bits(self.mode));
        match self.mode {
            Mode::Numeric => numeric::encode(&self.data, buf),
            Mode::Alphanumeric => alphanumeric::encode(&self.data, buf),
            Mode::Bytes => bytes::encode(&self.data, buf),
            Mode::Kanji => kanji::encode(&self.data, buf),
        }
        Ok(())
    }
}

/// Can the next character of `rest` be encoded in `mode`?
pub(crate) fn is_encodable_at(mode: Mode, rest: &[u8]) -> bool {
    match (mode, rest) {
        (_, []) => false,
        (Mode::Numeric, [ch, ..]) => numeric::is_encodable(*ch),
        (Mode::Alphanumeric, [ch, ..]) => alphanumeric::is_encodable(*ch),
        (Mode::Bytes, _) => true,
        (Mode::Kanji, [a, b, ..]) => kanji::is_encodable(&[*a, *b]),
        (Mode::Kanji, _) => false,
    }
}

/// Split segments whose character count does not fit the count indicator.
pub(crate) fn split_long_segments(segments: Vec<Segment>, version: Version) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let max = version.max_char_count(segment.mode);
        if max == 0 || segment.char_count() <= max {
            out.push(segment);
            continue;
        }
        let chunk = max * segment.mode.bytes_per_char();
        out.extend(
            segment
                .data
                .chunks(chunk)
                .map(|part| Segment::new(segment.mode, part)),
        );
    }
    out
}

/// Add terminator and padding up to `data_bits`.
fn add_padding(buf: &mut BitBuffer, version: Version, data_bits: usize) {
    let terminator = version.terminator_len().min(data_bits - buf.len());
    buf.write_bits(0, terminator);
    while buf.len() % 8 != 0 && buf.len() < data_bits {
        buf.push_bit(false);
    }
    for pad in PAD_CODEWORDS.iter().cycle() {
        if buf.len() + 8 > data_bits {
            break;
        }
        buf.write_bits(*pad as u64, 8);
    }
    // last half codeword of M1 and M3
    let rest = data_bits - buf.len();
    buf.write_bits(0, rest);
}

/// Write segments to data codewords of the version.
///
/// The half codeword of M1 and M3 symbols is the high nibble of the last codeword.
pub(crate) fn segments_to_codewords(
    segments: &[Segment],
    version: Version,
    setup: &BlockSetup,
) -> Result<Vec<u8>, DataEncodingError> {
    let mut buf = BitBuffer::with_capacity(setup.data_bits);
    for segment in segments {
        segment.write(version, &mut buf)?;
    }
    if buf.len() > setup.data_bits {
        return Err(DataEncodingError::DataTooLarge);
    }
    add_padding(&mut buf, version, setup.data_bits);
    debug_assert_eq!(buf.len(), setup.data_bits);
    Ok(buf.into_bytes())
}

/// Result of a successful data encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedData {
    pub codewords: Vec<u8>,
    pub version: Version,
    pub segments: Vec<Segment>,
}

/// Planner results are reused for versions with identical headers.
struct PlanCache {
    entries: Vec<(HeaderKey, Result<Vec<Segment>, DataEncodingError>)>,
}

type HeaderKey = (usize, [usize; 4]);

fn header_key(version: Version) -> HeaderKey {
    let mut widths = [0; 4];
    for (i, w) in widths.iter_mut().enumerate() {
        if let Some(mode) = Mode::from_index(i) {
            *w = version.char_count_bits(mode);
        }
    }
    (version.mode_indicator_len(), widths)
}

impl PlanCache {
    fn plan(&mut self, data: &[u8], version: Version) -> Result<Vec<Segment>, DataEncodingError> {
        let key = header_key(version);
        if let Some((_, plan)) = self.entries.iter().find(|(k, _)| *k == key) {
            return plan.clone();
        }
        let plan = planner::optimize(data, version).map(|s| split_long_segments(s, version));
        self.entries.push((key, plan.clone()));
        plan
    }
}

/// Encode data into the first version of `symbols` it fits in.
pub(crate) fn encode_data(
    data: &[u8],
    level: EcLevel,
    symbols: &SymbolList,
) -> Result<EncodedData, DataEncodingError> {
    if symbols.is_empty() {
        return Err(DataEncodingError::EmptySymbolList);
    }
    let mut cache = PlanCache { entries: Vec::new() };
    let mut error = DataEncodingError::UnsupportedLevel(level);
    let mut planned_any = false;
    for version in symbols.iter() {
        let Some(setup) = version.block_setup(level) else {
            continue;
        };
        let segments = match cache.plan(data, version) {
            Ok(segments) => segments,
            Err(err) => {
                if !planned_any {
                    error = err;
                }
                continue;
            }
        };
        planned_any = true;
        let bits: usize = segments.iter().map(|s| s.encoded_len(version)).sum();
        if bits > setup.data_bits {
            continue;
        }
        let codewords = segments_to_codewords(&segments, version, &setup)?;
        return Ok(EncodedData {
            codewords,
            version,
            segments,
        });
    }
    if planned_any {
        Err(DataEncodingError::DataTooLarge)
    } else {
        Err(error)
    }
}

/// Encode given segments into the first version of `symbols` they fit in.
pub(crate) fn encode_segments(
    segments: &[Segment],
    level: EcLevel,
    symbols: &SymbolList,
) -> Result<EncodedData, DataEncodingError> {
    if symbols.is_empty() {
        return Err(DataEncodingError::EmptySymbolList);
    }
    for segment in segments {
        segment.validate()?;
    }
    let mut error = DataEncodingError::UnsupportedLevel(level);
    let mut too_large = false;
    for version in symbols.iter() {
        let Some(setup) = version.block_setup(level) else {
            continue;
        };
        if let Some(segment) = segments.iter().find(|s| !version.modes().contains(s.mode)) {
            if !too_large {
                error = DataEncodingError::UnsupportedMode {
                    mode: segment.mode,
                    version,
                };
            }
            continue;
        }
        let split = split_long_segments(segments.to_vec(), version);
        match segments_to_codewords(&split, version, &setup) {
            Ok(codewords) => {
                return Ok(EncodedData {
                    codewords,
                    version,
                    segments: split,
                })
            }
            Err(DataEncodingError::DataTooLarge) => too_large = true,
            Err(err) => return Err(err),
        }
    }
    if too_large {
        Err(DataEncodingError::DataTooLarge)
    } else {
        Err(error)
    }
}

#[cfg(test)]
mod tests;

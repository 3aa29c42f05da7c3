//! QR code, Micro QR code and rMQR code encoding and decoding.
//!
//! The three symbologies share one design: data is split into segments of
//! character modes, packed into codewords, protected by Reed-Solomon codes
//! and placed in a grid of dark and light modules. They differ in size,
//! in their function patterns and in a few tables.
//!
//! - QR code: versions 1 to 40, square.
//! - Micro QR code: versions M1 to M4, square with one finder pattern.
//! - rMQR code: 32 rectangular sizes from R7x43 to R17x139.
//!
//! # Example
//!
//! ```rust
//! use qrmatrix::{EcLevel, MaskChoice, SymbolList, Version};
//!
//! let code = qrmatrix::encode(b"Hello, World!", EcLevel::M, MaskChoice::Auto, SymbolList::qr()).unwrap();
//! assert_eq!(code.version(), Version::Qr(1));
//! print!("{}", code.bitmap().unicode());
//!
//! let decoded = qrmatrix::decode(code.bitmap()).unwrap();
//! assert_eq!(decoded.data(), b"Hello, World!");
//! ```
//!
//! The smallest symbol is searched in a [SymbolList]. The data is split
//! into segments such that the encoded size is minimal, see [data::plan].
//!
//! Decoding works on a sampled module grid, a [Bitmap] without quiet zone.
//! Locating a symbol in an image is out of scope of this crate.
#![cfg_attr(not(test), no_std)]
extern crate alloc;

mod bits;
mod decodation;
mod encodation;
pub mod errorcode;
pub mod placement;
mod symbol_size;

pub mod data;

use alloc::{string::String, vec::Vec};

pub use encodation::{DataEncodingError, Mode, Segment};
pub use placement::Bitmap;
pub use symbol_size::{
    BlockDescriptor, BlockSetup, EcLevel, RmqrSize, SizePreference, SymbolList, Version,
};

use bits::BitBuffer;
use decodation::DataDecodingError;
use encodation::EncodedData;
use errorcode::ErrorDecodingError;
use placement::{format, mask, MatrixMap, Visitor};

#[cfg(test)]
use pretty_assertions::assert_eq;

/// Writes the codeword stream into the data modules.
struct CodewordPlacer(BitBuffer);

impl CodewordPlacer {
    fn new(codewords: &[u8], setup: &BlockSetup, half_codeword: bool) -> Self {
        let mut bits = BitBuffer::with_capacity(codewords.len() * 8);
        for (k, codeword) in codewords.iter().enumerate() {
            if half_codeword && k + 1 == setup.data_codewords {
                bits.write_bits((*codeword >> 4) as u64, 4);
            } else {
                bits.write_bits(*codeword as u64, 8);
            }
        }
        Self(bits)
    }
}

impl Visitor<bool> for CodewordPlacer {
    fn visit(&mut self, _idx: usize, bit: &mut bool) {
        // remainder bits stay light
        *bit = self.0.read_bit().unwrap_or(false);
    }
}

/// Collects the bits of the data modules.
struct CodewordReader(BitBuffer);

impl Visitor<bool> for CodewordReader {
    fn visit(&mut self, _idx: usize, bit: &mut bool) {
        self.0.push_bit(*bit);
    }
}

impl CodewordReader {
    fn codewords(mut self, setup: &BlockSetup, half_codeword: bool) -> Result<Vec<u8>, DataDecodingError> {
        let mut out = Vec::with_capacity(setup.total_codewords);
        for k in 0..setup.total_codewords {
            if half_codeword && k + 1 == setup.data_codewords {
                out.push((self.0.read_bits(4)? as u8) << 4);
            } else {
                out.push(self.0.read_bits(8)? as u8);
            }
        }
        Ok(out)
    }
}

/// Choice of the mask pattern.
///
/// QR symbols have eight masks (0 to 7), Micro QR symbols four (0 to 3)
/// and rMQR symbols only one (0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskChoice {
    /// Evaluate all masks and pick the best one.
    #[default]
    Auto,
    /// Use the given mask.
    Fixed(u8),
}

/// An encoded symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    bitmap: Bitmap<bool>,
    version: Version,
    ec_level: EcLevel,
    mask: u8,
    segments: Vec<Segment>,
}

impl Symbol {
    /// The module grid, without quiet zone.
    pub fn bitmap(&self) -> &Bitmap<bool> {
        &self.bitmap
    }

    pub fn into_bitmap(self) -> Bitmap<bool> {
        self.bitmap
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn ec_level(&self) -> EcLevel {
        self.ec_level
    }

    /// The mask id stored in the format information.
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// The segments the data was encoded with.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Encode data into the smallest symbol of `symbols`.
///
/// The data is split into segments of the [Mode]s available in each
/// version such that the encoding is as short as possible. The versions are
/// tried in the order of the [SizePreference] of the list.
///
/// # Example
///
/// ```rust
/// use qrmatrix::{EcLevel, MaskChoice, RmqrSize, SizePreference, SymbolList, Version};
///
/// let symbols = SymbolList::rmqr().with_preference(SizePreference::HeightFirst);
/// let code = qrmatrix::encode(b"RMQR 2024", EcLevel::M, MaskChoice::Auto, symbols).unwrap();
/// assert_eq!(code.version(), Version::Rmqr(RmqrSize::R7x59));
/// ```
pub fn encode(
    data: &[u8],
    level: EcLevel,
    mask: MaskChoice,
    symbols: impl Into<SymbolList>,
) -> Result<Symbol, DataEncodingError> {
    let _span = tracing::debug_span!("encode", len = data.len(), ?level).entered();
    let encoded = encodation::encode_data(data, level, &symbols.into())?;
    build_symbol(encoded, level, mask)
}

/// Encode given segments into the smallest symbol of `symbols`.
///
/// No planning is done, the segments are only split if they are longer
/// than the character count indicator allows.
pub fn encode_segments(
    segments: &[Segment],
    level: EcLevel,
    mask: MaskChoice,
    symbols: impl Into<SymbolList>,
) -> Result<Symbol, DataEncodingError> {
    let _span = tracing::debug_span!("encode_segments", segments = segments.len(), ?level).entered();
    let encoded = encodation::encode_segments(segments, level, &symbols.into())?;
    build_symbol(encoded, level, mask)
}

fn build_symbol(encoded: EncodedData, level: EcLevel, mask: MaskChoice) -> Result<Symbol, DataEncodingError> {
    let version = encoded.version;
    let setup = version
        .block_setup(level)
        .ok_or(DataEncodingError::UnsupportedLevel(level))?;
    if let MaskChoice::Fixed(fixed) = mask {
        if fixed >= mask::num_masks(version) {
            return Err(DataEncodingError::InvalidMask {
                mask: fixed,
                version,
            });
        }
    }

    let codewords = errorcode::encode_error(&encoded.codewords, &setup);
    let mut map = MatrixMap::new(version);
    map.traverse(&mut CodewordPlacer::new(
        &codewords,
        &setup,
        version.has_half_codeword(level),
    ));
    let mask = match mask {
        MaskChoice::Auto => mask::choose(&map, level),
        MaskChoice::Fixed(fixed) => fixed,
    };
    mask::apply(&mut map, mask);
    format::write(&mut map, level, mask);
    tracing::debug!(%version, ?level, mask, segments = ?encoded.segments, "encoded symbol");

    Ok(Symbol {
        bitmap: map.bitmap(),
        version,
        ec_level: level,
        mask,
        segments: encoded.segments,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodingError {
    /// No version has the dimensions of the grid.
    #[error("no symbol has {width}x{height} modules")]
    UnsupportedSize { width: usize, height: usize },
    /// The format or version information could not be read.
    #[error("format information not found")]
    FormatNotFound,
    #[error(transparent)]
    ErrorCorrection(#[from] ErrorDecodingError),
    #[error(transparent)]
    DataDecoding(#[from] DataDecodingError),
}

/// Result of [decode].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub segments: Vec<Segment>,
    /// ECI designators and the byte offset from which on they apply.
    pub ecis: Vec<(usize, u32)>,
    pub version: Version,
    pub ec_level: EcLevel,
    pub mask: u8,
    /// Number of codewords fixed by error correction.
    pub corrected: usize,
}

impl Decoded {
    /// The decoded bytes, the data of all segments concatenated.
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
        decodation::eci::convert(&self.segments, &self.ecis)
    }
}

/// Decode a sampled module grid.
///
/// The bitmap must contain exactly the modules of the symbol, dark modules
/// being `true`. The version is derived from its dimensions.
pub fn decode(bitmap: &Bitmap<bool>) -> Result<Decoded, DecodingError> {
    let (width, height) = (bitmap.width(), bitmap.height());
    let _span = tracing::debug_span!("decode", width, height).entered();
    let mut map =
        MatrixMap::from_bitmap(bitmap).ok_or(DecodingError::UnsupportedSize { width, height })?;
    let version = map.version();
    let format = format::read(&map).ok_or(DecodingError::FormatNotFound)?;
    let setup = version
        .block_setup(format.level)
        .ok_or(DecodingError::FormatNotFound)?;
    tracing::debug!(%version, level = ?format.level, mask = format.mask, "format information");

    mask::apply(&mut map, format.mask);
    let mut reader = CodewordReader(BitBuffer::with_capacity(setup.total_codewords * 8 + 7));
    map.traverse(&mut reader);
    let codewords = reader.codewords(&setup, version.has_half_codeword(format.level))?;
    let corrected = errorcode::decode_error(&codewords, &setup)?;
    let data = decodation::decode_data(&corrected.data, version, setup.data_bits)?;
    tracing::debug!(segments = ?data.segments, corrected = corrected.errors, "decoded symbol");

    Ok(Decoded {
        segments: data.segments,
        ecis: data.ecis,
        version,
        ec_level: format.level,
        mask: format.mask,
        corrected: corrected.errors,
    })
}

#[cfg(test)]
mod tests;

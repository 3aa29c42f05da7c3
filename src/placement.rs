//! Arrangement of bits in a QR, Micro QR or rMQR symbol.
//!
//! The module contains the struct [MatrixMap] which holds the module grid of
//! a symbol together with the cells reserved for function patterns and
//! format information. Its [traverse()](MatrixMap::traverse) method walks
//! the remaining cells in the zigzag order the codeword bits are placed in.
//! This is used to write the encoded data into the grid, and also to read it
//! from a grid.
//!
//! An abstract bitmap struct [Bitmap] is the final output of encoding and the input
//! for decoding. It also contains helpers for rendering.
use alloc::{string::String, vec, vec::Vec};

use crate::symbol_size::Version;

pub mod format;
pub mod mask;
mod patterns;

#[cfg(test)]
use pretty_assertions::assert_eq;

/// Trait for a visitor to the symbol's data modules.
///
/// During traversal the visitor is called once for every module which is
/// not part of a function pattern, in the order of the codeword bits. It can
/// either read or write them.
pub trait Visitor<B: Bit> {
    /// Visit the module of the `bit_index`-th bit of the codeword stream.
    fn visit(&mut self, bit_index: usize, bit: &mut B);
}

/// Abstract "bit" type used in [MatrixMap].
pub trait Bit: Clone + PartialEq + core::fmt::Debug {
    const LOW: Self;
    const HIGH: Self;
}

impl Bit for bool {
    const LOW: bool = false;
    const HIGH: bool = true;
}

/// The module grid of a symbol and the cells reserved for function patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixMap<B: Bit> {
    version: Version,
    width: usize,
    height: usize,
    entries: Vec<B>,
    reserved: Vec<bool>,
}

impl<B: Bit> MatrixMap<B> {
    /// Create the template of a version.
    ///
    /// Finder, timing and alignment patterns are drawn, the areas of the
    /// format and version information are reserved but left light.
    pub fn new(version: Version) -> Self {
        let width = version.width();
        let height = version.height();
        let mut map = Self {
            version,
            width,
            height,
            entries: vec![B::LOW; width * height],
            reserved: vec![false; width * height],
        };
        patterns::draw(&mut map);
        map
    }

    /// Read a module grid, the version is derived from the dimensions.
    ///
    /// Returns `None` if no version has the size of the bitmap.
    pub fn from_bitmap(bitmap: &Bitmap<B>) -> Option<Self> {
        let version = Version::from_dimensions(bitmap.width(), bitmap.height())?;
        let mut map = Self::new(version);
        map.entries.clone_from(&bitmap.bits);
        Some(map)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The module in row `i` and column `j`.
    pub fn get(&self, i: usize, j: usize) -> &B {
        &self.entries[i * self.width + j]
    }

    /// Is the module part of a function pattern or the format information?
    pub fn is_reserved(&self, i: usize, j: usize) -> bool {
        self.reserved[i * self.width + j]
    }

    /// Set a module and mark it as reserved.
    pub(crate) fn put(&mut self, i: usize, j: usize, dark: bool) {
        let k = i * self.width + j;
        self.entries[k] = if dark { B::HIGH } else { B::LOW };
        self.reserved[k] = true;
    }

    /// Like [put](Self::put) but ignores coordinates outside of the grid.
    pub(crate) fn put_clipped(&mut self, i: isize, j: isize, dark: bool) {
        if i >= 0 && j >= 0 && (i as usize) < self.height && (j as usize) < self.width {
            self.put(i as usize, j as usize, dark);
        }
    }

    /// Get the content of the matrix as a bitmap.
    pub fn bitmap(&self) -> Bitmap<B> {
        Bitmap {
            width: self.width,
            bits: self.entries.clone(),
        }
    }

    /// Traverse the data modules in codeword bit order and call the visitor.
    ///
    /// Starting at the bottom right, two columns are walked in a zigzag
    /// upwards, then the next two columns to the left downwards, and so on.
    /// QR skips the vertical timing pattern in column 6, rMQR starts left of
    /// its right timing column.
    ///
    /// Returns the number of visited modules.
    pub fn traverse<V: Visitor<B>>(&mut self, visitor: &mut V) -> usize {
        let (w, h) = (self.width, self.height);
        let mut right = match self.version {
            Version::Rmqr(_) => w as isize - 2,
            _ => w as isize - 1,
        };
        let mut upward = true;
        let mut index = 0;
        while right >= 1 {
            if matches!(self.version, Version::Qr(_)) && right == 6 {
                right = 5;
            }
            for step in 0..h {
                let i = if upward { h - 1 - step } else { step };
                for j in [right as usize, right as usize - 1] {
                    let k = i * w + j;
                    if !self.reserved[k] {
                        visitor.visit(index, &mut self.entries[k]);
                        index += 1;
                    }
                }
            }
            upward = !upward;
            right -= 2;
        }
        index
    }
}

impl MatrixMap<bool> {
    pub(crate) fn set(&mut self, i: usize, j: usize, dark: bool) {
        self.entries[i * self.width + j] = dark;
    }

    pub(crate) fn toggle(&mut self, i: usize, j: usize) {
        let k = i * self.width + j;
        self.entries[k] = !self.entries[k];
    }
}

/// An abstract bitmap.
///
/// Contains helpers for rendering the content. For rendering targets which
/// use something similar to pixels try [pixels()](Self::pixels).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap<M> {
    width: usize,
    bits: Vec<M>,
}

impl<B: Bit> Bitmap<B> {
    /// Create a bitmap with all pixels light.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            bits: vec![B::LOW; width * height],
        }
    }

    /// Return the width of the bitmap (no quiet zone included).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Return the height of the bitmap (no quiet zone included).
    pub fn height(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.bits.len() / self.width
        }
    }

    /// The pixel at column `x` and row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<&B> {
        if x >= self.width {
            return None;
        }
        self.bits.get(y * self.width + x)
    }

    /// Change the pixel at column `x` and row `y`, out of range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: B) {
        if x < self.width {
            if let Some(bit) = self.bits.get_mut(y * self.width + x) {
                *bit = value;
            }
        }
    }

    /// Compute a unicode representation ("ASCII art").
    ///
    /// This is intended as a demo functionality. It might look weird
    /// if the line height is wrong or if you are not using a monospaced font.
    /// A quiet zone of two modules is added, QR symbols need four for
    /// reliable scanning.
    pub fn unicode(&self) -> String {
        const BORDER: usize = 2;
        const CHAR: [char; 4] = [' ', '▄', '▀', '█'];
        let height = self.height();
        let get = |i: usize, j: usize| -> usize {
            let inside = i >= BORDER && i < BORDER + height && j >= BORDER && j < BORDER + self.width;
            if inside && self.bits[(i - BORDER) * self.width + (j - BORDER)] == B::HIGH {
                1
            } else {
                0
            }
        };
        let mut out =
            String::with_capacity((height + 2 * BORDER) * (self.width + 1 + 2 * BORDER) * 3 / 2);
        for i in (0..height + 2 * BORDER).step_by(2) {
            for j in 0..(self.width + 2 * BORDER) {
                let idx = (get(i, j) << 1) | get(i + 1, j);
                out.push(CHAR[idx]);
            }
            out.push('\n');
        }
        out
    }

    /// Get an iterator over the dark pixels' coordinates `(x, y)`.
    ///
    /// A dark pixel refers to one of the small dark squares ("modules") a
    /// symbol is made of. Depending on your target, such a pixel
    /// may be rendered using multiple image pixels, or whatever you use
    /// to visualize the symbol.
    ///
    /// The coordinate system is centered in the top left corner starting
    /// in `(0, 0)` with a horizontal x-axis and vertical y-axis.
    /// The pixels are returned in order, incrementing x before y.
    ///
    /// A quiet zone is not included in the coordinates but one must
    /// be added when rendering: QR symbols need four modules of free space
    /// around them, Micro QR and rMQR two.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use qrmatrix::{EcLevel, MaskChoice, SymbolList};
    /// let code = qrmatrix::encode(b"Foo", EcLevel::M, MaskChoice::Auto, SymbolList::qr()).unwrap();
    /// for (x, y) in code.bitmap().pixels() {
    ///     // place square/circle at (x, y) to render the symbol
    /// }
    /// ```
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let w = self.width();
        self.bits
            .iter()
            .enumerate()
            .filter(|(_i, b)| **b == B::HIGH)
            .map(move |(i, _b)| (i % w, i / w))
    }
}

impl Bitmap<bool> {
    /// Pack the pixels row by row into bytes, dark is 1, most significant bit first.
    ///
    /// Rows are not aligned to bytes, the last byte is padded with zeros.
    pub fn to_raw(&self) -> Vec<u8> {
        let mut out = vec![0; (self.bits.len() + 7) / 8];
        for (k, _) in self.bits.iter().enumerate().filter(|(_, b)| **b) {
            out[k / 8] |= 0x80 >> (k % 8);
        }
        out
    }

    /// Inverse of [to_raw](Self::to_raw).
    ///
    /// Returns `None` if `raw` is too short for the dimensions.
    pub fn from_raw(width: usize, height: usize, raw: &[u8]) -> Option<Self> {
        let len = width * height;
        if raw.len() * 8 < len {
            return None;
        }
        let bits = (0..len)
            .map(|k| (raw[k / 8] << (k % 8)) & 0x80 != 0)
            .collect();
        Some(Self { width, bits })
    }
}

#[cfg(test)]
mod tests {
    use super::{Bit, MatrixMap, Visitor};
    use crate::symbol_size::{EcLevel, Version};
    use alloc::vec::Vec;
    use pretty_assertions::assert_eq;

    impl Bit for u16 {
        const LOW: Self = 0;
        const HIGH: Self = u16::MAX;
    }

    struct LogVisitor;

    impl Visitor<u16> for LogVisitor {
        fn visit(&mut self, idx: usize, bit: &mut u16) {
            *bit = idx as u16 + 1;
        }
    }

    /// The bit index (starting at 1) in the data modules.
    pub fn log(version: Version) -> (MatrixMap<u16>, usize) {
        let mut m = MatrixMap::<u16>::new(version);
        let count = m.traverse(&mut LogVisitor);
        (m, count)
    }

    #[test]
    fn test_data_module_count() {
        for version in Version::all() {
            let (_, count) = log(version);
            let level = if matches!(version, Version::Rmqr(_)) {
                EcLevel::M
            } else {
                EcLevel::L
            };
            let setup = version.block_setup(level).unwrap();
            let bits = setup.data_bits + (setup.total_codewords - setup.data_codewords) * 8;
            assert!(count >= bits, "{}", version);
            assert!(count - bits < 8, "{}", version);
        }
    }

    #[test]
    fn test_qr_start() {
        // v1: first codeword fills the two right columns from the bottom
        let (m, _) = log(Version::Qr(1));
        let first: Vec<u16> = (0..4)
            .flat_map(|r| [*m.get(20 - r, 20), *m.get(20 - r, 19)])
            .collect();
        assert_eq!(first, [1, 2, 3, 4, 5, 6, 7, 8]);
        // the column pair left of the timing pattern is 5 and 4
        assert!(*m.get(10, 5) > 0 && *m.get(10, 4) > 0);
        assert_eq!(*m.get(9, 6), 0);
    }

    #[test]
    fn test_micro_m1_layout() {
        // 20 data bits, the half codeword, then 16 check bits
        let (m, count) = log(Version::Micro(1));
        assert_eq!(count, 36);
        assert_eq!(*m.get(10, 10), 1);
        assert_eq!(*m.get(10, 9), 2);
        assert_eq!(*m.get(9, 10), 3);
        // upper end of the first column pair
        assert_eq!(*m.get(1, 10), 19);
        assert_eq!(*m.get(1, 9), 20);
        // the pair (8, 7) starts below the format information
        assert_eq!(*m.get(1, 8), 0);
        assert_eq!(*m.get(1, 7), 0);
        assert_eq!(*m.get(9, 8), 21);
    }

    #[test]
    fn test_rmqr_start() {
        let (m, _) = log(Version::Rmqr(crate::symbol_size::RmqrSize::R7x43));
        // the columns right of 35 hold the sub-finder, corner pattern and
        // format information, data starts left of the format area going down
        assert!((36..43).all(|j| (0..7).all(|i| m.is_reserved(i, j))));
        assert_eq!(*m.get(1, 34), 1);
        assert_eq!(*m.get(2, 34), 2);
        assert_eq!(*m.get(5, 34), 5);
        assert!(m.is_reserved(1, 35));
    }
}

#[test]
fn test_raw_roundtrip() {
    let map = MatrixMap::<bool>::new(Version::Micro(2));
    let bitmap = map.bitmap();
    let raw = bitmap.to_raw();
    assert_eq!(raw.len(), (13 * 13 + 7) / 8);
    // first row: finder followed by the timing pattern
    assert_eq!(raw[0], 0b1111_1110);
    assert_eq!(Bitmap::from_raw(13, 13, &raw), Some(bitmap));
    assert_eq!(Bitmap::<bool>::from_raw(13, 13, &raw[1..]), None);
}

#[test]
fn test_bitmap_access() {
    let mut bitmap = Bitmap::new(3, 2);
    bitmap.set(2, 1, true);
    bitmap.set(3, 0, true);
    assert_eq!(bitmap.get(2, 1), Some(&true));
    assert_eq!(bitmap.get(3, 0), None);
    assert_eq!(bitmap.pixels().collect::<Vec<_>>(), [(2, 1)]);
    assert_eq!(bitmap.height(), 2);
    let art = bitmap.unicode();
    assert_eq!(art.lines().count(), 3);
    assert!(art.contains('▄'));
}

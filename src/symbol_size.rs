use core::cmp::Ordering;
use core::fmt;
use core::iter::{Extend, FromIterator, IntoIterator};
use core::ops::RangeBounds;

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use arrayvec::ArrayVec;
use flagset::FlagSet;

use crate::encodation::Mode;

#[cfg(test)]
use alloc::vec;

#[cfg(test)]
use pretty_assertions::assert_eq;

type SymbolCollection = BTreeSet<Version>;

/// Error correction level.
///
/// A higher level trades capacity for robustness. Micro QR M1 only detects
/// errors and is addressed with [L](EcLevel::L), rMQR supports
/// [M](EcLevel::M) and [H](EcLevel::H) only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(test, derive(enum_iterator::Sequence))]
pub enum EcLevel {
    /// About 7% of the codewords can be restored.
    L,
    /// About 15% of the codewords can be restored.
    M,
    /// About 25% of the codewords can be restored.
    Q,
    /// About 30% of the codewords can be restored.
    H,
}

impl EcLevel {
    pub(crate) fn index(&self) -> usize {
        match self {
            Self::L => 0,
            Self::M => 1,
            Self::Q => 2,
            Self::H => 3,
        }
    }
}

/// The 32 rMQR (rectangular Micro QR) sizes, `R{height}x{width}`.
///
/// The declaration order is the size index stored in the symbol's format
/// information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(test, derive(enum_iterator::Sequence))]
pub enum RmqrSize {
    R7x43,
    R7x59,
    R7x77,
    R7x99,
    R7x139,
    R9x43,
    R9x59,
    R9x77,
    R9x99,
    R9x139,
    R11x27,
    R11x43,
    R11x59,
    R11x77,
    R11x99,
    R11x139,
    R13x27,
    R13x43,
    R13x59,
    R13x77,
    R13x99,
    R13x139,
    R15x43,
    R15x59,
    R15x77,
    R15x99,
    R15x139,
    R17x43,
    R17x59,
    R17x77,
    R17x99,
    R17x139,
}

#[rustfmt::skip]
const RMQR_SIZES: [RmqrSize; 32] = [
    RmqrSize::R7x43, RmqrSize::R7x59, RmqrSize::R7x77, RmqrSize::R7x99, RmqrSize::R7x139,
    RmqrSize::R9x43, RmqrSize::R9x59, RmqrSize::R9x77, RmqrSize::R9x99, RmqrSize::R9x139,
    RmqrSize::R11x27, RmqrSize::R11x43, RmqrSize::R11x59, RmqrSize::R11x77, RmqrSize::R11x99,
    RmqrSize::R11x139, RmqrSize::R13x27, RmqrSize::R13x43, RmqrSize::R13x59, RmqrSize::R13x77,
    RmqrSize::R13x99, RmqrSize::R13x139, RmqrSize::R15x43, RmqrSize::R15x59, RmqrSize::R15x77,
    RmqrSize::R15x99, RmqrSize::R15x139, RmqrSize::R17x43, RmqrSize::R17x59, RmqrSize::R17x77,
    RmqrSize::R17x99, RmqrSize::R17x139,
];

impl RmqrSize {
    /// Index between 0 and 31 used in the format information.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        RMQR_SIZES.get(i).copied()
    }

    pub fn height(&self) -> usize {
        match self.index() {
            0..=4 => 7,
            5..=9 => 9,
            10..=15 => 11,
            16..=21 => 13,
            22..=26 => 15,
            _ => 17,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Self::R11x27 | Self::R13x27 => 27,
            Self::R7x43 | Self::R9x43 | Self::R11x43 | Self::R13x43 | Self::R15x43 | Self::R17x43 => 43,
            Self::R7x59 | Self::R9x59 | Self::R11x59 | Self::R13x59 | Self::R15x59 | Self::R17x59 => 59,
            Self::R7x77 | Self::R9x77 | Self::R11x77 | Self::R13x77 | Self::R15x77 | Self::R17x77 => 77,
            Self::R7x99 | Self::R9x99 | Self::R11x99 | Self::R13x99 | Self::R15x99 | Self::R17x99 => 99,
            Self::R7x139
            | Self::R9x139
            | Self::R11x139
            | Self::R13x139
            | Self::R15x139
            | Self::R17x139 => 139,
        }
    }

    /// Columns of the vertical alignment patterns.
    pub(crate) fn alignment_columns(&self) -> &'static [usize] {
        match self.width() {
            43 => &[21],
            59 => &[19, 39],
            77 => &[25, 51],
            99 => &[23, 49, 75],
            139 => &[27, 55, 83, 111],
            _ => &[],
        }
    }
}

/// A symbol version, it determines the size and layout of a symbol.
///
/// - `Qr(1)` to `Qr(40)` are the QR Code versions 1 to 40 (21x21 to 177x177),
/// - `Micro(1)` to `Micro(4)` are the Micro QR versions M1 to M4 (11x11 to 17x17),
/// - `Rmqr(size)` are the rectangular Micro QR sizes.
///
/// Versions with a number outside of these ranges are invalid and
/// ignored by [SymbolList].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    Qr(u8),
    Micro(u8),
    Rmqr(RmqrSize),
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qr(v) => write!(f, "{}", v),
            Self::Micro(m) => write!(f, "M{}", m),
            Self::Rmqr(size) => write!(f, "R{}x{}", size.height(), size.width()),
        }
    }
}

impl Version {
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Qr(v) => (1..=40).contains(v),
            Self::Micro(m) => (1..=4).contains(m),
            Self::Rmqr(_) => true,
        }
    }

    /// All valid versions, QR first, then Micro QR, then rMQR.
    pub fn all() -> impl Iterator<Item = Version> {
        (1..=40)
            .map(Version::Qr)
            .chain((1..=4).map(Version::Micro))
            .chain(RMQR_SIZES.iter().copied().map(Version::Rmqr))
    }

    /// Number of modules in a row (no quiet zone).
    pub fn width(&self) -> usize {
        match self {
            Self::Qr(v) => *v as usize * 4 + 17,
            Self::Micro(m) => *m as usize * 2 + 9,
            Self::Rmqr(size) => size.width(),
        }
    }

    /// Number of modules in a column (no quiet zone).
    pub fn height(&self) -> usize {
        match self {
            Self::Rmqr(size) => size.height(),
            _ => self.width(),
        }
    }

    pub fn is_square(&self) -> bool {
        !matches!(self, Self::Rmqr(_))
    }

    /// Find the version for the size of a module grid.
    pub fn from_dimensions(width: usize, height: usize) -> Option<Self> {
        if width == height {
            Self::all()
                .filter(|v| v.is_square())
                .find(|v| v.width() == width)
        } else {
            RMQR_SIZES
                .iter()
                .find(|s| s.width() == width && s.height() == height)
                .map(|s| Self::Rmqr(*s))
        }
    }

    /// Is the error correction level available for this version?
    pub fn supports(&self, level: EcLevel) -> bool {
        match self {
            Self::Qr(_) => true,
            Self::Micro(1) => level == EcLevel::L,
            Self::Micro(2) | Self::Micro(3) => matches!(level, EcLevel::L | EcLevel::M),
            Self::Micro(_) => level != EcLevel::H,
            Self::Rmqr(_) => matches!(level, EcLevel::M | EcLevel::H),
        }
    }

    /// The character modes usable in this version.
    pub fn modes(&self) -> FlagSet<Mode> {
        match self {
            Self::Micro(1) => Mode::Numeric.into(),
            Self::Micro(2) => Mode::Numeric | Mode::Alphanumeric,
            _ => Mode::all(),
        }
    }

    /// Length of the mode indicator in bits.
    pub fn mode_indicator_len(&self) -> usize {
        match self {
            Self::Qr(_) => 4,
            Self::Micro(m) => *m as usize - 1,
            Self::Rmqr(_) => 3,
        }
    }

    /// Bits of the mode indicator, `None` if the mode is not available.
    pub fn mode_indicator(&self, mode: Mode) -> Option<u8> {
        if !self.modes().contains(mode) {
            return None;
        }
        Some(match self {
            Self::Qr(_) => match mode {
                Mode::Numeric => 0b0001,
                Mode::Alphanumeric => 0b0010,
                Mode::Bytes => 0b0100,
                Mode::Kanji => 0b1000,
            },
            Self::Micro(_) => mode.index() as u8,
            Self::Rmqr(_) => mode.index() as u8 + 1,
        })
    }

    /// Inverse of [mode_indicator](Self::mode_indicator).
    pub fn mode_from_indicator(&self, bits: u8) -> Option<Mode> {
        self.modes()
            .into_iter()
            .find(|m| self.mode_indicator(*m) == Some(bits))
    }

    /// Length of the terminator (all zero bits) in bits.
    pub fn terminator_len(&self) -> usize {
        match self {
            Self::Qr(_) => 4,
            Self::Micro(m) => *m as usize * 2 + 1,
            Self::Rmqr(_) => 3,
        }
    }

    /// Length of the character count indicator in bits.
    ///
    /// Returns 0 if the mode is not available.
    pub fn char_count_bits(&self, mode: Mode) -> usize {
        if !self.modes().contains(mode) {
            return 0;
        }
        let i = mode.index();
        let bits = match self {
            Self::Qr(1..=9) => [10, 9, 8, 8][i],
            Self::Qr(10..=26) => [12, 11, 16, 10][i],
            Self::Qr(_) => [14, 13, 16, 12][i],
            Self::Micro(m) => MICRO_CHAR_COUNT_BITS[(*m as usize).clamp(1, 4) - 1][i],
            Self::Rmqr(size) => RMQR_CHAR_COUNT_BITS[size.index()][i],
        };
        bits as usize
    }

    /// The largest character count which fits in the count indicator.
    pub(crate) fn max_char_count(&self, mode: Mode) -> usize {
        (1 << self.char_count_bits(mode)) - 1
    }

    /// The block structure for the level, `None` if the level is not supported.
    pub fn block_setup(&self, level: EcLevel) -> Option<BlockSetup> {
        if !self.is_valid() || !self.supports(level) {
            return None;
        }
        Some(match self {
            Self::Qr(v) => qr_block_setup(*v, level),
            Self::Micro(m) => micro_block_setup(*m, level),
            Self::Rmqr(size) => rmqr_block_setup(*size, level),
        })
    }

    /// The number of data bits available for the level.
    pub fn data_bits(&self, level: EcLevel) -> Option<usize> {
        self.block_setup(level).map(|s| s.data_bits)
    }

    /// M1 and M3 end their data part with a 4-bit codeword.
    pub fn has_half_codeword(&self, level: EcLevel) -> bool {
        self.data_bits(level).is_some_and(|bits| bits % 8 != 0)
    }

    /// The symbol number stored in the format information of Micro QR.
    pub(crate) fn micro_symbol_number(&self, level: EcLevel) -> Option<u8> {
        match (self, level) {
            (Self::Micro(1), EcLevel::L) => Some(0),
            (Self::Micro(2), EcLevel::L) => Some(1),
            (Self::Micro(2), EcLevel::M) => Some(2),
            (Self::Micro(3), EcLevel::L) => Some(3),
            (Self::Micro(3), EcLevel::M) => Some(4),
            (Self::Micro(4), EcLevel::L) => Some(5),
            (Self::Micro(4), EcLevel::M) => Some(6),
            (Self::Micro(4), EcLevel::Q) => Some(7),
            _ => None,
        }
    }

    pub(crate) fn from_micro_symbol_number(number: u8) -> Option<(Version, EcLevel)> {
        Some(match number {
            0 => (Self::Micro(1), EcLevel::L),
            1 => (Self::Micro(2), EcLevel::L),
            2 => (Self::Micro(2), EcLevel::M),
            3 => (Self::Micro(3), EcLevel::L),
            4 => (Self::Micro(3), EcLevel::M),
            5 => (Self::Micro(4), EcLevel::L),
            6 => (Self::Micro(4), EcLevel::M),
            7 => (Self::Micro(4), EcLevel::Q),
            _ => return None,
        })
    }

    /// Center coordinates of the QR alignment patterns (same for rows and columns).
    pub(crate) fn alignment_positions(&self) -> ArrayVec<usize, 7> {
        let mut out = ArrayVec::new();
        let v = match self {
            Self::Qr(v) if *v >= 2 => *v as usize,
            _ => return out,
        };
        let num = v / 7 + 2;
        let size = self.width();
        let step = (v * 8 + num * 3 + 5) / (num * 4 - 4) * 2;
        out.push(6);
        for i in (0..num - 1).rev() {
            out.push(size - 7 - i * step);
        }
        out
    }
}

/// A group of blocks with identical structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Number of blocks in this group.
    pub count: usize,
    /// Codewords per block, data and check codewords.
    pub total: usize,
    /// Data codewords per block.
    pub data: usize,
    /// The number of errors a block can correct.
    pub max_errors: usize,
}

/// Codeword structure of a symbol at some error correction level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSetup {
    /// Number of all codewords in the symbol.
    pub total_codewords: usize,
    /// Number of data codewords, a half codeword counts as one.
    pub data_codewords: usize,
    /// Number of data bits.
    pub data_bits: usize,
    /// Number of check codewords in every block.
    pub ecc_per_block: usize,
    /// Maximum number of errors corrected in a block.
    pub max_errors: usize,
    /// The block groups, shorter blocks first.
    pub blocks: ArrayVec<BlockDescriptor, 2>,
}

impl BlockSetup {
    fn new(total_codewords: usize, data_bits: usize, ecc_per_block: usize, max_errors: usize) -> Self {
        Self {
            total_codewords,
            data_codewords: (data_bits + 7) / 8,
            data_bits,
            ecc_per_block,
            max_errors,
            blocks: ArrayVec::new(),
        }
    }

    fn with_blocks(mut self, count: usize, data: usize) -> Self {
        if count > 0 {
            self.blocks.push(BlockDescriptor {
                count,
                total: data + self.ecc_per_block,
                data,
                max_errors: self.max_errors,
            });
        }
        self
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.iter().map(|b| b.count).sum()
    }

    /// Number of data codewords of every block in order.
    pub fn block_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks
            .iter()
            .flat_map(|b| core::iter::repeat(b.data).take(b.count))
    }
}

/// Number of check codewords per block for QR, indexed by level and version.
#[rustfmt::skip]
const QR_ECC_PER_BLOCK: [[u8; 41]; 4] = [
    [0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
    [0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28],
    [0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
    [0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
];

/// Number of blocks for QR, indexed by level and version.
#[rustfmt::skip]
const QR_NUM_BLOCKS: [[u8; 41]; 4] = [
    [0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12, 13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25],
    [0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21, 23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49],
    [0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68],
    [0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81],
];

/// Number of modules available for codewords in a QR symbol, including
/// the remainder bits.
fn qr_raw_data_modules(v: u8) -> usize {
    let v = v as usize;
    let mut modules = (16 * v + 128) * v + 64;
    if v >= 2 {
        let num_align = v / 7 + 2;
        modules -= (25 * num_align - 10) * num_align - 55;
        if v >= 7 {
            // version information
            modules -= 36;
        }
    }
    modules
}

/// Check codewords reserved for misdecode protection in small QR symbols.
fn qr_misdecode_protection(v: u8, level: EcLevel) -> usize {
    match (v, level) {
        (1, EcLevel::L) => 3,
        (1, EcLevel::M) | (2, EcLevel::L) => 2,
        (1, _) | (3, EcLevel::L) => 1,
        _ => 0,
    }
}

fn qr_block_setup(v: u8, level: EcLevel) -> BlockSetup {
    let total = qr_raw_data_modules(v) / 8;
    let ecc = QR_ECC_PER_BLOCK[level.index()][v as usize] as usize;
    let num_blocks = QR_NUM_BLOCKS[level.index()][v as usize] as usize;
    let num_long = total % num_blocks;
    let short_data = total / num_blocks - ecc;
    let data = total - ecc * num_blocks;
    let max_errors = (ecc - qr_misdecode_protection(v, level)) / 2;
    BlockSetup::new(total, data * 8, ecc, max_errors)
        .with_blocks(num_blocks - num_long, short_data)
        .with_blocks(num_long, short_data + 1)
}

fn micro_block_setup(m: u8, level: EcLevel) -> BlockSetup {
    // (total codewords, data bits, check codewords, correctable errors)
    let (total, data_bits, ecc, max_errors) = match (m, level) {
        (1, _) => (5, 20, 2, 0),
        (2, EcLevel::L) => (10, 40, 5, 1),
        (2, _) => (10, 32, 6, 2),
        (3, EcLevel::L) => (17, 84, 6, 2),
        (3, _) => (17, 68, 8, 4),
        (_, EcLevel::L) => (24, 128, 8, 3),
        (_, EcLevel::M) => (24, 112, 10, 5),
        (_, _) => (24, 80, 14, 7),
    };
    let setup = BlockSetup::new(total, data_bits, ecc, max_errors);
    let data = setup.data_codewords;
    setup.with_blocks(1, data)
}

/// rMQR blocks, for level M and H: (check codewords per block, [(block count, data per block); 2]).
#[rustfmt::skip]
const RMQR_BLOCKS: [[(u8, [(u8, u8); 2]); 2]; 32] = [
    // R7x43
    [(7, [(1, 6), (0, 0)]), (10, [(1, 3), (0, 0)])],
    // R7x59
    [(9, [(1, 12), (0, 0)]), (14, [(1, 7), (0, 0)])],
    // R7x77
    [(12, [(1, 20), (0, 0)]), (22, [(1, 10), (0, 0)])],
    // R7x99
    [(16, [(1, 28), (0, 0)]), (30, [(1, 14), (0, 0)])],
    // R7x139
    [(24, [(1, 44), (0, 0)]), (22, [(2, 12), (0, 0)])],
    // R9x43
    [(9, [(1, 12), (0, 0)]), (14, [(1, 7), (0, 0)])],
    // R9x59
    [(12, [(1, 21), (0, 0)]), (22, [(1, 11), (0, 0)])],
    // R9x77
    [(18, [(1, 31), (0, 0)]), (16, [(1, 8), (1, 9)])],
    // R9x99
    [(24, [(1, 42), (0, 0)]), (22, [(2, 11), (0, 0)])],
    // R9x139
    [(12, [(3, 21), (0, 0)]), (22, [(3, 11), (0, 0)])],
    // R11x27
    [(8, [(1, 7), (0, 0)]), (10, [(1, 5), (0, 0)])],
    // R11x43
    [(12, [(1, 19), (0, 0)]), (20, [(1, 11), (0, 0)])],
    // R11x59
    [(16, [(1, 31), (0, 0)]), (16, [(1, 7), (1, 8)])],
    // R11x77
    [(24, [(1, 43), (0, 0)]), (22, [(1, 11), (1, 12)])],
    // R11x99
    [(16, [(1, 28), (1, 29)]), (30, [(1, 14), (1, 15)])],
    // R11x139
    [(24, [(2, 42), (0, 0)]), (30, [(3, 14), (0, 0)])],
    // R13x27
    [(9, [(1, 12), (0, 0)]), (14, [(1, 7), (0, 0)])],
    // R13x43
    [(14, [(1, 27), (0, 0)]), (28, [(1, 13), (0, 0)])],
    // R13x59
    [(22, [(1, 38), (0, 0)]), (20, [(2, 10), (0, 0)])],
    // R13x77
    [(16, [(1, 26), (1, 27)]), (28, [(1, 14), (1, 15)])],
    // R13x99
    [(20, [(1, 36), (1, 37)]), (26, [(1, 11), (2, 12)])],
    // R13x139
    [(20, [(2, 35), (1, 36)]), (28, [(2, 13), (2, 14)])],
    // R15x43
    [(18, [(1, 33), (0, 0)]), (18, [(1, 7), (1, 8)])],
    // R15x59
    [(26, [(1, 48), (0, 0)]), (24, [(2, 13), (0, 0)])],
    // R15x77
    [(18, [(1, 33), (1, 34)]), (24, [(2, 10), (1, 11)])],
    // R15x99
    [(24, [(2, 44), (0, 0)]), (22, [(4, 12), (0, 0)])],
    // R15x139
    [(24, [(2, 42), (1, 43)]), (26, [(1, 13), (4, 14)])],
    // R17x43
    [(22, [(1, 39), (0, 0)]), (20, [(1, 10), (1, 11)])],
    // R17x59
    [(16, [(2, 28), (0, 0)]), (30, [(2, 14), (0, 0)])],
    // R17x77
    [(22, [(2, 39), (0, 0)]), (28, [(1, 12), (2, 13)])],
    // R17x99
    [(20, [(2, 33), (1, 34)]), (26, [(4, 14), (0, 0)])],
    // R17x139
    [(20, [(4, 38), (0, 0)]), (26, [(2, 12), (4, 13)])],
];

fn rmqr_block_setup(size: RmqrSize, level: EcLevel) -> BlockSetup {
    let (ecc, groups) = RMQR_BLOCKS[size.index()][if level == EcLevel::H { 1 } else { 0 }];
    let ecc = ecc as usize;
    let data: usize = groups.iter().map(|(n, d)| *n as usize * *d as usize).sum();
    let blocks: usize = groups.iter().map(|(n, _)| *n as usize).sum();
    let setup = BlockSetup::new(data + blocks * ecc, data * 8, ecc, ecc / 2);
    groups
        .iter()
        .fold(setup, |s, (n, d)| s.with_blocks(*n as usize, *d as usize))
}

const MICRO_CHAR_COUNT_BITS: [[u8; 4]; 4] = [[3, 0, 0, 0], [4, 3, 0, 0], [5, 4, 4, 3], [6, 5, 5, 4]];

#[rustfmt::skip]
const RMQR_CHAR_COUNT_BITS: [[u8; 4]; 32] = [
    [4, 3, 3, 2], [5, 5, 4, 3], [6, 5, 5, 4], [7, 6, 5, 5], [7, 6, 6, 5],
    [5, 5, 4, 3], [6, 5, 5, 4], [7, 6, 5, 5], [7, 6, 6, 5], [8, 7, 6, 6],
    [4, 4, 3, 2], [6, 5, 5, 4], [7, 6, 5, 5], [7, 6, 6, 5], [8, 7, 6, 6], [8, 7, 7, 6],
    [5, 5, 4, 3], [6, 6, 5, 5], [7, 6, 6, 5], [7, 7, 6, 6], [8, 7, 7, 6], [8, 8, 7, 7],
    [7, 6, 6, 5], [7, 7, 6, 5], [8, 7, 7, 6], [8, 7, 7, 6], [9, 8, 7, 7],
    [7, 6, 6, 5], [8, 7, 6, 6], [8, 7, 7, 6], [8, 8, 7, 6], [9, 8, 8, 7],
];

/// Order in which the encoder tries the allowed versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizePreference {
    /// Smallest number of modules first.
    #[default]
    Area,
    /// Smallest height first, then smallest width.
    HeightFirst,
    /// Smallest width first, then smallest height.
    WidthFirst,
}

impl SizePreference {
    fn compare(&self, a: &Version, b: &Version) -> Ordering {
        let key = |v: &Version| match self {
            Self::Area => (v.width() * v.height(), v.height()),
            Self::HeightFirst => (v.height(), v.width()),
            Self::WidthFirst => (v.width(), v.height()),
        };
        key(a).cmp(&key(b)).then(a.cmp(b))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Set of [versions](Version) the encoder is allowed to use.
///
/// The encoder picks the first version, in the order given by the
/// [SizePreference], which can hold the data.
///
/// By [default](SymbolList::default) all QR Code versions 1 to 40 are used.
/// The selection can be extended with Micro QR and rMQR, restricted to a
/// range of widths or heights, or given as an explicit list.
///
/// ## Examples
///
/// Use the rMQR sizes with a maximum height of 11 modules, narrow symbols first:
///
/// ```rust
/// # use qrmatrix::{SizePreference, SymbolList};
/// let symbols = SymbolList::rmqr()
///     .enforce_height_in(..=11)
///     .with_preference(SizePreference::WidthFirst);
/// assert!(symbols.iter().all(|v| v.height() <= 11));
/// ```
///
/// Because [Version] and `[Version; N]` implement `Into<SymbolList>` you can write
///
/// ```rust
/// # use qrmatrix::{EcLevel, MaskChoice, Version};
/// let code = qrmatrix::encode(b"0123", EcLevel::L, MaskChoice::Auto, Version::Micro(2)).unwrap();
/// assert_eq!(code.version(), Version::Micro(2));
/// ```
pub struct SymbolList {
    symbols: SymbolCollection,
    preference: SizePreference,
}

impl SymbolList {
    /// All QR Code versions.
    pub fn qr() -> Self {
        Self::with_whitelist((1..=40).map(Version::Qr))
    }

    /// All Micro QR versions.
    pub fn micro() -> Self {
        Self::with_whitelist((1..=4).map(Version::Micro))
    }

    /// All rMQR sizes.
    pub fn rmqr() -> Self {
        Self::with_whitelist(RMQR_SIZES.iter().copied().map(Version::Rmqr))
    }

    /// Get a list with all supported versions.
    pub fn all() -> Self {
        Self::with_whitelist(Version::all())
    }

    /// Create a symbol list containing only the given versions.
    ///
    /// Invalid versions are dropped.
    pub fn with_whitelist<I>(whitelist: I) -> Self
    where
        I: IntoIterator<Item = Version>,
    {
        Self::from_iter(whitelist)
    }

    /// Set the order in which versions are tried.
    pub fn with_preference(mut self, preference: SizePreference) -> Self {
        self.preference = preference;
        self
    }

    /// Remove all rectangular symbols from the current selection.
    pub fn enforce_square(mut self) -> Self {
        self.symbols.retain(|s| s.is_square());
        self
    }

    /// Remove all square symbols from the current selection.
    pub fn enforce_rectangular(mut self) -> Self {
        self.symbols.retain(|s| !s.is_square());
        self
    }

    /// Only keep symbols with width in the given range.
    pub fn enforce_width_in<R: RangeBounds<usize>>(mut self, bounds: R) -> Self {
        self.symbols.retain(|s| bounds.contains(&s.width()));
        self
    }

    /// Only keep symbols with height in the given range.
    pub fn enforce_height_in<R: RangeBounds<usize>>(mut self, bounds: R) -> Self {
        self.symbols.retain(|s| bounds.contains(&s.height()));
        self
    }

    /// Iterate the versions in the preferred order.
    pub fn iter(&self) -> impl Iterator<Item = Version> {
        let mut sorted: Vec<Version> = self.symbols.iter().copied().collect();
        sorted.sort_by(|a, b| self.preference.compare(a, b));
        sorted.into_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if a version is in this symbol list.
    pub fn contains(&self, version: &Version) -> bool {
        self.symbols.contains(version)
    }
}

impl IntoIterator for SymbolList {
    type Item = Version;
    type IntoIter = alloc::vec::IntoIter<Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter().collect::<Vec<_>>().into_iter()
    }
}

impl FromIterator<Version> for SymbolList {
    fn from_iter<T: IntoIterator<Item = Version>>(iter: T) -> Self {
        Self {
            symbols: iter.into_iter().filter(Version::is_valid).collect(),
            preference: SizePreference::default(),
        }
    }
}

impl Extend<Version> for SymbolList {
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = Version>,
    {
        self.symbols
            .extend(iter.into_iter().filter(Version::is_valid));
    }
}

impl Default for SymbolList {
    fn default() -> Self {
        Self::qr()
    }
}

impl From<Version> for SymbolList {
    fn from(version: Version) -> SymbolList {
        SymbolList::with_whitelist([version])
    }
}

impl<const N: usize> From<[Version; N]> for SymbolList {
    fn from(other: [Version; N]) -> SymbolList {
        SymbolList::with_whitelist(other)
    }
}

#[test]
fn test_block_setup_consistency() {
    for version in Version::all() {
        for level in enum_iterator::all::<EcLevel>() {
            let Some(setup) = version.block_setup(level) else {
                continue;
            };
            let total: usize = setup.blocks.iter().map(|b| b.count * b.total).sum();
            let data: usize = setup.blocks.iter().map(|b| b.count * b.data).sum();
            assert_eq!(total, setup.total_codewords, "{} {:?}", version, level);
            assert_eq!(data, setup.data_codewords, "{} {:?}", version, level);
            for b in &setup.blocks {
                assert_eq!(b.total - b.data, setup.ecc_per_block);
                assert!(2 * b.max_errors <= setup.ecc_per_block);
            }
            assert!(setup.data_bits <= setup.data_codewords * 8);
            assert!(setup.data_bits > setup.data_codewords * 8 - 8);
        }
    }
}

#[test]
fn test_qr_capacities() {
    // data codewords of QR from ISO 18004, table 7
    let expected = [(1, EcLevel::L, 19), (1, EcLevel::H, 9), (5, EcLevel::Q, 62), (10, EcLevel::M, 216), (40, EcLevel::L, 2956), (40, EcLevel::H, 1276)];
    for (v, level, data) in expected {
        assert_eq!(Version::Qr(v).block_setup(level).unwrap().data_codewords, data);
    }
    assert_eq!(Version::Qr(1).block_setup(EcLevel::L).unwrap().max_errors, 2);
    assert_eq!(Version::Qr(1).block_setup(EcLevel::M).unwrap().max_errors, 4);
    assert_eq!(Version::Qr(7).block_setup(EcLevel::L).unwrap().total_codewords, 196);
    assert_eq!(Version::Qr(40).block_setup(EcLevel::L).unwrap().total_codewords, 3706);
}

#[test]
fn test_micro_capacities() {
    let m1 = Version::Micro(1).block_setup(EcLevel::L).unwrap();
    assert_eq!((m1.data_bits, m1.data_codewords, m1.max_errors), (20, 3, 0));
    let m3 = Version::Micro(3).block_setup(EcLevel::M).unwrap();
    assert_eq!((m3.data_bits, m3.data_codewords, m3.ecc_per_block), (68, 9, 8));
    assert!(Version::Micro(1).block_setup(EcLevel::M).is_none());
    assert!(Version::Micro(4).block_setup(EcLevel::H).is_none());
    let m3l = Version::Micro(3).block_setup(EcLevel::L).unwrap();
    assert_eq!((m3l.data_bits, m3l.data_codewords), (84, 11));
    assert!(Version::Micro(1).has_half_codeword(EcLevel::L));
    assert!(Version::Micro(3).has_half_codeword(EcLevel::L));
    assert!(Version::Micro(3).has_half_codeword(EcLevel::M));
    assert!(!Version::Micro(2).has_half_codeword(EcLevel::L));
    assert!(!Version::Micro(4).has_half_codeword(EcLevel::M));
    assert!(!Version::Qr(1).has_half_codeword(EcLevel::L));
}

#[test]
fn test_rmqr_sizes() {
    for (i, size) in enum_iterator::all::<RmqrSize>().enumerate() {
        assert_eq!(size.index(), i);
        assert_eq!(RmqrSize::from_index(i), Some(size));
        let v = Version::Rmqr(size);
        assert_eq!(Version::from_dimensions(v.width(), v.height()), Some(v));
        assert!(v.block_setup(EcLevel::L).is_none());
        assert!(v.block_setup(EcLevel::M).is_some());
    }
    assert_eq!(RmqrSize::R13x77.height(), 13);
    assert_eq!(RmqrSize::R13x77.width(), 77);
    let setup = Version::Rmqr(RmqrSize::R17x139).block_setup(EcLevel::H).unwrap();
    assert_eq!(setup.total_codewords, 232);
    assert_eq!(setup.block_sizes().collect::<Vec<_>>(), [12, 12, 13, 13, 13, 13]);
}

#[test]
fn test_dimensions_distinguishable() {
    let sizes: Vec<_> = Version::all().map(|v| (v.width(), v.height())).collect();
    let n = sizes.len();
    assert_eq!(n, 40 + 4 + 32);
    assert_eq!(n, BTreeSet::from_iter(sizes).len());
    assert_eq!(Version::from_dimensions(21, 21), Some(Version::Qr(1)));
    assert_eq!(Version::from_dimensions(13, 13), Some(Version::Micro(2)));
    assert_eq!(Version::from_dimensions(22, 22), None);
}

#[test]
fn test_char_count_bits() {
    assert_eq!(Version::Qr(9).char_count_bits(Mode::Numeric), 10);
    assert_eq!(Version::Qr(10).char_count_bits(Mode::Bytes), 16);
    assert_eq!(Version::Qr(40).char_count_bits(Mode::Kanji), 12);
    assert_eq!(Version::Micro(1).char_count_bits(Mode::Numeric), 3);
    assert_eq!(Version::Micro(1).char_count_bits(Mode::Alphanumeric), 0);
    assert_eq!(Version::Micro(4).char_count_bits(Mode::Kanji), 4);
    assert_eq!(Version::Rmqr(RmqrSize::R7x43).char_count_bits(Mode::Kanji), 2);
    assert_eq!(Version::Rmqr(RmqrSize::R17x139).char_count_bits(Mode::Numeric), 9);
}

#[test]
fn test_mode_indicators() {
    for version in [Version::Qr(1), Version::Micro(4), Version::Rmqr(RmqrSize::R9x59)] {
        for mode in enum_iterator::all::<Mode>() {
            let bits = version.mode_indicator(mode).unwrap();
            assert!((bits as usize) < (1 << version.mode_indicator_len()));
            assert_eq!(version.mode_from_indicator(bits), Some(mode));
        }
    }
    assert_eq!(Version::Micro(2).mode_indicator(Mode::Bytes), None);
    assert_eq!(Version::Micro(1).mode_indicator_len(), 0);
    assert_eq!(Version::Micro(1).mode_from_indicator(0), Some(Mode::Numeric));
    assert_eq!(Version::Rmqr(RmqrSize::R7x43).mode_from_indicator(0), None);
}

#[test]
fn test_alignment_positions() {
    assert!(Version::Qr(1).alignment_positions().is_empty());
    assert_eq!(&Version::Qr(2).alignment_positions()[..], &[6, 18]);
    assert_eq!(&Version::Qr(7).alignment_positions()[..], &[6, 22, 38]);
    assert_eq!(&Version::Qr(32).alignment_positions()[..], &[6, 34, 60, 86, 112, 138]);
    assert_eq!(&Version::Qr(40).alignment_positions()[..], &[6, 30, 58, 86, 114, 142, 170]);
}

#[test]
fn test_symbol_list_order() {
    let all: Vec<Version> = SymbolList::all().iter().take(3).collect();
    assert_eq!(all, vec![Version::Micro(1), Version::Micro(2), Version::Micro(3)]);

    let rmqr: Vec<Version> = SymbolList::rmqr()
        .with_preference(SizePreference::HeightFirst)
        .iter()
        .take(2)
        .collect();
    assert_eq!(rmqr, vec![Version::Rmqr(RmqrSize::R7x43), Version::Rmqr(RmqrSize::R7x59)]);

    let rmqr: Vec<Version> = SymbolList::rmqr()
        .with_preference(SizePreference::WidthFirst)
        .iter()
        .take(2)
        .collect();
    assert_eq!(rmqr, vec![Version::Rmqr(RmqrSize::R11x27), Version::Rmqr(RmqrSize::R13x27)]);

    let by_area: Vec<Version> = SymbolList::rmqr().iter().take(2).collect();
    // 11x27 has fewer modules than 7x43
    assert_eq!(by_area, vec![Version::Rmqr(RmqrSize::R11x27), Version::Rmqr(RmqrSize::R7x43)]);
}

#[test]
fn test_symbol_list_filters() {
    let list = SymbolList::all().enforce_height_in(..=13).enforce_rectangular();
    assert!(list.iter().all(|v| !v.is_square() && v.height() <= 13));
    assert_eq!(list.len(), 22);
    let list = SymbolList::with_whitelist([Version::Qr(0), Version::Qr(41), Version::Micro(5)]);
    assert!(list.is_empty());
    assert_eq!(SymbolList::default().len(), 40);
    assert!(SymbolList::from(Version::Micro(3)).contains(&Version::Micro(3)));
}

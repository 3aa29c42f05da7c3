use flagset::{flags, FlagSet};

flags! {
    /// Character modes a segment can be encoded with.
    ///
    /// Each mode packs a restricted alphabet into fewer bits per character.
    /// A symbol can switch between modes any number of times, every switch
    /// costs a mode indicator and a character count.
    #[cfg_attr(test, derive(enum_iterator::Sequence))]
    pub enum Mode: u8 {
        /// Digits `0`-`9`, three digits in 10 bits.
        Numeric = 0b0001,
        /// `0`-`9`, `A`-`Z` and ` $%*+-./:`, two characters in 11 bits.
        Alphanumeric = 0b0010,
        /// Arbitrary bytes, 8 bits each.
        Bytes = 0b0100,
        /// Double-byte Shift JIS characters, 13 bits each.
        Kanji = 0b1000,
    }
}

impl Mode {
    /// Fixed index between 0 and 3, also the order used in all tables.
    pub fn index(&self) -> usize {
        match self {
            Self::Numeric => 0,
            Self::Alphanumeric => 1,
            Self::Bytes => 2,
            Self::Kanji => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Self::Numeric),
            1 => Some(Self::Alphanumeric),
            2 => Some(Self::Bytes),
            3 => Some(Self::Kanji),
            _ => None,
        }
    }

    /// Get flag set with all modes activated.
    pub fn all() -> FlagSet<Self> {
        FlagSet::full()
    }

    /// Number of input bytes one character of this mode consumes.
    pub(crate) fn bytes_per_char(&self) -> usize {
        match self {
            Self::Kanji => 2,
            _ => 1,
        }
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Numeric => "numeric",
            Self::Alphanumeric => "alphanumeric",
            Self::Bytes => "bytes",
            Self::Kanji => "kanji",
        })
    }
}

#[test]
fn test_index_roundtrip() {
    for mode in enum_iterator::all::<Mode>() {
        assert_eq!(Mode::from_index(mode.index()), Some(mode));
    }
    assert_eq!(Mode::from_index(4), None);
    assert_eq!(Mode::all().into_iter().count(), 4);
}

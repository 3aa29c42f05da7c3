use alloc::{string::String, vec::Vec};

use pretty_assertions::assert_eq;

use super::*;

/// "01234567" as 1-M with mask 2, the example of ISO 18004 annex I.
#[rustfmt::skip]
const ANNEX_SYMBOL: [u8; 56] = [
    0xfe, 0x5b, 0xfc, 0x13, 0xd0, 0x6e, 0xa0, 0xbb, 0x75, 0x85, 0xdb, 0xab, 0xae, 0xc1,
    0x45, 0x07, 0xfa, 0xaf, 0xe0, 0x13, 0x00, 0xbe, 0x4b, 0xe0, 0xad, 0x4b, 0x08, 0xd5,
    0x3e, 0x10, 0x83, 0xc1, 0xf9, 0x48, 0x00, 0x5f, 0x33, 0xf9, 0xac, 0x10, 0x57, 0xc5,
    0xba, 0x89, 0x65, 0xd6, 0x48, 0x2e, 0xad, 0x29, 0x04, 0x03, 0x6f, 0xef, 0x4a, 0x00,
];

/// "12345" as R7x43-M: data codewords 2A 3D AD 00 EC 11, check codewords
/// 40 38 29 3F 91 A1 19, format words 0x1FAB2 and 0x20A7B.
#[rustfmt::skip]
const RMQR_SYMBOL: [u8; 38] = [
    0xfe, 0xaa, 0xae, 0xaa, 0xaa, 0xf0, 0x4b, 0x0f, 0x59, 0x9b, 0x16, 0xea, 0xe4, 0x3c,
    0x1a, 0xff, 0xdd, 0x31, 0x88, 0xaf, 0x61, 0x1b, 0xa2, 0x7e, 0xfa, 0x29, 0x2b, 0x05,
    0xfe, 0x37, 0xe4, 0x74, 0x7f, 0xaa, 0xab, 0xaa, 0xaa, 0xf8,
];

fn levels(version: Version) -> impl Iterator<Item = EcLevel> {
    enum_iterator::all::<EcLevel>().filter(move |l| version.supports(*l))
}

#[test]
fn test_annex_symbol() {
    let code = encode(b"01234567", EcLevel::M, MaskChoice::Fixed(2), Version::Qr(1)).unwrap();
    assert_eq!(code.version(), Version::Qr(1));
    assert_eq!(code.bitmap().to_raw(), ANNEX_SYMBOL);

    let bitmap = Bitmap::from_raw(21, 21, &ANNEX_SYMBOL).unwrap();
    let decoded = decode(&bitmap).unwrap();
    assert_eq!(decoded.segments, [Segment::new(Mode::Numeric, "01234567")]);
    assert_eq!(decoded.ec_level, EcLevel::M);
    assert_eq!(decoded.mask, 2);
    assert_eq!(decoded.corrected, 0);
}

#[test]
fn test_rmqr_symbol() {
    let version = Version::Rmqr(RmqrSize::R7x43);
    let code = encode(b"12345", EcLevel::M, MaskChoice::Auto, version).unwrap();
    assert_eq!(code.bitmap().to_raw(), RMQR_SYMBOL);
    let rows: Vec<String> = (0..7)
        .map(|y| {
            (0..43)
                .map(|x| if *code.bitmap().get(x, y).unwrap() { '#' } else { '.' })
                .collect()
        })
        .collect();
    assert_eq!(
        rows,
        [
            "#######.#.#.#.#.#.#.###.#.#.#.#.#.#.#.#.###",
            "#.....#..#.##....####.#.##..##..##.##...#.#",
            "#.###.#.#.###..#....####.....##.#.#########",
            "#.###.#..##...##...#...#.#.####.##....#...#",
            "#.###.#...#..######.#####.#...#.#..#..#.#.#",
            "#.....#.########...##.######..#...###.#...#",
            "#######.#.#.#.#.#.#.###.#.#.#.#.#.#.#.#####",
        ]
    );

    let bitmap = Bitmap::from_raw(43, 7, &RMQR_SYMBOL).unwrap();
    let decoded = decode(&bitmap).unwrap();
    assert_eq!(decoded.segments, [Segment::new(Mode::Numeric, "12345")]);
    assert_eq!(decoded.version, version);
    assert_eq!(decoded.ec_level, EcLevel::M);
}

#[test]
fn test_roundtrip_all_versions() {
    for version in Version::all() {
        for level in levels(version) {
            let code = encode(b"12345", level, MaskChoice::Auto, version).unwrap();
            assert_eq!(code.version(), version);
            let bitmap = code.bitmap();
            assert_eq!((bitmap.width(), bitmap.height()), (version.width(), version.height()));
            let decoded = decode(bitmap).unwrap();
            assert_eq!(decoded.data(), b"12345", "{} {:?}", version, level);
            assert_eq!(decoded.version, version);
            assert_eq!(decoded.ec_level, level);
            assert_eq!(decoded.mask, code.mask());
        }
    }
}

#[test]
fn test_fixed_masks() {
    for version in [Version::Qr(2), Version::Qr(7), Version::Micro(3), Version::Micro(4)] {
        for mask in 0..placement::mask::num_masks(version) {
            let code = encode(b"MASK TEST 99", EcLevel::L, MaskChoice::Fixed(mask), version).unwrap();
            assert_eq!(code.mask(), mask);
            let decoded = decode(code.bitmap()).unwrap();
            assert_eq!(decoded.mask, mask);
            assert_eq!(decoded.data(), b"MASK TEST 99");
        }
    }
    assert_eq!(
        encode(b"1", EcLevel::L, MaskChoice::Fixed(4), Version::Micro(1)),
        Err(DataEncodingError::InvalidMask {
            mask: 4,
            version: Version::Micro(1)
        })
    );
    assert!(matches!(
        encode(b"1", EcLevel::M, MaskChoice::Fixed(1), SymbolList::rmqr()),
        Err(DataEncodingError::InvalidMask { mask: 1, .. })
    ));
}

#[test]
fn test_mixed_content() {
    let text = "Grüße aus 東京, Tel. 0123456789012345";
    for symbols in [SymbolList::qr(), SymbolList::rmqr(), SymbolList::all()] {
        let code = encode(text.as_bytes(), EcLevel::M, MaskChoice::Auto, symbols).unwrap();
        assert!(code.segments().len() > 1);
        let decoded = decode(code.bitmap()).unwrap();
        assert_eq!(decoded.to_text().unwrap(), text);
    }
}

#[test]
fn test_corrects_errors() {
    let data: Vec<u8> = (0..60u8).collect();
    let code = encode(&data, EcLevel::Q, MaskChoice::Auto, Version::Qr(5)).unwrap();
    let mut bitmap = code.into_bitmap();
    let n = bitmap.width();
    // the first codeword occupies the bottom right 2x4 modules
    for (x, y) in [(n - 1, n - 1), (n - 2, n - 2), (n - 1, n - 4)] {
        let dark = *bitmap.get(x, y).unwrap();
        bitmap.set(x, y, !dark);
    }
    // a format bit of the first copy
    let dark = *bitmap.get(8, 2).unwrap();
    bitmap.set(8, 2, !dark);
    let decoded = decode(&bitmap).unwrap();
    assert_eq!(decoded.data(), data);
    assert_eq!(decoded.corrected, 1);
}

#[test]
fn test_m3_half_codeword() {
    // 84 and 68 data bits, the check codewords follow the 4-bit codeword
    for level in [EcLevel::L, EcLevel::M] {
        assert!(Version::Micro(3).has_half_codeword(level));
        for mask in 0..4 {
            let code = encode(b"12345", level, MaskChoice::Fixed(mask), Version::Micro(3)).unwrap();
            let mut bitmap = code.into_bitmap();
            // the last module of the last check codeword
            let dark = *bitmap.get(1, 9).unwrap();
            bitmap.set(1, 9, !dark);
            let decoded = decode(&bitmap).unwrap();
            assert_eq!(decoded.data(), b"12345");
            assert_eq!(decoded.ec_level, level);
            assert_eq!(decoded.corrected, 1);
        }
    }
}

#[test]
fn test_m1_detects_errors() {
    let code = encode(b"123", EcLevel::L, MaskChoice::Auto, Version::Micro(1)).unwrap();
    let mut bitmap = code.into_bitmap();
    let dark = *bitmap.get(10, 10).unwrap();
    bitmap.set(10, 10, !dark);
    assert_eq!(
        decode(&bitmap),
        Err(DecodingError::ErrorCorrection(ErrorDecodingError::UncorrectableBlock(0)))
    );
}

#[test]
fn test_decoding_errors() {
    assert_eq!(
        decode(&Bitmap::new(20, 20)),
        Err(DecodingError::UnsupportedSize {
            width: 20,
            height: 20
        })
    );
    assert_eq!(decode(&Bitmap::new(21, 21)), Err(DecodingError::FormatNotFound));

    let code = encode(b"123", EcLevel::L, MaskChoice::Auto, Version::Qr(1)).unwrap();
    let mut bitmap = code.into_bitmap();
    // clear both copies of the format information, the all light word is
    // at least five bits away from every format word
    for k in 0..9 {
        bitmap.set(8, k, false);
        bitmap.set(k, 8, false);
        bitmap.set(20 - k, 8, false);
        if k < 7 {
            bitmap.set(8, 20 - k, false);
        }
    }
    assert_eq!(decode(&bitmap), Err(DecodingError::FormatNotFound));
}

#[test]
fn test_encode_segments() {
    let segments = [
        Segment::new(Mode::Alphanumeric, "ID:"),
        Segment::new(Mode::Numeric, "00042"),
    ];
    let code = encode_segments(&segments, EcLevel::L, MaskChoice::Auto, SymbolList::micro()).unwrap();
    assert_eq!(code.version(), Version::Micro(3));
    assert_eq!(code.segments(), segments);
    let decoded = decode(code.bitmap()).unwrap();
    assert_eq!(decoded.segments, segments);
    assert_eq!(decoded.to_text().unwrap(), "ID:00042");
}

#[test]
fn test_symbol_list_preference() {
    let data = b"0123456789";
    // M2-M holds only 32 data bits
    let code = encode(data, EcLevel::M, MaskChoice::Auto, SymbolList::all()).unwrap();
    assert_eq!(code.version(), Version::Micro(3));
    let wide = SymbolList::all()
        .enforce_rectangular()
        .with_preference(SizePreference::WidthFirst);
    let code = encode(data, EcLevel::M, MaskChoice::Auto, wide).unwrap();
    assert_eq!(code.version(), Version::Rmqr(RmqrSize::R11x27));
    assert_eq!(
        encode(data, EcLevel::M, MaskChoice::Auto, SymbolList::with_whitelist(core::iter::empty())),
        Err(DataEncodingError::EmptySymbolList)
    );
}

#[cfg(feature = "kanji_text")]
#[test]
fn test_kanji_text() {
    // Shift JIS for 点茗
    let data = [0x93, 0x5F, 0xE4, 0xAA];
    let code = encode(&data, EcLevel::L, MaskChoice::Auto, Version::Micro(3)).unwrap();
    assert_eq!(code.segments()[0].mode, Mode::Kanji);
    let decoded = decode(code.bitmap()).unwrap();
    assert_eq!(decoded.to_text().unwrap(), "点茗");
}

//! Cross checks with the `qrcode` crate.
use pretty_assertions::assert_eq;

use qrcode::canvas::{Canvas, MaskPattern};
use qrmatrix::{Bitmap, EcLevel, MaskChoice, SymbolList, Version};

fn to_bitmap(code: &qrcode::QrCode) -> Bitmap<bool> {
    colors_to_bitmap(&code.to_colors(), code.width())
}

fn colors_to_bitmap(colors: &[qrcode::Color], width: usize) -> Bitmap<bool> {
    let mut bitmap = Bitmap::new(width, width);
    for (idx, color) in colors.iter().enumerate() {
        bitmap.set(idx % width, idx / width, *color == qrcode::Color::Dark);
    }
    bitmap
}

fn their_level(level: EcLevel) -> qrcode::EcLevel {
    match level {
        EcLevel::L => qrcode::EcLevel::L,
        EcLevel::M => qrcode::EcLevel::M,
        EcLevel::Q => qrcode::EcLevel::Q,
        EcLevel::H => qrcode::EcLevel::H,
    }
}

const SAMPLES: [&[u8]; 5] = [
    b"0",
    b"31415926535897932384626433832795028841971",
    b"HELLO WORLD",
    b"https://example.com/path?q=1",
    b"mixed CONTENT 1234567890 with $%*+-./: symbols",
];

#[test]
fn decode_qr_symbols() {
    for data in SAMPLES {
        for level in [EcLevel::L, EcLevel::M, EcLevel::Q, EcLevel::H] {
            for v in [7, 12, 27] {
                let code =
                    qrcode::QrCode::with_version(data, qrcode::Version::Normal(v), their_level(level))
                        .unwrap();
                let decoded = qrmatrix::decode(&to_bitmap(&code)).unwrap();
                assert_eq!(decoded.data(), data);
                assert_eq!(decoded.version, Version::Qr(v as u8));
                assert_eq!(decoded.ec_level, level);
                assert_eq!(decoded.corrected, 0);
            }
        }
    }
}

const MICRO_LEVELS: [(i16, EcLevel); 8] = [
    (1, EcLevel::L),
    (2, EcLevel::L),
    (2, EcLevel::M),
    (3, EcLevel::L),
    (3, EcLevel::M),
    (4, EcLevel::L),
    (4, EcLevel::M),
    (4, EcLevel::Q),
];

/// Mask patterns in the order of the mask ids.
const PATTERNS: [MaskPattern; 8] = [
    MaskPattern::Checkerboard,
    MaskPattern::HorizontalLines,
    MaskPattern::VerticalLines,
    MaskPattern::DiagonalLines,
    MaskPattern::LargeCheckerboard,
    MaskPattern::Fields,
    MaskPattern::Diamonds,
    MaskPattern::Meadow,
];

const MICRO_PATTERNS: [MaskPattern; 4] = [
    MaskPattern::HorizontalLines,
    MaskPattern::LargeCheckerboard,
    MaskPattern::Diamonds,
    MaskPattern::Meadow,
];

/// Build a symbol with `qrcode`'s low level API and a fixed mask.
fn their_symbol(data: &[u8], version: qrcode::Version, level: EcLevel, mask: MaskPattern) -> Bitmap<bool> {
    let ec = their_level(level);
    let mut bits = qrcode::bits::Bits::new(version);
    bits.push_optimal_data(data).unwrap();
    bits.push_terminator(ec).unwrap();
    let (data_codewords, ecc) = qrcode::ec::construct_codewords(&bits.into_bytes(), version, ec).unwrap();
    let mut canvas = Canvas::new(version, ec);
    canvas.draw_all_functional_patterns();
    canvas.draw_data(&data_codewords, &ecc);
    canvas.apply_mask(mask);
    let width = version.width() as usize;
    colors_to_bitmap(&canvas.into_colors(), width)
}

#[test]
fn decode_micro_symbols() {
    for data in [&b"0123"[..], b"12AB", b"A1"] {
        for (m, level) in MICRO_LEVELS {
            if m == 1 && !data.iter().all(u8::is_ascii_digit) {
                continue;
            }
            let code =
                qrcode::QrCode::with_version(data, qrcode::Version::Micro(m), their_level(level))
                    .unwrap();
            let decoded = qrmatrix::decode(&to_bitmap(&code)).unwrap();
            assert_eq!(decoded.data(), data);
            assert_eq!(decoded.version, Version::Micro(m as u8));
            assert_eq!(decoded.ec_level, level);
        }
    }
}

#[test]
fn never_larger_than_qrcode() {
    for data in SAMPLES {
        for level in [EcLevel::L, EcLevel::M, EcLevel::Q, EcLevel::H] {
            let theirs = qrcode::QrCode::with_error_correction_level(data, their_level(level)).unwrap();
            let qrcode::Version::Normal(v) = theirs.version() else {
                panic!("unexpected version");
            };
            let ours = qrmatrix::encode(data, level, MaskChoice::Auto, SymbolList::qr()).unwrap();
            let Version::Qr(our_v) = ours.version() else {
                panic!("unexpected version");
            };
            assert!(our_v as i16 <= v, "{:?} {:?}", data, level);
            assert_eq!(ours.bitmap().width(), 17 + 4 * our_v as usize);
        }
    }
}

#[test]
fn micro_placement_matches() {
    for (m, level) in MICRO_LEVELS {
        // single segment data, both planners agree on the mode
        let data: &[u8] = match (m, level) {
            (1, _) => b"01234",
            (2, EcLevel::L) => b"0123456789",
            (2, _) => b"012345",
            (3, _) => b"ABCDEF",
            _ => b"HELLO WORLD",
        };
        for mask in 0..4u8 {
            let version = Version::Micro(m as u8);
            let ours = qrmatrix::encode(data, level, MaskChoice::Fixed(mask), version).unwrap();
            let theirs = their_symbol(data, qrcode::Version::Micro(m), level, MICRO_PATTERNS[mask as usize]);
            assert_eq!(ours.bitmap(), &theirs, "M{} {:?} mask {}", m, level, mask);
        }
    }
}

#[test]
fn qr_placement_matches() {
    for (v, level) in [(1, EcLevel::M), (5, EcLevel::Q), (7, EcLevel::L), (14, EcLevel::H)] {
        for mask in 0..8u8 {
            let data = b"31415926535897932384626433832795";
            let ours = qrmatrix::encode(data, level, MaskChoice::Fixed(mask), Version::Qr(v as u8)).unwrap();
            let theirs = their_symbol(data, qrcode::Version::Normal(v), level, PATTERNS[mask as usize]);
            assert_eq!(ours.bitmap(), &theirs, "{} {:?} mask {}", v, level, mask);
        }
    }
}

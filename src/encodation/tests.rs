use alloc::vec::Vec;

use pretty_assertions::assert_eq;

use super::*;
use crate::symbol_size::RmqrSize;

fn written_len(segment: &Segment, version: Version) -> usize {
    let mut buf = BitBuffer::new();
    segment.write(version, &mut buf).unwrap();
    buf.len()
}

#[test]
fn test_numeric_codewords() {
    // ISO 18004, annex I
    let encoded = encode_data(b"01234567", EcLevel::M, &Version::Qr(1).into()).unwrap();
    assert_eq!(encoded.version, Version::Qr(1));
    assert_eq!(
        encoded.codewords,
        [0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11]
    );
}

#[test]
fn test_alphanumeric_bits() {
    let seg = Segment::new(Mode::Alphanumeric, "AC-42");
    let mut buf = BitBuffer::new();
    seg.write(Version::Qr(1), &mut buf).unwrap();
    let mut expected = BitBuffer::new();
    expected.write_bits(0b0010, 4);
    expected.write_bits(5, 9);
    expected.write_bits(10 * 45 + 12, 11);
    expected.write_bits(41 * 45 + 4, 11);
    expected.write_bits(2, 6);
    assert_eq!(buf, expected);
}

#[test]
fn test_encoded_len_matches_written() {
    let segments = [
        Segment::new(Mode::Numeric, ""),
        Segment::new(Mode::Numeric, "1"),
        Segment::new(Mode::Numeric, "12"),
        Segment::new(Mode::Numeric, "1234"),
        Segment::new(Mode::Alphanumeric, "A"),
        Segment::new(Mode::Alphanumeric, "AB CD"),
        Segment::new(Mode::Bytes, [0u8, 255, 17]),
        Segment::new(Mode::Kanji, [0x93, 0x5F, 0xE4, 0xAA]),
    ];
    let versions = [
        Version::Qr(1),
        Version::Qr(26),
        Version::Qr(40),
        Version::Micro(4),
        Version::Rmqr(RmqrSize::R7x43),
        Version::Rmqr(RmqrSize::R17x139),
    ];
    for version in versions {
        for seg in &segments {
            assert_eq!(written_len(seg, version), seg.encoded_len(version), "{:?}", seg);
        }
    }
}

#[test]
fn test_micro_half_codeword() {
    let setup = Version::Micro(1).block_setup(EcLevel::L).unwrap();
    let seg = [Segment::new(Mode::Numeric, "12345")];
    assert_eq!(
        segments_to_codewords(&seg, Version::Micro(1), &setup).unwrap(),
        [0xA3, 0xDA, 0xD0]
    );
    let seg = [Segment::new(Mode::Numeric, "1")];
    assert_eq!(
        segments_to_codewords(&seg, Version::Micro(1), &setup).unwrap(),
        [0x22, 0x00, 0x00]
    );
    let setup = Version::Micro(3).block_setup(EcLevel::M).unwrap();
    assert_eq!(
        segments_to_codewords(&[], Version::Micro(3), &setup).unwrap(),
        [0x00, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x00]
    );
}

#[test]
fn test_validate() {
    assert_eq!(Segment::new(Mode::Numeric, "0123").validate(), Ok(()));
    assert_eq!(
        Segment::new(Mode::Numeric, "01x3").validate(),
        Err(DataEncodingError::InvalidCharacter {
            mode: Mode::Numeric,
            position: 2,
            byte: b'x'
        })
    );
    assert_eq!(
        Segment::new(Mode::Alphanumeric, "ab").validate(),
        Err(DataEncodingError::InvalidCharacter {
            mode: Mode::Alphanumeric,
            position: 0,
            byte: b'a'
        })
    );
    assert_eq!(
        Segment::new(Mode::Kanji, [0x93, 0x5F, 0x93]).validate(),
        Err(DataEncodingError::InvalidCharacter {
            mode: Mode::Kanji,
            position: 2,
            byte: 0x93
        })
    );
    assert_eq!(Segment::new(Mode::Bytes, [0, 1, 2]).validate(), Ok(()));
}

#[test]
fn test_picks_first_fitting_version() {
    let data = [b'a'; 20];
    let encoded = encode_data(&data, EcLevel::L, &SymbolList::default()).unwrap();
    // 1-L has 19 data codewords, 2-L 34
    assert_eq!(encoded.version, Version::Qr(2));

    let encoded = encode_data(b"123", EcLevel::L, &SymbolList::all()).unwrap();
    assert_eq!(encoded.version, Version::Micro(1));

    let encoded = encode_data(b"123", EcLevel::M, &SymbolList::all()).unwrap();
    assert_eq!(encoded.version, Version::Micro(2));
}

#[test]
fn test_encoding_errors() {
    let data = [b'a'; 3000];
    assert_eq!(
        encode_data(&data, EcLevel::L, &SymbolList::default()),
        Err(DataEncodingError::DataTooLarge)
    );
    assert_eq!(
        encode_data(b"1", EcLevel::L, &SymbolList::with_whitelist([])),
        Err(DataEncodingError::EmptySymbolList)
    );
    assert_eq!(
        encode_data(b"1", EcLevel::L, &SymbolList::rmqr()),
        Err(DataEncodingError::UnsupportedLevel(EcLevel::L))
    );
    assert_eq!(
        encode_data(b"a", EcLevel::L, &SymbolList::from(Version::Micro(2))),
        Err(DataEncodingError::InvalidCharacter {
            mode: Mode::Alphanumeric,
            position: 0,
            byte: b'a'
        })
    );
}

#[test]
fn test_encode_given_segments() {
    let segments = [Segment::new(Mode::Bytes, "ab")];
    assert_eq!(
        encode_segments(&segments, EcLevel::L, &Version::Micro(2).into()),
        Err(DataEncodingError::UnsupportedMode {
            mode: Mode::Bytes,
            version: Version::Micro(2)
        })
    );
    let encoded = encode_segments(&segments, EcLevel::L, &SymbolList::all()).unwrap();
    assert_eq!(encoded.version, Version::Micro(3));

    let bad = [Segment::new(Mode::Numeric, "1a")];
    assert!(matches!(
        encode_segments(&bad, EcLevel::L, &SymbolList::all()),
        Err(DataEncodingError::InvalidCharacter { position: 1, .. })
    ));
}

#[test]
fn test_split_long_segments() {
    let digits: Vec<u8> = (0..20).map(|i| b'0' + i % 10).collect();
    let split = split_long_segments(
        alloc::vec![Segment::new(Mode::Numeric, digits.clone())],
        Version::Micro(2),
    );
    assert_eq!(split.len(), 2);
    assert_eq!(split[0].data, &digits[..15]);
    assert_eq!(split[1].data, &digits[15..]);
}

//! Reed-Solomon error correction codes.
//!
//! All symbols of the QR family protect their data with Reed-Solomon codes
//! over GF(256) (see [galois](self::galois)). The data codewords are split
//! into one or more blocks, for every block `n` check codewords are computed
//! as the remainder of a polynomial division by the generator polynomial
//!
//! > g(x) = (x - α^0)(x - α^1)···(x - α^(n-1)).
//!
//! The blocks are then interleaved codeword by codeword, first all data
//! codewords, then all check codewords.
//!
//! Decoding is done with the classical syndrome based approach:
//!
//! 1. Compute the syndromes, the received word evaluated at α^i.
//! 2. Compute the error locator and evaluator polynomials with the
//!    extended Euclidean algorithm.
//! 3. Find the error locations by trying all field elements (Chien search).
//! 4. Compute the error values with Forney's formula.
mod decoding;
mod galois;
mod poly;

use alloc::vec::Vec;

use arrayvec::ArrayVec;

use crate::symbol_size::BlockSetup;
pub use galois::GF;

pub use decoding::decode_block;

#[cfg(test)]
use pretty_assertions::assert_eq;

/// Error in the finite field arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GaloisError {
    #[error("division by zero in GF(256)")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorDecodingError {
    #[error(transparent)]
    Field(#[from] GaloisError),
    /// The locator polynomial found has no constant term.
    #[error("error locator has no constant term")]
    NoSolution,
    /// More errors than the block can correct.
    #[error("too many errors in block {0}")]
    UncorrectableBlock(usize),
}

/// The maximum number of check codewords per block used by any symbol.
const MAX_ECC_PER_BLOCK: usize = 30;

type Generator = ArrayVec<GF, { MAX_ECC_PER_BLOCK + 1 }>;

/// Compute the generator polynomial with `len` roots α^0, ..., α^(len-1).
///
/// The coefficients are returned highest degree first, the leading
/// coefficient is always 1.
fn generator(len: usize) -> Generator {
    debug_assert!(len <= MAX_ECC_PER_BLOCK);
    let mut g = Generator::new();
    g.push(GF::ONE);
    for i in 0..len {
        // multiply by (x - α^i)
        let root = GF::primitive_power(i);
        g.push(GF::ZERO);
        for j in (1..g.len()).rev() {
            let prev = g[j - 1];
            g[j] += prev * root;
        }
    }
    g
}

fn ecc_block(data: &[u8], g: &[GF], ecc: &mut [u8]) {
    // With the data polynomial d (highest coefficient first) and the
    // generator g of degree k we compute the remainder r of d(x)·x^k divided
    // by g. Then d(x)·x^k - r(x) = d(x)·x^k + r(x) is divisible by g and
    // the coefficients of r are the check codewords. The quotient is never
    // stored, `ecc` holds the running remainder.
    let ecc_len = g.len() - 1;
    debug_assert_eq!(ecc.len(), ecc_len);
    ecc.fill(0);
    for a in data {
        let k = GF(ecc[0]) + GF(*a);
        for j in 0..ecc_len - 1 {
            ecc[j] = (GF(ecc[j + 1]) + k * g[j + 1]).into();
        }
        ecc[ecc_len - 1] = (k * g[ecc_len]).into();
    }
}

/// Compute the `ecc_len` Reed-Solomon check codewords for a single block.
pub fn encode_block(data: &[u8], ecc_len: usize) -> Vec<u8> {
    let g = generator(ecc_len);
    let mut ecc = alloc::vec![0; ecc_len];
    ecc_block(data, &g, &mut ecc);
    ecc
}

/// Split the data codewords into blocks, compute the check codewords
/// and return all codewords in interleaved order.
///
/// The half codeword of M1 and M3 symbols is expected in the high nibble
/// of the last data codeword.
pub fn encode_error(data: &[u8], setup: &BlockSetup) -> Vec<u8> {
    debug_assert_eq!(data.len(), setup.data_codewords);
    let g = generator(setup.ecc_per_block);

    let mut blocks: Vec<(&[u8], Vec<u8>)> = Vec::with_capacity(setup.num_blocks());
    let mut rest = data;
    for size in setup.block_sizes() {
        let (block, tail) = rest.split_at(size);
        rest = tail;
        let mut ecc = alloc::vec![0; setup.ecc_per_block];
        ecc_block(block, &g, &mut ecc);
        blocks.push((block, ecc));
    }

    let mut out = Vec::with_capacity(setup.total_codewords);
    let longest = blocks.iter().map(|b| b.0.len()).max().unwrap_or(0);
    for i in 0..longest {
        out.extend(blocks.iter().filter_map(|b| b.0.get(i)));
    }
    for i in 0..setup.ecc_per_block {
        out.extend(blocks.iter().map(|b| b.1[i]));
    }
    out
}

/// Result of [decode_error].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corrected {
    /// The data codewords in block order.
    pub data: Vec<u8>,
    /// Number of codewords which were changed.
    pub errors: usize,
}

/// De-interleave the codewords read from a symbol and correct every block.
///
/// `codewords` must contain all data and check codewords in the interleaved
/// order produced by [encode_error].
pub fn decode_error(codewords: &[u8], setup: &BlockSetup) -> Result<Corrected, ErrorDecodingError> {
    debug_assert_eq!(codewords.len(), setup.total_codewords);
    let sizes: Vec<usize> = setup.block_sizes().collect();
    let mut blocks: Vec<Vec<u8>> = sizes
        .iter()
        .map(|s| Vec::with_capacity(s + setup.ecc_per_block))
        .collect();

    let mut input = codewords.iter();
    let longest = sizes.iter().copied().max().unwrap_or(0);
    for i in 0..longest {
        for (block, size) in blocks.iter_mut().zip(&sizes) {
            if i < *size {
                block.extend(input.next());
            }
        }
    }
    for _ in 0..setup.ecc_per_block {
        for block in blocks.iter_mut() {
            block.extend(input.next());
        }
    }

    let mut data = Vec::with_capacity(setup.data_codewords);
    let mut errors = 0;
    for (i, (block, size)) in blocks.iter_mut().zip(&sizes).enumerate() {
        let corrected = decode_block(block, setup.ecc_per_block, setup.max_errors)
            .map_err(|e| match e {
                ErrorDecodingError::UncorrectableBlock(_) => ErrorDecodingError::UncorrectableBlock(i),
                other => other,
            })?;
        tracing::trace!(block = i, corrected, "block decoded");
        if corrected > 0 {
            tracing::debug!(block = i, corrected, "corrected codewords");
        }
        errors += corrected;
        data.extend_from_slice(&block[..*size]);
    }
    Ok(Corrected { data, errors })
}

#[test]
fn test_generator() {
    let g: Vec<u8> = generator(7).into_iter().map(u8::from).collect();
    assert_eq!(g, [1, 127, 122, 154, 164, 11, 68, 117]);
    let g: Vec<u8> = generator(2).into_iter().map(u8::from).collect();
    assert_eq!(g, [1, 3, 2]);
}

#[test]
fn test_ecc_block() {
    let data = b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11";
    assert_eq!(encode_block(data, 10), b"\xc4#'w\xeb\xd7\xe7\xe2]\x17");

    let data = [
        0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC,
        0x11,
    ];
    assert_eq!(
        encode_block(&data, 10),
        [0xA5, 0x24, 0xD4, 0xC1, 0xED, 0x36, 0xC7, 0x87, 0x2C, 0x55]
    );
}

#[test]
fn test_encode_is_codeword() {
    // every codeword evaluates to zero at the roots of the generator
    let data: Vec<u8> = (0..40u8).map(|i| i.wrapping_mul(37)).collect();
    let mut cw = data.clone();
    cw.extend(encode_block(&data, 18));
    let p = poly::Poly::new(cw.iter().map(|x| GF(*x)).collect());
    for i in 0..18 {
        assert_eq!(p.evaluate(GF::primitive_power(i)), GF::ZERO);
    }
}

#[test]
fn test_interleave_uneven_blocks() {
    use crate::symbol_size::{EcLevel, Version};

    // 5-Q: 2 blocks with 15 and 2 blocks with 16 data codewords
    let setup = Version::Qr(5).block_setup(EcLevel::Q).unwrap();
    assert_eq!(setup.block_sizes().collect::<Vec<_>>(), [15, 15, 16, 16]);
    let data: Vec<u8> = (0..setup.data_codewords as u8).collect();
    let all = encode_error(&data, &setup);
    assert_eq!(all.len(), setup.total_codewords);
    assert_eq!(&all[..8], &[0, 15, 30, 46, 1, 16, 31, 47]);
    // the last data codewords only exist in the long blocks
    assert_eq!(&all[60..62], &[45, 61]);

    let decoded = decode_error(&all, &setup).unwrap();
    assert_eq!(decoded.data, data);
    assert_eq!(decoded.errors, 0);
}

#[test]
fn test_decode_error_reports_block() {
    use crate::symbol_size::{EcLevel, Version};

    let setup = Version::Qr(5).block_setup(EcLevel::Q).unwrap();
    let data: Vec<u8> = (0..setup.data_codewords as u8).collect();
    let mut all = encode_error(&data, &setup);
    // corrupt two codewords of block 1 (data index 1, 5, ...)
    all[1] ^= 0xFF;
    all[5] ^= 0x0F;
    let decoded = decode_error(&all, &setup).unwrap();
    assert_eq!(decoded.data, data);
    assert_eq!(decoded.errors, 2);

    // 5-Q blocks correct 9 errors, break 12 codewords of the third block
    let mut all = encode_error(&data, &setup);
    for k in 0..12 {
        all[2 + 4 * k] ^= 0x5A;
    }
    assert_eq!(
        decode_error(&all, &setup),
        Err(ErrorDecodingError::UncorrectableBlock(2))
    );
}

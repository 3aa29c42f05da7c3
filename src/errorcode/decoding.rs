use alloc::vec::Vec;

use super::galois::GF;
use super::poly::{divide_extended, Poly};
use super::ErrorDecodingError;

#[cfg(test)]
use alloc::vec;
#[cfg(test)]
use pretty_assertions::assert_eq;

/// Evaluate the received word at α^0, ..., α^(n-1).
///
/// Returns `true` if any syndrome is non-zero.
fn syndromes(received: &Poly, out: &mut [GF]) -> bool {
    let mut errors = false;
    for (o, alpha) in out.iter_mut().zip(GF::primitive_powers()) {
        *o = received.evaluate(alpha);
        errors = errors || !o.is_zero();
    }
    errors
}

/// Find the error locations X_k, the reciprocals of the locator's roots.
fn chien_search(locator: &Poly) -> Result<Vec<GF>, ErrorDecodingError> {
    let mut locations = Vec::with_capacity(locator.degree());
    for x in 1..=255u8 {
        let x = GF(x);
        if locator.evaluate(x).is_zero() {
            locations.push(x.inverse()?);
        }
    }
    Ok(locations)
}

/// Correct a single block in place.
///
/// `block` contains the data codewords followed by `ecc_len` check
/// codewords. At most `max_errors` errors are corrected, a `max_errors` of
/// zero only detects errors. Returns the number of corrected codewords.
pub fn decode_block(block: &mut [u8], ecc_len: usize, max_errors: usize) -> Result<usize, ErrorDecodingError> {
    let received = Poly::new(block.iter().map(|c| GF(*c)).collect());
    let mut syn = alloc::vec![GF::ZERO; ecc_len];
    if !syndromes(&received, &mut syn) {
        return Ok(0);
    }
    if max_errors == 0 {
        return Err(ErrorDecodingError::UncorrectableBlock(0));
    }

    // S(x) = S_0 + S_1 x + ... + S_(2t-1) x^(2t-1)
    let two_t = (2 * max_errors).min(ecc_len);
    let s = Poly::new(syn[..two_t].iter().rev().cloned().collect());
    let (sigma, omega) = divide_extended(&Poly::monomial(two_t, GF::ONE), &s, two_t / 2)
        .map_err(|e| match e {
            ErrorDecodingError::NoSolution => ErrorDecodingError::UncorrectableBlock(0),
            other => other,
        })?;

    let locations = chien_search(&sigma)?;
    if locations.len() != sigma.degree() || locations.len() > max_errors {
        return Err(ErrorDecodingError::UncorrectableBlock(0));
    }

    let sigma_prime = sigma.derivative();
    for x in locations.iter().copied() {
        let x_inv = x.inverse()?;
        let denominator = sigma_prime.evaluate(x_inv);
        let magnitude = (x * omega.evaluate(x_inv))
            .checked_div(denominator)
            .map_err(|_| ErrorDecodingError::UncorrectableBlock(0))?;
        let power = x.log()?;
        if power >= block.len() {
            return Err(ErrorDecodingError::UncorrectableBlock(0));
        }
        let pos = block.len() - 1 - power;
        block[pos] ^= u8::from(magnitude);
    }

    // the remaining check codewords must agree as well
    let fixed = Poly::new(block.iter().map(|c| GF(*c)).collect());
    if syndromes(&fixed, &mut syn) {
        return Err(ErrorDecodingError::UncorrectableBlock(0));
    }
    Ok(locations.len())
}

#[cfg(test)]
fn codeword(data: &[u8], ecc_len: usize) -> Vec<u8> {
    let mut cw = data.to_vec();
    cw.extend(super::encode_block(data, ecc_len));
    cw
}

#[test]
fn test_no_errors() {
    let mut cw = codeword(b"hello world", 10);
    let orig = cw.clone();
    assert_eq!(decode_block(&mut cw, 10, 5), Ok(0));
    assert_eq!(cw, orig);
}

#[test]
fn test_corrects_up_to_max_errors() {
    let data: Vec<u8> = (0..26u8).map(|i| i.wrapping_mul(71).wrapping_add(3)).collect();
    for ecc_len in [7, 10, 13, 17, 22, 26, 30] {
        let orig = codeword(&data, ecc_len);
        let t = ecc_len / 2;
        for k in 0..=t {
            let mut received = orig.clone();
            for e in 0..k {
                let pos = e * received.len() / (t + 1);
                received[pos] ^= (e as u8).wrapping_mul(29).wrapping_add(1);
            }
            assert_eq!(
                decode_block(&mut received, ecc_len, t),
                Ok(k),
                "{} errors with {} check codewords",
                k,
                ecc_len
            );
            assert_eq!(received, orig);
        }
    }
}

#[test]
fn test_errors_in_check_codewords() {
    let data = b"0123456789";
    let orig = codeword(data, 10);
    let mut received = orig.clone();
    let n = received.len();
    received[n - 1] ^= 0x80;
    received[n - 10] ^= 0x01;
    assert_eq!(decode_block(&mut received, 10, 5), Ok(2));
    assert_eq!(received, orig);
}

#[test]
fn test_detection_only() {
    let mut cw = codeword(&[0x40, 0x18, 0xAC], 2);
    assert_eq!(decode_block(&mut cw.clone(), 2, 0), Ok(0));
    cw[1] ^= 4;
    assert_eq!(
        decode_block(&mut cw, 2, 0),
        Err(ErrorDecodingError::UncorrectableBlock(0))
    );
}

#[test]
fn test_reduced_capacity() {
    // with misdecode protection only 2 of the 3 correctable errors are accepted
    let data = vec![7u8; 19];
    let orig = codeword(&data, 7);
    let mut received = orig.clone();
    received[0] ^= 1;
    received[3] ^= 2;
    assert_eq!(decode_block(&mut received, 7, 2), Ok(2));
    assert_eq!(received, orig);
}

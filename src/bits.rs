//! Bit sequences packed into bytes.
//!
//! Every bit stream in a symbol, the data segments as well as the codeword
//! stream written into the module grid, uses the same convention: bits are
//! packed most significant bit first into bytes.
use alloc::vec::Vec;

#[cfg(test)]
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BitBufferError {
    #[error("read past the end of the bit buffer")]
    BufferExhausted,
}

/// Growable bit sequence with independent read position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    len: usize,
    read: usize,
}

impl BitBuffer {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity((bits + 7) / 8),
            len: 0,
            read: 0,
        }
    }

    /// Use the first `len` bits of `bytes`.
    pub fn from_bytes(bytes: &[u8], len: usize) -> Self {
        let len = len.min(bytes.len() * 8);
        let mut bytes = bytes[..(len + 7) / 8].to_vec();
        if len % 8 != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= 0xFF << (8 - len % 8);
            }
        }
        Self { bytes, len, read: 0 }
    }

    /// Number of bits written.
    pub fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bits not read yet.
    pub fn remaining(&self) -> usize {
        self.len - self.read
    }

    pub fn push_bit(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    /// Append the `n` low bits of `value`, highest of them first.
    pub fn write_bits(&mut self, value: u64, n: usize) {
        debug_assert!(n <= 64);
        for i in (0..n).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
    }

    /// Append whole bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.len % 8 == 0 {
            self.bytes.extend_from_slice(bytes);
            self.len += bytes.len() * 8;
        } else {
            for b in bytes {
                self.write_bits(*b as u64, 8);
            }
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, BitBufferError> {
        if self.read >= self.len {
            return Err(BitBufferError::BufferExhausted);
        }
        let bit = (self.bytes[self.read / 8] << (self.read % 8)) & 0x80 != 0;
        self.read += 1;
        Ok(bit)
    }

    /// Read `n` bits as an integer, the first bit read is the most significant.
    pub fn read_bits(&mut self, n: usize) -> Result<u64, BitBufferError> {
        debug_assert!(n <= 64);
        if self.remaining() < n {
            return Err(BitBufferError::BufferExhausted);
        }
        let mut value = 0;
        for _ in 0..n {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Ok(value)
    }

    /// Look at the next `n` bits without consuming them.
    pub fn peek_bits(&self, n: usize) -> Result<u64, BitBufferError> {
        self.clone().read_bits(n)
    }

    /// The packed bytes, a trailing partial byte is padded with zeros.
    #[cfg(test)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Extend<bool> for BitBuffer {
    fn extend<T: IntoIterator<Item = bool>>(&mut self, iter: T) {
        for bit in iter {
            self.push_bit(bit);
        }
    }
}

#[test]
fn test_write_read_interleaved() {
    let values: [(u64, usize); 8] = [
        (0b101, 3),
        (0x3FF, 10),
        (0, 0),
        (0xDEAD_BEEF_0123_4567, 64),
        (1, 1),
        (0x1234, 13),
        (u64::MAX, 63),
        (0x55, 7),
    ];
    let mut buf = BitBuffer::new();
    for (i, (v, n)) in values.iter().enumerate() {
        buf.write_bits(*v, *n);
        if i % 2 == 1 {
            let (pv, pn) = values[i - 1];
            let mask = if pn == 64 { u64::MAX } else { (1 << pn) - 1 };
            assert_eq!(buf.read_bits(pn), Ok(pv & mask));
            let mask = if *n == 64 { u64::MAX } else { (1 << n) - 1 };
            assert_eq!(buf.read_bits(*n), Ok(*v & mask));
        }
    }
    assert_eq!(buf.remaining(), 0);
    assert_eq!(buf.len(), 3 + 10 + 64 + 1 + 13 + 63 + 7);
    assert_eq!(buf.read_bit(), Err(BitBufferError::BufferExhausted));
}

#[test]
fn test_msb_first_packing() {
    let mut buf = BitBuffer::new();
    buf.write_bits(0b0001, 4);
    buf.write_bits(0b0000001000, 10);
    buf.write_bits(0b11, 2);
    buf.write_bytes(&[0xA5]);
    assert_eq!(buf.as_bytes(), &[0x10, 0x23, 0xA5]);
    assert_eq!(buf.len(), 24);
}

#[test]
fn test_from_bytes_truncates() {
    let mut buf = BitBuffer::from_bytes(&[0xFF, 0xFF], 12);
    assert_eq!(buf.as_bytes(), &[0xFF, 0xF0]);
    assert_eq!(buf.peek_bits(4), Ok(0xF));
    assert_eq!(buf.read_bits(12), Ok(0xFFF));
    assert_eq!(buf.read_bits(1), Err(BitBufferError::BufferExhausted));
}

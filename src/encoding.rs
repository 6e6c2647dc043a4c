//! Little-endian byte encoding with compact-size integers
//!
//! Every binary layout in the crate (transactions, sighash preimages, block
//! headers) is written through `ByteEncoder` and read back through `ByteDecoder`.

use crate::error::DecodeError;
use crate::types::Hash;

type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Fixed-width integers that can be appended in little-endian order
pub trait LeBytes: Copy {
    fn put_le(self, buf: &mut Vec<u8>);
}

macro_rules! impl_le_bytes {
    ($($t:ty),*) => {
        $(
            impl LeBytes for $t {
                fn put_le(self, buf: &mut Vec<u8>) {
                    buf.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_le_bytes!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Growable little-endian writer
#[derive(Debug, Default, Clone)]
pub struct ByteEncoder {
    buf: Vec<u8>,
}

impl ByteEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    /// Append a fixed-width integer, little-endian
    pub fn put<T: LeBytes>(&mut self, value: T) -> &mut Self {
        value.put_le(&mut self.buf);
        self
    }

    /// Append raw bytes as given
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append raw bytes in reverse order (display-order hashes go out little-endian)
    pub fn put_reversed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend(bytes.iter().rev());
        self
    }

    /// Append a compact-size length prefix
    ///
    /// - n < 0xfd: 1 byte
    /// - n ≤ 0xffff: 0xfd + u16
    /// - n ≤ 0xffffffff: 0xfe + u32
    /// - otherwise: 0xff + u64
    pub fn put_compact_size(&mut self, n: u64) -> &mut Self {
        if n < 0xfd {
            self.put(n as u8)
        } else if n <= 0xffff {
            self.put(0xfdu8).put(n as u16)
        } else if n <= 0xffff_ffff {
            self.put(0xfeu8).put(n as u32)
        } else {
            self.put(0xffu8).put(n)
        }
    }

    /// Append compact-size length followed by the bytes
    pub fn put_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.put_compact_size(bytes.len() as u64).put_bytes(bytes)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a byte slice, the inverse of `ByteEncoder`
#[derive(Debug, Clone)]
pub struct ByteDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> DecodeResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_compact_size(&mut self) -> DecodeResult<u64> {
        match self.read_u8()? {
            0xfd => Ok(self.read_u16()? as u64),
            0xfe => Ok(self.read_u32()? as u64),
            0xff => self.read_u64(),
            n => Ok(n as u64),
        }
    }

    /// Read a compact-size length and that many bytes
    pub fn read_var_bytes(&mut self) -> DecodeResult<&'a [u8]> {
        let len = self.read_compact_size()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::CompactSizeOverflow(len))?;
        self.read_bytes(len)
    }
}

/// Decode a hex string; odd length or non-hex characters are fatal
pub fn decode_hex(value: &str) -> DecodeResult<Vec<u8>> {
    hex::decode(value).map_err(|source| DecodeError::Hex {
        value: value.chars().take(80).collect(),
        source,
    })
}

/// Decode a display-order (reversed) hash into internal byte order
pub fn decode_hash(value: &str) -> DecodeResult<Hash> {
    let bytes = decode_hex(value)?;
    if bytes.len() != 32 {
        return Err(DecodeError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        });
    }
    let mut hash = [0u8; 32];
    for (dst, src) in hash.iter_mut().zip(bytes.iter().rev()) {
        *dst = *src;
    }
    Ok(hash)
}

/// Render an internal-order hash the way it is conventionally displayed
pub fn display_hash(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(n: u64) -> Vec<u8> {
        let mut enc = ByteEncoder::new();
        enc.put_compact_size(n);
        enc.into_bytes()
    }

    #[test]
    fn test_compact_size_boundaries() {
        assert_eq!(compact(0), vec![0x00]);
        assert_eq!(compact(0xfc), vec![0xfc]);
        assert_eq!(compact(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(compact(0xffff), vec![0xfd, 0xff, 0xff]);
        assert_eq!(compact(0x10000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(compact(0xffff_ffff), vec![0xfe, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(
            compact(0x1_0000_0000),
            vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_compact_size_decodes_back() {
        for n in [0u64, 1, 0xfc, 0xfd, 0x1234, 0xffff, 0x10000, 0xdead_beef, u64::MAX] {
            let bytes = compact(n);
            let mut dec = ByteDecoder::new(&bytes);
            assert_eq!(dec.read_compact_size().unwrap(), n);
            assert!(dec.is_empty());
        }
    }

    #[test]
    fn test_little_endian_integers() {
        let mut enc = ByteEncoder::new();
        enc.put(1u8).put(0x0203u16).put(-1i32).put(0x0102030405060708u64);
        assert_eq!(
            enc.as_bytes(),
            &[0x01, 0x03, 0x02, 0xff, 0xff, 0xff, 0xff, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn test_put_reversed() {
        let mut enc = ByteEncoder::new();
        enc.put_reversed(&[1, 2, 3]).put_bytes(&[4, 5]);
        assert_eq!(enc.as_bytes(), &[3, 2, 1, 4, 5]);
    }

    #[test]
    fn test_decoder_eof() {
        let mut dec = ByteDecoder::new(&[0x01, 0x02]);
        assert!(matches!(
            dec.read_u32(),
            Err(DecodeError::UnexpectedEof { needed: 4, remaining: 2 })
        ));
    }

    #[test]
    fn test_var_bytes_truncated() {
        let mut dec = ByteDecoder::new(&[0x05, 0xaa, 0xbb]);
        assert!(dec.read_var_bytes().is_err());
    }

    #[test]
    fn test_decode_hex_errors() {
        assert!(matches!(decode_hex("abc"), Err(DecodeError::Hex { .. })));
        assert!(matches!(decode_hex("zz"), Err(DecodeError::Hex { .. })));
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_hash_reverses() {
        let shown = "00000000000000000000000000000000000000000000000000000000000000ff";
        let hash = decode_hash(shown).unwrap();
        assert_eq!(hash[0], 0xff);
        assert_eq!(display_hash(&hash), shown);
        assert!(matches!(
            decode_hash("abcd"),
            Err(DecodeError::InvalidLength { expected: 32, actual: 2 })
        ));
    }
}

//! Low-level protobuf wire format reading.
//!
//! ## Wire Format Overview
//!
//! Each protobuf field is encoded as:
//! - A varint "tag" containing the field number and wire type
//! - The field data (format depends on wire type)
//!
//! Wire types:
//! - 0: VARINT (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages, packed repeated fields)
//! - 5: I32 (fixed32, sfixed32, float)
//!
//! Groups (3 and 4) are recognized but never read.

mod varint;

use crate::error::{Error, Result};
use bytes::{Buf, Bytes};

pub use varint::{
    decode_varint, encode_varint, encoded_len, zigzag_decode, zigzag_encode, MAX_VARINT_LEN,
};

/// Largest valid protobuf field number (2^29 - 1)
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;

/// Deepest sub-message nesting a reader accepts
pub const RECURSION_LIMIT: u32 = 100;

/// Protobuf wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    I64 = 1,
    /// Length-delimited (strings, bytes, embedded messages)
    Len = 2,
    /// Start group (deprecated)
    StartGroup = 3,
    /// End group (deprecated)
    EndGroup = 4,
    /// 32-bit fixed-width
    I32 = 5,
}

impl WireType {
    /// Parses the low three bits of a tag. `offset` is only used for the error.
    pub fn from_bits(value: u8, offset: usize) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::I32),
            _ => Err(Error::unsupported_wire_type(value, offset)),
        }
    }
}

/// A decoded field key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    /// Field number (`key >> 3`)
    pub field_number: u32,
    /// Wire type (`key & 7`)
    pub wire_type: WireType,
}

/// Cursor over an immutable byte buffer.
///
/// Nested readers created by [`WireReader::sub_reader`] are bounded to the
/// length-delimited payload, so a sub-message can never read into its
/// parent's trailing bytes. Error offsets are always absolute.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
    depth: u32,
}

impl<'a> WireReader<'a> {
    /// Creates a reader positioned at the start of `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            base: 0,
            depth: 0,
        }
    }

    /// How many sub-readers deep this reader is
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Absolute position of the cursor
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    /// Bytes left before the end of this reader's window
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once the cursor has reached the end of the window
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Takes exactly `len` bytes, advancing the cursor
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::truncated(self.position()));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Reads an unsigned varint
    pub fn read_varint(&mut self) -> Result<u64> {
        let (value, len) = decode_varint(&self.buf[self.pos..], self.position())?;
        self.pos += len;
        Ok(value)
    }

    /// Reads a field key and splits it into field number and wire type
    pub fn read_tag(&mut self) -> Result<Tag> {
        let offset = self.position();
        let key = self.read_varint()?;
        let wire_type = WireType::from_bits((key & 0x07) as u8, offset)?;
        let number = key >> 3;
        let field_number = u32::try_from(number)
            .ok()
            .filter(|n| (1..=MAX_FIELD_NUMBER).contains(n))
            .ok_or_else(|| Error::invalid_field_number(number, MAX_FIELD_NUMBER, offset))?;
        Ok(Tag {
            field_number,
            wire_type,
        })
    }

    /// Reads a varint length prefix and returns exactly that many bytes
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8]> {
        let offset = self.position();
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| Error::truncated(offset))?;
        self.take(len)
    }

    /// Reads a length-delimited payload and returns a reader bounded to it.
    ///
    /// The new reader is one level deeper; going past [`RECURSION_LIMIT`]
    /// levels is an [`Error::RecursionLimitExceeded`].
    pub fn sub_reader(&mut self) -> Result<WireReader<'a>> {
        let start = self.pos;
        let depth = self.depth + 1;
        if depth > RECURSION_LIMIT {
            return Err(Error::recursion_limit(RECURSION_LIMIT, self.position()));
        }
        let payload = self.read_length_delimited()?;
        let prefix_len = self.pos - start - payload.len();
        Ok(WireReader {
            buf: payload,
            pos: 0,
            base: self.base + start + prefix_len,
            depth,
        })
    }

    /// Reads a length-delimited UTF-8 string; invalid sequences are replaced
    pub fn read_string(&mut self) -> Result<String> {
        let raw = self.read_length_delimited()?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    /// Reads a length-delimited byte string
    pub fn read_bytes(&mut self) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(self.read_length_delimited()?))
    }

    /// Reads a varint-encoded bool (any non-zero value is true)
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_varint()? != 0)
    }

    /// Reads a varint-encoded int32 (negative values are sign-extended on the wire)
    pub fn read_int32(&mut self) -> Result<i32> {
        Ok(self.read_varint()? as i32)
    }

    /// Reads a varint-encoded int64
    pub fn read_int64(&mut self) -> Result<i64> {
        Ok(self.read_varint()? as i64)
    }

    /// Reads a varint-encoded uint64
    pub fn read_uint64(&mut self) -> Result<u64> {
        self.read_varint()
    }

    /// Reads a zigzag-encoded sint64
    pub fn read_sint64(&mut self) -> Result<i64> {
        Ok(zigzag_decode(self.read_varint()?))
    }

    /// Reads a little-endian 64-bit float
    pub fn read_double(&mut self) -> Result<f64> {
        let mut raw = self.take(8)?;
        Ok(raw.get_f64_le())
    }

    /// Reads a little-endian fixed32
    pub fn read_fixed32(&mut self) -> Result<u32> {
        let mut raw = self.take(4)?;
        Ok(raw.get_u32_le())
    }

    /// Reads one or more int32 values into `out`.
    ///
    /// A `Len` wire type means the values are packed: sub-varints are read
    /// until the payload is exhausted. Any other wire type is one value.
    pub fn read_repeated_int32(&mut self, wire_type: WireType, out: &mut Vec<i32>) -> Result<()> {
        if wire_type == WireType::Len {
            let mut packed = self.sub_reader()?;
            while !packed.is_empty() {
                out.push(packed.read_int32()?);
            }
        } else {
            out.push(self.read_int32()?);
        }
        Ok(())
    }

    /// Advances past a value of the given wire type without interpreting it
    pub fn skip(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::I64 => {
                self.take(8)?;
            }
            WireType::Len => {
                self.read_length_delimited()?;
            }
            WireType::I32 => {
                self.take(4)?;
            }
            WireType::StartGroup | WireType::EndGroup => {
                return Err(Error::unsupported_wire_type(
                    wire_type as u8,
                    self.position(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_conversion() {
        assert_eq!(WireType::from_bits(0, 0).unwrap(), WireType::Varint);
        assert_eq!(WireType::from_bits(1, 0).unwrap(), WireType::I64);
        assert_eq!(WireType::from_bits(2, 0).unwrap(), WireType::Len);
        assert_eq!(WireType::from_bits(5, 0).unwrap(), WireType::I32);
        assert_eq!(
            WireType::from_bits(6, 9).unwrap_err(),
            Error::UnsupportedWireType {
                wire_type: 6,
                offset: 9
            }
        );
    }

    #[test]
    fn test_read_tag() {
        // Field 1, wire type 2
        let mut reader = WireReader::new(&[0x0A]);
        let tag = reader.read_tag().unwrap();
        assert_eq!(tag.field_number, 1);
        assert_eq!(tag.wire_type, WireType::Len);

        // Field 999, wire type 2: (999 << 3) | 2 = 7994
        let mut reader = WireReader::new(&[0xBA, 0x3E]);
        let tag = reader.read_tag().unwrap();
        assert_eq!(tag.field_number, 999);
        assert_eq!(tag.wire_type, WireType::Len);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_tag_rejects_out_of_range_numbers() {
        // Field (1 << 32) + 2 would alias field 2 if truncated to 32 bits
        let mut data = Vec::new();
        encode_varint((((1u64 << 32) + 2) << 3) | 2, &mut data);
        let mut reader = WireReader::new(&data);
        assert_eq!(
            reader.read_tag().unwrap_err(),
            Error::InvalidFieldNumber {
                number: (1 << 32) + 2,
                max: MAX_FIELD_NUMBER,
                offset: 0,
            }
        );

        let mut data = Vec::new();
        encode_varint((MAX_FIELD_NUMBER as u64 + 1) << 3, &mut data);
        assert!(matches!(
            WireReader::new(&data).read_tag(),
            Err(Error::InvalidFieldNumber { .. })
        ));

        // field 0 is never valid
        assert!(matches!(
            WireReader::new(&[0x02]).read_tag(),
            Err(Error::InvalidFieldNumber { number: 0, .. })
        ));

        let mut data = Vec::new();
        encode_varint((MAX_FIELD_NUMBER as u64) << 3, &mut data);
        assert_eq!(
            WireReader::new(&data).read_tag().unwrap().field_number,
            MAX_FIELD_NUMBER
        );
    }

    #[test]
    fn test_sub_reader_depth_limit() {
        // Each level is a one-byte length prefix of the remaining bytes
        let levels = RECURSION_LIMIT as usize + 1;
        let data: Vec<u8> = (0..levels).map(|i| (levels - 1 - i) as u8).collect();

        let mut reader = WireReader::new(&data);
        for expected in 1..=RECURSION_LIMIT {
            reader = reader.sub_reader().unwrap();
            assert_eq!(reader.depth(), expected);
        }
        assert!(matches!(
            reader.sub_reader(),
            Err(Error::RecursionLimitExceeded { limit: RECURSION_LIMIT, .. })
        ));
    }

    #[test]
    fn test_read_string() {
        let data = [0x05, b'h', b'e', b'l', b'l', b'o', 0x01];
        let mut reader = WireReader::new(&data);
        assert_eq!(reader.read_string().unwrap(), "hello");
        assert_eq!(reader.position(), 6);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn test_read_length_delimited_truncated() {
        let data = [0x05, b'h', b'e'];
        let mut reader = WireReader::new(&data);
        assert_eq!(
            reader.read_length_delimited().unwrap_err(),
            Error::TruncatedInput { offset: 1 }
        );
    }

    #[test]
    fn test_sub_reader_offsets_are_absolute() {
        // Two junk bytes, then a 2-byte payload holding a truncated varint
        let data = [0x00, 0x00, 0x02, 0x80, 0x80];
        let mut reader = WireReader::new(&data);
        reader.skip(WireType::Varint).unwrap();
        reader.skip(WireType::Varint).unwrap();
        let mut sub = reader.sub_reader().unwrap();
        assert_eq!(sub.position(), 3);
        assert_eq!(
            sub.read_varint().unwrap_err(),
            Error::TruncatedInput { offset: 5 }
        );
        assert!(reader.is_empty());
    }

    #[test]
    fn test_fixed_width() {
        let mut data = Vec::new();
        data.extend_from_slice(&1.5f64.to_le_bytes());
        data.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        let mut reader = WireReader::new(&data);
        assert_eq!(reader.read_double().unwrap(), 1.5);
        assert_eq!(reader.read_fixed32().unwrap(), 0xDEADBEEF);
        assert!(reader.read_fixed32().is_err());
    }

    #[test]
    fn test_read_repeated_int32_packed_and_unpacked() {
        let mut out = Vec::new();

        // Packed: length 4, values 1, 300, 2
        let mut reader = WireReader::new(&[0x04, 0x01, 0xAC, 0x02, 0x02]);
        reader.read_repeated_int32(WireType::Len, &mut out).unwrap();
        assert_eq!(out, vec![1, 300, 2]);

        let mut reader = WireReader::new(&[0x07]);
        reader
            .read_repeated_int32(WireType::Varint, &mut out)
            .unwrap();
        assert_eq!(out, vec![1, 300, 2, 7]);
    }

    #[test]
    fn test_skip() {
        let mut data = vec![0x96, 0x01];
        data.extend_from_slice(&[0; 8]);
        data.extend_from_slice(&[0x02, b'h', b'i']);
        data.extend_from_slice(&[0; 4]);

        let mut reader = WireReader::new(&data);
        reader.skip(WireType::Varint).unwrap();
        reader.skip(WireType::I64).unwrap();
        reader.skip(WireType::Len).unwrap();
        reader.skip(WireType::I32).unwrap();
        assert!(reader.is_empty());
    }

    #[test]
    fn test_skip_groups_unsupported() {
        let mut reader = WireReader::new(&[0x00]);
        assert!(matches!(
            reader.skip(WireType::StartGroup),
            Err(Error::UnsupportedWireType { wire_type: 3, .. })
        ));
        assert!(matches!(
            reader.skip(WireType::EndGroup),
            Err(Error::UnsupportedWireType { wire_type: 4, .. })
        ));
    }

    #[test]
    fn test_sint64() {
        let mut data = Vec::new();
        encode_varint(zigzag_encode(-42), &mut data);
        let mut reader = WireReader::new(&data);
        assert_eq!(reader.read_sint64().unwrap(), -42);
    }
}

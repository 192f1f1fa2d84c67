//! Base-128 varints and zigzag mapping.
//!
//! A varint stores seven bits per byte, least significant group first; the
//! high bit of each byte is set when more bytes follow.

use crate::error::{Error, Result};

/// Longest encoding of a 64-bit value
pub const MAX_VARINT_LEN: usize = 10;

/// Decode a varint from the start of `data`.
///
/// Returns the decoded value and the number of bytes consumed. An encoding
/// that has not terminated after [`MAX_VARINT_LEN`] bytes is an
/// [`Error::MalformedVarint`]; bits of the tenth byte past the 64th are
/// dropped. Running out of bytes before a terminating byte is a
/// [`Error::TruncatedInput`] at `offset + data.len()`, where `offset` is the
/// absolute position of `data` in the enclosing buffer.
pub fn decode_varint(data: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0u32;

    for (i, &byte) in data.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(Error::malformed_varint(offset));
        }

        result |= ((byte & 0x7F) as u64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(Error::truncated(offset + data.len()))
}

/// Append the varint encoding of `value` to `out`.
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Number of bytes [`encode_varint`] writes for `value`
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Map a signed 64-bit integer onto the unsigned zigzag space
/// (0, -1, 1, -2, ... becomes 0, 1, 2, 3, ...)
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

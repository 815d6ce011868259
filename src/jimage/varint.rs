//! Compressed indexes
//!
//! Offsets into the image string table are stored as big endian integers of 1 to 4 bytes. The
//! top bit of the first byte says whether the integer is compressed:
//!
//! ```text
//!  compressed      1 L L v v v v v  [ v v v v v v v v ]{L-1}     L in 1..=3
//!  uncompressed    0 v v v v v v v    v v v v v v v v  (x3)
//! ```
//!
//! The uncompressed form is only used when a value needs more than 21 bits, so that its top bit
//! is always clear. That restricts the domain to `0..=i32::MAX`.

use super::{Error, Result};
use byteorder::ReadBytesExt;
use std::io::{Read, Write};

const COMPRESSED_FLAG: u8 = 0b1000_0000;
const HEADER_WIDTH: u32 = 3;
const HEADER_SHIFT: u32 = u8::BITS - HEADER_WIDTH;
const HEADER_VALUE_MASK: u8 = (1 << HEADER_SHIFT) - 1;
const UNCOMPRESSED_LEN: usize = 4;

/// Largest value that can be encoded
pub const MAX_VALUE: u32 = i32::MAX as u32;

/// Number of bytes `value` encodes to
pub fn encoded_len(value: u32) -> usize {
    let width = (u32::BITS - value.leading_zeros()).max(1);
    let len = (((width + HEADER_WIDTH - 1) >> 3) + 1) as usize;
    len.min(UNCOMPRESSED_LEN)
}

pub fn encode(value: u32) -> Result<Vec<u8>> {
    if value > MAX_VALUE {
        let msg = format!("{} does not fit in a compressed index", value);
        return Err(Error::InvalidArgument(msg));
    }

    let len = encoded_len(value);
    let mut encoded = value.to_be_bytes()[UNCOMPRESSED_LEN - len..].to_vec();
    if len < UNCOMPRESSED_LEN {
        encoded[0] |= COMPRESSED_FLAG | (len as u8) << HEADER_SHIFT;
    }
    Ok(encoded)
}

/// Total encoded length, as announced by the first byte (zero for a malformed header)
fn header_len(header: u8) -> usize {
    if header & COMPRESSED_FLAG != 0 {
        (header >> HEADER_SHIFT & 0b11) as usize
    } else {
        UNCOMPRESSED_LEN
    }
}

fn header_value(header: u8) -> u32 {
    if header & COMPRESSED_FLAG != 0 {
        (header & HEADER_VALUE_MASK) as u32
    } else {
        header as u32
    }
}

/// Decode the integer starting at `offset`, returning it and the number of bytes it used
pub fn decode(bytes: &[u8], offset: usize) -> Result<(u32, usize)> {
    let header = *bytes.get(offset).ok_or(Error::TruncatedStream)?;
    let len = header_len(header);
    if len == 0 {
        return Err(Error::MalformedVarInt { header });
    }

    let rest = bytes
        .get(offset + 1..offset + len)
        .ok_or(Error::TruncatedStream)?;
    let value = rest
        .iter()
        .fold(header_value(header), |acc, byte| acc << 8 | *byte as u32);
    Ok((value, len))
}

/// Decode integers packed back to back until the buffer is used up
pub fn decode_sequence(bytes: &[u8]) -> Result<Vec<u32>> {
    let mut values = vec![];
    let mut offset = 0;
    while offset < bytes.len() {
        let (value, len) = decode(bytes, offset)?;
        values.push(value);
        offset += len;
    }
    Ok(values)
}

/// Read one integer from a stream
pub fn read_varint<R: Read>(reader: &mut R) -> Result<u32> {
    let header = reader.read_u8()?;
    let len = header_len(header);
    if len == 0 {
        return Err(Error::MalformedVarInt { header });
    }

    let mut value = header_value(header);
    for _ in 1..len {
        value = value << 8 | reader.read_u8()? as u32;
    }
    Ok(value)
}

/// Write one integer to a stream
pub fn write_varint<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_all(&encode(value)?)?;
    Ok(())
}

/// Encode a list of integers back to back, as read by [`decode_sequence`]
pub fn encode_sequence(values: &[u32]) -> Result<Vec<u8>> {
    let mut encoded = Vec::with_capacity(values.len());
    for value in values {
        encoded.write_all(&encode(*value)?)?;
    }
    Ok(encoded)
}

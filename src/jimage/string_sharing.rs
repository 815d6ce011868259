//! String sharing (`compact-cp`)
//!
//! Most of the bytes of a class file are constant pool strings, and most of those strings are
//! repeated across the classes of an image: package names, class names, descriptors. String
//! sharing moves them into the image string table, replacing each `CONSTANT_Utf8_info` entry in
//! the constant pool with one of two custom entries:
//!
//!   - `ExternalizedString` (tag 23): a compressed index of the whole string
//!
//!   - `ExternalizedStringDescriptor` (tag 25): a compressed index of the descriptor skeleton (see
//!     [`ParsedSignature`]) followed by a compressed byte count and that many bytes of packed
//!     compressed indices, alternating package name and class name for each class in the
//!     descriptor
//!
//! Everything after the constant pool is left alone.

use super::varint::{self, read_varint, write_varint};
use super::{
    Error, Properties, ResourceCompressor, ResourceDecompressor, Result, StringsProvider,
    StringsWriter,
};
use crate::jvm::class_scan::{ClassScan, PoolEntry, CLASS_HEADER_SIZE};
use crate::jvm::signature::{self, ParsedSignature};
use crate::jvm::{self, encode_modified_utf8, ClassCursor, ConstantTag, Serialize, Utf8Constant};
use log::trace;
use std::borrow::Cow;

/// Undoes string sharing
#[derive(Debug, Default)]
pub struct StringSharingDecompressor;

impl StringSharingDecompressor {
    pub const NAME: &'static str = "compact-cp";

    pub fn factory(_config: &Properties) -> Box<dyn ResourceDecompressor> {
        Box::new(StringSharingDecompressor)
    }

    /// Rewrite the class starting at `content[offset..]` back to a standard constant pool
    pub fn normalize(
        strings: &dyn StringsProvider,
        content: &[u8],
        offset: usize,
        capacity: usize,
    ) -> Result<Vec<u8>> {
        let input = content.get(offset..).ok_or(Error::TruncatedStream)?;
        let mut cursor = ClassCursor::new(input);
        let mut out: Vec<u8> = Vec::with_capacity(capacity);

        // magic, minor version, major version
        out.extend_from_slice(cursor.take_slice(CLASS_HEADER_SIZE)?);

        let count = cursor.u2()?;
        count.serialize(&mut out)?;

        let mut index: u32 = 1;
        while index < count as u32 {
            let tag_byte = cursor.u1()?;
            let tag = ConstantTag::from_u8(tag_byte).ok_or(jvm::Error::UnknownConstantTag {
                tag: tag_byte,
                index,
            })?;
            match tag {
                ConstantTag::Utf8 => {
                    let len = cursor.u2()?;
                    let bytes = cursor.take_slice(len as usize)?;
                    tag.serialize(&mut out)?;
                    len.serialize(&mut out)?;
                    out.extend_from_slice(bytes);
                }
                ConstantTag::ExternalizedString => {
                    let string = string_at(strings, read_varint(&mut cursor)?)?;
                    trace!("#{}: externalized string '{}'", index, string);
                    Utf8Constant::new(&string)?.serialize(&mut out)?;
                }
                ConstantTag::ExternalizedStringDescriptor => {
                    let descriptor = reconstruct_descriptor(strings, &mut cursor)?;
                    trace!("#{}: externalized descriptor '{}'", index, descriptor);
                    Utf8Constant::new(&descriptor)?.serialize(&mut out)?;
                }
                fixed => {
                    let size = fixed.fixed_size().ok_or(jvm::Error::UnknownConstantTag {
                        tag: tag_byte,
                        index,
                    })?;
                    fixed.serialize(&mut out)?;
                    out.extend_from_slice(cursor.take_slice(size)?);
                }
            }
            index += tag.width();
        }

        out.extend_from_slice(cursor.remaining());
        Ok(out)
    }
}

impl ResourceDecompressor for StringSharingDecompressor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn decompress(
        &self,
        strings: &dyn StringsProvider,
        content: &[u8],
        offset: usize,
        original_size: u64,
    ) -> Result<Vec<u8>> {
        // The declared size is only a hint, so don't trust it with a huge allocation
        let capacity = usize::try_from(original_size)
            .unwrap_or(0)
            .min(content.len().saturating_mul(4));
        Self::normalize(strings, content, offset, capacity)
    }
}

fn string_at<'s>(strings: &'s dyn StringsProvider, offset: u32) -> Result<Cow<'s, str>> {
    // Compressed indices never exceed `i32::MAX`
    let offset = offset as i32;
    strings.get_string(offset).ok_or(Error::MissingString(offset))
}

fn reconstruct_descriptor(
    strings: &dyn StringsProvider,
    cursor: &mut ClassCursor,
) -> Result<String> {
    let formatted = string_at(strings, read_varint(cursor)?)?;
    let indices_len = read_varint(cursor)? as usize;
    let packed = cursor.take_slice(indices_len)?;
    // Only the indices an `L` marker consumes are looked up
    let needed = 2 * formatted.chars().filter(|c| *c == 'L').count();
    let arguments = varint::decode_sequence(packed)?
        .into_iter()
        .take(needed)
        .map(|offset| string_at(strings, offset))
        .collect::<Result<Vec<_>>>()?;
    Ok(signature::reconstruct(&formatted, &arguments)?)
}

/// Applies string sharing to class files
#[derive(Debug, Default)]
pub struct StringSharingCompressor;

impl StringSharingCompressor {
    /// Externalize a descriptor into a tag 25 entry
    ///
    /// Returns `false` (having written nothing) when the descriptor mentions no classes or would
    /// not survive being split and joined again, in which case the caller falls back to a plain
    /// externalized string.
    fn write_descriptor(
        strings: &mut dyn StringsWriter,
        descriptor: &str,
        out: &mut Vec<u8>,
    ) -> Result<bool> {
        let parsed = ParsedSignature::parse(descriptor);
        if parsed.types.is_empty() || parsed.reconstruct() != descriptor {
            return Ok(false);
        }

        let formatted_offset = strings.add_string(&parsed.formatted)?;
        let mut packed = vec![];
        for argument in parsed.arguments() {
            write_varint(&mut packed, string_offset(strings, argument)?)?;
        }

        ConstantTag::ExternalizedStringDescriptor.serialize(out)?;
        write_varint(out, formatted_offset as u32)?;
        write_varint(out, packed.len() as u32)?;
        out.extend_from_slice(&packed);
        Ok(true)
    }
}

/// String of a UTF-8 entry, if it can move to the string table and come back byte for byte
///
/// Payloads that decode but are not in canonical modified UTF-8 (a raw `0`, overlong sequences)
/// would be re-encoded differently on the way back, so they stay in the constant pool.
fn shareable_string(entry: &PoolEntry) -> Option<String> {
    let string = entry.as_string().ok()??;
    if encode_modified_utf8(&string) == entry.payload {
        Some(string)
    } else {
        None
    }
}

fn string_offset(strings: &mut dyn StringsWriter, string: &str) -> Result<u32> {
    let offset = strings.add_string(string)?;
    u32::try_from(offset).map_err(|_| {
        let msg = format!("string table returned negative offset {}", offset);
        Error::InvalidArgument(msg)
    })
}

impl ResourceCompressor for StringSharingCompressor {
    fn name(&self) -> &str {
        StringSharingDecompressor::NAME
    }

    fn compress(&self, strings: &mut dyn StringsWriter, content: &[u8]) -> Result<Vec<u8>> {
        let scan = ClassScan::new(content)?;
        let mut out: Vec<u8> = Vec::with_capacity(content.len());
        out.extend_from_slice(scan.header);
        scan.pool_count.serialize(&mut out)?;

        for entry in &scan.entries {
            let string = match shareable_string(entry) {
                Some(string) => string,
                None => {
                    entry.tag.serialize(&mut out)?;
                    if entry.tag == ConstantTag::Utf8 {
                        (entry.payload.len() as u16).serialize(&mut out)?;
                    }
                    out.extend_from_slice(entry.payload);
                    continue;
                }
            };

            if scan.is_descriptor(entry.index)
                && Self::write_descriptor(strings, &string, &mut out)?
            {
                continue;
            }
            ConstantTag::ExternalizedString.serialize(&mut out)?;
            write_varint(&mut out, string_offset(strings, &string)?)?;
        }

        out.extend_from_slice(&content[scan.pool_end..]);
        Ok(out)
    }
}

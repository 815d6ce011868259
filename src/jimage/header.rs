use super::{Error, Result, StringsProvider};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::borrow::Cow;
use std::io::Write;

/// Byte order of the multi-byte header fields
///
/// Images are written in the byte order of the platform that produced them, so this is a runtime
/// choice rather than a type parameter.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    /// Byte order of the current platform
    pub const fn native() -> Endianness {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

const HEADER_SIZE: usize = 29;

/// Header in front of every compression step applied to a resource
///
/// ```text
///  offset  size  field
///       0     4  magic (0xCAFEFAFA)
///       4     8  compressed size
///      12     8  uncompressed size
///      20     4  offset of the decompressor name in the string table
///      24     4  offset of the stored configuration in the string table (-1 for none)
///      28     1  terminal flag
/// ```
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct CompressedResourceHeader {
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub decompressor_name_offset: i32,
    pub content_offset: i32,

    /// Set on the innermost step, whose input was not itself compressed
    ///
    /// This is informational only: the decompression loop stops when it no longer finds a
    /// header, not when it sees this flag.
    pub is_terminal: bool,
}

impl CompressedResourceHeader {
    pub const SIZE: usize = HEADER_SIZE;
    pub const MAGIC: u32 = 0xCAFE_FAFA;

    /// Value of `content_offset` when there is no stored configuration
    pub const NO_CONTENT: i32 = -1;

    /// Try to read a header from the front of a resource
    ///
    /// `None` means the resource is not (or no longer) compressed: either it is too short to hold
    /// a header, or it does not start with the magic number.
    pub fn read(resource: &[u8], order: Endianness) -> Option<CompressedResourceHeader> {
        let bytes = resource.get(..Self::SIZE)?;
        match order {
            Endianness::Big => Self::read_with::<BigEndian>(bytes),
            Endianness::Little => Self::read_with::<LittleEndian>(bytes),
        }
    }

    fn read_with<B: ByteOrder>(bytes: &[u8]) -> Option<CompressedResourceHeader> {
        if B::read_u32(&bytes[0..4]) != Self::MAGIC {
            return None;
        }
        Some(CompressedResourceHeader {
            compressed_size: B::read_u64(&bytes[4..12]),
            uncompressed_size: B::read_u64(&bytes[12..20]),
            decompressor_name_offset: B::read_i32(&bytes[20..24]),
            content_offset: B::read_i32(&bytes[24..28]),
            is_terminal: bytes[28] != 0,
        })
    }

    /// Serialize the header
    pub fn to_bytes(&self, order: Endianness) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        match order {
            Endianness::Big => self.write_with::<BigEndian>(&mut bytes),
            Endianness::Little => self.write_with::<LittleEndian>(&mut bytes),
        }
        bytes
    }

    fn write_with<B: ByteOrder>(&self, bytes: &mut [u8; HEADER_SIZE]) {
        B::write_u32(&mut bytes[0..4], Self::MAGIC);
        B::write_u64(&mut bytes[4..12], self.compressed_size);
        B::write_u64(&mut bytes[12..20], self.uncompressed_size);
        B::write_i32(&mut bytes[20..24], self.decompressor_name_offset);
        B::write_i32(&mut bytes[24..28], self.content_offset);
        bytes[28] = self.is_terminal as u8;
    }

    /// Write the serialized header to a stream
    pub fn write<W: Write>(&self, writer: &mut W, order: Endianness) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes(order))
    }

    /// Name of the decompressor that undoes this step
    pub fn decompressor_name<'s>(
        &self,
        strings: &'s dyn StringsProvider,
    ) -> Result<Cow<'s, str>> {
        strings
            .get_string(self.decompressor_name_offset)
            .ok_or(Error::PluginNameNotFound(self.decompressor_name_offset))
    }

    /// Decompressor configuration stored alongside the resource, if any
    pub fn stored_content<'s>(
        &self,
        strings: &'s dyn StringsProvider,
    ) -> Result<Option<Cow<'s, str>>> {
        if self.content_offset == Self::NO_CONTENT {
            return Ok(None);
        }
        strings
            .get_string(self.content_offset)
            .map(Some)
            .ok_or(Error::MissingString(self.content_offset))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    const HEADER: CompressedResourceHeader = CompressedResourceHeader {
        compressed_size: 0x0102,
        uncompressed_size: 0x0304_0506,
        decompressor_name_offset: 7,
        content_offset: CompressedResourceHeader::NO_CONTENT,
        is_terminal: true,
    };

    #[test]
    fn big_endian_layout() {
        let bytes = HEADER.to_bytes(Endianness::Big);
        assert_eq!(
            bytes.to_vec(),
            vec![
                0xCA, 0xFE, 0xFA, 0xFA, // magic
                0, 0, 0, 0, 0, 0, 0x01, 0x02, // compressed size
                0, 0, 0, 0, 0x03, 0x04, 0x05, 0x06, // uncompressed size
                0, 0, 0, 7, // decompressor name
                0xFF, 0xFF, 0xFF, 0xFF, // content
                1, // terminal
            ]
        );
    }

    #[test]
    fn little_endian_layout() {
        let bytes = HEADER.to_bytes(Endianness::Little);
        assert_eq!(&bytes[0..4], &[0xFA, 0xFA, 0xFE, 0xCA]);
        assert_eq!(&bytes[4..6], &[0x02, 0x01]);
        assert_eq!(&bytes[20..24], &[7, 0, 0, 0]);
    }

    #[test]
    fn round_trips() {
        let other = CompressedResourceHeader {
            compressed_size: u64::MAX,
            uncompressed_size: 0,
            decompressor_name_offset: i32::MAX,
            content_offset: 12,
            is_terminal: false,
        };
        for order in [Endianness::Big, Endianness::Little] {
            for header in [HEADER, other] {
                let bytes = header.to_bytes(order);
                assert_eq!(CompressedResourceHeader::read(&bytes, order), Some(header));

                let mut written = vec![];
                header.write(&mut written, order).unwrap();
                written.extend_from_slice(b"payload");
                assert_eq!(CompressedResourceHeader::read(&written, order), Some(header));
            }
        }
    }

    #[test]
    fn rejects_short_buffers() {
        let bytes = HEADER.to_bytes(Endianness::Big);
        for len in 0..CompressedResourceHeader::SIZE {
            assert_eq!(
                CompressedResourceHeader::read(&bytes[..len], Endianness::Big),
                None
            );
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = HEADER.to_bytes(Endianness::Big);
        assert_eq!(
            CompressedResourceHeader::read(&bytes, Endianness::Little),
            None
        );
        bytes[3] = 0xFB;
        assert_eq!(CompressedResourceHeader::read(&bytes, Endianness::Big), None);

        let class = [0xCAu8, 0xFE, 0xBA, 0xBE].repeat(10);
        assert_eq!(CompressedResourceHeader::read(&class, Endianness::Big), None);
    }

    #[test]
    fn nonzero_terminal_byte_is_true() {
        let mut bytes = HEADER.to_bytes(Endianness::Big);
        bytes[28] = 2;
        assert!(CompressedResourceHeader::read(&bytes, Endianness::Big).unwrap().is_terminal);
    }

    #[test]
    fn resolves_strings() {
        let mut strings: HashMap<i32, String> = HashMap::new();
        strings.insert(7, String::from("zip"));
        assert_eq!(HEADER.decompressor_name(&strings).unwrap(), "zip");
        assert_eq!(HEADER.stored_content(&strings).unwrap(), None);

        let missing = CompressedResourceHeader {
            decompressor_name_offset: 8,
            content_offset: 9,
            ..HEADER
        };
        assert!(matches!(
            missing.decompressor_name(&strings),
            Err(Error::PluginNameNotFound(8))
        ));
        assert!(matches!(
            missing.stored_content(&strings),
            Err(Error::MissingString(9))
        ));
    }
}

use super::{encode_modified_utf8, Error, Serialize};
use byteorder::WriteBytesExt;

/// Tags of constant pool entries
///
/// Besides the [standard tags][0], this includes the two tags used by jimage string sharing to
/// stand in for `CONSTANT_Utf8_info` entries whose contents live in the image string table.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.4
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum ConstantTag {
    Utf8,
    Integer,
    Float,
    Long,
    Double,
    Class,
    String,
    FieldRef,
    MethodRef,
    InterfaceMethodRef,
    NameAndType,
    MethodHandle,
    MethodType,
    Dynamic,
    InvokeDynamic,
    Module,
    Package,

    /// Offset of the whole string in the image string table
    ExternalizedString,

    /// Offset of a descriptor skeleton, followed by the offsets of its package and class names
    ExternalizedStringDescriptor,
}

impl ConstantTag {
    pub fn from_u8(tag: u8) -> Option<ConstantTag> {
        let tag = match tag {
            1 => ConstantTag::Utf8,
            3 => ConstantTag::Integer,
            4 => ConstantTag::Float,
            5 => ConstantTag::Long,
            6 => ConstantTag::Double,
            7 => ConstantTag::Class,
            8 => ConstantTag::String,
            9 => ConstantTag::FieldRef,
            10 => ConstantTag::MethodRef,
            11 => ConstantTag::InterfaceMethodRef,
            12 => ConstantTag::NameAndType,
            15 => ConstantTag::MethodHandle,
            16 => ConstantTag::MethodType,
            17 => ConstantTag::Dynamic,
            18 => ConstantTag::InvokeDynamic,
            19 => ConstantTag::Module,
            20 => ConstantTag::Package,
            23 => ConstantTag::ExternalizedString,
            25 => ConstantTag::ExternalizedStringDescriptor,
            _ => return None,
        };
        Some(tag)
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            ConstantTag::Utf8 => 1,
            ConstantTag::Integer => 3,
            ConstantTag::Float => 4,
            ConstantTag::Long => 5,
            ConstantTag::Double => 6,
            ConstantTag::Class => 7,
            ConstantTag::String => 8,
            ConstantTag::FieldRef => 9,
            ConstantTag::MethodRef => 10,
            ConstantTag::InterfaceMethodRef => 11,
            ConstantTag::NameAndType => 12,
            ConstantTag::MethodHandle => 15,
            ConstantTag::MethodType => 16,
            ConstantTag::Dynamic => 17,
            ConstantTag::InvokeDynamic => 18,
            ConstantTag::Module => 19,
            ConstantTag::Package => 20,
            ConstantTag::ExternalizedString => 23,
            ConstantTag::ExternalizedStringDescriptor => 25,
        }
    }

    /// Size of the payload following the tag, for entries which have a fixed size
    ///
    /// UTF-8 and the two externalized forms are variable length, so they return `None`.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            ConstantTag::Class
            | ConstantTag::String
            | ConstantTag::MethodType
            | ConstantTag::Module
            | ConstantTag::Package => Some(2),
            ConstantTag::MethodHandle => Some(3),
            ConstantTag::Integer
            | ConstantTag::Float
            | ConstantTag::FieldRef
            | ConstantTag::MethodRef
            | ConstantTag::InterfaceMethodRef
            | ConstantTag::NameAndType
            | ConstantTag::Dynamic
            | ConstantTag::InvokeDynamic => Some(4),
            ConstantTag::Long | ConstantTag::Double => Some(8),
            ConstantTag::Utf8
            | ConstantTag::ExternalizedString
            | ConstantTag::ExternalizedStringDescriptor => None,
        }
    }

    /// Number of constant pool slots the entry occupies. Quoting JVMS §4.4.5:
    ///
    /// > All 8-byte constants take up two entries in the constant_pool table of the class file.
    /// > If a CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the
    /// > constant_pool table at index n, then the next usable item in the pool is located at
    /// > index n+2. The constant_pool index n+1 must be valid but is considered unusable.
    pub const fn width(self) -> u32 {
        match self {
            ConstantTag::Long | ConstantTag::Double => 2,
            _ => 1,
        }
    }
}

impl Serialize for ConstantTag {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.as_u8().serialize(writer)
    }
}

/// Constant UTF-8 encoded raw string value, ready to be written out
///
/// Despite the name, the encoding is not quite UTF-8 (the encoding of the null character
/// `\u{0000}` and the encoding of supplementary characters is different).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utf8Constant(Vec<u8>);

impl Utf8Constant {
    pub fn new(string: &str) -> Result<Utf8Constant, Error> {
        let encoded = encode_modified_utf8(string);
        if encoded.len() > u16::MAX as usize {
            return Err(Error::Utf8TooLong(encoded.len()));
        }
        Ok(Utf8Constant(encoded))
    }

    /// Encoded bytes, without the length prefix
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Utf8Constant {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        ConstantTag::Utf8.serialize(writer)?;
        (self.0.len() as u16).serialize(writer)?;
        writer.write_all(&self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for byte in 0..=u8::MAX {
            if let Some(tag) = ConstantTag::from_u8(byte) {
                assert_eq!(tag.as_u8(), byte);
            }
        }
        assert_eq!(ConstantTag::from_u8(2), None);
        assert_eq!(ConstantTag::from_u8(24), None);
    }

    #[test]
    fn payload_sizes() {
        assert_eq!(ConstantTag::Class.fixed_size(), Some(2));
        assert_eq!(ConstantTag::MethodHandle.fixed_size(), Some(3));
        assert_eq!(ConstantTag::NameAndType.fixed_size(), Some(4));
        assert_eq!(ConstantTag::Double.fixed_size(), Some(8));
        assert_eq!(ConstantTag::Utf8.fixed_size(), None);
        assert_eq!(ConstantTag::Long.width(), 2);
        assert_eq!(ConstantTag::Integer.width(), 1);
    }

    #[test]
    fn utf8_constant_layout() {
        let mut out: Vec<u8> = vec![];
        Utf8Constant::new("Hello").unwrap().serialize(&mut out).unwrap();
        assert_eq!(out, vec![1, 0, 5, b'H', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn utf8_constant_too_long() {
        let long = "x".repeat(u16::MAX as usize + 1);
        assert!(matches!(
            Utf8Constant::new(&long),
            Err(Error::Utf8TooLong(65536))
        ));
        assert!(Utf8Constant::new(&long[1..]).is_ok());
    }
}

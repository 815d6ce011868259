//! Shallow walk over a class file
//!
//! Only the constant pool is decoded into entries. The rest of the class (fields, methods,
//! attributes) is walked just far enough to learn which `CONSTANT_Utf8_info` entries are used as
//! descriptors or signatures, since those are the ones worth splitting into package and class
//! names.

use super::{decode_modified_utf8, ClassCursor, ConstantTag, Error};
use std::collections::{HashMap, HashSet};

/// Magic header bytes that go at the front of the serialized class file
pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

/// Size of the magic, minor version, and major version
pub const CLASS_HEADER_SIZE: usize = 8;

const SIGNATURE_ATTRIBUTE: &[u8] = b"Signature";

/// One constant pool entry, borrowed from the class bytes
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PoolEntry<'a> {
    /// Index in the constant pool (starts at 1)
    pub index: u16,
    pub tag: ConstantTag,

    /// Bytes following the tag (for UTF-8 entries, the string bytes without the length prefix)
    pub payload: &'a [u8],
}

impl<'a> PoolEntry<'a> {
    /// Read a big endian `u16` out of the payload
    fn u2_at(&self, offset: usize) -> Option<u16> {
        let bytes = self.payload.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Decode the payload of a UTF-8 entry
    pub fn as_string(&self) -> Result<Option<String>, Error> {
        if self.tag == ConstantTag::Utf8 {
            decode_modified_utf8(self.payload).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[derive(Debug)]
pub struct ClassScan<'a> {
    /// Magic and version numbers
    pub header: &'a [u8],

    /// Constant pool count, as written in the class (one more than the largest index)
    pub pool_count: u16,

    pub entries: Vec<PoolEntry<'a>>,

    /// Offset of the first byte after the constant pool
    pub pool_end: usize,

    descriptors: HashSet<u16>,
}

impl<'a> ClassScan<'a> {
    pub fn new(class: &'a [u8]) -> Result<ClassScan<'a>, Error> {
        let mut cursor = ClassCursor::new(class);

        let magic = cursor.u4()?;
        if magic != CLASS_MAGIC {
            return Err(Error::NotAClassFile(magic));
        }
        cursor.skip(CLASS_HEADER_SIZE - 4)?;
        let header = &class[..CLASS_HEADER_SIZE];

        let pool_count = cursor.u2()?;
        let mut entries = vec![];
        let mut index: u32 = 1;
        while index < pool_count as u32 {
            let tag_byte = cursor.u1()?;
            let tag = ConstantTag::from_u8(tag_byte).ok_or(Error::UnknownConstantTag {
                tag: tag_byte,
                index,
            })?;
            let payload = match (tag, tag.fixed_size()) {
                (ConstantTag::Utf8, _) => {
                    let len = cursor.u2()?;
                    cursor.take_slice(len as usize)?
                }
                (_, Some(size)) => cursor.take_slice(size)?,
                (_, None) => {
                    // Externalized entries only exist inside compressed images
                    return Err(Error::UnknownConstantTag {
                        tag: tag_byte,
                        index,
                    });
                }
            };
            entries.push(PoolEntry {
                index: index as u16,
                tag,
                payload,
            });
            index += tag.width();
        }
        let pool_end = cursor.position();

        let mut scan = ClassScan {
            header,
            pool_count,
            entries,
            pool_end,
            descriptors: HashSet::new(),
        };
        scan.find_descriptors(&mut cursor)?;
        Ok(scan)
    }

    /// Is this UTF-8 entry used as a descriptor or a signature somewhere in the class?
    pub fn is_descriptor(&self, index: u16) -> bool {
        self.descriptors.contains(&index)
    }

    fn find_descriptors(&mut self, cursor: &mut ClassCursor<'a>) -> Result<(), Error> {
        let utf8s: HashMap<u16, &[u8]> = self
            .entries
            .iter()
            .filter(|entry| entry.tag == ConstantTag::Utf8)
            .map(|entry| (entry.index, entry.payload))
            .collect();

        for entry in &self.entries {
            let descriptor = match entry.tag {
                ConstantTag::NameAndType => entry.u2_at(2),
                ConstantTag::MethodType => entry.u2_at(0),
                _ => None,
            };
            self.descriptors.extend(descriptor);
        }

        // access_flags, this_class, super_class
        cursor.skip(6)?;
        let interfaces_count = cursor.u2()?;
        cursor.skip(2 * interfaces_count as usize)?;

        // fields, then methods
        for _ in 0..2 {
            let members_count = cursor.u2()?;
            for _ in 0..members_count {
                cursor.skip(4)?;
                self.descriptors.insert(cursor.u2()?);
                self.scan_attributes(cursor, &utf8s)?;
            }
        }

        self.scan_attributes(cursor, &utf8s)
    }

    fn scan_attributes(
        &mut self,
        cursor: &mut ClassCursor<'a>,
        utf8s: &HashMap<u16, &[u8]>,
    ) -> Result<(), Error> {
        let attributes_count = cursor.u2()?;
        for _ in 0..attributes_count {
            let name_index = cursor.u2()?;
            let length = cursor.u4()? as usize;
            let info = cursor.take_slice(length)?;
            if utf8s.get(&name_index) == Some(&SIGNATURE_ATTRIBUTE) && info.len() == 2 {
                self.descriptors.insert(u16::from_be_bytes([info[0], info[1]]));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn utf8(string: &str) -> Vec<u8> {
        let mut entry = vec![1];
        entry.extend((string.len() as u16).to_be_bytes());
        entry.extend(string.as_bytes());
        entry
    }

    /// `class Foo { List<String> names; }`, more or less
    fn sample_class() -> Vec<u8> {
        let mut class = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 61];
        class.extend([0, 12]);
        class.extend(utf8("Foo")); // 1
        class.extend([7, 0, 1]); // 2
        class.extend(utf8("java/lang/Object")); // 3
        class.extend([7, 0, 3]); // 4
        class.extend(utf8("names")); // 5
        class.extend(utf8("Ljava/util/List;")); // 6
        class.extend(utf8("Signature")); // 7
        class.extend(utf8("Ljava/util/List<Ljava/lang/String;>;")); // 8
        class.extend([5, 0, 0, 0, 0, 0, 0, 0, 9]); // 9, 10
        class.extend(utf8("()V")); // 11
        class.extend([0, 0x21, 0, 2, 0, 4, 0, 0]);
        class.extend([0, 1, 0, 2, 0, 5, 0, 6, 0, 1, 0, 7, 0, 0, 0, 2, 0, 8]);
        class.extend([0, 0, 0, 0]);
        class
    }

    #[test]
    fn scans_pool() {
        let class = sample_class();
        let scan = ClassScan::new(&class).unwrap();
        assert_eq!(scan.pool_count, 12);
        let indices: Vec<u16> = scan.entries.iter().map(|entry| entry.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 11]);
        assert_eq!(scan.entries[1].tag, ConstantTag::Class);
        assert_eq!(scan.entries[1].payload, &[0, 1]);
        assert_eq!(scan.entries[8].tag, ConstantTag::Long);
        assert_eq!(
            scan.entries[9].as_string().unwrap(),
            Some(String::from("()V"))
        );
        assert_eq!(&class[scan.pool_end..scan.pool_end + 2], &[0, 0x21]);
    }

    #[test]
    fn finds_field_descriptors_and_signatures() {
        let class = sample_class();
        let scan = ClassScan::new(&class).unwrap();
        assert!(scan.is_descriptor(6));
        assert!(scan.is_descriptor(8));
        assert!(!scan.is_descriptor(1));
        assert!(!scan.is_descriptor(3));
        assert!(!scan.is_descriptor(11));
    }

    #[test]
    fn rejects_non_class() {
        assert!(matches!(
            ClassScan::new(&[0xCA, 0xFE, 0xFA, 0xFA, 0, 0, 0, 0]),
            Err(Error::NotAClassFile(0xCAFE_FAFA))
        ));
        assert!(matches!(
            ClassScan::new(&[0xCA, 0xFE]),
            Err(Error::TruncatedStream)
        ));
    }

    #[test]
    fn rejects_unknown_tags() {
        let mut class = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 61, 0, 2, 2, 0, 0];
        class.extend([0; 10]);
        assert!(matches!(
            ClassScan::new(&class),
            Err(Error::UnknownConstantTag { tag: 2, index: 1 })
        ));
    }
}

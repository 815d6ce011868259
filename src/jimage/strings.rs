use super::{Error, Result};
use crate::jvm::{decode_modified_utf8, encode_modified_utf8};
use std::borrow::Cow;
use std::collections::HashMap;

/// Read access to the string table shared by all resources of an image
pub trait StringsProvider {
    /// String stored at `offset`, if there is one
    fn get_string(&self, offset: i32) -> Option<Cow<'_, str>>;
}

/// Write access to a string table, used when compressing resources
pub trait StringsWriter {
    /// Add a string (or find an identical one already in the table) and return its offset
    fn add_string(&mut self, string: &str) -> Result<i32>;
}

impl StringsProvider for HashMap<i32, String> {
    fn get_string(&self, offset: i32) -> Option<Cow<'_, str>> {
        self.get(&offset).map(|string| Cow::Borrowed(string.as_str()))
    }
}

impl<T: StringsProvider + ?Sized> StringsProvider for &T {
    fn get_string(&self, offset: i32) -> Option<Cow<'_, str>> {
        (**self).get_string(offset)
    }
}

/// Image string table
///
/// Strings are stored back to back, each one encoded in modified UTF-8 and followed by a `0`
/// byte (modified UTF-8 never contains `0`). A string is identified by the byte offset of its
/// first byte. New tables put the empty string at offset 0; a table loaded with
/// [`ImageStrings::from_bytes`] keeps its own layout and only gets an empty string appended if it
/// has none.
#[derive(Clone, Debug)]
pub struct ImageStrings {
    bytes: Vec<u8>,
    offsets: HashMap<String, i32>,
}

impl ImageStrings {
    /// Table containing only the empty string
    pub fn new() -> ImageStrings {
        let mut offsets = HashMap::new();
        offsets.insert(String::new(), 0);
        ImageStrings {
            bytes: vec![0],
            offsets,
        }
    }

    /// Load a table from its serialized form
    pub fn from_bytes(bytes: Vec<u8>) -> Result<ImageStrings> {
        if bytes.last().map_or(false, |last| *last != 0) {
            let msg = String::from("string table does not end with a terminator");
            return Err(Error::InvalidArgument(msg));
        }
        if bytes.len() > i32::MAX as usize {
            let msg = format!("string table of {} bytes is too large", bytes.len());
            return Err(Error::InvalidArgument(msg));
        }

        let mut offsets = HashMap::new();
        let mut start = 0;
        for (end, byte) in bytes.iter().enumerate() {
            if *byte == 0 {
                let string = decode_modified_utf8(&bytes[start..end])?;
                offsets.entry(string).or_insert(start as i32);
                start = end + 1;
            }
        }

        let mut strings = ImageStrings { bytes, offsets };
        if !strings.offsets.contains_key("") {
            strings.add_string("")?;
        }
        Ok(strings)
    }

    /// Serialized form of the table
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of distinct strings
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl Default for ImageStrings {
    fn default() -> ImageStrings {
        ImageStrings::new()
    }
}

impl StringsProvider for ImageStrings {
    fn get_string(&self, offset: i32) -> Option<Cow<'_, str>> {
        let start = usize::try_from(offset).ok()?;
        let rest = self.bytes.get(start..)?;
        let end = rest.iter().position(|byte| *byte == 0)?;
        let encoded = &rest[..end];
        if encoded.is_ascii() {
            std::str::from_utf8(encoded).ok().map(Cow::Borrowed)
        } else {
            decode_modified_utf8(encoded).ok().map(Cow::Owned)
        }
    }
}

impl StringsWriter for ImageStrings {
    fn add_string(&mut self, string: &str) -> Result<i32> {
        if let Some(offset) = self.offsets.get(string) {
            return Ok(*offset);
        }

        let encoded = encode_modified_utf8(string);
        let offset = i32::try_from(self.bytes.len())
            .ok()
            .filter(|offset| offset.checked_add(encoded.len() as i32 + 1).is_some())
            .ok_or_else(|| Error::InvalidArgument(String::from("string table is full")))?;
        self.bytes.extend_from_slice(&encoded);
        self.bytes.push(0);
        self.offsets.insert(string.to_owned(), offset);
        Ok(offset)
    }
}

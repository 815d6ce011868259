use super::Error;

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::with_capacity(string.len());
    for c in string.chars() {
        // Handle the exception for how `\u{0000}` is represented
        let len: usize = if c == '\u{0000}' { 2 } else { c.len_utf8() };
        let code: u32 = c as u32;

        match len {
            1 => buffer.push(code as u8),
            2 => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            3 => {
                buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }

            // Supplementary characters: main divergence from unicode
            _ => {
                buffer.push(0b1110_1101);
                buffer.push(((code >> 16 & 0x0F) as u8).wrapping_sub(1) & 0x0F | 0b1010_0000);
                buffer.push((code >> 10 & 0x3F) as u8 | 0b1000_0000);

                buffer.push(0b1110_1101);
                buffer.push(((code >> 6 & 0x1F) as u8) | 0b1011_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}

/// Inverse of [`encode_modified_utf8`]
///
/// Decoding goes through UTF-16 code units, since that is what the 3-byte groups actually encode.
/// Unpaired surrogates are rejected. A raw `0x00` byte is accepted the same way
/// `DataInputStream.readUTF` accepts it.
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String, Error> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b >> 4 {
            0..=7 => {
                units.push(b as u16);
                i += 1;
            }
            12 | 13 => {
                let b2 = continuation(bytes, i + 1)?;
                units.push((b as u16 & 0x1F) << 6 | b2);
                i += 2;
            }
            14 => {
                let b2 = continuation(bytes, i + 1)?;
                let b3 = continuation(bytes, i + 2)?;
                units.push((b as u16 & 0x0F) << 12 | b2 << 6 | b3);
                i += 3;
            }
            _ => {
                let msg = format!("unexpected byte {:#04x} at offset {}", b, i);
                return Err(Error::InvalidModifiedUtf8(msg));
            }
        }
    }

    String::from_utf16(&units)
        .map_err(|_| Error::InvalidModifiedUtf8(String::from("unpaired surrogate")))
}

fn continuation(bytes: &[u8], at: usize) -> Result<u16, Error> {
    match bytes.get(at) {
        Some(b) if b & 0b1100_0000 == 0b1000_0000 => Ok((b & 0x3F) as u16),
        Some(b) => {
            let msg = format!("bad continuation byte {:#04x} at offset {}", b, at);
            Err(Error::InvalidModifiedUtf8(msg))
        }
        None => Err(Error::InvalidModifiedUtf8(String::from("truncated sequence"))),
    }
}


#[cfg(test)]
mod decode_modified_utf8_tests {
    use super::*;

    #[test]
    fn inverts_encoding() {
        for string in ["", "Hello", "a\x00a", "ĄǍǞǠ", "ऄअॲঅ", "\u{10000}x\u{10FFFF}"] {
            let encoded = encode_modified_utf8(string);
            assert_eq!(decode_modified_utf8(&encoded).unwrap(), string);
        }
    }

    #[test]
    fn rejects_four_byte_utf8() {
        assert!(matches!(
            decode_modified_utf8("\u{1F600}".as_bytes()),
            Err(Error::InvalidModifiedUtf8(_))
        ));
    }

    #[test]
    fn rejects_truncated_and_lone_surrogates() {
        assert!(decode_modified_utf8(&[0xE0, 0xA4]).is_err());
        assert!(decode_modified_utf8(&[0xC4, 0x04]).is_err());
        assert!(decode_modified_utf8(&[237, 160, 128]).is_err());
    }
}

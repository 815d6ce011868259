use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Tried to read past the end of the class file
    TruncatedStream,

    /// Constant pool entry has a tag outside of the known table
    UnknownConstantTag { tag: u8, index: u32 },

    /// Descriptor does not have the shape the caller expected
    MalformedDescriptor(String),

    /// Encoded string does not fit in the `u16` length of a `CONSTANT_Utf8_info`
    Utf8TooLong(usize),

    /// Bytes are not valid modified UTF-8
    InvalidModifiedUtf8(String),

    /// First four bytes are not `0xCAFEBABE`
    NotAClassFile(u32),

    IoError(std::io::Error),
}

/// Running out of input is the only I/O failure reading an in-memory class can produce, so that
/// case gets its own variant.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::TruncatedStream
        } else {
            Error::IoError(err)
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TruncatedStream => f.write_str("unexpected end of class file"),
            Error::UnknownConstantTag { tag, index } => {
                write!(f, "unknown constant pool tag {} at index {}", tag, index)
            }
            Error::MalformedDescriptor(msg) => write!(f, "malformed descriptor: {}", msg),
            Error::Utf8TooLong(len) => {
                write!(f, "string of {} encoded bytes is too long for a class file", len)
            }
            Error::InvalidModifiedUtf8(msg) => write!(f, "invalid modified UTF-8: {}", msg),
            Error::NotAClassFile(magic) => write!(f, "bad class file magic {:#010x}", magic),
            Error::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

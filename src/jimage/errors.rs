use crate::jvm;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Something went wrong inside the class file being rewritten
    ClassFile(jvm::Error),

    /// Value passed in is outside the domain of the operation (eg. a varint above `i32::MAX`)
    InvalidArgument(String),

    /// Compressed varint whose header claims a length of zero bytes
    MalformedVarInt { header: u8 },

    /// Tried to read past the end of the resource
    TruncatedStream,

    /// The string table has no string at this offset
    MissingString(i32),

    /// The string table has no decompressor name at this offset
    PluginNameNotFound(i32),

    /// No decompressor is registered under this name
    UnknownPlugin(String),

    /// Stored decompressor configuration is not a valid XML property set
    InvalidProperties(String),

    /// Decompressed resource does not have the size the header promised
    SizeMismatch { expected: u64, actual: usize },

    IoError(std::io::Error),

    /// A decompressor failed on its input
    ///
    /// This is the only error that decompressor implementations surface through the pipeline. The
    /// underlying cause is kept for diagnostics.
    DecompressionFailed { plugin: String, cause: Box<Error> },
}

impl From<jvm::Error> for Error {
    fn from(err: jvm::Error) -> Error {
        Error::ClassFile(err)
    }
}

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
            Error::ClassFile(err) => write!(f, "class file: {}", err),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::MalformedVarInt { header } => {
                write!(f, "compressed index header {:#04x} has no length", header)
            }
            Error::TruncatedStream => f.write_str("unexpected end of resource"),
            Error::MissingString(offset) => write!(f, "no string at offset {}", offset),
            Error::PluginNameNotFound(offset) => {
                write!(f, "plugin name not found (offset {})", offset)
            }
            Error::UnknownPlugin(name) => write!(f, "plugin not found: {}", name),
            Error::InvalidProperties(msg) => write!(f, "invalid stored properties: {}", msg),
            Error::SizeMismatch { expected, actual } => write!(
                f,
                "resource content size mismatch (expected {}, got {})",
                expected, actual
            ),
            Error::IoError(err) => write!(f, "I/O error: {}", err),
            Error::DecompressionFailed { plugin, cause } => {
                write!(f, "decompression with '{}' failed: {}", plugin, cause)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ClassFile(err) => Some(err),
            Error::IoError(err) => Some(err),
            Error::DecompressionFailed { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Compressed jimage resources
//!
//! Resources in a jimage file may have gone through a stack of compressors when the image was
//! linked. Each compressor prepends a [`CompressedResourceHeader`] naming itself (through an
//! offset into the image string table) so that a [`Decompressor`] can later undo the steps one at
//! a time, outermost first.
//!
//! Two plugins are built in:
//!
//!   - `zip`: plain zlib deflate
//!   - `compact-cp`: moves constant pool strings of class files into the string table
//!
//! ```
//! use jimage_decompress::jimage::*;
//!
//! let mut strings = ImageStrings::new();
//! let resource = compress_resource(
//!     &ZipCompressor::default(),
//!     &mut strings,
//!     b"module-info",
//!     Endianness::Big,
//! )
//! .unwrap();
//!
//! let mut decompressor = Decompressor::new();
//! let original = decompressor
//!     .decompress_resource(Endianness::Big, &strings, &resource)
//!     .unwrap();
//! assert_eq!(original, b"module-info");
//! ```

mod compressor;
mod decompressor;
mod errors;
mod header;
mod properties;
mod repository;
mod string_sharing;
mod strings;
pub mod varint;
mod zip;

pub use compressor::*;
pub use decompressor::*;
pub use errors::*;
pub use header::*;
pub use properties::*;
pub use repository::*;
pub use string_sharing::*;
pub use strings::*;
pub use zip::*;

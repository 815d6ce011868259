//! Just enough of the JVM class file format to rewrite constant pools
//!
//! Compressed jimage resources are mostly class files whose constant pool has been tampered with,
//! so this module provides the pieces needed to walk a constant pool entry by entry, re-encode
//! strings the way class files expect them, and split descriptors into package and class names.

mod binary_format;
pub mod class_scan;
mod constants;
mod errors;
mod modified_utf8;
pub mod signature;

pub use binary_format::*;
pub use constants::*;
pub use errors::*;
pub use modified_utf8::*;

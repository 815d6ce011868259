//! Decompression of jimage resources
//!
//! The [`jimage`] module peels compression steps off resources stored in a jimage file, while
//! [`jvm`] holds the bits of the class file format needed to put shared strings back into
//! constant pools.

pub mod jimage;
pub mod jvm;

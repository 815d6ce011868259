use super::{
    Error, Properties, ResourceCompressor, ResourceDecompressor, Result, StringsProvider,
    StringsWriter,
};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Property holding the compression level (`0` to `9`)
pub const ZIP_LEVEL_PROPERTY: &str = "zip-level";

/// Inflates zlib-wrapped deflate data
#[derive(Debug, Default)]
pub struct ZipDecompressor;

impl ZipDecompressor {
    pub const NAME: &'static str = "zip";

    pub fn factory(_config: &Properties) -> Box<dyn ResourceDecompressor> {
        Box::new(ZipDecompressor)
    }
}

impl ResourceDecompressor for ZipDecompressor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn decompress(
        &self,
        _strings: &dyn StringsProvider,
        content: &[u8],
        offset: usize,
        original_size: u64,
    ) -> Result<Vec<u8>> {
        let expected = usize::try_from(original_size).map_err(|_| {
            let msg = format!("uncompressed size {} is too large", original_size);
            Error::InvalidArgument(msg)
        })?;
        let payload = content.get(offset..).ok_or(Error::TruncatedStream)?;

        // Never trust the recorded size with more than the input could plausibly inflate to
        let mut out = Vec::with_capacity(expected.min(payload.len().saturating_mul(8)));
        ZlibDecoder::new(payload)
            .take(original_size)
            .read_to_end(&mut out)?;

        if out.len() != expected {
            return Err(Error::SizeMismatch {
                expected: original_size,
                actual: out.len(),
            });
        }
        Ok(out)
    }
}

/// Deflates resources with zlib
#[derive(Copy, Clone, Debug)]
pub struct ZipCompressor {
    level: Compression,
}

impl ZipCompressor {
    pub fn new(level: u32) -> Result<ZipCompressor> {
        if level > 9 {
            let msg = format!("zip level must be between 0 and 9, not {}", level);
            return Err(Error::InvalidArgument(msg));
        }
        Ok(ZipCompressor {
            level: Compression::new(level),
        })
    }

    /// Compressor configured from the `zip-level` property, if it is set
    pub fn from_properties(config: &Properties) -> Result<ZipCompressor> {
        match config.get(ZIP_LEVEL_PROPERTY) {
            None => Ok(ZipCompressor::default()),
            Some(level) => {
                let level = level.trim().parse::<u32>().map_err(|_| {
                    let msg = format!("invalid {}: '{}'", ZIP_LEVEL_PROPERTY, level);
                    Error::InvalidArgument(msg)
                })?;
                ZipCompressor::new(level)
            }
        }
    }

    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl Default for ZipCompressor {
    fn default() -> ZipCompressor {
        ZipCompressor {
            level: Compression::best(),
        }
    }
}

impl ResourceCompressor for ZipCompressor {
    fn name(&self) -> &str {
        ZipDecompressor::NAME
    }

    fn config(&self) -> Option<Properties> {
        let mut config = Properties::new();
        config.set(ZIP_LEVEL_PROPERTY, self.level().to_string());
        Some(config)
    }

    fn compress(&self, _strings: &mut dyn StringsWriter, content: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(content.len() / 2), self.level);
        encoder.write_all(content)?;
        Ok(encoder.finish()?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn deflate(content: &[u8]) -> Vec<u8> {
        let mut strings = crate::jimage::ImageStrings::new();
        ZipCompressor::default().compress(&mut strings, content).unwrap()
    }

    #[test]
    fn inflates() {
        let content = b"hello hello hello hello hello hello".to_vec();
        let mut resource = vec![0xAB; 29];
        resource.extend(deflate(&content));

        let strings: HashMap<i32, String> = HashMap::new();
        let out = ZipDecompressor
            .decompress(&strings, &resource, 29, content.len() as u64)
            .unwrap();
        assert_eq!(out, content);
    }

    #[test]
    fn empty_content() {
        let strings: HashMap<i32, String> = HashMap::new();
        let out = ZipDecompressor
            .decompress(&strings, &deflate(b""), 0, 0)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn size_mismatch() {
        let strings: HashMap<i32, String> = HashMap::new();
        let compressed = deflate(b"twelve bytes");
        assert!(matches!(
            ZipDecompressor.decompress(&strings, &compressed, 0, 20),
            Err(Error::SizeMismatch {
                expected: 20,
                actual: 12
            })
        ));

        // Output beyond the recorded size is ignored
        assert!(matches!(
            ZipDecompressor.decompress(&strings, &compressed, 0, 5),
            Ok(out) if out == b"twelv"
        ));
    }

    #[test]
    fn corrupt_stream() {
        let strings: HashMap<i32, String> = HashMap::new();
        let result = ZipDecompressor.decompress(&strings, b"definitely not zlib", 0, 10);
        assert!(result.is_err());
    }

    #[test]
    fn levels() {
        assert_eq!(ZipCompressor::default().level(), 9);
        assert_eq!(ZipCompressor::new(1).unwrap().level(), 1);
        assert!(matches!(
            ZipCompressor::new(10),
            Err(Error::InvalidArgument(_))
        ));

        let mut config = Properties::new();
        assert_eq!(ZipCompressor::from_properties(&config).unwrap().level(), 9);
        config.set(ZIP_LEVEL_PROPERTY, "3");
        assert_eq!(ZipCompressor::from_properties(&config).unwrap().level(), 3);
        config.set(ZIP_LEVEL_PROPERTY, "fast");
        assert!(ZipCompressor::from_properties(&config).is_err());
    }

    #[test]
    fn config_is_stored() {
        let config = ZipCompressor::new(4).unwrap().config().unwrap();
        assert_eq!(config.get(ZIP_LEVEL_PROPERTY), Some("4"));
    }
}

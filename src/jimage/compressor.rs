use super::{
    CompressedResourceHeader, Endianness, Error, Properties, Result, StringSharingCompressor,
    StringsWriter, ZipCompressor,
};
use log::debug;

/// One kind of compression, as applied when an image is built
pub trait ResourceCompressor {
    /// Name of the decompressor that undoes this compression
    fn name(&self) -> &str;

    /// Configuration the decompressor needs, stored in the string table next to the name
    fn config(&self) -> Option<Properties> {
        None
    }

    fn compress(&self, strings: &mut dyn StringsWriter, content: &[u8]) -> Result<Vec<u8>>;
}

/// Make a compressor for a plugin name
pub fn compressor_for(name: &str, config: &Properties) -> Result<Box<dyn ResourceCompressor>> {
    match name {
        "zip" => Ok(Box::new(ZipCompressor::from_properties(config)?)),
        "compact-cp" => Ok(Box::new(StringSharingCompressor)),
        _ => Err(Error::UnknownPlugin(name.to_owned())),
    }
}

/// Compress a resource and prefix the result with its header
///
/// The resource may already be compressed, in which case the new step wraps the old one.
pub fn compress_resource(
    compressor: &dyn ResourceCompressor,
    strings: &mut dyn StringsWriter,
    content: &[u8],
    order: Endianness,
) -> Result<Vec<u8>> {
    let is_terminal = CompressedResourceHeader::read(content, order).is_none();
    let body = compressor.compress(strings, content)?;

    let header = CompressedResourceHeader {
        compressed_size: body.len() as u64,
        uncompressed_size: content.len() as u64,
        decompressor_name_offset: strings.add_string(compressor.name())?,
        content_offset: match compressor.config() {
            Some(config) => strings.add_string(&config.to_xml())?,
            None => CompressedResourceHeader::NO_CONTENT,
        },
        is_terminal,
    };
    debug!(
        "Compressed resource with {}: {} -> {} bytes",
        compressor.name(),
        content.len(),
        body.len()
    );

    let mut out = Vec::with_capacity(CompressedResourceHeader::SIZE + body.len());
    header.write(&mut out, order)?;
    out.extend_from_slice(&body);
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jimage::{ImageStrings, StringsProvider};

    #[test]
    fn writes_header() {
        let mut strings = ImageStrings::new();
        let content = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let resource =
            compress_resource(&ZipCompressor::default(), &mut strings, content, Endianness::Big)
                .unwrap();

        let header = CompressedResourceHeader::read(&resource, Endianness::Big).unwrap();
        assert_eq!(header.uncompressed_size, content.len() as u64);
        assert_eq!(
            header.compressed_size as usize,
            resource.len() - CompressedResourceHeader::SIZE
        );
        assert!(header.is_terminal);
        assert_eq!(header.decompressor_name(&strings).unwrap(), "zip");

        let config = header.stored_content(&strings).unwrap().unwrap();
        let config = Properties::from_xml(&config).unwrap();
        assert_eq!(config.get("zip-level"), Some("9"));
    }

    #[test]
    fn stacked_steps_are_not_terminal() {
        let mut strings = ImageStrings::new();
        let zip = ZipCompressor::new(1).unwrap();
        let once = compress_resource(&zip, &mut strings, b"content", Endianness::Little).unwrap();
        let twice = compress_resource(&zip, &mut strings, &once, Endianness::Little).unwrap();

        let header = CompressedResourceHeader::read(&twice, Endianness::Little).unwrap();
        assert!(!header.is_terminal);
        assert_eq!(header.uncompressed_size, once.len() as u64);
    }

    #[test]
    fn compressors_by_name() {
        let config = Properties::new();
        assert_eq!(compressor_for("zip", &config).unwrap().name(), "zip");
        let string_sharing = compressor_for("compact-cp", &config).unwrap();
        assert_eq!(string_sharing.name(), "compact-cp");
        assert!(string_sharing.config().is_none());
        assert!(matches!(
            compressor_for("lz4", &config),
            Err(Error::UnknownPlugin(_))
        ));
    }

    #[test]
    fn no_config_means_no_content() {
        struct Identity;
        impl ResourceCompressor for Identity {
            fn name(&self) -> &str {
                "identity"
            }
            fn compress(&self, _: &mut dyn StringsWriter, content: &[u8]) -> Result<Vec<u8>> {
                Ok(content.to_vec())
            }
        }

        let mut strings = ImageStrings::new();
        let resource = compress_resource(&Identity, &mut strings, b"x", Endianness::Big).unwrap();
        let header = CompressedResourceHeader::read(&resource, Endianness::Big).unwrap();
        assert_eq!(header.content_offset, CompressedResourceHeader::NO_CONTENT);
        assert_eq!(
            strings.get_string(header.decompressor_name_offset).as_deref(),
            Some("identity")
        );
        assert_eq!(&resource[CompressedResourceHeader::SIZE..], b"x");
    }
}

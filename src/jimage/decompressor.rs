use super::{
    CompressedResourceHeader, DecompressorRepository, Endianness, Error, Properties, Result,
    StringsProvider,
};
use log::{debug, trace};
use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Undoes one kind of compression
pub trait ResourceDecompressor {
    /// Name under which the compressor recorded itself in the header
    fn name(&self) -> &str;

    /// Decompress the payload starting at `content[offset..]`
    ///
    /// `original_size` is the uncompressed size recorded in the header. `content` still includes
    /// the header that was just read, which is why the payload offset is passed separately.
    fn decompress(
        &self,
        strings: &dyn StringsProvider,
        content: &[u8],
        offset: usize,
        original_size: u64,
    ) -> Result<Vec<u8>>;
}

/// Undoes every compression step applied to a resource
///
/// Compressors can be stacked, each one prepending a [`CompressedResourceHeader`] to the output of
/// the previous one. Decompression peels off one header at a time until the resource no longer
/// starts with one.
///
/// Decompressors are created on first use and then cached by the string table offset of their
/// name, so a `Decompressor` should not be shared between images with different string tables.
pub struct Decompressor<'r> {
    repository: &'r DecompressorRepository,
    plugins_cache: HashMap<i32, Box<dyn ResourceDecompressor>>,
}

impl Decompressor<'static> {
    /// Decompressor knowing only about the built-in plugins
    pub fn new() -> Decompressor<'static> {
        Decompressor::with_repository(DecompressorRepository::builtin())
    }
}

impl Default for Decompressor<'static> {
    fn default() -> Self {
        Decompressor::new()
    }
}

impl<'r> Decompressor<'r> {
    pub fn with_repository(repository: &'r DecompressorRepository) -> Decompressor<'r> {
        Decompressor {
            repository,
            plugins_cache: HashMap::new(),
        }
    }

    /// Number of decompressors created so far
    pub fn cached_decompressors(&self) -> usize {
        self.plugins_cache.len()
    }

    /// Decompress a resource
    ///
    /// A resource which does not start with a header is returned unchanged.
    pub fn decompress_resource(
        &mut self,
        order: Endianness,
        strings: &dyn StringsProvider,
        content: &[u8],
    ) -> Result<Vec<u8>> {
        let mut current: Cow<[u8]> = Cow::Borrowed(content);
        let mut steps = 0;

        while let Some(header) = CompressedResourceHeader::read(&current, order) {
            let decompressor = self.decompressor_for(&header, strings)?;
            trace!(
                "Step {}: {} ({} -> {} bytes, terminal: {})",
                steps,
                decompressor.name(),
                header.compressed_size,
                header.uncompressed_size,
                header.is_terminal,
            );

            let decompressed = decompressor
                .decompress(
                    strings,
                    &current,
                    CompressedResourceHeader::SIZE,
                    header.uncompressed_size,
                )
                .map_err(|cause| Error::DecompressionFailed {
                    plugin: decompressor.name().to_owned(),
                    cause: Box::new(cause),
                })?;
            current = Cow::Owned(decompressed);
            steps += 1;
        }

        debug!(
            "Decompressed resource in {} step(s): {} -> {} bytes",
            steps,
            content.len(),
            current.len()
        );
        Ok(current.into_owned())
    }

    fn decompressor_for(
        &mut self,
        header: &CompressedResourceHeader,
        strings: &dyn StringsProvider,
    ) -> Result<&dyn ResourceDecompressor> {
        let decompressor = match self.plugins_cache.entry(header.decompressor_name_offset) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let name = header.decompressor_name(strings)?;
                let config = match header.stored_content(strings)? {
                    Some(xml) => Properties::from_xml(&xml)?,
                    None => Properties::new(),
                };
                let decompressor = self
                    .repository
                    .new_decompressor(&name, &config)
                    .ok_or_else(|| Error::UnknownPlugin(name.to_string()))?;
                debug!("Created '{}' decompressor", name);
                entry.insert(decompressor)
            }
        };
        Ok(&**decompressor)
    }
}

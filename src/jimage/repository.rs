use super::{Properties, ResourceDecompressor, StringSharingDecompressor, ZipDecompressor};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Builds a decompressor from the configuration stored alongside a resource
pub type DecompressorFactory = fn(&Properties) -> Box<dyn ResourceDecompressor>;

/// Decompressor factories, by plugin name
#[derive(Clone, Default)]
pub struct DecompressorRepository {
    factories: HashMap<String, DecompressorFactory>,
}

impl DecompressorRepository {
    /// Repository without any decompressors
    pub fn new() -> DecompressorRepository {
        DecompressorRepository::default()
    }

    /// Repository with the `zip` and `compact-cp` decompressors
    pub fn with_builtins() -> DecompressorRepository {
        let mut repository = DecompressorRepository::new();
        repository.register(ZipDecompressor::NAME, ZipDecompressor::factory);
        repository.register(
            StringSharingDecompressor::NAME,
            StringSharingDecompressor::factory,
        );
        repository
    }

    /// Shared repository of built-in decompressors
    pub fn builtin() -> &'static DecompressorRepository {
        static BUILTIN: OnceLock<DecompressorRepository> = OnceLock::new();
        BUILTIN.get_or_init(DecompressorRepository::with_builtins)
    }

    /// Register a factory, returning the one it replaces
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: DecompressorFactory,
    ) -> Option<DecompressorFactory> {
        self.factories.insert(name.into(), factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered plugin names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Make a new decompressor, or `None` if no plugin has this name
    pub fn new_decompressor(
        &self,
        name: &str,
        config: &Properties,
    ) -> Option<Box<dyn ResourceDecompressor>> {
        self.factories.get(name).map(|factory| factory(config))
    }
}

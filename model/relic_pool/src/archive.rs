//! Archive and resolver contracts.
//!
//! Concrete containers (directory trees, jar/zip files, runtime images) live
//! outside the model; the pool only needs to iterate binary class records,
//! optionally read a module descriptor record, and optionally consult
//! manifest metadata. Archives stay owned by whoever registered them — the
//! pool borrows byte sources and never closes them.

use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One binary class record: a binary name plus a repeatable byte reader.
pub trait ClassRecord: Send + Sync {
    /// Internal, slash-delimited binary name (`pkg/Outer$Inner`).
    fn binary_name(&self) -> &str;

    /// Read the record's bytes. Must be repeatable; the pool may defer the
    /// read until first lookup.
    fn bytes(&self) -> std::io::Result<Vec<u8>>;
}

/// A container of class records with optional module metadata.
pub trait Archive: Send + Sync {
    /// Iterate the archive's class records (excluding the module
    /// descriptor record).
    fn class_records(&self) -> Box<dyn Iterator<Item = Arc<dyn ClassRecord>> + '_>;

    /// The module descriptor record (`module-info`), if the archive has one.
    fn module_record(&self) -> Option<Arc<dyn ClassRecord>> {
        None
    }

    /// Manifest metadata, if the archive has any. Only consulted for the
    /// automatic-module-name fallback.
    fn manifest(&self) -> Option<&Manifest> {
        None
    }
}

/// Resolves a module name to the archive providing it.
///
/// The pool invokes registered resolvers in registration order during
/// module-closure computation and stops at the first success per name.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, module_name: &str) -> Option<Arc<dyn Archive>>;
}

/// Key/value manifest metadata.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: FxHashMap<String, String>,
}

impl Manifest {
    /// The manifest key naming an automatic module.
    pub const AUTOMATIC_MODULE_NAME: &'static str = "Automatic-Module-Name";

    pub fn new() -> Self {
        Manifest::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn automatic_module_name(&self) -> Option<&str> {
        self.get(Self::AUTOMATIC_MODULE_NAME)
    }
}

/// An in-memory record, for tests and simple embedders.
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    name: String,
    bytes: Vec<u8>,
}

impl MemoryRecord {
    pub fn new(name: &str, bytes: Vec<u8>) -> Self {
        MemoryRecord {
            name: name.to_string(),
            bytes,
        }
    }
}

impl ClassRecord for MemoryRecord {
    fn binary_name(&self) -> &str {
        &self.name
    }

    fn bytes(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// An in-memory archive, for tests and simple embedders.
#[derive(Default)]
pub struct MemoryArchive {
    records: Vec<Arc<dyn ClassRecord>>,
    module: Option<Arc<dyn ClassRecord>>,
    manifest: Option<Manifest>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        MemoryArchive::default()
    }

    /// Add a record by name and bytes.
    pub fn with_class(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.records.push(Arc::new(MemoryRecord::new(name, bytes)));
        self
    }

    /// Add a caller-provided record implementation.
    pub fn with_record(mut self, record: Arc<dyn ClassRecord>) -> Self {
        self.records.push(record);
        self
    }

    /// Set the module descriptor record.
    pub fn with_module(mut self, bytes: Vec<u8>) -> Self {
        self.module = Some(Arc::new(MemoryRecord::new("module-info", bytes)));
        self
    }

    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }
}

impl Archive for MemoryArchive {
    fn class_records(&self) -> Box<dyn Iterator<Item = Arc<dyn ClassRecord>> + '_> {
        Box::new(self.records.iter().cloned())
    }

    fn module_record(&self) -> Option<Arc<dyn ClassRecord>> {
        self.module.clone()
    }

    fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }
}

//! Pool tests.
//!
//! Tests are organized into modules by category:
//! - `pool`: registration, lookup, materialization, shadowing, and the
//!   module resolver chain with its closure walk
//! - `module`: directive decoding, ordering, flags, and lazy cross-module
//!   resolution
//! - `annot`: path-addressed annotation lookup and the parameter shift

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod annot;
mod pool;

use relic_class::testkit::ClassFile;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::archive::{Archive, ClassRecord, MemoryArchive, ModuleResolver};
use crate::TypePool;

/// Minimal class-record bytes for the given binary name.
fn class_bytes(name: &str) -> Vec<u8> {
    ClassFile::new(name).build()
}

/// A pool with one archive holding the given pre-built records.
fn pool_of(classes: &[(&str, Vec<u8>)]) -> TypePool {
    let pool = TypePool::new();
    let mut archive = MemoryArchive::new();
    for (name, bytes) in classes {
        archive = archive.with_class(name, bytes.clone());
    }
    pool.register_archive(Arc::new(archive)).unwrap();
    pool
}

/// A record that counts how many times its bytes are read.
struct CountingRecord {
    name: String,
    bytes: Vec<u8>,
    reads: Arc<AtomicUsize>,
}

impl CountingRecord {
    fn new(name: &str, bytes: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        (
            CountingRecord {
                name: name.to_string(),
                bytes,
                reads: Arc::clone(&reads),
            },
            reads,
        )
    }
}

impl ClassRecord for CountingRecord {
    fn binary_name(&self) -> &str {
        &self.name
    }

    fn bytes(&self) -> std::io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }
}

/// A resolver backed by a fixed name-to-archive map, counting per-name
/// resolution attempts.
struct MapResolver {
    archives: HashMap<String, Arc<dyn Archive>>,
    calls: Arc<AtomicUsize>,
}

impl MapResolver {
    fn new(archives: Vec<(&str, Arc<dyn Archive>)>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            MapResolver {
                archives: archives
                    .into_iter()
                    .map(|(name, archive)| (name.to_string(), archive))
                    .collect(),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl ModuleResolver for MapResolver {
    fn resolve(&self, module_name: &str) -> Option<Arc<dyn Archive>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.archives.get(module_name).cloned()
    }
}

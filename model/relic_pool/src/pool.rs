//! The type pool: a merged, concurrent registry of types, modules and
//! packages across all registered archives.
//!
//! Registration is cheap (record names are indexed, payloads stay unread
//! except module descriptors); decoding happens on first lookup, exactly
//! once per name. The pool is a merged view — binary names are globally
//! unique across archives, so lookups never need a module scope.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use relic_class::decode_class;
use relic_support::{package_of, simple_name_of};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

use crate::archive::{Archive, ClassRecord, ModuleResolver};
use crate::descriptor::{PackageDescriptor, TypeDescriptor};
use crate::error::ModelError;
use crate::module::ModuleDescriptor;

/// A concurrent pool of resolved types, modules and packages.
///
/// Cloning is cheap and shares the underlying registry.
#[derive(Clone, Default)]
pub struct TypePool {
    inner: Arc<PoolInner>,
}

#[derive(Default)]
pub(crate) struct PoolInner {
    types: DashMap<String, Arc<TypeDescriptor>>,
    modules: DashMap<String, Arc<ModuleDescriptor>>,
    packages: DashMap<String, Arc<PackageDescriptor>>,
    /// Which physical record backs each not-yet-materialized name.
    sources: DashMap<String, Arc<dyn ClassRecord>>,
    /// Sentinels for names no source provides, cached so repeated lookups
    /// observe one identity.
    unresolved_types: DashMap<String, Arc<TypeDescriptor>>,
    unresolved_modules: DashMap<String, Arc<ModuleDescriptor>>,
    resolvers: RwLock<Vec<Box<dyn ModuleResolver>>>,
    archives: RwLock<Vec<Arc<dyn Archive>>>,
}

impl TypePool {
    pub fn new() -> Self {
        TypePool::default()
    }

    /// Register an archive's records with the pool.
    ///
    /// Record names and implied packages are indexed eagerly; the module
    /// descriptor record (or the manifest automatic-module name) registers a
    /// module. Class payloads stay unread until first lookup. For a name
    /// that has not materialized yet, the last registration wins; a
    /// materialized descriptor is immutable and later registrations never
    /// replace it.
    pub fn register_archive(&self, archive: Arc<dyn Archive>) -> Result<(), ModelError> {
        let inner = &self.inner;
        let mut indexed = 0usize;
        for record in archive.class_records() {
            let name = record.binary_name().to_string();
            if simple_name_of(&name) == "module-info" {
                continue;
            }
            let package = package_of(&name);
            inner
                .packages
                .entry(package.clone())
                .or_insert_with(|| Arc::new(PackageDescriptor::new(&package)));
            inner.sources.insert(name, record);
            indexed += 1;
        }
        if let Some(record) = archive.module_record() {
            self.register_module_record(&record)?;
        } else if let Some(name) = archive.manifest().and_then(|m| m.automatic_module_name()) {
            let entry = inner
                .modules
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(ModuleDescriptor::automatic(name)));
            debug!(module = entry.name(), "registered automatic module");
        }
        inner.archives.write().push(archive);
        debug!(records = indexed, "registered archive");
        Ok(())
    }

    fn register_module_record(&self, record: &Arc<dyn ClassRecord>) -> Result<(), ModelError> {
        let name = record.binary_name();
        let bytes = record.bytes().map_err(|e| ModelError::io(name, &e))?;
        let raw = decode_class(&bytes).map_err(|source| ModelError::Class {
            name: name.to_string(),
            source,
        })?;
        let Some(module) = raw.module else {
            debug!(record = name, "module record carries no module attribute");
            return Ok(());
        };
        let descriptor = ModuleDescriptor::from_raw(module, &Arc::downgrade(&self.inner));
        // Module registration is eager, so the first registration wins.
        let entry = self
            .inner
            .modules
            .entry(descriptor.name().to_string())
            .or_insert_with(|| Arc::new(descriptor));
        debug!(module = entry.name(), "registered module");
        Ok(())
    }

    /// Append a resolver consulted by [`add_module`](Self::add_module) and
    /// the closure walk, after all previously registered resolvers.
    pub fn register_module_resolver(&self, resolver: Box<dyn ModuleResolver>) {
        self.inner.resolvers.write().push(resolver);
    }

    /// Return the registered module of the given name, resolving it through
    /// the resolver chain if needed.
    ///
    /// Resolvers run in registration order; the first to produce an archive
    /// for the name wins and the archive is registered as usual. A name no
    /// resolver can produce is a hard error.
    pub fn add_module(&self, name: &str) -> Result<Arc<ModuleDescriptor>, ModelError> {
        if let Some(found) = self.inner.modules.get(name) {
            return Ok(found.clone());
        }
        let mut index = 0;
        loop {
            // The read lock is released across resolve() and registration so
            // resolvers may themselves register archives or resolvers.
            let resolved = {
                let resolvers = self.inner.resolvers.read();
                match resolvers.get(index) {
                    Some(resolver) => resolver.resolve(name),
                    None => break,
                }
            };
            index += 1;
            if let Some(archive) = resolved {
                self.register_archive(archive)?;
                if let Some(found) = self.inner.modules.get(name) {
                    debug!(module = name, resolver = index - 1, "module resolved");
                    return Ok(found.clone());
                }
            }
        }
        Err(ModelError::ModuleUnresolved {
            name: name.to_string(),
        })
    }

    /// Walk `requires` edges breadth-first from every registered module,
    /// resolving newly discovered names through the resolver chain.
    ///
    /// A `requires static` dependency is compile-time-only and therefore
    /// optional: when unresolvable it is recorded as an unresolved sentinel
    /// and the walk continues. Any other unresolvable dependency fails the
    /// closure. Discovered modules are never revisited.
    pub fn add_modules_closure(&self) -> Result<(), ModelError> {
        let mut queue: VecDeque<Arc<ModuleDescriptor>> = VecDeque::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for entry in self.inner.modules.iter() {
            seen.insert(entry.key().clone());
            queue.push_back(entry.value().clone());
        }
        while let Some(module) = queue.pop_front() {
            for requires in module.requires() {
                let target = requires.module_name();
                if !seen.insert(target.to_string()) {
                    continue;
                }
                trace!(from = module.name(), to = target, "closure edge");
                match self.add_module(target) {
                    Ok(found) => queue.push_back(found),
                    Err(ModelError::ModuleUnresolved { .. }) if requires.is_static_phase() => {
                        debug!(
                            from = module.name(),
                            to = target,
                            "static-phase dependency unresolved, continuing"
                        );
                        self.inner
                            .unresolved_modules
                            .entry(target.to_string())
                            .or_insert_with(|| Arc::new(ModuleDescriptor::unresolved(target)));
                    }
                    Err(other) => return Err(other),
                }
            }
        }
        Ok(())
    }

    /// Look up a type by internal binary name.
    ///
    /// The first requesting thread decodes the backing record; every later
    /// request observes the same descriptor identity. A name no registered
    /// source provides yields the cached unresolved sentinel, never an
    /// error. `from_module` scopes trace output only — the pool is a merged
    /// view and binary names are globally unique.
    pub fn type_by_internal_name(
        &self,
        name: &str,
        from_module: Option<&str>,
    ) -> Result<Arc<TypeDescriptor>, ModelError> {
        self.inner.type_by_internal_name(name, from_module)
    }

    /// Look up a module by name, yielding the cached unresolved sentinel for
    /// names no source provides.
    pub fn module_by_name(&self, name: &str) -> Arc<ModuleDescriptor> {
        self.inner.module_by_name(name)
    }

    /// Look up a package by dotted name.
    pub fn package_by_name(&self, name: &str) -> Arc<PackageDescriptor> {
        self.inner.package_by_name(name)
    }

    /// Names of registered (non-sentinel) modules, in no particular order.
    pub fn module_names(&self) -> Vec<String> {
        self.inner
            .modules
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl PoolInner {
    pub(crate) fn type_by_internal_name(
        self: &Arc<Self>,
        name: &str,
        from_module: Option<&str>,
    ) -> Result<Arc<TypeDescriptor>, ModelError> {
        if let Some(found) = self.types.get(name) {
            return Ok(found.clone());
        }
        let record = self.sources.get(name).map(|entry| entry.value().clone());
        if let Some(record) = record {
            // The vacant-entry shard lock makes decoding at-most-once per
            // name; materialize must not touch the types map.
            return match self.types.entry(name.to_string()) {
                Entry::Occupied(entry) => Ok(entry.get().clone()),
                Entry::Vacant(entry) => {
                    trace!(
                        name,
                        from = from_module.unwrap_or("<unscoped>"),
                        "materializing type"
                    );
                    let descriptor = self.materialize(name, &record)?;
                    Ok(entry.insert(descriptor).clone())
                }
            };
        }
        trace!(
            name,
            from = from_module.unwrap_or("<unscoped>"),
            "no source for name, yielding sentinel"
        );
        Ok(self
            .unresolved_types
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(TypeDescriptor::unresolved(name)))
            .clone())
    }

    fn materialize(
        self: &Arc<Self>,
        name: &str,
        record: &Arc<dyn ClassRecord>,
    ) -> Result<Arc<TypeDescriptor>, ModelError> {
        let bytes = record.bytes().map_err(|e| ModelError::io(name, &e))?;
        let raw = decode_class(&bytes).map_err(|source| ModelError::Class {
            name: name.to_string(),
            source,
        })?;
        if raw.name != name {
            return Err(ModelError::NameMismatch {
                expected: name.to_string(),
                found: raw.name,
            });
        }
        Ok(Arc::new(TypeDescriptor::from_raw(
            raw,
            Arc::downgrade(self),
        )))
    }

    pub(crate) fn module_by_name(&self, name: &str) -> Arc<ModuleDescriptor> {
        if let Some(found) = self.modules.get(name) {
            return found.clone();
        }
        self.unresolved_modules
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ModuleDescriptor::unresolved(name)))
            .clone()
    }

    pub(crate) fn package_by_name(&self, name: &str) -> Arc<PackageDescriptor> {
        self.packages
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(PackageDescriptor::new(name)))
            .clone()
    }
}

impl std::fmt::Debug for TypePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypePool")
            .field("types", &self.inner.types.len())
            .field("modules", &self.inner.modules.len())
            .field("packages", &self.inner.packages.len())
            .field("indexed_sources", &self.inner.sources.len())
            .finish()
    }
}

//! Module descriptors and their directive graph.
//!
//! Directives are materialized once from the decoded module attribute; the
//! cross-references they carry (required modules, exported packages, service
//! types) resolve lazily through the owning pool, so reading a module never
//! forces its whole dependency graph.

use relic_class::{RawExports, RawModule, RawProvides, RawRequires};
use relic_support::Memo;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::descriptor::{PackageDescriptor, TypeDescriptor};
use crate::error::ModelError;
use crate::pool::PoolInner;

/// How a module descriptor came to exist.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Declared by a module descriptor record.
    Normal,
    /// Synthesized from an archive's manifest name.
    Automatic,
    /// Sentinel for a name no resolver could supply.
    Unresolved,
}

/// A resolved module: identity, flags, and its directives.
///
/// Equality goes by name and kind, so a sentinel never equals a resolved
/// module of the same name.
pub struct ModuleDescriptor {
    name: String,
    open: bool,
    kind: ModuleKind,
    version: Option<String>,
    directives: Vec<Directive>,
}

impl ModuleDescriptor {
    pub(crate) fn from_raw(raw: RawModule, pool: &Weak<PoolInner>) -> Self {
        let directives = raw
            .requires
            .iter()
            .map(|r| Directive::Requires(Requires::from_raw(r, pool)))
            .chain(
                raw.exports
                    .iter()
                    .map(|e| Directive::Exports(PackageAccess::from_raw(e, pool))),
            )
            .chain(
                raw.opens
                    .iter()
                    .map(|o| Directive::Opens(PackageAccess::from_raw(o, pool))),
            )
            .chain(raw.uses.iter().map(|u| Directive::Uses(Uses::new(u, pool))))
            .chain(
                raw.provides
                    .iter()
                    .map(|p| Directive::Provides(Provides::from_raw(p, pool))),
            )
            .collect();
        ModuleDescriptor {
            name: raw.name.clone(),
            open: raw.is_open(),
            kind: ModuleKind::Normal,
            version: raw.version,
            directives,
        }
    }

    /// A module synthesized from a manifest automatic-module name. It has no
    /// directives of its own.
    pub(crate) fn automatic(name: &str) -> Self {
        ModuleDescriptor {
            name: name.to_string(),
            open: false,
            kind: ModuleKind::Automatic,
            version: None,
            directives: Vec::new(),
        }
    }

    /// A sentinel standing in for a name no resolver could supply.
    pub(crate) fn unresolved(name: &str) -> Self {
        ModuleDescriptor {
            name: name.to_string(),
            open: false,
            kind: ModuleKind::Unresolved,
            version: None,
            directives: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn is_resolved(&self) -> bool {
        self.kind != ModuleKind::Unresolved
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// All directives, in record order (requires, exports, opens, uses,
    /// provides).
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// The `requires` directives, in record order.
    pub fn requires(&self) -> impl Iterator<Item = &Requires> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Requires(r) => Some(r),
            _ => None,
        })
    }

    pub fn exports(&self) -> impl Iterator<Item = &PackageAccess> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Exports(e) => Some(e),
            _ => None,
        })
    }

    pub fn opens(&self) -> impl Iterator<Item = &PackageAccess> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Opens(o) => Some(o),
            _ => None,
        })
    }

    pub fn uses(&self) -> impl Iterator<Item = &Uses> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Uses(u) => Some(u),
            _ => None,
        })
    }

    pub fn provides(&self) -> impl Iterator<Item = &Provides> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Provides(p) => Some(p),
            _ => None,
        })
    }
}

impl PartialEq for ModuleDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl Eq for ModuleDescriptor {}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("directives", &self.directives.len())
            .finish_non_exhaustive()
    }
}

/// One directive of a module declaration.
#[derive(Debug)]
pub enum Directive {
    Requires(Requires),
    Exports(PackageAccess),
    Opens(PackageAccess),
    Uses(Uses),
    Provides(Provides),
}

/// A `requires` directive.
#[derive(Debug)]
pub struct Requires {
    module_name: String,
    transitive: bool,
    static_phase: bool,
    version: Option<String>,
    module: Memo<Arc<ModuleDescriptor>, ModelError>,
}

impl Requires {
    fn from_raw(raw: &RawRequires, pool: &Weak<PoolInner>) -> Self {
        Requires {
            module_name: raw.module.clone(),
            transitive: raw.is_transitive(),
            static_phase: raw.is_static_phase(),
            version: raw.version.clone(),
            module: lazy_module(pool, &raw.module),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    /// Compile-time-only dependency (`requires static`).
    pub fn is_static_phase(&self) -> bool {
        self.static_phase
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The required module's descriptor, a sentinel if no source provides it.
    pub fn module(&self) -> Result<Arc<ModuleDescriptor>, ModelError> {
        self.module.get().map(|m| (*m).clone())
    }
}

/// An `exports` or `opens` directive (both share one shape).
#[derive(Debug)]
pub struct PackageAccess {
    package_name: String,
    target_names: Vec<String>,
    package: Memo<Arc<PackageDescriptor>, ModelError>,
    targets: Memo<Vec<Arc<ModuleDescriptor>>, ModelError>,
}

impl PackageAccess {
    fn from_raw(raw: &RawExports, pool: &Weak<PoolInner>) -> Self {
        let package_name = raw.package.replace('/', ".");
        let package = {
            let pool = pool.clone();
            let name = package_name.clone();
            Memo::new(move || Ok(resolve_package(&pool, &name)))
        };
        let targets = {
            let pool = pool.clone();
            let names = raw.to.clone();
            Memo::new(move || {
                Ok(names
                    .iter()
                    .map(|name| resolve_module(&pool, name))
                    .collect())
            })
        };
        PackageAccess {
            package_name,
            target_names: raw.to.clone(),
            package,
            targets,
        }
    }

    /// Dotted package name.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Whether the directive is qualified (`to` a fixed module list).
    pub fn is_qualified(&self) -> bool {
        !self.target_names.is_empty()
    }

    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    pub fn package(&self) -> Result<Arc<PackageDescriptor>, ModelError> {
        self.package.get().map(|p| (*p).clone())
    }

    /// Descriptors of the qualified targets, sentinels for names no source
    /// provides. Empty for unqualified directives.
    pub fn targets(&self) -> Result<Vec<Arc<ModuleDescriptor>>, ModelError> {
        self.targets.get().map(|t| (*t).clone())
    }
}

/// A `uses` directive.
#[derive(Debug)]
pub struct Uses {
    service_name: String,
    service: Memo<Arc<TypeDescriptor>, ModelError>,
}

impl Uses {
    fn new(service_name: &str, pool: &Weak<PoolInner>) -> Self {
        Uses {
            service_name: service_name.to_string(),
            service: lazy_type(pool, service_name),
        }
    }

    /// Internal binary name of the service interface.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service(&self) -> Result<Arc<TypeDescriptor>, ModelError> {
        self.service.get().map(|t| (*t).clone())
    }
}

/// A `provides` directive.
#[derive(Debug)]
pub struct Provides {
    service_name: String,
    implementation_names: Vec<String>,
    service: Memo<Arc<TypeDescriptor>, ModelError>,
    implementations: Memo<Vec<Arc<TypeDescriptor>>, ModelError>,
}

impl Provides {
    fn from_raw(raw: &RawProvides, pool: &Weak<PoolInner>) -> Self {
        let implementations = {
            let pool = pool.clone();
            let names = raw.with.clone();
            Memo::new(move || {
                names
                    .iter()
                    .map(|name| lookup_type(&pool, name))
                    .collect::<Result<Vec<_>, _>>()
            })
        };
        Provides {
            service_name: raw.service.clone(),
            implementation_names: raw.with.clone(),
            service: lazy_type(pool, &raw.service),
            implementations,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn implementation_names(&self) -> &[String] {
        &self.implementation_names
    }

    pub fn service(&self) -> Result<Arc<TypeDescriptor>, ModelError> {
        self.service.get().map(|t| (*t).clone())
    }

    pub fn implementations(&self) -> Result<Vec<Arc<TypeDescriptor>>, ModelError> {
        self.implementations.get().map(|t| (*t).clone())
    }
}

fn lazy_module(pool: &Weak<PoolInner>, name: &str) -> Memo<Arc<ModuleDescriptor>, ModelError> {
    let pool = pool.clone();
    let name = name.to_string();
    Memo::new(move || Ok(resolve_module(&pool, &name)))
}

fn lazy_type(pool: &Weak<PoolInner>, name: &str) -> Memo<Arc<TypeDescriptor>, ModelError> {
    let pool = pool.clone();
    let name = name.to_string();
    Memo::new(move || lookup_type(&pool, &name))
}

fn lookup_type(pool: &Weak<PoolInner>, name: &str) -> Result<Arc<TypeDescriptor>, ModelError> {
    match pool.upgrade() {
        Some(pool) => pool.type_by_internal_name(name, None),
        None => Ok(Arc::new(TypeDescriptor::unresolved(name))),
    }
}

fn resolve_module(pool: &Weak<PoolInner>, name: &str) -> Arc<ModuleDescriptor> {
    match pool.upgrade() {
        Some(pool) => pool.module_by_name(name),
        None => Arc::new(ModuleDescriptor::unresolved(name)),
    }
}

fn resolve_package(pool: &Weak<PoolInner>, name: &str) -> Arc<PackageDescriptor> {
    match pool.upgrade() {
        Some(pool) => pool.package_by_name(name),
        None => Arc::new(PackageDescriptor::new(name)),
    }
}

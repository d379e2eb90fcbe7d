//! Lazy, concurrent type pool over binary class records.
//!
//! The pool is a merged registry: archives register their record names
//! cheaply, and descriptors materialize on first lookup, exactly once per
//! name. Everything expensive — payload decoding, signature parsing, member
//! lists, directive targets — sits behind memoized lazy cells, so touching
//! one type never drags the whole class graph in.
//!
//! Missing names are not errors: they resolve to unresolved sentinel
//! descriptors that answer every accessor with empty structure, keeping
//! graph algorithms total over incomplete class paths. Errors are reserved
//! for malformed records and for mandatory modules no resolver can produce.

pub mod archive;

mod annot;
mod descriptor;
mod error;
mod module;
mod pool;

pub use annot::{
    find, Annotation, AnnotationSource, AnnotationValue, ParameterAnnotations, TargetPath,
    TypeAnnotation,
};
pub use descriptor::{
    Member, MemberGenerics, MemberKind, Modifiers, PackageDescriptor, TypeDescriptor, TypeKind,
};
pub use error::ModelError;
pub use module::{
    Directive, ModuleDescriptor, ModuleKind, PackageAccess, Provides, Requires, Uses,
};
pub use pool::TypePool;

pub use relic_class::{PathStep, TargetRef, TypePath};

#[cfg(test)]
mod tests;

//! Binary class-record decoder.
//!
//! Turns the bytes of a compiled class record into raw structs: access
//! flags, names, the generic `Signature` string, annotation lists (plain and
//! type-use, visible and invisible), per-parameter annotation tables, and the
//! module attribute with its five directive lists.
//!
//! This is a *model* decoder, not a verifier: it reads exactly the subset of
//! the class-file format the type model needs and skips everything else
//! (method bodies, stack maps, debug tables). Corrupt input surfaces as a
//! structured [`ClassError`]; there is no partial result.

mod annot;
mod constant;
mod decode;
mod error;
mod raw;
mod reader;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use annot::{AnnotationValue, PathStep, RawAnnotation, RawTypeAnnotation, TargetRef, TypePath};
pub use decode::decode_class;
pub use error::ClassError;
pub use raw::{
    access, RawAnnotations, RawClass, RawExports, RawMember, RawModule, RawProvides, RawRequires,
};

#[cfg(test)]
mod tests;

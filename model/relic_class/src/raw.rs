//! Raw decoded class-record structs.
//!
//! These carry exactly what the record declares, with constant-pool indices
//! already resolved to strings. Interpretation (signature parsing, lazy
//! resolution, annotation anchoring) happens in the pool layer.

use crate::annot::{RawAnnotation, RawTypeAnnotation};

/// Access and property flag constants, as written in class records.
pub mod access {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_STRICT: u16 = 0x0800;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
    pub const ACC_MODULE: u16 = 0x8000;

    /// `Module` attribute flag: the module is open.
    pub const ACC_OPEN: u16 = 0x0020;
    /// `requires` flag: readability is passed on to dependents.
    pub const ACC_TRANSITIVE: u16 = 0x0020;
    /// `requires` flag: the dependency is compile-time only.
    pub const ACC_STATIC_PHASE: u16 = 0x0040;
}

/// The four annotation lists attached to a construct. Absent attributes
/// decode to empty lists, never to a missing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAnnotations {
    pub visible: Vec<RawAnnotation>,
    pub invisible: Vec<RawAnnotation>,
    pub visible_type: Vec<RawTypeAnnotation>,
    pub invisible_type: Vec<RawTypeAnnotation>,
}

/// A decoded field or method.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMember {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: RawAnnotations,
    /// Per-parameter visible annotations; outer length is the *declared*
    /// annotable parameter count, which may be smaller than the descriptor's
    /// parameter count when leading parameters are synthetic or mandated.
    pub visible_parameter: Vec<Vec<RawAnnotation>>,
    /// Per-parameter invisible annotations, same shape.
    pub invisible_parameter: Vec<Vec<RawAnnotation>>,
}

/// A decoded `requires` entry of the module attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequires {
    pub module: String,
    pub flags: u16,
    pub version: Option<String>,
}

impl RawRequires {
    pub fn is_transitive(&self) -> bool {
        self.flags & access::ACC_TRANSITIVE != 0
    }

    pub fn is_static_phase(&self) -> bool {
        self.flags & access::ACC_STATIC_PHASE != 0
    }
}

/// A decoded `exports` or `opens` entry (both share one layout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExports {
    /// Internal package name (`pkg/sub`).
    pub package: String,
    pub flags: u16,
    /// Target module names; empty means unqualified.
    pub to: Vec<String>,
}

/// A decoded `provides` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProvides {
    pub service: String,
    pub with: Vec<String>,
}

/// The decoded module attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModule {
    pub name: String,
    pub flags: u16,
    pub version: Option<String>,
    pub requires: Vec<RawRequires>,
    pub exports: Vec<RawExports>,
    pub opens: Vec<RawExports>,
    /// Service interface names consumed via `ServiceLoader`.
    pub uses: Vec<String>,
    pub provides: Vec<RawProvides>,
}

impl RawModule {
    pub fn is_open(&self) -> bool {
        self.flags & access::ACC_OPEN != 0
    }
}

/// A fully decoded class record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClass {
    pub major_version: u16,
    pub access: u16,
    /// Internal binary name (`pkg/Outer$Inner`).
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    /// The generic `Signature` attribute, when present.
    pub signature: Option<String>,
    pub annotations: RawAnnotations,
    pub fields: Vec<RawMember>,
    pub methods: Vec<RawMember>,
    /// Enclosing type from `EnclosingMethod` or the matching `InnerClasses`
    /// entry, when this record is a nested type.
    pub enclosing: Option<String>,
    /// The module attribute, present only on module descriptor records.
    pub module: Option<RawModule>,
}

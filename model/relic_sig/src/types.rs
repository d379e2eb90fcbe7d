//! The type algebra: immutable, structurally-comparable signature trees.
//!
//! Three node kinds — primitive, type variable, class reference — each with
//! an array dimension, plus variance-tagged [`Bound`]s for generic arguments
//! and per-parameter [`TypeParamBound`]s for declared type parameters.
//! Equality and hashing are structural (value semantics).

use indexmap::IndexMap;
use std::fmt;

/// Primitive kind, mapped 1:1 from base-type descriptor characters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Only valid as a method return type.
    Void,
}

impl Primitive {
    /// The primitive for a base-type descriptor character, excluding `V`.
    pub fn from_descriptor(ch: char) -> Option<Self> {
        match ch {
            'Z' => Some(Primitive::Boolean),
            'B' => Some(Primitive::Byte),
            'C' => Some(Primitive::Char),
            'S' => Some(Primitive::Short),
            'I' => Some(Primitive::Int),
            'J' => Some(Primitive::Long),
            'F' => Some(Primitive::Float),
            'D' => Some(Primitive::Double),
            _ => None,
        }
    }

    pub fn descriptor(self) -> char {
        match self {
            Primitive::Boolean => 'Z',
            Primitive::Byte => 'B',
            Primitive::Char => 'C',
            Primitive::Short => 'S',
            Primitive::Int => 'I',
            Primitive::Long => 'J',
            Primitive::Float => 'F',
            Primitive::Double => 'D',
            Primitive::Void => 'V',
        }
    }

    /// Source-level keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }
}

/// Variance tag of a generic type argument.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variance {
    /// A plain argument with no wildcard marker.
    Exact,
    /// `? extends T` (`+` marker).
    Extends,
    /// `? super T` (`-` marker).
    Super,
    /// `?` (`*` marker); carries no nested type.
    Unbounded,
}

/// A variance-tagged generic type argument.
///
/// `sig` is absent only for [`Variance::Unbounded`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bound {
    pub variance: Variance,
    pub sig: Option<TypeSig>,
}

impl Bound {
    pub fn exact(sig: TypeSig) -> Self {
        Bound {
            variance: Variance::Exact,
            sig: Some(sig),
        }
    }

    pub fn extends(sig: TypeSig) -> Self {
        Bound {
            variance: Variance::Extends,
            sig: Some(sig),
        }
    }

    pub fn super_of(sig: TypeSig) -> Self {
        Bound {
            variance: Variance::Super,
            sig: Some(sig),
        }
    }

    pub fn unbounded() -> Self {
        Bound {
            variance: Variance::Unbounded,
            sig: None,
        }
    }
}

/// A parsed type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeSig {
    /// A primitive, possibly an array of one.
    Primitive { kind: Primitive, dims: u8 },
    /// A reference to a declared type variable by name.
    Variable { name: String, dims: u8 },
    /// A class/interface reference: internal binary name (inner separators
    /// already normalized to `$`), array dimension, ordered generic
    /// arguments, and the enclosing reference for qualified inner types.
    Class {
        name: String,
        dims: u8,
        args: Vec<Bound>,
        outer: Option<Box<TypeSig>>,
    },
}

impl TypeSig {
    /// A plain, non-generic class reference.
    pub fn named(name: &str) -> Self {
        TypeSig::Class {
            name: name.to_string(),
            dims: 0,
            args: Vec::new(),
            outer: None,
        }
    }

    pub fn dims(&self) -> u8 {
        match self {
            TypeSig::Primitive { dims, .. }
            | TypeSig::Variable { dims, .. }
            | TypeSig::Class { dims, .. } => *dims,
        }
    }

    /// The internal binary name, for class references.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeSig::Class { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Primitive { kind, dims } => {
                write!(f, "{}", kind.keyword())?;
                write_dims(f, *dims)
            }
            TypeSig::Variable { name, dims } => {
                write!(f, "{name}")?;
                write_dims(f, *dims)
            }
            TypeSig::Class {
                name, dims, args, ..
            } => {
                write!(f, "{}", name.replace('/', "."))?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, bound) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        match (&bound.variance, &bound.sig) {
                            (Variance::Exact, Some(sig)) => write!(f, "{sig}")?,
                            (Variance::Extends, Some(sig)) => write!(f, "? extends {sig}")?,
                            (Variance::Super, Some(sig)) => write!(f, "? super {sig}")?,
                            _ => write!(f, "?")?,
                        }
                    }
                    write!(f, ">")?;
                }
                write_dims(f, *dims)
            }
        }
    }
}

fn write_dims(f: &mut fmt::Formatter<'_>, dims: u8) -> fmt::Result {
    for _ in 0..dims {
        write!(f, "[]")?;
    }
    Ok(())
}

/// Bound kind of a declared type parameter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundKind {
    /// No class or interface bounds declared.
    Unbounded,
    /// At least one bound declared.
    Extends,
}

/// The declared bound of one type parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeParamBound {
    pub kind: BoundKind,
    pub class_bound: Option<TypeSig>,
    pub interface_bounds: Vec<TypeSig>,
}

impl TypeParamBound {
    pub fn unbounded() -> Self {
        TypeParamBound {
            kind: BoundKind::Unbounded,
            class_bound: None,
            interface_bounds: Vec::new(),
        }
    }
}

/// Parsed generic declaration of a class: type parameters keyed by name in
/// declaration order, the superclass signature and interface signatures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericTypeParameters {
    pub parameters: IndexMap<String, TypeParamBound>,
    pub superclass: Option<TypeSig>,
    pub interfaces: Vec<TypeSig>,
}

/// Parsed generic declaration of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericMethodParameters {
    pub parameters: IndexMap<String, TypeParamBound>,
    pub argument_types: Vec<TypeSig>,
    pub return_type: TypeSig,
    pub throws: Vec<TypeSig>,
}

//! Generic signature parser and type algebra.
//!
//! Encoded generic signatures (`<T:Ljava/lang/Object;>Lpkg/Base<TT;>;`) are
//! compact strings embedded in class records describing a declaration's type
//! parameters, supertypes, argument/return types and throws clause. This
//! crate parses them into an immutable, structurally-comparable tree of
//! primitive, type-variable and class-type nodes.
//!
//! Plain descriptors and bare internal names go through the same machinery
//! (a minimal signature is synthesized), so generic and non-generic
//! declarations share one code path.

mod error;
mod parser;
mod types;

pub use error::SignatureError;
pub use parser::{
    class_parameters_from_names, parameter_count, parse_class_signature, parse_internal_name,
    parse_method_signature, parse_type_signature,
};
pub use types::{
    Bound, BoundKind, GenericMethodParameters, GenericTypeParameters, Primitive, TypeParamBound,
    TypeSig, Variance,
};

//! Raw annotation data: element values, packed target references, and
//! type-annotation paths.

use smallvec::SmallVec;
use std::fmt;

/// A decoded annotation: the annotated type's field descriptor
/// (`Lpkg/Anno;`) plus its named element values in record order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
    pub type_desc: String,
    pub values: Vec<(String, AnnotationValue)>,
}

impl RawAnnotation {
    /// Internal binary name of the annotation type (`pkg/Anno`).
    pub fn type_name(&self) -> &str {
        self.type_desc
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
            .unwrap_or(&self.type_desc)
    }
}

/// A decoded annotation element value.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// `B`, `S`, `I`, `J` constants, widened.
    Int(i64),
    /// `F`, `D` constants, widened.
    Float(f64),
    Boolean(bool),
    Char(char),
    Str(String),
    EnumConstant { type_desc: String, const_name: String },
    /// `c` tag: a class literal, as a return descriptor.
    ClassLiteral(String),
    Nested(RawAnnotation),
    Array(Vec<AnnotationValue>),
}

/// A type-use annotation: where it is anchored (packed reference + path)
/// and the annotation itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTypeAnnotation {
    pub target: TargetRef,
    pub path: TypePath,
    pub annotation: RawAnnotation,
}

/// Packed 32-bit reference to a type-use slot.
///
/// The high byte is the target *sort* (the `target_type` values of the
/// class-file format); the low bits carry the sort-specific disambiguators:
/// a type-parameter or formal-parameter index at bits 16–23, a bound,
/// supertype or throws index at bits 8–15.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct TargetRef(u32);

impl TargetRef {
    pub const CLASS_TYPE_PARAMETER: u8 = 0x00;
    pub const METHOD_TYPE_PARAMETER: u8 = 0x01;
    pub const SUPERTYPE: u8 = 0x10;
    pub const CLASS_TYPE_PARAMETER_BOUND: u8 = 0x11;
    pub const METHOD_TYPE_PARAMETER_BOUND: u8 = 0x12;
    pub const FIELD: u8 = 0x13;
    pub const METHOD_RETURN: u8 = 0x14;
    pub const METHOD_RECEIVER: u8 = 0x15;
    pub const METHOD_FORMAL_PARAMETER: u8 = 0x16;
    pub const THROWS: u8 = 0x17;

    /// The supertype index that designates the superclass rather than an
    /// implemented interface.
    pub const SUPERCLASS_INDEX: u16 = 0xFFFF;

    pub fn class_type_parameter(index: u8) -> Self {
        TargetRef(u32::from(Self::CLASS_TYPE_PARAMETER) << 24 | u32::from(index) << 16)
    }

    pub fn method_type_parameter(index: u8) -> Self {
        TargetRef(u32::from(Self::METHOD_TYPE_PARAMETER) << 24 | u32::from(index) << 16)
    }

    /// An `extends`/`implements` clause; [`Self::SUPERCLASS_INDEX`] names the
    /// superclass, lower values index the interface list.
    pub fn supertype(index: u16) -> Self {
        TargetRef(u32::from(Self::SUPERTYPE) << 24 | u32::from(index) << 8)
    }

    pub fn class_type_parameter_bound(parameter: u8, bound: u8) -> Self {
        TargetRef(
            u32::from(Self::CLASS_TYPE_PARAMETER_BOUND) << 24
                | u32::from(parameter) << 16
                | u32::from(bound) << 8,
        )
    }

    pub fn method_type_parameter_bound(parameter: u8, bound: u8) -> Self {
        TargetRef(
            u32::from(Self::METHOD_TYPE_PARAMETER_BOUND) << 24
                | u32::from(parameter) << 16
                | u32::from(bound) << 8,
        )
    }

    pub fn field() -> Self {
        TargetRef(u32::from(Self::FIELD) << 24)
    }

    pub fn method_return() -> Self {
        TargetRef(u32::from(Self::METHOD_RETURN) << 24)
    }

    pub fn method_receiver() -> Self {
        TargetRef(u32::from(Self::METHOD_RECEIVER) << 24)
    }

    pub fn formal_parameter(index: u8) -> Self {
        TargetRef(u32::from(Self::METHOD_FORMAL_PARAMETER) << 24 | u32::from(index) << 16)
    }

    pub fn throws(index: u16) -> Self {
        TargetRef(u32::from(Self::THROWS) << 24 | u32::from(index) << 8)
    }

    /// The target sort (high byte).
    pub fn sort(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The raw packed value.
    pub fn value(self) -> u32 {
        self.0
    }

    pub fn from_value(value: u32) -> Self {
        TargetRef(value)
    }
}

impl fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetRef(sort=0x{:02X}, value=0x{:08X})", self.sort(), self.0)
    }
}

/// One step into the structure of an annotated type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Into the element type of an array.
    Array,
    /// Into an inner type of a qualified type.
    Inner,
    /// Into the bound of a wildcard argument.
    Wildcard,
    /// Into the i-th type argument.
    TypeArgument(u8),
}

/// Ordered sequence of [`PathStep`]s locating a position inside a type.
///
/// Comparison is structural step-sequence equality (including the empty
/// path). The canonical rendering concatenates `[`, `.`, `*` and
/// `<index>;` in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypePath {
    steps: SmallVec<[PathStep; 4]>,
}

impl TypePath {
    pub fn new() -> Self {
        TypePath::default()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step into an array's element type.
    pub fn array(mut self) -> Self {
        self.steps.push(PathStep::Array);
        self
    }

    /// Step into an inner type.
    pub fn inner_type(mut self) -> Self {
        self.steps.push(PathStep::Inner);
        self
    }

    /// Step into a wildcard bound.
    pub fn wildcard_bound(mut self) -> Self {
        self.steps.push(PathStep::Wildcard);
        self
    }

    /// Step into the `index`-th type argument.
    pub fn type_argument(mut self, index: u8) -> Self {
        self.steps.push(PathStep::TypeArgument(index));
        self
    }

    pub(crate) fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }
}

impl FromIterator<PathStep> for TypePath {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        TypePath {
            steps: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                PathStep::Array => write!(f, "[")?,
                PathStep::Inner => write!(f, ".")?,
                PathStep::Wildcard => write!(f, "*")?,
                PathStep::TypeArgument(index) => write!(f, "{index};")?,
            }
        }
        Ok(())
    }
}

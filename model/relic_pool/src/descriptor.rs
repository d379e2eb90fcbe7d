//! Resolved type descriptors and their members.
//!
//! A [`TypeDescriptor`] is the pool's unit of sharing: one immutable,
//! reference-counted view per binary name, with the expensive parts (generic
//! declaration, member list, annotations) behind memoized cells that force on
//! first access. Supertype accessors resolve through the owning pool, which
//! is held weakly so descriptors never keep a dropped pool alive.

use bitflags::bitflags;
use relic_class::{access, RawClass, RawMember};
use relic_sig::{
    class_parameters_from_names, parameter_count, parse_class_signature, parse_method_signature,
    parse_type_signature, GenericMethodParameters, GenericTypeParameters, TypeSig,
};
use relic_support::{package_of, simple_name_of, to_source_name, Memo};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::annot::{Annotation, AnnotationSource, ParameterAnnotations, TargetPath};
use crate::error::ModelError;
use crate::pool::PoolInner;

bitflags! {
    /// Access and property flags of a type or member declaration.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const PUBLIC = access::ACC_PUBLIC;
        const PRIVATE = access::ACC_PRIVATE;
        const PROTECTED = access::ACC_PROTECTED;
        const STATIC = access::ACC_STATIC;
        const FINAL = access::ACC_FINAL;
        const SUPER = access::ACC_SUPER;
        const VOLATILE = access::ACC_VOLATILE;
        const TRANSIENT = access::ACC_TRANSIENT;
        const NATIVE = access::ACC_NATIVE;
        const INTERFACE = access::ACC_INTERFACE;
        const ABSTRACT = access::ACC_ABSTRACT;
        const STRICT = access::ACC_STRICT;
        const SYNTHETIC = access::ACC_SYNTHETIC;
        const ANNOTATION = access::ACC_ANNOTATION;
        const ENUM = access::ACC_ENUM;
        const MODULE = access::ACC_MODULE;
    }
}

impl Modifiers {
    pub fn is_public(self) -> bool {
        self.contains(Modifiers::PUBLIC)
    }

    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    pub fn is_final(self) -> bool {
        self.contains(Modifiers::FINAL)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Modifiers::ABSTRACT)
    }

    pub fn is_synthetic(self) -> bool {
        self.contains(Modifiers::SYNTHETIC)
    }
}

/// What kind of type a descriptor stands for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    /// Sentinel for a name no registered source provides.
    Unresolved,
}

impl TypeKind {
    fn from_access(flags: u16) -> Self {
        // Annotation types also carry the interface flag; test the more
        // specific flag first.
        if flags & access::ACC_ANNOTATION != 0 {
            TypeKind::Annotation
        } else if flags & access::ACC_INTERFACE != 0 {
            TypeKind::Interface
        } else if flags & access::ACC_ENUM != 0 {
            TypeKind::Enum
        } else {
            TypeKind::Class
        }
    }
}

/// A resolved type: identity, flags, and lazily-computed structure.
///
/// Equality and hashing go by binary name (and kind, so a sentinel never
/// equals a resolved descriptor of the same name).
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    modifiers: Modifiers,
    package: String,
    enclosing: Option<String>,
    generics: Memo<GenericTypeParameters, ModelError>,
    members: Memo<Vec<Member>, ModelError>,
    annotations: Memo<AnnotationSource, ModelError>,
    pool: Weak<PoolInner>,
}

impl TypeDescriptor {
    pub(crate) fn from_raw(raw: RawClass, pool: Weak<PoolInner>) -> Self {
        let RawClass {
            access,
            name,
            super_name,
            interfaces,
            signature,
            annotations,
            fields,
            methods,
            enclosing,
            ..
        } = raw;
        let package = package_of(&name);
        let generics = {
            let name = name.clone();
            Memo::new(move || match signature {
                Some(sig) => parse_class_signature(&sig)
                    .map_err(|source| ModelError::Signature { name, source }),
                None => class_parameters_from_names(super_name.as_deref(), &interfaces)
                    .map_err(|source| ModelError::Signature { name, source }),
            })
        };
        let members = {
            let name = name.clone();
            Memo::new(move || {
                let mut members = Vec::with_capacity(fields.len() + methods.len());
                for raw in fields {
                    members.push(Member::from_raw(raw, MemberKind::Field, &name));
                }
                for raw in methods {
                    members.push(Member::from_raw(raw, MemberKind::Method, &name));
                }
                Ok(members)
            })
        };
        let annotations = Memo::new(move || Ok(AnnotationSource::from_raw(&annotations)));
        TypeDescriptor {
            name,
            kind: TypeKind::from_access(access),
            modifiers: Modifiers::from_bits_truncate(access),
            package,
            enclosing,
            generics,
            members,
            annotations,
            pool,
        }
    }

    /// A sentinel standing in for a name no registered source provides.
    ///
    /// Sentinels are total: every accessor answers with empty structure, no
    /// accessor errors.
    pub(crate) fn unresolved(name: &str) -> Self {
        TypeDescriptor {
            name: name.to_string(),
            kind: TypeKind::Unresolved,
            modifiers: Modifiers::empty(),
            package: package_of(name),
            enclosing: None,
            generics: Memo::resolved(GenericTypeParameters::default()),
            members: Memo::resolved(Vec::new()),
            annotations: Memo::resolved(AnnotationSource::default()),
            pool: Weak::new(),
        }
    }

    /// Internal binary name (`pkg/Outer$Inner`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted source name (`pkg.Outer$Inner`).
    pub fn source_name(&self) -> String {
        to_source_name(&self.name)
    }

    /// Unqualified name (`Inner`).
    pub fn simple_name(&self) -> &str {
        simple_name_of(&self.name)
    }

    /// Dotted package name, empty for the default package.
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_resolved(&self) -> bool {
        self.kind != TypeKind::Unresolved
    }

    /// Binary name of the enclosing type, for nested types.
    pub fn enclosing_name(&self) -> Option<&str> {
        self.enclosing.as_deref()
    }

    /// The type's generic declaration: type parameters, generic superclass
    /// and interfaces. Records without a signature attribute get a synthetic
    /// declaration built from the plain supertype names.
    pub fn generics(&self) -> Result<Arc<GenericTypeParameters>, ModelError> {
        self.generics.get()
    }

    /// Fields then methods, in record order.
    pub fn members(&self) -> Result<Arc<Vec<Member>>, ModelError> {
        self.members.get()
    }

    /// The field of the given name, if any.
    pub fn field(&self, name: &str) -> Result<Option<Member>, ModelError> {
        let members = self.members()?;
        Ok(members
            .iter()
            .find(|m| m.kind() == MemberKind::Field && m.name() == name)
            .cloned())
    }

    /// All methods of the given name (overloads included).
    pub fn methods_named(&self, name: &str) -> Result<Vec<Member>, ModelError> {
        let members = self.members()?;
        Ok(members
            .iter()
            .filter(|m| m.kind() == MemberKind::Method && m.name() == name)
            .cloned()
            .collect())
    }

    pub fn annotations(&self) -> Result<Arc<AnnotationSource>, ModelError> {
        self.annotations.get()
    }

    /// Annotations anchored at `path` on this type declaration.
    pub fn find_annotations(&self, path: &TargetPath) -> Result<Vec<Annotation>, ModelError> {
        Ok(self.annotations()?.find(path))
    }

    /// The resolved superclass descriptor, `None` for `java/lang/Object`,
    /// interfaces without one, and sentinels.
    pub fn superclass(&self) -> Result<Option<Arc<TypeDescriptor>>, ModelError> {
        let generics = self.generics.get()?;
        let Some(sig) = &generics.superclass else {
            return Ok(None);
        };
        let Some(name) = sig.class_name() else {
            return Ok(None);
        };
        Ok(Some(self.resolve(name)?))
    }

    /// Resolved descriptors of the declared interfaces, in record order.
    pub fn interfaces(&self) -> Result<Vec<Arc<TypeDescriptor>>, ModelError> {
        let generics = self.generics.get()?;
        let mut resolved = Vec::with_capacity(generics.interfaces.len());
        for sig in &generics.interfaces {
            if let Some(name) = sig.class_name() {
                resolved.push(self.resolve(name)?);
            }
        }
        Ok(resolved)
    }

    /// The resolved enclosing type, for nested types.
    pub fn enclosing(&self) -> Result<Option<Arc<TypeDescriptor>>, ModelError> {
        match &self.enclosing {
            Some(name) => Ok(Some(self.resolve(name)?)),
            None => Ok(None),
        }
    }

    fn resolve(&self, name: &str) -> Result<Arc<TypeDescriptor>, ModelError> {
        match self.pool.upgrade() {
            Some(pool) => pool.type_by_internal_name(name, None),
            // The pool is gone; answer with a detached sentinel rather
            // than erroring a read-only accessor.
            None => Ok(Arc::new(TypeDescriptor::unresolved(name))),
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("modifiers", &self.modifiers)
            .finish_non_exhaustive()
    }
}

/// Whether a member is a field or a method.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
}

/// A field's or method's resolved generic shape.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberGenerics {
    /// The field's type.
    Field(TypeSig),
    /// The method's type parameters, argument types, return type and throws.
    Method(GenericMethodParameters),
}

/// A field or method of a resolved type.
///
/// Annotations are converted eagerly (they are already decoded); only the
/// generic shape is parsed lazily.
#[derive(Debug, Clone)]
pub struct Member {
    kind: MemberKind,
    modifiers: Modifiers,
    name: String,
    descriptor: String,
    signature: Option<String>,
    annotations: AnnotationSource,
    parameters: ParameterAnnotations,
    generics: Memo<MemberGenerics, ModelError>,
}

impl Member {
    fn from_raw(raw: RawMember, kind: MemberKind, declaring: &str) -> Self {
        let RawMember {
            access,
            name,
            descriptor,
            signature,
            annotations,
            visible_parameter,
            invisible_parameter,
        } = raw;
        let descriptor_count = match kind {
            MemberKind::Method => parameter_count(&descriptor).unwrap_or(0),
            MemberKind::Field => 0,
        };
        let generics = {
            let context = format!("{declaring}.{name}");
            let source = signature.clone().unwrap_or_else(|| descriptor.clone());
            Memo::new(move || {
                let parsed = match kind {
                    MemberKind::Field => parse_type_signature(&source).map(MemberGenerics::Field),
                    MemberKind::Method => {
                        parse_method_signature(&source).map(MemberGenerics::Method)
                    }
                };
                parsed.map_err(|source| ModelError::Signature {
                    name: context,
                    source,
                })
            })
        };
        Member {
            kind,
            modifiers: Modifiers::from_bits_truncate(access),
            name,
            descriptor,
            signature,
            annotations: AnnotationSource::from_raw(&annotations),
            parameters: ParameterAnnotations::from_raw(
                &visible_parameter,
                &invisible_parameter,
                descriptor_count,
            ),
            generics,
        }
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plain descriptor (`(Ljava/lang/String;)V`, `I`).
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// The generic signature attribute, when the record carries one.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// The generic shape, parsed from the signature or, absent one, from the
    /// plain descriptor.
    pub fn generics(&self) -> Result<Arc<MemberGenerics>, ModelError> {
        self.generics.get()
    }

    pub fn annotations(&self) -> &AnnotationSource {
        &self.annotations
    }

    /// Annotations anchored at `path` on this member.
    pub fn find_annotations(&self, path: &TargetPath) -> Vec<Annotation> {
        self.annotations.find(path)
    }

    /// Declaration annotations of the parameter at the descriptor index.
    pub fn parameter_annotations(&self, index: usize) -> Vec<Annotation> {
        self.parameters.at(index)
    }

    /// An [`AnnotationSource`] view of one formal parameter: its shifted
    /// declaration lists plus the method's type-use lists.
    pub fn parameter_source(&self, index: usize) -> AnnotationSource {
        AnnotationSource::for_parameter(&self.annotations, &self.parameters, index)
    }

    pub fn visible_parameter_annotations(&self, index: usize) -> Vec<Annotation> {
        self.parameters.visible_at(index)
    }

    pub fn invisible_parameter_annotations(&self, index: usize) -> Vec<Annotation> {
        self.parameters.invisible_at(index)
    }
}

/// A package seen by at least one registered record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageDescriptor {
    name: String,
}

impl PackageDescriptor {
    pub(crate) fn new(name: &str) -> Self {
        PackageDescriptor {
            name: name.to_string(),
        }
    }

    /// Dotted package name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

//! Annotation views over decoded records: declaration annotations, type-use
//! annotations, parameter-shift correction, and path-addressed lookup.

use relic_class::{
    RawAnnotation, RawAnnotations, RawTypeAnnotation, TargetRef, TypePath,
};

pub use relic_class::AnnotationValue;

/// An annotation as seen by pool consumers: internal binary type name plus
/// element values in record order.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    type_name: String,
    values: Vec<(String, AnnotationValue)>,
}

impl Annotation {
    pub(crate) fn from_raw(raw: &RawAnnotation) -> Self {
        Annotation {
            type_name: raw.type_name().to_string(),
            values: raw.values.clone(),
        }
    }

    /// Internal binary name of the annotation type (`pkg/Anno`).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn values(&self) -> &[(String, AnnotationValue)] {
        &self.values
    }

    /// The value of the named element, if the record supplies one. Defaulted
    /// elements are absent here.
    pub fn value(&self, name: &str) -> Option<&AnnotationValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// A type-use annotation with its anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    target: TargetRef,
    path: TypePath,
    annotation: Annotation,
}

impl TypeAnnotation {
    fn from_raw(raw: &RawTypeAnnotation) -> Self {
        TypeAnnotation {
            target: raw.target,
            path: raw.path.clone(),
            annotation: Annotation::from_raw(&raw.annotation),
        }
    }

    pub fn target(&self) -> TargetRef {
        self.target
    }

    pub fn path(&self) -> &TypePath {
        &self.path
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }
}

/// The four annotation lists of one construct (type, field, or method).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSource {
    visible: Vec<Annotation>,
    invisible: Vec<Annotation>,
    visible_type: Vec<TypeAnnotation>,
    invisible_type: Vec<TypeAnnotation>,
}

impl AnnotationSource {
    pub(crate) fn from_raw(raw: &RawAnnotations) -> Self {
        AnnotationSource {
            visible: raw.visible.iter().map(Annotation::from_raw).collect(),
            invisible: raw.invisible.iter().map(Annotation::from_raw).collect(),
            visible_type: raw.visible_type.iter().map(TypeAnnotation::from_raw).collect(),
            invisible_type: raw
                .invisible_type
                .iter()
                .map(TypeAnnotation::from_raw)
                .collect(),
        }
    }

    /// The view of one formal parameter: the shifted per-parameter
    /// declaration lists, with the method's type-use lists passed through so
    /// path-addressed lookup still works against parameter type anchors.
    pub(crate) fn for_parameter(
        method: &AnnotationSource,
        parameters: &ParameterAnnotations,
        index: usize,
    ) -> Self {
        AnnotationSource {
            visible: parameters.visible_at(index),
            invisible: parameters.invisible_at(index),
            visible_type: method.visible_type.clone(),
            invisible_type: method.invisible_type.clone(),
        }
    }

    pub fn visible(&self) -> &[Annotation] {
        &self.visible
    }

    pub fn invisible(&self) -> &[Annotation] {
        &self.invisible
    }

    pub fn visible_type(&self) -> &[TypeAnnotation] {
        &self.visible_type
    }

    pub fn invisible_type(&self) -> &[TypeAnnotation] {
        &self.invisible_type
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
            && self.invisible.is_empty()
            && self.visible_type.is_empty()
            && self.invisible_type.is_empty()
    }

    /// All annotations anchored at `path`, across both retention policies.
    ///
    /// The declaration lists always match. A path naming a type-use slot
    /// additionally matches every type annotation whose target and step
    /// sequence both agree — except a bare formal-parameter anchor with no
    /// steps, whose type-use matches are suppressed: the per-parameter
    /// tables already report those annotations, and matching here would
    /// report them twice.
    pub fn find(&self, path: &TargetPath) -> Vec<Annotation> {
        let mut found = Vec::new();
        found.extend(self.visible.iter().cloned());
        found.extend(self.invisible.iter().cloned());
        let Some(reference) = path.reference else {
            return found;
        };
        if reference.sort() == TargetRef::METHOD_FORMAL_PARAMETER && path.path.is_empty() {
            return found;
        }
        let matches = |ta: &TypeAnnotation| ta.target == reference && ta.path == path.path;
        found.extend(
            self.visible_type
                .iter()
                .filter(|ta| matches(ta))
                .map(|ta| ta.annotation.clone()),
        );
        found.extend(
            self.invisible_type
                .iter()
                .filter(|ta| matches(ta))
                .map(|ta| ta.annotation.clone()),
        );
        found
    }
}

/// All annotations anchored at `path` in `source`. Equivalent to
/// [`AnnotationSource::find`].
pub fn find(path: &TargetPath, source: &AnnotationSource) -> Vec<Annotation> {
    source.find(path)
}

/// Per-parameter annotation lists, shifted to descriptor parameter indices.
///
/// A record may declare fewer annotable parameters than the descriptor
/// carries (leading synthetic or mandated parameters are not annotable).
/// The shift assumes the undeclared parameters are the *leading* ones, so a
/// descriptor index maps back by subtracting the difference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterAnnotations {
    visible: Vec<Vec<Annotation>>,
    invisible: Vec<Vec<Annotation>>,
    descriptor_count: usize,
}

impl ParameterAnnotations {
    pub(crate) fn from_raw(
        visible: &[Vec<RawAnnotation>],
        invisible: &[Vec<RawAnnotation>],
        descriptor_count: usize,
    ) -> Self {
        let convert = |lists: &[Vec<RawAnnotation>]| {
            lists
                .iter()
                .map(|list| list.iter().map(Annotation::from_raw).collect())
                .collect()
        };
        ParameterAnnotations {
            visible: convert(visible),
            invisible: convert(invisible),
            descriptor_count,
        }
    }

    /// All annotations of the parameter at the descriptor index, visible
    /// first. Out-of-range indices and shifted-out leading parameters yield
    /// an empty list.
    pub fn at(&self, index: usize) -> Vec<Annotation> {
        let mut found = Vec::new();
        found.extend(shifted(&self.visible, self.descriptor_count, index));
        found.extend(shifted(&self.invisible, self.descriptor_count, index));
        found
    }

    pub fn visible_at(&self, index: usize) -> Vec<Annotation> {
        shifted(&self.visible, self.descriptor_count, index)
    }

    pub fn invisible_at(&self, index: usize) -> Vec<Annotation> {
        shifted(&self.invisible, self.descriptor_count, index)
    }
}

fn shifted(lists: &[Vec<Annotation>], descriptor_count: usize, index: usize) -> Vec<Annotation> {
    let declared = lists.len();
    let skip = if declared == 0 {
        0
    } else {
        descriptor_count.saturating_sub(declared)
    };
    match index.checked_sub(skip) {
        Some(effective) => lists.get(effective).cloned().unwrap_or_default(),
        None => Vec::new(),
    }
}

/// An anchor inside a construct: an optional target reference plus a path
/// into the referenced type.
///
/// [`TargetPath::root`] addresses the construct's own declaration
/// annotations; [`TargetPath::to`] addresses a type-use slot, refined by the
/// step builders.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPath {
    reference: Option<TargetRef>,
    path: TypePath,
}

impl TargetPath {
    /// The declaration itself.
    pub fn root() -> Self {
        TargetPath {
            reference: None,
            path: TypePath::new(),
        }
    }

    /// The top of the type at the given target slot.
    pub fn to(reference: TargetRef) -> Self {
        TargetPath {
            reference: Some(reference),
            path: TypePath::new(),
        }
    }

    pub fn array(mut self) -> Self {
        self.path = self.path.array();
        self
    }

    pub fn inner_type(mut self) -> Self {
        self.path = self.path.inner_type();
        self
    }

    pub fn wildcard_bound(mut self) -> Self {
        self.path = self.path.wildcard_bound();
        self
    }

    pub fn type_argument(mut self, index: u8) -> Self {
        self.path = self.path.type_argument(index);
        self
    }

    pub fn reference(&self) -> Option<TargetRef> {
        self.reference
    }

    pub fn path(&self) -> &TypePath {
        &self.path
    }
}

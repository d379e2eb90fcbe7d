//! Class-file byte builder for tests.
//!
//! Emits just enough of the class-file format to exercise the decoder and
//! the pool: constant pool with deduplication, flags, interfaces, the
//! `Signature` attribute, plain/type/parameter annotations, and the module
//! attribute. Not a general-purpose writer.

use crate::annot::{PathStep, TargetRef, TypePath};
use crate::raw::access;
use std::collections::HashMap;

const MAGIC: u32 = 0xCAFE_BABE;
const MAJOR_VERSION: u16 = 55; // first version with modules already stable

/// An annotation element value the builder can emit.
#[derive(Clone, Debug)]
pub enum TkValue {
    Int(i32),
    Str(String),
}

#[derive(Clone, Debug)]
struct TkAnnotation {
    visible: bool,
    type_desc: String,
    values: Vec<(String, TkValue)>,
}

#[derive(Clone, Debug)]
struct TkTypeAnnotation {
    visible: bool,
    target: TargetRef,
    path: TypePath,
    type_desc: String,
}

/// A field or method under construction.
#[derive(Clone, Debug)]
pub struct MemberDef {
    access: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
    annotations: Vec<TkAnnotation>,
    type_annotations: Vec<TkTypeAnnotation>,
    visible_parameter: Option<Vec<Vec<String>>>,
    invisible_parameter: Option<Vec<Vec<String>>>,
}

impl MemberDef {
    pub fn field(name: &str, descriptor: &str) -> Self {
        MemberDef {
            access: access::ACC_PUBLIC,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            annotations: Vec::new(),
            type_annotations: Vec::new(),
            visible_parameter: None,
            invisible_parameter: None,
        }
    }

    pub fn method(name: &str, descriptor: &str) -> Self {
        Self::field(name, descriptor)
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn annotation(mut self, type_desc: &str) -> Self {
        self.annotations.push(TkAnnotation {
            visible: true,
            type_desc: type_desc.to_string(),
            values: Vec::new(),
        });
        self
    }

    pub fn invisible_annotation(mut self, type_desc: &str) -> Self {
        self.annotations.push(TkAnnotation {
            visible: false,
            type_desc: type_desc.to_string(),
            values: Vec::new(),
        });
        self
    }

    pub fn annotation_with(mut self, type_desc: &str, values: &[(&str, TkValue)]) -> Self {
        self.annotations.push(TkAnnotation {
            visible: true,
            type_desc: type_desc.to_string(),
            values: values
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect(),
        });
        self
    }

    pub fn type_annotation(mut self, target: TargetRef, path: TypePath, type_desc: &str) -> Self {
        self.type_annotations.push(TkTypeAnnotation {
            visible: true,
            target,
            path,
            type_desc: type_desc.to_string(),
        });
        self
    }

    pub fn invisible_type_annotation(
        mut self,
        target: TargetRef,
        path: TypePath,
        type_desc: &str,
    ) -> Self {
        self.type_annotations.push(TkTypeAnnotation {
            visible: false,
            target,
            path,
            type_desc: type_desc.to_string(),
        });
        self
    }

    /// Visible per-parameter annotation table. The outer length is the
    /// *declared* count, which tests may keep smaller than the descriptor's
    /// parameter count to model synthetic leading parameters.
    pub fn parameter_annotations(mut self, parameters: Vec<Vec<&str>>) -> Self {
        self.visible_parameter = Some(
            parameters
                .into_iter()
                .map(|descs| descs.into_iter().map(str::to_string).collect())
                .collect(),
        );
        self
    }

    pub fn invisible_parameter_annotations(mut self, parameters: Vec<Vec<&str>>) -> Self {
        self.invisible_parameter = Some(
            parameters
                .into_iter()
                .map(|descs| descs.into_iter().map(str::to_string).collect())
                .collect(),
        );
        self
    }
}

/// A module attribute under construction.
#[derive(Clone, Debug, Default)]
pub struct ModuleDef {
    name: String,
    flags: u16,
    requires: Vec<(String, u16)>,
    exports: Vec<(String, Vec<String>)>,
    opens: Vec<(String, Vec<String>)>,
    uses: Vec<String>,
    provides: Vec<(String, Vec<String>)>,
}

impl ModuleDef {
    pub fn new(name: &str) -> Self {
        ModuleDef {
            name: name.to_string(),
            ..ModuleDef::default()
        }
    }

    pub fn open(mut self) -> Self {
        self.flags |= access::ACC_OPEN;
        self
    }

    pub fn requires(mut self, module: &str, flags: u16) -> Self {
        self.requires.push((module.to_string(), flags));
        self
    }

    pub fn exports(mut self, package: &str, to: &[&str]) -> Self {
        self.exports
            .push((package.to_string(), to.iter().map(|m| (*m).to_string()).collect()));
        self
    }

    pub fn opens(mut self, package: &str, to: &[&str]) -> Self {
        self.opens
            .push((package.to_string(), to.iter().map(|m| (*m).to_string()).collect()));
        self
    }

    pub fn uses(mut self, service: &str) -> Self {
        self.uses.push(service.to_string());
        self
    }

    pub fn provides(mut self, service: &str, with: &[&str]) -> Self {
        self.provides
            .push((service.to_string(), with.iter().map(|t| (*t).to_string()).collect()));
        self
    }
}

/// A class record under construction.
#[derive(Clone, Debug)]
pub struct ClassFile {
    access: u16,
    name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    signature: Option<String>,
    annotations: Vec<TkAnnotation>,
    type_annotations: Vec<TkTypeAnnotation>,
    fields: Vec<MemberDef>,
    methods: Vec<MemberDef>,
    module: Option<ModuleDef>,
}

impl ClassFile {
    pub fn new(name: &str) -> Self {
        ClassFile {
            access: access::ACC_PUBLIC | access::ACC_SUPER,
            name: name.to_string(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            signature: None,
            annotations: Vec::new(),
            type_annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            module: None,
        }
    }

    /// A `module-info` record carrying the given module attribute.
    pub fn module_info(module: ModuleDef) -> Self {
        ClassFile {
            access: access::ACC_MODULE,
            name: "module-info".to_string(),
            super_name: None,
            interfaces: Vec::new(),
            signature: None,
            annotations: Vec::new(),
            type_annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            module: Some(module),
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn super_name(mut self, name: &str) -> Self {
        self.super_name = Some(name.to_string());
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn annotation(mut self, type_desc: &str) -> Self {
        self.annotations.push(TkAnnotation {
            visible: true,
            type_desc: type_desc.to_string(),
            values: Vec::new(),
        });
        self
    }

    pub fn invisible_annotation(mut self, type_desc: &str) -> Self {
        self.annotations.push(TkAnnotation {
            visible: false,
            type_desc: type_desc.to_string(),
            values: Vec::new(),
        });
        self
    }

    pub fn type_annotation(mut self, target: TargetRef, path: TypePath, type_desc: &str) -> Self {
        self.type_annotations.push(TkTypeAnnotation {
            visible: true,
            target,
            path,
            type_desc: type_desc.to_string(),
        });
        self
    }

    pub fn field(mut self, field: MemberDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MemberDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Serialize to class-file bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut constants = Constants::default();

        let this_index = constants.class(&self.name);
        let super_index = self.super_name.as_deref().map_or(0, |n| constants.class(n));
        let interface_indices: Vec<u16> =
            self.interfaces.iter().map(|n| constants.class(n)).collect();

        let field_bodies: Vec<Vec<u8>> = self
            .fields
            .iter()
            .map(|m| emit_member(m, &mut constants))
            .collect();
        let method_bodies: Vec<Vec<u8>> = self
            .methods
            .iter()
            .map(|m| emit_member(m, &mut constants))
            .collect();

        let mut attributes: Vec<Vec<u8>> = Vec::new();
        if let Some(signature) = &self.signature {
            attributes.push(emit_signature(signature, &mut constants));
        }
        attributes.extend(emit_annotation_attrs(
            &self.annotations,
            &self.type_annotations,
            &mut constants,
        ));
        if let Some(module) = &self.module {
            attributes.push(emit_module(module, &mut constants));
        }

        let mut out = Vec::new();
        push_u32(&mut out, MAGIC);
        push_u16(&mut out, 0); // minor
        push_u16(&mut out, MAJOR_VERSION);
        constants.write(&mut out);
        push_u16(&mut out, self.access);
        push_u16(&mut out, this_index);
        push_u16(&mut out, super_index);
        push_u16(&mut out, interface_indices.len() as u16);
        for index in interface_indices {
            push_u16(&mut out, index);
        }
        push_u16(&mut out, field_bodies.len() as u16);
        for body in field_bodies {
            out.extend(body);
        }
        push_u16(&mut out, method_bodies.len() as u16);
        for body in method_bodies {
            out.extend(body);
        }
        push_u16(&mut out, attributes.len() as u16);
        for attr in attributes {
            out.extend(attr);
        }
        out
    }
}

#[derive(Default)]
struct Constants {
    entries: Vec<Vec<u8>>,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    modules: HashMap<String, u16>,
    packages: HashMap<String, u16>,
    integers: HashMap<i32, u16>,
}

impl Constants {
    fn push(&mut self, entry: Vec<u8>) -> u16 {
        self.entries.push(entry);
        self.entries.len() as u16
    }

    fn utf8(&mut self, text: &str) -> u16 {
        if let Some(&index) = self.utf8.get(text) {
            return index;
        }
        let mut entry = vec![1u8];
        push_u16(&mut entry, text.len() as u16);
        entry.extend(text.as_bytes());
        let index = self.push(entry);
        self.utf8.insert(text.to_string(), index);
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.classes.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        let mut entry = vec![7u8];
        push_u16(&mut entry, name_index);
        let index = self.push(entry);
        self.classes.insert(name.to_string(), index);
        index
    }

    fn module(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.modules.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        let mut entry = vec![19u8];
        push_u16(&mut entry, name_index);
        let index = self.push(entry);
        self.modules.insert(name.to_string(), index);
        index
    }

    fn package(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.packages.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        let mut entry = vec![20u8];
        push_u16(&mut entry, name_index);
        let index = self.push(entry);
        self.packages.insert(name.to_string(), index);
        index
    }

    fn integer(&mut self, value: i32) -> u16 {
        if let Some(&index) = self.integers.get(&value) {
            return index;
        }
        let mut entry = vec![3u8];
        push_u32(&mut entry, value as u32);
        let index = self.push(entry);
        self.integers.insert(value, index);
        index
    }

    fn write(&self, out: &mut Vec<u8>) {
        push_u16(out, self.entries.len() as u16 + 1);
        for entry in &self.entries {
            out.extend(entry);
        }
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend(value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend(value.to_be_bytes());
}

/// Wrap an attribute body with its name index and length header.
fn attr(name: &str, body: Vec<u8>, constants: &mut Constants) -> Vec<u8> {
    let name_index = constants.utf8(name);
    let mut out = Vec::with_capacity(body.len() + 6);
    push_u16(&mut out, name_index);
    push_u32(&mut out, body.len() as u32);
    out.extend(body);
    out
}

fn emit_signature(signature: &str, constants: &mut Constants) -> Vec<u8> {
    let signature_index = constants.utf8(signature);
    let mut body = Vec::new();
    push_u16(&mut body, signature_index);
    attr("Signature", body, constants)
}

fn emit_annotation(annotation: &TkAnnotation, constants: &mut Constants, out: &mut Vec<u8>) {
    let type_index = constants.utf8(&annotation.type_desc);
    push_u16(out, type_index);
    push_u16(out, annotation.values.len() as u16);
    for (name, value) in &annotation.values {
        let name_index = constants.utf8(name);
        push_u16(out, name_index);
        match value {
            TkValue::Int(v) => {
                out.push(b'I');
                let index = constants.integer(*v);
                push_u16(out, index);
            }
            TkValue::Str(v) => {
                out.push(b's');
                let index = constants.utf8(v);
                push_u16(out, index);
            }
        }
    }
}

fn emit_annotation_list(
    annotations: &[&TkAnnotation],
    attr_name: &str,
    constants: &mut Constants,
) -> Vec<u8> {
    let mut body = Vec::new();
    push_u16(&mut body, annotations.len() as u16);
    for annotation in annotations {
        emit_annotation(annotation, constants, &mut body);
    }
    attr(attr_name, body, constants)
}

fn emit_target(target: TargetRef, out: &mut Vec<u8>) {
    let sort = target.sort();
    let value = target.value();
    out.push(sort);
    match sort {
        TargetRef::CLASS_TYPE_PARAMETER
        | TargetRef::METHOD_TYPE_PARAMETER
        | TargetRef::METHOD_FORMAL_PARAMETER => out.push((value >> 16) as u8),
        TargetRef::SUPERTYPE | TargetRef::THROWS => push_u16(out, (value >> 8) as u16),
        TargetRef::CLASS_TYPE_PARAMETER_BOUND | TargetRef::METHOD_TYPE_PARAMETER_BOUND => {
            out.push((value >> 16) as u8);
            out.push((value >> 8) as u8);
        }
        TargetRef::FIELD | TargetRef::METHOD_RETURN | TargetRef::METHOD_RECEIVER => {}
        _ => unreachable!("testkit only emits declaration-site targets"),
    }
}

fn emit_type_annotation_list(
    annotations: &[&TkTypeAnnotation],
    attr_name: &str,
    constants: &mut Constants,
) -> Vec<u8> {
    let mut body = Vec::new();
    push_u16(&mut body, annotations.len() as u16);
    for ta in annotations {
        emit_target(ta.target, &mut body);
        body.push(ta.path.steps().len() as u8);
        for step in ta.path.steps() {
            match step {
                PathStep::Array => body.extend([0u8, 0]),
                PathStep::Inner => body.extend([1u8, 0]),
                PathStep::Wildcard => body.extend([2u8, 0]),
                PathStep::TypeArgument(index) => body.extend([3u8, *index]),
            }
        }
        emit_annotation(
            &TkAnnotation {
                visible: ta.visible,
                type_desc: ta.type_desc.clone(),
                values: Vec::new(),
            },
            constants,
            &mut body,
        );
    }
    attr(attr_name, body, constants)
}

/// The four annotation attributes, emitted only when non-empty.
fn emit_annotation_attrs(
    annotations: &[TkAnnotation],
    type_annotations: &[TkTypeAnnotation],
    constants: &mut Constants,
) -> Vec<Vec<u8>> {
    let mut attrs = Vec::new();

    let visible: Vec<&TkAnnotation> = annotations.iter().filter(|a| a.visible).collect();
    if !visible.is_empty() {
        attrs.push(emit_annotation_list(
            &visible,
            "RuntimeVisibleAnnotations",
            constants,
        ));
    }
    let invisible: Vec<&TkAnnotation> = annotations.iter().filter(|a| !a.visible).collect();
    if !invisible.is_empty() {
        attrs.push(emit_annotation_list(
            &invisible,
            "RuntimeInvisibleAnnotations",
            constants,
        ));
    }

    let visible_type: Vec<&TkTypeAnnotation> =
        type_annotations.iter().filter(|a| a.visible).collect();
    if !visible_type.is_empty() {
        attrs.push(emit_type_annotation_list(
            &visible_type,
            "RuntimeVisibleTypeAnnotations",
            constants,
        ));
    }
    let invisible_type: Vec<&TkTypeAnnotation> =
        type_annotations.iter().filter(|a| !a.visible).collect();
    if !invisible_type.is_empty() {
        attrs.push(emit_type_annotation_list(
            &invisible_type,
            "RuntimeInvisibleTypeAnnotations",
            constants,
        ));
    }

    attrs
}

fn emit_parameter_annotations(
    parameters: &[Vec<String>],
    attr_name: &str,
    constants: &mut Constants,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.push(parameters.len() as u8);
    for parameter in parameters {
        push_u16(&mut body, parameter.len() as u16);
        for desc in parameter {
            emit_annotation(
                &TkAnnotation {
                    visible: true,
                    type_desc: desc.clone(),
                    values: Vec::new(),
                },
                constants,
                &mut body,
            );
        }
    }
    attr(attr_name, body, constants)
}

fn emit_member(member: &MemberDef, constants: &mut Constants) -> Vec<u8> {
    let name_index = constants.utf8(&member.name);
    let descriptor_index = constants.utf8(&member.descriptor);

    let mut attributes: Vec<Vec<u8>> = Vec::new();
    if let Some(signature) = &member.signature {
        attributes.push(emit_signature(signature, constants));
    }
    attributes.extend(emit_annotation_attrs(
        &member.annotations,
        &member.type_annotations,
        constants,
    ));
    if let Some(parameters) = &member.visible_parameter {
        attributes.push(emit_parameter_annotations(
            parameters,
            "RuntimeVisibleParameterAnnotations",
            constants,
        ));
    }
    if let Some(parameters) = &member.invisible_parameter {
        attributes.push(emit_parameter_annotations(
            parameters,
            "RuntimeInvisibleParameterAnnotations",
            constants,
        ));
    }

    let mut out = Vec::new();
    push_u16(&mut out, member.access);
    push_u16(&mut out, name_index);
    push_u16(&mut out, descriptor_index);
    push_u16(&mut out, attributes.len() as u16);
    for attribute in attributes {
        out.extend(attribute);
    }
    out
}

fn emit_module(module: &ModuleDef, constants: &mut Constants) -> Vec<u8> {
    let name_index = constants.module(&module.name);
    let mut body = Vec::new();
    push_u16(&mut body, name_index);
    push_u16(&mut body, module.flags);
    push_u16(&mut body, 0); // no version

    push_u16(&mut body, module.requires.len() as u16);
    for (name, flags) in &module.requires {
        let index = constants.module(name);
        push_u16(&mut body, index);
        push_u16(&mut body, *flags);
        push_u16(&mut body, 0); // no version
    }

    for table in [&module.exports, &module.opens] {
        push_u16(&mut body, table.len() as u16);
        for (package, to) in table.iter() {
            let index = constants.package(package);
            push_u16(&mut body, index);
            push_u16(&mut body, 0); // flags
            push_u16(&mut body, to.len() as u16);
            for target in to {
                let index = constants.module(target);
                push_u16(&mut body, index);
            }
        }
    }

    push_u16(&mut body, module.uses.len() as u16);
    for service in &module.uses {
        let index = constants.class(service);
        push_u16(&mut body, index);
    }

    push_u16(&mut body, module.provides.len() as u16);
    for (service, with) in &module.provides {
        let index = constants.class(service);
        push_u16(&mut body, index);
        push_u16(&mut body, with.len() as u16);
        for implementation in with {
            let index = constants.class(implementation);
            push_u16(&mut body, index);
        }
    }

    attr("Module", body, constants)
}

//! Class-record decoding: the attribute walk.

use crate::annot::{
    AnnotationValue, PathStep, RawAnnotation, RawTypeAnnotation, TargetRef, TypePath,
};
use crate::constant::ConstantPool;
use crate::raw::{RawAnnotations, RawClass, RawExports, RawMember, RawModule, RawProvides, RawRequires};
use crate::reader::Reader;
use crate::ClassError;

const MAGIC: u32 = 0xCAFE_BABE;

/// Decode a binary class record into its raw model.
///
/// Reads the constant pool, flags, names, fields, methods and the attributes
/// the model consumes (`Signature`, the four annotation attributes, the two
/// parameter-annotation attributes, `EnclosingMethod`, `InnerClasses`,
/// `Module`); every other attribute is skipped by its declared length.
pub fn decode_class(bytes: &[u8]) -> Result<RawClass, ClassError> {
    let mut r = Reader::new(bytes);

    let magic = r.u32()?;
    if magic != MAGIC {
        return Err(ClassError::BadMagic { magic });
    }
    let _minor = r.u16()?;
    let major_version = r.u16()?;

    let cp = ConstantPool::read(&mut r)?;

    let access = r.u16()?;
    let name = cp.class_name(r.u16()?)?.to_string();
    let super_name = cp.opt_class_name(r.u16()?)?.map(str::to_string);

    let interface_count = r.u16()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(cp.class_name(r.u16()?)?.to_string());
    }

    let field_count = r.u16()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(read_member(&mut r, &cp)?);
    }

    let method_count = r.u16()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(read_member(&mut r, &cp)?);
    }

    let mut class = RawClass {
        major_version,
        access,
        name,
        super_name,
        interfaces,
        signature: None,
        annotations: RawAnnotations::default(),
        fields,
        methods,
        enclosing: None,
        module: None,
    };

    let attr_count = r.u16()?;
    for _ in 0..attr_count {
        let attr_name = cp.utf8(r.u16()?)?.to_string();
        let attr_len = r.u32()? as usize;
        match attr_name.as_str() {
            "Signature" => class.signature = Some(cp.utf8(r.u16()?)?.to_string()),
            "RuntimeVisibleAnnotations" => {
                class.annotations.visible = read_annotation_list(&mut r, &cp)?;
            }
            "RuntimeInvisibleAnnotations" => {
                class.annotations.invisible = read_annotation_list(&mut r, &cp)?;
            }
            "RuntimeVisibleTypeAnnotations" => {
                class.annotations.visible_type = read_type_annotation_list(&mut r, &cp)?;
            }
            "RuntimeInvisibleTypeAnnotations" => {
                class.annotations.invisible_type = read_type_annotation_list(&mut r, &cp)?;
            }
            "EnclosingMethod" => {
                let class_index = r.u16()?;
                let _method_index = r.u16()?;
                class.enclosing = Some(cp.class_name(class_index)?.to_string());
            }
            "InnerClasses" => {
                read_inner_classes(&mut r, &cp, &mut class)?;
            }
            "Module" => class.module = Some(read_module(&mut r, &cp)?),
            _ => r.skip(attr_len)?,
        }
    }

    Ok(class)
}

fn read_member(r: &mut Reader<'_>, cp: &ConstantPool) -> Result<RawMember, ClassError> {
    let access = r.u16()?;
    let name = cp.utf8(r.u16()?)?.to_string();
    let descriptor = cp.utf8(r.u16()?)?.to_string();

    let mut member = RawMember {
        access,
        name,
        descriptor,
        signature: None,
        annotations: RawAnnotations::default(),
        visible_parameter: Vec::new(),
        invisible_parameter: Vec::new(),
    };

    let attr_count = r.u16()?;
    for _ in 0..attr_count {
        let attr_name = cp.utf8(r.u16()?)?.to_string();
        let attr_len = r.u32()? as usize;
        match attr_name.as_str() {
            "Signature" => member.signature = Some(cp.utf8(r.u16()?)?.to_string()),
            "RuntimeVisibleAnnotations" => {
                member.annotations.visible = read_annotation_list(r, cp)?;
            }
            "RuntimeInvisibleAnnotations" => {
                member.annotations.invisible = read_annotation_list(r, cp)?;
            }
            "RuntimeVisibleTypeAnnotations" => {
                member.annotations.visible_type = read_type_annotation_list(r, cp)?;
            }
            "RuntimeInvisibleTypeAnnotations" => {
                member.annotations.invisible_type = read_type_annotation_list(r, cp)?;
            }
            "RuntimeVisibleParameterAnnotations" => {
                member.visible_parameter = read_parameter_annotations(r, cp)?;
            }
            "RuntimeInvisibleParameterAnnotations" => {
                member.invisible_parameter = read_parameter_annotations(r, cp)?;
            }
            _ => r.skip(attr_len)?,
        }
    }

    Ok(member)
}

fn read_inner_classes(
    r: &mut Reader<'_>,
    cp: &ConstantPool,
    class: &mut RawClass,
) -> Result<(), ClassError> {
    let count = r.u16()?;
    for _ in 0..count {
        let inner_index = r.u16()?;
        let outer_index = r.u16()?;
        let _inner_name = r.u16()?;
        let _inner_access = r.u16()?;
        let inner_name = cp.class_name(inner_index)?;
        if inner_name == class.name && outer_index != 0 && class.enclosing.is_none() {
            class.enclosing = Some(cp.class_name(outer_index)?.to_string());
        }
    }
    Ok(())
}

fn read_annotation_list(
    r: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<Vec<RawAnnotation>, ClassError> {
    let count = r.u16()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(read_annotation(r, cp)?);
    }
    Ok(annotations)
}

fn read_annotation(r: &mut Reader<'_>, cp: &ConstantPool) -> Result<RawAnnotation, ClassError> {
    let type_desc = cp.utf8(r.u16()?)?.to_string();
    let pair_count = r.u16()?;
    let mut values = Vec::with_capacity(pair_count as usize);
    for _ in 0..pair_count {
        let name = cp.utf8(r.u16()?)?.to_string();
        values.push((name, read_element_value(r, cp)?));
    }
    Ok(RawAnnotation { type_desc, values })
}

fn read_element_value(
    r: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<AnnotationValue, ClassError> {
    let tag = r.u8()? as char;
    let value = match tag {
        'B' | 'S' | 'I' => AnnotationValue::Int(i64::from(cp.integer(r.u16()?)?)),
        'J' => AnnotationValue::Int(cp.long(r.u16()?)?),
        'F' => AnnotationValue::Float(f64::from(cp.float(r.u16()?)?)),
        'D' => AnnotationValue::Float(cp.double(r.u16()?)?),
        'Z' => AnnotationValue::Boolean(cp.integer(r.u16()?)? != 0),
        'C' => {
            let code = cp.integer(r.u16()?)?;
            let ch = u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .ok_or(ClassError::BadElementTag { tag })?;
            AnnotationValue::Char(ch)
        }
        's' => AnnotationValue::Str(cp.utf8(r.u16()?)?.to_string()),
        'e' => AnnotationValue::EnumConstant {
            type_desc: cp.utf8(r.u16()?)?.to_string(),
            const_name: cp.utf8(r.u16()?)?.to_string(),
        },
        'c' => AnnotationValue::ClassLiteral(cp.utf8(r.u16()?)?.to_string()),
        '@' => AnnotationValue::Nested(read_annotation(r, cp)?),
        '[' => {
            let count = r.u16()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(read_element_value(r, cp)?);
            }
            AnnotationValue::Array(values)
        }
        _ => return Err(ClassError::BadElementTag { tag }),
    };
    Ok(value)
}

fn read_parameter_annotations(
    r: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<Vec<Vec<RawAnnotation>>, ClassError> {
    let parameter_count = r.u8()?;
    let mut parameters = Vec::with_capacity(parameter_count as usize);
    for _ in 0..parameter_count {
        parameters.push(read_annotation_list(r, cp)?);
    }
    Ok(parameters)
}

fn read_type_annotation_list(
    r: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<Vec<RawTypeAnnotation>, ClassError> {
    let count = r.u16()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(read_type_annotation(r, cp)?);
    }
    Ok(annotations)
}

fn read_type_annotation(
    r: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<RawTypeAnnotation, ClassError> {
    let target_type = r.u8()?;
    // Only declaration-site sorts can occur at class/field/method level; the
    // code-level sorts (0x40..) live inside Code attributes, which are
    // skipped wholesale.
    let target = match target_type {
        TargetRef::CLASS_TYPE_PARAMETER => TargetRef::class_type_parameter(r.u8()?),
        TargetRef::METHOD_TYPE_PARAMETER => TargetRef::method_type_parameter(r.u8()?),
        TargetRef::SUPERTYPE => TargetRef::supertype(r.u16()?),
        TargetRef::CLASS_TYPE_PARAMETER_BOUND => {
            let parameter = r.u8()?;
            let bound = r.u8()?;
            TargetRef::class_type_parameter_bound(parameter, bound)
        }
        TargetRef::METHOD_TYPE_PARAMETER_BOUND => {
            let parameter = r.u8()?;
            let bound = r.u8()?;
            TargetRef::method_type_parameter_bound(parameter, bound)
        }
        TargetRef::FIELD => TargetRef::field(),
        TargetRef::METHOD_RETURN => TargetRef::method_return(),
        TargetRef::METHOD_RECEIVER => TargetRef::method_receiver(),
        TargetRef::METHOD_FORMAL_PARAMETER => TargetRef::formal_parameter(r.u8()?),
        TargetRef::THROWS => TargetRef::throws(r.u16()?),
        _ => return Err(ClassError::UnsupportedTarget { target_type }),
    };

    let path_length = r.u8()?;
    let mut path = TypePath::new();
    for _ in 0..path_length {
        let kind = r.u8()?;
        let argument_index = r.u8()?;
        let step = match kind {
            0 => PathStep::Array,
            1 => PathStep::Inner,
            2 => PathStep::Wildcard,
            3 => PathStep::TypeArgument(argument_index),
            _ => return Err(ClassError::BadPathKind { kind }),
        };
        path.push(step);
    }

    let annotation = read_annotation(r, cp)?;
    Ok(RawTypeAnnotation {
        target,
        path,
        annotation,
    })
}

fn read_module(r: &mut Reader<'_>, cp: &ConstantPool) -> Result<RawModule, ClassError> {
    let name = cp.module_name(r.u16()?)?.to_string();
    let flags = r.u16()?;
    let version = cp.opt_utf8(r.u16()?)?.map(str::to_string);

    let requires_count = r.u16()?;
    let mut requires = Vec::with_capacity(requires_count as usize);
    for _ in 0..requires_count {
        let module = cp.module_name(r.u16()?)?.to_string();
        let flags = r.u16()?;
        let version = cp.opt_utf8(r.u16()?)?.map(str::to_string);
        requires.push(RawRequires {
            module,
            flags,
            version,
        });
    }

    let exports = read_package_directives(r, cp)?;
    let opens = read_package_directives(r, cp)?;

    let uses_count = r.u16()?;
    let mut uses = Vec::with_capacity(uses_count as usize);
    for _ in 0..uses_count {
        uses.push(cp.class_name(r.u16()?)?.to_string());
    }

    let provides_count = r.u16()?;
    let mut provides = Vec::with_capacity(provides_count as usize);
    for _ in 0..provides_count {
        let service = cp.class_name(r.u16()?)?.to_string();
        let with_count = r.u16()?;
        let mut with = Vec::with_capacity(with_count as usize);
        for _ in 0..with_count {
            with.push(cp.class_name(r.u16()?)?.to_string());
        }
        provides.push(RawProvides { service, with });
    }

    Ok(RawModule {
        name,
        flags,
        version,
        requires,
        exports,
        opens,
        uses,
        provides,
    })
}

/// `exports` and `opens` tables share one layout.
fn read_package_directives(
    r: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<Vec<RawExports>, ClassError> {
    let count = r.u16()?;
    let mut directives = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let package = cp.package_name(r.u16()?)?.to_string();
        let flags = r.u16()?;
        let to_count = r.u16()?;
        let mut to = Vec::with_capacity(to_count as usize);
        for _ in 0..to_count {
            to.push(cp.module_name(r.u16()?)?.to_string());
        }
        directives.push(RawExports { package, flags, to });
    }
    Ok(directives)
}

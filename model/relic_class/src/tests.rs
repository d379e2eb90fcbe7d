use crate::testkit::{ClassFile, MemberDef, ModuleDef, TkValue};
use crate::{access, decode_class, AnnotationValue, ClassError, TargetRef, TypePath};
use pretty_assertions::assert_eq;

#[test]
fn decodes_names_flags_and_interfaces() {
    let bytes = ClassFile::new("pkg/Sample")
        .super_name("pkg/Base")
        .interface("java/io/Serializable")
        .interface("pkg/Marker")
        .build();

    let class = decode_class(&bytes).unwrap();
    assert_eq!(class.name, "pkg/Sample");
    assert_eq!(class.super_name.as_deref(), Some("pkg/Base"));
    assert_eq!(class.interfaces, vec!["java/io/Serializable", "pkg/Marker"]);
    assert!(class.access & access::ACC_PUBLIC != 0);
    assert!(class.module.is_none());
    assert!(class.signature.is_none());
}

#[test]
fn decodes_signature_attribute() {
    let bytes = ClassFile::new("pkg/Box")
        .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
        .build();

    let class = decode_class(&bytes).unwrap();
    assert_eq!(
        class.signature.as_deref(),
        Some("<T:Ljava/lang/Object;>Ljava/lang/Object;")
    );
}

#[test]
fn decodes_members_with_signatures() {
    let bytes = ClassFile::new("pkg/Sample")
        .field(MemberDef::field("items", "Ljava/util/List;").signature("Ljava/util/List<TT;>;"))
        .method(MemberDef::method("size", "()I"))
        .build();

    let class = decode_class(&bytes).unwrap();
    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.fields[0].name, "items");
    assert_eq!(class.fields[0].descriptor, "Ljava/util/List;");
    assert_eq!(
        class.fields[0].signature.as_deref(),
        Some("Ljava/util/List<TT;>;")
    );
    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.methods[0].descriptor, "()I");
}

#[test]
fn absent_annotation_attributes_decode_to_empty_lists() {
    let bytes = ClassFile::new("pkg/Plain").build();
    let class = decode_class(&bytes).unwrap();
    assert!(class.annotations.visible.is_empty());
    assert!(class.annotations.invisible.is_empty());
    assert!(class.annotations.visible_type.is_empty());
    assert!(class.annotations.invisible_type.is_empty());
}

#[test]
fn decodes_annotations_and_element_values() {
    let bytes = ClassFile::new("pkg/Sample")
        .method(
            MemberDef::method("run", "()V")
                .annotation_with(
                    "Lpkg/Timed;",
                    &[
                        ("millis", TkValue::Int(250)),
                        ("label", TkValue::Str("slow".to_string())),
                    ],
                )
                .invisible_annotation("Lpkg/Internal;"),
        )
        .build();

    let class = decode_class(&bytes).unwrap();
    let method = &class.methods[0];
    assert_eq!(method.annotations.visible.len(), 1);
    let timed = &method.annotations.visible[0];
    assert_eq!(timed.type_name(), "pkg/Timed");
    assert_eq!(
        timed.values,
        vec![
            ("millis".to_string(), AnnotationValue::Int(250)),
            ("label".to_string(), AnnotationValue::Str("slow".to_string())),
        ]
    );
    assert_eq!(method.annotations.invisible.len(), 1);
    assert_eq!(method.annotations.invisible[0].type_name(), "pkg/Internal");
}

#[test]
fn decodes_type_annotation_target_and_path() {
    let path = TypePath::new().array().type_argument(1).wildcard_bound();
    let bytes = ClassFile::new("pkg/Sample")
        .field(
            MemberDef::field("data", "[Ljava/util/List;")
                .type_annotation(TargetRef::field(), path.clone(), "Lpkg/NonNull;"),
        )
        .build();

    let class = decode_class(&bytes).unwrap();
    let field = &class.fields[0];
    assert_eq!(field.annotations.visible_type.len(), 1);
    let ta = &field.annotations.visible_type[0];
    assert_eq!(ta.target, TargetRef::field());
    assert_eq!(ta.target.sort(), TargetRef::FIELD);
    assert_eq!(ta.path, path);
    assert_eq!(ta.path.to_string(), "[1;*");
    assert_eq!(ta.annotation.type_name(), "pkg/NonNull");
}

#[test]
fn decodes_supertype_and_bound_targets() {
    let bytes = ClassFile::new("pkg/Sample")
        .interface("pkg/Marker")
        .type_annotation(
            TargetRef::supertype(0),
            TypePath::new(),
            "Lpkg/Checked;",
        )
        .type_annotation(
            TargetRef::class_type_parameter_bound(1, 2),
            TypePath::new(),
            "Lpkg/Bounded;",
        )
        .build();

    let class = decode_class(&bytes).unwrap();
    let targets: Vec<TargetRef> = class
        .annotations
        .visible_type
        .iter()
        .map(|ta| ta.target)
        .collect();
    assert_eq!(
        targets,
        vec![
            TargetRef::supertype(0),
            TargetRef::class_type_parameter_bound(1, 2),
        ]
    );
}

#[test]
fn decodes_parameter_annotations_with_declared_count() {
    // Two descriptor parameters, only one declared annotable: the record
    // models a synthetic leading parameter.
    let bytes = ClassFile::new("pkg/Sample")
        .method(
            MemberDef::method("accept", "(Lpkg/Outer;I)V")
                .parameter_annotations(vec![vec!["Lpkg/Positive;"]]),
        )
        .build();

    let class = decode_class(&bytes).unwrap();
    let method = &class.methods[0];
    assert_eq!(method.visible_parameter.len(), 1);
    assert_eq!(method.visible_parameter[0].len(), 1);
    assert_eq!(method.visible_parameter[0][0].type_name(), "pkg/Positive");
    assert!(method.invisible_parameter.is_empty());
}

#[test]
fn decodes_module_attribute() {
    let bytes = ClassFile::module_info(
        ModuleDef::new("app.core")
            .open()
            .requires("java.base", 0)
            .requires("app.util", access::ACC_TRANSITIVE)
            .requires("app.dev", access::ACC_STATIC_PHASE)
            .exports("app/core/api", &[])
            .exports("app/core/spi", &["app.plugins"])
            .opens("app/core/internal", &["app.test"])
            .uses("app/core/spi/Handler")
            .provides("app/core/spi/Handler", &["app/core/impl/DefaultHandler"]),
    )
    .build();

    let class = decode_class(&bytes).unwrap();
    assert_eq!(class.name, "module-info");
    let module = class.module.expect("module attribute");
    assert_eq!(module.name, "app.core");
    assert!(module.is_open());

    assert_eq!(module.requires.len(), 3);
    assert!(!module.requires[0].is_transitive());
    assert!(module.requires[1].is_transitive());
    assert!(module.requires[2].is_static_phase());

    assert_eq!(module.exports.len(), 2);
    assert_eq!(module.exports[0].package, "app/core/api");
    assert!(module.exports[0].to.is_empty());
    assert_eq!(module.exports[1].to, vec!["app.plugins"]);

    assert_eq!(module.opens.len(), 1);
    assert_eq!(module.opens[0].package, "app/core/internal");

    assert_eq!(module.uses, vec!["app/core/spi/Handler"]);
    assert_eq!(module.provides.len(), 1);
    assert_eq!(module.provides[0].service, "app/core/spi/Handler");
    assert_eq!(module.provides[0].with, vec!["app/core/impl/DefaultHandler"]);
}

#[test]
fn rejects_bad_magic() {
    let err = decode_class(&[0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0]).unwrap_err();
    assert_eq!(err, ClassError::BadMagic { magic: 0xDEAD_BEEF });
}

#[test]
fn rejects_truncated_record() {
    let mut bytes = ClassFile::new("pkg/Sample").build();
    bytes.truncate(bytes.len() - 3);
    assert!(matches!(
        decode_class(&bytes).unwrap_err(),
        ClassError::Truncated { .. }
    ));
}

#[test]
fn rejects_unknown_constant_tag() {
    let mut bytes = Vec::new();
    bytes.extend(0xCAFE_BABEu32.to_be_bytes());
    bytes.extend([0u8, 0, 0, 55]); // minor, major
    bytes.extend([0u8, 2]); // constant pool count: one real entry
    bytes.push(99); // bogus tag
    assert_eq!(
        decode_class(&bytes).unwrap_err(),
        ClassError::BadConstantTag { tag: 99, index: 1 }
    );
}

#[test]
fn type_path_rendering_is_canonical_and_ordered() {
    assert_eq!(TypePath::new().to_string(), "");
    assert_eq!(
        TypePath::new().array().inner_type().wildcard_bound().type_argument(2).to_string(),
        "[.*2;"
    );
    // Order-sensitive: same steps, different order, different path.
    assert_ne!(
        TypePath::new().array().wildcard_bound(),
        TypePath::new().wildcard_bound().array()
    );
}

//! Path-addressed annotation lookup and parameter-shift tests.

use pretty_assertions::assert_eq;
use relic_class::testkit::{ClassFile, MemberDef, TkValue};
use relic_class::{TargetRef, TypePath};

use super::pool_of;
use crate::{find, AnnotationValue, Member, TargetPath};

fn only_member(bytes: Vec<u8>) -> Member {
    let pool = pool_of(&[("pkg/Subject", bytes)]);
    let descriptor = pool.type_by_internal_name("pkg/Subject", None).unwrap();
    let members = descriptor.members().unwrap();
    assert_eq!(members.len(), 1);
    members[0].clone()
}

#[test]
fn root_path_returns_declaration_lists_visible_first() {
    let bytes = ClassFile::new("pkg/Subject")
        .field(
            MemberDef::field("value", "I")
                .annotation("Lmark/Vis;")
                .invisible_annotation("Lmark/Invis;")
                .type_annotation(TargetRef::field(), TypePath::new(), "Lmark/OnType;"),
        )
        .build();
    let member = only_member(bytes);

    let found = member.find_annotations(&TargetPath::root());
    let names: Vec<&str> = found.iter().map(|a| a.type_name()).collect();
    assert_eq!(names, ["mark/Vis", "mark/Invis"]);
}

#[test]
fn targeted_path_adds_matching_type_annotations() {
    let bytes = ClassFile::new("pkg/Subject")
        .field(
            MemberDef::field("xs", "[Ljava/lang/String;")
                .annotation("Lmark/Decl;")
                .type_annotation(TargetRef::field(), TypePath::new(), "Lmark/Top;")
                .type_annotation(TargetRef::field(), TypePath::new().array(), "Lmark/Elem;"),
        )
        .build();
    let member = only_member(bytes);

    let top = member.find_annotations(&TargetPath::to(TargetRef::field()));
    let names: Vec<&str> = top.iter().map(|a| a.type_name()).collect();
    assert_eq!(names, ["mark/Decl", "mark/Top"]);

    let element = member.find_annotations(&TargetPath::to(TargetRef::field()).array());
    let names: Vec<&str> = element.iter().map(|a| a.type_name()).collect();
    assert_eq!(names, ["mark/Decl", "mark/Elem"]);

    // A path nothing is anchored at still reports the declaration lists.
    let missed = member.find_annotations(&TargetPath::to(TargetRef::field()).type_argument(0));
    let names: Vec<&str> = missed.iter().map(|a| a.type_name()).collect();
    assert_eq!(names, ["mark/Decl"]);
}

#[test]
fn matching_requires_the_same_target_reference() {
    let bytes = ClassFile::new("pkg/Subject")
        .method(
            MemberDef::method("run", "()Ljava/lang/String;").type_annotation(
                TargetRef::method_return(),
                TypePath::new(),
                "Lmark/Ret;",
            ),
        )
        .build();
    let member = only_member(bytes);

    let ret = member.find_annotations(&TargetPath::to(TargetRef::method_return()));
    assert_eq!(ret.len(), 1);
    assert_eq!(ret[0].type_name(), "mark/Ret");

    let receiver = member.find_annotations(&TargetPath::to(TargetRef::method_receiver()));
    assert!(receiver.is_empty());
}

#[test]
fn bare_formal_parameter_anchor_is_suppressed() {
    let bytes = ClassFile::new("pkg/Subject")
        .method(
            MemberDef::method("run", "([I)V")
                .type_annotation(
                    TargetRef::formal_parameter(0),
                    TypePath::new(),
                    "Lmark/OnParam;",
                )
                .type_annotation(
                    TargetRef::formal_parameter(0),
                    TypePath::new().array(),
                    "Lmark/OnElem;",
                ),
        )
        .build();
    let member = only_member(bytes);

    // No steps: the per-parameter tables own this anchor, nothing doubles up.
    let bare = member.find_annotations(&TargetPath::to(TargetRef::formal_parameter(0)));
    assert!(bare.is_empty());

    // With steps the anchor is unambiguous and matches normally.
    let stepped =
        member.find_annotations(&TargetPath::to(TargetRef::formal_parameter(0)).array());
    assert_eq!(stepped.len(), 1);
    assert_eq!(stepped[0].type_name(), "mark/OnElem");
}

#[test]
fn free_find_matches_the_method_form() {
    let bytes = ClassFile::new("pkg/Subject")
        .field(MemberDef::field("value", "I").annotation("Lmark/Vis;"))
        .build();
    let member = only_member(bytes);

    let path = TargetPath::root();
    assert_eq!(
        find(&path, member.annotations()),
        member.find_annotations(&path)
    );
}

#[test]
fn declared_parameter_lists_shift_to_descriptor_indices() {
    // Two descriptor parameters, one declared annotable list: the missing
    // leading parameter is synthetic, so the list belongs to index 1.
    let bytes = ClassFile::new("pkg/Subject")
        .method(
            MemberDef::method("run", "(Lpkg/Outer;I)V")
                .parameter_annotations(vec![vec!["Lmark/P;"]]),
        )
        .build();
    let member = only_member(bytes);

    assert!(member.parameter_annotations(0).is_empty());
    let shifted = member.parameter_annotations(1);
    assert_eq!(shifted.len(), 1);
    assert_eq!(shifted[0].type_name(), "mark/P");
    assert!(member.parameter_annotations(2).is_empty());
}

#[test]
fn full_parameter_tables_need_no_shift() {
    let bytes = ClassFile::new("pkg/Subject")
        .method(
            MemberDef::method("run", "(II)V")
                .parameter_annotations(vec![vec!["Lmark/A;"], vec![]])
                .invisible_parameter_annotations(vec![vec![], vec!["Lmark/B;"]]),
        )
        .build();
    let member = only_member(bytes);

    let first = member.parameter_annotations(0);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].type_name(), "mark/A");

    let second = member.parameter_annotations(1);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].type_name(), "mark/B");
}

#[test]
fn parameter_source_carries_type_lists_through() {
    let bytes = ClassFile::new("pkg/Subject")
        .method(
            MemberDef::method("run", "([I)V")
                .parameter_annotations(vec![vec!["Lmark/P;"]])
                .type_annotation(
                    TargetRef::formal_parameter(0),
                    TypePath::new().array(),
                    "Lmark/OnElem;",
                ),
        )
        .build();
    let member = only_member(bytes);

    let source = member.parameter_source(0);
    let decl = source.find(&TargetPath::root());
    assert_eq!(decl.len(), 1);
    assert_eq!(decl[0].type_name(), "mark/P");

    let typed = source.find(&TargetPath::to(TargetRef::formal_parameter(0)).array());
    let names: Vec<&str> = typed.iter().map(|a| a.type_name()).collect();
    assert_eq!(names, ["mark/P", "mark/OnElem"]);
}

#[test]
fn element_values_survive_the_pool_view() {
    let bytes = ClassFile::new("pkg/Subject")
        .field(MemberDef::field("value", "I").annotation_with(
            "Lmark/Timed;",
            &[
                ("millis", TkValue::Int(250)),
                ("label", TkValue::Str("slow".to_string())),
            ],
        ))
        .build();
    let member = only_member(bytes);

    let found = member.find_annotations(&TargetPath::root());
    assert_eq!(found.len(), 1);
    let timed = &found[0];
    assert_eq!(timed.type_name(), "mark/Timed");
    assert_eq!(timed.value("millis"), Some(&AnnotationValue::Int(250)));
    assert_eq!(
        timed.value("label"),
        Some(&AnnotationValue::Str("slow".to_string()))
    );
    assert_eq!(timed.value("absent"), None);
}

#[test]
fn class_level_annotations_anchor_on_supertypes() {
    let bytes = ClassFile::new("pkg/Subject")
        .annotation("Lmark/OnClass;")
        .type_annotation(
            TargetRef::supertype(TargetRef::SUPERCLASS_INDEX),
            TypePath::new(),
            "Lmark/OnSuper;",
        )
        .build();
    let pool = pool_of(&[("pkg/Subject", bytes)]);
    let descriptor = pool.type_by_internal_name("pkg/Subject", None).unwrap();

    let root = descriptor.find_annotations(&TargetPath::root()).unwrap();
    let names: Vec<&str> = root.iter().map(|a| a.type_name()).collect();
    assert_eq!(names, ["mark/OnClass"]);

    let on_super = descriptor
        .find_annotations(&TargetPath::to(TargetRef::supertype(
            TargetRef::SUPERCLASS_INDEX,
        )))
        .unwrap();
    let names: Vec<&str> = on_super.iter().map(|a| a.type_name()).collect();
    assert_eq!(names, ["mark/OnClass", "mark/OnSuper"]);
}

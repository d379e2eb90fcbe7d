//! Registration, lookup, materialization, and module resolution tests.

use pretty_assertions::assert_eq;
use relic_class::testkit::{ClassFile, MemberDef, ModuleDef};
use relic_class::access;
use relic_sig::{Primitive, TypeSig};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::{class_bytes, pool_of, CountingRecord, MapResolver};
use crate::archive::{Manifest, MemoryArchive};
use crate::{MemberGenerics, MemberKind, ModelError, ModuleKind, TypeKind, TypePool};

#[test]
fn lookup_materializes_indexed_record() {
    let pool = pool_of(&[("pkg/A", class_bytes("pkg/A"))]);

    let a = pool.type_by_internal_name("pkg/A", None).unwrap();
    assert_eq!(a.name(), "pkg/A");
    assert_eq!(a.kind(), TypeKind::Class);
    assert!(a.modifiers().is_public());
    assert!(a.is_resolved());
    assert_eq!(a.package(), "pkg");
    assert_eq!(a.source_name(), "pkg.A");
    assert_eq!(a.simple_name(), "A");

    let again = pool.type_by_internal_name("pkg/A", None).unwrap();
    assert!(Arc::ptr_eq(&a, &again));
}

#[test]
fn from_module_scope_does_not_change_identity() {
    let pool = pool_of(&[("pkg/A", class_bytes("pkg/A"))]);

    let unscoped = pool.type_by_internal_name("pkg/A", None).unwrap();
    let scoped = pool.type_by_internal_name("pkg/A", Some("m")).unwrap();
    assert!(Arc::ptr_eq(&unscoped, &scoped));
}

#[test]
fn missing_name_yields_cached_sentinel() {
    let pool = pool_of(&[]);

    let ghost = pool.type_by_internal_name("no/Such", None).unwrap();
    assert_eq!(ghost.kind(), TypeKind::Unresolved);
    assert!(!ghost.is_resolved());
    assert!(ghost.members().unwrap().is_empty());
    assert!(ghost.superclass().unwrap().is_none());
    assert!(ghost.interfaces().unwrap().is_empty());
    assert!(ghost.annotations().unwrap().is_empty());

    let again = pool.type_by_internal_name("no/Such", None).unwrap();
    assert!(Arc::ptr_eq(&ghost, &again));
}

#[test]
fn concurrent_lookup_parses_once() {
    let (shadowed, shadowed_reads) = CountingRecord::new("pkg/Shared", class_bytes("pkg/Shared"));
    let (record, reads) = CountingRecord::new("pkg/Shared", class_bytes("pkg/Shared"));
    let pool = TypePool::new();
    pool.register_archive(Arc::new(
        MemoryArchive::new().with_record(Arc::new(shadowed)),
    ))
    .unwrap();
    pool.register_archive(Arc::new(
        MemoryArchive::new().with_record(Arc::new(record)),
    ))
    .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let pool = pool.clone();
            std::thread::spawn(move || pool.type_by_internal_name("pkg/Shared", None).unwrap())
        })
        .collect();
    let found: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for descriptor in &found {
        assert!(Arc::ptr_eq(&found[0], descriptor));
    }
    // The later registration backs the name; the shadowed record is never
    // read, and the winning record is read exactly once.
    assert_eq!(reads.load(Ordering::SeqCst), 1);
    assert_eq!(shadowed_reads.load(Ordering::SeqCst), 0);
}

#[test]
fn later_registration_shadows_unmaterialized_name() {
    let pool = pool_of(&[("pkg/A", class_bytes("pkg/A"))]);
    let final_bytes = ClassFile::new("pkg/A")
        .access(access::ACC_PUBLIC | access::ACC_SUPER | access::ACC_FINAL)
        .build();
    pool.register_archive(Arc::new(MemoryArchive::new().with_class("pkg/A", final_bytes)))
        .unwrap();

    let a = pool.type_by_internal_name("pkg/A", None).unwrap();
    assert!(a.modifiers().is_final());
}

#[test]
fn materialized_descriptor_survives_later_registration() {
    let pool = pool_of(&[("pkg/A", class_bytes("pkg/A"))]);
    let first = pool.type_by_internal_name("pkg/A", None).unwrap();
    assert!(!first.modifiers().is_final());

    let final_bytes = ClassFile::new("pkg/A")
        .access(access::ACC_PUBLIC | access::ACC_SUPER | access::ACC_FINAL)
        .build();
    pool.register_archive(Arc::new(MemoryArchive::new().with_class("pkg/A", final_bytes)))
        .unwrap();

    let second = pool.type_by_internal_name("pkg/A", None).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!second.modifiers().is_final());
}

#[test]
fn record_declaring_another_name_is_an_error() {
    let pool = pool_of(&[("pkg/Wrong", class_bytes("pkg/A"))]);

    let err = pool.type_by_internal_name("pkg/Wrong", None).unwrap_err();
    assert_eq!(
        err,
        ModelError::NameMismatch {
            expected: "pkg/Wrong".to_string(),
            found: "pkg/A".to_string(),
        }
    );
}

#[test]
fn corrupt_record_is_a_structured_error() {
    let pool = pool_of(&[("pkg/Bad", vec![0, 1, 2, 3])]);

    let err = pool.type_by_internal_name("pkg/Bad", None).unwrap_err();
    assert!(matches!(err, ModelError::Class { ref name, .. } if name == "pkg/Bad"));

    // Other names keep working after a decode failure.
    let ghost = pool.type_by_internal_name("pkg/Good", None).unwrap();
    assert_eq!(ghost.kind(), TypeKind::Unresolved);
}

#[test]
fn supertypes_resolve_through_the_pool() {
    let derived = ClassFile::new("pkg/Derived")
        .super_name("pkg/Base")
        .interface("pkg/Iface")
        .build();
    let iface = ClassFile::new("pkg/Iface")
        .access(access::ACC_PUBLIC | access::ACC_INTERFACE | access::ACC_ABSTRACT)
        .build();
    let pool = pool_of(&[
        ("pkg/Derived", derived),
        ("pkg/Base", class_bytes("pkg/Base")),
        ("pkg/Iface", iface),
    ]);

    let descriptor = pool.type_by_internal_name("pkg/Derived", None).unwrap();
    let base = descriptor.superclass().unwrap().unwrap();
    assert_eq!(base.name(), "pkg/Base");
    assert_eq!(base.kind(), TypeKind::Class);

    let interfaces = descriptor.interfaces().unwrap();
    assert_eq!(interfaces.len(), 1);
    assert_eq!(interfaces[0].name(), "pkg/Iface");
    assert_eq!(interfaces[0].kind(), TypeKind::Interface);
}

#[test]
fn dangling_supertype_resolves_to_sentinel() {
    let derived = ClassFile::new("pkg/Derived").super_name("gone/Base").build();
    let pool = pool_of(&[("pkg/Derived", derived)]);

    let descriptor = pool.type_by_internal_name("pkg/Derived", None).unwrap();
    let base = descriptor.superclass().unwrap().unwrap();
    assert_eq!(base.name(), "gone/Base");
    assert_eq!(base.kind(), TypeKind::Unresolved);
}

#[test]
fn generic_signature_drives_supertypes() {
    let bytes = ClassFile::new("pkg/Box")
        .signature("<T:Ljava/lang/Object;>Lpkg/Base<TT;>;")
        .build();
    let pool = pool_of(&[("pkg/Box", bytes), ("pkg/Base", class_bytes("pkg/Base"))]);

    let descriptor = pool.type_by_internal_name("pkg/Box", None).unwrap();
    let generics = descriptor.generics().unwrap();
    assert!(generics.parameters.contains_key("T"));

    let base = descriptor.superclass().unwrap().unwrap();
    assert_eq!(base.name(), "pkg/Base");
    assert!(base.is_resolved());
}

#[test]
fn members_decode_with_parsed_generics() {
    let bytes = ClassFile::new("pkg/Holder")
        .field(MemberDef::field("count", "I"))
        .method(MemberDef::method("run", "(Ljava/lang/String;)V"))
        .build();
    let pool = pool_of(&[("pkg/Holder", bytes)]);

    let descriptor = pool.type_by_internal_name("pkg/Holder", None).unwrap();
    let members = descriptor.members().unwrap();
    assert_eq!(members.len(), 2);

    let count = descriptor.field("count").unwrap().unwrap();
    assert_eq!(count.kind(), MemberKind::Field);
    assert_eq!(count.descriptor(), "I");
    match &*count.generics().unwrap() {
        MemberGenerics::Field(sig) => assert_eq!(
            *sig,
            TypeSig::Primitive {
                kind: Primitive::Int,
                dims: 0,
            }
        ),
        MemberGenerics::Method(_) => panic!("field parsed as method"),
    }

    let run = descriptor.methods_named("run").unwrap();
    assert_eq!(run.len(), 1);
    match &*run[0].generics().unwrap() {
        MemberGenerics::Method(sig) => {
            assert_eq!(sig.argument_types.len(), 1);
            assert_eq!(sig.argument_types[0].class_name(), Some("java/lang/String"));
            assert_eq!(
                sig.return_type,
                TypeSig::Primitive {
                    kind: Primitive::Void,
                    dims: 0,
                }
            );
        }
        MemberGenerics::Field(_) => panic!("method parsed as field"),
    }
}

#[test]
fn registration_indexes_packages() {
    let pool = pool_of(&[
        ("com/acme/A", class_bytes("com/acme/A")),
        ("com/acme/sub/B", class_bytes("com/acme/sub/B")),
    ]);

    assert_eq!(pool.package_by_name("com.acme").name(), "com.acme");
    assert_eq!(pool.package_by_name("com.acme.sub").name(), "com.acme.sub");
}

#[test]
fn add_module_resolves_through_the_chain() {
    fn module_archive(name: &str) -> Arc<MemoryArchive> {
        Arc::new(
            MemoryArchive::new().with_module(ClassFile::module_info(ModuleDef::new(name)).build()),
        )
    }

    let pool = TypePool::new();
    let (resolver, calls) = MapResolver::new(vec![("lib.a", module_archive("lib.a"))]);
    pool.register_module_resolver(Box::new(resolver));

    let module = pool.add_module("lib.a").unwrap();
    assert_eq!(module.name(), "lib.a");
    assert_eq!(module.kind(), ModuleKind::Normal);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Already registered: no further resolver traffic.
    let again = pool.add_module("lib.a").unwrap();
    assert!(Arc::ptr_eq(&module, &again));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let err = pool.add_module("lib.missing").unwrap_err();
    assert_eq!(
        err,
        ModelError::ModuleUnresolved {
            name: "lib.missing".to_string(),
        }
    );
}

#[test]
fn closure_discovers_transitive_requires_without_revisits() {
    fn module_archive(def: ModuleDef) -> Arc<MemoryArchive> {
        Arc::new(MemoryArchive::new().with_module(ClassFile::module_info(def).build()))
    }

    let pool = TypePool::new();
    pool.register_archive(module_archive(ModuleDef::new("app").requires("lib.b", 0)))
        .unwrap();
    let (resolver, calls) = MapResolver::new(vec![
        ("lib.b", module_archive(ModuleDef::new("lib.b").requires("lib.c", 0))),
        ("lib.c", module_archive(ModuleDef::new("lib.c"))),
    ]);
    pool.register_module_resolver(Box::new(resolver));

    pool.add_modules_closure().unwrap();

    let mut names = pool.module_names();
    names.sort();
    assert_eq!(names, ["app", "lib.b", "lib.c"]);
    // One resolver probe per newly discovered name.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn static_phase_requires_is_optional_in_the_closure() {
    let def = ModuleDef::new("app").requires("ghost", access::ACC_STATIC_PHASE);
    let pool = TypePool::new();
    pool.register_archive(Arc::new(
        MemoryArchive::new().with_module(ClassFile::module_info(def).build()),
    ))
    .unwrap();

    pool.add_modules_closure().unwrap();
    assert_eq!(pool.module_by_name("ghost").kind(), ModuleKind::Unresolved);
}

#[test]
fn mandatory_requires_fails_the_closure() {
    let def = ModuleDef::new("app").requires("gone", 0);
    let pool = TypePool::new();
    pool.register_archive(Arc::new(
        MemoryArchive::new().with_module(ClassFile::module_info(def).build()),
    ))
    .unwrap();

    let err = pool.add_modules_closure().unwrap_err();
    assert_eq!(
        err,
        ModelError::ModuleUnresolved {
            name: "gone".to_string(),
        }
    );
}

#[test]
fn manifest_name_registers_an_automatic_module() {
    let pool = TypePool::new();
    pool.register_archive(Arc::new(
        MemoryArchive::new()
            .with_class("util/U", class_bytes("util/U"))
            .with_manifest(Manifest::new().with("Automatic-Module-Name", "com.acme.util")),
    ))
    .unwrap();

    let module = pool.module_by_name("com.acme.util");
    assert_eq!(module.kind(), ModuleKind::Automatic);
    assert!(module.directives().is_empty());
}

#[test]
fn module_sentinels_are_cached_and_distinct_from_resolved() {
    let pool = TypePool::new();
    let ghost = pool.module_by_name("lib");
    assert_eq!(ghost.kind(), ModuleKind::Unresolved);
    assert!(Arc::ptr_eq(&ghost, &pool.module_by_name("lib")));

    // Registering the real module takes precedence over the cached
    // sentinel, and the two never compare equal.
    pool.register_archive(Arc::new(
        MemoryArchive::new().with_module(ClassFile::module_info(ModuleDef::new("lib")).build()),
    ))
    .unwrap();
    let real = pool.module_by_name("lib");
    assert!(real.is_resolved());
    assert_ne!(*real, *ghost);
}

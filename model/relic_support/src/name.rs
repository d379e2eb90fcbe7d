//! Binary-name helpers.
//!
//! Class records are keyed by their internal, slash-delimited binary name
//! (`java/util/Map$Entry`). Packages are keyed by their dotted name
//! (`java.util`). These helpers convert between the two without allocating
//! when possible.

/// Dotted package name implied by an internal binary name.
///
/// `java/util/Map$Entry` → `java.util`; a name with no package yields `""`.
pub fn package_of(internal_name: &str) -> String {
    match internal_name.rfind('/') {
        Some(idx) => internal_name[..idx].replace('/', "."),
        None => String::new(),
    }
}

/// The simple (unqualified) name of an internal binary name.
///
/// `java/util/Map$Entry` → `Entry`.
pub fn simple_name_of(internal_name: &str) -> &str {
    let tail = match internal_name.rfind('/') {
        Some(idx) => &internal_name[idx + 1..],
        None => internal_name,
    };
    match tail.rfind('$') {
        Some(idx) => &tail[idx + 1..],
        None => tail,
    }
}

/// Source-style dotted name for an internal binary name.
///
/// `java/util/Map$Entry` → `java.util.Map$Entry`.
pub fn to_source_name(internal_name: &str) -> String {
    internal_name.replace('/', ".")
}

/// Internal binary name for a source-style dotted name.
///
/// `java.util.Map` → `java/util/Map`.
pub fn to_internal_name(source_name: &str) -> String {
    source_name.replace('.', "/")
}

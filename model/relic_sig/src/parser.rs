//! Recursive-descent signature parser.
//!
//! Walks the signature left to right with a byte scanner; no backtracking.
//! Class-type terms accumulate into a small segment builder that is
//! finalized at the grammar's transition points: end of term, start of an
//! inner-class segment, start of the next formal parameter.

use crate::error::SignatureError;
use crate::types::{
    Bound, BoundKind, GenericMethodParameters, GenericTypeParameters, Primitive, TypeParamBound,
    TypeSig,
};
use indexmap::IndexMap;

/// Parse a class declaration signature: formal type parameters, superclass
/// signature and interface signatures.
pub fn parse_class_signature(signature: &str) -> Result<GenericTypeParameters, SignatureError> {
    let mut s = Scanner::new(signature);
    let parameters = parse_formal_parameters(&mut s)?;
    let superclass = parse_reference(&mut s)?;
    let mut interfaces = Vec::new();
    while !s.at_end() {
        interfaces.push(parse_reference(&mut s)?);
    }
    Ok(GenericTypeParameters {
        parameters,
        superclass: Some(superclass),
        interfaces,
    })
}

/// Parse a method declaration signature or plain method descriptor.
pub fn parse_method_signature(signature: &str) -> Result<GenericMethodParameters, SignatureError> {
    let mut s = Scanner::new(signature);
    let parameters = parse_formal_parameters(&mut s)?;
    s.expect(b'(', "`(`")?;
    let mut argument_types = Vec::new();
    while s.peek() != Some(b')') {
        argument_types.push(parse_type(&mut s)?);
    }
    s.expect(b')', "`)`")?;

    let return_type = if s.peek() == Some(b'V') {
        s.bump("return type")?;
        TypeSig::Primitive {
            kind: Primitive::Void,
            dims: 0,
        }
    } else {
        parse_type(&mut s)?
    };

    let mut throws = Vec::new();
    while s.peek() == Some(b'^') {
        s.bump("throws signature")?;
        throws.push(parse_reference(&mut s)?);
    }
    s.finish()?;

    Ok(GenericMethodParameters {
        parameters,
        argument_types,
        return_type,
        throws,
    })
}

/// Parse a single type signature (a field signature or descriptor).
pub fn parse_type_signature(signature: &str) -> Result<TypeSig, SignatureError> {
    let mut s = Scanner::new(signature);
    let sig = parse_type(&mut s)?;
    s.finish()?;
    Ok(sig)
}

/// Parse a bare internal class name, array descriptor or primitive
/// descriptor by synthesizing a minimal signature, so that the generic and
/// non-generic code paths share one implementation.
pub fn parse_internal_name(name: &str) -> Result<TypeSig, SignatureError> {
    let starts_like_descriptor = name.starts_with('[')
        || (name.len() == 1 && Primitive::from_descriptor(name.chars().next().unwrap_or(' ')).is_some());
    if starts_like_descriptor {
        parse_type_signature(name)
    } else {
        parse_type_signature(&format!("L{name};"))
    }
}

/// Synthesize a class's generic declaration from its plain super/interface
/// names, for records with no `Signature` attribute.
pub fn class_parameters_from_names(
    super_name: Option<&str>,
    interfaces: &[String],
) -> Result<GenericTypeParameters, SignatureError> {
    let superclass = super_name.map(parse_internal_name).transpose()?;
    let interfaces = interfaces
        .iter()
        .map(|name| parse_internal_name(name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(GenericTypeParameters {
        parameters: IndexMap::new(),
        superclass,
        interfaces,
    })
}

/// Number of declared parameters in a method descriptor or signature.
pub fn parameter_count(descriptor: &str) -> Result<usize, SignatureError> {
    Ok(parse_method_signature(descriptor)?.argument_types.len())
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\u{FFFD}')
    }

    fn bump(&mut self, expected: &'static str) -> Result<u8, SignatureError> {
        match self.peek() {
            Some(byte) => {
                self.pos += 1;
                Ok(byte)
            }
            None => Err(SignatureError::UnexpectedEnd {
                at: self.pos,
                expected,
                fragment: self.input.to_string(),
            }),
        }
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), SignatureError> {
        match self.peek() {
            Some(found) if found == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.unexpected(expected)),
            None => Err(SignatureError::UnexpectedEnd {
                at: self.pos,
                expected,
                fragment: self.input.to_string(),
            }),
        }
    }

    fn unexpected(&self, expected: &'static str) -> SignatureError {
        SignatureError::Unexpected {
            found: self.current_char(),
            at: self.pos,
            expected,
            fragment: self.input.to_string(),
        }
    }

    /// Consume input until one of the ASCII delimiters in `stop`.
    ///
    /// Delimiters are ASCII, so the returned slice is always valid UTF-8
    /// even for non-ASCII identifiers.
    fn take_until(&mut self, stop: &[u8]) -> &'a str {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if stop.contains(&byte) {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn finish(&self) -> Result<(), SignatureError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(SignatureError::TrailingInput {
                at: self.pos,
                fragment: self.input.to_string(),
            })
        }
    }
}

/// Parse the optional `<...>` formal type parameter list.
///
/// A parameter's bound is only fully known once its class bound and all
/// interface bounds have been visited, so each entry is flushed into the
/// ordered map exactly when the next parameter starts or the list ends.
fn parse_formal_parameters(
    s: &mut Scanner<'_>,
) -> Result<IndexMap<String, TypeParamBound>, SignatureError> {
    let mut parameters = IndexMap::new();
    if s.peek() != Some(b'<') {
        return Ok(parameters);
    }
    s.bump("`<`")?;

    while s.peek() != Some(b'>') {
        if s.at_end() {
            return Err(SignatureError::UnexpectedEnd {
                at: s.pos,
                expected: "formal type parameter or `>`",
                fragment: s.input.to_string(),
            });
        }
        let name = s.take_until(&[b':', b'>']).to_string();
        if name.is_empty() {
            return Err(s.unexpected("type parameter name"));
        }
        s.expect(b':', "`:`")?;

        // Class bound is optional: a second `:` directly after the first
        // means interface bounds only.
        let class_bound = match s.peek() {
            Some(b'L' | b'T' | b'[') => Some(parse_reference(s)?),
            _ => None,
        };

        let mut interface_bounds = Vec::new();
        while s.peek() == Some(b':') {
            s.bump("interface bound")?;
            interface_bounds.push(parse_reference(s)?);
        }

        let kind = if class_bound.is_none() && interface_bounds.is_empty() {
            BoundKind::Unbounded
        } else {
            BoundKind::Extends
        };
        parameters.insert(
            name,
            TypeParamBound {
                kind,
                class_bound,
                interface_bounds,
            },
        );
    }
    s.bump("`>`")?;
    Ok(parameters)
}

/// Parse a reference type signature: class type, type variable or array.
fn parse_reference(s: &mut Scanner<'_>) -> Result<TypeSig, SignatureError> {
    match s.peek() {
        Some(b'L' | b'T' | b'[') => parse_type(s),
        Some(_) => Err(s.unexpected("reference type signature")),
        None => Err(SignatureError::UnexpectedEnd {
            at: s.pos,
            expected: "reference type signature",
            fragment: s.input.to_string(),
        }),
    }
}

/// Parse any type signature, accumulating leading array markers.
fn parse_type(s: &mut Scanner<'_>) -> Result<TypeSig, SignatureError> {
    let mut dims: u8 = 0;
    while s.peek() == Some(b'[') {
        s.bump("array component type")?;
        dims = dims.saturating_add(1);
    }

    let at = s.pos;
    match s.bump("type signature")? {
        b'L' => parse_class_type(s, dims),
        b'T' => {
            let name = s.take_until(&[b';']).to_string();
            s.expect(b';', "`;`")?;
            Ok(TypeSig::Variable { name, dims })
        }
        byte => match Primitive::from_descriptor(byte as char) {
            Some(kind) => Ok(TypeSig::Primitive { kind, dims }),
            None => Err(SignatureError::UnknownBaseType {
                found: byte as char,
                at,
                fragment: s.input.to_string(),
            }),
        },
    }
}

/// One class-type segment under accumulation. Finalized at `;` (end of
/// term) or `.` (start of an inner segment, which resets dimension and
/// argument state).
struct Segment {
    name: String,
    dims: u8,
    args: Vec<Bound>,
}

impl Segment {
    fn finalize(self, outer: Option<TypeSig>) -> TypeSig {
        TypeSig::Class {
            name: self.name,
            dims: self.dims,
            args: self.args,
            outer: outer.map(Box::new),
        }
    }
}

/// Parse a class type signature, with the leading `L` already consumed.
fn parse_class_type(s: &mut Scanner<'_>, dims: u8) -> Result<TypeSig, SignatureError> {
    let mut outer: Option<TypeSig> = None;
    let mut segment = Segment {
        name: String::new(),
        dims,
        args: Vec::new(),
    };

    loop {
        segment.name.push_str(s.take_until(&[b'<', b'.', b';', b'>']));
        match s.bump("`;`, `<`, or `.`")? {
            b';' => return Ok(segment.finalize(outer)),
            b'<' => segment.args = parse_type_arguments(s)?,
            b'.' => {
                // Inner-class segment: the accumulated name becomes the
                // outer reference; its own dimension and argument state are
                // independent of ours. `.` is normalized to `$`.
                let qualified = format!("{}$", segment.name);
                outer = Some(segment.finalize(outer.take()));
                segment = Segment {
                    name: qualified,
                    dims: 0,
                    args: Vec::new(),
                };
            }
            _ => return Err(s.unexpected("`;`, `<`, or `.`")),
        }
    }
}

/// Parse `<...>` type arguments, with the leading `<` already consumed.
/// Consumes the closing `>`.
fn parse_type_arguments(s: &mut Scanner<'_>) -> Result<Vec<Bound>, SignatureError> {
    let mut args = Vec::new();
    loop {
        match s.peek() {
            Some(b'>') => {
                s.bump("`>`")?;
                return Ok(args);
            }
            Some(b'*') => {
                s.bump("wildcard")?;
                args.push(Bound::unbounded());
            }
            Some(b'+') => {
                s.bump("wildcard bound")?;
                args.push(Bound::extends(parse_reference(s)?));
            }
            Some(b'-') => {
                s.bump("wildcard bound")?;
                args.push(Bound::super_of(parse_reference(s)?));
            }
            Some(_) => args.push(Bound::exact(parse_reference(s)?)),
            None => {
                return Err(SignatureError::UnexpectedEnd {
                    at: s.pos,
                    expected: "type argument or `>`",
                    fragment: s.input.to_string(),
                })
            }
        }
    }
}

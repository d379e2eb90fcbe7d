//! Decoder errors.

use thiserror::Error;

/// Error raised while decoding a binary class record.
///
/// Clonable so that a memoized descriptor field can cache the failure and
/// hand the same error to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassError {
    /// The record ended before a required field.
    #[error("class record truncated at byte offset {at}")]
    Truncated { at: usize },

    /// The record does not start with the class-file magic number.
    #[error("bad magic number 0x{magic:08X}")]
    BadMagic { magic: u32 },

    /// An unknown constant pool tag.
    #[error("unknown constant pool tag {tag} at index {index}")]
    BadConstantTag { tag: u8, index: u16 },

    /// A constant pool index out of range or referring to the wrong kind.
    #[error("constant pool index {index} is not a valid {expected}")]
    BadConstant { index: u16, expected: &'static str },

    /// A constant pool string that is not valid UTF-8.
    #[error("malformed UTF-8 in constant pool index {index}")]
    BadUtf8 { index: u16 },

    /// An unknown annotation element value tag.
    #[error("unknown annotation element value tag `{tag}`")]
    BadElementTag { tag: char },

    /// A type-annotation target sort that cannot occur outside a method body.
    #[error("annotation target type 0x{target_type:02X} is not valid at declaration level")]
    UnsupportedTarget { target_type: u8 },

    /// A type-annotation path entry with an unknown kind.
    #[error("invalid type path kind {kind}")]
    BadPathKind { kind: u8 },
}

//! Signature parse errors.

use thiserror::Error;

/// Error raised for a malformed signature string.
///
/// Carries the full offending signature and the byte offset of the failure;
/// there is no partial or best-effort result. Clonable so memoized descriptor
/// fields can cache the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// A character that does not fit the grammar at this position.
    #[error("unexpected `{found}` at offset {at} in `{fragment}`: expected {expected}")]
    Unexpected {
        found: char,
        at: usize,
        expected: &'static str,
        fragment: String,
    },

    /// The signature ended where the grammar requires more input.
    #[error("signature `{fragment}` ended prematurely at offset {at}: expected {expected}")]
    UnexpectedEnd {
        at: usize,
        expected: &'static str,
        fragment: String,
    },

    /// An unrecognized base-type character. Malformed input, not a
    /// recoverable condition.
    #[error("unknown base type `{found}` at offset {at} in `{fragment}`")]
    UnknownBaseType {
        found: char,
        at: usize,
        fragment: String,
    },

    /// Input remained after a complete signature was parsed.
    #[error("trailing characters after offset {at} in `{fragment}`")]
    TrailingInput { at: usize, fragment: String },
}

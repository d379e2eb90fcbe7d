//! Model errors.

use relic_class::ClassError;
use relic_sig::SignatureError;
use thiserror::Error;

/// Error raised by pool operations.
///
/// Not-found is *never* an error — missing names flow through the model as
/// unresolved sentinel descriptors. Errors are reserved for malformed input
/// and for mandatory modules no resolver can produce. Clonable so memoized
/// descriptor fields can cache a failure and hand it to every caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Reading a record's bytes failed.
    #[error("failed to read class record `{name}`: {message}")]
    Io { name: String, message: String },

    /// A record's bytes do not decode as a class record.
    #[error("malformed class record `{name}`")]
    Class {
        name: String,
        #[source]
        source: ClassError,
    },

    /// A record carried a malformed generic signature.
    #[error("malformed signature in `{name}`")]
    Signature {
        name: String,
        #[source]
        source: SignatureError,
    },

    /// A record declares a different binary name than the one it was
    /// registered under.
    #[error("class record registered as `{expected}` declares name `{found}`")]
    NameMismatch { expected: String, found: String },

    /// A mandatory module that no registered resolver could produce.
    #[error("module `{name}` could not be resolved by any registered resolver")]
    ModuleUnresolved { name: String },
}

impl ModelError {
    pub(crate) fn io(name: &str, err: &std::io::Error) -> Self {
        ModelError::Io {
            name: name.to_string(),
            message: err.to_string(),
        }
    }
}

//! Error types for the DataStream wire codec.
//!
//! Decode errors are recoverable at frame boundaries (the framer skips past a
//! frame that fails to decode); encode errors surface directly to the caller
//! that attempted the send. See `quassel_core::SessionError` for how these
//! compose with session- and transport-level failures.

use thiserror::Error;

/// Errors raised while decoding or encoding the DataStream wire format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes remained in the cursor than the value being decoded
    /// requires.
    #[error("end of input: needed {needed} more byte(s), {available} available")]
    EndOfInput {
        /// Bytes the decoder still needed.
        needed: usize,
        /// Bytes actually left in the cursor.
        available: usize,
    },

    /// A string payload was not valid UTF-16BE.
    #[error("invalid UTF-16BE string payload")]
    InvalidUtf16,

    /// A byte-array payload expected to hold UTF-8 text did not.
    #[error("invalid UTF-8 byte array payload")]
    InvalidUtf8,

    /// The variant tag or user-type name has no registered decoder.
    #[error("unknown type {what} at offset {offset}")]
    UnknownType {
        /// Either `#<tag>` or the user-type name that failed to resolve.
        what: String,
        /// Cursor offset at which the lookup was attempted.
        offset: usize,
    },

    /// The caller attempted to encode a value with no wire representation.
    #[error("unsupported type for encoding: {0}")]
    UnsupportedType(&'static str),

    /// A structural invariant of a composite message was violated, e.g. a
    /// legacy key/value list with an odd number of elements.
    #[error("malformed message: {0}")]
    Malformed(String),
}

/// Errors raised while populating the type registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A user-type alias named a Qt type tag that has no built-in decoder.
    #[error("cannot alias user type {name:?} to unknown tag {tag}")]
    UnknownAliasTarget {
        /// The user-type name being registered.
        name: String,
        /// The tag it was aliased to.
        tag: u32,
    },
}

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, CodecError>;

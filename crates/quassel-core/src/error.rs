//! Session-level errors: the layer that composes [`quassel_proto::CodecError`]
//! with handshake and transport failures, mirroring the teacher's
//! `ConnectionError`/`ProtocolError` split.

use thiserror::Error;

use quassel_proto::CodecError;

/// Errors raised while driving a [`crate::session::Session`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// A frame failed to decode at the wire-codec layer.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The peer's probe reply rejected every protocol this client offered,
    /// or was malformed.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The server rejected the supplied credentials.
    #[error("login rejected: {0}")]
    LoginRejected(String),

    /// A message arrived that is not valid in the session's current state.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The transport closed (or was closed) before the session completed.
    #[error("transport closed: {0}")]
    TransportClosed(String),
}

impl SessionError {
    /// Whether retrying the connection (fresh probe, fresh handshake) might
    /// succeed, as opposed to a permanent rejection.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransportClosed(_) | Self::Codec(CodecError::EndOfInput { .. }))
    }
}

/// Convenience alias for session results.
pub type Result<T> = std::result::Result<T, SessionError>;

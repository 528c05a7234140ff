//! Transport- and client-level error types.

use thiserror::Error;

use quassel_core::SessionError;

/// Errors raised by the TCP/TLS/zlib transport layer, below the session
/// state machine.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying socket failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or record-layer failure.
    #[error("tls error: {0}")]
    Tls(String),

    /// The peer's probe reply named a protocol id this client didn't
    /// offer.
    #[error("protocol mismatch: expected {expected:#x}, peer chose {actual:#x}")]
    ProtocolMismatch {
        /// The protocol id this client advertised.
        expected: u8,
        /// The protocol id the peer actually returned.
        actual: u8,
    },
}

/// The top-level error returned from [`crate::Client`] operations,
/// composing every layer below it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A transport-level failure (socket, TLS).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A session-level failure (codec, handshake, protocol sequencing).
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The background connection task ended without anyone observing why
    /// (e.g. the `Client` handle was dropped mid-connect).
    #[error("connection task ended unexpectedly")]
    Disconnected,
}

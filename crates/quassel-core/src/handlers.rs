//! The caller-implemented hooks invoked during Established-state dispatch.
//!
//! Quassel's SYNC/RPC/INIT traffic carries caller-meaningful domain data
//! (IRC networks, buffers, identities) that this crate intentionally stays
//! agnostic to. Rather than have [`crate::session::Session`] hand back an
//! event enum for a driver loop to match on, it invokes the installed
//! [`Handlers`] implementation directly during frame dispatch — mirroring
//! how the caller supplies behavior at the seams the state machine can't
//! decide on its own.

use quassel_proto::Variant;

/// Hooks for Established-state traffic. Every method has a no-op default,
/// so implementors only override what they act on.
pub trait Handlers: Send + Sync {
    /// A `Sync` message: an object update or method call on a syncable
    /// object identified by `class_name`/`object_name`.
    fn on_sync(&self, class_name: &str, object_name: &str, signal: &str, args: &[Variant]) {
        let _ = (class_name, object_name, signal, args);
    }

    /// A bare RPC call with no target object.
    fn on_rpc_call(&self, function: &str, args: &[Variant]) {
        let _ = (function, args);
    }

    /// A request from the core to initialize a syncable object — sent to
    /// the core by this client, so in practice this fires when the core
    /// itself asks something of us (rare for a pure client role, but kept
    /// symmetric with `InitData`).
    fn on_init_request(&self, class_name: &str, object_name: &str) {
        let _ = (class_name, object_name);
    }

    /// The initial state of a syncable object, delivered in response to a
    /// prior `InitRequest` this client sent.
    fn on_init_data(&self, class_name: &str, object_name: &str, properties: &[(String, Variant)]) {
        let _ = (class_name, object_name, properties);
    }
}

/// A [`Handlers`] implementation that ignores every message. Useful for
/// tests and for callers that only want the handshake/heartbeat machinery.
#[derive(Debug, Default)]
pub struct NoopHandlers;

impl Handlers for NoopHandlers {}

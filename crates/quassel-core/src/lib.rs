//! The Quassel IRC-core session layer: probe negotiation, the legacy
//! handshake, and Established-state dispatch, built on the Sans-IO codec in
//! `quassel_proto`.
//!
//! This crate still doesn't touch a socket: `quassel_client` drives a
//! [`session::Session`] against a real transport.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
pub mod handlers;
pub mod handshake;
pub mod session;

pub use error::SessionError;
pub use handlers::{Handlers, NoopHandlers};
pub use handshake::LegacyMap;
pub use session::{Credentials, NegotiatedFeatures, Session, SessionAction, SessionState};

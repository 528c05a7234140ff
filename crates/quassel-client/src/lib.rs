//! An async client for the Quassel IRC-core DataStream wire protocol.
//!
//! [`Client::connect`] runs the probe, the legacy `ClientInit`/`ClientLogin`
//! handshake, and an optional TLS upgrade, then hands control to a
//! background task that keeps the heartbeat alive and dispatches
//! SYNC/RPC/INIT traffic to a caller-supplied [`quassel_core::Handlers`]
//! implementation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, TlsPolicy, TransportConfig};
pub use error::{ClientError, TransportError};

pub use quassel_core::{Handlers, NoopHandlers, SessionError, SessionState};
pub use quassel_proto::{registry, Registry, Variant};

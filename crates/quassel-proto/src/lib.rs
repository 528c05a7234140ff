//! Quassel IRC-core DataStream wire codec.
//!
//! Implements the `QDataStream` v8 (`Qt_4_2`) binary encoding used by the
//! Quassel core's DataStream protocol variant: fixed-width primitives,
//! Julian-day dates, `QVariant` and its containers, a runtime type registry
//! for user types, and the 32-bit length-prefixed frame format.
//!
//! This crate is Sans-IO: it knows nothing about sockets, TLS, or
//! compression. `quassel_core` builds the session state machine on top of
//! it; `quassel_client` wires that machine to a real transport.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
pub mod frame;
pub mod message;
pub mod primitive;
pub mod registry;
pub mod user_types;
pub mod variant;

pub use error::{CodecError, RegistryError};
pub use frame::Framer;
pub use message::MessageType;
pub use primitive::{Cursor, Date, DateTime, Time};
pub use registry::{Decoder, Registry, UserEntry};
pub use variant::Variant;

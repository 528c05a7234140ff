//! The six message kinds exchanged once a session reaches the Established
//! state, and their wire representation as the first element of a
//! `QVariantList`.

use crate::error::{CodecError, Result};

/// The kind of an Established-state message, carried as the first `qint16`
/// element of the outer `QVariantList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// A sync call: object update or method invocation on a SyncableObject.
    Sync = 1,
    /// A bare RPC call with no target object.
    RpcCall = 2,
    /// A request to initialize a SyncableObject's state.
    InitRequest = 3,
    /// The initial state of a SyncableObject, in response to `InitRequest`.
    InitData = 4,
    /// A heartbeat ping.
    HeartBeat = 5,
    /// A heartbeat pong.
    HeartBeatReply = 6,
}

impl MessageType {
    /// Map the wire `qint16` code to a [`MessageType`].
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownType`] for any code outside `1..=6`.
    pub fn from_wire(code: i16) -> Result<Self> {
        match code {
            1 => Ok(Self::Sync),
            2 => Ok(Self::RpcCall),
            3 => Ok(Self::InitRequest),
            4 => Ok(Self::InitData),
            5 => Ok(Self::HeartBeat),
            6 => Ok(Self::HeartBeatReply),
            other => Err(CodecError::UnknownType { what: format!("MessageType({other})"), offset: 0 }),
        }
    }

    /// The wire `qint16` code for this kind.
    #[must_use]
    pub fn to_wire(self) -> i16 {
        self as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_code() {
        for code in 1..=6i16 {
            let kind = MessageType::from_wire(code).unwrap();
            assert_eq!(kind.to_wire(), code);
        }
    }

    #[test]
    fn rejects_unknown_code() {
        assert!(MessageType::from_wire(0).is_err());
        assert!(MessageType::from_wire(7).is_err());
    }
}

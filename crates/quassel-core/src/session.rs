//! The session state machine: probe negotiation, legacy handshake, and
//! Established-state dispatch.
//!
//! Like the teacher's `Connection`, this is a pure state machine: it never
//! touches a socket. Callers feed it bytes/frames as they arrive and get
//! back a list of [`SessionAction`]s to execute (write these bytes, close
//! the connection). All wall-clock timing needed for heartbeat scheduling
//! is passed in explicitly rather than read from the system clock, keeping
//! the machine deterministic and unit-testable.

use std::time::Instant;

use bytes::{Bytes, BytesMut};
use quassel_proto::message::MessageType;
use quassel_proto::variant::{decode_variant_list, encode_variant};
use quassel_proto::{Registry, Variant};
use tracing::{debug, instrument, warn};

use crate::error::SessionError;
use crate::handshake::{decode_legacy_map, encode_legacy_map, LegacyMap};

/// Magic constant opening the probe's first word, ORed with the advertised
/// feature bits.
pub const PROBE_MAGIC: u32 = 0x42b3_3f00;

/// High bit of the probe's second word, marking it the last (only)
/// protocol offered.
pub const LIST_END: u32 = 0x8000_0000;

/// This client only speaks the DataStream protocol variant.
pub const PROTOCOL_DATASTREAM: u8 = 0x02;

/// Bit requesting TLS on the negotiated connection.
pub const FEATURE_TLS: u8 = 0x01;
/// Bit requesting zlib compression on the negotiated connection.
pub const FEATURE_COMPRESSION: u8 = 0x02;

/// Where a [`Session`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the peer's probe reply.
    Probing,
    /// Probe accepted; exchanging `ClientInit`/`ClientLogin` legacy
    /// messages.
    Handshaking,
    /// Login accepted; dispatching SYNC/RPC/INIT/heartbeat messages.
    Established,
}

/// What the caller negotiated (or was told by the peer) during probing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegotiatedFeatures {
    /// Whether the connection should be wrapped in TLS before anything
    /// else is sent.
    pub tls: bool,
    /// Whether frame payloads after the handshake are zlib-compressed.
    pub compression: bool,
}

/// Credentials presented during the legacy login exchange.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Quassel core user name.
    pub user: String,
    /// Quassel core password.
    pub password: String,
}

/// An effect the driver (`quassel_client::Client`) must carry out on
/// behalf of the state machine.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Write these bytes to the transport, unframed (used only for the
    /// raw probe exchange, which precedes the length-prefixed framer).
    SendRaw(Bytes),
    /// Encode and send this frame payload through the length-prefixed
    /// framer.
    SendFrame(Bytes),
    /// Close the connection; the session has failed or finished.
    Close(String),
}

/// The session state machine.
pub struct Session {
    state: SessionState,
    registry: Registry,
    credentials: Credentials,
    handlers: std::sync::Arc<dyn crate::handlers::Handlers>,
    features: NegotiatedFeatures,
    heartbeat_interval: std::time::Duration,
    last_heartbeat_sent: Option<Instant>,
}

impl Session {
    /// Start a new session. Call [`Session::start`] to get the actions for
    /// the probe.
    #[must_use]
    pub fn new(
        registry: Registry,
        credentials: Credentials,
        handlers: std::sync::Arc<dyn crate::handlers::Handlers>,
    ) -> Self {
        Self {
            state: SessionState::Probing,
            registry,
            credentials,
            handlers,
            features: NegotiatedFeatures::default(),
            heartbeat_interval: std::time::Duration::from_secs(30),
            last_heartbeat_sent: None,
        }
    }

    /// The session's current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Features negotiated (or defaulted) so far.
    #[must_use]
    pub fn features(&self) -> NegotiatedFeatures {
        self.features
    }

    /// Build the initial probe, requesting the given features: a 32-bit
    /// magic-plus-features word followed by a 32-bit
    /// protocol-id-plus-`LIST_END` word.
    #[instrument(skip(self))]
    pub fn start(&mut self, want_tls: bool, want_compression: bool) -> Vec<SessionAction> {
        let mut flags = 0u32;
        if want_tls {
            flags |= u32::from(FEATURE_TLS);
        }
        if want_compression {
            flags |= u32::from(FEATURE_COMPRESSION);
        }

        let word1 = PROBE_MAGIC | flags;
        let word2 = u32::from(PROTOCOL_DATASTREAM) | LIST_END;

        let mut buf = BytesMut::with_capacity(8);
        buf.extend_from_slice(&word1.to_be_bytes());
        buf.extend_from_slice(&word2.to_be_bytes());
        debug!(want_tls, want_compression, "sending protocol probe");
        vec![SessionAction::SendRaw(buf.freeze())]
    }

    /// Feed the peer's 4-byte probe reply (a single 32-bit word packing the
    /// protocol id, informational protocol features, and the actually
    /// negotiated connection features). On success, transitions to
    /// `Handshaking` and returns the `ClientInit` frame to send.
    ///
    /// # Errors
    /// Returns [`SessionError::HandshakeFailed`] if the peer rejected the
    /// DataStream protocol, or if fewer/more than 4 bytes were supplied.
    #[instrument(skip(self, reply))]
    pub fn receive_probe_reply(&mut self, reply: &[u8]) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != SessionState::Probing {
            return Err(SessionError::Protocol("probe reply received outside Probing state".into()));
        }
        if reply.len() != 4 {
            return Err(SessionError::HandshakeFailed(format!(
                "probe reply must be 4 bytes, got {}",
                reply.len()
            )));
        }
        let word = u32::from_be_bytes([reply[0], reply[1], reply[2], reply[3]]);
        let protocol = (word & 0xFF) as u8;
        let connection_features = ((word >> 24) & 0xFF) as u8;
        if protocol != PROTOCOL_DATASTREAM {
            return Err(SessionError::HandshakeFailed(format!(
                "peer rejected DataStream protocol, chose {protocol:#x}"
            )));
        }

        self.features = NegotiatedFeatures {
            tls: connection_features & FEATURE_TLS != 0,
            compression: connection_features & FEATURE_COMPRESSION != 0,
        };
        self.state = SessionState::Handshaking;
        debug!(tls = self.features.tls, compression = self.features.compression, "probe accepted, entering handshake");

        let init = LegacyMap::new(vec![
            ("MsgType".to_string(), Variant::String(Some("ClientInit".to_string()))),
            ("ClientVersion".to_string(), Variant::String(Some("quassel-rs".to_string()))),
            ("ClientDate".to_string(), Variant::String(Some(String::new()))),
            ("UseSsl".to_string(), Variant::Bool(self.features.tls)),
            ("UseCompression".to_string(), Variant::Bool(self.features.compression)),
        ]);
        let payload = encode_legacy_map(&init)?;
        Ok(vec![SessionAction::SendFrame(payload)])
    }

    /// Feed one complete, already-decompressed frame payload. Dispatches on
    /// the current state.
    ///
    /// # Errors
    /// Any codec, handshake, or protocol-sequencing failure.
    #[instrument(skip(self, payload, now))]
    pub fn receive_frame(
        &mut self,
        payload: &[u8],
        now: Instant,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match self.state {
            SessionState::Probing => {
                Err(SessionError::Protocol("frame received before probe completed".into()))
            },
            SessionState::Handshaking => self.handle_handshake_frame(payload),
            SessionState::Established => self.handle_established_frame(payload, now),
        }
    }

    fn handle_handshake_frame(&mut self, payload: &[u8]) -> Result<Vec<SessionAction>, SessionError> {
        let map = decode_legacy_map(payload, &self.registry)?;
        let msg_type = match map.get("MsgType") {
            Some(Variant::String(Some(s))) => s.as_str(),
            _ => return Err(SessionError::Protocol("legacy message missing MsgType".into())),
        };

        match msg_type {
            "ClientInitAck" => {
                let configured = matches!(map.get("Configured"), Some(Variant::Bool(true)));
                if !configured {
                    warn!("core reports it is not yet configured; not sending ClientLogin");
                    return Ok(Vec::new());
                }
                let login = LegacyMap::new(vec![
                    ("MsgType".to_string(), Variant::String(Some("ClientLogin".to_string()))),
                    ("User".to_string(), Variant::String(Some(self.credentials.user.clone()))),
                    ("Password".to_string(), Variant::String(Some(self.credentials.password.clone()))),
                ]);
                let payload = encode_legacy_map(&login)?;
                Ok(vec![SessionAction::SendFrame(payload)])
            },
            "ClientInitReject" => {
                let reason = match map.get("Error") {
                    Some(Variant::String(Some(s))) => s.clone(),
                    _ => "core rejected ClientInit".to_string(),
                };
                Err(SessionError::HandshakeFailed(reason))
            },
            "ClientLoginAck" => {
                // SessionInit follows in its own frame; nothing to send
                // yet.
                Ok(Vec::new())
            },
            "ClientLoginReject" => {
                let reason = match map.get("Error") {
                    Some(Variant::String(Some(s))) => s.clone(),
                    _ => "login rejected".to_string(),
                };
                Err(SessionError::LoginRejected(reason))
            },
            "SessionInit" => {
                self.state = SessionState::Established;
                debug!("session established");
                Ok(Vec::new())
            },
            other => Err(SessionError::Protocol(format!("unexpected legacy message {other}"))),
        }
    }

    fn handle_established_frame(
        &mut self,
        payload: &[u8],
        _now: Instant,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let mut cur = quassel_proto::Cursor::new(payload);
        let mut items = decode_variant_list(&mut cur, &self.registry)?;
        if items.is_empty() {
            return Err(SessionError::Protocol("empty Established-state message".into()));
        }
        let kind_value = items.remove(0);
        let kind_code = match kind_value {
            Variant::Short(v) => v,
            Variant::Int(v) => v as i16,
            other => {
                return Err(SessionError::Protocol(format!(
                    "Established-state message type must be an int, got {other:?}"
                )));
            },
        };
        let kind = MessageType::from_wire(kind_code)?;

        match kind {
            MessageType::HeartBeat => {
                let reply = encode_heartbeat_reply(items, &self.registry)?;
                Ok(vec![SessionAction::SendFrame(reply)])
            },
            MessageType::HeartBeatReply => {
                // Nothing to do: a reply to our own outbound ping confirms
                // the link is alive.
                Ok(Vec::new())
            },
            MessageType::Sync => {
                dispatch_sync(items, self.handlers.as_ref())?;
                Ok(Vec::new())
            },
            MessageType::RpcCall => {
                dispatch_rpc_call(items, self.handlers.as_ref())?;
                Ok(Vec::new())
            },
            MessageType::InitRequest => {
                dispatch_init_request(items, self.handlers.as_ref())?;
                Ok(Vec::new())
            },
            MessageType::InitData => {
                dispatch_init_data(items, self.handlers.as_ref())?;
                Ok(Vec::new())
            },
        }
    }

    /// Build a heartbeat frame if `heartbeat_interval` has elapsed since
    /// the last one, updating the internal timer.
    pub fn maybe_send_heartbeat(&mut self, now: Instant) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != SessionState::Established {
            return Ok(Vec::new());
        }
        let due = match self.last_heartbeat_sent {
            None => true,
            Some(last) => now.duration_since(last) >= self.heartbeat_interval,
        };
        if !due {
            return Ok(Vec::new());
        }
        self.last_heartbeat_sent = Some(now);
        let payload = encode_heartbeat(&self.registry)?;
        Ok(vec![SessionAction::SendFrame(payload)])
    }

    /// Encode an outbound `RpcCall` frame, for caller-initiated calls such
    /// as `sendInput`.
    ///
    /// # Errors
    /// Any codec failure while encoding `args`.
    pub fn encode_rpc_call(&self, function: &str, args: &[Variant]) -> Result<Bytes, SessionError> {
        let mut buf = BytesMut::new();
        let mut list = vec![
            Variant::Short(MessageType::RpcCall.to_wire()),
            Variant::String(Some(function.to_string())),
        ];
        list.extend_from_slice(args);
        encode_message_list(&mut buf, &list)?;
        Ok(buf.freeze())
    }

    /// Encode an outbound `InitRequest` frame, asking the core to send the
    /// full state of one object.
    ///
    /// # Errors
    /// Any codec failure while encoding the frame.
    pub fn encode_init_request(&self, class_name: &str, object_name: &str) -> Result<Bytes, SessionError> {
        let mut buf = BytesMut::new();
        let list = vec![
            Variant::Short(MessageType::InitRequest.to_wire()),
            Variant::String(Some(class_name.to_string())),
            Variant::String(Some(object_name.to_string())),
        ];
        encode_message_list(&mut buf, &list)?;
        Ok(buf.freeze())
    }
}

fn encode_heartbeat(_reg: &Registry) -> Result<Bytes, SessionError> {
    let mut buf = BytesMut::new();
    let list = vec![Variant::Short(MessageType::HeartBeat.to_wire())];
    encode_message_list(&mut buf, &list)?;
    Ok(buf.freeze())
}

fn encode_heartbeat_reply(echo: Vec<Variant>, _reg: &Registry) -> Result<Bytes, SessionError> {
    let mut buf = BytesMut::new();
    let mut list = vec![Variant::Short(MessageType::HeartBeatReply.to_wire())];
    list.extend(echo);
    encode_message_list(&mut buf, &list)?;
    Ok(buf.freeze())
}

fn encode_message_list(buf: &mut BytesMut, items: &[Variant]) -> Result<(), SessionError> {
    quassel_proto::primitive::encode_u32(buf, items.len() as u32);
    for item in items {
        encode_variant(buf, item)?;
    }
    Ok(())
}

fn expect_string(v: Variant, what: &'static str) -> Result<String, SessionError> {
    match v {
        Variant::String(Some(s)) => Ok(s),
        other => Err(SessionError::Protocol(format!("expected {what} to be a string, got {other:?}"))),
    }
}

fn next_field(items: &mut Vec<Variant>, what: &'static str) -> Result<Variant, SessionError> {
    if items.is_empty() {
        return Err(SessionError::Protocol(format!("missing required field {what}")));
    }
    Ok(items.remove(0))
}

fn dispatch_sync(
    mut items: Vec<Variant>,
    handlers: &(dyn crate::handlers::Handlers),
) -> Result<(), SessionError> {
    if items.len() < 3 {
        return Err(SessionError::Protocol("Sync message needs at least 3 fields".into()));
    }
    let class_name = expect_string(next_field(&mut items, "Sync.className")?, "Sync.className")?;
    let object_name = expect_string(next_field(&mut items, "Sync.objectName")?, "Sync.objectName")?;
    let signal = expect_string(next_field(&mut items, "Sync.signal")?, "Sync.signal")?;
    handlers.on_sync(&class_name, &object_name, &signal, &items);
    Ok(())
}

fn dispatch_rpc_call(
    mut items: Vec<Variant>,
    handlers: &(dyn crate::handlers::Handlers),
) -> Result<(), SessionError> {
    if items.is_empty() {
        return Err(SessionError::Protocol("RpcCall message needs a function name".into()));
    }
    let function = expect_string(next_field(&mut items, "RpcCall.function")?, "RpcCall.function")?;
    handlers.on_rpc_call(&function, &items);
    Ok(())
}

fn dispatch_init_request(
    mut items: Vec<Variant>,
    handlers: &(dyn crate::handlers::Handlers),
) -> Result<(), SessionError> {
    if items.len() != 2 {
        return Err(SessionError::Protocol("InitRequest message needs exactly 2 fields".into()));
    }
    let class_name =
        expect_string(next_field(&mut items, "InitRequest.className")?, "InitRequest.className")?;
    let object_name =
        expect_string(next_field(&mut items, "InitRequest.objectName")?, "InitRequest.objectName")?;
    handlers.on_init_request(&class_name, &object_name);
    Ok(())
}

fn dispatch_init_data(
    mut items: Vec<Variant>,
    handlers: &(dyn crate::handlers::Handlers),
) -> Result<(), SessionError> {
    if items.len() < 2 {
        return Err(SessionError::Protocol("InitData message needs at least 2 fields".into()));
    }
    let class_name = expect_string(next_field(&mut items, "InitData.className")?, "InitData.className")?;
    let object_name = expect_string(next_field(&mut items, "InitData.objectName")?, "InitData.objectName")?;

    let properties = match items.into_iter().next() {
        Some(Variant::Map(entries)) => entries,
        Some(other) => {
            warn!(?other, "InitData payload was not a map, dropping properties");
            Vec::new()
        },
        None => Vec::new(),
    };
    handlers.on_init_data(&class_name, &object_name, &properties);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::handlers::{Handlers, NoopHandlers};
    use quassel_proto::registry::standard;

    #[derive(Debug, Clone, PartialEq)]
    struct RecordedSync {
        class_name: String,
        object_name: String,
        signal: String,
        args: Vec<Variant>,
    }

    #[derive(Default)]
    struct RecordingHandlers {
        syncs: Mutex<Vec<RecordedSync>>,
    }

    impl Handlers for RecordingHandlers {
        fn on_sync(&self, class_name: &str, object_name: &str, signal: &str, args: &[Variant]) {
            self.syncs.lock().unwrap().push(RecordedSync {
                class_name: class_name.to_string(),
                object_name: object_name.to_string(),
                signal: signal.to_string(),
                args: args.to_vec(),
            });
        }
    }

    fn new_session() -> Session {
        Session::new(
            standard(),
            Credentials { user: "alice".into(), password: "hunter2".into() },
            Arc::new(NoopHandlers),
        )
    }

    #[test]
    fn start_emits_a_well_formed_probe() {
        let mut session = new_session();
        let actions = session.start(true, true);
        match &actions[..] {
            [SessionAction::SendRaw(bytes)] => {
                assert_eq!(bytes.len(), 8);
                let word1 = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                let word2 = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
                assert_eq!(word1, PROBE_MAGIC | u32::from(FEATURE_TLS | FEATURE_COMPRESSION));
                assert_eq!(word2, u32::from(PROTOCOL_DATASTREAM) | LIST_END);
            },
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn probe_reply_rejecting_datastream_fails() {
        let mut session = new_session();
        session.start(false, false);
        let err = session.receive_probe_reply(&0x0000_0001_u32.to_be_bytes()).unwrap_err();
        assert!(matches!(err, SessionError::HandshakeFailed(_)));
    }

    #[test]
    fn full_handshake_reaches_established() {
        let mut session = new_session();
        session.start(false, false);
        session.receive_probe_reply(&u32::from(PROTOCOL_DATASTREAM).to_be_bytes()).unwrap();
        assert_eq!(session.state(), SessionState::Handshaking);

        let ack = LegacyMap::new(vec![
            ("MsgType".to_string(), Variant::String(Some("ClientInitAck".to_string()))),
            ("Configured".to_string(), Variant::Bool(true)),
        ]);
        let payload = encode_legacy_map(&ack).unwrap();
        session.handle_handshake_frame(&payload).unwrap();

        let login_ack = LegacyMap::new(vec![(
            "MsgType".to_string(),
            Variant::String(Some("ClientLoginAck".to_string())),
        )]);
        let payload = encode_legacy_map(&login_ack).unwrap();
        session.handle_handshake_frame(&payload).unwrap();

        let session_init = LegacyMap::new(vec![(
            "MsgType".to_string(),
            Variant::String(Some("SessionInit".to_string())),
        )]);
        let payload = encode_legacy_map(&session_init).unwrap();
        session.handle_handshake_frame(&payload).unwrap();

        assert_eq!(session.state(), SessionState::Established);
    }

    #[test]
    fn unconfigured_core_gets_no_login_attempt() {
        let mut session = new_session();
        session.start(false, false);
        session.receive_probe_reply(&u32::from(PROTOCOL_DATASTREAM).to_be_bytes()).unwrap();

        let ack = LegacyMap::new(vec![
            ("MsgType".to_string(), Variant::String(Some("ClientInitAck".to_string()))),
            ("Configured".to_string(), Variant::Bool(false)),
        ]);
        let payload = encode_legacy_map(&ack).unwrap();
        let actions = session.handle_handshake_frame(&payload).unwrap();

        assert!(actions.is_empty());
        assert_eq!(session.state(), SessionState::Handshaking);
    }

    #[test]
    fn heartbeat_is_echoed_back() {
        let mut session = new_session();
        session.state = SessionState::Established;

        let mut buf = BytesMut::new();
        let items = vec![Variant::Short(MessageType::HeartBeat.to_wire()), Variant::Bool(true)];
        encode_message_list(&mut buf, &items).unwrap();

        let actions = session.receive_frame(&buf, Instant::now()).unwrap();
        match &actions[..] {
            [SessionAction::SendFrame(payload)] => {
                let mut cur = quassel_proto::Cursor::new(payload);
                let echoed = decode_variant_list(&mut cur, &session.registry).unwrap();
                assert_eq!(echoed[0], Variant::Short(MessageType::HeartBeatReply.to_wire()));
                assert_eq!(echoed[1], Variant::Bool(true));
            },
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn heartbeat_reply_produces_no_actions() {
        let mut session = new_session();
        session.state = SessionState::Established;

        let mut buf = BytesMut::new();
        let items = vec![Variant::Short(MessageType::HeartBeatReply.to_wire())];
        encode_message_list(&mut buf, &items).unwrap();

        let actions = session.receive_frame(&buf, Instant::now()).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn sync_message_dispatches_with_args() {
        let handlers = Arc::new(RecordingHandlers::default());
        let mut session = Session::new(
            standard(),
            Credentials { user: "alice".into(), password: "hunter2".into() },
            handlers.clone(),
        );
        session.state = SessionState::Established;

        let mut buf = BytesMut::new();
        let items = vec![
            Variant::Short(MessageType::Sync.to_wire()),
            Variant::String(Some("Network".to_string())),
            Variant::String(Some("1".to_string())),
            Variant::String(Some("setConnected".to_string())),
            Variant::Bool(true),
        ];
        encode_message_list(&mut buf, &items).unwrap();

        let actions = session.receive_frame(&buf, Instant::now()).unwrap();
        assert!(actions.is_empty());

        let recorded = handlers.syncs.lock().unwrap();
        match &recorded[..] {
            [sync] => {
                assert_eq!(sync.class_name, "Network");
                assert_eq!(sync.object_name, "1");
                assert_eq!(sync.signal, "setConnected");
                assert_eq!(sync.args, vec![Variant::Bool(true)]);
            },
            other => panic!("unexpected recorded syncs: {other:?}"),
        }
    }

    #[test]
    fn frame_before_probe_completes_is_a_protocol_error() {
        let mut session = new_session();
        let err = session.receive_frame(&[], Instant::now()).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }

    #[test]
    fn heartbeat_is_sent_once_interval_elapses() {
        let mut session = new_session();
        session.state = SessionState::Established;
        session.heartbeat_interval = std::time::Duration::from_secs(1);

        let t0 = Instant::now();
        let actions = session.maybe_send_heartbeat(t0).unwrap();
        assert_eq!(actions.len(), 1);

        let too_soon = session.maybe_send_heartbeat(t0).unwrap();
        assert!(too_soon.is_empty());

        let later = t0 + std::time::Duration::from_secs(2);
        let actions = session.maybe_send_heartbeat(later).unwrap();
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn encode_rpc_call_round_trips_through_the_codec() {
        let session = new_session();
        let payload = session.encode_rpc_call("2sendInput(BufferInfo,QString)", &[Variant::Bool(true)]).unwrap();
        let mut cur = quassel_proto::Cursor::new(&payload);
        let items = decode_variant_list(&mut cur, &session.registry).unwrap();
        assert_eq!(items[0], Variant::Short(MessageType::RpcCall.to_wire()));
        assert_eq!(items[1], Variant::String(Some("2sendInput(BufferInfo,QString)".to_string())));
        assert_eq!(items[2], Variant::Bool(true));
    }

    #[test]
    fn encode_init_request_round_trips_through_the_codec() {
        let session = new_session();
        let payload = session.encode_init_request("Network", "1").unwrap();
        let mut cur = quassel_proto::Cursor::new(&payload);
        let items = decode_variant_list(&mut cur, &session.registry).unwrap();
        assert_eq!(items[0], Variant::Short(MessageType::InitRequest.to_wire()));
        assert_eq!(items[1], Variant::String(Some("Network".to_string())));
        assert_eq!(items[2], Variant::String(Some("1".to_string())));
    }
}

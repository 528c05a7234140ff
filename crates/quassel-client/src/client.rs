//! Wires [`quassel_core::Session`] to a real socket: TCP connect, probe,
//! optional TLS upgrade, the framed read/write loop, heartbeat ticking, and
//! an async handle for caller-initiated RPC/init traffic.
//!
//! Grounded on the teacher's `Runtime::run`/`process_cycle` split: a single
//! background task owns the socket and the state machine, driven by
//! `tokio::select!` over "bytes arrived", "caller wants to send something",
//! and "the heartbeat timer fired". The public [`Client`] handle only ever
//! talks to that task over a channel.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use quassel_core::{Credentials, Handlers, Session, SessionAction};
use quassel_proto::{Registry, Variant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, TransportError};
use crate::transport::{self, Transport};

/// A caller-initiated message, sent from [`Client`] to the background
/// connection task.
enum Outbound {
    RpcCall { function: String, args: Vec<Variant>, reply: oneshot::Sender<Result<(), ClientError>> },
    InitRequest { class_name: String, object_name: String, reply: oneshot::Sender<Result<(), ClientError>> },
}

/// A live connection to a Quassel core.
///
/// Dropping this handle closes the connection: the background task's
/// `outbound` channel closes, which ends its `select!` loop on the next
/// iteration.
pub struct Client {
    outbound: mpsc::Sender<Outbound>,
    task: JoinHandle<Result<(), ClientError>>,
}

impl Client {
    /// Connect to the core named in `config`, run the probe/handshake, and
    /// spawn the background connection task. Returns once the session has
    /// reached the Established state.
    ///
    /// # Errors
    /// Any transport failure (DNS/connect/TLS) or session failure (protocol
    /// mismatch, rejected login) encountered before reaching Established.
    #[instrument(skip(registry, handlers), fields(host = %config.host, port = config.port))]
    pub async fn connect(
        config: ClientConfig,
        registry: Registry,
        handlers: Arc<dyn Handlers>,
    ) -> Result<Self, ClientError> {
        let credentials = Credentials { user: config.user.clone(), password: config.password.clone() };
        let mut session = Session::new(registry, credentials, handlers);

        let stream = tokio::time::timeout(
            config.transport.connect_timeout,
            Transport::connect_tcp(&config.host, config.port),
        )
        .await
        .map_err(|_| ClientError::Transport(TransportError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "connect timed out",
        ))))??;
        let mut transport = Transport::Plain(stream);

        // Nothing is compressed until the probe confirms it, so the probe
        // itself and its reply run with no compression stream at all.
        let mut compression: Option<transport::CompressionStream> = None;

        let want_tls = !matches!(config.transport.tls, crate::config::TlsPolicy::Plain);
        for action in session.start(want_tls, config.transport.advertise_compression) {
            run_frame_action(&mut transport, &mut compression, action).await?;
        }

        let reply = read_exact(&mut transport, 4).await?;
        let probe_actions = session.receive_probe_reply(&reply)?;

        // The compression bit, once negotiated, applies to every frame from
        // here on, including the ClientInit frame in `probe_actions`.
        if session.features().compression {
            compression = Some(transport::CompressionStream::new());
        }

        if session.features().tls {
            let Transport::Plain(stream) = transport else {
                return Err(ClientError::Transport(TransportError::Tls(
                    "TLS negotiated but transport was already upgraded".to_string(),
                )));
            };
            transport = Transport::upgrade_tls(stream, &config.host, &config.transport.tls).await?;
            debug!("upgraded connection to TLS");
        }

        for action in probe_actions {
            run_frame_action(&mut transport, &mut compression, action).await?;
        }

        let mut framer = quassel_proto::Framer::new();

        // Drive the handshake to Established before handing control to the
        // background loop, so `connect` only returns once the caller has a
        // usable session.
        loop {
            if session.state() == quassel_core::SessionState::Established {
                break;
            }
            let frame = next_frame(&mut transport, &mut framer, &mut compression).await?;
            let actions = session.receive_frame(&frame, tokio::time::Instant::now().into_std())?;
            for action in actions {
                run_frame_action(&mut transport, &mut compression, action).await?;
            }
        }
        debug!("session established");

        let (outbound_tx, outbound_rx) = mpsc::channel(32);
        let task = tokio::spawn(run_connection(session, transport, framer, compression, outbound_rx));

        Ok(Self { outbound: outbound_tx, task })
    }

    /// Send an RPC call to the core (e.g. `sendInput`).
    ///
    /// # Errors
    /// [`ClientError::Disconnected`] if the connection task has already
    /// ended; otherwise propagates whatever ended it.
    pub async fn send_rpc_call(
        &self,
        function: impl Into<String>,
        args: Vec<Variant>,
    ) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        let msg = Outbound::RpcCall { function: function.into(), args, reply };
        self.outbound.send(msg).await.map_err(|_| ClientError::Disconnected)?;
        rx.await.map_err(|_| ClientError::Disconnected)?
    }

    /// Ask the core to send the full state of one syncable object.
    ///
    /// # Errors
    /// [`ClientError::Disconnected`] if the connection task has already
    /// ended; otherwise propagates whatever ended it.
    pub async fn request_init(
        &self,
        class_name: impl Into<String>,
        object_name: impl Into<String>,
    ) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        let msg = Outbound::InitRequest { class_name: class_name.into(), object_name: object_name.into(), reply };
        self.outbound.send(msg).await.map_err(|_| ClientError::Disconnected)?;
        rx.await.map_err(|_| ClientError::Disconnected)?
    }

    /// Wait for the background connection task to end, e.g. after the core
    /// closes the socket.
    ///
    /// # Errors
    /// Whatever ended the connection (transport or session failure); never
    /// the joined `JoinError` itself, which can only happen if the task
    /// panicked, which this implementation never does.
    pub async fn join(self) -> Result<(), ClientError> {
        drop(self.outbound);
        self.task.await.unwrap_or(Err(ClientError::Disconnected))
    }
}

#[instrument(skip_all)]
async fn run_connection(
    mut session: Session,
    mut transport: Transport,
    mut framer: quassel_proto::Framer,
    mut compression: Option<transport::CompressionStream>,
    mut outbound: mpsc::Receiver<Outbound>,
) -> Result<(), ClientError> {
    let mut heartbeat_tick = tokio::time::interval(Duration::from_secs(10));
    heartbeat_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut read_buf = [0_u8; 8192];

    loop {
        tokio::select! {
            read = transport.read(&mut read_buf) => {
                let n = read?;
                if n == 0 {
                    return Err(ClientError::Transport(TransportError::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "core closed the connection",
                    ))));
                }
                feed_framer(&mut framer, &mut compression, &read_buf[..n])?;
                while let Some(payload) = framer.next_frame().map_err(quassel_core::SessionError::from)? {
                    let actions = session.receive_frame(&payload, tokio::time::Instant::now().into_std())?;
                    if run_actions(&mut transport, &mut compression, actions).await? {
                        return Ok(());
                    }
                }
            }
            _ = heartbeat_tick.tick() => {
                let actions = session.maybe_send_heartbeat(tokio::time::Instant::now().into_std())?;
                if run_actions(&mut transport, &mut compression, actions).await? {
                    return Ok(());
                }
            }
            cmd = outbound.recv() => {
                let Some(cmd) = cmd else {
                    return Ok(());
                };
                let (payload, reply) = match cmd {
                    Outbound::RpcCall { function, args, reply } => {
                        (session.encode_rpc_call(&function, &args), reply)
                    },
                    Outbound::InitRequest { class_name, object_name, reply } => {
                        (session.encode_init_request(&class_name, &object_name), reply)
                    },
                };
                let result: Result<(), ClientError> = async {
                    let payload = payload.map_err(ClientError::from)?;
                    write_frame(&mut transport, &mut compression, &payload).await.map_err(ClientError::from)
                }.await;
                let _ = reply.send(result);
            }
        }
    }
}

/// Runs `actions`, returning `Ok(true)` if a [`SessionAction::Close`] ended
/// the connection.
async fn run_actions(
    transport: &mut Transport,
    compression: &mut Option<transport::CompressionStream>,
    actions: Vec<SessionAction>,
) -> Result<bool, ClientError> {
    for action in actions {
        match action {
            SessionAction::SendRaw(bytes) => transport.write_all(&bytes).await?,
            SessionAction::SendFrame(payload) => write_frame(transport, compression, &payload).await?,
            SessionAction::Close(reason) => {
                warn!(reason, "session closed the connection");
                return Ok(true);
            },
        }
    }
    Ok(false)
}

async fn run_frame_action(
    transport: &mut Transport,
    compression: &mut Option<transport::CompressionStream>,
    action: SessionAction,
) -> Result<(), ClientError> {
    match action {
        SessionAction::SendRaw(bytes) => transport.write_all(&bytes).await?,
        SessionAction::SendFrame(payload) => write_frame(transport, compression, &payload).await?,
        SessionAction::Close(reason) => {
            return Err(ClientError::Session(quassel_core::SessionError::HandshakeFailed(reason)));
        },
    }
    Ok(())
}

/// Frame `payload` (length prefix then bytes), then — if compression was
/// negotiated — run the *entire* framed buffer through the continuous
/// deflate stream with a partial flush, per message. The length prefix
/// itself ends up inside the compressed stream, matching a real core's
/// continuous inflate on the other end.
async fn write_frame(
    transport: &mut Transport,
    compression: &mut Option<transport::CompressionStream>,
    payload: &[u8],
) -> Result<(), TransportError> {
    let mut framed = BytesMut::with_capacity(payload.len() + 4);
    quassel_proto::Framer::encode_frame(&mut framed, payload);
    let out = match compression {
        Some(stream) => stream.compress(&framed)?,
        None => framed.freeze(),
    };
    transport.write_all(&out).await
}

/// Feed bytes freshly read off the wire into `framer`, running them through
/// the continuous inflate stream first when compression is negotiated. The
/// length prefix lives inside the compressed stream, so decompression must
/// happen before the framer ever sees these bytes.
fn feed_framer(
    framer: &mut quassel_proto::Framer,
    compression: &mut Option<transport::CompressionStream>,
    chunk: &[u8],
) -> Result<(), ClientError> {
    match compression {
        Some(stream) => framer.feed(&stream.decompress(chunk).map_err(TransportError::Io)?),
        None => framer.feed(chunk),
    }
    Ok(())
}

async fn next_frame(
    transport: &mut Transport,
    framer: &mut quassel_proto::Framer,
    compression: &mut Option<transport::CompressionStream>,
) -> Result<bytes::Bytes, ClientError> {
    loop {
        if let Some(payload) = framer.next_frame().map_err(quassel_core::SessionError::from)? {
            return Ok(payload);
        }
        let mut buf = [0_u8; 8192];
        let n = transport.read(&mut buf).await?;
        if n == 0 {
            return Err(ClientError::Transport(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "core closed the connection during handshake",
            ))));
        }
        feed_framer(framer, compression, &buf[..n])?;
    }
}

async fn read_exact(transport: &mut Transport, n: usize) -> Result<Vec<u8>, TransportError> {
    let mut out = vec![0_u8; n];
    let mut filled = 0;
    while filled < n {
        let read = transport.read(&mut out[filled..]).await?;
        if read == 0 {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "core closed the connection during probe",
            )));
        }
        filled += read;
    }
    Ok(out)
}

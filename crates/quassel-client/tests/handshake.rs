//! End-to-end probe/handshake/heartbeat test against a real TCP socket,
//! grounded on the teacher's `transport_integration_test.rs` pattern: a
//! minimal in-process fake core plays the other side of the wire.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use quassel_client::{Client, ClientConfig};
use quassel_core::handshake::{decode_legacy_map, encode_legacy_map, LegacyMap};
use quassel_core::Handlers;
use quassel_proto::message::MessageType;
use quassel_proto::variant::{decode_variant_list, encode_variant};
use quassel_proto::{registry, Framer, Variant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn read_frame(socket: &mut TcpStream, framer: &mut Framer) -> Bytes {
    loop {
        if let Some(frame) = framer.next_frame().unwrap() {
            return frame;
        }
        let mut buf = [0_u8; 4096];
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "peer closed before sending a full frame");
        framer.feed(&buf[..n]);
    }
}

async fn write_frame(socket: &mut TcpStream, payload: &[u8]) {
    let mut dst = BytesMut::new();
    Framer::encode_frame(&mut dst, payload);
    socket.write_all(&dst).await.unwrap();
}

fn encode_message_list(items: &[Variant]) -> Bytes {
    let mut buf = BytesMut::new();
    quassel_proto::primitive::encode_u32(&mut buf, items.len() as u32);
    for item in items {
        encode_variant(&mut buf, item).unwrap();
    }
    buf.freeze()
}

/// Plays a fake Quassel core through one full handshake, then sends a
/// heartbeat and asserts it gets echoed back.
async fn run_fake_core(listener: TcpListener) {
    let (mut socket, _) = listener.accept().await.unwrap();

    let mut probe = [0_u8; 8];
    socket.read_exact(&mut probe).await.unwrap();
    let word1 = u32::from_be_bytes([probe[0], probe[1], probe[2], probe[3]]);
    let word2 = u32::from_be_bytes([probe[4], probe[5], probe[6], probe[7]]);
    assert_eq!(word1 & 0xffff_ff00, 0x42b3_3f00);
    assert_eq!(word2 & 0xff, 0x02);

    // No TLS, no compression: keep the fake core's wire handling simple.
    socket.write_all(&0x0000_0002_u32.to_be_bytes()).await.unwrap();

    let mut framer = Framer::new();
    let reg = registry::standard();

    let init = decode_legacy_map(&read_frame(&mut socket, &mut framer).await, &reg).unwrap();
    assert_eq!(init.get("MsgType"), Some(&Variant::String(Some("ClientInit".to_string()))));

    let ack = LegacyMap::new(vec![
        ("MsgType".to_string(), Variant::String(Some("ClientInitAck".to_string()))),
        ("Configured".to_string(), Variant::Bool(true)),
    ]);
    write_frame(&mut socket, &encode_legacy_map(&ack).unwrap()).await;

    let login = decode_legacy_map(&read_frame(&mut socket, &mut framer).await, &reg).unwrap();
    assert_eq!(login.get("MsgType"), Some(&Variant::String(Some("ClientLogin".to_string()))));
    assert_eq!(login.get("User"), Some(&Variant::String(Some("alice".to_string()))));

    let login_ack = LegacyMap::new(vec![(
        "MsgType".to_string(),
        Variant::String(Some("ClientLoginAck".to_string())),
    )]);
    write_frame(&mut socket, &encode_legacy_map(&login_ack).unwrap()).await;

    let session_init = LegacyMap::new(vec![(
        "MsgType".to_string(),
        Variant::String(Some("SessionInit".to_string())),
    )]);
    write_frame(&mut socket, &encode_legacy_map(&session_init).unwrap()).await;

    // Send a SYNC message the handlers should observe.
    let sync = encode_message_list(&[
        Variant::Short(MessageType::Sync.to_wire()),
        Variant::String(Some("Network".to_string())),
        Variant::String(Some("1".to_string())),
        Variant::String(Some("setConnected".to_string())),
        Variant::Bool(true),
    ]);
    write_frame(&mut socket, &sync).await;

    // Heartbeat round trip.
    let ping = encode_message_list(&[Variant::Short(MessageType::HeartBeat.to_wire())]);
    write_frame(&mut socket, &ping).await;

    let pong = read_frame(&mut socket, &mut framer).await;
    let mut cur = quassel_proto::Cursor::new(&pong);
    let items = decode_variant_list(&mut cur, &reg).unwrap();
    assert_eq!(items[0], Variant::Short(MessageType::HeartBeatReply.to_wire()));

    // And an RPC call the client initiates.
    let rpc = decode_variant_list(
        &mut quassel_proto::Cursor::new(&read_frame(&mut socket, &mut framer).await),
        &reg,
    )
    .unwrap();
    assert_eq!(rpc[0], Variant::Short(MessageType::RpcCall.to_wire()));
    assert_eq!(rpc[1], Variant::String(Some("2sendInput(BufferInfo,QString)".to_string())));
}

#[derive(Default)]
struct FlagHandlers {
    saw_sync: AtomicBool,
}

impl Handlers for FlagHandlers {
    fn on_sync(&self, class_name: &str, object_name: &str, signal: &str, _args: &[Variant]) {
        assert_eq!(class_name, "Network");
        assert_eq!(object_name, "1");
        assert_eq!(signal, "setConnected");
        self.saw_sync.store(true, Ordering::SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn full_handshake_and_heartbeat_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(run_fake_core(listener));

    let mut config = ClientConfig::new(addr.ip().to_string(), addr.port(), "alice", "hunter2");
    config.transport = quassel_client::TransportConfig::development();

    let handlers = Arc::new(FlagHandlers::default());
    let client = tokio::time::timeout(
        Duration::from_secs(5),
        Client::connect(config, registry::standard(), handlers.clone()),
    )
    .await
    .expect("connect timed out")
    .expect("handshake failed");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(handlers.saw_sync.load(Ordering::SeqCst));

    client
        .send_rpc_call("2sendInput(BufferInfo,QString)", vec![Variant::Bool(true)])
        .await
        .expect("rpc call failed");

    tokio::time::timeout(Duration::from_secs(5), server).await.expect("server task timed out").unwrap();
}

#[tokio::test]
async fn connect_fails_when_nothing_is_listening() {
    let config = ClientConfig::new("127.0.0.1", 1, "alice", "hunter2");
    let err = Client::connect(config, registry::standard(), Arc::new(quassel_client::NoopHandlers))
        .await
        .unwrap_err();
    assert!(matches!(err, quassel_client::ClientError::Transport(_)));
}

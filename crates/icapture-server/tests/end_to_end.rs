//! Loopback tests against a running server.

use std::sync::Arc;
use std::time::Duration;

use icapture_server::response::{NO_CONTENT_RESPONSE, OPTIONS_RESPONSE};
use icapture_server::{IcapServer, ServerConfig, ServerHandle};
use icapture_storage::{FileSink, MemorySink, PayloadSink};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const OPTIONS_REQUEST: &[u8] = b"OPTIONS icap://127.0.0.1:1344/reqmod ICAP/1.0\r\n\
Host: 127.0.0.1:1344\r\n\
Encapsulated: null-body=0\r\n\r\n";

fn reqmod(content_type: &str, referer: &str, body: &str) -> Vec<u8> {
    let header = format!(
        "POST /login HTTP/1.1\r\nHost: site\r\nContent-Type: {}\r\nReferer: {}\r\nContent-Length: {}\r\n\r\n",
        content_type,
        referer,
        body.len()
    );
    format!(
        "REQMOD icap://127.0.0.1:1344/reqmod ICAP/1.0\r\n\
Host: 127.0.0.1:1344\r\n\
Encapsulated: req-hdr=0, req-body={}\r\n\r\n\
{}{:x}\r\n{}\r\n0\r\n\r\n",
        header.len(),
        header,
        body.len(),
        body
    )
    .into_bytes()
}

fn start(config: ServerConfig, sink: Arc<dyn PayloadSink>) -> ServerHandle {
    let config = config.with_host("127.0.0.1").with_port(0);
    IcapServer::with_sink(config, sink).unwrap().start().unwrap()
}

async fn exchange(handle: &ServerHandle, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(handle.addr()).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    reply
}

#[tokio::test]
async fn options_over_tcp() {
    let handle = start(ServerConfig::default(), Arc::new(MemorySink::new()));

    let reply = exchange(&handle, OPTIONS_REQUEST).await;
    assert_eq!(reply, OPTIONS_RESPONSE);

    handle.stop().await;
}

#[tokio::test]
async fn json_login_lands_in_payload_log() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("payload.log");
    let sink = Arc::new(FileSink::with_path(&path).unwrap());
    let handle = start(ServerConfig::default(), sink);

    let request = reqmod("application/json", "https://site/login", r#"{"password":"abc123"}"#);
    let reply = exchange(&handle, &request).await;
    assert_eq!(reply, NO_CONTENT_RESPONSE);

    let log = std::fs::read_to_string(&path).unwrap();
    assert!(log.starts_with('['));
    assert!(log.contains("1. TargetURL: https://site/login\n"));
    assert!(log.contains("\"password\": \"abc123\""));

    handle.stop().await;
}

#[tokio::test]
async fn unremarkable_post_is_answered_but_not_logged() {
    let sink = Arc::new(MemorySink::new());
    let handle = start(ServerConfig::default(), sink.clone());

    let request = reqmod("application/json", "https://site/search", r#"{"q":"shoes"}"#);
    let reply = exchange(&handle, &request).await;
    assert_eq!(reply, NO_CONTENT_RESPONSE);
    assert!(sink.is_empty());

    handle.stop().await;
}

#[tokio::test]
async fn concurrent_clients_each_get_one_entry() {
    let sink = Arc::new(MemorySink::new());
    let handle = Arc::new(start(ServerConfig::default(), sink.clone()));

    let mut tasks = Vec::new();
    for i in 0..20 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            let body = format!("user=u{}&password=p{}", i, i);
            let request = reqmod("application/x-www-form-urlencoded", "https://site/signin", &body);
            exchange(&handle, &request).await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), NO_CONTENT_RESPONSE);
    }

    let entries = sink.entries();
    assert_eq!(entries.len(), 20);
    assert!(entries.iter().all(|e| e.target_url == "https://site/signin"));
}

#[tokio::test]
async fn connection_ceiling_defers_extra_clients() {
    let config = ServerConfig::default().with_max_connections(Some(1));
    let handle = start(config, Arc::new(MemorySink::new()));

    // Occupies the only slot without ever completing a message
    let mut idle = TcpStream::connect(handle.addr()).await.unwrap();
    idle.write_all(b"REQMOD icap://x ICAP/1.0\r\n").await.unwrap();

    let mut waiting = TcpStream::connect(handle.addr()).await.unwrap();
    waiting.write_all(OPTIONS_REQUEST).await.unwrap();
    let mut reply = Vec::new();
    let early = tokio::time::timeout(Duration::from_millis(200), waiting.read_to_end(&mut reply)).await;
    assert!(early.is_err(), "second client was served while the slot was taken");

    drop(idle);
    tokio::time::timeout(Duration::from_secs(5), waiting.read_to_end(&mut reply))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply, OPTIONS_RESPONSE);

    handle.shutdown();
}

#[tokio::test]
async fn stopped_server_refuses_connections() {
    let handle = start(ServerConfig::default(), Arc::new(MemorySink::new()));
    let addr = handle.addr();
    handle.stop().await;

    assert!(TcpStream::connect(addr).await.is_err());
}

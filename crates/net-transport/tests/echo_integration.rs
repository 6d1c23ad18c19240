//! End-to-end tests: real TCP listener, `serve` and `dial`.

use std::net::SocketAddr;
use std::time::Duration;

use net_transport::{SecureConfig, SessionState, TransportError, dial, serve};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

async fn start_server(config: SecureConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, config));
    addr
}

#[tokio::test]
async fn test_hello_roundtrip() {
    let addr = start_server(SecureConfig::default()).await;

    let mut conn = dial(addr, SecureConfig::default()).await.unwrap();
    assert_eq!(conn.state(), SessionState::Secure);
    assert_eq!(conn.peer_addr(), Some(addr));

    let written = conn.write(b"hello").await.unwrap();
    assert_eq!(written, 8 + 24 + 5 + 16);

    let mut buf = [0u8; 5];
    let n = conn.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"hello");

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_many_messages_one_connection() {
    let addr = start_server(SecureConfig::default()).await;
    let mut conn = dial(addr, SecureConfig::default()).await.unwrap();

    for i in 0..50 {
        let message = format!("Message {}", i);
        conn.write(message.as_bytes()).await.unwrap();
        assert_eq!(conn.read_message().await.unwrap(), message.as_bytes());
    }
}

#[tokio::test]
async fn test_concurrent_clients() {
    let addr = start_server(SecureConfig::default()).await;

    let mut tasks = Vec::new();
    for i in 0..8 {
        tasks.push(tokio::spawn(async move {
            let mut conn = dial(addr, SecureConfig::default()).await.unwrap();
            let message = vec![i as u8; 1000 + i];
            conn.write(&message).await.unwrap();
            assert_eq!(conn.read_message().await.unwrap(), message);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn test_stalled_client_does_not_block_others() {
    let addr = start_server(SecureConfig::default()).await;

    // Connects but never sends its public key
    let _stalled = TcpStream::connect(addr).await.unwrap();

    let mut conn = tokio::time::timeout(Duration::from_secs(5), dial(addr, SecureConfig::default()))
        .await
        .unwrap()
        .unwrap();
    conn.write(b"still served").await.unwrap();
    assert_eq!(conn.read_message().await.unwrap(), b"still served");
}

#[tokio::test]
async fn test_bad_client_does_not_stop_server() {
    let addr = start_server(SecureConfig::default()).await;

    // Half a public key, then hang up
    let mut broken = TcpStream::connect(addr).await.unwrap();
    broken.write_all(&[1u8; 16]).await.unwrap();
    drop(broken);

    let mut conn = dial(addr, SecureConfig::default()).await.unwrap();
    conn.write(b"hello").await.unwrap();
    assert_eq!(conn.read_message().await.unwrap(), b"hello");
}

#[tokio::test]
async fn test_size_boundary() {
    let config = SecureConfig::with_max_message_size(3072);
    let addr = start_server(config.clone()).await;
    let mut conn = dial(addr, config).await.unwrap();

    let max = vec![0x5A; 3072];
    conn.write(&max).await.unwrap();
    assert_eq!(conn.read_message().await.unwrap(), max);

    let err = conn.write(&[0u8; 3073]).await.unwrap_err();
    assert!(matches!(err, TransportError::MessageTooLarge { .. }));
    assert_eq!(err.bytes_written(), 0);

    // Connection is still usable after a rejected write
    conn.write(b"after").await.unwrap();
    assert_eq!(conn.read_message().await.unwrap(), b"after");
}

#[tokio::test]
async fn test_server_rejects_oversized_peer_frames() {
    // Server accepts less than the client is willing to send
    let addr = start_server(SecureConfig::with_max_message_size(64)).await;
    let mut conn = dial(addr, SecureConfig::default()).await.unwrap();

    conn.write(&[1u8; 65]).await.unwrap();

    // Server drops the connection instead of echoing
    let result = conn.read_message().await;
    assert!(result.is_err(), "oversized frame was echoed");
}

#[tokio::test]
async fn test_dial_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = dial(addr, SecureConfig::default()).await;
    assert!(matches!(result, Err(TransportError::Io(_))));
}

//! Shared utilities for integration tests.

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use latency_proxy::config::ProxyConfig;
use latency_proxy::health::Dialer;
use latency_proxy::lifecycle::{Proxy, Shutdown};

/// Start a backend that answers every request with `name` followed by the
/// request line it received, e.g. `b1 GET /path?q=1`.
pub async fn start_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(respond(socket, name));
        }
    });

    addr
}

async fn respond(mut socket: TcpStream, name: &'static str) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let body = format!(
        "{} {} {}",
        name,
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default()
    );

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// A loopback port that refuses connections.
///
/// The socket is bound but never listens, so the port cannot be handed to
/// another socket while this value is alive.
pub struct ClosedPort {
    pub addr: SocketAddr,
    _socket: TcpSocket,
}

impl ClosedPort {
    pub fn reserve() -> Self {
        let socket = TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = socket.local_addr().unwrap();
        Self { addr, _socket: socket }
    }
}

/// Proxy config pointing at the given backends and fallback.
pub fn config(backends: &[SocketAddr], fallback: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.backends = backends.iter().map(ToString::to_string).collect();
    config.fallback = fallback.to_string();
    config.health_check.dial_timeout = Duration::from_millis(500);
    config.timeouts.request = Duration::from_secs(5);
    config
}

/// Start `proxy` on an ephemeral port.
///
/// The listener is bound before returning, so requests sent right away queue
/// until the first probe cycle has finished and serving begins.
pub async fn spawn_proxy(proxy: Proxy, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = shutdown.clone();

    tokio::spawn(async move {
        let _ = proxy.serve(listener, shutdown).await;
    });

    addr
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Dialer answering from a table; addresses missing from it are refused.
#[derive(Default)]
pub struct ScriptedDialer {
    latencies: Mutex<HashMap<String, Duration>>,
}

impl ScriptedDialer {
    pub fn set(&self, addr: SocketAddr, latency: Option<Duration>) {
        let mut table = self.latencies.lock().unwrap();
        match latency {
            Some(d) => {
                table.insert(addr.to_string(), d);
            }
            None => {
                table.remove(&addr.to_string());
            }
        }
    }
}

impl Dialer for ScriptedDialer {
    fn dial<'a>(&'a self, address: &'a str, _timeout: Duration) -> BoxFuture<'a, io::Result<Duration>> {
        let result = match self.latencies.lock().unwrap().get(address) {
            Some(d) => Ok(*d),
            None => Err(io::Error::from(io::ErrorKind::ConnectionRefused)),
        };
        Box::pin(async move { result })
    }
}

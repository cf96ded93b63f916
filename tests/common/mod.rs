//! Test helpers: an in-process fake Redis and an app server bound to an
//! ephemeral port.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};

use redis_healthz::cache::CacheClient;
use redis_healthz::config::Config;
use redis_healthz::http::{bind, serve};
use redis_healthz::routes::create_router;
use redis_healthz::state::AppState;

/// How the fake answers PING
#[derive(Clone, Copy, Debug)]
pub enum PingBehavior {
    Pong,
    Error(&'static str),
}

/// Minimal RESP server: PING gets the configured reply, every other command
/// (CLIENT SETINFO, SELECT, AUTH) gets `+OK`. Every command received is
/// recorded as its space-joined arguments.
pub struct FakeRedis {
    pub port: u16,
    commands: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    accept: JoinHandle<()>,
}

impl FakeRedis {
    pub async fn start(behavior: PingBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let accept = {
            let commands = commands.clone();
            let connections = connections.clone();
            tokio::spawn(async move {
                let mut open = JoinSet::new();
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    open.spawn(handle_connection(stream, behavior, commands.clone()));
                }
            })
        };

        Self {
            port,
            commands,
            connections,
            accept,
        }
    }

    /// Commands received so far, in arrival order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Number of TCP connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Stop accepting and drop every open connection.
    pub async fn stop(self) {
        self.accept.abort();
        let _ = self.accept.await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    behavior: PingBehavior,
    commands: Arc<Mutex<Vec<String>>>,
) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    while let Some(args) = read_command(&mut reader).await {
        commands.lock().unwrap().push(args.join(" "));
        let reply = match args.first().map(|cmd| cmd.to_ascii_uppercase()) {
            Some(cmd) if cmd == "PING" => match behavior {
                PingBehavior::Pong => "+PONG\r\n".to_string(),
                PingBehavior::Error(message) => format!("-{message}\r\n"),
            },
            _ => "+OK\r\n".to_string(),
        };
        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

async fn read_command<R>(reader: &mut BufReader<R>) -> Option<Vec<String>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;

        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Some(args)
}

/// Listener that accepts connections and never writes a byte back.
pub struct SilentRedis {
    pub port: u16,
    accept: JoinHandle<()>,
}

impl SilentRedis {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let accept = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        Self { port, accept }
    }
}

impl Drop for SilentRedis {
    fn drop(&mut self) {
        self.accept.abort();
    }
}

/// Port nothing is listening on.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Serve the real router against Redis on `redis_port`; returns the base URL.
pub async fn spawn_app(redis_port: u16) -> String {
    spawn_app_with(redis_port, "  timeout_seconds: 2\n").await
}

/// Like [`spawn_app`], with extra indented lines for the `redis:` section.
pub async fn spawn_app_with(redis_port: u16, redis_extra: &str) -> String {
    let config = Config::from_yaml(&format!(
        "redis:\n  host: \"127.0.0.1\"\n  port: \"{redis_port}\"\n{redis_extra}server:\n  bind: \"127.0.0.1\"\n  port: \"0\"\n"
    ))
    .unwrap();

    let cache = CacheClient::connect(&config.redis).unwrap();
    let listener = bind(&config.server).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = create_router(AppState::new(config, Arc::new(cache)));
    tokio::spawn(serve(listener, app));

    format!("http://{addr}")
}

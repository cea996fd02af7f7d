//! Minimal RESP2 server for exercising [`super::RedisQueue`] without Redis.
//!
//! Understands the handful of commands the queue and fred's connection setup
//! send. Each connection handles its commands in order, so a BRPOP blocks
//! its own connection the way real Redis does.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Store {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    strings: Mutex<HashMap<String, (String, Option<i64>)>>,
    pushed: Notify,
    fail_lpush: AtomicBool,
}

impl Store {
    fn rpop(&self, key: &str) -> Option<String> {
        self.lists.lock().unwrap().get_mut(key)?.pop_back()
    }
}

/// A running stub bound to a random local port.
pub struct RespStub {
    addr: SocketAddr,
    store: Arc<Store>,
    task: JoinHandle<()>,
}

impl RespStub {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(Store::default());

        let task = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve(stream, Arc::clone(&store)));
                }
            })
        };

        Self { addr, store, task }
    }

    pub fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }

    /// TTL in seconds recorded by the last SET of `key`.
    pub fn ttl(&self, key: &str) -> Option<i64> {
        self.store
            .strings
            .lock()
            .unwrap()
            .get(key)
            .and_then(|(_, ttl)| *ttl)
    }

    /// Make every LPUSH answer with an error.
    pub fn fail_lpush(&self, fail: bool) {
        self.store.fail_lpush.store(fail, Ordering::SeqCst);
    }
}

impl Drop for RespStub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, store: Arc<Store>) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    while let Ok(Some(args)) = read_command(&mut reader).await {
        let reply = execute(&store, &args).await;
        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
        if args.first().is_some_and(|c| c.eq_ignore_ascii_case("QUIT")) {
            return;
        }
    }
}

async fn read_command<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<Option<Vec<String>>> {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    let count = header(&line, '*')?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await?;
        let len = header(&line, '$')?;
        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).await?;
        buf.truncate(len);
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(Some(args))
}

fn header(line: &str, prefix: char) -> std::io::Result<usize> {
    line.trim_end()
        .strip_prefix(prefix)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, line.to_owned()))
}

fn bulk(value: &str) -> String {
    format!("${}\r\n{value}\r\n", value.len())
}

async fn execute(store: &Store, args: &[String]) -> String {
    let command = args.first().map(|c| c.to_ascii_uppercase()).unwrap_or_default();

    match (command.as_str(), &args[1.min(args.len())..]) {
        ("PING", _) => "+PONG\r\n".to_owned(),
        ("INFO", _) => bulk("# Server\r\nredis_version:7.2.0"),
        ("CLIENT", [sub, ..]) if sub.eq_ignore_ascii_case("ID") => ":1\r\n".to_owned(),
        ("LPUSH", [key, values @ ..]) => {
            if store.fail_lpush.load(Ordering::SeqCst) {
                return "-ERR injected failure\r\n".to_owned();
            }
            let len = {
                let mut lists = store.lists.lock().unwrap();
                let list = lists.entry(key.clone()).or_default();
                for value in values {
                    list.push_front(value.clone());
                }
                list.len()
            };
            store.pushed.notify_waiters();
            format!(":{len}\r\n")
        }
        ("BRPOP", [key, timeout]) => {
            let wait = Duration::from_secs_f64(timeout.parse().unwrap_or(0.0));
            let deadline = tokio::time::Instant::now() + wait;
            loop {
                let pushed = store.pushed.notified();
                tokio::pin!(pushed);
                pushed.as_mut().enable();

                if let Some(value) = store.rpop(key) {
                    return format!("*2\r\n{}{}", bulk(key), bulk(&value));
                }
                if tokio::time::timeout_at(deadline, pushed).await.is_err() {
                    return "*-1\r\n".to_owned();
                }
            }
        }
        ("SET", [key, value, options @ ..]) => {
            let ttl = options
                .windows(2)
                .find(|w| w[0].eq_ignore_ascii_case("EX"))
                .and_then(|w| w[1].parse().ok());
            store
                .strings
                .lock()
                .unwrap()
                .insert(key.clone(), (value.clone(), ttl));
            "+OK\r\n".to_owned()
        }
        ("GET", [key]) => store
            .strings
            .lock()
            .unwrap()
            .get(key)
            .map_or_else(|| "$-1\r\n".to_owned(), |(value, _)| bulk(value)),
        ("DEL", keys) => {
            let mut strings = store.strings.lock().unwrap();
            let removed = keys.iter().filter(|k| strings.remove(*k).is_some()).count();
            format!(":{removed}\r\n")
        }
        _ => "+OK\r\n".to_owned(),
    }
}

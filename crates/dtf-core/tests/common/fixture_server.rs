//! Minimal HTTP/1.1 server serving a fixed set of files for integration tests.
//!
//! GET of a known path returns 200 with the body; anything else is 404.
//! Every GET is counted so tests can assert how often the network was hit.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub struct FixtureServer {
    /// Base URL ending in `/data/`.
    pub base_url: String,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    hits: Arc<AtomicUsize>,
}

impl FixtureServer {
    /// Number of GET requests served so far (including 404s).
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Replace or add the body served at `/data/<name>`.
    pub fn set(&self, name: &str, body: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), body.to_vec());
    }
}

/// Starts a server in a background thread serving `files` under `/data/`.
/// The server runs until the process exits.
pub fn start(files: &[(&str, &[u8])]) -> FixtureServer {
    start_with_delay(files, Duration::ZERO)
}

/// Like `start` but sleeps before answering each request, widening race windows.
pub fn start_with_delay(files: &[(&str, &[u8])], delay: Duration) -> FixtureServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let files: Arc<Mutex<HashMap<String, Vec<u8>>>> = Arc::new(Mutex::new(
        files
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect(),
    ));
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let files = Arc::clone(&files);
        let hits = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let files = Arc::clone(&files);
                let hits = Arc::clone(&hits);
                thread::spawn(move || handle(stream, &files, &hits, delay));
            }
        });
    }
    FixtureServer {
        base_url: format!("http://127.0.0.1:{}/data/", port),
        files,
        hits,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    files: &Mutex<HashMap<String, Vec<u8>>>,
    hits: &AtomicUsize,
    delay: Duration,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("");
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    hits.fetch_add(1, Ordering::SeqCst);
    if !delay.is_zero() {
        thread::sleep(delay);
    }

    let body = target
        .strip_prefix("/data/")
        .and_then(|name| files.lock().unwrap().get(name).cloned());
    match body {
        Some(body) => {
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(&body);
        }
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    }
}

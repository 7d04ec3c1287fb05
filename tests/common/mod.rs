//! Shared test infrastructure.
//!
//! # Fetcher
//! - `ScriptedFetcher` - serves canned documents per URL, optionally after a
//!   delay, and records when each fetch starts and ends.
//!
//! # HTTP
//! - `MockServer` - a plain HTTP/1.1 server on a local port, answering fixed
//!   routes and recording the raw requests it received.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use udpipe_web::errors::AppError;
use udpipe_web::fetch::Fetcher;
use udpipe_web::form::{Control, Form};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const CATALOG_URL: &str = "http://catalog.test/models.txt";
pub const CATALOG: &str = "\
cs czech-ud-2.3 czech
en english-ud-2.3 english
";

pub const LIMIT: Duration = Duration::from_secs(2);

// ============================================================================
// FETCHER
// ============================================================================

#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, (Duration, Result<String, String>)>,
    events: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), (Duration::ZERO, Ok(body.to_string())));
        self
    }

    pub fn serve_after(mut self, url: &str, delay: Duration, body: &str) -> Self {
        self.responses.insert(url.to_string(), (delay, Ok(body.to_string())));
        self
    }

    pub fn fail(mut self, url: &str, reason: &str) -> Self {
        self.responses.insert(url.to_string(), (Duration::ZERO, Err(reason.to_string())));
        self
    }

    /// "start <url>" / "end <url>" entries in the order they happened.
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl Fetcher for ScriptedFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, AppError> {
        self.events.borrow_mut().push(format!("start {url}"));
        let (delay, response) = self
            .responses
            .get(url)
            .cloned()
            .unwrap_or((Duration::ZERO, Err("404 Not Found".to_string())));
        tokio::time::sleep(delay).await;
        self.events.borrow_mut().push(format!("end {url}"));
        response.map_err(|e| AppError::Fetch(format!("{url}: {e}")))
    }
}

// ============================================================================
// FORMS
// ============================================================================

pub fn model_options() -> Vec<String> {
    ["czech-ud-2.0", "czech-ud-2.3", "english-ud-2.3"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Model select, input text area and a plain text input.
pub fn small_form() -> Form {
    Form::new()
        .with("model", Control::select(model_options()))
        .with("input", Control::text_area(""))
        .with("tokenizer", Control::input(""))
}

// ============================================================================
// HTTP
// ============================================================================

pub struct MockServer {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    /// Answer `(path, status, body)` routes; other paths get a 404. Query
    /// strings are ignored when matching.
    pub fn start(routes: Vec<(&'static str, u16, String)>) -> Self {
        Self::spawn(routes, true)
    }

    /// Like [`MockServer::start`], but bodies are sent without a
    /// `Content-Length` and end when the connection closes.
    pub fn start_unsized(routes: Vec<(&'static str, u16, String)>) -> Self {
        Self::spawn(routes, false)
    }

    fn spawn(routes: Vec<(&'static str, u16, String)>, sized: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let base = format!("http://{}", listener.local_addr().expect("mock address"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let request = read_request(&mut stream);
                let path = request
                    .split_whitespace()
                    .nth(1)
                    .and_then(|target| target.split('?').next())
                    .unwrap_or("/")
                    .to_string();
                seen.lock().expect("request log").push(request);

                let (status, body) = routes
                    .iter()
                    .find(|(p, ..)| *p == path)
                    .map(|(_, status, body)| (*status, body.clone()))
                    .unwrap_or((404, "Not Found".to_string()));
                let length = if sized {
                    format!("Content-Length: {}\r\n", body.len())
                } else {
                    String::new()
                };
                let response = format!(
                    "HTTP/1.1 {status} Mock\r\nContent-Type: text/plain; charset=utf-8\r\n{length}Connection: close\r\n\r\n{body}"
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self { base, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// `host:port`, as written in a fetch allow list.
    pub fn host(&self) -> String {
        self.base.trim_start_matches("http://").to_string()
    }

    /// Raw requests received so far, head and body.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log").clone()
    }
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + length {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

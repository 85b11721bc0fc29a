#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use overpass_rs::decode::decode_from_json_document;
use overpass_rs::{Query, ResultSet};

pub mod checks;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).unwrap()
}

pub fn json_fixture(name: &str) -> ResultSet {
    let data: serde_json::Value = serde_json::from_str(&read_fixture(name)).unwrap();
    decode_from_json_document(&data).unwrap()
}

/// Answers every query with the same JSON fixture and counts the calls.
pub struct MockApi {
    fixture: Option<&'static str>,
    pub calls: Cell<usize>,
    pub last_query: RefCell<String>,
}

impl MockApi {
    pub fn answering(fixture: &'static str) -> Self {
        MockApi {
            fixture: Some(fixture),
            calls: Cell::new(0),
            last_query: Default::default(),
        }
    }

    /// Answers with an empty result.
    pub fn empty() -> Self {
        MockApi {
            fixture: None,
            calls: Cell::new(0),
            last_query: Default::default(),
        }
    }
}

impl Query for MockApi {
    fn query(&self, query: &str) -> overpass_rs::Result<ResultSet> {
        self.calls.set(self.calls.get() + 1);
        *self.last_query.borrow_mut() = query.to_string();
        match self.fixture {
            Some(name) => Ok(json_fixture(name)),
            None => Ok(ResultSet::new()),
        }
    }
}

/// Canned HTTP answer of the [`StubServer`].
pub struct StubResponse {
    pub status: u16,
    pub reason: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn new(status: u16, reason: &'static str, content_type: &'static str, body: &[u8]) -> Self {
        StubResponse {
            status,
            reason,
            content_type,
            body: body.to_vec(),
        }
    }

    pub fn json_fixture(name: &str) -> Self {
        StubResponse::new(200, "OK", "application/json", read_fixture(name).as_bytes())
    }
}

/// Local HTTP server answering one connection per canned response, in order.
pub struct StubServer {
    pub url: String,
    handle: JoinHandle<Vec<String>>,
}

impl StubServer {
    pub fn start(responses: Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/interpreter", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut queries = Vec::new();
            for response in responses {
                let (stream, _) = listener.accept().unwrap();
                queries.push(answer(stream, &response));
            }
            queries
        });
        StubServer { url, handle }
    }

    /// Wait until every response was served and return the received request bodies.
    pub fn finish(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}

fn answer(stream: TcpStream, response: &StubResponse) -> String {
    let mut reader = BufReader::new(&stream);
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap();
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap();

    let mut writer = &stream;
    write!(
        writer,
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.reason,
        response.content_type,
        response.body.len()
    )
    .unwrap();
    writer.write_all(&response.body).unwrap();
    writer.flush().unwrap();

    String::from_utf8_lossy(&body).into_owned()
}

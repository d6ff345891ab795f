// Minimal canned HTTP responder for exercising the client end to end.
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A request as the responder saw it.
pub struct Captured {
    /// Request line and headers, header names lowercased.
    pub head: String,
    pub body: String,
}

impl Captured {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

/// Answer exactly one request on a fresh local port with the given status,
/// content type and body. Join the handle to inspect the request.
pub fn serve_once(
    status: u16,
    content_type: &str,
    body: impl Into<Vec<u8>>,
) -> (String, JoinHandle<Captured>) {
    let (base_url, handle) = serve_sequence(vec![(status, content_type.to_string(), body.into())]);
    let handle = thread::spawn(move || handle.join().unwrap().remove(0));
    (base_url, handle)
}

/// Answer one request per entry, in order, each on its own connection.
/// Join the handle to inspect the requests in arrival order.
pub fn serve_sequence(responses: Vec<(u16, String, Vec<u8>)>) -> (String, JoinHandle<Vec<Captured>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        responses
            .into_iter()
            .map(|(status, content_type, body)| {
                let (stream, _) = listener.accept().unwrap();
                answer(stream, status, &content_type, &body)
            })
            .collect()
    });

    (base_url, handle)
}

fn answer(mut stream: TcpStream, status: u16, content_type: &str, body: &[u8]) -> Captured {
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let mut head = String::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let lowered = match line.split_once(':') {
            Some((name, value)) => format!("{}:{}", name.to_ascii_lowercase(), value),
            None => line.clone(),
        };
        if let Some(value) = lowered.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap();
        }
        head.push_str(&lowered);
    }
    let mut request_body = vec![0; content_length];
    reader.read_exact(&mut request_body).unwrap();

    write!(
        stream,
        "HTTP/1.1 {} Canned\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    )
    .unwrap();
    stream.write_all(body).unwrap();
    stream.flush().unwrap();

    Captured {
        head,
        body: String::from_utf8_lossy(&request_body).into_owned(),
    }
}

pub fn serve_json(status: u16, body: serde_json::Value) -> (String, JoinHandle<Captured>) {
    serve_once(status, "application/json", body.to_string())
}

/// Accept one connection and never answer it.
pub fn serve_silence(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    thread::spawn(move || {
        if let Ok((_stream, _)) = listener.accept() {
            thread::sleep(hold);
        }
    });
    base_url
}

/// An address nothing is listening on.
pub fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    base_url
}

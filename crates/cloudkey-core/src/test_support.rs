//! Helpers shared by the unit tests that talk HTTP.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use reqwest::Client;

/// Request as seen by `serve_once`: header block and decoded body
pub struct RecordedRequest {
    pub head: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.head.lines().find_map(|line| {
            line.to_ascii_lowercase()
                .strip_prefix(&prefix)
                .map(|v| v.trim().to_string())
        })
    }

    /// Value of the multipart part named `name`
    pub fn part(&self, name: &str) -> Option<String> {
        let marker = format!("name=\"{}\"", name);
        let start = self.body.find(&marker)?;
        let rest = &self.body[start..];
        let value_start = rest.find("\r\n\r\n")? + 4;
        let value = &rest[value_start..];
        let value_end = value.find("\r\n")?;
        Some(value[..value_end].to_string())
    }
}

/// Client without any proxy picked up from the environment
pub fn local_client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

/// Serve exactly one HTTP response on a local port and hand back the
/// request that was received.
pub fn serve_once(status: u16, body: &'static str) -> (String, thread::JoinHandle<RecordedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut head = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            head.push_str(&line);
        }

        let mut request = RecordedRequest {
            head,
            body: String::new(),
        };
        let request_body = match request.header("content-length") {
            Some(length) => {
                let mut buf = vec![0u8; length.parse().unwrap()];
                reader.read_exact(&mut buf).unwrap();
                buf
            }
            None => read_chunked(&mut reader),
        };
        request.body = String::from_utf8(request_body).unwrap();

        write!(
            stream,
            "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
        .unwrap();

        request
    });

    (base_url, handle)
}

fn read_chunked<R: BufRead>(reader: &mut R) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).unwrap();
        let size = usize::from_str_radix(size_line.trim(), 16).unwrap();
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).unwrap();
        if size == 0 {
            return body;
        }
        body.extend_from_slice(&chunk[..size]);
    }
}

/// In-memory sink for a `tracing_subscriber::fmt` writer
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` with logs filtered by `filter` and return what was written
pub fn capture_logs(filter: &str, f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    logs.contents()
}

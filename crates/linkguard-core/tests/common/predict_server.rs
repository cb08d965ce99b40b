//! Minimal HTTP/1.1 server that answers POST /predict for integration tests.
//!
//! Serves a scripted behavior: a fixed classification response, a fixed
//! error status, or a garbage body. Counts the requests it handles so tests
//! can assert which paths consulted the classifier.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub enum PredictBehavior {
    /// 200 with `{"success":true,"data":<label>,"confidence":<c>}`.
    Label { label: String, confidence: f64 },
    /// Fixed non-2xx status with an empty body.
    HttpError(u32),
    /// 200 with a body that is not the expected shape.
    Garbage,
}

pub struct PredictServer {
    pub endpoint: String,
    hits: Arc<AtomicUsize>,
}

impl PredictServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread. Returns the endpoint base URL
/// (e.g. "http://127.0.0.1:12345"). The server runs until the process exits.
pub fn start(behavior: PredictBehavior) -> PredictServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let behavior = behavior.clone();
            let hits = Arc::clone(&hits_clone);
            thread::spawn(move || handle(stream, &behavior, &hits));
        }
    });
    PredictServer {
        endpoint: format!("http://127.0.0.1:{port}"),
        hits,
    }
}

fn handle(mut stream: std::net::TcpStream, behavior: &PredictBehavior, hits: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));

    if read_request(&mut stream).is_none() {
        return;
    }
    hits.fetch_add(1, Ordering::SeqCst);

    let response = match behavior {
        PredictBehavior::Label { label, confidence } => {
            let body = format!(
                "{{\"success\":true,\"data\":\"{label}\",\"confidence\":{confidence}}}"
            );
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
        }
        PredictBehavior::HttpError(status) => {
            format!("HTTP/1.1 {status} Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
        }
        PredictBehavior::Garbage => {
            let body = "<html>model loading, try later</html>";
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
        }
    };
    let _ = stream.write_all(response.as_bytes());
}

/// Reads headers plus a Content-Length body. Returns None on malformed input.
fn read_request(stream: &mut std::net::TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        if buf.len() > 64 * 1024 {
            return None;
        }
    };

    let headers = std::str::from_utf8(&buf[..header_end]).ok()?;
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Some(buf[body_start..body_start + content_length].to_vec())
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

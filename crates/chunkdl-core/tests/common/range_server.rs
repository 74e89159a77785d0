//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves one static body, one request per connection. HEAD answers with
//! Content-Length and `Accept-Ranges: bytes`; GET with a Range header answers
//! 206 Partial Content. Options inject the failures the downloader must
//! survive or report.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, HEAD returns 405.
    pub head_allowed: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, omit `Accept-Ranges: bytes` even if ranges work.
    pub advertise_ranges: bool,
    /// Send `Accept-Ranges: bytes` even when `support_ranges` is false.
    pub claim_ranges: bool,
    /// Ranged GETs starting at this offset get 404.
    pub fail_range_start: Option<u64>,
    /// Ranged GETs starting at this offset send half the promised body.
    pub truncate_range_start: Option<u64>,
    /// The first N GETs (excluding the `bytes=0-0` probe) get 503 with an
    /// HTML error page as body.
    pub flaky_gets: usize,
    /// Sleep before answering a GET that is not failed on purpose.
    pub get_delay: Duration,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            support_ranges: true,
            advertise_ranges: true,
            claim_ranges: false,
            fail_range_start: None,
            truncate_range_start: None,
            flaky_gets: 0,
            get_delay: Duration::ZERO,
        }
    }
}

/// Starts a server in a background thread serving `body`. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let gets = Arc::new(AtomicUsize::new(0));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let gets = Arc::clone(&gets);
            thread::spawn(move || handle(stream, &body, opts, &gets));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn respond(stream: &mut TcpStream, status: &str, headers: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        status,
        body.len(),
        headers
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn handle(mut stream: TcpStream, body: &[u8], opts: RangeServerOptions, gets: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, range) = parse_request(request);
    let total = body.len() as u64;
    let accept_ranges = if opts.claim_ranges || (opts.advertise_ranges && opts.support_ranges) {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if method.eq_ignore_ascii_case("HEAD") {
        if !opts.head_allowed {
            respond(&mut stream, "405 Method Not Allowed", "", b"");
            return;
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
            total, accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", "", b"");
        return;
    }

    let is_probe = range == Some((0, 0));
    if !is_probe && gets.fetch_add(1, Ordering::SeqCst) < opts.flaky_gets {
        let page = vec![b'X'; 200];
        respond(&mut stream, "503 Service Unavailable", "Content-Type: text/html\r\n", &page);
        return;
    }

    let range = range.filter(|_| opts.support_ranges);
    let Some((start, end_incl)) = range else {
        thread::sleep(opts.get_delay);
        respond(&mut stream, "200 OK", accept_ranges, body);
        return;
    };

    if !is_probe && opts.fail_range_start == Some(start) {
        respond(&mut stream, "404 Not Found", "", b"");
        return;
    }
    let end_incl = end_incl.min(total.saturating_sub(1));
    if start >= total || start > end_incl {
        let headers = format!("Content-Range: bytes */{}\r\n", total);
        respond(&mut stream, "416 Range Not Satisfiable", &headers, b"");
        return;
    }
    if !is_probe {
        thread::sleep(opts.get_delay);
    }
    let slice = &body[start as usize..=end_incl as usize];
    let headers = format!(
        "Content-Range: bytes {}-{}/{}\r\n{}",
        start, end_incl, total, accept_ranges
    );
    if opts.truncate_range_start == Some(start) {
        let head = format!(
            "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
            slice.len(),
            headers
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&slice[..slice.len() / 2]);
        return;
    }
    respond(&mut stream, "206 Partial Content", &headers, slice);
}

/// Returns (method, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut method = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("range") {
            continue;
        }
        let value = value.trim();
        if let Some(byte_range) = value.strip_prefix("bytes=") {
            if let Some((a, b)) = byte_range.split_once('-') {
                let start = a.trim().parse::<u64>().unwrap_or(0);
                let end = b.trim();
                let end_incl = if end.is_empty() {
                    u64::MAX
                } else {
                    end.parse::<u64>().unwrap_or(0)
                };
                range = Some((start, end_incl));
            }
        }
    }
    (method, range)
}

//! Parse HTTP response header lines into a ProbeResult.

use super::ProbeResult;
use crate::fetcher::parse_http_status;

/// Parse collected HEAD response lines. Only the last response (after
/// redirects) is considered.
pub(crate) fn parse_headers(lines: &[String]) -> ProbeResult {
    let start = lines
        .iter()
        .rposition(|l| l.starts_with("HTTP/"))
        .unwrap_or(0);

    let mut content_length = None;
    let mut accept_ranges = false;

    for line in &lines[start..] {
        let Some((name, value)) = line.trim().split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<u64>().ok();
        } else if name.eq_ignore_ascii_case("accept-ranges") {
            accept_ranges = value
                .split(',')
                .any(|unit| unit.trim().eq_ignore_ascii_case("bytes"));
        }
    }

    ProbeResult {
        status: parse_http_status(lines),
        content_length,
        accept_ranges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn content_length_and_ranges() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Length: 12345",
            "Accept-Ranges: bytes",
        ]));
        assert_eq!(r.status, Some(200));
        assert_eq!(r.content_length, Some(12345));
        assert!(r.accept_ranges);
    }

    #[test]
    fn ranges_none() {
        let r = parse_headers(&lines(&["HTTP/1.1 200 OK", "Content-Length: 999", "Accept-Ranges: none"]));
        assert_eq!(r.content_length, Some(999));
        assert!(!r.accept_ranges);
    }

    #[test]
    fn only_final_response_counts() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 301 Moved Permanently",
            "Content-Length: 0",
            "Location: /real",
            "HTTP/1.1 200 OK",
            "Content-Length: 4096",
        ]));
        assert_eq!(r.status, Some(200));
        assert_eq!(r.content_length, Some(4096));
        assert!(!r.accept_ranges);
    }

    #[test]
    fn missing_length() {
        let r = parse_headers(&lines(&["HTTP/1.1 200 OK", "Transfer-Encoding: chunked"]));
        assert!(r.content_length.is_none());
    }
}

//! Size and range-support discovery.
//!
//! Sends `HEAD` for the size, then a one-byte ranged GET (`Range: bytes=0-0`)
//! to see whether ranges are actually honoured; a `206` reply's
//! `Content-Range` carries the total size. `Accept-Ranges` alone is not
//! trusted unless the ranged GET fails outright.

mod parse;

use anyhow::{Context, Result};
use std::cell::{Cell, RefCell};
use std::str;

use crate::fetcher::{parse_content_range, parse_http_status, FetchOptions};

/// What the server told us about the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// Final HTTP status of the probe request, if any response was received.
    pub status: Option<u32>,
    /// Total size in bytes, if known.
    pub content_length: Option<u64>,
    /// True if the server serves byte ranges.
    pub accept_ranges: bool,
}

impl ProbeResult {
    /// Ranged download is possible: size known and ranges served.
    pub fn supports_chunking(&self) -> bool {
        self.accept_ranges && self.content_length.is_some()
    }
}

/// Probe `url` for its size and byte-range support.
pub fn probe(url: &str, opts: &FetchOptions) -> Result<ProbeResult> {
    let head = match head_request(url, opts) {
        Ok(r) if r.status.map(|s| (200..300).contains(&s)).unwrap_or(false) => Some(r),
        Ok(r) => {
            tracing::debug!(status = ?r.status, "HEAD refused, trying ranged probe");
            None
        }
        Err(e) => {
            tracing::debug!("HEAD failed ({:#}), trying ranged probe", e);
            None
        }
    };

    let ranged = match (range_request(url, opts), &head) {
        (Ok(r), _) => r,
        // `Accept-Ranges` from HEAD is a claim; keep it only when the GET
        // could not be checked.
        (Err(e), Some(h)) if h.supports_chunking() => {
            tracing::debug!("ranged probe failed ({:#}), trusting HEAD", e);
            return Ok(h.clone());
        }
        (Err(e), _) => return Err(e.context("ranged probe failed")),
    };
    if ranged.accept_ranges {
        return Ok(ranged);
    }
    if head.as_ref().map(|h| h.accept_ranges).unwrap_or(false) {
        tracing::info!("server advertises byte ranges but ignored a Range request");
    }
    // No range support: keep whatever size HEAD reported.
    let content_length = head
        .as_ref()
        .and_then(|h| h.content_length)
        .or(ranged.content_length);
    Ok(ProbeResult {
        status: ranged.status,
        content_length,
        accept_ranges: false,
    })
}

fn head_request(url: &str, opts: &FetchOptions) -> Result<ProbeResult> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    opts.apply(&mut easy)?;
    easy.url(url).context("invalid URL")?;
    easy.nobody(true)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.perform().context("HEAD request failed")?;
    }

    Ok(parse::parse_headers(&headers))
}

/// GET `bytes=0-0`. A 206 reply proves range support and its Content-Range
/// gives the size; a 200 reply means ranges are ignored. The body is not read.
fn range_request(url: &str, opts: &FetchOptions) -> Result<ProbeResult> {
    let headers: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let body_seen = Cell::new(false);

    let mut easy = curl::easy::Easy::new();
    opts.apply(&mut easy)?;
    easy.url(url).context("invalid URL")?;
    easy.range("0-0")?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                let line = s.trim_end();
                if line.starts_with("HTTP/") {
                    headers.borrow_mut().clear();
                }
                headers.borrow_mut().push(line.to_string());
            }
            true
        })?;
        transfer.write_function(|_| {
            body_seen.set(true);
            Ok(0) // headers are all we need
        })?;
        transfer.perform()
    };
    if let Err(e) = performed {
        if !(e.is_write_error() && body_seen.get()) {
            return Err(e).context("GET request failed");
        }
    }

    let headers = headers.into_inner();
    let status = parse_http_status(&headers);
    let mut result = parse::parse_headers(&headers);
    match status {
        Some(206) => {
            let (_, _, total) = parse_content_range(&headers)
                .context("206 reply without a usable Content-Range")?;
            result.content_length = total;
            result.accept_ranges = total.is_some();
        }
        Some(416) => {
            // `bytes */0`: the resource exists but is empty.
            result.content_length = unsatisfied_total(&headers);
            result.accept_ranges = result.content_length.is_some();
        }
        Some(code) if (200..300).contains(&code) => {
            result.accept_ranges = false;
        }
        other => anyhow::bail!("GET {} returned HTTP {}", url, other.unwrap_or(0)),
    }
    Ok(result)
}

/// Total from `Content-Range: bytes */N`.
fn unsatisfied_total(headers: &[String]) -> Option<u64> {
    headers.iter().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if !name.trim().eq_ignore_ascii_case("content-range") {
            return None;
        }
        value.trim().strip_prefix("bytes */")?.trim().parse().ok()
    })
}

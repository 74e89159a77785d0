//! Single-chunk HTTP Range GET into memory.

use std::cell::{Cell, RefCell};
use std::str;
use std::sync::atomic::{AtomicBool, Ordering};

use super::response::{parse_content_range, parse_http_status};
use super::{ChunkResult, FetchOptions};
use crate::error::ChunkError;
use crate::planner::ChunkRange;

/// Reusable ranged-GET client. Not `Sync`; give each worker its own.
pub struct ChunkFetcher {
    easy: curl::easy::Easy,
}

impl ChunkFetcher {
    pub fn new(opts: &FetchOptions) -> Result<Self, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        opts.apply(&mut easy)?;
        Ok(Self { easy })
    }

    /// Fetch `range` of `url` into memory.
    ///
    /// `on_bytes` is called with the running byte count as data arrives.
    /// When `cancel` is set mid-transfer the request is aborted and
    /// [`ChunkError::Cancelled`] returned.
    pub fn fetch(
        &mut self,
        url: &str,
        range: ChunkRange,
        cancel: Option<&AtomicBool>,
        on_bytes: &mut dyn FnMut(u64),
    ) -> Result<ChunkResult, ChunkError> {
        let expected = range.len();
        let mut data: Vec<u8> = Vec::with_capacity(expected as usize);
        let headers: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let rejection: RefCell<Option<ChunkError>> = RefCell::new(None);
        let checked = Cell::new(false);
        let received = Cell::new(0u64);

        self.easy.url(url)?;
        self.easy.range(&range.curl_range())?;
        self.easy.progress(cancel.is_some())?;

        let perform_result = {
            let mut transfer = self.easy.transfer();
            transfer.header_function(|line| {
                if let Ok(s) = str::from_utf8(line) {
                    let line = s.trim_end();
                    let mut headers = headers.borrow_mut();
                    if line.starts_with("HTTP/") {
                        // New response (e.g. after a redirect): drop the old headers.
                        headers.clear();
                    }
                    if !line.is_empty() {
                        headers.push(line.to_string());
                    }
                }
                true
            })?;
            transfer.write_function(|chunk| {
                if !checked.get() {
                    checked.set(true);
                    if let Err(e) = check_partial_response(&headers.borrow(), &range) {
                        *rejection.borrow_mut() = Some(e);
                    }
                }
                if rejection.borrow().is_some() {
                    return Ok(0);
                }
                received.set(received.get() + chunk.len() as u64);
                let room = (expected - data.len() as u64) as usize;
                if chunk.len() > room {
                    // Longer than requested: stop the transfer, report below.
                    return Ok(0);
                }
                data.extend_from_slice(chunk);
                on_bytes(data.len() as u64);
                Ok(chunk.len())
            })?;
            if let Some(cancel) = cancel {
                transfer.progress_function(|_, _, _, _| !cancel.load(Ordering::Relaxed))?;
            }
            transfer.perform()
        };

        if let Some(e) = rejection.into_inner() {
            return Err(e);
        }
        if let Err(e) = perform_result {
            if cancel.map(|c| c.load(Ordering::Relaxed)).unwrap_or(false) {
                return Err(ChunkError::Cancelled);
            }
            if e.is_partial_file() {
                // Connection closed before the announced length arrived.
                return Err(ChunkError::LengthMismatch {
                    expected,
                    received: received.get(),
                });
            }
            if !(e.is_write_error() && received.get() > expected) {
                return Err(ChunkError::Curl(e));
            }
        }
        if !checked.get() {
            // No body at all: still validate status and range headers.
            check_partial_response(&headers.borrow(), &range)?;
        }

        let received = received.get();
        if received != expected || data.len() as u64 != expected {
            return Err(ChunkError::LengthMismatch { expected, received });
        }
        Ok(ChunkResult { range, data })
    }
}

/// A ranged GET must answer `206 Partial Content` for exactly the requested span.
fn check_partial_response(headers: &[String], range: &ChunkRange) -> Result<(), ChunkError> {
    let status = parse_http_status(headers).unwrap_or(0);
    if !(200..300).contains(&status) {
        return Err(ChunkError::Http(status));
    }
    if status != 206 {
        return Err(ChunkError::RangeIgnored(status));
    }
    if let Some((start, end, _)) = parse_content_range(headers) {
        if start != range.start || end != range.end {
            return Err(ChunkError::ContentRangeMismatch {
                requested: format!("{}-{}", range.start, range.end),
                received: format!("{}-{}", start, end),
            });
        }
    }
    Ok(())
}

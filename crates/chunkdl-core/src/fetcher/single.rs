//! Single-stream HTTP GET (fallback for servers without range support).
//!
//! Writes the response body sequentially through the assembler starting at
//! offset 0.

use std::cell::{Cell, RefCell};
use std::str;
use std::sync::atomic::{AtomicBool, Ordering};

use super::response::parse_http_status;
use super::FetchOptions;
use crate::assembler::Assembler;
use crate::error::ChunkError;

/// Downloads `url` with one unranged GET. Returns the number of bytes written.
///
/// Nothing is written unless the response status is 2xx. When `expected_len`
/// is known the body must match it exactly.
pub fn download_single(
    url: &str,
    assembler: &Assembler,
    expected_len: Option<u64>,
    opts: &FetchOptions,
    cancel: Option<&AtomicBool>,
    on_bytes: &mut dyn FnMut(u64),
) -> Result<u64, ChunkError> {
    let offset = Cell::new(0u64);
    let write_error: RefCell<Option<std::io::Error>> = RefCell::new(None);
    let headers: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let rejection: RefCell<Option<ChunkError>> = RefCell::new(None);
    let checked = Cell::new(false);

    let mut easy = curl::easy::Easy::new();
    opts.apply(&mut easy)?;
    easy.url(url)?;
    easy.progress(cancel.is_some())?;

    let perform_result = {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            if let Ok(s) = str::from_utf8(line) {
                let line = s.trim_end();
                let mut headers = headers.borrow_mut();
                if line.starts_with("HTTP/") {
                    headers.clear();
                }
                if !line.is_empty() {
                    headers.push(line.to_string());
                }
            }
            true
        })?;
        transfer.write_function(|data| {
            if !checked.get() {
                checked.set(true);
                if let Err(e) = check_status(&headers.borrow()) {
                    *rejection.borrow_mut() = Some(e);
                }
            }
            if rejection.borrow().is_some() {
                return Ok(0);
            }
            let off = offset.get();
            if let Some(expected) = expected_len {
                if off + data.len() as u64 > expected {
                    *rejection.borrow_mut() = Some(ChunkError::LengthMismatch {
                        expected,
                        received: off + data.len() as u64,
                    });
                    return Ok(0);
                }
            }
            match assembler.write_at(off, data) {
                Ok(()) => {
                    offset.set(off + data.len() as u64);
                    on_bytes(off + data.len() as u64);
                    Ok(data.len())
                }
                Err(e) => {
                    tracing::warn!("single-stream write failed: {}", e);
                    *write_error.borrow_mut() = Some(e);
                    Ok(0) // abort transfer
                }
            }
        })?;
        if let Some(cancel) = cancel {
            transfer.progress_function(|_, _, _, _| !cancel.load(Ordering::Relaxed))?;
        }
        transfer.perform()
    };

    if let Some(e) = rejection.into_inner() {
        return Err(e);
    }
    if let Some(e) = write_error.into_inner() {
        return Err(ChunkError::Io(e));
    }
    if let Err(e) = perform_result {
        if cancel.map(|c| c.load(Ordering::Relaxed)).unwrap_or(false) {
            return Err(ChunkError::Cancelled);
        }
        if let (true, Some(expected)) = (e.is_partial_file(), expected_len) {
            return Err(ChunkError::LengthMismatch {
                expected,
                received: offset.get(),
            });
        }
        return Err(ChunkError::Curl(e));
    }

    if !checked.get() {
        // Empty body: the status still has to be 2xx.
        check_status(&headers.borrow())?;
    }

    let written = offset.get();
    if let Some(expected) = expected_len {
        if written != expected {
            return Err(ChunkError::LengthMismatch {
                expected,
                received: written,
            });
        }
    }
    Ok(written)
}

fn check_status(headers: &[String]) -> Result<(), ChunkError> {
    let status = parse_http_status(headers).unwrap_or(0);
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(ChunkError::Http(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn error_status_is_rejected() {
        let h = lines(&["HTTP/1.1 503 Service Unavailable", "Content-Length: 200"]);
        assert!(matches!(check_status(&h), Err(ChunkError::Http(503))));
    }

    #[test]
    fn success_passes_and_missing_status_fails() {
        let h = lines(&["HTTP/1.1 200 OK", "Content-Length: 10"]);
        assert!(check_status(&h).is_ok());
        assert!(matches!(check_status(&[]), Err(ChunkError::Http(0))));
    }
}

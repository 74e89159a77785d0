//! Classify HTTP status and curl errors into failure kinds.

use crate::error::{ChunkError, FailureKind};

/// Classify a non-2xx HTTP status code.
///
/// Throttling, request timeouts and server errors are worth another try;
/// every other client error (404, 410, 416...) is permanent.
pub fn classify_http_status(code: u32) -> FailureKind {
    match code {
        408 | 429 => FailureKind::Transient,
        500..=599 => FailureKind::Transient,
        _ => FailureKind::Permanent,
    }
}

/// Classify a curl error. Network-level failures are transient; anything
/// else (malformed URL, unsupported protocol, TLS setup) is permanent.
pub fn classify_curl_error(e: &curl::Error) -> FailureKind {
    if e.is_aborted_by_callback() {
        return FailureKind::Cancelled;
    }
    if e.is_operation_timedout()
        || e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return FailureKind::Transient;
    }
    FailureKind::Permanent
}

/// Classify a chunk error.
pub fn classify(e: &ChunkError) -> FailureKind {
    match e {
        ChunkError::Curl(ce) => classify_curl_error(ce),
        ChunkError::Http(code) => classify_http_status(*code),
        ChunkError::RangeIgnored(_) | ChunkError::WorkerLost => FailureKind::Permanent,
        ChunkError::ContentRangeMismatch { .. } | ChunkError::LengthMismatch { .. } => {
            FailureKind::Integrity
        }
        ChunkError::Io(_) => FailureKind::Io,
        ChunkError::Cancelled => FailureKind::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_and_5xx_are_transient() {
        assert_eq!(classify_http_status(429), FailureKind::Transient);
        assert_eq!(classify_http_status(503), FailureKind::Transient);
        assert_eq!(classify_http_status(500), FailureKind::Transient);
        assert_eq!(classify_http_status(408), FailureKind::Transient);
    }

    #[test]
    fn gone_and_unsatisfiable_are_permanent() {
        assert_eq!(classify_http_status(404), FailureKind::Permanent);
        assert_eq!(classify_http_status(410), FailureKind::Permanent);
        assert_eq!(classify_http_status(416), FailureKind::Permanent);
        assert_eq!(classify_http_status(403), FailureKind::Permanent);
    }

    #[test]
    fn classify_non_curl_errors() {
        assert_eq!(classify(&ChunkError::RangeIgnored(200)), FailureKind::Permanent);
        assert_eq!(
            classify(&ChunkError::LengthMismatch { expected: 4, received: 3 }),
            FailureKind::Integrity
        );
        assert_eq!(
            classify(&ChunkError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))),
            FailureKind::Io
        );
        assert_eq!(classify(&ChunkError::Cancelled), FailureKind::Cancelled);
    }

    #[test]
    fn classify_curl_codes() {
        // CURLE_COULDNT_CONNECT = 7, CURLE_OPERATION_TIMEDOUT = 28, CURLE_URL_MALFORMAT = 3
        assert_eq!(classify_curl_error(&curl::Error::new(7)), FailureKind::Transient);
        assert_eq!(classify_curl_error(&curl::Error::new(28)), FailureKind::Transient);
        assert_eq!(classify_curl_error(&curl::Error::new(3)), FailureKind::Permanent);
    }
}

//! Output filename derivation from URLs.

mod sanitize;

pub use sanitize::sanitize_filename;

/// Name used when the URL has no usable last path segment.
pub const FALLBACK_FILENAME: &str = "download.bin";

/// Parse and check that `url` is an absolute `http`/`https` URL.
pub fn validate_http_url(url: &str) -> anyhow::Result<url::Url> {
    let parsed = url::Url::parse(url).map_err(|e| anyhow::anyhow!("invalid URL {}: {}", url, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => anyhow::bail!("unsupported URL scheme {:?} (expected http or https)", other),
    }
}

/// Last path segment of `url`, sanitized, if any.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let name = sanitize_filename(segment);
    if name.is_empty() {
        return None;
    }
    Some(name)
}

//! Optional SHA-256 verification of the assembled file.
//!
//! Computed after all chunks are written, never inline with the transfer.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Fail unless the file's SHA-256 equals `expected_hex` (case-insensitive).
pub fn verify_sha256(path: &Path, expected_hex: &str) -> Result<()> {
    let expected = expected_hex.trim().to_ascii_lowercase();
    let bytes = hex::decode(&expected).context("expected SHA-256 is not valid hex")?;
    if bytes.len() != 32 {
        anyhow::bail!("expected SHA-256 must be 64 hex characters");
    }
    let actual = sha256_path(path)?;
    if actual != expected {
        anyhow::bail!(
            "SHA-256 mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HELLO_SHA256: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

    #[test]
    fn sha256_path_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            sha256_path(f.path()).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn verify_accepts_match_any_case() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        verify_sha256(f.path(), HELLO_SHA256).unwrap();
        verify_sha256(f.path(), &HELLO_SHA256.to_uppercase()).unwrap();
    }

    #[test]
    fn verify_rejects_mismatch_and_bad_hex() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        let wrong = "0".repeat(64);
        let err = verify_sha256(f.path(), &wrong).unwrap_err();
        assert!(err.to_string().contains("mismatch"));
        assert!(verify_sha256(f.path(), "zz").is_err());
        assert!(verify_sha256(f.path(), "abcd").is_err());
    }
}

#![allow(dead_code)]

pub mod range_server;

use chunkdl_core::config::{DlConfig, RetryConfig};

/// Deterministic test body.
pub fn body(len: usize) -> Vec<u8> {
    (0u32..).map(|i| (i % 251) as u8).take(len).collect()
}

/// Config with short timeouts and backoff, `threads` workers.
pub fn config(threads: usize) -> DlConfig {
    DlConfig {
        num_threads: Some(threads),
        connect_timeout_secs: 5,
        retry: RetryConfig {
            max_attempts: 3,
            base_delay_secs: 0.01,
            max_delay_secs: 1,
        },
        ..DlConfig::default()
    }
}

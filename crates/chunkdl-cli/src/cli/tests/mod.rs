//! CLI parse tests.

use super::Cli;
use chunkdl_core::config::DlConfig;
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn minimal_invocation() {
    let cli = parse(&[
        "chunkdl",
        "--url",
        "https://example.com/file.iso",
        "--save-path",
        "/tmp/file.iso",
    ]);
    assert_eq!(cli.url, "https://example.com/file.iso");
    assert_eq!(cli.save_path.to_str(), Some("/tmp/file.iso"));
    assert!(cli.num_threads.is_none());
    assert!(!cli.fail_fast);
    assert!(!cli.overwrite);
    assert!(cli.sha256.is_none());
}

#[test]
fn url_and_save_path_are_required() {
    assert!(Cli::try_parse_from(["chunkdl", "--url", "http://h/x"]).is_err());
    assert!(Cli::try_parse_from(["chunkdl", "--save-path", "x"]).is_err());
}

#[test]
fn rejects_zero_threads_and_zero_retries() {
    let base = ["chunkdl", "--url", "http://h/x", "--save-path", "x"];
    let with = |extra: &[&str]| {
        let mut args: Vec<&str> = base.to_vec();
        args.extend_from_slice(extra);
        Cli::try_parse_from(args)
    };
    assert!(with(&["--num-threads", "0"]).is_err());
    assert!(with(&["--retry-limit", "0"]).is_err());
    assert!(with(&["--num-threads", "8", "--retry-limit", "5"]).is_ok());
}

#[test]
fn flags_override_config() {
    let cli = parse(&[
        "chunkdl",
        "--url",
        "http://h/x",
        "--save-path",
        "x",
        "--num-threads",
        "8",
        "--fail-fast",
        "--retry-limit",
        "5",
        "--sha256",
        "abcd",
        "--overwrite",
    ]);
    let mut cfg = DlConfig::default();
    cli.apply_overrides(&mut cfg);
    assert_eq!(cfg.num_threads, Some(8));
    assert!(cfg.fail_fast);
    assert_eq!(cfg.retry.max_attempts, 5);
    assert!(cli.overwrite);
    assert_eq!(cli.sha256.as_deref(), Some("abcd"));
}

#[test]
fn absent_flags_keep_config_values() {
    let cli = parse(&["chunkdl", "--url", "http://h/x", "--save-path", "x"]);
    let mut cfg = DlConfig {
        num_threads: Some(3),
        fail_fast: true,
        ..DlConfig::default()
    };
    cli.apply_overrides(&mut cfg);
    assert_eq!(cfg.num_threads, Some(3));
    assert!(cfg.fail_fast);
    assert_eq!(cfg.retry.max_attempts, 3);
}

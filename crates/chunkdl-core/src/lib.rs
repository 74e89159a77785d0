pub mod config;
pub mod logging;

pub mod assembler;
pub mod checksum;
pub mod download;
pub mod error;
pub mod fetcher;
pub mod planner;
pub mod probe;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod url_model;

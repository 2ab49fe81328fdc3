// Client library for the archive.org Wayback Machine: request new crawls,
// search historical snapshots, and parse timemap link-format responses.
pub mod capture;
pub mod client;
pub mod error;
pub mod search;
pub mod timemap;

// Re-export tests for integration testing
#[cfg(test)]
pub mod tests;

// Re-export key types and functions for easier access
pub use crate::client::{
    Client, Config, DEFAULT_BASE_URL, DEFAULT_HTTP_HOST, DEFAULT_MAX_TRIES,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
};
pub use crate::error::{Error, Result};
pub use crate::search::Snapshot;
pub use crate::timemap::{parse_memento, parse_timemap, Memento, TimeMap};

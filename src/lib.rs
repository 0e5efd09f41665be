//! newsw - offline-capable news client
//!
//! Loads a news feed through a background worker that precaches static
//! assets cache-first and proxies cross-origin requests network-first,
//! falling back to the cache when the network is gone.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod journal;
pub mod page;
pub mod ui;
pub mod worker;

pub use error::{NewswError, NewswResult};

//! Persistent response cache
//!
//! A [`CacheStorage`] holds any number of named [`CacheStore`]s, one per
//! worker version. Stores are overwrite-only maps from request identity to a
//! full response.
//!
//! # Layout
//!
//! | Path | Contents |
//! |------|----------|
//! | `caches/<name>/` | one store |
//! | `caches/<name>/<sha256>.json` | one entry, keyed by `METHOD URL` |
//! | `caches/<name>/.tmp-<uuid>` | entry being written |

pub mod entry;
pub mod storage;
pub mod store;

pub use entry::CacheEntry;
pub use storage::{validate_cache_name, CacheStorage};
pub use store::{CacheStore, EntrySummary};

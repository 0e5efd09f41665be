//! Background worker
//!
//! A worker version precaches the static asset list on install, claims every
//! open page on activate, and then intercepts each request a controlled page
//! makes:
//!
//! | Request origin          | Strategy                              |
//! |-------------------------|---------------------------------------|
//! | same as the worker      | cache-first, never writes             |
//! | anything else           | network-first, writes through, falls back to the store |
//!
//! The [`Registry`] owns registration and decides which version is in
//! control; the scheduler runs each version as its own event loop.

mod clients;
mod events;
mod handlers;
mod registry;
mod router;
mod scheduler;
mod state;
mod strategy;

pub use clients::Clients;
pub use events::{ActivateOutcome, InstallOutcome, LifecycleObserver, NoopObserver};
pub use handlers::WorkerScope;
pub use registry::Registry;
pub use router::{RequestClass, Router};
pub use scheduler::{Worker, WorkerHandle};
pub use state::{fingerprint, Registration, WorkerRecord, WorkerState};
pub use strategy::{cache_first, network_first};

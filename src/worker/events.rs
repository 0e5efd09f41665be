//! Lifecycle events, their outcomes, and lifecycle observers

use crate::error::NewswResult;
use crate::http::{Request, Response};
use crate::worker::state::WorkerState;
use tokio::sync::oneshot;
use url::Url;
use uuid::Uuid;

/// Result of a successful install event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Supersede any waiting version instead of waiting for pages to close
    pub skip_waiting: bool,
}

/// Result of a successful activate event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateOutcome {
    /// Take control of every open page immediately
    pub claim_clients: bool,

    /// Stores removed by the stale-cache policy
    pub purged: Vec<String>,
}

/// Queued `install` event
pub(crate) struct InstallEvent {
    pub respond: oneshot::Sender<NewswResult<InstallOutcome>>,
}

/// Queued `activate` event
pub(crate) struct ActivateEvent {
    pub respond: oneshot::Sender<NewswResult<ActivateOutcome>>,
}

/// Queued `fetch` event. The responder is the `respond_with` hook.
pub(crate) struct FetchEvent {
    pub request: Request,
    pub respond: oneshot::Sender<NewswResult<Option<Response>>>,
}

/// Receives lifecycle notifications, e.g. to drive a progress display
pub trait LifecycleObserver: Send + Sync {
    /// A worker moved to a new lifecycle state
    fn state_changed(&self, _worker: Uuid, _state: WorkerState) {}

    /// A static asset was fetched during install
    fn asset_fetched(&self, _done: usize, _total: usize, _url: &Url) {}
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl LifecycleObserver for NoopObserver {}

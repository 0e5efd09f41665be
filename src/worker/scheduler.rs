//! Event loop driving one worker version
//!
//! Each worker owns three named queues: `install`, `activate` and `fetch`.
//! Install and activate events are handled one at a time in arrival order,
//! so install always finishes before activate starts. Every fetch event runs
//! as its own task and may interleave with others at any await point.

use crate::error::{NewswError, NewswResult};
use crate::http::{Request, Response};
use crate::worker::events::{
    ActivateEvent, ActivateOutcome, FetchEvent, InstallEvent, InstallOutcome, LifecycleObserver,
};
use crate::worker::handlers::{self, WorkerScope};
use crate::worker::state::{WorkerRecord, WorkerState};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared lifecycle state of one worker version
struct Lifecycle {
    record: Mutex<WorkerRecord>,
    state: watch::Sender<WorkerState>,
    observer: Arc<dyn LifecycleObserver>,
}

impl Lifecycle {
    fn id(&self) -> Uuid {
        self.record.lock().map(|r| r.id).unwrap_or_default()
    }

    /// Move to `next` if the lifecycle allows it
    fn transition(&self, next: WorkerState) -> NewswResult<()> {
        let mut from = None;
        let changed = self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                *current = next;
                true
            } else {
                from = Some(*current);
                false
            }
        });

        if !changed {
            return Err(NewswError::InvalidTransition {
                from: from.map(|s| s.to_string()).unwrap_or_default(),
                to: next.to_string(),
            });
        }

        if let Ok(mut record) = self.record.lock() {
            record.state = next;
            match next {
                WorkerState::Installed => record.installed_at = Some(Utc::now()),
                WorkerState::Activated => record.activated_at = Some(Utc::now()),
                _ => {}
            }
        }

        let id = self.id();
        debug!("Worker {} is now {}", id, next);
        self.observer.state_changed(id, next);
        Ok(())
    }
}

/// Cloneable handle to a running worker.
///
/// The worker task stops once every handle has been dropped.
#[derive(Clone)]
pub struct WorkerHandle {
    lifecycle: Arc<Lifecycle>,
    install_tx: mpsc::UnboundedSender<InstallEvent>,
    activate_tx: mpsc::UnboundedSender<ActivateEvent>,
    fetch_tx: mpsc::UnboundedSender<FetchEvent>,
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

impl WorkerHandle {
    pub fn id(&self) -> Uuid {
        self.lifecycle.id()
    }

    pub fn state(&self) -> WorkerState {
        *self.lifecycle.state.borrow()
    }

    /// Snapshot of the worker's record, including its current state
    pub fn record(&self) -> NewswResult<WorkerRecord> {
        self.lifecycle
            .record
            .lock()
            .map(|r| r.clone())
            .map_err(|_| NewswError::Internal("worker record lock poisoned".to_string()))
    }

    /// Watch lifecycle state changes
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.lifecycle.state.subscribe()
    }

    /// Dispatch the install event and wait for its outcome
    pub async fn install(&self) -> NewswResult<InstallOutcome> {
        let (respond, rx) = oneshot::channel();
        self.install_tx
            .send(InstallEvent { respond })
            .map_err(|_| self.gone())?;
        rx.await.map_err(|_| self.gone())?
    }

    /// Dispatch the activate event and wait for its outcome
    pub async fn activate(&self) -> NewswResult<ActivateOutcome> {
        let (respond, rx) = oneshot::channel();
        self.activate_tx
            .send(ActivateEvent { respond })
            .map_err(|_| self.gone())?;
        rx.await.map_err(|_| self.gone())?
    }

    /// Intercept a request on behalf of a controlled page.
    ///
    /// `Ok(None)` means the worker had no response to give.
    pub async fn fetch(&self, request: Request) -> NewswResult<Option<Response>> {
        let (respond, rx) = oneshot::channel();
        self.fetch_tx
            .send(FetchEvent { request, respond })
            .map_err(|_| self.gone())?;
        rx.await.map_err(|_| self.gone())?
    }

    /// Retire this worker. Already redundant workers are left as they are.
    pub fn mark_redundant(&self) {
        if self.state() != WorkerState::Redundant {
            if let Err(e) = self.lifecycle.transition(WorkerState::Redundant) {
                warn!("Failed to retire worker {}: {}", self.id(), e);
            }
        }
    }

    fn gone(&self) -> NewswError {
        NewswError::WorkerGone(self.id().to_string())
    }
}

/// Spawns worker event loops
pub struct Worker;

impl Worker {
    /// Start a new worker version in the `parsed` state
    pub fn spawn(scope: WorkerScope, record: WorkerRecord) -> WorkerHandle {
        Self::spawn_in(scope, record, WorkerState::Parsed)
    }

    /// Start a worker that was already activated by an earlier process
    pub fn revive(scope: WorkerScope, record: WorkerRecord) -> WorkerHandle {
        Self::spawn_in(scope, record, WorkerState::Activated)
    }

    fn spawn_in(scope: WorkerScope, mut record: WorkerRecord, initial: WorkerState) -> WorkerHandle {
        record.state = initial;
        let (state, _) = watch::channel(initial);
        let lifecycle = Arc::new(Lifecycle {
            record: Mutex::new(record),
            state,
            observer: scope.observer.clone(),
        });

        let (install_tx, install_rx) = mpsc::unbounded_channel();
        let (activate_tx, activate_rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();

        let event_loop = EventLoop {
            scope: Arc::new(scope),
            lifecycle: lifecycle.clone(),
        };
        tokio::spawn(event_loop.run(install_rx, activate_rx, fetch_rx));

        WorkerHandle {
            lifecycle,
            install_tx,
            activate_tx,
            fetch_tx,
        }
    }
}

struct EventLoop {
    scope: Arc<WorkerScope>,
    lifecycle: Arc<Lifecycle>,
}

impl EventLoop {
    async fn run(
        self,
        mut install_rx: mpsc::UnboundedReceiver<InstallEvent>,
        mut activate_rx: mpsc::UnboundedReceiver<ActivateEvent>,
        mut fetch_rx: mpsc::UnboundedReceiver<FetchEvent>,
    ) {
        loop {
            tokio::select! {
                biased;
                Some(event) = install_rx.recv() => {
                    let result = self.install().await;
                    let _ = event.respond.send(result);
                }
                Some(event) = activate_rx.recv() => {
                    let result = self.activate().await;
                    let _ = event.respond.send(result);
                }
                Some(event) = fetch_rx.recv() => self.dispatch_fetch(event),
                else => break,
            }
        }

        debug!("Worker {} event loop stopped", self.scope.id);
    }

    async fn install(&self) -> NewswResult<InstallOutcome> {
        self.lifecycle.transition(WorkerState::Installing)?;

        match handlers::on_install(&self.scope).await {
            Ok(outcome) => {
                self.lifecycle.transition(WorkerState::Installed)?;
                Ok(outcome)
            }
            Err(e) => {
                warn!("Worker {} install failed: {}", self.scope.id, e);
                let _ = self.lifecycle.transition(WorkerState::Redundant);
                Err(e)
            }
        }
    }

    async fn activate(&self) -> NewswResult<ActivateOutcome> {
        self.lifecycle.transition(WorkerState::Activating)?;

        match handlers::on_activate(&self.scope).await {
            Ok(outcome) => {
                self.lifecycle.transition(WorkerState::Activated)?;
                info!("Worker {} activated", self.scope.id);
                Ok(outcome)
            }
            Err(e) => {
                warn!("Worker {} activation failed: {}", self.scope.id, e);
                let _ = self.lifecycle.transition(WorkerState::Redundant);
                Err(e)
            }
        }
    }

    fn dispatch_fetch(&self, event: FetchEvent) {
        let scope = self.scope.clone();
        let state = *self.lifecycle.state.borrow();

        tokio::spawn(async move {
            let result = match state {
                WorkerState::Activated => handlers::on_fetch(&scope, &event.request).await,
                WorkerState::Redundant => Err(NewswError::WorkerRedundant(scope.id.to_string())),
                _ => Err(NewswError::WorkerNotActive(scope.id.to_string())),
            };
            if event.respond.send(result).is_err() {
                debug!("Requester for {} went away", event.request);
            }
        });
    }
}

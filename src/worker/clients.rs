//! Open pages and the worker controlling each of them

use crate::worker::scheduler::WorkerHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Registry of open pages.
///
/// A page with no controller talks to the network directly. Claiming
/// replaces the controller of every open page at once.
#[derive(Clone, Default)]
pub struct Clients {
    pages: Arc<RwLock<HashMap<Uuid, Option<WorkerHandle>>>>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page, controlled by `controller` from the start if given
    pub async fn add(&self, controller: Option<WorkerHandle>) -> Uuid {
        let id = Uuid::new_v4();
        self.pages.write().await.insert(id, controller);
        id
    }

    /// Remove a closed page
    pub async fn remove(&self, id: Uuid) {
        self.pages.write().await.remove(&id);
    }

    /// The worker controlling a page, if any
    pub async fn controller(&self, id: Uuid) -> Option<WorkerHandle> {
        self.pages.read().await.get(&id).cloned().flatten()
    }

    /// Make `worker` the controller of every open page
    pub async fn claim(&self, worker: &WorkerHandle) -> usize {
        let mut pages = self.pages.write().await;
        for controller in pages.values_mut() {
            *controller = Some(worker.clone());
        }
        pages.len()
    }

    /// Drop control held by the worker `id`
    pub async fn release(&self, id: Uuid) {
        let mut pages = self.pages.write().await;
        for controller in pages.values_mut() {
            if controller.as_ref().is_some_and(|w| w.id() == id) {
                *controller = None;
            }
        }
    }

    /// Number of open pages
    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pages.read().await.is_empty()
    }
}

//! Framework Driver (spec §4.7, REDESIGN FLAGS): the boundary between the
//! scheduler core and the external resource manager. `framework.py`'s
//! module-level singleton driver is replaced with an owned `Driver` value
//! constructed alongside the `Scheduler` it serves; the background
//! `tokio::select!` loop is grounded on
//! `planetary-mesh::node::MeshNode::run_event_loop`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::scheduler::Scheduler;
use crate::types::{Offer, Task, TaskState};

/// Calls the scheduler core makes back out to the resource manager.
/// `launch_tasks`/`decline_offer` answer a specific offer; `kill_task` can
/// fire at any time. Abstracted behind a trait so the scheduler's tests run
/// against an in-memory double instead of a live cluster.
#[async_trait]
pub trait ResourceManagerClient: Send + Sync {
    async fn launch_tasks(&self, offer_id: &str, tasks: Vec<Task>) -> anyhow::Result<()>;
    async fn decline_offer(&self, offer_id: &str) -> anyhow::Result<()>;
    async fn kill_task(&self, task_id: &str) -> anyhow::Result<()>;
}

/// Logs driver calls instead of issuing them. A real deployment swaps this
/// for a client of whatever resource-manager wire protocol is in use
/// (assumed provided externally, per spec §1's scope boundary).
pub struct LoggingResourceManagerClient;

#[async_trait]
impl ResourceManagerClient for LoggingResourceManagerClient {
    async fn launch_tasks(&self, offer_id: &str, tasks: Vec<Task>) -> anyhow::Result<()> {
        for task in &tasks {
            tracing::info!(offer_id, task_id = %task.task_id, host = %task.node_dn, "launching task");
        }
        Ok(())
    }

    async fn decline_offer(&self, offer_id: &str) -> anyhow::Result<()> {
        tracing::debug!(offer_id, "declining offer");
        Ok(())
    }

    async fn kill_task(&self, task_id: &str) -> anyhow::Result<()> {
        tracing::info!(task_id, "killing task");
        Ok(())
    }
}

/// Inbound events the resource manager delivers to the driver. Standing in
/// for Mesos's `resourceOffers`/`statusUpdate`/`registered`/`disconnected`/
/// `offerRescinded`/`error` callbacks. Only `ResourceOffers` and
/// `StatusUpdate` drive queue or cluster mutation; the rest are logged and
/// otherwise ignored.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    ResourceOffers(Vec<Offer>),
    StatusUpdate { task_id: String, state: TaskState },
    Registered { framework_id: String },
    Disconnected,
    Rescinded { offer_id: String },
    Error { message: String },
    Shutdown,
}

/// Owns the background task that drains [`SchedulerEvent`]s into the
/// [`Scheduler`]. One `Driver` per running scheduler process; no global
/// state.
pub struct Driver {
    tx: mpsc::UnboundedSender<SchedulerEvent>,
    handle: JoinHandle<()>,
}

impl Driver {
    pub fn spawn(scheduler: Arc<Scheduler>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SchedulerEvent>();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = rx.recv() => {
                        match event {
                            Some(SchedulerEvent::ResourceOffers(offers)) => {
                                scheduler.on_offers(offers).await;
                            }
                            Some(SchedulerEvent::StatusUpdate { task_id, state }) => {
                                scheduler.on_status(&task_id, state).await;
                            }
                            Some(SchedulerEvent::Registered { framework_id }) => {
                                scheduler.on_registered(&framework_id);
                            }
                            Some(SchedulerEvent::Disconnected) => {
                                scheduler.on_disconnected();
                            }
                            Some(SchedulerEvent::Rescinded { offer_id }) => {
                                scheduler.on_rescinded(&offer_id);
                            }
                            Some(SchedulerEvent::Error { message }) => {
                                scheduler.on_error(&message);
                            }
                            Some(SchedulerEvent::Shutdown) | None => break,
                        }
                    }
                }
            }
        });
        Self { tx, handle }
    }

    pub fn dispatch(&self, event: SchedulerEvent) -> Result<(), anyhow::Error> {
        self.tx
            .send(event)
            .map_err(|e| anyhow::anyhow!("driver event channel closed: {e}"))
    }

    /// Stop the background loop and wait for it to drain. Mirrors
    /// `framework.py`'s graceful-stop path (spec §6.2 exit code 0).
    pub async fn stop(self) {
        let _ = self.tx.send(SchedulerEvent::Shutdown);
        let _ = self.handle.await;
    }
}

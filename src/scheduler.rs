//! Scheduler Core (spec §4.6): the resource-offer-driven bin-packing loop.
//! Grounded on `job_assignment.rs::JobAssignmentService`'s shape (own the
//! trait objects it depends on, expose a handful of orchestration methods)
//! and on `mesos_framework/scheduler.py::resourceOffers` for the per-offer
//! algorithm itself.
//!
//! Failure semantics (spec §9 Open Question, resolved): when placing job K
//! within an offer fails (a disk-service error mid-commit), jobs 1..K-1
//! already committed in this offer are still launched; job K stays queued
//! for the next offer rather than rolling the whole offer back.
//!
//! Kill semantics (REDESIGN FLAG): a node is killed by `id_from(node.dn)`
//! directly, not by substituting the node name into the cluster's dn.

use std::sync::Arc;

use crate::disks::DisksClient;
use crate::matcher::{match_job, resources_from};
use crate::progress::{initialize_cluster_status, update_cluster_progress};
use crate::registry::Registry;
use crate::driver::ResourceManagerClient;
use crate::types::{cluster_dn_from_node_dn, id_from, Cluster, Disk, Job, NodeStatus, Offer, Task, TaskState};
use crate::error::AppError;

pub struct Scheduler {
    queue: crate::queue::JobQueue,
    registry: Arc<dyn Registry>,
    disks: Arc<dyn DisksClient>,
    resource_manager: Arc<dyn ResourceManagerClient>,
    cluster_root: String,
}

impl Scheduler {
    pub fn new(
        registry: Arc<dyn Registry>,
        disks: Arc<dyn DisksClient>,
        resource_manager: Arc<dyn ResourceManagerClient>,
    ) -> Self {
        Self {
            queue: crate::queue::JobQueue::new(),
            registry,
            disks,
            resource_manager,
            cluster_root: "instances".to_string(),
        }
    }

    /// Override the conventional root `<id>`-keyed admission routes resolve
    /// against (default `"instances"`, spec §6.1's `CLUSTER_ROOT` setting).
    pub fn with_cluster_root(mut self, root: impl Into<String>) -> Self {
        self.cluster_root = root.into();
        self
    }

    pub fn cluster_root(&self) -> &str {
        &self.cluster_root
    }

    /// Admit a new cluster submission: persist it `queued`, persist each
    /// node, and enqueue one job per node in submission order.
    pub async fn enqueue(&self, mut cluster: Cluster) -> Result<Cluster, AppError> {
        if cluster.nodes.is_empty() {
            return Err(AppError::Validation("cluster must have at least one node".into()));
        }
        initialize_cluster_status(&mut cluster);
        for node in &mut cluster.nodes {
            node.status = NodeStatus::Queued;
            self.registry.put_node(node).await?;
        }
        self.registry.put_cluster(&cluster).await?;
        self.queue.append(cluster.nodes.iter().map(Job::from_node));
        Ok(cluster)
    }

    /// Admission API entry point (spec §6): the submitted cluster already
    /// exists in the registry under `clusterdn`; fetch it and enqueue it.
    pub async fn submit(&self, clusterdn: &str) -> Result<Cluster, AppError> {
        if clusterdn.trim().is_empty() {
            return Err(AppError::Validation("clusterdn must not be empty".into()));
        }
        let cluster = self.registry.get_cluster(clusterdn).await?;
        self.enqueue(cluster).await
    }

    /// Snapshot of jobs still awaiting placement.
    pub fn pending(&self) -> Vec<Job> {
        self.queue.pending()
    }

    /// Current registry-persisted view of a cluster, including its derived
    /// `status`/`step`/`progress`.
    pub async fn get_cluster(&self, dn: &str) -> Result<Cluster, AppError> {
        Ok(self.registry.get_cluster(dn).await?)
    }

    /// Kill a single node: drop it from the queue if still pending,
    /// otherwise ask the resource manager to kill its running task.
    pub async fn kill_node(&self, node_dn: &str) -> Result<(), AppError> {
        let mut node = self.registry.get_node(node_dn).await?;
        if self.queue.remove_by_dn(node_dn).is_none() && node.status != NodeStatus::Queued {
            self.resource_manager
                .kill_task(id_from(node_dn))
                .await
                .map_err(|e| AppError::Driver(e.to_string()))?;
        }
        node.status = NodeStatus::Failed;
        self.registry.put_node(&node).await?;

        let cluster_dn = cluster_dn_from_node_dn(node_dn);
        if let Ok(mut cluster) = self.registry.get_cluster(cluster_dn).await {
            if let Some(slot) = cluster.nodes.iter_mut().find(|n| n.dn == node_dn) {
                slot.status = NodeStatus::Failed;
            }
            update_cluster_progress(&mut cluster);
            self.registry.put_cluster(&cluster).await?;
        }
        Ok(())
    }

    /// Kill every node of a cluster.
    pub async fn kill_cluster(&self, cluster_dn: &str) -> Result<(), AppError> {
        let cluster = self.registry.get_cluster(cluster_dn).await?;
        for node in &cluster.nodes {
            self.kill_node(&node.dn).await?;
        }
        Ok(())
    }

    /// Purely observational: log the status transition (spec §4.6). Never
    /// mutates queue or cluster state.
    pub async fn on_status(&self, task_id: &str, state: TaskState) {
        if state.is_terminal() {
            tracing::info!(task_id, state = state.as_str(), "task reached terminal state");
        } else {
            tracing::debug!(task_id, state = state.as_str(), "task status update");
        }
    }

    /// Framework (re-)registered with the resource manager. Logging only;
    /// queue and cluster state survive a reconnect untouched.
    pub fn on_registered(&self, framework_id: &str) {
        tracing::info!(framework_id, "framework registered");
    }

    /// Lost contact with the resource manager. Offers in flight will simply
    /// time out; nothing to unwind locally.
    pub fn on_disconnected(&self) {
        tracing::warn!("disconnected from resource manager");
    }

    /// An offer was rescinded before it was acted on. Any job matched
    /// against it already moved past `pending()`'s snapshot and is still
    /// queued, so there is nothing to roll back here.
    pub fn on_rescinded(&self, offer_id: &str) {
        tracing::warn!(offer_id, "offer rescinded");
    }

    /// Unrecoverable driver-level error reported by the resource manager.
    pub fn on_error(&self, message: &str) {
        tracing::error!(message, "resource manager reported an error");
    }

    /// Handle a batch of resource offers, one at a time.
    pub async fn on_offers(&self, offers: Vec<Offer>) {
        for offer in offers {
            self.on_offer(offer).await;
        }
    }

    async fn on_offer(&self, offer: Offer) {
        let mut resources = resources_from(&offer);
        let pending = self.queue.pending();
        let mut tasks = Vec::new();

        for job in pending {
            let mut trial = resources.clone();
            let selected = match match_job(&mut trial, &job) {
                Some(d) => d,
                None => continue,
            };

            match self.commit_disks(&offer, &job, &selected).await {
                Ok(disk_records) => {
                    resources = trial;
                    if self.queue.remove_by_dn(&job.node_dn).is_none() {
                        // raced with a kill; drop the in-flight placement.
                        continue;
                    }
                    let task = Self::task_from(&job, &offer, &disk_records);
                    if let Err(e) = self.persist_placement(&job.node_dn, &offer, &disk_records).await {
                        tracing::error!(node_dn = %job.node_dn, error = %e, "failed to persist placement");
                    }
                    tasks.push(task);
                }
                Err(e) => {
                    tracing::warn!(job = %job.name, offer_id = %offer.id, error = %e, "disk commit failed, leaving job queued");
                }
            }
        }

        let outcome = if tasks.is_empty() {
            self.resource_manager.decline_offer(&offer.id).await
        } else {
            self.resource_manager.launch_tasks(&offer.id, tasks).await
        };
        if let Err(e) = outcome {
            tracing::error!(offer_id = %offer.id, error = %e, "resource manager call failed");
        }
    }

    /// Commit each allocated disk with the disks service, then build its
    /// placed-at-this-node record. Mirrors the offer loop's step (d)+(e)
    /// (spec §4.6): the service is told the *node's* dn, not the cluster's,
    /// and `origin`/`destination` are derived from the disk name's numeric
    /// suffix rather than anything the service returns.
    async fn commit_disks(
        &self,
        offer: &Offer,
        job: &Job,
        selected: &[String],
    ) -> Result<Vec<Disk>, AppError> {
        let mut records = Vec::with_capacity(selected.len());
        for name in selected {
            self.disks
                .set_disk_as_used(&offer.host, &job.node_dn, name)
                .await?;
            records.push(Disk::placed(name, &job.node_dn));
        }
        Ok(records)
    }

    fn task_from(job: &Job, offer: &Offer, disk_records: &[Disk]) -> Task {
        Task {
            task_id: id_from(&job.node_dn).to_string(),
            slave_id: offer.slave_id.clone(),
            name: job.name.clone(),
            node_dn: job.node_dn.clone(),
            cpus: job.cpus,
            mem: job.mem,
            data_disks: disk_records.iter().map(|d| d.name.clone()).collect(),
        }
    }

    async fn persist_placement(
        &self,
        node_dn: &str,
        offer: &Offer,
        disk_records: &[Disk],
    ) -> Result<(), AppError> {
        let mut node = self.registry.get_node(node_dn).await?;
        node.status = NodeStatus::Launching;
        node.slave_id = Some(offer.slave_id.clone());
        node.hostname = Some(offer.host.clone());
        node.offer_id = Some(offer.id.clone());
        node.disk_records = disk_records.to_vec();
        self.registry.put_node(&node).await?;

        let cluster_dn = cluster_dn_from_node_dn(node_dn);
        let mut cluster = self.registry.get_cluster(cluster_dn).await?;
        if let Some(slot) = cluster.nodes.iter_mut().find(|n| n.dn == node_dn) {
            *slot = node;
        }
        update_cluster_progress(&mut cluster);
        self.registry.put_cluster(&cluster).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disks::FakeDisksClient;
    use crate::driver::LoggingResourceManagerClient;
    use crate::registry::InMemoryRegistry;
    use crate::types::{ClusterStatus, DiskSpec, Node};

    fn test_scheduler() -> Scheduler {
        Scheduler::new(
            Arc::new(InMemoryRegistry::new()),
            Arc::new(FakeDisksClient::new()),
            Arc::new(LoggingResourceManagerClient),
        )
    }

    fn node(dn: &str, name: &str, cpu: i64, mem: i64, disks: DiskSpec) -> Node {
        Node {
            dn: dn.to_string(),
            name: name.to_string(),
            cpu,
            mem,
            disks,
            host: None,
            disk_records: vec![],
            status: NodeStatus::Queued,
            slave_id: None,
            hostname: None,
            offer_id: None,
        }
    }

    fn cluster(dn: &str, nodes: Vec<Node>) -> Cluster {
        Cluster {
            dn: dn.to_string(),
            nodes,
            status: ClusterStatus::Queued,
            step: 0,
            progress: 0,
        }
    }

    fn offer(id: &str, host: &str, cpus: i64, mem: i64, disks: &[&str]) -> Offer {
        Offer {
            id: id.to_string(),
            slave_id: format!("slave-{id}"),
            host: host.to_string(),
            cpus,
            mem,
            disks: disks.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn single_node_cluster_fits_in_one_offer() {
        let scheduler = test_scheduler();
        let c = cluster(
            "instances/p/v1/c1",
            vec![node(
                "instances/p/v1/c1/nodes/n1",
                "n1",
                2,
                1024,
                DiskSpec::Count { n: 1 },
            )],
        );
        scheduler.enqueue(c).await.unwrap();
        assert_eq!(scheduler.pending().len(), 1);

        scheduler
            .on_offers(vec![offer("o1", "h1", 4, 4096, &["d1"])])
            .await;

        assert_eq!(scheduler.pending().len(), 0);
        let persisted = scheduler
            .registry
            .get_cluster("instances/p/v1/c1")
            .await
            .unwrap();
        assert_eq!(persisted.status, ClusterStatus::Executing);
        assert_eq!(persisted.nodes[0].status, NodeStatus::Launching);
    }

    #[tokio::test]
    async fn two_nodes_one_offer_one_carries_over() {
        let scheduler = test_scheduler();
        let c = cluster(
            "instances/p/v1/c2",
            vec![
                node(
                    "instances/p/v1/c2/nodes/n1",
                    "n1",
                    4,
                    2048,
                    DiskSpec::Count { n: 0 },
                ),
                node(
                    "instances/p/v1/c2/nodes/n2",
                    "n2",
                    4,
                    2048,
                    DiskSpec::Count { n: 0 },
                ),
            ],
        );
        scheduler.enqueue(c).await.unwrap();

        scheduler
            .on_offers(vec![offer("o1", "h1", 4, 2048, &[])])
            .await;
        assert_eq!(scheduler.pending().len(), 1);

        scheduler
            .on_offers(vec![offer("o2", "h1", 4, 2048, &[])])
            .await;
        assert_eq!(scheduler.pending().len(), 0);
    }

    #[tokio::test]
    async fn disk_service_failure_skips_only_the_failing_job() {
        let fake_disks = FakeDisksClient::new();
        fake_disks.fail_on("d1");
        let scheduler = Scheduler::new(
            Arc::new(InMemoryRegistry::new()),
            Arc::new(fake_disks),
            Arc::new(LoggingResourceManagerClient),
        );

        let c = cluster(
            "instances/p/v1/c3",
            vec![
                node(
                    "instances/p/v1/c3/nodes/n1",
                    "n1",
                    1,
                    128,
                    DiskSpec::Named {
                        names: vec!["d1".into()],
                    },
                ),
                node(
                    "instances/p/v1/c3/nodes/n2",
                    "n2",
                    1,
                    128,
                    DiskSpec::Count { n: 0 },
                ),
            ],
        );
        scheduler.enqueue(c).await.unwrap();

        scheduler
            .on_offers(vec![offer("o1", "h1", 4, 4096, &["d1"])])
            .await;

        // n1 failed its disk commit and stays queued; n2 still launched.
        let pending = scheduler.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].node_dn, "instances/p/v1/c3/nodes/n1");
    }

    #[tokio::test]
    async fn kill_node_removes_it_from_the_queue() {
        let scheduler = test_scheduler();
        let c = cluster(
            "instances/p/v1/c4",
            vec![node(
                "instances/p/v1/c4/nodes/n1",
                "n1",
                1,
                128,
                DiskSpec::Count { n: 0 },
            )],
        );
        scheduler.enqueue(c).await.unwrap();
        scheduler
            .kill_node("instances/p/v1/c4/nodes/n1")
            .await
            .unwrap();
        assert_eq!(scheduler.pending().len(), 0);
        let node = scheduler
            .registry
            .get_node("instances/p/v1/c4/nodes/n1")
            .await
            .unwrap();
        assert_eq!(node.status, NodeStatus::Failed);
    }

    #[tokio::test]
    async fn submit_fetches_the_cluster_from_the_registry_by_dn() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.seed_cluster(cluster(
            "instances/p/v1/c5",
            vec![node(
                "instances/p/v1/c5/nodes/n1",
                "n1",
                1,
                128,
                DiskSpec::Count { n: 0 },
            )],
        ));
        let scheduler = Scheduler::new(
            registry,
            Arc::new(FakeDisksClient::new()),
            Arc::new(LoggingResourceManagerClient),
        );

        let submitted = scheduler.submit("instances/p/v1/c5").await.unwrap();
        assert_eq!(submitted.status, ClusterStatus::Queued);
        assert_eq!(scheduler.pending().len(), 1);
    }

    #[tokio::test]
    async fn submit_unknown_dn_is_not_found() {
        let scheduler = test_scheduler();
        let err = scheduler.submit("instances/p/v1/missing").await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }
}

//! Core data model: clusters, nodes, disks, jobs and the matcher's view of
//! an offer. Mirrors the entities described in the registry's KV schema
//! (`instances/<product>/<version>/<id>/nodes/<name>`).

use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`Cluster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    Queued,
    Launching,
    Executing,
    Failed,
}

/// Placement status of a single [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Queued,
    Launching,
    Running,
    Failed,
}

/// A submitted multi-node service instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub dn: String,
    pub nodes: Vec<Node>,
    pub status: ClusterStatus,
    pub step: u32,
    pub progress: u32,
}

impl Cluster {
    /// Last path segment of `dn`.
    pub fn id(&self) -> &str {
        id_from(&self.dn)
    }
}

/// One member of a [`Cluster`], and the unit of placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub dn: String,
    pub name: String,
    pub cpu: i64,
    pub mem: i64,
    pub disks: DiskSpec,
    pub host: Option<String>,
    pub disk_records: Vec<Disk>,
    pub status: NodeStatus,
    pub slave_id: Option<String>,
    pub hostname: Option<String>,
    pub offer_id: Option<String>,
}

impl Node {
    pub fn id(&self) -> &str {
        id_from(&self.dn)
    }
}

/// Either "any N disks" or "these specific named disks".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DiskSpec {
    Count { n: usize },
    Named { names: Vec<String> },
}

/// Per-node disk record, populated at placement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub name: String,
    pub mesos_name: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub mode: Option<String>,
}

impl Disk {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mesos_name: None,
            origin: None,
            destination: None,
            mode: None,
        }
    }

    /// Build the disk record assigned to a node at placement time (spec
    /// §3): `origin = destination = "/data/<N>/<node-id>"`, where `N` is
    /// the numeric suffix of the disk name.
    pub fn placed(name: &str, node_dn: &str) -> Self {
        let suffix: String = name.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
        let suffix: String = suffix.chars().rev().collect();
        let path = format!("/data/{}/{}", suffix, id_from(node_dn));
        Self {
            name: name.to_string(),
            mesos_name: Some(name.to_string()),
            origin: Some(path.clone()),
            destination: Some(path),
            mode: None,
        }
    }
}

/// The queued representation of a [`Node`] ready to place. Carries the
/// node's `dn` rather than a borrow of the `Node` itself, so it can sit in
/// the queue across the async boundary between enqueue and offer handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub cpus: i64,
    pub mem: i64,
    pub disks: DiskSpec,
    pub host: Option<String>,
    pub node_dn: String,
    pub slave_id: Option<String>,
    pub hostname: Option<String>,
    pub offer_id: Option<String>,
}

impl Job {
    pub fn from_node(node: &Node) -> Self {
        Self {
            name: format!("{}_{}", node.id(), node.name),
            cpus: node.cpu,
            mem: node.mem,
            disks: node.disks.clone(),
            host: node.host.clone(),
            node_dn: node.dn.clone(),
            slave_id: None,
            hostname: None,
            offer_id: None,
        }
    }
}

/// The matcher's view of an offer: mutable during a single offer-handling
/// pass, consumed as jobs are placed against it.
#[derive(Debug, Clone)]
pub struct Resources {
    pub host: String,
    pub cpus: i64,
    pub mem: i64,
    pub disks: Vec<String>,
}

/// A resource offer from the resource manager. Opaque beyond this shape —
/// the wire format that produces it is a Non-goal (assumed provided by a
/// client library).
#[derive(Debug, Clone)]
pub struct Offer {
    pub id: String,
    pub slave_id: String,
    pub host: String,
    pub cpus: i64,
    pub mem: i64,
    pub disks: Vec<String>,
}

/// The launch descriptor sent back for a placed [`Job`].
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub task_id: String,
    pub slave_id: String,
    pub name: String,
    pub node_dn: String,
    pub cpus: i64,
    pub mem: i64,
    pub data_disks: Vec<String>,
}

/// Terminal and non-terminal task states surfaced by the resource manager.
/// Purely observational in the core (spec §4.6): recognized for structured
/// logging only, never fed back into queue or cluster mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Staging,
    Starting,
    Running,
    Finished,
    Failed,
    Killed,
    Lost,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Staging => "STAGING",
            TaskState::Starting => "STARTING",
            TaskState::Running => "RUNNING",
            TaskState::Finished => "FINISHED",
            TaskState::Failed => "FAILED",
            TaskState::Killed => "KILLED",
            TaskState::Lost => "LOST",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Finished | TaskState::Failed | TaskState::Killed | TaskState::Lost
        )
    }
}

/// Last path segment of a `/`-separated distinguished name.
pub fn id_from(dn: &str) -> &str {
    dn.rsplit('/').next().unwrap_or(dn)
}

/// Strip a node's `/nodes/<name>` suffix to recover its owning cluster's dn.
pub fn cluster_dn_from_node_dn(node_dn: &str) -> &str {
    match node_dn.rfind("/nodes/") {
        Some(idx) => &node_dn[..idx],
        None => node_dn,
    }
}

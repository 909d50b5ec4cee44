//! Job Queue (spec §4.1): the pending, not-yet-placed [`Job`]s. A single
//! mutex guards a `VecDeque`, matching `planetary-mesh::node::MeshNode`'s
//! `Arc<Mutex<VecDeque<MeshJob>>>` shape; `storage.rs::InMemoryStore` is the
//! model for the snapshot-then-mutate access pattern used here.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::types::Job;

/// FIFO queue of jobs awaiting placement. Queue order is the tie-break used
/// by the matcher (spec §4.2): earlier-enqueued jobs are offered resources
/// first.
#[derive(Default)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<Job>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue every node of a cluster, in cluster order.
    pub fn append(&self, jobs: impl IntoIterator<Item = Job>) {
        let mut guard = self.jobs.lock().unwrap();
        guard.extend(jobs);
    }

    /// Remove a single job by its node dn, if present.
    pub fn remove_by_dn(&self, node_dn: &str) -> Option<Job> {
        let mut guard = self.jobs.lock().unwrap();
        let pos = guard.iter().position(|j| j.node_dn == node_dn)?;
        guard.remove(pos)
    }

    /// Remove every queued job belonging to a cluster id (first path segment
    /// after the cluster root, matched by dn prefix).
    pub fn remove_cluster(&self, cluster_dn: &str) -> Vec<Job> {
        let mut guard = self.jobs.lock().unwrap();
        let mut removed = Vec::new();
        let mut i = 0;
        while i < guard.len() {
            if guard[i].node_dn.starts_with(cluster_dn) {
                removed.push(guard.remove(i).unwrap());
            } else {
                i += 1;
            }
        }
        removed
    }

    /// A point-in-time snapshot of pending jobs, in queue order. Held only
    /// long enough to clone out; the lock is never carried into matching or
    /// I/O.
    pub fn pending(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Progress Tracker (spec §4.5): derives a [`Cluster`]'s `step`, `progress`
//! and `status` from its nodes' placement state. Grounded on
//! `mesos_framework/utils.py::update_cluster_progress`, with the swapped
//! launching/executing labels corrected per spec's REDESIGN FLAG — here
//! `executing` is only reached once every node has been placed.

use crate::types::{Cluster, ClusterStatus, NodeStatus};

/// Status and progress for a freshly-submitted cluster, before any node has
/// been offered resources.
pub fn initialize_cluster_status(cluster: &mut Cluster) {
    cluster.step = 0;
    cluster.progress = 0;
    cluster.status = ClusterStatus::Queued;
}

/// Recompute `step`, `progress` and `status` from the current placement
/// state of `cluster.nodes`. `step` counts nodes that are no longer queued
/// (placed or failed); `progress` is that count as a percentage of the
/// total. `status` is:
///   - `Failed`  if any node has failed
///   - `Executing` only once `step == nodes.len()` (every node placed)
///   - `Launching` once at least one node has left `Queued` but placement
///     is not yet complete
///   - `Queued` otherwise
pub fn update_cluster_progress(cluster: &mut Cluster) {
    let total = cluster.nodes.len();
    let step = cluster
        .nodes
        .iter()
        .filter(|n| n.status != NodeStatus::Queued)
        .count();
    let any_failed = cluster.nodes.iter().any(|n| n.status == NodeStatus::Failed);

    cluster.step = step as u32;
    cluster.progress = if total == 0 {
        0
    } else {
        (step as u32 * 100) / total as u32
    };

    cluster.status = if any_failed {
        ClusterStatus::Failed
    } else if total > 0 && step == total {
        ClusterStatus::Executing
    } else if step > 0 {
        ClusterStatus::Launching
    } else {
        ClusterStatus::Queued
    };
}

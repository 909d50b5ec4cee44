use std::sync::Arc;

use cluster_scheduler::disks::FakeDisksClient;
use cluster_scheduler::driver::LoggingResourceManagerClient;
use cluster_scheduler::registry::InMemoryRegistry;
use cluster_scheduler::scheduler::Scheduler;
use cluster_scheduler::types::{Cluster, ClusterStatus, DiskSpec, Node, NodeStatus, Offer};

fn node(dn: &str, name: &str, cpu: i64, mem: i64, disks: DiskSpec, host: Option<&str>) -> Node {
    Node {
        dn: dn.to_string(),
        name: name.to_string(),
        cpu,
        mem,
        disks,
        host: host.map(String::from),
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

fn scheduler() -> Scheduler {
    Scheduler::new(
        Arc::new(InMemoryRegistry::new()),
        Arc::new(FakeDisksClient::new()),
        Arc::new(LoggingResourceManagerClient),
    )
}

// spec §8 scenario: host-affinity mismatch leaves the job queued even when
// an unrelated offer has ample capacity.
#[tokio::test]
async fn host_pinned_job_waits_for_the_right_host() {
    let scheduler = scheduler();
    let c = cluster(
        "instances/p/v1/c1",
        vec![node(
            "instances/p/v1/c1/nodes/n1",
            "n1",
            1,
            128,
            DiskSpec::Count { n: 0 },
            Some("pinned-host"),
        )],
    );
    scheduler.enqueue(c).await.unwrap();

    scheduler
        .on_offers(vec![offer("o1", "other-host", 8, 8192, &[])])
        .await;
    assert_eq!(scheduler.pending().len(), 1);

    scheduler
        .on_offers(vec![offer("o2", "pinned-host", 8, 8192, &[])])
        .await;
    assert_eq!(scheduler.pending().len(), 0);
}

// spec §8 scenario: named-disk requirement that the offer cannot satisfy.
#[tokio::test]
async fn named_disk_mismatch_leaves_job_queued() {
    let scheduler = scheduler();
    let c = cluster(
        "instances/p/v1/c2",
        vec![node(
            "instances/p/v1/c2/nodes/n1",
            "n1",
            1,
            128,
            DiskSpec::Named {
                names: vec!["ssd-1".into()],
            },
            None,
        )],
    );
    scheduler.enqueue(c).await.unwrap();

    scheduler
        .on_offers(vec![offer("o1", "h1", 8, 8192, &["ssd-2"])])
        .await;
    assert_eq!(scheduler.pending().len(), 1);

    scheduler
        .on_offers(vec![offer("o2", "h1", 8, 8192, &["ssd-1"])])
        .await;
    assert_eq!(scheduler.pending().len(), 0);
}

// spec §8 scenario: whole-cluster kill drops every member node from the
// queue and marks each failed in the registry.
#[tokio::test]
async fn killing_a_cluster_drops_all_its_queued_nodes() {
    let scheduler = scheduler();
    let c = cluster(
        "instances/p/v1/c3",
        vec![
            node(
                "instances/p/v1/c3/nodes/n1",
                "n1",
                1,
                128,
                DiskSpec::Count { n: 0 },
                None,
            ),
            node(
                "instances/p/v1/c3/nodes/n2",
                "n2",
                1,
                128,
                DiskSpec::Count { n: 0 },
                None,
            ),
        ],
    );
    scheduler.enqueue(c).await.unwrap();
    assert_eq!(scheduler.pending().len(), 2);

    scheduler.kill_cluster("instances/p/v1/c3").await.unwrap();
    assert_eq!(scheduler.pending().len(), 0);
}

// spec §8 scenario: a cluster only reaches `executing` once every node has
// been placed, not as soon as the first node lands (REDESIGN FLAG).
#[tokio::test]
async fn cluster_status_tracks_partial_then_full_placement() {
    let scheduler = scheduler();
    let c = cluster(
        "instances/p/v1/c4",
        vec![
            node(
                "instances/p/v1/c4/nodes/n1",
                "n1",
                2,
                1024,
                DiskSpec::Count { n: 0 },
                None,
            ),
            node(
                "instances/p/v1/c4/nodes/n2",
                "n2",
                2,
                1024,
                DiskSpec::Count { n: 0 },
                None,
            ),
        ],
    );
    scheduler.enqueue(c).await.unwrap();

    scheduler
        .on_offers(vec![offer("o1", "h1", 2, 1024, &[])])
        .await;
    let after_first = scheduler
        .pending()
        .iter()
        .map(|j| j.node_dn.clone())
        .collect::<Vec<_>>();
    assert_eq!(after_first, vec!["instances/p/v1/c4/nodes/n2".to_string()]);
    let mid = scheduler.get_cluster("instances/p/v1/c4").await.unwrap();
    assert_eq!(mid.status, ClusterStatus::Launching);
    assert_eq!(mid.progress, 50);

    scheduler
        .on_offers(vec![offer("o2", "h1", 2, 1024, &[])])
        .await;
    assert!(scheduler.pending().is_empty());
    let done = scheduler.get_cluster("instances/p/v1/c4").await.unwrap();
    assert_eq!(done.status, ClusterStatus::Executing);
    assert_eq!(done.progress, 100);
}

//! Registry Client (spec §4.3): typed read/write access to cluster/node
//! entities held in an external KV store, addressed by dn path. Grounded on
//! `reputation_client.rs`'s reqwest-against-an-external-service shape, and
//! on `storage.rs::InMemoryStore`'s `RwLock<HashMap<..>>` test double.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{id_from, Cluster, Node};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("no entity at key {0}")]
    NotFound(String),
    #[error("registry transport error: {0}")]
    Transport(String),
    #[error("registry decode error: {0}")]
    Decode(String),
}

/// Read/write access to clusters and nodes addressed by dn.
///
/// Writes are observable to other readers immediately per-key (spec §4.3);
/// the core never relies on cross-entity atomicity.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn get_cluster(&self, dn: &str) -> Result<Cluster, RegistryError>;
    async fn put_cluster(&self, cluster: &Cluster) -> Result<(), RegistryError>;
    async fn get_node(&self, dn: &str) -> Result<Node, RegistryError>;
    async fn put_node(&self, node: &Node) -> Result<(), RegistryError>;
}

/// Last path segment of `dn` — the conventional entity id.
pub fn id_from_dn(dn: &str) -> &str {
    id_from(dn)
}

/// Reverse lookup: build the conventional dn for an id under `root`.
pub fn dn_from_id(root: &str, id: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), id)
}

/// HTTP-backed registry client over a Consul-style `/v1/kv` endpoint.
pub struct HttpRegistryClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRegistryClient {
    pub fn connect(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url_for(&self, dn: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), dn.trim_start_matches('/'))
    }
}

#[async_trait]
impl Registry for HttpRegistryClient {
    async fn get_cluster(&self, dn: &str) -> Result<Cluster, RegistryError> {
        let resp = self
            .client
            .get(self.url_for(dn))
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(dn.to_string()));
        }
        resp.json::<Cluster>()
            .await
            .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    async fn put_cluster(&self, cluster: &Cluster) -> Result<(), RegistryError> {
        let resp = self
            .client
            .put(self.url_for(&cluster.dn))
            .json(cluster)
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(RegistryError::Transport(format!(
                "unexpected status {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn get_node(&self, dn: &str) -> Result<Node, RegistryError> {
        let resp = self
            .client
            .get(self.url_for(dn))
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(dn.to_string()));
        }
        resp.json::<Node>()
            .await
            .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    async fn put_node(&self, node: &Node) -> Result<(), RegistryError> {
        let resp = self
            .client
            .put(self.url_for(&node.dn))
            .json(node)
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(RegistryError::Transport(format!(
                "unexpected status {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// In-memory registry used by the scheduler's own test suite.
#[derive(Default)]
pub struct InMemoryRegistry {
    clusters: RwLock<HashMap<String, Cluster>>,
    nodes: RwLock<HashMap<String, Node>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_cluster(&self, cluster: Cluster) {
        for node in &cluster.nodes {
            self.nodes
                .write()
                .unwrap()
                .insert(node.dn.clone(), node.clone());
        }
        self.clusters
            .write()
            .unwrap()
            .insert(cluster.dn.clone(), cluster);
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn get_cluster(&self, dn: &str) -> Result<Cluster, RegistryError> {
        self.clusters
            .read()
            .unwrap()
            .get(dn)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(dn.to_string()))
    }

    async fn put_cluster(&self, cluster: &Cluster) -> Result<(), RegistryError> {
        self.clusters
            .write()
            .unwrap()
            .insert(cluster.dn.clone(), cluster.clone());
        Ok(())
    }

    async fn get_node(&self, dn: &str) -> Result<Node, RegistryError> {
        self.nodes
            .read()
            .unwrap()
            .get(dn)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(dn.to_string()))
    }

    async fn put_node(&self, node: &Node) -> Result<(), RegistryError> {
        self.nodes
            .write()
            .unwrap()
            .insert(node.dn.clone(), node.clone());
        Ok(())
    }
}

//! Disks Client (spec §4.4): allocate/release disks via an external HTTP
//! service. Grounded on `reputation_client.rs`'s GET/PUT-against-a-service
//! pattern, with a bounded timeout per spec §5.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum DiskServiceError {
    #[error("disks service request timed out or could not be reached: {0}")]
    Transport(String),
    #[error("disks service returned unexpected status {0}")]
    Status(u16),
    #[error("disks service response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiskInfo {
    pub path: String,
    pub mode: String,
}

#[async_trait]
pub trait DisksClient: Send + Sync {
    async fn get_disk_info(&self, host: &str, disk: &str) -> Result<DiskInfo, DiskServiceError>;
    async fn set_disk_as_used(
        &self,
        host: &str,
        clustername: &str,
        disk: &str,
    ) -> Result<(), DiskServiceError>;
}

pub struct HttpDisksClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDisksClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("disks http client"),
        }
    }

    fn disk_url(&self, host: &str, disk: &str) -> String {
        format!("{}/{}/disks/{}", self.base_url.trim_end_matches('/'), host, disk)
    }
}

#[async_trait]
impl DisksClient for HttpDisksClient {
    async fn get_disk_info(&self, host: &str, disk: &str) -> Result<DiskInfo, DiskServiceError> {
        let resp = self
            .client
            .get(self.disk_url(host, disk))
            .send()
            .await
            .map_err(|e| DiskServiceError::Transport(e.to_string()))?;
        if resp.status() != reqwest::StatusCode::OK {
            return Err(DiskServiceError::Status(resp.status().as_u16()));
        }
        let mut body: std::collections::HashMap<String, DiskInfo> = resp
            .json()
            .await
            .map_err(|e| DiskServiceError::Decode(e.to_string()))?;
        body.remove(disk)
            .ok_or_else(|| DiskServiceError::Decode(format!("missing key {disk} in response")))
    }

    async fn set_disk_as_used(
        &self,
        host: &str,
        clustername: &str,
        disk: &str,
    ) -> Result<(), DiskServiceError> {
        let payload = [
            ("status", "used"),
            ("clustername", clustername),
            ("node", host),
        ];
        let resp = self
            .client
            .put(self.disk_url(host, disk))
            .form(&payload)
            .send()
            .await
            .map_err(|e| DiskServiceError::Transport(e.to_string()))?;
        if resp.status() != reqwest::StatusCode::NO_CONTENT {
            return Err(DiskServiceError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}

/// In-memory test double. `failing_disks` lets tests simulate a
/// disks-service failure on specific disk names (spec §8 scenario 5).
#[derive(Default)]
pub struct FakeDisksClient {
    failing_disks: std::sync::Mutex<std::collections::HashSet<String>>,
    used: std::sync::Mutex<Vec<(String, String, String)>>,
}

impl FakeDisksClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, disk: impl Into<String>) {
        self.failing_disks.lock().unwrap().insert(disk.into());
    }

    pub fn used_calls(&self) -> Vec<(String, String, String)> {
        self.used.lock().unwrap().clone()
    }
}

#[async_trait]
impl DisksClient for FakeDisksClient {
    async fn get_disk_info(&self, _host: &str, disk: &str) -> Result<DiskInfo, DiskServiceError> {
        Ok(DiskInfo {
            path: format!("/data/{disk}"),
            mode: "rw".to_string(),
        })
    }

    async fn set_disk_as_used(
        &self,
        host: &str,
        clustername: &str,
        disk: &str,
    ) -> Result<(), DiskServiceError> {
        if self.failing_disks.lock().unwrap().contains(disk) {
            return Err(DiskServiceError::Status(500));
        }
        self.used
            .lock()
            .unwrap()
            .push((host.to_string(), clustername.to_string(), disk.to_string()));
        Ok(())
    }
}

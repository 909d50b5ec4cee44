//! Admission API (spec §6): the HTTP surface clients use to submit, list
//! and kill clusters. Grounded on `icn-mesh-jobs/src/main.rs`'s axum
//! `Router`/`Extension`/`Json` wiring, with `endpoints.py`'s route shapes
//! (`POST /clusters`, `DELETE /clusters/<id>`, `GET /clusters`) carried
//! over literally, under a versioned prefix.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::registry::dn_from_id;
use crate::scheduler::Scheduler;

pub fn router(scheduler: Arc<Scheduler>) -> Router {
    Router::new()
        .route("/v1/clusters", post(submit_cluster).get(list_pending))
        .route("/v1/clusters/:id", delete(kill_cluster))
        .layer(Extension(scheduler))
}

/// The cluster itself is assumed already written to the registry (by
/// whatever external system composed it); admission only needs its dn.
#[derive(Debug, Deserialize, Serialize)]
pub struct SubmitClusterRequest {
    pub clusterdn: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitClusterResponse {
    pub message: String,
    pub url: String,
}

async fn submit_cluster(
    Extension(scheduler): Extension<Arc<Scheduler>>,
    Json(req): Json<SubmitClusterRequest>,
) -> Result<Json<SubmitClusterResponse>, AppError> {
    let cluster = scheduler.submit(&req.clusterdn).await?;
    Ok(Json(SubmitClusterResponse {
        message: "Service instance queued".to_string(),
        url: format!("/clusters/{}", cluster.id()),
    }))
}

#[derive(Debug, Serialize)]
pub struct PendingJobsResponse {
    pub queued_tasks: Vec<crate::types::Job>,
}

async fn list_pending(
    Extension(scheduler): Extension<Arc<Scheduler>>,
) -> Json<PendingJobsResponse> {
    Json(PendingJobsResponse {
        queued_tasks: scheduler.pending(),
    })
}

/// `<id>` is the cluster's short id (last dn segment); `dn_from_id` resolves
/// it back to the full dn within the configured conventional root, mirroring
/// the registry's `id_from(dn)`/`dn_from(id)` bijection (spec §6).
async fn kill_cluster(
    Extension(scheduler): Extension<Arc<Scheduler>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let dn = dn_from_id(scheduler.cluster_root(), &id);
    scheduler.kill_cluster(&dn).await?;
    Ok(StatusCode::NO_CONTENT)
}

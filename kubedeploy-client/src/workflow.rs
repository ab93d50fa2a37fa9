//! Orchestration workflow
//!
//! Submits a deploy form as two dependent remote calls: the workload first,
//! then (if requested) the endpoint exposing it. There is no rollback. When
//! the endpoint call fails the workload stays in place and the error says so.
//!
//! Every mutation marks the affected collections stale once it succeeds.

use crate::api::ResourceApi;
use crate::error::{ApiError, ApiResult};
use crate::sync::{ResourceKind, ResourceSync};
use kubedeploy_common::health::{scaled_replicas, ScaleDirection};
use kubedeploy_common::transform::{
    build_endpoint_request, build_pod_request, build_workload_request, DeploymentForm,
};
use kubedeploy_common::{EndpointSummary, Pod, WorkloadSummary};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Shown when the backend gives no reason of its own
pub const DEPLOY_FAILED: &str = "Failed to create deployment";

/// Step of the deploy workflow that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStage {
    Workload,
    Endpoint,
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workload => write!(f, "deployment"),
            Self::Endpoint => write!(f, "service"),
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct DeploymentError {
    pub stage: DeploymentStage,
    /// User-facing text: the backend's message verbatim, or a generic fallback
    pub message: String,
    #[source]
    pub source: ApiError,
}

impl DeploymentError {
    fn new(stage: DeploymentStage, source: ApiError) -> Self {
        Self {
            stage,
            message: source.user_message(DEPLOY_FAILED),
            source,
        }
    }

    /// The workload was created before the failure
    pub fn is_partial(&self) -> bool {
        self.stage == DeploymentStage::Endpoint
    }
}

/// Resources created by a successful deploy
#[derive(Debug, Clone)]
pub struct DeploymentOutcome {
    pub workload: WorkloadSummary,
    pub endpoint: Option<EndpointSummary>,
}

/// Mutating operations, each followed by cache invalidation
#[derive(Clone)]
pub struct Workflow {
    api: Arc<dyn ResourceApi>,
    sync: ResourceSync,
}

impl Workflow {
    pub fn new(api: Arc<dyn ResourceApi>, sync: ResourceSync) -> Self {
        Self { api, sync }
    }

    /// Create the workload, then its endpoint
    ///
    /// Nothing is sent for the endpoint when the workload call fails. The
    /// endpoint derives its name and selector from the submitted workload name,
    /// not from whatever the backend echoes back.
    pub async fn submit_deployment(&self, form: &DeploymentForm) -> Result<DeploymentOutcome, DeploymentError> {
        let spec = build_workload_request(form);
        info!(
            namespace = %spec.namespace,
            name = %spec.name,
            image = %spec.image,
            replicas = spec.replicas,
            "creating deployment"
        );

        let workload = self
            .api
            .create_workload(&spec)
            .await
            .map_err(|e| {
                warn!(name = %spec.name, error = %e, "deployment creation failed");
                DeploymentError::new(DeploymentStage::Workload, e)
            })?;
        self.sync.invalidate(ResourceKind::Workloads);

        let endpoint = if form.create_endpoint {
            let endpoint_spec = build_endpoint_request(form, &spec.name);
            info!(
                namespace = %endpoint_spec.namespace,
                name = %endpoint_spec.name,
                exposure = %endpoint_spec.exposure,
                "creating service"
            );

            let created = self
                .api
                .create_endpoint(&endpoint_spec)
                .await
                .map_err(|e| {
                    warn!(
                        name = %endpoint_spec.name,
                        deployment = %spec.name,
                        error = %e,
                        "service creation failed, deployment left in place"
                    );
                    DeploymentError::new(DeploymentStage::Endpoint, e)
                })?;
            Some(created)
        } else {
            None
        };
        self.sync.invalidate(ResourceKind::Endpoints);

        Ok(DeploymentOutcome { workload, endpoint })
    }

    /// Single-pod quick deploy
    pub async fn submit_pod(&self, form: &DeploymentForm) -> ApiResult<Pod> {
        let request = build_pod_request(form);
        info!(namespace = %request.namespace, name = %request.name, "creating pod");

        let pod = self.api.create_pod(&request).await?;
        self.sync.invalidate(ResourceKind::Pods);
        Ok(pod)
    }

    pub async fn delete_workload(&self, namespace: &str, name: &str) -> ApiResult<()> {
        self.api.delete_workload(namespace, name).await?;
        info!(namespace, name, "deployment deleted");
        self.sync.invalidate(ResourceKind::Workloads);
        Ok(())
    }

    /// One-step scale from the displayed replica count; returns the new target
    pub async fn scale_workload(&self, workload: &WorkloadSummary, direction: ScaleDirection) -> ApiResult<u32> {
        let target = scaled_replicas(workload.replicas, direction);
        self.scale_workload_to(&workload.namespace, &workload.name, target)
            .await?;
        Ok(target)
    }

    pub async fn scale_workload_to(&self, namespace: &str, name: &str, replicas: u32) -> ApiResult<()> {
        self.api.scale_workload(namespace, name, replicas).await?;
        info!(namespace, name, replicas, "deployment scaled");
        self.sync.invalidate(ResourceKind::Workloads);
        Ok(())
    }

    pub async fn delete_endpoint(&self, namespace: &str, name: &str) -> ApiResult<()> {
        self.api.delete_endpoint(namespace, name).await?;
        info!(namespace, name, "service deleted");
        self.sync.invalidate(ResourceKind::Endpoints);
        Ok(())
    }

    pub async fn delete_pod(&self, namespace: &str, name: &str) -> ApiResult<()> {
        self.api.delete_pod(namespace, name).await?;
        info!(namespace, name, "pod deleted");
        self.sync.invalidate(ResourceKind::Pods);
        Ok(())
    }
}

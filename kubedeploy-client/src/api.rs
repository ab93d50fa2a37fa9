//! Remote resource client
//!
//! `ResourceApi` is the seam between the console and the backend: the HTTP
//! implementation talks to the real service, tests plug in an in-memory one.

use crate::error::{ApiError, ApiResult};
use crate::session::SessionContext;
use async_trait::async_trait;
use kubedeploy_common::auth::{AuthResponse, LoginRequest, SignupRequest, User};
use kubedeploy_common::{
    ApiResponse, EndpointSpec, EndpointSummary, Pod, PodCreateRequest, PodLogs, WorkloadSpec,
    WorkloadSummary,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Log lines fetched when the caller does not ask for a specific tail
pub const DEFAULT_LOG_TAIL: u32 = 100;

/// Operations the backend exposes for each resource collection
#[async_trait]
pub trait ResourceApi: Send + Sync {
    // Workloads
    async fn list_workloads(&self, namespace: Option<&str>) -> ApiResult<Vec<WorkloadSummary>>;
    async fn get_workload(&self, namespace: &str, name: &str) -> ApiResult<WorkloadSummary>;
    async fn create_workload(&self, spec: &WorkloadSpec) -> ApiResult<WorkloadSummary>;
    async fn delete_workload(&self, namespace: &str, name: &str) -> ApiResult<()>;
    async fn scale_workload(&self, namespace: &str, name: &str, replicas: u32) -> ApiResult<()>;

    // Endpoints
    async fn list_endpoints(&self, namespace: Option<&str>) -> ApiResult<Vec<EndpointSummary>>;
    async fn get_endpoint(&self, namespace: &str, name: &str) -> ApiResult<EndpointSummary>;
    async fn create_endpoint(&self, spec: &EndpointSpec) -> ApiResult<EndpointSummary>;
    async fn delete_endpoint(&self, namespace: &str, name: &str) -> ApiResult<()>;

    // Pods
    async fn list_pods(&self, namespace: Option<&str>) -> ApiResult<Vec<Pod>>;
    async fn get_pod(&self, namespace: &str, name: &str) -> ApiResult<Pod>;
    async fn create_pod(&self, request: &PodCreateRequest) -> ApiResult<Pod>;
    async fn delete_pod(&self, namespace: &str, name: &str) -> ApiResult<()>;
    async fn pod_logs(&self, namespace: &str, name: &str, tail: Option<u32>) -> ApiResult<String>;

    async fn list_namespaces(&self) -> ApiResult<Vec<String>>;

    // Authentication
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse>;
    async fn signup(&self, request: &SignupRequest) -> ApiResult<AuthResponse>;
    async fn current_user(&self) -> ApiResult<User>;
}

/// Decode a backend envelope
///
/// Returns the payload of a successful envelope. Anything else becomes an
/// error carrying the backend's own message when it sent one.
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> ApiResult<Option<T>> {
    if status.is_success() {
        let envelope: ApiResponse<T> = serde_json::from_str(body)?;
        if envelope.success {
            return Ok(envelope.data);
        }
        let message = envelope
            .failure_message()
            .map(str::to_string)
            .unwrap_or_else(|| reason(status));
        return Err(ApiError::rejected(status.as_u16(), message));
    }

    // Error bodies are decoded loosely; their data shape is irrelevant
    let message = match serde_json::from_str::<ApiResponse<serde_json::Value>>(body) {
        Ok(envelope) => envelope.failure_message().map(str::to_string),
        Err(_) if !body.trim().is_empty() => Some(body.trim().to_string()),
        Err(_) => None,
    }
    .unwrap_or_else(|| reason(status));

    if status == StatusCode::UNAUTHORIZED {
        Err(ApiError::unauthorized(message))
    } else {
        Err(ApiError::rejected(status.as_u16(), message))
    }
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

/// `/{collection}/{namespace}/{name}` with both segments escaped
fn resource_path(collection: &str, namespace: &str, name: &str) -> String {
    format!(
        "/{}/{}/{}",
        collection,
        urlencoding::encode(namespace),
        urlencoding::encode(name)
    )
}

/// Collection path, filtered by namespace when one is given
fn collection_path(collection: &str, namespace: Option<&str>) -> String {
    match namespace.filter(|ns| !ns.is_empty()) {
        Some(ns) => format!("/{}?namespace={}", collection, urlencoding::encode(ns)),
        None => format!("/{}", collection),
    }
}

/// HTTP implementation of [`ResourceApi`]
#[derive(Clone)]
pub struct HttpResourceClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl HttpResourceClient {
    pub fn new(base_url: &str, session: SessionContext, timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Build headers for requests; the bearer token is read fresh each time
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.session.token() {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url).headers(self.headers())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &str,
    ) -> ApiResult<Option<T>> {
        let response = builder.send().await.map_err(|e| {
            warn!(operation, error = %e, "request failed");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        debug!(operation, status = status.as_u16(), "response received");

        match decode_envelope(status, &body) {
            Err(err @ ApiError::Unauthorized { .. }) => {
                self.session.expire();
                Err(err)
            }
            Err(err) => {
                warn!(operation, error = %err, "request rejected");
                Err(err)
            }
            ok => ok,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder, operation: &str) -> ApiResult<T> {
        self.execute(builder, operation)
            .await?
            .ok_or(ApiError::EmptyPayload)
    }

    async fn send<B: Serialize + ?Sized>(&self, builder: RequestBuilder, body: Option<&B>, operation: &str) -> ApiResult<()> {
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };
        self.execute::<serde_json::Value>(builder, operation)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ResourceApi for HttpResourceClient {
    async fn list_workloads(&self, namespace: Option<&str>) -> ApiResult<Vec<WorkloadSummary>> {
        let req = self.request(Method::GET, &collection_path("deployments", namespace));
        Ok(self.execute(req, "list_workloads").await?.unwrap_or_default())
    }

    async fn get_workload(&self, namespace: &str, name: &str) -> ApiResult<WorkloadSummary> {
        let req = self.request(Method::GET, &resource_path("deployments", namespace, name));
        self.fetch(req, "get_workload").await
    }

    async fn create_workload(&self, spec: &WorkloadSpec) -> ApiResult<WorkloadSummary> {
        let req = self.request(Method::POST, "/deployments").json(spec);
        self.fetch(req, "create_workload").await
    }

    async fn delete_workload(&self, namespace: &str, name: &str) -> ApiResult<()> {
        let req = self.request(Method::DELETE, &resource_path("deployments", namespace, name));
        self.send::<()>(req, None, "delete_workload").await
    }

    async fn scale_workload(&self, namespace: &str, name: &str, replicas: u32) -> ApiResult<()> {
        // Replica count travels as both query parameter and JSON body
        let path = format!(
            "{}/scale?replicas={}",
            resource_path("deployments", namespace, name),
            replicas
        );
        let req = self.request(Method::PUT, &path);
        let body = serde_json::json!({ "replicas": replicas });
        self.send(req, Some(&body), "scale_workload").await
    }

    async fn list_endpoints(&self, namespace: Option<&str>) -> ApiResult<Vec<EndpointSummary>> {
        let req = self.request(Method::GET, &collection_path("services", namespace));
        Ok(self.execute(req, "list_endpoints").await?.unwrap_or_default())
    }

    async fn get_endpoint(&self, namespace: &str, name: &str) -> ApiResult<EndpointSummary> {
        let req = self.request(Method::GET, &resource_path("services", namespace, name));
        self.fetch(req, "get_endpoint").await
    }

    async fn create_endpoint(&self, spec: &EndpointSpec) -> ApiResult<EndpointSummary> {
        let req = self.request(Method::POST, "/services").json(spec);
        self.fetch(req, "create_endpoint").await
    }

    async fn delete_endpoint(&self, namespace: &str, name: &str) -> ApiResult<()> {
        let req = self.request(Method::DELETE, &resource_path("services", namespace, name));
        self.send::<()>(req, None, "delete_endpoint").await
    }

    async fn list_pods(&self, namespace: Option<&str>) -> ApiResult<Vec<Pod>> {
        let req = self.request(Method::GET, &collection_path("pods", namespace));
        Ok(self.execute(req, "list_pods").await?.unwrap_or_default())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> ApiResult<Pod> {
        let req = self.request(Method::GET, &resource_path("pods", namespace, name));
        self.fetch(req, "get_pod").await
    }

    async fn create_pod(&self, request: &PodCreateRequest) -> ApiResult<Pod> {
        let req = self.request(Method::POST, "/pods").json(request);
        self.fetch(req, "create_pod").await
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> ApiResult<()> {
        let req = self.request(Method::DELETE, &resource_path("pods", namespace, name));
        self.send::<()>(req, None, "delete_pod").await
    }

    async fn pod_logs(&self, namespace: &str, name: &str, tail: Option<u32>) -> ApiResult<String> {
        let path = format!(
            "{}/logs?tail={}",
            resource_path("pods", namespace, name),
            tail.unwrap_or(DEFAULT_LOG_TAIL)
        );
        let req = self.request(Method::GET, &path);
        let logs: Option<PodLogs> = self.execute(req, "pod_logs").await?;
        Ok(logs.map(|l| l.logs).unwrap_or_default())
    }

    async fn list_namespaces(&self) -> ApiResult<Vec<String>> {
        let req = self.request(Method::GET, "/namespaces");
        Ok(self.execute(req, "list_namespaces").await?.unwrap_or_default())
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        let req = self.request(Method::POST, "/auth/login").json(request);
        self.fetch(req, "login").await
    }

    async fn signup(&self, request: &SignupRequest) -> ApiResult<AuthResponse> {
        let req = self.request(Method::POST, "/auth/signup").json(request);
        self.fetch(req, "signup").await
    }

    async fn current_user(&self) -> ApiResult<User> {
        let req = self.request(Method::GET, "/auth/me");
        self.fetch(req, "current_user").await
    }
}

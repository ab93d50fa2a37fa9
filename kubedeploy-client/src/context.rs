//! Console context
//!
//! One explicitly constructed object owning the session, the resource client,
//! the synchronization cache and the workflow. Consumers receive it instead of
//! reaching for globals.

use crate::api::{HttpResourceClient, ResourceApi};
use crate::error::ApiResult;
use crate::session::SessionContext;
use crate::sync::{source_fn, LiveView, QueryKey, ResourceKind, ResourceSync, SyncConfig};
use crate::workflow::Workflow;
use kubedeploy_common::auth::{LoginRequest, Session, SignupRequest, User};
use kubedeploy_common::{EndpointSummary, Pod, WorkloadSummary};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Default backend location
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Everything needed to connect
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub sync: SyncConfig,
    /// Credential restored from an earlier login
    pub session: Option<Session>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            sync: SyncConfig::default(),
            session: None,
        }
    }
}

#[derive(Clone)]
pub struct ConsoleContext {
    session: SessionContext,
    api: Arc<dyn ResourceApi>,
    sync: ResourceSync,
    workflow: Workflow,
}

impl ConsoleContext {
    /// Connect to the HTTP backend
    pub fn connect(settings: ClientSettings) -> ApiResult<Self> {
        let session = match settings.session {
            Some(session) => SessionContext::with_session(session),
            None => SessionContext::new(),
        };
        let api = HttpResourceClient::new(&settings.base_url, session.clone(), settings.timeout)?;

        Ok(Self::with_api(Arc::new(api), session, settings.sync))
    }

    /// Assemble around any [`ResourceApi`] implementation
    pub fn with_api(api: Arc<dyn ResourceApi>, session: SessionContext, sync: SyncConfig) -> Self {
        let sync = ResourceSync::new(sync);
        let workflow = Workflow::new(api.clone(), sync.clone());

        Self {
            session,
            api,
            sync,
            workflow,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn api(&self) -> &Arc<dyn ResourceApi> {
        &self.api
    }

    pub fn sync(&self) -> &ResourceSync {
        &self.sync
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session = Session::from(self.api.login(&request).await?);
        self.session.establish(session.clone());
        Ok(session)
    }

    pub async fn signup(&self, request: &SignupRequest) -> ApiResult<Session> {
        let session = Session::from(self.api.signup(request).await?);
        self.session.establish(session.clone());
        Ok(session)
    }

    pub async fn current_user(&self) -> ApiResult<User> {
        self.api.current_user().await
    }

    /// Drop the credential and every cached collection
    pub async fn logout(&self) -> Option<Session> {
        let previous = self.session.logout();
        self.sync.clear().await;
        info!("logged out");
        previous
    }

    pub async fn watch_workloads(&self, namespace: Option<&str>) -> LiveView<WorkloadSummary> {
        let api = self.api.clone();
        let ns = namespace.map(str::to_string);
        let source = source_fn(move || {
            let api = api.clone();
            let ns = ns.clone();
            async move { api.list_workloads(ns.as_deref()).await }
        });
        self.sync
            .subscribe(QueryKey::new(ResourceKind::Workloads, namespace), source)
            .await
    }

    pub async fn watch_endpoints(&self, namespace: Option<&str>) -> LiveView<EndpointSummary> {
        let api = self.api.clone();
        let ns = namespace.map(str::to_string);
        let source = source_fn(move || {
            let api = api.clone();
            let ns = ns.clone();
            async move { api.list_endpoints(ns.as_deref()).await }
        });
        self.sync
            .subscribe(QueryKey::new(ResourceKind::Endpoints, namespace), source)
            .await
    }

    pub async fn watch_pods(&self, namespace: Option<&str>) -> LiveView<Pod> {
        let api = self.api.clone();
        let ns = namespace.map(str::to_string);
        let source = source_fn(move || {
            let api = api.clone();
            let ns = ns.clone();
            async move { api.list_pods(ns.as_deref()).await }
        });
        self.sync
            .subscribe(QueryKey::new(ResourceKind::Pods, namespace), source)
            .await
    }

    pub async fn watch_namespaces(&self) -> LiveView<String> {
        let api = self.api.clone();
        let source = source_fn(move || {
            let api = api.clone();
            async move { api.list_namespaces().await }
        });
        self.sync
            .subscribe(QueryKey::all(ResourceKind::Namespaces), source)
            .await
    }
}

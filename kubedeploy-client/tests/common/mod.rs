//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use kubedeploy_client::{ApiError, ApiResult, ResourceApi, SessionContext, SyncConfig};
use kubedeploy_common::auth::{AuthResponse, LoginRequest, Session, SignupRequest, User};
use kubedeploy_common::{
    EndpointSpec, EndpointSummary, Pod, PodCreateRequest, PodPhase, WorkloadSpec, WorkloadSummary,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// A call received by [`FakeApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListWorkloads(Option<String>),
    GetWorkload(String, String),
    CreateWorkload(WorkloadSpec),
    DeleteWorkload(String, String),
    ScaleWorkload(String, String, u32),
    ListEndpoints(Option<String>),
    GetEndpoint(String, String),
    CreateEndpoint(EndpointSpec),
    DeleteEndpoint(String, String),
    ListPods(Option<String>),
    GetPod(String, String),
    CreatePod(PodCreateRequest),
    DeletePod(String, String),
    PodLogs(String, String, Option<u32>),
    ListNamespaces,
    Login(String),
    Signup(String),
    CurrentUser,
}

impl Call {
    pub fn operation(&self) -> &'static str {
        match self {
            Call::ListWorkloads(_) => "list_workloads",
            Call::GetWorkload(..) => "get_workload",
            Call::CreateWorkload(_) => "create_workload",
            Call::DeleteWorkload(..) => "delete_workload",
            Call::ScaleWorkload(..) => "scale_workload",
            Call::ListEndpoints(_) => "list_endpoints",
            Call::GetEndpoint(..) => "get_endpoint",
            Call::CreateEndpoint(_) => "create_endpoint",
            Call::DeleteEndpoint(..) => "delete_endpoint",
            Call::ListPods(_) => "list_pods",
            Call::GetPod(..) => "get_pod",
            Call::CreatePod(_) => "create_pod",
            Call::DeletePod(..) => "delete_pod",
            Call::PodLogs(..) => "pod_logs",
            Call::ListNamespaces => "list_namespaces",
            Call::Login(_) => "login",
            Call::Signup(_) => "signup",
            Call::CurrentUser => "current_user",
        }
    }
}

#[derive(Default)]
struct FakeState {
    workloads: Vec<WorkloadSummary>,
    endpoints: Vec<EndpointSummary>,
    pods: Vec<Pod>,
    namespaces: Vec<String>,
    calls: Vec<Call>,
    scripted: HashMap<&'static str, VecDeque<ApiError>>,
    failing: HashMap<&'static str, String>,
}

/// In-memory backend that records every call and fails on demand
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        let api = Self::default();
        api.state.lock().unwrap().namespaces = vec!["default".to_string(), "kube-system".to_string()];
        api
    }

    /// Fail the next call to `operation` with `error`
    pub fn fail_next(&self, operation: &'static str, error: ApiError) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Reject every call to `operation` until [`FakeApi::recover`]
    pub fn fail_always(&self, operation: &'static str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(operation, message.to_string());
    }

    pub fn recover(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.remove(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    pub fn seed_workload(&self, workload: WorkloadSummary) {
        self.state.lock().unwrap().workloads.push(workload);
    }

    pub fn seed_pod(&self, pod: Pod) {
        self.state.lock().unwrap().pods.push(pod);
    }

    pub fn workloads(&self) -> Vec<WorkloadSummary> {
        self.state.lock().unwrap().workloads.clone()
    }

    pub fn endpoints(&self) -> Vec<EndpointSummary> {
        self.state.lock().unwrap().endpoints.clone()
    }

    /// Record the call, then apply any scripted failure
    fn enter(&self, call: Call) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        let operation = call.operation();
        state.calls.push(call);

        if let Some(error) = state.scripted.get_mut(operation).and_then(|q| q.pop_front()) {
            return Err(error);
        }
        if let Some(message) = state.failing.get(operation) {
            return Err(ApiError::rejected(500, message.clone()));
        }
        Ok(())
    }

    fn not_found(kind: &str, namespace: &str, name: &str) -> ApiError {
        ApiError::rejected(404, format!("{} {}/{} not found", kind, namespace, name))
    }
}

fn in_namespace(item_ns: &str, filter: Option<&str>) -> bool {
    filter.map_or(true, |ns| ns == item_ns)
}

#[async_trait]
impl ResourceApi for FakeApi {
    async fn list_workloads(&self, namespace: Option<&str>) -> ApiResult<Vec<WorkloadSummary>> {
        self.enter(Call::ListWorkloads(namespace.map(str::to_string)))?;
        let state = self.state.lock().unwrap();
        Ok(state
            .workloads
            .iter()
            .filter(|w| in_namespace(&w.namespace, namespace))
            .cloned()
            .collect())
    }

    async fn get_workload(&self, namespace: &str, name: &str) -> ApiResult<WorkloadSummary> {
        self.enter(Call::GetWorkload(namespace.to_string(), name.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .workloads
            .iter()
            .find(|w| w.namespace == namespace && w.name == name)
            .cloned()
            .ok_or_else(|| Self::not_found("deployment", namespace, name))
    }

    async fn create_workload(&self, spec: &WorkloadSpec) -> ApiResult<WorkloadSummary> {
        self.enter(Call::CreateWorkload(spec.clone()))?;
        let created = WorkloadSummary {
            name: spec.name.clone(),
            namespace: spec.namespace.clone(),
            replicas: spec.replicas,
            available_replicas: 0,
            ready_replicas: 0,
            created_at: "2026-10-16T09:00:00Z".to_string(),
            image: spec.image.clone(),
            labels: BTreeMap::from([("app".to_string(), spec.name.clone())]),
        };
        self.state.lock().unwrap().workloads.push(created.clone());
        Ok(created)
    }

    async fn delete_workload(&self, namespace: &str, name: &str) -> ApiResult<()> {
        self.enter(Call::DeleteWorkload(namespace.to_string(), name.to_string()))?;
        self.state
            .lock()
            .unwrap()
            .workloads
            .retain(|w| !(w.namespace == namespace && w.name == name));
        Ok(())
    }

    async fn scale_workload(&self, namespace: &str, name: &str, replicas: u32) -> ApiResult<()> {
        self.enter(Call::ScaleWorkload(namespace.to_string(), name.to_string(), replicas))?;
        let mut state = self.state.lock().unwrap();
        if let Some(w) = state
            .workloads
            .iter_mut()
            .find(|w| w.namespace == namespace && w.name == name)
        {
            w.replicas = replicas;
        }
        Ok(())
    }

    async fn list_endpoints(&self, namespace: Option<&str>) -> ApiResult<Vec<EndpointSummary>> {
        self.enter(Call::ListEndpoints(namespace.map(str::to_string)))?;
        let state = self.state.lock().unwrap();
        Ok(state
            .endpoints
            .iter()
            .filter(|e| in_namespace(&e.namespace, namespace))
            .cloned()
            .collect())
    }

    async fn get_endpoint(&self, namespace: &str, name: &str) -> ApiResult<EndpointSummary> {
        self.enter(Call::GetEndpoint(namespace.to_string(), name.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .endpoints
            .iter()
            .find(|e| e.namespace == namespace && e.name == name)
            .cloned()
            .ok_or_else(|| Self::not_found("service", namespace, name))
    }

    async fn create_endpoint(&self, spec: &EndpointSpec) -> ApiResult<EndpointSummary> {
        self.enter(Call::CreateEndpoint(spec.clone()))?;
        let created = EndpointSummary {
            name: spec.name.clone(),
            namespace: spec.namespace.clone(),
            service_type: spec.exposure.to_string(),
            cluster_ip: "10.96.0.10".to_string(),
            external_ip: None,
            ports: spec.ports.clone(),
            created_at: "2026-10-16T09:00:01Z".to_string(),
            labels: BTreeMap::new(),
        };
        self.state.lock().unwrap().endpoints.push(created.clone());
        Ok(created)
    }

    async fn delete_endpoint(&self, namespace: &str, name: &str) -> ApiResult<()> {
        self.enter(Call::DeleteEndpoint(namespace.to_string(), name.to_string()))?;
        self.state
            .lock()
            .unwrap()
            .endpoints
            .retain(|e| !(e.namespace == namespace && e.name == name));
        Ok(())
    }

    async fn list_pods(&self, namespace: Option<&str>) -> ApiResult<Vec<Pod>> {
        self.enter(Call::ListPods(namespace.map(str::to_string)))?;
        let state = self.state.lock().unwrap();
        Ok(state
            .pods
            .iter()
            .filter(|p| in_namespace(&p.namespace, namespace))
            .cloned()
            .collect())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> ApiResult<Pod> {
        self.enter(Call::GetPod(namespace.to_string(), name.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .pods
            .iter()
            .find(|p| p.namespace == namespace && p.name == name)
            .cloned()
            .ok_or_else(|| Self::not_found("pod", namespace, name))
    }

    async fn create_pod(&self, request: &PodCreateRequest) -> ApiResult<Pod> {
        self.enter(Call::CreatePod(request.clone()))?;
        let created = pod(&request.name, &request.namespace, PodPhase::Pending);
        self.state.lock().unwrap().pods.push(created.clone());
        Ok(created)
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> ApiResult<()> {
        self.enter(Call::DeletePod(namespace.to_string(), name.to_string()))?;
        self.state
            .lock()
            .unwrap()
            .pods
            .retain(|p| !(p.namespace == namespace && p.name == name));
        Ok(())
    }

    async fn pod_logs(&self, namespace: &str, name: &str, tail: Option<u32>) -> ApiResult<String> {
        self.enter(Call::PodLogs(namespace.to_string(), name.to_string(), tail))?;
        Ok(format!("{}: started\n", name))
    }

    async fn list_namespaces(&self) -> ApiResult<Vec<String>> {
        self.enter(Call::ListNamespaces)?;
        Ok(self.state.lock().unwrap().namespaces.clone())
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        self.enter(Call::Login(request.email.clone()))?;
        Ok(AuthResponse {
            token: "fake-token".to_string(),
            user: user(&request.email),
        })
    }

    async fn signup(&self, request: &SignupRequest) -> ApiResult<AuthResponse> {
        self.enter(Call::Signup(request.email.clone()))?;
        Ok(AuthResponse {
            token: "fake-token".to_string(),
            user: user(&request.email),
        })
    }

    async fn current_user(&self) -> ApiResult<User> {
        self.enter(Call::CurrentUser)?;
        Ok(user("ada@example.com"))
    }
}

pub fn user(email: &str) -> User {
    User {
        id: 1,
        email: email.to_string(),
        username: email.split('@').next().unwrap_or_default().to_string(),
        full_name: String::new(),
        role: "user".to_string(),
        active: true,
        created_at: None,
    }
}

pub fn session() -> Session {
    Session {
        token: "fake-token".to_string(),
        user: user("ada@example.com"),
    }
}

pub fn authenticated() -> SessionContext {
    SessionContext::with_session(session())
}

pub fn workload(name: &str, namespace: &str, replicas: u32, ready: u32) -> WorkloadSummary {
    WorkloadSummary {
        name: name.to_string(),
        namespace: namespace.to_string(),
        replicas,
        available_replicas: ready,
        ready_replicas: ready,
        created_at: "2026-10-16T08:00:00Z".to_string(),
        image: "nginx:latest".to_string(),
        labels: BTreeMap::from([("app".to_string(), name.to_string())]),
    }
}

pub fn pod(name: &str, namespace: &str, phase: PodPhase) -> Pod {
    Pod {
        name: name.to_string(),
        namespace: namespace.to_string(),
        phase,
        status: phase.to_string(),
        image: "nginx:latest".to_string(),
        restarts: 0,
        created_at: "2026-10-16T08:00:00Z".to_string(),
        labels: BTreeMap::new(),
    }
}

/// Polling config with every interval set to `interval`
pub fn sync_config(interval: Duration) -> SyncConfig {
    SyncConfig {
        pods_interval: interval,
        workloads_interval: interval,
        endpoints_interval: interval,
        namespaces_interval: interval,
        ..SyncConfig::default()
    }
}

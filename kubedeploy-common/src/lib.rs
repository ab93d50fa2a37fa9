//! Common types and utilities shared between kubedeploy-client and kubedeploy-cli

pub mod auth;
pub mod health;
pub mod transform;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Namespace used when the user does not pick one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Transport protocol of a container or service port
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            _ => Err(Error::InvalidProtocol(s.to_string())),
        }
    }
}

/// How an endpoint is reachable
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ExposureType {
    /// Internal-only cluster address
    #[serde(rename = "ClusterIP")]
    ClusterIp,
    /// Per-node port
    NodePort,
    /// External load balancer
    #[default]
    LoadBalancer,
}

impl fmt::Display for ExposureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClusterIp => write!(f, "ClusterIP"),
            Self::NodePort => write!(f, "NodePort"),
            Self::LoadBalancer => write!(f, "LoadBalancer"),
        }
    }
}

impl FromStr for ExposureType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "clusterip" => Ok(Self::ClusterIp),
            "nodeport" => Ok(Self::NodePort),
            "loadbalancer" => Ok(Self::LoadBalancer),
            _ => Err(Error::InvalidExposureType(s.to_string())),
        }
    }
}

/// Whether the user asked for a replicated workload or a single pod
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentMode {
    #[default]
    Deployment,
    SinglePod,
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployment => write!(f, "deployment"),
            Self::SinglePod => write!(f, "single-pod"),
        }
    }
}

impl FromStr for DeploymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "deployment" => Ok(Self::Deployment),
            "pod" | "single-pod" | "single" => Ok(Self::SinglePod),
            _ => Err(Error::InvalidDeploymentMode(s.to_string())),
        }
    }
}

/// Container port exposed by a workload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerPort {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "containerPort")]
    pub container_port: u16,
    #[serde(default)]
    pub protocol: Protocol,
}

/// Parses `name:port[/protocol]` or `port[/protocol]`
impl FromStr for ContainerPort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (rest, protocol) = split_protocol(s)?;
        let (name, port) = match rest.split_once(':') {
            Some((name, port)) => (name.to_string(), port),
            None => (String::new(), rest),
        };

        Ok(Self {
            name,
            container_port: parse_port(port, s)?,
            protocol,
        })
    }
}

/// Environment variable pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Both halves must be non-empty for the pair to be submitted
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.value.is_empty()
    }
}

/// Parses `KEY=VALUE`; the value may be empty
impl FromStr for EnvVar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| Error::InvalidEnvVar(s.to_string()))?;
        Ok(Self::new(name.trim(), value))
    }
}

/// CPU and memory quantities, passed to the backend verbatim
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ResourceQuantities {
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub memory: String,
}

impl ResourceQuantities {
    pub fn new(cpu: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            cpu: cpu.into(),
            memory: memory.into(),
        }
    }
}

/// Resource requests and limits of the workload's container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ResourceRequirements {
    pub requests: ResourceQuantities,
    pub limits: ResourceQuantities,
}

/// Volume source type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum VolumeType {
    #[default]
    EmptyDir,
    ConfigMap,
    Secret,
    PersistentVolumeClaim,
}

impl FromStr for VolumeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "emptydir" => Ok(Self::EmptyDir),
            "configmap" => Ok(Self::ConfigMap),
            "secret" => Ok(Self::Secret),
            "persistentvolumeclaim" | "pvc" => Ok(Self::PersistentVolumeClaim),
            _ => Err(Error::InvalidVolume(s.to_string())),
        }
    }
}

/// Volume mounted into the workload's container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeMount {
    pub name: String,
    #[serde(rename = "mountPath")]
    pub mount_path: String,
    #[serde(rename = "type", default)]
    pub volume_type: VolumeType,
    /// Name of the configMap, secret or claim backing the volume
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
}

/// Parses `name:mountPath[:type[:source]]`
impl FromStr for VolumeMount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(4, ':');
        let name = parts.next().filter(|p| !p.is_empty());
        let mount_path = parts.next().filter(|p| !p.is_empty());

        let (Some(name), Some(mount_path)) = (name, mount_path) else {
            return Err(Error::InvalidVolume(s.to_string()));
        };

        let volume_type = match parts.next() {
            Some(t) => t.parse()?,
            None => VolumeType::default(),
        };

        Ok(Self {
            name: name.to_string(),
            mount_path: mount_path.to_string(),
            volume_type,
            source: parts.next().map(str::to_string),
        })
    }
}

/// Workload creation payload (`POST /deployments`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub replicas: u32,
    pub resources: ResourceRequirements,
    pub ports: Vec<ContainerPort>,
    pub env: Vec<EnvVar>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub volumes: Vec<VolumeMount>,
}

/// Service port of a network endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServicePort {
    #[serde(default)]
    pub name: String,
    pub port: u16,
    #[serde(rename = "targetPort")]
    pub target_port: u16,
    #[serde(default)]
    pub protocol: Protocol,
    /// Only meaningful for `NodePort` endpoints
    #[serde(rename = "nodePort", skip_serializing_if = "Option::is_none", default)]
    pub node_port: Option<u16>,
}

/// Parses `[name:]port[:target][/protocol][@nodePort]`
impl FromStr for ServicePort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (rest, node_port) = match s.split_once('@') {
            Some((rest, node)) => (rest, Some(parse_port(node, s)?)),
            None => (s, None),
        };
        let (rest, protocol) = split_protocol(rest)?;
        let parts: Vec<&str> = rest.split(':').collect();

        let (name, port, target) = match parts.as_slice() {
            [port] => (String::new(), *port, *port),
            [first, second] if first.parse::<u16>().is_ok() => (String::new(), *first, *second),
            [name, port] => (name.to_string(), *port, *port),
            [name, port, target] => (name.to_string(), *port, *target),
            _ => return Err(Error::InvalidPort(s.to_string())),
        };

        Ok(Self {
            name,
            port: parse_port(port, s)?,
            target_port: parse_port(target, s)?,
            protocol,
            node_port,
        })
    }
}

/// Network endpoint creation payload (`POST /services`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointSpec {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub exposure: ExposureType,
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<ServicePort>,
}

/// Single pod quick-deploy payload (`POST /pods`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PodCreateRequest {
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub replicas: u32,
    pub resources: ResourceQuantities,
    pub ports: Vec<u16>,
    pub env: Vec<EnvVar>,
}

/// Observed lifecycle state of a pod
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PodPhase {
    Pending,
    Running,
    Failed,
    Succeeded,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Failed => write!(f, "Failed"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Pod as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub phase: PodPhase,
    /// Status text as the backend reports it, kept verbatim
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub restarts: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Pod {
    pub fn created(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// Workload as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkloadSummary {
    pub name: String,
    pub namespace: String,
    /// Desired replica count
    #[serde(default)]
    pub replicas: u32,
    #[serde(rename = "availableReplicas", default)]
    pub available_replicas: u32,
    #[serde(rename = "readyReplicas", default)]
    pub ready_replicas: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl WorkloadSummary {
    pub fn created(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// Network endpoint as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointSummary {
    pub name: String,
    pub namespace: String,
    /// Kept as a string: the cluster may report types this console never creates
    #[serde(rename = "type", default)]
    pub service_type: String,
    #[serde(rename = "clusterIP", default)]
    pub cluster_ip: String,
    #[serde(rename = "externalIP", default, skip_serializing_if = "Option::is_none")]
    pub external_ip: Option<String>,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl EndpointSummary {
    pub fn created(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// Pod log payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PodLogs {
    #[serde(default)]
    pub logs: String,
}

/// Envelope shared by every backend response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Missing reads as `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Most specific human-readable failure text carried by the envelope
    pub fn failure_message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .filter(|e| !e.is_empty())
            .or_else(|| self.message.as_deref().filter(|m| !m.is_empty()))
    }
}

/// Model errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid protocol '{0}' (expected TCP or UDP)")]
    InvalidProtocol(String),

    #[error("Invalid exposure type '{0}' (expected ClusterIP, NodePort or LoadBalancer)")]
    InvalidExposureType(String),

    #[error("Invalid deployment mode '{0}' (expected deployment or pod)")]
    InvalidDeploymentMode(String),

    #[error("Invalid port specification: {0}")]
    InvalidPort(String),

    #[error("Invalid environment variable '{0}' (expected KEY=VALUE)")]
    InvalidEnvVar(String),

    #[error("Invalid volume specification: {0}")]
    InvalidVolume(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn split_protocol(s: &str) -> Result<(&str, Protocol)> {
    match s.rsplit_once('/') {
        Some((rest, proto)) => Ok((rest, proto.parse()?)),
        None => Ok((s, Protocol::default())),
    }
}

fn parse_port(value: &str, whole: &str) -> Result<u16> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| Error::InvalidPort(whole.to_string()))
}

fn parse_timestamp(value: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&chrono::Utc))
}

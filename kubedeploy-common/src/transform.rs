//! Resource transformer
//!
//! Turns the user-editable deploy form into the request payloads submitted to
//! the workload and endpoint collections. Pure functions, no I/O.

use crate::{
    ContainerPort, DeploymentMode, EndpointSpec, EnvVar, ExposureType, PodCreateRequest,
    Protocol, ResourceQuantities, ResourceRequirements, ServicePort, VolumeMount, WorkloadSpec,
    DEFAULT_NAMESPACE,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label key tying an endpoint's selector to its workload
pub const APP_LABEL: &str = "app";

/// Suffix appended to the workload name to name its endpoint
pub const ENDPOINT_SUFFIX: &str = "-service";

/// Deploy form state
///
/// Every field has a default so a manifest file only needs to carry what it
/// changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeploymentForm {
    pub mode: DeploymentMode,
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub replicas: u32,
    pub cpu_request: String,
    pub memory_request: String,
    pub cpu_limit: String,
    pub memory_limit: String,
    pub env: Vec<EnvVar>,
    pub ports: Vec<ContainerPort>,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub volumes: Vec<VolumeMount>,
    pub create_endpoint: bool,
    pub exposure: ExposureType,
    pub endpoint_ports: Vec<ServicePort>,
}

impl Default for DeploymentForm {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::Deployment,
            name: String::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            image: String::new(),
            replicas: 1,
            cpu_request: "100m".to_string(),
            memory_request: "128Mi".to_string(),
            cpu_limit: "500m".to_string(),
            memory_limit: "512Mi".to_string(),
            env: Vec::new(),
            ports: vec![ContainerPort {
                name: "http".to_string(),
                container_port: 80,
                protocol: Protocol::Tcp,
            }],
            command: Vec::new(),
            args: Vec::new(),
            volumes: Vec::new(),
            create_endpoint: true,
            exposure: ExposureType::LoadBalancer,
            endpoint_ports: vec![ServicePort {
                name: "http".to_string(),
                port: 80,
                target_port: 80,
                protocol: Protocol::Tcp,
                node_port: None,
            }],
        }
    }
}

impl DeploymentForm {
    /// Replica count actually submitted; single-pod mode always runs one
    pub fn effective_replicas(&self) -> u32 {
        match self.mode {
            DeploymentMode::SinglePod => 1,
            DeploymentMode::Deployment => self.replicas,
        }
    }

    /// Namespace actually submitted; blank falls back to the default namespace
    pub fn effective_namespace(&self) -> &str {
        let ns = self.namespace.trim();
        if ns.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            ns
        }
    }
}

/// Name of the endpoint created alongside `workload_name`
pub fn endpoint_name_for(workload_name: &str) -> String {
    format!("{}{}", workload_name, ENDPOINT_SUFFIX)
}

/// Selector matching the pods of `workload_name`
pub fn selector_for(workload_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), workload_name.to_string())])
}

/// Keep only pairs where both name and value are non-empty
pub fn complete_env(env: &[EnvVar]) -> Vec<EnvVar> {
    env.iter().filter(|e| e.is_complete()).cloned().collect()
}

/// Build the workload payload from the form
pub fn build_workload_request(form: &DeploymentForm) -> WorkloadSpec {
    WorkloadSpec {
        name: form.name.clone(),
        namespace: form.effective_namespace().to_string(),
        image: form.image.clone(),
        replicas: form.effective_replicas(),
        resources: ResourceRequirements {
            requests: ResourceQuantities::new(&form.cpu_request, &form.memory_request),
            limits: ResourceQuantities::new(&form.cpu_limit, &form.memory_limit),
        },
        ports: form.ports.clone(),
        env: complete_env(&form.env),
        command: form.command.clone(),
        args: form.args.clone(),
        volumes: form.volumes.clone(),
    }
}

/// Build the endpoint payload for the workload named `workload_name`
///
/// Name and selector derive from the workload name by convention; there is no
/// stored reference between the two resources.
pub fn build_endpoint_request(form: &DeploymentForm, workload_name: &str) -> EndpointSpec {
    let keep_node_port = form.exposure == ExposureType::NodePort;

    EndpointSpec {
        name: endpoint_name_for(workload_name),
        namespace: form.effective_namespace().to_string(),
        exposure: form.exposure,
        selector: selector_for(workload_name),
        ports: form
            .endpoint_ports
            .iter()
            .map(|p| ServicePort {
                node_port: if keep_node_port { p.node_port } else { None },
                ..p.clone()
            })
            .collect(),
    }
}

/// Build the single-pod quick deploy payload
pub fn build_pod_request(form: &DeploymentForm) -> PodCreateRequest {
    PodCreateRequest {
        name: form.name.clone(),
        namespace: form.effective_namespace().to_string(),
        image: form.image.clone(),
        replicas: form.effective_replicas(),
        resources: ResourceQuantities::new(&form.cpu_limit, &form.memory_limit),
        ports: form.ports.iter().map(|p| p.container_port).collect(),
        env: complete_env(&form.env),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web_form() -> DeploymentForm {
        DeploymentForm {
            name: "web".to_string(),
            image: "nginx:latest".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_workload_request_defaults() {
        let spec = build_workload_request(&web_form());

        assert_eq!(spec.name, "web");
        assert_eq!(spec.namespace, "default");
        assert_eq!(spec.image, "nginx:latest");
        assert_eq!(spec.replicas, 1);
        assert_eq!(spec.resources.requests, ResourceQuantities::new("100m", "128Mi"));
        assert_eq!(spec.resources.limits, ResourceQuantities::new("500m", "512Mi"));
        assert_eq!(spec.ports.len(), 1);
        assert!(spec.env.is_empty());
    }

    #[test]
    fn test_single_pod_mode_forces_one_replica() {
        let form = DeploymentForm {
            mode: DeploymentMode::SinglePod,
            replicas: 5,
            ..web_form()
        };
        assert_eq!(build_workload_request(&form).replicas, 1);

        let form = DeploymentForm {
            replicas: 5,
            ..web_form()
        };
        assert_eq!(build_workload_request(&form).replicas, 5);
    }

    #[test]
    fn test_incomplete_env_pairs_are_dropped() {
        let form = DeploymentForm {
            env: vec![
                EnvVar::new("A", "1"),
                EnvVar::new("", "orphan"),
                EnvVar::new("B", ""),
                EnvVar::new("", ""),
                EnvVar::new("C", "3"),
            ],
            ..web_form()
        };

        let spec = build_workload_request(&form);
        assert_eq!(spec.env, vec![EnvVar::new("A", "1"), EnvVar::new("C", "3")]);
        assert!(spec.env.iter().all(|e| !e.name.is_empty() && !e.value.is_empty()));
    }

    #[test]
    fn test_quantities_pass_through_verbatim() {
        let form = DeploymentForm {
            cpu_request: "not-a-quantity".to_string(),
            memory_limit: "1.5 gigs".to_string(),
            ..web_form()
        };
        let spec = build_workload_request(&form);
        assert_eq!(spec.resources.requests.cpu, "not-a-quantity");
        assert_eq!(spec.resources.limits.memory, "1.5 gigs");
    }

    #[test]
    fn test_endpoint_naming_and_selector() {
        let form = DeploymentForm {
            namespace: "shop".to_string(),
            ..web_form()
        };
        let spec = build_endpoint_request(&form, "web");

        assert_eq!(spec.name, "web-service");
        assert_eq!(spec.namespace, "shop");
        assert_eq!(spec.exposure, ExposureType::LoadBalancer);
        assert_eq!(spec.selector, selector_for("web"));
        assert_eq!(spec.selector.get("app").map(String::as_str), Some("web"));
    }

    #[test]
    fn test_node_port_only_kept_for_node_port_exposure() {
        let ports = vec![
            ServicePort {
                name: "http".to_string(),
                port: 80,
                target_port: 8080,
                protocol: Protocol::Tcp,
                node_port: Some(30080),
            },
            ServicePort {
                name: "dns".to_string(),
                port: 53,
                target_port: 53,
                protocol: Protocol::Udp,
                node_port: Some(30053),
            },
        ];

        for exposure in [ExposureType::ClusterIp, ExposureType::LoadBalancer] {
            let form = DeploymentForm {
                exposure,
                endpoint_ports: ports.clone(),
                ..web_form()
            };
            let spec = build_endpoint_request(&form, "web");
            assert!(spec.ports.iter().all(|p| p.node_port.is_none()));
            let json = serde_json::to_value(&spec).unwrap();
            assert!(json["ports"][0].get("nodePort").is_none());
        }

        let form = DeploymentForm {
            exposure: ExposureType::NodePort,
            endpoint_ports: ports,
            ..web_form()
        };
        let spec = build_endpoint_request(&form, "web");
        assert_eq!(spec.ports[0].node_port, Some(30080));
        assert_eq!(spec.ports[1].node_port, Some(30053));
    }

    #[test]
    fn test_blank_namespace_falls_back_to_default() {
        let form = DeploymentForm {
            namespace: "  ".to_string(),
            ..web_form()
        };
        assert_eq!(build_workload_request(&form).namespace, DEFAULT_NAMESPACE);
        assert_eq!(build_endpoint_request(&form, "web").namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_workload_payload_wire_shape() {
        let json = serde_json::to_value(build_workload_request(&web_form())).unwrap();

        assert_eq!(json["resources"]["requests"]["cpu"], "100m");
        assert_eq!(json["ports"][0]["containerPort"], 80);
        assert_eq!(json["ports"][0]["protocol"], "TCP");
        assert!(json.get("command").is_none());
        assert!(json.get("volumes").is_none());
    }

    #[test]
    fn test_pod_request_uses_limits_and_bare_ports() {
        let form = DeploymentForm {
            mode: DeploymentMode::SinglePod,
            env: vec![EnvVar::new("A", "1"), EnvVar::new("B", "")],
            ..web_form()
        };
        let pod = build_pod_request(&form);

        assert_eq!(pod.replicas, 1);
        assert_eq!(pod.resources, ResourceQuantities::new("500m", "512Mi"));
        assert_eq!(pod.ports, vec![80]);
        assert_eq!(pod.env.len(), 1);
    }

    #[test]
    fn test_manifest_only_needs_changed_fields() {
        let form: DeploymentForm =
            serde_json::from_str(r#"{"name":"api","image":"ghcr.io/acme/api:1.2","exposure":"NodePort"}"#)
                .unwrap();
        assert_eq!(form.namespace, "default");
        assert_eq!(form.exposure, ExposureType::NodePort);
        assert!(form.create_endpoint);
    }
}

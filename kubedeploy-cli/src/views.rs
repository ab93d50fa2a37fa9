///! List and detail views
///!
///! Table rows and detail text for each resource kind. Health badges are
///! derived from the collections on every render.

use crate::output::format_age;
use chrono::{DateTime, Utc};
use colored::Colorize;
use kubedeploy_client::{QueryState, ViewStatus};
use kubedeploy_common::health::DashboardSummary;
use kubedeploy_common::{EndpointSummary, Pod, PodPhase, ServicePort, WorkloadSummary};
use std::collections::BTreeMap;
use std::fmt::Write;
use tabled::Tabled;

#[derive(Tabled)]
pub struct WorkloadRow {
    pub name: String,
    pub namespace: String,
    pub ready: String,
    pub available: u32,
    pub image: String,
    pub age: String,
}

impl WorkloadRow {
    pub fn new(w: &WorkloadSummary, now: DateTime<Utc>) -> Self {
        Self {
            name: w.name.clone(),
            namespace: w.namespace.clone(),
            ready: readiness_badge(w),
            available: w.available_replicas,
            image: display_or_na(&w.image),
            age: format_age(w.created(), now),
        }
    }
}

#[derive(Tabled)]
pub struct EndpointRow {
    pub name: String,
    pub namespace: String,
    #[tabled(rename = "type")]
    pub service_type: String,
    #[tabled(rename = "cluster-ip")]
    pub cluster_ip: String,
    #[tabled(rename = "external-ip")]
    pub external_ip: String,
    pub ports: String,
    pub age: String,
}

impl EndpointRow {
    pub fn new(e: &EndpointSummary, now: DateTime<Utc>) -> Self {
        Self {
            name: e.name.clone(),
            namespace: e.namespace.clone(),
            service_type: e.service_type.clone(),
            cluster_ip: display_or_na(&e.cluster_ip),
            external_ip: external_ip(e),
            ports: e.ports.iter().map(format_port).collect::<Vec<_>>().join(", "),
            age: format_age(e.created(), now),
        }
    }
}

#[derive(Tabled)]
pub struct PodRow {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    pub restarts: u32,
    pub image: String,
    pub age: String,
}

impl PodRow {
    pub fn new(p: &Pod, now: DateTime<Utc>) -> Self {
        Self {
            name: p.name.clone(),
            namespace: p.namespace.clone(),
            phase: phase_badge(p.phase),
            restarts: p.restarts,
            image: display_or_na(&p.image),
            age: format_age(p.created(), now),
        }
    }
}

#[derive(Tabled)]
pub struct NamespaceRow {
    pub name: String,
}

/// `ready/desired Ready`, green when healthy
pub fn readiness_badge(w: &WorkloadSummary) -> String {
    let text = format!("{} Ready", w.readiness());
    if w.is_healthy() {
        text.green().to_string()
    } else {
        text.yellow().to_string()
    }
}

pub fn phase_badge(phase: PodPhase) -> String {
    let text = phase.to_string();
    match phase {
        PodPhase::Running => text.green().to_string(),
        PodPhase::Failed => text.red().to_string(),
        _ => text.yellow().to_string(),
    }
}

/// `name: port:target (NodePort: n)/PROTO`
pub fn format_port(p: &ServicePort) -> String {
    let mut out = String::new();
    if !p.name.is_empty() {
        let _ = write!(out, "{}: ", p.name);
    }
    let _ = write!(out, "{}:{}", p.port, p.target_port);
    if let Some(node_port) = p.node_port {
        let _ = write!(out, " (NodePort: {})", node_port);
    }
    let _ = write!(out, "/{}", p.protocol);
    out
}

fn external_ip(e: &EndpointSummary) -> String {
    match e.external_ip.as_deref() {
        Some(ip) if !ip.is_empty() => ip.to_string(),
        _ if e.service_type == "LoadBalancer" => "<pending>".to_string(),
        _ => "<none>".to_string(),
    }
}

fn display_or_na(value: &str) -> String {
    if value.is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}

fn format_labels(labels: &BTreeMap<String, String>) -> String {
    if labels.is_empty() {
        return "<none>".to_string();
    }
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn workload_detail(w: &WorkloadSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Deployment Details:");
    let _ = writeln!(out, "  Name:       {}", w.name);
    let _ = writeln!(out, "  Namespace:  {}", w.namespace);
    let _ = writeln!(out, "  Status:     {}", readiness_badge(w));
    let _ = writeln!(out, "  Healthy:    {}", if w.is_healthy() { "yes" } else { "no" });
    let _ = writeln!(out, "  Image:      {}", display_or_na(&w.image));
    let _ = writeln!(out, "  Replicas:   {}", w.replicas);
    let _ = writeln!(out, "  Available:  {}", w.available_replicas);
    let _ = writeln!(out, "  Created:    {}", display_or_na(&w.created_at));
    let _ = writeln!(out, "  Labels:     {}", format_labels(&w.labels));
    out
}

pub fn endpoint_detail(e: &EndpointSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Service Details:");
    let _ = writeln!(out, "  Name:        {}", e.name);
    let _ = writeln!(out, "  Namespace:   {}", e.namespace);
    let _ = writeln!(out, "  Type:        {}", e.service_type);
    let _ = writeln!(out, "  Cluster IP:  {}", display_or_na(&e.cluster_ip));
    let _ = writeln!(out, "  External IP: {}", external_ip(e));
    let _ = writeln!(out, "  Created:     {}", display_or_na(&e.created_at));
    let _ = writeln!(out, "  Labels:      {}", format_labels(&e.labels));
    let _ = writeln!(out, "  Ports:");
    for port in &e.ports {
        let _ = writeln!(out, "    {}", format_port(port));
    }
    out
}

pub fn pod_detail(p: &Pod) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Pod Details:");
    let _ = writeln!(out, "  Name:      {}", p.name);
    let _ = writeln!(out, "  Namespace: {}", p.namespace);
    let _ = writeln!(out, "  Phase:     {}", phase_badge(p.phase));
    if !p.status.is_empty() {
        let _ = writeln!(out, "  Status:    {}", p.status);
    }
    let _ = writeln!(out, "  Image:     {}", display_or_na(&p.image));
    let _ = writeln!(out, "  Restarts:  {}", p.restarts);
    let _ = writeln!(out, "  Created:   {}", display_or_na(&p.created_at));
    let _ = writeln!(out, "  Labels:    {}", format_labels(&p.labels));
    out
}

pub fn dashboard_detail(summary: &DashboardSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cluster Overview:");
    let _ = writeln!(
        out,
        "  Pods:        {} total, {} running, {} pending, {} failed",
        summary.pods_total, summary.pods_running, summary.pods_pending, summary.pods_failed
    );
    let _ = writeln!(
        out,
        "  Deployments: {} total, {} healthy",
        summary.workloads_total, summary.workloads_healthy
    );
    let _ = writeln!(out, "  Services:    {} total", summary.endpoints_total);
    out
}

/// One-line status of a live view; `None` when fresh
pub fn status_line<T>(label: &str, state: &QueryState<T>) -> Option<String> {
    let error = state.error.as_deref().unwrap_or_default();
    match state.status() {
        ViewStatus::Loading => Some(format!("Loading {}...", label)),
        ViewStatus::Failed => Some(format!("Error loading {}: {}", label, error).red().to_string()),
        ViewStatus::Stale => Some(format!("Stale {} (last error: {})", label, error).yellow().to_string()),
        ViewStatus::Fresh => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubedeploy_common::Protocol;

    fn workload(desired: u32, ready: u32) -> WorkloadSummary {
        WorkloadSummary {
            name: "web".to_string(),
            namespace: "default".to_string(),
            replicas: desired,
            available_replicas: ready,
            ready_replicas: ready,
            created_at: "2026-10-16T08:00:00Z".to_string(),
            image: String::new(),
            labels: BTreeMap::new(),
        }
    }

    #[test]
    fn test_readiness_badge_text() {
        colored::control::set_override(false);
        assert_eq!(readiness_badge(&workload(3, 2)), "2/3 Ready");
        assert_eq!(readiness_badge(&workload(0, 0)), "0/0 Ready");
    }

    #[test]
    fn test_workload_row() {
        colored::control::set_override(false);
        let now = "2026-10-16T10:00:00Z".parse().unwrap();
        let row = WorkloadRow::new(&workload(2, 2), now);

        assert_eq!(row.ready, "2/2 Ready");
        assert_eq!(row.image, "N/A");
        assert_eq!(row.age, "2h");
    }

    #[test]
    fn test_port_format() {
        let mut port = ServicePort {
            name: "http".to_string(),
            port: 80,
            target_port: 8080,
            protocol: Protocol::Tcp,
            node_port: None,
        };
        assert_eq!(format_port(&port), "http: 80:8080/TCP");

        port.node_port = Some(30080);
        port.name.clear();
        assert_eq!(format_port(&port), "80:8080 (NodePort: 30080)/TCP");
    }

    #[test]
    fn test_external_ip_placeholder() {
        let mut endpoint = EndpointSummary {
            name: "web-service".to_string(),
            namespace: "default".to_string(),
            service_type: "LoadBalancer".to_string(),
            cluster_ip: "10.96.0.10".to_string(),
            external_ip: None,
            ports: Vec::new(),
            created_at: String::new(),
            labels: BTreeMap::new(),
        };
        assert_eq!(external_ip(&endpoint), "<pending>");

        endpoint.external_ip = Some("203.0.113.7".to_string());
        assert_eq!(external_ip(&endpoint), "203.0.113.7");

        endpoint.service_type = "ClusterIP".to_string();
        endpoint.external_ip = None;
        assert_eq!(external_ip(&endpoint), "<none>");
    }

    #[test]
    fn test_status_lines_are_distinct() {
        colored::control::set_override(false);
        let mut state: QueryState<Pod> = QueryState::default();
        assert_eq!(status_line("pods", &state).as_deref(), Some("Loading pods..."));

        state.error = Some("connection refused".to_string());
        assert_eq!(
            status_line("pods", &state).as_deref(),
            Some("Error loading pods: connection refused")
        );

        state.data = Some(Vec::new());
        assert_eq!(
            status_line("pods", &state).as_deref(),
            Some("Stale pods (last error: connection refused)")
        );

        state.error = None;
        assert!(status_line("pods", &state).is_none());
    }

    #[test]
    fn test_dashboard_detail() {
        let summary = DashboardSummary {
            pods_total: 4,
            pods_running: 2,
            pods_pending: 1,
            pods_failed: 1,
            workloads_total: 2,
            workloads_healthy: 1,
            endpoints_total: 3,
        };
        let text = dashboard_detail(&summary);
        assert!(text.contains("4 total, 2 running, 1 pending, 1 failed"));
        assert!(text.contains("2 total, 1 healthy"));
        assert!(text.contains("Services:    3 total"));
    }
}

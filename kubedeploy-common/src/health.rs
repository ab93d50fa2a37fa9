//! Derived health indicators
//!
//! Computed from the raw collections on every read, never stored.

use crate::{EndpointSummary, Pod, PodPhase, WorkloadSummary};
use serde::Serialize;

/// Direction of a one-step scale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDirection {
    Up,
    Down,
}

/// Replica count after one step; scaling down stops at zero
pub fn scaled_replicas(current: u32, direction: ScaleDirection) -> u32 {
    match direction {
        ScaleDirection::Up => current.saturating_add(1),
        ScaleDirection::Down => current.saturating_sub(1),
    }
}

impl WorkloadSummary {
    /// Every desired replica is ready, and at least one is desired
    pub fn is_healthy(&self) -> bool {
        self.ready_replicas == self.replicas && self.replicas > 0
    }

    /// `ready/desired` badge text
    pub fn readiness(&self) -> String {
        format!("{}/{}", self.ready_replicas, self.replicas)
    }
}

/// Overview counts shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub pods_total: usize,
    pub pods_running: usize,
    pub pods_pending: usize,
    pub pods_failed: usize,
    pub workloads_total: usize,
    pub workloads_healthy: usize,
    pub endpoints_total: usize,
}

impl DashboardSummary {
    pub fn compute(pods: &[Pod], workloads: &[WorkloadSummary], endpoints: &[EndpointSummary]) -> Self {
        let in_phase = |phase: PodPhase| pods.iter().filter(|p| p.phase == phase).count();

        Self {
            pods_total: pods.len(),
            pods_running: in_phase(PodPhase::Running),
            pods_pending: in_phase(PodPhase::Pending),
            pods_failed: in_phase(PodPhase::Failed),
            workloads_total: workloads.len(),
            workloads_healthy: workloads.iter().filter(|w| w.is_healthy()).count(),
            endpoints_total: endpoints.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn workload(desired: u32, ready: u32) -> WorkloadSummary {
        WorkloadSummary {
            name: "web".to_string(),
            namespace: "default".to_string(),
            replicas: desired,
            available_replicas: ready,
            ready_replicas: ready,
            created_at: String::new(),
            image: "nginx".to_string(),
            labels: BTreeMap::new(),
        }
    }

    fn pod(phase: PodPhase) -> Pod {
        Pod {
            name: "p".to_string(),
            namespace: "default".to_string(),
            phase,
            status: phase.to_string(),
            image: "nginx".to_string(),
            restarts: 0,
            created_at: String::new(),
            labels: BTreeMap::new(),
        }
    }

    #[test]
    fn test_scale_steps() {
        assert_eq!(scaled_replicas(3, ScaleDirection::Down), 2);
        assert_eq!(scaled_replicas(3, ScaleDirection::Up), 4);
        assert_eq!(scaled_replicas(0, ScaleDirection::Down), 0);
        assert_eq!(scaled_replicas(u32::MAX, ScaleDirection::Up), u32::MAX);
    }

    #[test]
    fn test_workload_health() {
        assert!(workload(3, 3).is_healthy());
        assert!(!workload(3, 2).is_healthy());
        assert!(!workload(0, 0).is_healthy());
        assert_eq!(workload(3, 2).readiness(), "2/3");
    }

    #[test]
    fn test_dashboard_summary() {
        let pods = vec![
            pod(PodPhase::Running),
            pod(PodPhase::Running),
            pod(PodPhase::Pending),
            pod(PodPhase::Failed),
            pod(PodPhase::Succeeded),
        ];
        let workloads = vec![workload(2, 2), workload(2, 1), workload(0, 0)];

        let summary = DashboardSummary::compute(&pods, &workloads, &[]);
        assert_eq!(summary.pods_total, 5);
        assert_eq!(summary.pods_running, 2);
        assert_eq!(summary.pods_pending, 1);
        assert_eq!(summary.pods_failed, 1);
        assert_eq!(summary.workloads_total, 3);
        assert_eq!(summary.workloads_healthy, 1);
        assert_eq!(summary.endpoints_total, 0);
    }
}

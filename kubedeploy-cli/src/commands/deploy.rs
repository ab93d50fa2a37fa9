///! Deploy command
///!
///! Builds the deploy form from a manifest file and/or flags and runs the
///! two-step workflow.

use super::{spinner, NamespaceScope};
use crate::output::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use clap::Args;
use kubedeploy_client::ConsoleContext;
use kubedeploy_common::transform::{endpoint_name_for, DeploymentForm};
use kubedeploy_common::{ContainerPort, DeploymentMode, EnvVar, ExposureType, ServicePort, VolumeMount};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Manifest file (YAML or JSON); flags override its fields
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Deployment name
    #[arg(long)]
    pub name: Option<String>,

    /// Container image
    #[arg(short, long)]
    pub image: Option<String>,

    /// deployment, or pod for a single replica
    #[arg(long)]
    pub mode: Option<DeploymentMode>,

    /// Desired replica count
    #[arg(short, long)]
    pub replicas: Option<u32>,

    #[arg(long)]
    pub cpu_request: Option<String>,

    #[arg(long)]
    pub memory_request: Option<String>,

    #[arg(long)]
    pub cpu_limit: Option<String>,

    #[arg(long)]
    pub memory_limit: Option<String>,

    /// Container port as name:port[/proto] (repeatable)
    #[arg(short, long = "port")]
    pub ports: Vec<ContainerPort>,

    /// Environment variable as KEY=VALUE (repeatable)
    #[arg(short, long = "env")]
    pub env: Vec<EnvVar>,

    /// Container entrypoint override; takes the rest of the line
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Container argument (repeatable)
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Volume as name:path[:type[:source]] (repeatable)
    #[arg(long = "volume")]
    pub volumes: Vec<VolumeMount>,

    /// Create a service for the deployment (default)
    #[arg(long, conflicts_with = "no_expose")]
    pub expose: bool,

    /// Skip service creation
    #[arg(long)]
    pub no_expose: bool,

    /// Service type: ClusterIP, NodePort or LoadBalancer
    #[arg(short = 't', long = "type")]
    pub exposure: Option<ExposureType>,

    /// Service port as [name:]port[:target][/proto][@nodePort] (repeatable)
    #[arg(long = "service-port")]
    pub service_ports: Vec<ServicePort>,
}

impl DeployArgs {
    /// Merge manifest, flags and namespace into a complete form
    pub fn into_form(self, scope: &NamespaceScope) -> Result<DeploymentForm> {
        let mut form = match &self.file {
            Some(path) => load_manifest(path, &scope.default)?,
            None => DeploymentForm {
                namespace: scope.default.clone(),
                ..Default::default()
            },
        };

        if let Some(ns) = &scope.explicit {
            form.namespace = ns.clone();
        }
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(image) = self.image {
            form.image = image;
        }
        if let Some(mode) = self.mode {
            form.mode = mode;
        }
        if let Some(replicas) = self.replicas {
            form.replicas = replicas;
        }
        if let Some(cpu) = self.cpu_request {
            form.cpu_request = cpu;
        }
        if let Some(memory) = self.memory_request {
            form.memory_request = memory;
        }
        if let Some(cpu) = self.cpu_limit {
            form.cpu_limit = cpu;
        }
        if let Some(memory) = self.memory_limit {
            form.memory_limit = memory;
        }
        if !self.ports.is_empty() {
            form.ports = self.ports;
        }
        form.env.extend(self.env);
        if !self.command.is_empty() {
            form.command = self.command;
        }
        if !self.args.is_empty() {
            form.args = self.args;
        }
        form.volumes.extend(self.volumes);
        if self.expose {
            form.create_endpoint = true;
        }
        if self.no_expose {
            form.create_endpoint = false;
        }
        if let Some(exposure) = self.exposure {
            form.exposure = exposure;
        }
        if !self.service_ports.is_empty() {
            form.endpoint_ports = self.service_ports;
        }

        if form.name.trim().is_empty() {
            bail!("A deployment name is required (--name or 'name' in the manifest)");
        }
        if form.image.trim().is_empty() {
            bail!("A container image is required (--image or 'image' in the manifest)");
        }

        Ok(form)
    }
}

/// YAML parser also accepts JSON manifests. A manifest without a namespace
/// lands in `default_namespace`.
fn load_manifest(path: &Path, default_namespace: &str) -> Result<DeploymentForm> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let value: serde_yaml::Value = serde_yaml::from_str(&contents)
        .with_context(|| format!("Invalid manifest {}", path.display()))?;

    let names_namespace = value
        .get("namespace")
        .and_then(serde_yaml::Value::as_str)
        .is_some_and(|ns| !ns.trim().is_empty());

    let mut form: DeploymentForm = serde_yaml::from_value(value)
        .with_context(|| format!("Invalid manifest {}", path.display()))?;
    if !names_namespace {
        form.namespace = default_namespace.to_string();
    }
    Ok(form)
}

pub async fn handle_deploy_command(
    args: DeployArgs,
    ctx: &ConsoleContext,
    scope: &NamespaceScope,
    output_format: &str,
) -> Result<()> {
    let form = args.into_form(scope)?;
    let format = OutputFormat::from_str(output_format);

    let progress = spinner(format!(
        "Creating deployment '{}' in namespace {}...",
        form.name,
        form.effective_namespace()
    ));
    let result = ctx.workflow().submit_deployment(&form).await;
    progress.finish_and_clear();

    match result {
        Ok(outcome) => {
            if format != OutputFormat::Table {
                let created = serde_json::json!({
                    "deployment": outcome.workload,
                    "service": outcome.endpoint,
                });
                return output::print_single(&created, format, |_| String::new());
            }

            output::print_created("Deployment", &outcome.workload.namespace, &outcome.workload.name);
            if let Some(endpoint) = &outcome.endpoint {
                output::print_created("Service", &endpoint.namespace, &endpoint.name);
            }
            output::print_info(&format!(
                "Track it with: kubedeploy watch workloads -n {}",
                form.effective_namespace()
            ));
            Ok(())
        }
        Err(err) => {
            if err.is_partial() {
                output::print_warning(&format!(
                    "Deployment '{}' was created, but service '{}' was not",
                    form.name,
                    endpoint_name_for(&form.name)
                ));
            }
            Err(err.into())
        }
    }
}

///! Pod commands

use super::{confirm, settled_items, spinner, NamespaceScope};
use crate::output::{self, OutputFormat};
use crate::views::{self, PodRow};
use crate::PodCommands;
use anyhow::Result;
use kubedeploy_client::ConsoleContext;
use kubedeploy_common::transform::DeploymentForm;
use kubedeploy_common::{ContainerPort, EnvVar, Protocol};

pub async fn handle_pod_command(
    command: PodCommands,
    ctx: &ConsoleContext,
    scope: &NamespaceScope,
    output_format: &str,
) -> Result<()> {
    let format = OutputFormat::from_str(output_format);

    match command {
        PodCommands::List => {
            let pods = settled_items(ctx.watch_pods(scope.filter()).await).await?;
            let now = chrono::Utc::now();
            output::print_output(&pods, format, |p| PodRow::new(p, now))?;
        }

        PodCommands::Show { name } => {
            let pod = ctx.api().get_pod(scope.target(), &name).await?;
            output::print_single(&pod, format, views::pod_detail)?;
        }

        PodCommands::Delete { name, yes } => {
            let namespace = scope.target();
            if !confirm(&format!("Delete pod '{}/{}'?", namespace, name), yes)? {
                output::print_info("Cancelled");
                return Ok(());
            }

            ctx.workflow().delete_pod(namespace, &name).await?;
            output::print_deleted("Pod", namespace, &name);
        }

        PodCommands::Logs { name, tail } => {
            let logs = ctx.api().pod_logs(scope.target(), &name, tail).await?;
            if logs.is_empty() {
                output::print_info("No logs available");
            } else {
                print!("{}", logs);
                if !logs.ends_with('\n') {
                    println!();
                }
            }
        }

        PodCommands::Create {
            name,
            image,
            replicas,
            cpu,
            memory,
            ports,
            env,
        } => {
            let form = pod_form(scope.target(), name, image, replicas, cpu, memory, ports, env);

            let progress = spinner(format!("Creating pod '{}'...", form.name));
            let result = ctx.workflow().submit_pod(&form).await;
            progress.finish_and_clear();
            let pod = result?;

            if format == OutputFormat::Table {
                output::print_created("Pod", &pod.namespace, &pod.name);
            } else {
                output::print_single(&pod, format, views::pod_detail)?;
            }
        }
    }

    Ok(())
}

/// Quick-deploy form; no ports keeps the form's default port
#[allow(clippy::too_many_arguments)]
fn pod_form(
    namespace: &str,
    name: String,
    image: String,
    replicas: u32,
    cpu: String,
    memory: String,
    ports: Vec<u16>,
    env: Vec<EnvVar>,
) -> DeploymentForm {
    let mut form = DeploymentForm {
        name,
        image,
        namespace: namespace.to_string(),
        replicas,
        cpu_limit: cpu,
        memory_limit: memory,
        env,
        ..Default::default()
    };
    if !ports.is_empty() {
        form.ports = ports
            .into_iter()
            .map(|port| ContainerPort {
                name: String::new(),
                container_port: port,
                protocol: Protocol::Tcp,
            })
            .collect();
    }
    form
}

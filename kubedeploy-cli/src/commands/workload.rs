///! Deployment management commands

use super::{confirm, settled_items, spinner, NamespaceScope};
use crate::output::{self, OutputFormat};
use crate::views::{self, WorkloadRow};
use crate::WorkloadCommands;
use anyhow::Result;
use kubedeploy_client::ConsoleContext;
use kubedeploy_common::health::ScaleDirection;

pub async fn handle_workload_command(
    command: WorkloadCommands,
    ctx: &ConsoleContext,
    scope: &NamespaceScope,
    output_format: &str,
) -> Result<()> {
    let format = OutputFormat::from_str(output_format);

    match command {
        WorkloadCommands::List => {
            let workloads = settled_items(ctx.watch_workloads(scope.filter()).await).await?;
            let now = chrono::Utc::now();
            output::print_output(&workloads, format, |w| WorkloadRow::new(w, now))?;
        }

        WorkloadCommands::Show { name } => {
            let workload = ctx.api().get_workload(scope.target(), &name).await?;
            output::print_single(&workload, format, views::workload_detail)?;
        }

        WorkloadCommands::Delete { name, yes } => {
            let namespace = scope.target();
            let prompt = format!("Delete deployment '{}/{}'?", namespace, name);
            if !confirm(&prompt, yes)? {
                output::print_info("Cancelled");
                return Ok(());
            }

            ctx.workflow().delete_workload(namespace, &name).await?;
            output::print_deleted("Deployment", namespace, &name);
        }

        WorkloadCommands::ScaleUp { name } => {
            scale_step(ctx, scope.target(), &name, ScaleDirection::Up).await?;
        }

        WorkloadCommands::ScaleDown { name } => {
            scale_step(ctx, scope.target(), &name, ScaleDirection::Down).await?;
        }

        WorkloadCommands::Scale { name, replicas } => {
            let namespace = scope.target();
            let progress = spinner(format!("Scaling {} to {} replicas...", name, replicas));
            let result = ctx.workflow().scale_workload_to(namespace, &name, replicas).await;
            progress.finish_and_clear();
            result?;

            output::print_success(&format!("Deployment '{}' scaled to {} replicas", name, replicas));
        }
    }

    Ok(())
}

/// One step up or down from the replica count the server reports now
async fn scale_step(ctx: &ConsoleContext, namespace: &str, name: &str, direction: ScaleDirection) -> Result<()> {
    let workload = ctx.api().get_workload(namespace, name).await?;
    let replicas = ctx.workflow().scale_workload(&workload, direction).await?;

    output::print_success(&format!(
        "Deployment '{}' scaled from {} to {} replicas",
        name, workload.replicas, replicas
    ));
    Ok(())
}

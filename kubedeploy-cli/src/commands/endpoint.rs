///! Service commands

use super::{confirm, settled_items, NamespaceScope};
use crate::output::{self, OutputFormat};
use crate::views::{self, EndpointRow};
use crate::EndpointCommands;
use anyhow::Result;
use kubedeploy_client::ConsoleContext;

pub async fn handle_endpoint_command(
    command: EndpointCommands,
    ctx: &ConsoleContext,
    scope: &NamespaceScope,
    output_format: &str,
) -> Result<()> {
    let format = OutputFormat::from_str(output_format);

    match command {
        EndpointCommands::List => {
            let endpoints = settled_items(ctx.watch_endpoints(scope.filter()).await).await?;
            let now = chrono::Utc::now();
            output::print_output(&endpoints, format, |e| EndpointRow::new(e, now))?;
        }

        EndpointCommands::Show { name } => {
            let endpoint = ctx.api().get_endpoint(scope.target(), &name).await?;
            output::print_single(&endpoint, format, views::endpoint_detail)?;
        }

        EndpointCommands::Delete { name, yes } => {
            let namespace = scope.target();
            if !confirm(&format!("Delete service '{}/{}'?", namespace, name), yes)? {
                output::print_info("Cancelled");
                return Ok(());
            }

            ctx.workflow().delete_endpoint(namespace, &name).await?;
            output::print_deleted("Service", namespace, &name);
        }
    }

    Ok(())
}

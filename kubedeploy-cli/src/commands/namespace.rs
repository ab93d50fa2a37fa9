///! Namespace commands

use super::settled_items;
use crate::output::{self, OutputFormat};
use crate::views::NamespaceRow;
use crate::NamespaceCommands;
use anyhow::Result;
use kubedeploy_client::ConsoleContext;

pub async fn handle_namespace_command(
    command: NamespaceCommands,
    ctx: &ConsoleContext,
    output_format: &str,
) -> Result<()> {
    match command {
        NamespaceCommands::List => {
            let namespaces = settled_items(ctx.watch_namespaces().await).await?;
            output::print_output(&namespaces, OutputFormat::from_str(output_format), |name| NamespaceRow {
                name: name.clone(),
            })?;
        }
    }

    Ok(())
}

///! Kubedeploy CLI
///!
///! Command-line console for deploying and observing container workloads

mod commands;
mod config;
mod logging;
mod output;
mod views;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use commands::auth::AuthCommands;
use commands::deploy::DeployArgs;
use commands::NamespaceScope;
use kubedeploy_client::{ClientSettings, ConsoleContext, SyncConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API server address (defaults to the configured server)
    #[arg(short, long, global = true, env = "KUBEDEPLOY_SERVER")]
    server: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Namespace; lists show every namespace when omitted
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Login, signup and session management
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Create a deployment and, optionally, its service
    Deploy(DeployArgs),
    /// Manage deployments
    #[command(alias = "deployment")]
    Workload {
        #[command(subcommand)]
        command: WorkloadCommands,
    },
    /// Manage services
    #[command(alias = "service")]
    Endpoint {
        #[command(subcommand)]
        command: EndpointCommands,
    },
    /// Manage pods
    Pod {
        #[command(subcommand)]
        command: PodCommands,
    },
    /// List namespaces
    Namespace {
        #[command(subcommand)]
        command: NamespaceCommands,
    },
    /// Live-updating views
    Watch {
        #[command(subcommand)]
        command: WatchCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum WorkloadCommands {
    /// List deployments
    List,
    /// Show deployment details
    Show {
        /// Deployment name
        name: String,
    },
    /// Delete a deployment
    Delete {
        /// Deployment name
        name: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Add one replica
    ScaleUp {
        /// Deployment name
        name: String,
    },
    /// Remove one replica (never below zero)
    ScaleDown {
        /// Deployment name
        name: String,
    },
    /// Set the replica count
    Scale {
        /// Deployment name
        name: String,
        /// Desired replica count
        replicas: u32,
    },
}

#[derive(Subcommand)]
pub enum EndpointCommands {
    /// List services
    List,
    /// Show service details
    Show {
        /// Service name
        name: String,
    },
    /// Delete a service
    Delete {
        /// Service name
        name: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum PodCommands {
    /// List pods
    List,
    /// Show pod details
    Show {
        /// Pod name
        name: String,
    },
    /// Delete a pod
    Delete {
        /// Pod name
        name: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Print pod logs
    Logs {
        /// Pod name
        name: String,
        /// Number of trailing lines (server default 100)
        #[arg(short, long)]
        tail: Option<u32>,
    },
    /// Quick-deploy a single pod
    Create {
        /// Pod name
        #[arg(long)]
        name: String,
        /// Container image
        #[arg(short, long)]
        image: String,
        /// Replica count
        #[arg(short, long, default_value = "1")]
        replicas: u32,
        /// CPU quantity
        #[arg(long, default_value = "500m")]
        cpu: String,
        /// Memory quantity
        #[arg(long, default_value = "512Mi")]
        memory: String,
        /// Container port (repeatable)
        #[arg(short, long = "port")]
        ports: Vec<u16>,
        /// Environment variable as KEY=VALUE (repeatable)
        #[arg(short, long = "env")]
        env: Vec<kubedeploy_common::EnvVar>,
    },
}

#[derive(Subcommand)]
pub enum NamespaceCommands {
    /// List namespaces
    List,
}

#[derive(Subcommand)]
pub enum WatchCommands {
    /// Cluster overview with pod, deployment and service counts
    Dashboard,
    /// Deployments with readiness badges
    Workloads,
    /// Services
    Endpoints,
    /// Pods
    Pods,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let mut config = config::Config::load().unwrap_or_default();

    let logging = logging::LoggingConfig {
        level: cli.log_level.clone(),
        json_format: cli.log_format == LogFormat::Json,
        file_path: config.log_file.clone(),
    };
    let _log_guard = logging.init()?;

    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell);
        return Ok(());
    }

    let base_url = cli.server.clone().unwrap_or_else(|| config.server.clone());
    tracing::debug!(server = %base_url, "connecting");

    let ctx = ConsoleContext::connect(ClientSettings {
        base_url,
        timeout: config.request_timeout(),
        sync: SyncConfig::from(&config.sync),
        session: config.session(),
    })?;

    let output_format = cli.output.clone().unwrap_or_else(|| config.default_output.clone());
    let scope = NamespaceScope {
        explicit: cli.namespace.clone(),
        default: config.default_namespace.clone(),
    };

    // Execute command
    let result = match cli.command {
        Commands::Auth { command } => {
            commands::auth::handle_auth_command(command, &ctx, &mut config, &output_format).await
        }
        Commands::Deploy(args) => {
            commands::deploy::handle_deploy_command(args, &ctx, &scope, &output_format).await
        }
        Commands::Workload { command } => {
            commands::workload::handle_workload_command(command, &ctx, &scope, &output_format).await
        }
        Commands::Endpoint { command } => {
            commands::endpoint::handle_endpoint_command(command, &ctx, &scope, &output_format).await
        }
        Commands::Pod { command } => {
            commands::pod::handle_pod_command(command, &ctx, &scope, &output_format).await
        }
        Commands::Namespace { command } => {
            commands::namespace::handle_namespace_command(command, &ctx, &output_format).await
        }
        Commands::Watch { command } => {
            commands::watch::handle_watch_command(command, &ctx, &scope).await
        }
        Commands::Completions { .. } => Ok(()),
    };

    // A rejected token ends the stored session
    if ctx.session().is_expired() {
        config.clear_session();
        config.save()?;
        output::print_warning("Session expired. Run 'kubedeploy auth login' to sign in again");
    }

    result
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}

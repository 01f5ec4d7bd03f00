//! HA Config CLI
//!
//! Queries the HA configuration and the cluster node directory:
//!
//! ```text
//! ha-config version             # full and major product version
//! ha-config local-node          # name of this node
//! ha-config hw-env              # hardware environment tag
//! ha-config node-name <ID>      # node name for a node id
//! ha-config node-id <NAME>      # node id for a node name
//! ha-config nodes [--json]      # whole identity mapping
//! ```

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use ha_config::{
    ConfigRegistry, ConsulConfig, ConsulConnector, FileConfStore, InitOptions, NodeDirectory,
    RegistryConfig, Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// HA configuration and node directory queries
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Global config URL (e.g. yaml:///etc/ha/ha.conf)
    #[arg(long, env = "HA_CONFIG_URL")]
    config_file: Option<String>,

    /// Service name to log as; logging stays off when unset
    #[arg(long, env = "HA_LOG_SERVICE")]
    log_service: Option<String>,

    /// Log directory, overriding LOG>path
    #[arg(long, env = "HA_LOG_PATH")]
    log_path: Option<PathBuf>,

    /// Mirror logs to the console
    #[arg(long, env = "HA_LOG_CONSOLE", default_value_t = true, action = ArgAction::Set)]
    log_console: bool,

    /// Consul ACL token
    #[arg(long, env = "CONSUL_HTTP_TOKEN")]
    consul_token: Option<String>,

    /// Consul request timeout in seconds
    #[arg(long, env = "CONSUL_TIMEOUT", default_value = "10")]
    consul_timeout_secs: u64,

    /// Coalesce identical in-flight KV requests
    #[arg(long, env = "HA_KV_BATCHING")]
    batching: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the product version and its major component
    Version,
    /// Print the local node name
    LocalNode,
    /// Print the hardware environment tag
    HwEnv,
    /// Resolve a node id to its node name
    NodeName { node_id: String },
    /// Resolve a node name to its node id
    NodeId { node_name: String },
    /// List every node in the identity mapping
    Nodes {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let connector = ConsulConnector::new(ConsulConfig {
        timeout: Duration::from_secs(args.consul_timeout_secs),
        token: args.consul_token.clone(),
    });
    let registry = ConfigRegistry::with_backends(
        RegistryConfig::default(),
        Arc::new(FileConfStore::new()),
        Arc::new(connector),
    );

    let mut options = InitOptions::new(args.log_service.clone().unwrap_or_default());
    options.log_path = args.log_path.clone();
    options.console_output = args.log_console;
    options.config_file = args.config_file.clone();

    let _guard = registry.init(&options)?;
    info!("HA config {} initialized", ha_config::VERSION);

    run(&args, registry).await
}

async fn run(args: &Args, registry: Arc<ConfigRegistry>) -> Result<()> {
    match &args.command {
        Command::Version => {
            println!("{} (major {})", registry.version()?, registry.major_version()?);
        }
        Command::LocalNode => println!("{}", registry.local_node()?),
        Command::HwEnv => println!("{}", registry.hw_env()?),
        Command::NodeName { node_id } => {
            let directory = directory(args, &registry)?;
            println!("{}", directory.resolve_node_name(node_id).await?);
        }
        Command::NodeId { node_name } => {
            let directory = directory(args, &registry)?;
            println!("{}", directory.resolve_node_id(node_name).await?);
        }
        Command::Nodes { json } => {
            let nodes = directory(args, &registry)?.list_nodes().await?;
            if *json {
                let rendered = serde_json::to_string_pretty(&nodes)
                    .map_err(|e| ha_config::Error::Configuration(e.to_string()))?;
                println!("{}", rendered);
            } else {
                for node in nodes {
                    println!("{}\t{}", node.name, node.id);
                }
            }
        }
    }
    Ok(())
}

/// Build the directory, fixing the client's batching mode first
fn directory(args: &Args, registry: &Arc<ConfigRegistry>) -> Result<NodeDirectory> {
    registry.directory_client(args.batching)?;
    Ok(NodeDirectory::new(registry.clone()))
}

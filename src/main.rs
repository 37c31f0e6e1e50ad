use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cloudstack_provider::provider::{
    self, Capability, CloudProvider, Instances, InstancesV2, Node, NodeName, ProviderRegistry,
    Zones, PROVIDER_NAME,
};
use serde::Serialize;
use serde_json::json;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Query CloudStack the way the orchestrator's cloud provider does
#[derive(Parser, Debug)]
#[command(name = "cloudstack-provider", version, about, long_about = None)]
struct Args {
    /// Path to the cloud-config file
    #[arg(short, long, env = "CLOUDSTACK_CLOUD_CONFIG")]
    cloud_config: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show which capabilities the provider supports
    Capabilities,
    /// Zone of the host this command runs on
    Zone,
    /// Zone of a node, by node name
    ZoneByNode { name: String },
    /// Zone of a node, by provider ID
    ZoneByProviderId { provider_id: String },
    /// Addresses of a node, by node name
    Addresses { name: String },
    /// Addresses of a node, by provider ID
    AddressesByProviderId { provider_id: String },
    /// Provider ID of a node
    InstanceId { name: String },
    /// Instance type of a node, by node name
    InstanceType { name: String },
    /// Instance type of a node, by provider ID
    InstanceTypeByProviderId { provider_id: String },
    /// Whether a node's instance still exists, by node name
    Exists { name: String },
    /// Whether an instance still exists, by provider ID
    ExistsByProviderId { provider_id: String },
    /// Type, addresses and zone of a node
    Metadata { name: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // RUST_LOG narrows the level chosen on the command line
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.to_string().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("cloudstack-provider started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir
            .join("cloudstack-provider")
            .join("cloudstack-provider.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cloudstack-provider").join("cloudstack-provider.log");
    }
    PathBuf::from("cloudstack-provider.log")
}

/// Build the provider through the registry, as an orchestrator host would
fn build_provider(config_path: Option<&Path>) -> Result<Box<dyn CloudProvider>> {
    let mut registry = ProviderRegistry::new();
    provider::register(&mut registry)?;

    let mut file = config_path
        .map(|path| File::open(path).with_context(|| format!("Failed to open {:?}", path)))
        .transpose()?;
    let config = file.as_mut().map(|f| f as &mut dyn Read);

    registry
        .get_cloud_provider(PROVIDER_NAME, config)?
        .context("CloudStack provider is not registered")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn instances(cloud: &dyn CloudProvider) -> Result<&dyn Instances> {
    cloud
        .instances()
        .context("provider does not support instances")
}

fn instances_v2(cloud: &dyn CloudProvider) -> Result<&dyn InstancesV2> {
    cloud
        .instances_v2()
        .context("provider does not support instances-v2")
}

fn zones(cloud: &dyn CloudProvider) -> Result<&dyn Zones> {
    cloud.zones().context("provider does not support zones")
}

async fn run(cloud: &dyn CloudProvider, command: Command) -> Result<()> {
    match command {
        Command::Capabilities => {
            let capabilities: serde_json::Map<String, serde_json::Value> = Capability::ALL
                .iter()
                .map(|c| (c.to_string(), json!(cloud.supports(*c))))
                .collect();
            print_json(&json!({
                "provider": cloud.provider_name(),
                "hasClusterID": cloud.has_cluster_id(),
                "capabilities": capabilities,
            }))
        }
        Command::Zone => print_json(&zones(cloud)?.get_zone().await?),
        Command::ZoneByNode { name } => {
            print_json(&zones(cloud)?.get_zone_by_node_name(&NodeName(name)).await?)
        }
        Command::ZoneByProviderId { provider_id } => {
            print_json(&zones(cloud)?.get_zone_by_provider_id(&provider_id).await?)
        }
        Command::Addresses { name } => {
            print_json(&instances(cloud)?.node_addresses(&NodeName(name)).await?)
        }
        Command::AddressesByProviderId { provider_id } => print_json(
            &instances(cloud)?
                .node_addresses_by_provider_id(&provider_id)
                .await?,
        ),
        Command::InstanceId { name } => {
            print_json(&instances(cloud)?.instance_id(&NodeName(name)).await?)
        }
        Command::InstanceType { name } => {
            print_json(&instances(cloud)?.instance_type(&NodeName(name)).await?)
        }
        Command::InstanceTypeByProviderId { provider_id } => print_json(
            &instances(cloud)?
                .instance_type_by_provider_id(&provider_id)
                .await?,
        ),
        Command::Exists { name } => {
            print_json(&instances_v2(cloud)?.instance_exists(&Node::new(&name)).await?)
        }
        Command::ExistsByProviderId { provider_id } => print_json(
            &instances(cloud)?
                .instance_exists_by_provider_id(&provider_id)
                .await?,
        ),
        Command::Metadata { name } => {
            print_json(&instances_v2(cloud)?.instance_metadata(&Node::new(&name)).await?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let cloud = build_provider(args.cloud_config.as_deref())
        .context("Failed to initialize CloudStack provider")?;
    cloud.initialize();

    run(cloud.as_ref(), args.command).await
}

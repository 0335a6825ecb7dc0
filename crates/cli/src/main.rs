//! Layer Ledger Command Line Interface
//!
//! Runs layer registry transactions against a local sled ledger.

mod settings;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use layer_ledger_registry::{
    ContractInfo, JsonLayerCodec, Layer, LayerCodec, LayerContract, LayerRegistry,
    LayerTransaction, RegistryConfig, RegistryError, SledStateStore, TransactionFailure,
};
use serde_json::{json, Value};
use settings::{AppConfig, LogFormat};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "layer-ledger")]
#[command(about = "Container image layer ledger", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ledger data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level filter, e.g. `debug` or `layer_ledger_registry=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one layer
    Query { layer_id: String },
    /// Show a layer followed by each of its ancestors
    Chain { layer_id: String },
    /// Register a new layer
    Add(AddArgs),
    /// Record a vulnerability found in a layer
    AddVulnerability {
        layer_id: String,
        vulnerability_id: String,
    },
    /// List stored layers one page at a time
    List {
        /// Page id returned by a previous listing
        #[arg(long, default_value = "")]
        page_id: String,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
    },
    /// Call a contract function by name with raw string arguments
    Invoke {
        function: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Show contract metadata and resolved configuration
    Info,
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    id: String,
    /// Parent layer id; omit for a root layer
    #[arg(long, default_value = "")]
    parent: String,
    /// Layer document as JSON
    #[arg(long, conflicts_with = "payload_file")]
    payload: Option<String>,
    /// File containing the layer document
    #[arg(long)]
    payload_file: Option<PathBuf>,
}

impl AddArgs {
    /// Payload from the flags, or a fresh document built from id and parent.
    fn resolve_payload(&self) -> Result<String> {
        if let Some(payload) = &self.payload {
            return Ok(payload.clone());
        }
        if let Some(path) = &self.payload_file {
            return fs::read_to_string(path)
                .with_context(|| format!("Failed to read payload file {}", path.display()));
        }
        let layer = Layer::new(self.id.clone(), self.parent.clone());
        Ok(JsonLayerCodec.encode(&layer)?)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    init_logging(&config)?;

    let tx = match cli.command {
        Commands::Info => {
            print_info(&config)?;
            return Ok(ExitCode::SUCCESS);
        }
        command => match build_transaction(command) {
            Ok(tx) => tx,
            Err(err) => match transaction_failure(&err) {
                Some(failure) => return print_failure(&failure),
                None => return Err(err),
            },
        },
    };

    let store = SledStateStore::open_tree(&config.data_dir, &config.tree).with_context(|| {
        format!("Failed to open ledger at {}", config.data_dir.display())
    })?;
    let registry = LayerRegistry::new(store).with_config(RegistryConfig {
        max_chain_depth: config.max_chain_depth,
    })?;
    let contract = LayerContract::new(registry);

    match contract.execute(&tx) {
        Ok(result) => {
            if tx.is_submit() {
                contract.registry().store().flush()?;
                info!(function = tx.function(), "Transaction committed");
            }
            let json: Value = serde_json::from_str(&result)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => print_failure(&TransactionFailure::from(&err)),
    }
}

/// Registry rejections raised while building a transaction, such as an
/// unknown function name or a malformed page size.
fn transaction_failure(err: &anyhow::Error) -> Option<TransactionFailure> {
    err.downcast_ref::<RegistryError>()
        .map(TransactionFailure::from)
}

fn print_failure(failure: &TransactionFailure) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(failure)?);
    Ok(ExitCode::FAILURE)
}

fn build_transaction(command: Commands) -> Result<LayerTransaction> {
    let tx = match command {
        Commands::Query { layer_id } => LayerTransaction::QueryLayer { layer_id },
        Commands::Chain { layer_id } => LayerTransaction::QueryLayerWithParents { layer_id },
        Commands::Add(args) => LayerTransaction::AddLayer {
            payload: args.resolve_payload()?,
            layer_id: args.id,
            parent_layer_id: args.parent,
        },
        Commands::AddVulnerability {
            layer_id,
            vulnerability_id,
        } => LayerTransaction::AddVulnerabilityToLayer {
            layer_id,
            vulnerability_id,
        },
        Commands::List { page_id, page_size } => {
            LayerTransaction::QueryPagedLayers { page_id, page_size }
        }
        Commands::Invoke { function, args } => LayerTransaction::parse(&function, &args)?,
        Commands::Info => anyhow::bail!("info does not run a transaction"),
    };
    Ok(tx)
}

fn print_info(config: &AppConfig) -> Result<()> {
    let json = json!({
        "contract": ContractInfo::current(),
        "functions": LayerTransaction::FUNCTIONS,
        "dataDir": config.data_dir,
        "tree": config.tree,
        "maxChainDepth": config.max_chain_depth,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Logs go to stderr so stdout carries only transaction results.
fn init_logging(config: &AppConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    Ok(())
}

//! DataPact command line client
//!
//! Create bounties, submit labels, and inspect bounties and transactions on
//! Sui from the terminal. Signing goes through an external wallet bridge;
//! this binary never holds keys.
//!
//! Results are printed to stdout as JSON, logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use datapact_client::bounty::{get_bounty, list_bounties, list_bounty_files};
use datapact_client::config::Config;
use datapact_client::metrics::metrics;
use datapact_client::orchestrator::TransactionOrchestrator;
use datapact_client::response::{parse_transaction_response, TransactionBlockResponse};
use datapact_client::tx_builder::{build_create_bounty_transaction, build_submit_label_transaction};
use datapact_client::validation::{
    validate_create_bounty, validate_submit_label, CreateBountyForm, SubmitLabelForm,
};
use datapact_client::wallet::{HttpWalletBridge, WalletSession};
use datapact_client::SuiRpcClient;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "datapact", author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "datapact.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a bounty and wait for it to finalize
    CreateBounty(CreateBountyArgs),
    /// Submit a label and wait for it to finalize
    SubmitLabel(SubmitLabelArgs),
    /// Print the unsigned create-bounty call
    BuildCreateBounty(CreateBountyArgs),
    /// Print the unsigned submit-label call
    BuildSubmitLabel(SubmitLabelArgs),
    /// Wait for a submitted transaction and print its result
    Wait {
        digest: String,
    },
    /// Submit an already signed transaction
    Execute {
        /// Base64 transaction bytes
        #[arg(long)]
        tx_bytes: String,
        /// Serialized signature (repeatable)
        #[arg(long = "signature", required = true)]
        signatures: Vec<String>,
    },
    /// Parse a saved finality response (JSON)
    Parse {
        file: PathBuf,
    },
    /// List bounties
    Bounties,
    /// Show one bounty
    Bounty {
        id: String,
    },
    /// List the files of a bounty's blob table
    Files {
        table_id: String,
    },
    /// Print metrics in Prometheus text format
    Metrics,
}

#[derive(ClapArgs, Debug)]
struct CreateBountyArgs {
    #[arg(long)]
    name: String,
    /// File and blob id as NAME=BLOB_ID (repeatable, order is kept)
    #[arg(long = "file", value_parser = parse_file_pair)]
    files: Vec<(String, String)>,
    /// Allowed label (repeatable)
    #[arg(long = "label")]
    labels: Vec<String>,
    #[arg(long)]
    total_images: f64,
    /// Reward in SUI
    #[arg(long)]
    reward: f64,
    /// Sender address (defaults to [wallet] address)
    #[arg(long)]
    address: Option<String>,
}

impl CreateBountyArgs {
    fn form(&self) -> CreateBountyForm {
        CreateBountyForm {
            name: self.name.clone(),
            file_names: self.files.iter().map(|(name, _)| name.clone()).collect(),
            blob_ids: self.files.iter().map(|(_, blob)| blob.clone()).collect(),
            allowed_labels: self.labels.clone(),
            total_images: self.total_images,
            reward_amount: self.reward,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct SubmitLabelArgs {
    #[arg(long)]
    bounty: String,
    #[arg(long)]
    file: String,
    #[arg(long)]
    label: String,
    /// Sender address (defaults to [wallet] address)
    #[arg(long)]
    address: Option<String>,
}

impl SubmitLabelArgs {
    fn form(&self) -> SubmitLabelForm {
        SubmitLabelForm {
            bounty_object_id: self.bounty.clone(),
            file_name: self.file.clone(),
            label: self.label.clone(),
        }
    }
}

fn parse_file_pair(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, blob)) => Ok((name.to_string(), blob.to_string())),
        None => Err(format!("expected NAME=BLOB_ID, got '{}'", value)),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(args.verbose, args.log_json);

    info!("🚀 DataPact client v{}", env!("CARGO_PKG_VERSION"));
    info!("📋 Loading configuration from: {}", args.config.display());
    let config = Config::from_file_with_env(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    info!("🌐 Network: {} ({})", config.network.name, config.network.rpc_url());

    run(args.command, config).await
}

async fn run(command: Command, config: Config) -> Result<ExitCode> {
    match command {
        Command::CreateBounty(args) => {
            let params = match validate_create_bounty(&args.form()) {
                Ok(params) => params,
                Err(errors) => return invalid_input(&errors),
            };
            let orchestrator = orchestrator(&config)?;
            let session = session(&config, args.address);
            info!("📝 Creating bounty '{}' with {} files", params.name, params.file_name_list.len());

            let outcome = orchestrator.create_bounty(&session, &params).await;
            print_json(&outcome)?;
            Ok(exit_code(outcome.result.success))
        }
        Command::SubmitLabel(args) => {
            let params = match validate_submit_label(&args.form()) {
                Ok(params) => params,
                Err(errors) => return invalid_input(&errors),
            };
            let orchestrator = orchestrator(&config)?;
            let session = session(&config, args.address);
            info!("🏷️  Submitting label '{}' for {}", params.label, params.file_name);

            let outcome = orchestrator.submit_label(&session, &params).await;
            print_json(&outcome)?;
            Ok(exit_code(outcome.result.success))
        }
        Command::BuildCreateBounty(args) => {
            let params = match validate_create_bounty(&args.form()) {
                Ok(params) => params,
                Err(errors) => return invalid_input(&errors),
            };
            let call = build_create_bounty_transaction(&config.contract, &params)?;
            print_json(&call)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::BuildSubmitLabel(args) => {
            let params = match validate_submit_label(&args.form()) {
                Ok(params) => params,
                Err(errors) => return invalid_input(&errors),
            };
            let call = build_submit_label_transaction(&config.contract, &params)?;
            print_json(&call)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Wait { digest } => {
            let orchestrator = orchestrator(&config)?;
            info!("⏳ Waiting for {}", digest);
            let result = orchestrator.wait_and_parse(&digest).await;
            print_json(&result)?;
            Ok(exit_code(result.success))
        }
        Command::Execute { tx_bytes, signatures } => {
            let orchestrator = orchestrator(&config)?;
            let result = orchestrator.execute_signed(&tx_bytes, &signatures).await;
            print_json(&result)?;
            Ok(exit_code(result.success))
        }
        Command::Parse { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let response: TransactionBlockResponse =
                serde_json::from_str(&content).context("Not a transaction block response")?;
            let result = parse_transaction_response(&response);
            print_json(&result)?;
            Ok(exit_code(result.success))
        }
        Command::Bounties => {
            let client = SuiRpcClient::from_config(&config)?;
            let bounties = list_bounties(&client, &config.contract).await?;
            info!("📚 Found {} bounties", bounties.len());
            print_json(&bounties)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Bounty { id } => {
            let client = SuiRpcClient::from_config(&config)?;
            let bounty = get_bounty(&client, &id).await?;
            print_json(&bounty)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Files { table_id } => {
            let client = SuiRpcClient::from_config(&config)?;
            let files = list_bounty_files(&client, &table_id).await?;
            print_json(&files)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Metrics => {
            print!("{}", metrics().render()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn orchestrator(config: &Config) -> Result<TransactionOrchestrator> {
    let chain = SuiRpcClient::from_config(config).context("Failed to create RPC client")?;

    let bridge_url = config.wallet.bridge_url.as_deref().context(
        "No wallet bridge configured; set [wallet] bridge_url or DATAPACT_WALLET_BRIDGE_URL",
    )?;
    let signer = HttpWalletBridge::new(bridge_url).context("Failed to create wallet bridge client")?;
    info!("🔑 Wallet bridge: {}", signer.endpoint());

    Ok(
        TransactionOrchestrator::new(Arc::new(chain), Arc::new(signer), config.contract.clone())
            .with_finality_policy(config.finality.retry_options()),
    )
}

fn session(config: &Config, address: Option<String>) -> WalletSession {
    let session = WalletSession::from_address(address.or_else(|| config.wallet.address.clone()));
    match session.address() {
        Some(address) => info!("💼 Sender: {}", address),
        None => warn!("No wallet address given"),
    }
    session
}

fn invalid_input(errors: &datapact_client::validation::FieldErrors) -> Result<ExitCode> {
    warn!("Input rejected: {}", errors);
    print_json(errors)?;
    Ok(ExitCode::from(2))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize logging; output goes to stderr so stdout stays machine-readable
fn init_logging(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "datapact=debug,datapact_client=debug,info"
    } else {
        "info"
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

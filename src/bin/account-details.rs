use std::{fs::File, path::PathBuf};

use account_details::{
    aggregator::{AccountDetailsAggregator, AccountDetailsError},
    bin_utils::{Service, collect_account_ids},
    config::ExplorerConfig,
    lockup::derive_lockup_id,
    logging::{LogFormat, init_logging},
    query::json_rpc::{JsonRpcLedgerClient, NodeRequest},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "account-details",
    about = "Balance breakdown of ledger accounts, lockups included"
)]
struct Cli {
    /// TOML config file; flags and env vars override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Network name, used in logs.
    #[arg(long, env = "EXPLORER_NETWORK")]
    network: Option<String>,

    /// JSON-RPC endpoint of the node.
    #[arg(long, env = "EXPLORER_RPC_URL")]
    rpc_url: Option<String>,

    /// Suffix of lockup account ids, e.g. `lockup.near`.
    #[arg(long, env = "EXPLORER_LOCKUP_SUFFIX")]
    lockup_suffix: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "EXPLORER_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[arg(long, env = "EXPLORER_LOG_LEVEL")]
    log_level: Option<String>,

    /// `human` or `json`.
    #[arg(long, env = "EXPLORER_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print account details of many accounts as CSV.
    Details {
        account_ids: Vec<String>,
        /// CSV file with an `account_id` column.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Print account details of one account as JSON (`null` if it does not exist).
    Json { account_id: String },
    /// Print the lockup account id owned by an account.
    LockupId { account_id: String },
    #[command(flatten)]
    Node(NodeCommand),
}

/// Node reads printed as raw JSON.
#[derive(Subcommand)]
enum NodeCommand {
    /// Print the node's raw `view_account` reply.
    ViewAccount { account_id: String },
    /// Print the access keys of an account.
    ViewAccessKeyList { account_id: String },
    /// Print the status of a transaction.
    Tx {
        tx_hash: String,
        /// Account that signed the transaction.
        sender_account_id: String,
    },
    /// Print the latest final block.
    FinalBlock,
    /// Print the node status.
    Status,
    /// Print the current validators.
    Validators,
}

impl NodeCommand {
    fn request(&self) -> NodeRequest<'_> {
        match self {
            Self::ViewAccount { account_id } => NodeRequest::ViewAccount { account_id },
            Self::ViewAccessKeyList { account_id } => NodeRequest::ViewAccessKeyList { account_id },
            Self::Tx {
                tx_hash,
                sender_account_id,
            } => NodeRequest::Tx {
                tx_hash,
                sender_account_id,
            },
            Self::FinalBlock => NodeRequest::FinalBlock,
            Self::Status => NodeRequest::Status,
            Self::Validators => NodeRequest::Validators,
        }
    }
}

impl Cli {
    fn load_config(&self) -> Result<ExplorerConfig> {
        let mut config = match &self.config {
            Some(path) => ExplorerConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load `{}`", path.display()))?,
            None => ExplorerConfig::default(),
        };
        if let Some(network) = &self.network {
            config.network_name = network.clone();
        }
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        }
        if let Some(lockup_suffix) = &self.lockup_suffix {
            config.lockup_suffix = lockup_suffix.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.request_timeout_secs = timeout_secs;
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        }
        if let Some(log_format) = self.log_format {
            config.log_format = log_format;
        }
        config.validate()?;
        Ok(config)
    }
}

fn connect(config: &ExplorerConfig) -> Result<JsonRpcLedgerClient> {
    JsonRpcLedgerClient::new(
        config.rpc_url.clone(),
        config.request_timeout(),
        config.connect_timeout(),
    )
    .with_context(|| format!("Failed to set up client for `{}`", config.rpc_url))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Details { account_ids, input } => {
            let input = input
                .map(|path| {
                    File::open(&path).with_context(|| format!("Failed to open `{}`", path.display()))
                })
                .transpose()?;
            let account_ids = collect_account_ids(account_ids, input)?;
            let aggregator =
                AccountDetailsAggregator::new(config.aggregator_config(), connect(&config)?);
            let service = Service {
                aggregator: &aggregator,
                output: &mut std::io::stdout(),
                error_printer: Box::new(|position: usize, account_id: &str, err: AccountDetailsError| {
                    eprintln!("Error for account #{position} `{account_id}`: {err}");
                    let mut source = std::error::Error::source(&err);
                    while let Some(cause) = source {
                        eprintln!("  caused by: {cause}");
                        source = cause.source();
                    }
                }),
            };
            service.run(account_ids).await
        }
        Command::Json { account_id } => {
            let aggregator =
                AccountDetailsAggregator::new(config.aggregator_config(), connect(&config)?);
            let details = aggregator.get_account_details(&account_id).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
            Ok(())
        }
        Command::LockupId { account_id } => {
            println!("{}", derive_lockup_id(&account_id, &config.lockup_suffix));
            Ok(())
        }
        Command::Node(node) => {
            let request = node.request();
            let reply = connect(&config)?
                .send(request)
                .await
                .with_context(|| format!("`{}` request failed", request.method()))?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
            Ok(())
        }
    }
}

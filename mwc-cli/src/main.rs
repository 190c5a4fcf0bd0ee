//! MWC Command Line Interface

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use mwc_core::{classify, required_fee, Currency, RecipientAddress};
use mwc_wallet::{
    compute_status, format_transaction, prepare_draft, validate_transaction_response, Account,
    AccountRaw, RuntimeProfile, Transaction, TransactionRaw, WalletConfig,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mwc")]
#[command(about = "MimbleWimble Coin transaction toolkit")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the fee of a transaction shape
    Fee {
        /// Currency id, e.g. mimblewimble_coin or grin
        #[arg(long, default_value = "mimblewimble_coin")]
        currency: Currency,
        #[arg(long, default_value_t = 1)]
        inputs: u64,
        #[arg(long, default_value_t = 2)]
        outputs: u64,
        #[arg(long, default_value_t = 1)]
        kernels: u64,
        /// Base fee override; the consensus default otherwise
        #[arg(long)]
        base_fee: Option<u64>,
    },
    /// Classify a recipient address
    Classify {
        #[arg(long, default_value = "mimblewimble_coin")]
        currency: Currency,
        recipient: String,
    },
    /// Compute the status of a draft against an account
    Status {
        /// Account in raw JSON form
        #[arg(long)]
        account: PathBuf,
        /// Draft in raw JSON form
        #[arg(long)]
        transaction: PathBuf,
        /// Override the configured runtime profile
        #[arg(long)]
        runtime: Option<Runtime>,
    },
    /// Validate a recipient's response to a draft
    ValidateResponse {
        #[arg(long, default_value = "mimblewimble_coin")]
        currency: Currency,
        /// Draft in raw JSON form
        #[arg(long)]
        transaction: PathBuf,
        /// File holding the response
        response: PathBuf,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum Runtime {
    Desktop,
    Embedded,
}

impl From<Runtime> for RuntimeProfile {
    fn from(runtime: Runtime) -> Self {
        match runtime {
            Runtime::Desktop => RuntimeProfile::Desktop,
            Runtime::Embedded => RuntimeProfile::Embedded,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Classification {
    class: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_key: Option<String>,
    requires_indirect_transport: bool,
}

impl From<&RecipientAddress> for Classification {
    fn from(address: &RecipientAddress) -> Self {
        let class = match address {
            RecipientAddress::Empty => "empty",
            RecipientAddress::Http(_) => "http",
            RecipientAddress::OnionUrl(_) => "onion_url",
            RecipientAddress::Tor(_) => "tor",
            RecipientAddress::Slatepack(_) => "slatepack",
            RecipientAddress::Invalid => "invalid",
        };
        Self {
            class,
            public_key: address.public_key().map(hex::encode),
            requires_indirect_transport: address.requires_indirect_transport(),
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<WalletConfig> {
    let path = path.map_or_else(WalletConfig::default_config_path, Path::to_path_buf);
    if !path.exists() {
        debug!(path = %path.display(), "no configuration file, using defaults");
        return Ok(WalletConfig::default());
    }
    let config = WalletConfig::load_from_file(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    if let Err(problem) = config.validate() {
        bail!("invalid configuration {}: {}", path.display(), problem);
    }
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(config: &WalletConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config, cli.verbose);

    match cli.command {
        Commands::Fee {
            currency,
            inputs,
            outputs,
            kernels,
            base_fee,
        } => {
            let base_fee = base_fee.unwrap_or_else(|| mwc_core::default_base_fee(currency));
            let fee = required_fee(currency, inputs, outputs, kernels, base_fee);
            println!("Fee: {}", currency.format_amount(fee, true));
            println!("Base fee: {}", base_fee);
            println!("Maximum fee: {}", mwc_core::maximum_fee(currency));
        }

        Commands::Classify { currency, recipient } => {
            let address = classify(currency, &recipient);
            print_json(&Classification::from(&address))?;
        }

        Commands::Status {
            account,
            transaction,
            runtime,
        } => {
            let account = Account::from_raw(&read_json::<AccountRaw>(&account)?)?;
            let draft = Transaction::from_raw(&read_json::<TransactionRaw>(&transaction)?)?;
            let runtime = runtime.map_or(config.runtime.profile, RuntimeProfile::from);

            let draft = prepare_draft(&account, &draft, runtime);
            info!(account = %account.id, "{}", format_transaction(&draft, account.currency));
            print_json(&compute_status(&account, &draft, runtime))?;
        }

        Commands::ValidateResponse {
            currency,
            transaction,
            response,
        } => {
            let draft = Transaction::from_raw(&read_json::<TransactionRaw>(&transaction)?)?;
            let response = std::fs::read_to_string(&response)
                .with_context(|| format!("reading {}", response.display()))?;
            print_json(&validate_transaction_response(currency, &draft, &response))?;
        }

        Commands::Config { action } => {
            let path = cli.config.unwrap_or_else(WalletConfig::default_config_path);
            match action {
                ConfigAction::Init { force } => {
                    if path.exists() && !force {
                        bail!("{} already exists; pass --force to overwrite", path.display());
                    }
                    WalletConfig::default().save_to_file(&path)?;
                    println!("Configuration written to {}", path.display());
                }
                ConfigAction::Show => {
                    println!("# {}", path.display());
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
        }
    }

    Ok(())
}

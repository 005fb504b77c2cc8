mod config;
mod error;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use catalog::{Catalog, UtilityProvider};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use engine::{Engine, ExecutionOutcome, ReqwestTransport, StaticOAuthBackend};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use vault::{SecretStore, SqliteSecretStore};

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "toolgate.toml";

#[derive(Parser)]
#[command(name = "toolgate")]
#[command(about = "Run declaratively described API tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tools in the catalog
    Tools,
    /// Print a tool configuration as JSON
    Show {
        /// Tool id
        id: String,
    },
    /// Execute a tool and print the outcome as JSON
    Run {
        /// Tool id
        id: String,
        /// User the tool runs for
        #[arg(short, long)]
        user: String,
        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
    /// Manage stored secrets and action confirmations
    Secret {
        #[command(subcommand)]
        command: SecretCommands,
    },
}

#[derive(Subcommand)]
enum SecretCommands {
    /// Store a secret (reads the value from stdin when omitted)
    Set {
        #[arg(short, long)]
        user: String,
        provider: UtilityProvider,
        key: String,
        value: Option<String>,
    },
    /// Delete a secret
    Delete {
        #[arg(short, long)]
        user: String,
        provider: UtilityProvider,
        key: String,
    },
    /// List stored keys without their values
    List {
        #[arg(short, long)]
        user: String,
        provider: UtilityProvider,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Tools => cmd_tools(&config),
        Commands::Show { id } => cmd_show(&config, &id),
        Commands::Run { id, user, params } => cmd_run(&config, &id, &user, &params).await,
        Commands::Secret { command } => cmd_secret(&config, command).await,
    }
}

fn cmd_tools(config: &Config) -> Result<ExitCode> {
    let catalog = Catalog::load(&config.catalog)?;

    if catalog.is_empty() {
        println!("No tools in {}.", config.catalog.display());
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<28}  {:<10}  {:<8}  DESCRIPTION", "ID", "PROVIDER", "AUTH");
    println!("{}", "-".repeat(80));

    for tool in catalog.list() {
        let auth = match tool.auth_method {
            catalog::AuthMethod::None => "none",
            catalog::AuthMethod::ApiKey => "api_key",
            catalog::AuthMethod::OAuth => "oauth",
        };
        println!(
            "{:<28}  {:<10}  {:<8}  {}",
            tool.id, tool.utility_provider, auth, tool.description
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_show(config: &Config, id: &str) -> Result<ExitCode> {
    let catalog = Catalog::load(&config.catalog)?;
    let tool = find_tool(&catalog, config, id)?;
    println!("{}", serde_json::to_string_pretty(tool)?);
    Ok(ExitCode::SUCCESS)
}

async fn cmd_run(config: &Config, id: &str, user: &str, params: &str) -> Result<ExitCode> {
    let catalog = Catalog::load(&config.catalog)?;
    let tool = find_tool(&catalog, config, id)?;
    let params: Value = serde_json::from_str(params).map_err(Error::InvalidParams)?;

    let engine = Engine::with_config(
        open_store(config)?,
        StaticOAuthBackend::new(config.oauth.clone()),
        ReqwestTransport::new(),
        config.engine_config(),
    );

    info!(tool = %tool.id, "running tool");
    let outcome = engine.execute(tool, user, &params).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(ExitCode::from(exit_code(&outcome)))
}

async fn cmd_secret(config: &Config, command: SecretCommands) -> Result<ExitCode> {
    let store = open_store(config)?;

    match command {
        SecretCommands::Set {
            user,
            provider,
            key,
            value,
        } => {
            let value = match value {
                Some(value) => value,
                None => read_value()?,
            };
            store.set(&user, provider.as_str(), &key, &value).await?;
            println!("Stored {key} for {user} ({provider}).");
        }
        SecretCommands::Delete {
            user,
            provider,
            key,
        } => {
            if store.delete(&user, provider.as_str(), &key).await? {
                println!("Deleted {key} for {user} ({provider}).");
            } else {
                println!("No {key} stored for {user} ({provider}).");
            }
        }
        SecretCommands::List { user, provider } => {
            let entries = store.list_keys(&user, provider.as_str())?;
            if entries.is_empty() {
                println!("No secrets stored for {user} ({provider}).");
            }
            for entry in entries {
                let updated = Local
                    .from_utc_datetime(&entry.updated_at.naive_utc())
                    .format("%Y-%m-%d %H:%M");
                println!("{:<32}  {updated}", entry.key);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// 0 on success, 2 when setup is needed, 1 on error.
fn exit_code(outcome: &ExecutionOutcome) -> u8 {
    match outcome {
        ExecutionOutcome::Success { .. } => 0,
        ExecutionOutcome::SetupNeeded(_) => 2,
        ExecutionOutcome::Error { .. } => 1,
    }
}

fn find_tool<'a>(
    catalog: &'a Catalog,
    config: &Config,
    id: &str,
) -> Result<&'a catalog::ToolConfig> {
    catalog.get(id).ok_or_else(|| Error::ToolNotFound {
        id: id.to_string(),
        catalog: config.catalog.clone(),
    })
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        debug!(path = %path.display(), "loading config");
        Ok(Config::load(path)?)
    } else {
        debug!(path = %path.display(), "config not found, using defaults");
        Ok(Config::default_config())
    }
}

fn open_store(config: &Config) -> Result<SqliteSecretStore> {
    let path = match &config.database {
        Some(path) => path.clone(),
        None => dirs_data_dir().ok_or(Error::NoDataDir)?.join("secrets.db"),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    debug!(path = %path.display(), "opening secret store");
    Ok(SqliteSecretStore::open(&path)?)
}

fn read_value() -> Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/toolgate"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("toolgate"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("toolgate"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

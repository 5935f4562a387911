use chargegate::application::gate::ChargeGate;
use chargegate::config::{ChargeMode, GateConfig};
use chargegate::domain::balance::{AccountKey, Balance, DEFAULT_ACCOUNT};
use chargegate::domain::ports::BalanceStoreBox;
use chargegate::infrastructure::in_memory::InMemoryBalanceStore;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Redis server holding the balances (optional). If omitted, uses an in-memory store.
    #[arg(long, global = true)]
    redis_url: Option<String>,

    /// Store key of the account to operate on.
    #[arg(long, global = true, default_value = DEFAULT_ACCOUNT)]
    account: String,

    /// Only decrement when the store still covers the charge at write time.
    #[arg(long, global = true)]
    conditional: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authorize one request and charge it if the balance covers it
    Charge,
    /// Restore the account balance to its default
    Reset,
}

#[derive(Serialize)]
struct ResetOutput {
    balance: Balance,
}

fn open_store(redis_url: Option<String>) -> Result<BalanceStoreBox> {
    match redis_url {
        #[cfg(feature = "store-redis")]
        Some(url) => {
            let store = chargegate::infrastructure::redis::RedisBalanceStore::open(url)
                .into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "store-redis"))]
        Some(_) => {
            tracing::warn!(
                "Redis store requested via --redis-url, but 'store-redis' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryBalanceStore::new()))
        }
        None => Ok(Box::new(InMemoryBalanceStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();

    let mode = if cli.conditional {
        ChargeMode::Conditional
    } else {
        ChargeMode::CheckThenDecrement
    };
    let store = open_store(cli.redis_url)?;
    let gate = ChargeGate::new(store, GateConfig::default().with_mode(mode)).into_diagnostic()?;
    let account = AccountKey::new(cli.account);

    let output = match cli.command {
        Command::Charge => {
            let result = gate.charge_request(&account).await.into_diagnostic()?;
            serde_json::to_string(&result).into_diagnostic()?
        }
        Command::Reset => {
            let balance = gate.reset(&account).await.into_diagnostic()?;
            serde_json::to_string(&ResetOutput { balance }).into_diagnostic()?
        }
    };
    println!("{output}");

    Ok(())
}

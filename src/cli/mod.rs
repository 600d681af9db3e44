mod serve;


use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use sessionstore_codec::generate_random_key;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::client::{SqliteStoreClient, StoreClient};
use crate::config::{KeyPairConfig, load_config};
use crate::sweeper::sweep_expired;

const HASH_KEY_BYTES: usize = 64;
const BLOCK_KEY_BYTES: usize = 32;

#[derive(Parser)]
#[command(name = "sessionstore")]
#[command(about = "SQLite-backed session store with signed cookies", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo HTTP server (GET / counts visits in a session)
    Serve {
        #[arg(short, long, default_value = "sessionstore.json")]
        config: PathBuf,
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
    /// Delete expired session records once and exit
    Sweep {
        #[arg(short, long, default_value = "sessionstore.json")]
        config: PathBuf,
    },
    /// Print a freshly generated key pair for the config file
    Keygen {
        /// Also generate a block key so cookie payloads are encrypted
        #[arg(long)]
        block: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, listen } => {
            serve::serve(&config, &listen).await?;
        }
        Commands::Sweep { config } => {
            let deleted = sweep_once(&config).await?;
            println!("Deleted {} expired session(s)", deleted);
        }
        Commands::Keygen { block } => {
            let pair = generate_key_pair(block);
            println!("{}", serde_json::to_string_pretty(&pair)?);
        }
    }

    Ok(())
}

async fn sweep_once(config_path: &Path) -> Result<usize> {
    let config = load_config(config_path)?;
    let client = open_client(&config.database)?;
    client
        .ensure_schema()
        .await
        .context("Failed to prepare sessions table")?;
    let deleted = sweep_expired(client.as_ref())
        .await
        .context("Expiry sweep failed")?;
    Ok(deleted)
}

fn generate_key_pair(block: bool) -> KeyPairConfig {
    KeyPairConfig {
        hash_key: STANDARD.encode(generate_random_key(HASH_KEY_BYTES)),
        block_key: block.then(|| STANDARD.encode(generate_random_key(BLOCK_KEY_BYTES))),
    }
}

/// Open the configured database behind a shared client handle.
fn open_client(database: &str) -> Result<Arc<dyn StoreClient>> {
    let client = SqliteStoreClient::open(database)
        .with_context(|| format!("Failed to open session database {}", database))?;
    Ok(Arc::new(client))
}
